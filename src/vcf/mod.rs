//! VCF text handling
//!
//! A deliberately small VCF layer: enough to round-trip the record fields
//! the transform engine carries (alleles, quality, filters, INFO scalars,
//! GT and genotype likelihoods) and to rewrite a query header for the
//! target assembly.

pub mod gvcf;
pub mod reader;
pub mod writer;

pub use gvcf::extract_vcf_and_bed;
pub use reader::{open_vcf, parse_vcf_line, read_vcf, VcfHeader};
pub use writer::{variant_line, warp_header, write_vcf, GENOME_WARP_VERSION};
