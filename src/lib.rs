//! genomewarp: cross-assembly variant translation
//!
//! Translates an individual's variation — a VCF over confidently-called
//! regions on a query genome assembly — into the analogous VCF and region
//! set on a target assembly. Unlike a plain coordinate lifter, it also
//! synthesizes variants wherever the two reference assemblies differ while
//! the individual still matches the query reference, so the target VCF
//! encodes the same haplotypes as the query VCF. Regions that cannot be
//! transformed faithfully are dropped in full, trading recall for 100%
//! specificity.
//!
//! # Example
//!
//! ```
//! use genomewarp::fasta::MemoryFasta;
//! use genomewarp::interval::{GenomeInterval, RegionType, Strand};
//! use genomewarp::region::HomologousRegion;
//! use genomewarp::transform::transform;
//! use genomewarp::variant::{Variant, VariantCall};
//!
//! let query = MemoryFasta::from_pairs([("chr1", "ACGTACGTAC")]);
//! let target = MemoryFasta::from_pairs([("chr1_fix", "TTACGTACGTAC")]);
//! let region = HomologousRegion::new(
//!     GenomeInterval::new("chr1", 0, 10),
//!     GenomeInterval::new("chr1_fix", 2, 12),
//!     Strand::Positive,
//! )
//! .with_type(RegionType::Identical);
//!
//! let snv = Variant::new("chr1", 4, "A", vec!["G".to_string()])
//!     .with_calls(vec![VariantCall::new(vec![0, 1])]);
//! let result = transform(&region, &[snv], &["sample".to_string()], &query, &target).unwrap();
//! let lifted = result.into_variants().unwrap();
//! assert_eq!(lifted[0].start, 6);
//! ```

pub mod bed;
pub mod dna;
pub mod error;
pub mod fasta;
pub mod interval;
pub mod liftover;
pub mod pipeline;
pub mod region;
pub mod regions;
pub mod transform;
pub mod variant;
pub mod vcf;

// Re-export commonly used types
pub use error::WarpError;
pub use fasta::{FastaIndex, IndexedFasta, MemoryFasta, SequenceFetch};
pub use interval::{GenomeInterval, RegionType, Strand};
pub use region::HomologousRegion;
pub use transform::{classify_region, transform, RefDiff, TransformationResult};
pub use variant::{Variant, VariantCall};

/// Result type alias for genomewarp operations
pub type Result<T> = std::result::Result<T, WarpError>;
