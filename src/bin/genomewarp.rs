//! genomewarp CLI
//!
//! Command-line driver for the warp pipeline: confident-region
//! preprocessing, liftover, region classification, variant transformation,
//! and output writing.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use genomewarp::bed::{read_bed, write_bed};
use genomewarp::fasta::{FastaIndex, IndexedFasta};
use genomewarp::liftover::{lift_ranges, ChainFile};
use genomewarp::pipeline::{
    classify_regions, group_variants_by_region, strip_info, warp_regions,
};
use genomewarp::regions::{
    improved_query_ranges, join_regions, omit_overlap, simplified_query_ranges, split_at_non_dna,
};
use genomewarp::vcf::{extract_vcf_and_bed, open_vcf, warp_header, write_vcf};

#[derive(Parser)]
#[command(name = "genomewarp")]
#[command(author, version, about = "Translate variants and confident regions between genome assemblies")]
#[command(
    long_about = "Translate an individual's VCF and confidently-called BED from a query genome \
assembly onto a target assembly, preserving haplotypes.

Examples:
  genomewarp --chain hg19ToHg38.over.chain.gz \\
      --query-vcf sample.vcf --query-bed confident.bed \\
      --query-fasta hg19.fa --target-fasta hg38.fa \\
      --output-vcf sample.hg38.vcf --output-bed confident.hg38.bed
  genomewarp --chain hg19ToHg38.over.chain.gz --query-gvcf sample.g.vcf \\
      --work-dir tmp --query-fasta hg19.fa --target-fasta hg38.fa \\
      --output-vcf out.vcf --output-bed out.bed"
)]
struct Args {
    /// Chain file for liftover (.chain or .chain.gz)
    #[arg(long)]
    chain: PathBuf,

    /// Uncompressed or gzipped raw query VCF file
    #[arg(long)]
    query_vcf: Option<PathBuf>,

    /// Raw query BED file of confidently-called regions
    #[arg(long)]
    query_bed: Option<PathBuf>,

    /// Raw query gVCF file (mutually exclusive with --query-vcf/--query-bed)
    #[arg(long)]
    query_gvcf: Option<PathBuf>,

    /// Reference FASTA of the query assembly
    #[arg(long)]
    query_fasta: PathBuf,

    /// Reference FASTA of the target assembly
    #[arg(long)]
    target_fasta: PathBuf,

    /// Output VCF holding the transformed variants
    #[arg(long)]
    output_vcf: PathBuf,

    /// Output BED holding the valid target regions
    #[arg(long)]
    output_bed: PathBuf,

    /// Working directory for gVCF intermediates
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Keep homozygous reference calls in the output VCF
    #[arg(long)]
    keep_homozygous_reference_calls: bool,

    /// Remove the INFO field from all variants
    #[arg(long)]
    remove_info_field: bool,

    /// Maximum region length fed to liftover; smaller windows avoid regions
    /// with complex variation
    #[arg(long, default_value_t = 10_000)]
    window_size: i64,

    /// Minimum fraction of bases that must lift for a region to survive
    #[arg(long, default_value_t = 1.0)]
    min_match: f64,

    /// Target assembly short name for the output header
    #[arg(long, default_value = "B38")]
    target_assembly: String,

    /// Species recorded in the output header
    #[arg(long, default_value = "Homo sapiens")]
    species: String,

    /// v1.0.0-equivalent preprocessing (no re-cutting around variants)
    #[arg(long)]
    simplified_preprocessing: bool,

    /// Only log warnings and errors
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.quiet {
            EnvFilter::new("warn")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Resolve the query inputs, extracting VCF + BED from a gVCF if given.
    let have_gvcf = args.query_gvcf.is_some();
    if have_gvcf && (args.query_vcf.is_some() || args.query_bed.is_some()) {
        bail!("--query-gvcf is mutually exclusive with --query-vcf/--query-bed");
    }
    if args.query_vcf.is_some() != args.query_bed.is_some() {
        bail!("either both or neither of --query-vcf and --query-bed must be specified");
    }
    if !have_gvcf && args.query_vcf.is_none() {
        bail!("either (--query-vcf, --query-bed) or --query-gvcf must be specified");
    }

    let (vcf_path, bed_path) = if let Some(gvcf) = &args.query_gvcf {
        let work_dir = args
            .work_dir
            .as_ref()
            .context("--work-dir is required with --query-gvcf")?;
        std::fs::create_dir_all(work_dir)?;
        let vcf_path = work_dir.join("from_gvcf.vcf");
        let bed_path = work_dir.join("from_gvcf.bed");
        info!("extracting VCF and BED from gVCF");
        let reader = BufReader::new(File::open(gvcf).context("failed to open gVCF")?);
        extract_vcf_and_bed(
            reader,
            BufWriter::new(File::create(&vcf_path)?),
            BufWriter::new(File::create(&bed_path)?),
        )?;
        (vcf_path, bed_path)
    } else {
        (
            args.query_vcf.clone().expect("validated above"),
            args.query_bed.clone().expect("validated above"),
        )
    };

    info!("creating FASTA structures and jump tables");
    let query_fasta = IndexedFasta::open(&args.query_fasta).context("query FASTA")?;
    let target_fasta = IndexedFasta::open(&args.target_fasta).context("target FASTA")?;

    info!("reading query VCF");
    let (header, mut variants) = open_vcf(&vcf_path)?;
    if header.samples.is_empty() {
        bail!("input VCF file has no callset groups");
    }
    if args.remove_info_field {
        strip_info(&mut variants);
    }

    info!("reading query BED and splitting at non-DNA characters");
    let raw_bed = read_bed(BufReader::new(
        File::open(&bed_path).context("failed to open query BED")?,
    ))?;
    let dna_only = split_at_non_dna(&query_fasta, &raw_bed)?;

    let query_bed = if args.simplified_preprocessing {
        simplified_query_ranges(&dna_only)
    } else {
        improved_query_ranges(&dna_only, &variants, args.window_size)?
    };

    let chains = ChainFile::from_file(&args.chain)?;
    let lifted = lift_ranges(&chains, &query_bed, args.min_match);

    info!("removing overlap from lifted regions");
    let mut target_bed = Vec::new();
    for lifted_chromosome in lifted.into_values() {
        let mut ranges = lifted_chromosome;
        ranges.sort();
        target_bed.extend(omit_overlap(&ranges)?);
    }

    info!("joining and classifying regions");
    let joined = join_regions(&query_bed, &target_bed)?;
    let classified = classify_regions(joined, &query_fasta, &target_fasta)?;
    info!("{} region(s) survive classification", classified.len());

    let grouped = group_variants_by_region(classified, &variants);
    let result = warp_regions(
        &grouped,
        &header.samples,
        &query_fasta,
        &target_fasta,
        args.keep_homozygous_reference_calls,
    )?;
    info!(
        "writing {} variant(s) and {} region(s)",
        result.variants.len(),
        result.target_regions.len()
    );

    let warped_header = warp_header(
        &header.lines,
        &target_fasta.reference_order(),
        &args.target_fasta.display().to_string(),
        &args.target_assembly,
        &args.species,
    );
    write_vcf(
        BufWriter::new(File::create(&args.output_vcf)?),
        &warped_header,
        &result.variants,
    )?;
    write_bed(
        BufWriter::new(File::create(&args.output_bed)?),
        &result.target_regions,
    )?;

    Ok(())
}
