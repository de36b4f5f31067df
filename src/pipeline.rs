//! The warp pipeline
//!
//! Ties the pieces together for whole-file runs: classify the joined
//! regions, group the query variants into them, transform every region (in
//! parallel — each transform is a pure function of its inputs), and collect
//! the surviving variants and confidently-called target regions.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::info;

use crate::fasta::FastaIndex;
use crate::region::HomologousRegion;
use crate::regions::{merge_overlaps, GenomeRange};
use crate::transform::{classify_region, transform, TransformationResult};
use crate::variant::Variant;
use crate::Result;

/// Bucket size (in base pairs) for binning regions and variants. At typical
/// human variant densities this puts on the order of a hundred variants in
/// each bucket.
const BUCKET_SORT_SIZE: i64 = 100_000;

/// Classify joined regions, dropping the unclassifiable ones.
pub fn classify_regions(
    regions: Vec<HomologousRegion>,
    query_fasta: &dyn FastaIndex,
    target_fasta: &dyn FastaIndex,
) -> Result<Vec<HomologousRegion>> {
    let mut classified = Vec::with_capacity(regions.len());
    for region in regions {
        let region_type = classify_region(&region, query_fasta, target_fasta)?;
        if region_type == crate::interval::RegionType::Unknown {
            continue;
        }
        classified.push(region.with_type(region_type));
    }
    Ok(classified)
}

/// Associate each variant with every region containing its start position.
///
/// Regions without variants are retained (they still produce confident
/// target intervals). Variants outside all regions cannot be accurately
/// transformed and are dropped. Output follows the input region order.
pub fn group_variants_by_region(
    regions: Vec<HomologousRegion>,
    variants: &[Variant],
) -> Vec<(HomologousRegion, Vec<Variant>)> {
    let mut buckets: HashMap<(&str, i64), Vec<usize>> = HashMap::new();
    for (index, region) in regions.iter().enumerate() {
        let name = region.query.reference_name.as_str();
        for bucket in region.query.start / BUCKET_SORT_SIZE..=region.query.end / BUCKET_SORT_SIZE {
            buckets.entry((name, bucket)).or_default().push(index);
        }
    }

    let mut grouped: Vec<Vec<Variant>> = vec![Vec::new(); regions.len()];
    for variant in variants {
        let key = (
            variant.reference_name.as_str(),
            variant.start / BUCKET_SORT_SIZE,
        );
        let Some(indices) = buckets.get(&key) else {
            continue;
        };
        for &index in indices {
            let query = &regions[index].query;
            if variant.start >= query.start && variant.start < query.end {
                grouped[index].push(variant.clone());
            }
        }
    }

    regions.into_iter().zip(grouped).collect()
}

/// Everything a warp run produces for its output files.
#[derive(Debug, Default)]
pub struct WarpResult {
    /// Target-assembly variants, sorted by (name, start, end).
    pub variants: Vec<Variant>,
    /// Confidently-called target regions, sorted and overlap-merged.
    pub target_regions: Vec<GenomeRange>,
}

/// Transform every region and assemble the outputs.
///
/// Unsupported and invalid regions contribute nothing (conservative
/// dropping keeps the output 100% specific). Homozygous-reference records
/// are filtered out unless `keep_homozygous_reference_calls` is set.
pub fn warp_regions(
    grouped: &[(HomologousRegion, Vec<Variant>)],
    call_set_names: &[String],
    query_fasta: &dyn FastaIndex,
    target_fasta: &dyn FastaIndex,
    keep_homozygous_reference_calls: bool,
) -> Result<WarpResult> {
    let transformed: Vec<Result<TransformationResult>> = grouped
        .par_iter()
        .map(|(region, variants)| {
            transform(region, variants, call_set_names, query_fasta, target_fasta)
        })
        .collect();

    let mut result = WarpResult::default();
    let mut dropped = 0usize;
    let mut target_ranges = Vec::new();
    for ((region, _), outcome) in grouped.iter().zip(transformed) {
        match outcome? {
            TransformationResult::Ok(variants) => {
                target_ranges.push(GenomeRange::new(
                    region.target.reference_name.clone(),
                    region.target.start,
                    region.target.end,
                ));
                result.variants.extend(
                    variants
                        .into_iter()
                        .filter(|v| keep_homozygous_reference_calls || v.has_variation()),
                );
            }
            TransformationResult::Unsupported | TransformationResult::Invalid => {
                dropped += 1;
            }
        }
    }
    if dropped > 0 {
        info!("{dropped} region(s) could not be transformed and were dropped");
    }

    result.variants.sort_by(|a, b| a.position_cmp(b));
    target_ranges.sort();
    result.target_regions = merge_overlaps(&target_ranges)?;
    Ok(result)
}

/// Drop the INFO field from every variant.
pub fn strip_info(variants: &mut [Variant]) {
    for variant in variants {
        variant.info.clear();
    }
}
