//! Per-region variant transformation engine
//!
//! Transforms variants in a query genome assembly to the corresponding
//! representation in a target genome assembly. The engine operates on one
//! contiguous homologous region at a time: using the position and genotype
//! information of the region's variants, the coordinates of the region on
//! both assemblies, and the two reference sequences, it reproduces the same
//! haplotypes on the target genome — or reports the region unsupported, in
//! which case the caller must drop it (and its variants) from every output.
//!
//! `transform` is deterministic and referentially transparent: RefDiffs are
//! produced in query-position order, units preserve that order with the
//! trailing `NoDiff` unit last, and output variants are sorted by
//! (reference name, start, end).

pub mod classify;
pub mod diff;
pub mod refdiff;
pub mod unit;

pub use classify::classify_region;
pub use diff::{assembly_diffs, indel_copy_number_diff, variant_indel_diffs};
pub use refdiff::RefDiff;
pub use unit::{build_units, position_convert, TransformationUnit};

use tracing::warn;

use crate::error::WarpError;
use crate::fasta::FastaIndex;
use crate::interval::{RegionType, Strand};
use crate::region::HomologousRegion;
use crate::variant::{has_only_snvs, Variant};
use crate::Result;

/// Outcome of transforming one region.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformationResult {
    /// The region transformed; the target variants may be empty.
    Ok(Vec<Variant>),
    /// A region shape or content the engine does not handle. Expected and
    /// recoverable: the caller omits the region from all outputs.
    Unsupported,
    /// A consistency violation inside an otherwise-supported path. The
    /// caller drops the region and logs; distinct from `Unsupported` for
    /// diagnostics only.
    Invalid,
}

impl TransformationResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, TransformationResult::Ok(_))
    }

    /// The transformed variants, when the region was supported.
    pub fn variants(&self) -> Option<&[Variant]> {
        match self {
            TransformationResult::Ok(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_variants(self) -> Option<Vec<Variant>> {
        match self {
            TransformationResult::Ok(v) => Some(v),
            _ => None,
        }
    }
}

/// Transform a region's query variants into target-assembly variants.
///
/// `call_set_names` are assigned positionally to the calls of every produced
/// variant. The region must already be classified; variants must all lie
/// inside the region's query interval.
pub fn transform(
    region: &HomologousRegion,
    variants: &[Variant],
    call_set_names: &[String],
    query_fasta: &dyn FastaIndex,
    target_fasta: &dyn FastaIndex,
) -> Result<TransformationResult> {
    validate_input(region, variants)?;

    // Alignment-requiring regions are not yet supported.
    if region.region_type == RegionType::AlignmentRequired {
        return Ok(TransformationResult::Unsupported);
    }

    // Multinucleotide variants are only supported when there are no
    // reference genome changes and the region maps to the positive strand.
    let only_snvs = has_only_snvs(variants);
    if !only_snvs
        && (region.region_type == RegionType::MismatchedBases
            || region.strand == Strand::Negative)
    {
        return Ok(TransformationResult::Unsupported);
    }

    // SNV-only Identical regions cannot hide reference changes; skip the
    // sequence fetches entirely.
    let ref_diffs = if only_snvs && region.region_type == RegionType::Identical {
        Vec::new()
    } else {
        let mut diffs = assembly_diffs(region, query_fasta, target_fasta)?;
        diffs.extend(variant_indel_diffs(
            region,
            variants,
            query_fasta,
            target_fasta,
        )?);
        diffs
    };

    let Some(units) = build_units(&ref_diffs, variants, region)? else {
        return Ok(TransformationResult::Unsupported);
    };

    let mut target_variants = Vec::new();
    for unit in &units {
        match unit.target_variants(call_set_names)? {
            TransformationResult::Ok(mut variants) => target_variants.append(&mut variants),
            // Any failing unit invalidates the entire region.
            other => return Ok(other),
        }
    }

    target_variants.sort_by(|a, b| a.position_cmp(b));

    // Indel transformations can migrate a variant's position; anything that
    // left the target interval invalidates the region.
    for variant in &target_variants {
        if !region
            .target
            .contains(&variant.reference_name, variant.start)
        {
            warn!(
                "homologous region {} -> {} generates out-of-range variants",
                region.query, region.target
            );
            return Ok(TransformationResult::Unsupported);
        }
    }

    Ok(TransformationResult::Ok(target_variants))
}

fn validate_input(region: &HomologousRegion, variants: &[Variant]) -> Result<()> {
    if region.query.reference_name.is_empty() || region.target.reference_name.is_empty() {
        return Err(WarpError::invalid_input(
            "homologous region reference names must be non-empty",
        ));
    }
    if region.region_type == RegionType::Unknown {
        return Err(WarpError::invalid_input(
            "cannot transform an unclassified region",
        ));
    }
    for variant in variants {
        if !region
            .query
            .contains(&variant.reference_name, variant.start)
        {
            return Err(WarpError::invalid_input(format!(
                "query variant {}:{} is not within query range {}",
                variant.reference_name, variant.start, region.query
            )));
        }
    }
    Ok(())
}
