//! Enumeration of reference-assembly differences within a region
//!
//! Two sources feed the unit builder: direct base mismatches between the
//! two references (the assembly scan), and copy-number differences of
//! tandemly repeated indel alleles whose repeats extend past the region
//! boundary (the indel detector). The latter exist because the chain file
//! left-aligns its gaps; a repeat that "peeks out" of a confidently-called
//! region can make a seemingly identical region hide an indel.

use crate::dna::{is_valid_dna, reverse_complement};
use crate::error::WarpError;
use crate::fasta::FastaIndex;
use crate::interval::{RegionType, Strand};
use crate::region::HomologousRegion;
use crate::transform::refdiff::RefDiff;
use crate::variant::{has_only_snvs, Variant};
use crate::Result;

fn fetch_known(fasta: &dyn FastaIndex, name: &str, start: i64, end: i64) -> Result<String> {
    fasta
        .get(name, start, end)?
        .known()
        .ok_or_else(|| WarpError::invalid_input(format!("unknown chromosome {name}")))
}

/// Per-base differences between the query and target reference sequences.
///
/// Identical regions short-circuit to an empty list. MismatchedBases regions
/// yield one SNV [`RefDiff`] per differing position, in left-to-right query
/// order. The caller must not pass an AlignmentRequired or Unknown region.
pub fn assembly_diffs(
    region: &HomologousRegion,
    query_fasta: &dyn FastaIndex,
    target_fasta: &dyn FastaIndex,
) -> Result<Vec<RefDiff>> {
    if region.region_type != RegionType::Identical
        && region.region_type != RegionType::MismatchedBases
    {
        return Err(WarpError::invalid_input(
            "cannot identify reference changes from assembly regions of different sizes",
        ));
    }
    if region.region_type == RegionType::Identical {
        return Ok(Vec::new());
    }

    let query_dna = fetch_known(
        query_fasta,
        &region.query.reference_name,
        region.query.start,
        region.query.end,
    )?;
    let target_dna = fetch_known(
        target_fasta,
        &region.target.reference_name,
        region.target.start,
        region.target.end,
    )?;
    if !is_valid_dna(&query_dna) {
        return Err(WarpError::DnaInvalid {
            context: region.query.to_string(),
            sequence: query_dna,
        });
    }
    if !is_valid_dna(&target_dna) {
        return Err(WarpError::DnaInvalid {
            context: region.target.to_string(),
            sequence: target_dna,
        });
    }

    let target_dna = match region.strand {
        Strand::Positive => target_dna,
        Strand::Negative => reverse_complement(&target_dna),
    };

    let mut diffs = Vec::new();
    for (i, (q, t)) in query_dna.chars().zip(target_dna.chars()).enumerate() {
        if q != t {
            diffs.push(RefDiff::new(
                region.query.start + i as i64,
                &q.to_string(),
                &t.to_string(),
            )?);
        }
    }
    Ok(diffs)
}

/// Copy-number differences induced by indel variants.
///
/// Applies only to positive-strand Identical regions containing at least one
/// multi-nucleotide variant; SNVs cannot induce reference changes and
/// short-circuit to an empty list.
pub fn variant_indel_diffs(
    region: &HomologousRegion,
    variants: &[Variant],
    query_fasta: &dyn FastaIndex,
    target_fasta: &dyn FastaIndex,
) -> Result<Vec<RefDiff>> {
    if has_only_snvs(variants) {
        return Ok(Vec::new());
    }
    if region.region_type != RegionType::Identical {
        return Err(WarpError::invalid_input(
            "finding reference changes from variants in different reference regions is unsupported",
        ));
    }
    if region.strand != Strand::Positive {
        return Err(WarpError::invalid_input(
            "finding reference changes from variants in reverse complement regions is unsupported",
        ));
    }

    let mut diffs = Vec::new();
    for variant in variants {
        if variant.is_multi_nucleotide() {
            let diff = indel_copy_number_diff(region, variant, query_fasta, target_fasta)?;
            if !diff.is_no_diff() {
                diffs.push(diff);
            }
        }
    }
    Ok(diffs)
}

/// Detect a copy-number difference for one multi-nucleotide variant.
///
/// Scans the query assembly from the variant's anchor for tandem copies of
/// each non-anchor allele. If the longest run ends inside the
/// confidently-called region, classification has already captured any
/// difference and the result is [`RefDiff::NoDiff`]. Otherwise the analogous
/// run on the target assembly is measured, and a whole number of missing or
/// extra copies becomes a synthetic deletion or insertion at the variant's
/// position.
pub fn indel_copy_number_diff(
    region: &HomologousRegion,
    variant: &Variant,
    query_fasta: &dyn FastaIndex,
    target_fasta: &dyn FastaIndex,
) -> Result<RefDiff> {
    let alleles = non_anchor_indel_alleles(variant);
    // Complex variants transform trivially and contribute no alleles here.
    if alleles.is_empty() {
        return Ok(RefDiff::NoDiff);
    }

    let offset_from_region_start = variant.start - region.query.start;
    let confident_size = region.query.end - variant.start;
    let mut query_size = confident_size;
    for allele in &alleles {
        if allele.len() as i64 + 1 > query_size {
            query_size = allele.len() as i64 + 2;
        }
    }
    let query_dna = fetch_known(
        query_fasta,
        &region.query.reference_name,
        variant.start,
        variant.start + query_size,
    )?;

    // The first offset from the variant at which the query stops copying
    // any allele; the allele sustaining the longest run wins.
    let mut query_run: usize = 0;
    let mut max_allele: Option<&String> = None;
    for allele in &alleles {
        let run = first_non_allele_offset(
            allele,
            &region.query.reference_name,
            variant.start,
            query_fasta,
            query_dna.clone(),
        )?;
        if run > query_run {
            query_run = run;
            max_allele = Some(allele);
        }
    }

    // Divergence within the region: already captured by classification.
    if (query_run as i64) < confident_size {
        return Ok(RefDiff::NoDiff);
    }
    let allele = max_allele.expect("non-empty allele list with a maximal run");

    let target_scan_start = region.target.start + offset_from_region_start;
    let target_dna = fetch_known(
        target_fasta,
        &region.target.reference_name,
        target_scan_start,
        target_scan_start + query_run as i64,
    )?;
    let target_run = first_non_allele_offset(
        allele,
        &region.target.reference_name,
        target_scan_start,
        target_fasta,
        target_dna,
    )?;

    let copy_delta = (query_run as i64 - target_run as i64) / allele.len() as i64;
    if copy_delta == 0 {
        return Ok(RefDiff::NoDiff);
    }

    let anchor = &variant.reference_bases[0..1];
    let mut long_allele = String::with_capacity(1 + copy_delta.unsigned_abs() as usize * allele.len());
    long_allele.push_str(anchor);
    for _ in 0..copy_delta.unsigned_abs() {
        long_allele.push_str(allele);
    }

    if copy_delta > 0 {
        // The target has fewer copies: a deletion relative to the query.
        RefDiff::new(variant.start, &long_allele, anchor)
    } else {
        RefDiff::new(variant.start, anchor, &long_allele)
    }
}

/// Offset from `scan_start` at which the reference stops copying `allele`.
///
/// `dna` is a pre-fetched window starting at `scan_start` (its first base is
/// the variant anchor). If the window is exhausted while still matching, it
/// is refetched at double the length until divergence or the chromosome end;
/// a run to the contig boundary returns the remaining chromosome length.
fn first_non_allele_offset(
    allele: &str,
    reference_name: &str,
    scan_start: i64,
    fasta: &dyn FastaIndex,
    mut dna: String,
) -> Result<usize> {
    let chromosome_size = fasta
        .chromosome_size(reference_name)
        .ok_or_else(|| WarpError::invalid_input(format!("unknown chromosome {reference_name}")))?;
    let mut end: i64 = 0;
    loop {
        if let Some(offset) = first_mismatch_offset(&dna, allele) {
            return Ok(offset);
        }
        if end == chromosome_size {
            // The DNA repeats all the way to the end of the chromosome.
            return Ok((end - scan_start).max(0) as usize);
        }
        end = (scan_start + 2 * dna.len() as i64).min(chromosome_size);
        dna = fetch_known(fasta, reference_name, scan_start, end)?;
    }
}

/// Index of the first base in `dna` that is not a tandem copy of `allele`,
/// skipping the anchor at index 0; `None` if the window never diverges.
fn first_mismatch_offset(dna: &str, allele: &str) -> Option<usize> {
    let dna = dna.as_bytes();
    let allele = allele.as_bytes();
    (1..dna.len()).find(|&i| dna[i] != allele[(i - 1) % allele.len()])
}

/// All non-anchor indel alleles of a multi-nucleotide variant, uppercased.
///
/// The VCF encoding of an indel carries an anchor base ("C" → "CT" inserts
/// "T"); this returns the post-anchor parts of the reference and of every
/// alternate sharing the reference's anchor. Complex alternates with a
/// different anchor are ignored: their anchor is guaranteed to sit inside
/// the confidently-called region.
fn non_anchor_indel_alleles(variant: &Variant) -> Vec<String> {
    let mut alleles = Vec::new();
    let reference = variant.reference_bases.to_uppercase();
    if reference.len() > 1 {
        alleles.push(reference[1..].to_string());
    }
    for alt in &variant.alternate_bases {
        let alt = alt.to_uppercase();
        if alt.len() > 1 && reference.as_bytes().first() == alt.as_bytes().first() {
            alleles.push(alt[1..].to_string());
        }
    }
    alleles
}
