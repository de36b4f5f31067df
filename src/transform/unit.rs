//! Transformation units: the atom of cross-assembly variant changes
//!
//! Each [`TransformationUnit`] links one reference genome change to the zero
//! or more query variants overlapping it within a homologous region. Only a
//! subset of (reference change, variants, region) shapes can be transformed
//! today; all other shapes yield [`TransformationResult::Unsupported`] and
//! the caller drops the region.

use std::collections::{BTreeSet, HashMap};

use tracing::warn;

use crate::dna::reverse_complement;
use crate::error::WarpError;
use crate::interval::{RegionType, Strand};
use crate::region::HomologousRegion;
use crate::transform::refdiff::RefDiff;
use crate::transform::TransformationResult;
use crate::variant::{Variant, VariantCall, NO_CALL};
use crate::Result;

/// The filter value marking a fabricated homozygous-alternate call.
const PASS_FILTER: &str = "PASS";

/// One reference genome change paired with the query variants it affects.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformationUnit {
    ref_diff: RefDiff,
    variants: Vec<Variant>,
    region: HomologousRegion,
}

impl TransformationUnit {
    /// Create a unit, validating its construction invariants: the reference
    /// difference lies within the query range (or is `NoDiff`), every
    /// variant lies within the query range, and every variant overlaps the
    /// reference difference (unless it is `NoDiff`).
    pub fn new(
        ref_diff: RefDiff,
        variants: Vec<Variant>,
        region: HomologousRegion,
    ) -> Result<Self> {
        if let Some(pos) = ref_diff.query_pos() {
            if !(region.query.start <= pos && pos < region.query.end) {
                return Err(WarpError::invalid_input(format!(
                    "reference difference at {pos} must lie within the query range {}",
                    region.query
                )));
            }
        }
        for variant in &variants {
            if !region
                .query
                .contains(&variant.reference_name, variant.start)
            {
                return Err(WarpError::invalid_input(format!(
                    "variant at {}:{} must be inside the query homologous range {}",
                    variant.reference_name, variant.start, region.query
                )));
            }
            if !ref_diff.is_no_diff() && !ref_diff.overlaps(variant) {
                return Err(WarpError::invalid_input(
                    "either the reference must be unchanged or all variants must overlap it",
                ));
            }
        }
        Ok(Self {
            ref_diff,
            variants,
            region,
        })
    }

    pub fn ref_diff(&self) -> &RefDiff {
        &self.ref_diff
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn region(&self) -> &HomologousRegion {
        &self.region
    }

    /// The target-assembly variants induced by this unit.
    ///
    /// The decision table (first match wins):
    /// - non-Identical/MismatchedBases region → Unsupported
    /// - multinucleotide variant on the negative strand → Unsupported
    /// - indel reference change on the negative strand → Unsupported
    /// - reference change with more than one variant → Unsupported
    /// - no reference change → every variant carries over (path A)
    /// - reference change, no variants → homozygous-alternate record (path B)
    /// - SNV change paired with an SNV variant → genotype re-indexing (path C)
    /// - indel change matching the variant's own alleles on the positive
    ///   strand → allele swap (path D)
    /// - anything else → Unsupported
    ///
    /// Finally the i-th call of every produced variant takes the i-th
    /// caller-supplied callset name.
    pub fn target_variants(&self, call_set_names: &[String]) -> Result<TransformationResult> {
        // Only equal-size regions can be transformed without alignment.
        if self.region.region_type != RegionType::Identical
            && self.region.region_type != RegionType::MismatchedBases
        {
            warn!("cannot transform regions with non-identical sizes: {}", self.region.query);
            return Ok(TransformationResult::Unsupported);
        }
        // Multinucleotide transformation on the negative strand needs
        // left-shifting and an anchor base change, which is not supported.
        if self.has_multi_nucleotide_variation() && self.region.strand == Strand::Negative {
            warn!(
                "cannot transform multinucleotide variants on - strand: {}",
                self.region.query
            );
            return Ok(TransformationResult::Unsupported);
        }
        if (self.ref_diff.is_insertion() || self.ref_diff.is_deletion())
            && self.region.strand == Strand::Negative
        {
            warn!(
                "cannot transform multinucleotide reference changes on - strand: {}",
                self.region.query
            );
            return Ok(TransformationResult::Unsupported);
        }
        let identical_references = self.ref_diff.is_no_diff();
        if !identical_references && self.variants.len() > 1 {
            warn!(
                "cannot transform variant reference changes with multiple variants: {}",
                self.region.query
            );
            return Ok(TransformationResult::Unsupported);
        }

        let result = if identical_references {
            self.unchanged_genome_variants()?
        } else if self.variants.is_empty() {
            self.reference_change_only_variants()?
        } else {
            // The reference has changed and a single variant overlaps it.
            let variant = &self.variants[0];
            let (_, query_dna, target_dna) =
                self.ref_diff.parts().expect("real difference");
            if self.ref_diff.is_snv() && !variant.is_multi_nucleotide() {
                self.dual_snv_variants()?
            } else if variant.alternate_bases.len() == 1
                && query_dna == variant.reference_bases
                && target_dna == variant.alternate_bases[0]
                && self.region.strand == Strand::Positive
            {
                self.matching_positive_strand_indel_variants()?
            } else {
                warn!(
                    "cannot transform variant reference changes with this single variant: {}",
                    self.region.query
                );
                return Ok(TransformationResult::Unsupported);
            }
        };

        match result {
            TransformationResult::Ok(variants) => Ok(TransformationResult::Ok(
                assign_call_set_names(variants, call_set_names)?,
            )),
            other => Ok(other),
        }
    }

    /// Path A: the references agree, so each variant carries over with a
    /// coordinate (and possibly strand) change only.
    fn unchanged_genome_variants(&self) -> Result<TransformationResult> {
        let mut out = Vec::with_capacity(self.variants.len());
        for variant in &self.variants {
            out.push(coordinate_transform(
                &self.region,
                variant,
                variant.start,
                &variant.reference_bases,
                &variant.alternate_bases,
            )?);
        }
        Ok(TransformationResult::Ok(out))
    }

    /// Path B: the individual is homozygous for the query reference, but the
    /// target reference differs. Fabricate a homozygous-alternate record at
    /// the target position.
    fn reference_change_only_variants(&self) -> Result<TransformationResult> {
        let (query_pos, query_dna, target_dna) =
            self.ref_diff.parts().expect("real difference");
        let template = Variant {
            calls: vec![VariantCall::new(vec![1, 1])],
            filters: vec![PASS_FILTER.to_string()],
            ..Default::default()
        };
        let variant =
            coordinate_transform(&self.region, &template, query_pos, &target_dna, &[query_dna])?;
        Ok(TransformationResult::Ok(vec![variant]))
    }

    /// Path C: both the reference change and the variant are single-base.
    /// The allele table is rebuilt around the new target reference and every
    /// genotype index is remapped through it.
    fn dual_snv_variants(&self) -> Result<TransformationResult> {
        let variant = &self.variants[0];
        let (_, query_dna, target_dna) = self.ref_diff.parts().expect("real difference");
        if query_dna != variant.reference_bases {
            warn!(
                "different reference for query variant and reference change in {}",
                self.region.query
            );
            return Ok(TransformationResult::Invalid);
        }

        // Genotype index → allele on the query assembly.
        let mut query_base_by_index = vec![variant.reference_bases.clone()];
        query_base_by_index.extend(variant.alternate_bases.iter().cloned());

        // The target alternates are every query allele except the new
        // target reference, in ASCII order for determinism.
        let target_reference = target_dna;
        let mut alt_set: BTreeSet<String> = query_base_by_index.iter().cloned().collect();
        alt_set.remove(&target_reference);
        let target_alts: Vec<String> = alt_set.into_iter().collect();

        let mut target_index_by_base: HashMap<&str, i32> = HashMap::new();
        target_index_by_base.insert(target_reference.as_str(), 0);
        for (i, alt) in target_alts.iter().enumerate() {
            target_index_by_base.insert(alt.as_str(), i as i32 + 1);
        }

        let mut new_calls = Vec::with_capacity(variant.calls.len());
        for call in &variant.calls {
            let mut genotype = Vec::with_capacity(call.genotype.len());
            for &g in &call.genotype {
                if g == NO_CALL {
                    genotype.push(g);
                    continue;
                }
                let Some(base) = query_base_by_index.get(g as usize) else {
                    warn!(
                        genotype = g,
                        "genotype index outside the allele table in {}", self.region.query
                    );
                    return Ok(TransformationResult::Invalid);
                };
                genotype.push(target_index_by_base[base.as_str()]);
            }
            // Likelihoods and phasing carry over: genotypes are repopulated
            // in the same order.
            new_calls.push(VariantCall {
                genotype,
                ..call.clone()
            });
        }

        let template = Variant {
            calls: new_calls,
            ..variant.clone()
        };
        let out = coordinate_transform(
            &self.region,
            &template,
            variant.start,
            &target_reference,
            &target_alts,
        )?;
        Ok(TransformationResult::Ok(vec![out]))
    }

    /// Path D: the variant and the reference change describe the same indel,
    /// so reference and alternate swap roles on the target side and each
    /// genotype flips between 0 and 1.
    fn matching_positive_strand_indel_variants(&self) -> Result<TransformationResult> {
        let variant = &self.variants[0];
        let (_, query_dna, target_dna) = self.ref_diff.parts().expect("real difference");
        let target_reference = target_dna;
        let target_alternate = query_dna;

        let mut new_calls = Vec::with_capacity(variant.calls.len());
        for call in &variant.calls {
            let mut genotype = Vec::with_capacity(call.genotype.len());
            for &g in &call.genotype {
                match g {
                    NO_CALL => genotype.push(NO_CALL),
                    0 | 1 => genotype.push(1 - g),
                    _ => {
                        warn!(
                            genotype = g,
                            "matched indel with a non-biallelic genotype in {}",
                            self.region.query
                        );
                        return Ok(TransformationResult::Invalid);
                    }
                }
            }
            new_calls.push(VariantCall {
                genotype,
                ..call.clone()
            });
        }

        let template = Variant {
            calls: new_calls,
            ..variant.clone()
        };
        let out = coordinate_transform(
            &self.region,
            &template,
            variant.start,
            &target_reference,
            &[target_alternate],
        )?;
        Ok(TransformationResult::Ok(vec![out]))
    }

    fn has_multi_nucleotide_variation(&self) -> bool {
        self.variants.iter().any(|v| v.is_multi_nucleotide())
    }
}

/// Convert a query-assembly position to its analogue on the target assembly.
///
/// On the negative strand the result is the reflected coordinate
/// `target.end - (pos - query.start)`; callers subtract the allele length to
/// obtain a start (see [`coordinate_transform`]).
pub fn position_convert(region: &HomologousRegion, query_pos: i64) -> Result<i64> {
    if !(region.query.start <= query_pos && query_pos < region.query.end) {
        return Err(WarpError::invalid_input(format!(
            "invalid query position to convert: {query_pos} in {}",
            region.query
        )));
    }
    let offset = query_pos - region.query.start;
    Ok(match region.strand {
        Strand::Positive => region.target.start + offset,
        Strand::Negative => region.target.end - offset,
    })
}

/// Build the target-assembly variant for the given positive-strand alleles.
///
/// Performs the coordinate transformation and, on the negative strand, the
/// reverse complementing of every allele (start and end swap around the
/// converted position). No left-shifting or anchor change is performed for
/// negative-strand indels. All template fields other than position and
/// alleles carry over unchanged.
pub(crate) fn coordinate_transform(
    region: &HomologousRegion,
    template: &Variant,
    query_start: i64,
    target_reference: &str,
    target_alternates: &[String],
) -> Result<Variant> {
    let converted = position_convert(region, query_start)?;
    let reference_len = target_reference.len() as i64;
    let out = match region.strand {
        Strand::Positive => Variant {
            reference_name: region.target.reference_name.clone(),
            start: converted,
            end: converted + reference_len,
            reference_bases: target_reference.to_string(),
            alternate_bases: target_alternates.to_vec(),
            ..template.clone()
        },
        Strand::Negative => Variant {
            reference_name: region.target.reference_name.clone(),
            // Start and end are swapped on the negative strand.
            start: converted - reference_len,
            end: converted,
            reference_bases: reverse_complement(target_reference),
            alternate_bases: target_alternates
                .iter()
                .map(|a| reverse_complement(a))
                .collect(),
            ..template.clone()
        },
    };
    Ok(out)
}

/// Give the i-th call of every variant the i-th callset name.
fn assign_call_set_names(
    variants: Vec<Variant>,
    call_set_names: &[String],
) -> Result<Vec<Variant>> {
    let mut out = Vec::with_capacity(variants.len());
    for mut variant in variants {
        if variant.calls.len() > call_set_names.len() {
            return Err(WarpError::invalid_input(format!(
                "{} calls but only {} callset names",
                variant.calls.len(),
                call_set_names.len()
            )));
        }
        for (call, name) in variant.calls.iter_mut().zip(call_set_names) {
            call.call_set_name = name.clone();
        }
        out.push(variant);
    }
    Ok(out)
}

/// Partition reference differences and variants into transformation units.
///
/// Each reference difference claims the variants overlapping it; leftover
/// variants form a trailing `NoDiff` unit in input order. Returns `None`
/// (the region is unsupported) when a variant overlaps two distinct
/// reference differences, and an error when the variant list contains
/// duplicates.
pub fn build_units(
    ref_diffs: &[RefDiff],
    variants: &[Variant],
    region: &HomologousRegion,
) -> Result<Option<Vec<TransformationUnit>>> {
    for i in 0..variants.len() {
        for j in i + 1..variants.len() {
            if variants[i] == variants[j] {
                return Err(WarpError::invalid_input(
                    "all variants in a single homologous range must be unique",
                ));
            }
        }
    }

    let mut assigned = vec![false; variants.len()];
    let mut units = Vec::new();
    for ref_diff in ref_diffs {
        let mut matched = Vec::new();
        for (i, variant) in variants.iter().enumerate() {
            if ref_diff.overlaps(variant) {
                // A variant overlapping two distinct reference differences
                // is not handled; give the region up.
                if assigned[i] {
                    warn!(
                        "complex region encountered in area with variant at {}:{}",
                        variant.reference_name, variant.start
                    );
                    return Ok(None);
                }
                assigned[i] = true;
                matched.push(variant.clone());
            }
        }
        units.push(TransformationUnit::new(
            ref_diff.clone(),
            matched,
            region.clone(),
        )?);
    }

    let unassigned: Vec<Variant> = variants
        .iter()
        .enumerate()
        .filter(|(i, _)| !assigned[*i])
        .map(|(_, v)| v.clone())
        .collect();
    if !unassigned.is_empty() {
        units.push(TransformationUnit::new(
            RefDiff::NoDiff,
            unassigned,
            region.clone(),
        )?);
    }

    Ok(Some(units))
}
