//! Confident-region preprocessing
//!
//! Before liftover, the input confident regions are split on non-DNA bases,
//! optionally windowed and re-cut around the variants they cover, and given
//! stable names; after liftover, overlapping results are discarded and the
//! surviving pairs are joined back by name into homologous regions. All
//! functions here are pure over sorted inputs.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::error::WarpError;
use crate::fasta::FastaIndex;
use crate::interval::{GenomeInterval, Strand};
use crate::region::HomologousRegion;
use crate::variant::Variant;
use crate::Result;

/// Padding (in bases) applied around variant-derived regions so that indel
/// context survives the liftover.
pub const VARIANT_CONTEXT_SIZE: i64 = 5;

static DNA_RUN: Lazy<Regex> = Lazy::new(|| Regex::new("[ACGT]+").expect("valid regex"));

/// A named, stranded range used through BED preprocessing and liftover.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenomeRange {
    pub chromosome: String,
    pub start: i64,
    pub end: i64,
    /// Join key across the liftover; empty until assigned.
    pub name: String,
    pub strand: Strand,
}

impl GenomeRange {
    pub fn new(chromosome: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            chromosome: chromosome.into(),
            start,
            end,
            name: String::new(),
            strand: Strand::Positive,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }

    pub fn interval(&self) -> GenomeInterval {
        GenomeInterval::new(self.chromosome.clone(), self.start, self.end)
    }

    pub fn overlaps(&self, other: &GenomeRange) -> bool {
        self.chromosome == other.chromosome && self.end > other.start && self.start < other.end
    }

    pub fn includes(&self, other: &GenomeRange) -> bool {
        self.chromosome == other.chromosome && self.start <= other.start && self.end >= other.end
    }

    pub fn intersection(&self, other: &GenomeRange) -> Option<GenomeRange> {
        if !self.overlaps(other) {
            return None;
        }
        Some(GenomeRange::new(
            self.chromosome.clone(),
            self.start.max(other.start),
            self.end.min(other.end),
        ))
    }
}

impl PartialOrd for GenomeRange {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GenomeRange {
    fn cmp(&self, other: &Self) -> Ordering {
        self.chromosome
            .cmp(&other.chromosome)
            .then(self.start.cmp(&other.start))
            .then(self.end.cmp(&other.end))
            .then((self.strand == Strand::Negative).cmp(&(other.strand == Strand::Negative)))
            .then(self.name.cmp(&other.name))
    }
}

/// Split ranges on non-DNA characters of the query reference.
///
/// Each input range is cut into its maximal runs of ACGT bases; ranges on
/// missing chromosomes disappear. Results are grouped per chromosome.
pub fn split_at_non_dna(
    fasta: &dyn FastaIndex,
    ranges: &[GenomeRange],
) -> Result<BTreeMap<String, Vec<GenomeRange>>> {
    let mut per_chromosome: BTreeMap<String, Vec<GenomeRange>> = BTreeMap::new();
    for range in ranges {
        let Some(sequence) = fasta.get(&range.chromosome, range.start, range.end)?.known()
        else {
            debug!(chromosome = %range.chromosome, "skipping range on missing chromosome");
            continue;
        };
        let matches = per_chromosome.entry(range.chromosome.clone()).or_default();
        let mut split_count = 0;
        for m in DNA_RUN.find_iter(&sequence) {
            matches.push(GenomeRange::new(
                range.chromosome.clone(),
                range.start + m.start() as i64,
                range.start + m.end() as i64,
            ));
            split_count += 1;
        }
        if split_count > 1 {
            info!(
                "{} ({}, {}) was split into {} regions",
                range.chromosome, range.start, range.end, split_count
            );
        }
    }
    per_chromosome.retain(|_, v| !v.is_empty());
    Ok(per_chromosome)
}

/// Cut a range into subranges of at most `window_size` bases.
pub fn split_region(range: &GenomeRange, window_size: i64) -> Vec<GenomeRange> {
    let mut out = Vec::new();
    let mut pos = range.start;
    while pos + window_size <= range.end {
        out.push(GenomeRange::new(range.chromosome.clone(), pos, pos + window_size));
        pos += window_size;
    }
    if pos != range.end {
        out.push(GenomeRange::new(range.chromosome.clone(), pos, range.end));
    }
    out
}

/// One range per variant, grouped per chromosome.
pub fn ranges_from_variants(variants: &[Variant]) -> BTreeMap<String, Vec<GenomeRange>> {
    let mut out: BTreeMap<String, Vec<GenomeRange>> = BTreeMap::new();
    for v in variants {
        out.entry(v.reference_name.clone())
            .or_default()
            .push(GenomeRange::new(v.reference_name.clone(), v.start, v.end));
    }
    out
}

/// Keep the variant ranges completely covered by some confident range.
///
/// Both inputs must be sorted and come from the same chromosome.
pub fn filter_covered(
    confident: &[GenomeRange],
    from_vcf: &[GenomeRange],
) -> Result<Vec<GenomeRange>> {
    let mut out = Vec::new();
    let mut ci = confident.iter().peekable();
    let mut vi = from_vcf.iter().peekable();
    while let (Some(c), Some(v)) = (ci.peek(), vi.peek()) {
        if c.chromosome != v.chromosome {
            return Err(WarpError::invalid_input(
                "inputs must contain the data from a single chromosome",
            ));
        }
        if c.end <= v.start {
            ci.next();
        } else if v.end <= c.start {
            vi.next();
        } else {
            if c.includes(v) {
                out.push((*v).clone());
            }
            vi.next();
        }
    }
    Ok(out)
}

/// Pad each range by `padding` bases on both sides, clamping the start at 0.
pub fn pad_ranges(ranges: &[GenomeRange], padding: i64) -> Vec<GenomeRange> {
    ranges
        .iter()
        .map(|r| GenomeRange::new(r.chromosome.clone(), (r.start - padding).max(0), r.end + padding))
        .collect()
}

/// Coalesce sorted overlapping (or back-to-back) ranges.
pub fn merge_overlaps(ranges: &[GenomeRange]) -> Result<Vec<GenomeRange>> {
    let mut out = Vec::new();
    let mut current: Option<GenomeRange> = None;
    for range in ranges {
        match current.take() {
            None => current = Some(range.clone()),
            Some(max_range) => {
                if range.chromosome == max_range.chromosome
                    && range.cmp(&max_range) == Ordering::Less
                {
                    return Err(WarpError::invalid_input(
                        "input regions are not sorted by position",
                    ));
                }
                if max_range.chromosome != range.chromosome || max_range.end < range.start {
                    out.push(max_range);
                    current = Some(range.clone());
                } else if max_range.end < range.end {
                    current = Some(GenomeRange::new(
                        max_range.chromosome.clone(),
                        max_range.start,
                        range.end,
                    ));
                } else {
                    current = Some(max_range);
                }
            }
        }
    }
    if let Some(max_range) = current {
        out.push(max_range);
    }
    Ok(out)
}

/// Remove every range that overlaps another.
///
/// Liftover can map two distinct query regions onto intersecting target
/// spans; neither can then be trusted, so both are discarded. The input must
/// be sorted by start and come from a single chromosome.
pub fn omit_overlap(ranges: &[GenomeRange]) -> Result<Vec<GenomeRange>> {
    let mut out = Vec::new();
    let mut prev: Option<&GenomeRange> = None;
    let mut max_range: Option<GenomeRange> = None;
    let mut omit_prev = true;

    for curr in ranges {
        if let Some(p) = prev {
            if p.chromosome != curr.chromosome {
                return Err(WarpError::invalid_input(
                    "found ranges from different chromosomes",
                ));
            }
            if curr.start < p.start {
                return Err(WarpError::invalid_input(
                    "output of liftover is not sorted by position",
                ));
            }
        }

        let omit_curr = max_range.as_ref().is_some_and(|m| curr.overlaps(m));
        if !(omit_prev || omit_curr) {
            out.push(prev.expect("prev exists after first iteration").clone());
        }

        match max_range.as_mut() {
            Some(m) => {
                if m.end < curr.end {
                    m.end = curr.end;
                }
            }
            None => max_range = Some(curr.clone()),
        }

        omit_prev = omit_curr;
        prev = Some(curr);
    }

    if !omit_prev {
        if let Some(p) = prev {
            out.push(p.clone());
        }
    }
    Ok(out)
}

/// Merge windowed confident regions with variant-derived regions.
///
/// Variant regions not overlapping any confident region are omitted;
/// confident stretches are windowed to at most `window_size`, truncated at
/// variant boundaries; the covered variant pieces are kept intact so each
/// variant's context lifts as one unit. Inputs are sorted, same-chromosome.
pub fn merge_with_variant_ranges(
    confident: &[GenomeRange],
    from_vcf: &[GenomeRange],
    window_size: i64,
) -> Result<Vec<GenomeRange>> {
    let mut out = Vec::new();
    let mut vcf_iter = from_vcf.iter();
    let mut query = confident.first().cloned();
    let mut query_iter = confident.iter().skip(1);
    let mut vcf_range = vcf_iter.next();

    while let Some(q) = query.take() {
        let Some(v) = vcf_range else {
            out.extend(split_region(&q, window_size));
            query = query_iter.next().cloned();
            continue;
        };

        if q.chromosome != v.chromosome {
            return Err(WarpError::invalid_input(
                "inputs must contain data from a single chromosome",
            ));
        }

        if q.end <= v.start {
            out.extend(split_region(&q, window_size));
            query = query_iter.next().cloned();
        } else if v.end <= q.start {
            vcf_range = vcf_iter.next();
            query = Some(q);
        } else {
            if q.start < v.start {
                out.extend(split_region(
                    &GenomeRange::new(q.chromosome.clone(), q.start, v.start),
                    window_size,
                ));
            }
            out.push(q.intersection(v).expect("overlap established"));
            if q.end > v.end {
                query = Some(GenomeRange::new(q.chromosome.clone(), v.end, q.end));
                vcf_range = vcf_iter.next();
            } else {
                query = query_iter.next().cloned();
            }
        }
    }
    Ok(out)
}

/// Name each range `{chromosome}.{i}`, numbering from 1 in list order.
pub fn assign_names(ranges: Vec<GenomeRange>) -> Vec<GenomeRange> {
    ranges
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let name = format!("{}.{}", r.chromosome, i + 1);
            r.with_name(name)
        })
        .collect()
}

/// Pair query and lifted target ranges by name into homologous regions.
///
/// Query ranges that did not survive liftover are silently absent; duplicate
/// names on either side fail. The result is sorted and unclassified.
pub fn join_regions(
    query_bed: &[GenomeRange],
    target_bed: &[GenomeRange],
) -> Result<Vec<HomologousRegion>> {
    let mut by_name: HashMap<&str, &GenomeRange> = HashMap::new();
    for query in query_bed {
        if by_name.insert(query.name.as_str(), query).is_some() {
            return Err(WarpError::invalid_input(
                "found duplicated BED names in query BED",
            ));
        }
    }

    let mut seen_targets: HashSet<&str> = HashSet::new();
    let mut joined = Vec::new();
    for target in target_bed {
        if !seen_targets.insert(target.name.as_str()) {
            return Err(WarpError::invalid_input(
                "found duplicated BED names in target BED",
            ));
        }
        if let Some(query) = by_name.get(target.name.as_str()) {
            joined.push(HomologousRegion::new(
                query.interval(),
                target.interval(),
                target.strand,
            ));
        }
    }
    joined.sort();
    Ok(joined)
}

/// v1.0.0-equivalent preprocessing: sort and name each chromosome's ranges.
pub fn simplified_query_ranges(
    per_chromosome: &BTreeMap<String, Vec<GenomeRange>>,
) -> Vec<GenomeRange> {
    let mut query_bed = Vec::new();
    for (chromosome, ranges) in per_chromosome {
        let mut ranges = ranges.clone();
        ranges.sort();
        info!(
            "massaging {} BED record(s) from chromosome {}",
            ranges.len(),
            chromosome
        );
        query_bed.extend(assign_names(ranges));
    }
    query_bed
}

/// Improved preprocessing: re-cut the confident regions around the input
/// variants so each variant lifts with local context, windowing the rest.
pub fn improved_query_ranges(
    per_chromosome: &BTreeMap<String, Vec<GenomeRange>>,
    variants: &[Variant],
    window_size: i64,
) -> Result<Vec<GenomeRange>> {
    let from_vcf_per_chromosome = ranges_from_variants(variants);
    let mut query_bed = Vec::new();
    for (chromosome, ranges) in per_chromosome {
        let mut ranges = ranges.clone();
        ranges.sort();

        let Some(from_vcf) = from_vcf_per_chromosome.get(chromosome) else {
            continue;
        };
        let mut from_vcf = from_vcf.clone();
        from_vcf.sort();

        let covered = filter_covered(&ranges, &from_vcf)?;
        let padded = pad_ranges(&covered, VARIANT_CONTEXT_SIZE);
        let merged = merge_overlaps(&padded)?;
        info!(
            "merging query regions with {} variant region(s) from chromosome {}",
            merged.len(),
            chromosome
        );
        let combined = merge_with_variant_ranges(&ranges, &merged, window_size)?;
        query_bed.extend(assign_names(combined));
    }
    Ok(query_bed)
}
