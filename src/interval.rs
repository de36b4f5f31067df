//! Genomic intervals and their classification metadata
//!
//! # Coordinate System
//!
//! | Context | Basis | Notes |
//! |---------|-------|-------|
//! | [`GenomeInterval`] | 0-based | Half-open `[start, end)`, BED convention |
//! | VCF text (`vcf` module) | 1-based | Converted at the parse/write boundary |
//!
//! Coordinates are `i64` so that the `-1` bound conventions of
//! [`crate::fasta::FastaIndex::get`] stay representable; all real
//! coordinates fit in 63 bits.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::WarpError;

/// A zero-based, half-open interval on a named reference sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenomeInterval {
    /// Chromosome/contig name (e.g., "chr1")
    pub reference_name: String,
    /// 0-based inclusive start
    pub start: i64,
    /// 0-based exclusive end
    pub end: i64,
}

impl GenomeInterval {
    /// Create a new interval. `start <= end` is the caller's obligation.
    pub fn new(reference_name: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            reference_name: reference_name.into(),
            start,
            end,
        }
    }

    /// Number of bases covered.
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    /// True when the interval covers no bases.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True if the two intervals share a reference name and at least one base.
    pub fn overlaps(&self, other: &GenomeInterval) -> bool {
        self.reference_name == other.reference_name
            && self.end > other.start
            && self.start < other.end
    }

    /// True if `other` lies entirely within this interval.
    pub fn includes(&self, other: &GenomeInterval) -> bool {
        self.reference_name == other.reference_name
            && self.start <= other.start
            && self.end >= other.end
    }

    /// The overlapping sub-interval, if any.
    pub fn intersection(&self, other: &GenomeInterval) -> Option<GenomeInterval> {
        if !self.overlaps(other) {
            return None;
        }
        Some(GenomeInterval::new(
            self.reference_name.clone(),
            self.start.max(other.start),
            self.end.min(other.end),
        ))
    }

    /// True if `pos` falls in `[start, end)` on the same reference.
    pub fn contains(&self, reference_name: &str, pos: i64) -> bool {
        self.reference_name == reference_name && self.start <= pos && pos < self.end
    }
}

impl PartialOrd for GenomeInterval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GenomeInterval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.reference_name
            .cmp(&other.reference_name)
            .then(self.start.cmp(&other.start))
            .then(self.end.cmp(&other.end))
    }
}

impl fmt::Display for GenomeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.reference_name, self.start, self.end)
    }
}

/// Strand of the target assembly relative to the query.
///
/// There is no "unknown" variant; a strand is always known once a region
/// exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    Positive,
    Negative,
}

impl Strand {
    pub fn is_positive(self) -> bool {
        matches!(self, Strand::Positive)
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Positive => write!(f, "+"),
            Strand::Negative => write!(f, "-"),
        }
    }
}

impl FromStr for Strand {
    type Err = WarpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Positive),
            "-" => Ok(Strand::Negative),
            _ => Err(WarpError::invalid_input(format!("invalid strand: {s:?}"))),
        }
    }
}

/// Classification of a homologous region pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RegionType {
    /// Query and target reference bases are identical after strand
    /// canonicalization.
    Identical,
    /// Same length, at least one differing base.
    MismatchedBases,
    /// Query and target intervals differ in length.
    AlignmentRequired,
    /// Not yet classified, or unclassifiable (non-DNA bases, missing target
    /// chromosome). Unclassifiable regions are dropped from pipeline output.
    #[default]
    Unknown,
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RegionType::Identical => "IDENTICAL",
            RegionType::MismatchedBases => "MISMATCHED_BASES",
            RegionType::AlignmentRequired => "ALIGNMENT_REQUIRED",
            RegionType::Unknown => "UNKNOWN_REGION_TYPE",
        };
        write!(f, "{s}")
    }
}

impl FromStr for RegionType {
    type Err = WarpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IDENTICAL" => Ok(RegionType::Identical),
            "MISMATCHED_BASES" => Ok(RegionType::MismatchedBases),
            "ALIGNMENT_REQUIRED" => Ok(RegionType::AlignmentRequired),
            "UNKNOWN_REGION_TYPE" => Ok(RegionType::Unknown),
            _ => Err(WarpError::invalid_input(format!(
                "invalid region type: {s:?}"
            ))),
        }
    }
}
