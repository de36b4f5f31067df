//! Base-level differences between the query and target reference assemblies
//!
//! Variation between reference assemblies influences the output by
//! introducing or eliminating variants present in the query assembly. A
//! [`RefDiff`] records one such difference together with its position on the
//! query assembly; the chromosome and target position are inferred from the
//! enclosing homologous region.

use crate::error::WarpError;
use crate::variant::Variant;
use crate::Result;

/// A single reference-assembly difference at a query position.
///
/// Indels are represented analogously to VCF, with a shared anchor base
/// followed by the variation. [`RefDiff::NoDiff`] is the sentinel for
/// "the assemblies agree here"; it is equal only to itself and never
/// overlaps anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefDiff {
    /// The reference genomes are identical across assemblies.
    NoDiff,
    /// A single differing base.
    Snv {
        query_pos: i64,
        query_base: char,
        target_base: char,
    },
    /// The target assembly has extra bases relative to the query.
    Insertion {
        query_pos: i64,
        query_bases: String,
        target_bases: String,
    },
    /// The target assembly is missing bases relative to the query.
    Deletion {
        query_pos: i64,
        query_bases: String,
        target_bases: String,
    },
}

impl RefDiff {
    /// Classify and validate a reference difference.
    ///
    /// `query_pos` is the zero-based position of the first base on the query
    /// assembly. Both allele strings must be non-empty and at least one must
    /// be a single base (complex changes are not permitted). Equal-length
    /// alleles must disagree (case-insensitively); unequal-length alleles
    /// must share their anchor base.
    pub fn new(query_pos: i64, query_bases: &str, target_bases: &str) -> Result<Self> {
        if query_bases.is_empty() || target_bases.is_empty() {
            return Err(WarpError::InvalidRefDiff {
                msg: "allele strings must be non-empty".to_string(),
            });
        }
        if query_bases.len() > 1 && target_bases.len() > 1 {
            return Err(WarpError::InvalidRefDiff {
                msg: format!("complex changes are not permitted: {query_bases} -> {target_bases}"),
            });
        }

        if query_bases.len() == target_bases.len() {
            if query_bases.eq_ignore_ascii_case(target_bases) {
                return Err(WarpError::InvalidRefDiff {
                    msg: format!("SNVs must have different base pairs: {query_bases}"),
                });
            }
            Ok(RefDiff::Snv {
                query_pos,
                query_base: query_bases.chars().next().expect("non-empty"),
                target_base: target_bases.chars().next().expect("non-empty"),
            })
        } else {
            if query_bases.chars().next() != target_bases.chars().next() {
                return Err(WarpError::InvalidRefDiff {
                    msg: format!(
                        "indels must share an anchor base: {query_bases} -> {target_bases}"
                    ),
                });
            }
            if query_bases.len() > target_bases.len() {
                Ok(RefDiff::Deletion {
                    query_pos,
                    query_bases: query_bases.to_string(),
                    target_bases: target_bases.to_string(),
                })
            } else {
                Ok(RefDiff::Insertion {
                    query_pos,
                    query_bases: query_bases.to_string(),
                    target_bases: target_bases.to_string(),
                })
            }
        }
    }

    pub fn is_no_diff(&self) -> bool {
        matches!(self, RefDiff::NoDiff)
    }

    pub fn is_snv(&self) -> bool {
        matches!(self, RefDiff::Snv { .. })
    }

    pub fn is_insertion(&self) -> bool {
        matches!(self, RefDiff::Insertion { .. })
    }

    pub fn is_deletion(&self) -> bool {
        matches!(self, RefDiff::Deletion { .. })
    }

    /// `(query position, query allele, target allele)` for a real
    /// difference; `None` for [`RefDiff::NoDiff`].
    pub fn parts(&self) -> Option<(i64, String, String)> {
        match self {
            RefDiff::NoDiff => None,
            RefDiff::Snv {
                query_pos,
                query_base,
                target_base,
            } => Some((*query_pos, query_base.to_string(), target_base.to_string())),
            RefDiff::Insertion {
                query_pos,
                query_bases,
                target_bases,
            }
            | RefDiff::Deletion {
                query_pos,
                query_bases,
                target_bases,
            } => Some((*query_pos, query_bases.clone(), target_bases.clone())),
        }
    }

    /// Position of the first affected base on the query assembly.
    pub fn query_pos(&self) -> Option<i64> {
        self.parts().map(|(pos, _, _)| pos)
    }

    /// True if this difference's query footprint intersects the variant's.
    ///
    /// Only positions are compared; the caller must ensure both lie on the
    /// same chromosome. `NoDiff` never overlaps.
    pub fn overlaps(&self, variant: &Variant) -> bool {
        match self.parts() {
            None => false,
            Some((pos, query_bases, _)) => {
                pos < variant.end && pos + query_bases.len() as i64 > variant.start
            }
        }
    }
}
