//! Variant and genotype call representation
//!
//! These are immutable value types: the transform engine never mutates an
//! input variant, it builds fresh ones.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// The genotype encoding for a no-call allele.
pub const NO_CALL: i32 = -1;

/// INFO field scalar value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InfoValue {
    /// Flag (presence indicates true)
    Flag,
    /// Integer value
    Integer(i64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
}

impl fmt::Display for InfoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoValue::Flag => Ok(()),
            InfoValue::Integer(v) => write!(f, "{v}"),
            InfoValue::Float(v) => write!(f, "{v}"),
            InfoValue::String(v) => write!(f, "{v}"),
        }
    }
}

/// One sample's genotype call against its owning [`Variant`]'s allele table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariantCall {
    /// Sample (callset) name.
    pub call_set_name: String,
    /// Allele indices: 0 = reference, 1..N = alternates, −1 = no-call.
    pub genotype: Vec<i32>,
    /// True when the genotype is phased.
    pub phased: bool,
    /// Log10-scaled genotype likelihoods; empty when absent.
    pub genotype_likelihood: Vec<f64>,
}

impl VariantCall {
    /// A call with the given genotype and everything else defaulted.
    pub fn new(genotype: Vec<i32>) -> Self {
        Self {
            genotype,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.call_set_name = name.into();
        self
    }

    pub fn with_phased(mut self, phased: bool) -> Self {
        self.phased = phased;
        self
    }

    pub fn with_likelihoods(mut self, gl: Vec<f64>) -> Self {
        self.genotype_likelihood = gl;
        self
    }

    /// True unless every allele in the genotype is the reference allele.
    /// No-calls count as potential variation.
    pub fn is_non_reference(&self) -> bool {
        self.genotype.iter().any(|&g| g != 0)
    }
}

/// A variant on one assembly, VCF-style: a reference allele and ordered
/// alternates, with per-sample calls indexing into that allele table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Variant {
    /// Chromosome/contig name.
    pub reference_name: String,
    /// 0-based inclusive start.
    pub start: i64,
    /// 0-based exclusive end; always `start + reference_bases.len()`.
    pub end: i64,
    /// Reference allele.
    pub reference_bases: String,
    /// Alternate alleles, in VCF order.
    pub alternate_bases: Vec<String>,
    /// Filter names; empty means unfiltered.
    pub filters: Vec<String>,
    /// Phred-scaled quality, if present.
    pub quality: Option<f64>,
    /// INFO entries, name → ordered scalar values.
    pub info: BTreeMap<String, Vec<InfoValue>>,
    /// Variant identifiers (e.g. rsIDs).
    pub names: Vec<String>,
    /// Per-sample calls.
    pub calls: Vec<VariantCall>,
}

impl Variant {
    /// Create a variant, deriving `end` from the reference allele length.
    pub fn new(
        reference_name: impl Into<String>,
        start: i64,
        reference_bases: impl Into<String>,
        alternate_bases: Vec<String>,
    ) -> Self {
        let reference_bases = reference_bases.into();
        let end = start + reference_bases.len() as i64;
        Self {
            reference_name: reference_name.into(),
            start,
            end,
            reference_bases,
            alternate_bases,
            ..Default::default()
        }
    }

    pub fn with_calls(mut self, calls: Vec<VariantCall>) -> Self {
        self.calls = calls;
        self
    }

    pub fn with_filters(mut self, filters: Vec<String>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    /// True iff any allele (reference or alternate) is longer than one base.
    pub fn is_multi_nucleotide(&self) -> bool {
        self.reference_bases.len() > 1 || self.alternate_bases.iter().any(|a| a.len() > 1)
    }

    /// True iff any call carries a non-reference (or no-call) allele.
    /// Homozygous-reference records are dropped from pipeline output unless
    /// explicitly retained.
    pub fn has_variation(&self) -> bool {
        self.calls.iter().any(|c| c.is_non_reference())
    }

    /// Chromosomal ordering: (reference name, start, end).
    pub fn position_cmp(&self, other: &Variant) -> Ordering {
        self.reference_name
            .cmp(&other.reference_name)
            .then(self.start.cmp(&other.start))
            .then(self.end.cmp(&other.end))
    }
}

/// True iff the list is entirely composed of single-nucleotide variants.
pub fn has_only_snvs(variants: &[Variant]) -> bool {
    variants.iter().all(|v| !v.is_multi_nucleotide())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calls(gts: &[&[i32]]) -> Vec<VariantCall> {
        gts.iter().map(|g| VariantCall::new(g.to_vec())).collect()
    }

    #[test]
    fn test_end_derivation() {
        let v = Variant::new("chr1", 3, "G", vec!["T".into()]);
        assert_eq!(v.end, 4);
        let v = Variant::new("chr2", 1, "ACTG", vec!["A".into()]);
        assert_eq!(v.end, 5);
    }

    #[test]
    fn test_is_multi_nucleotide() {
        assert!(!Variant::new("chr1", 0, "A", vec!["G".into()]).is_multi_nucleotide());
        assert!(Variant::new("chr1", 0, "AC", vec!["A".into()]).is_multi_nucleotide());
        assert!(Variant::new("chr1", 0, "A", vec!["AC".into()]).is_multi_nucleotide());
        assert!(!Variant::new("chr1", 0, "A", vec!["G".into(), "T".into()]).is_multi_nucleotide());
    }

    #[test]
    fn test_has_only_snvs() {
        let snv = Variant::new("chr1", 0, "A", vec!["G".into()]);
        let indel = Variant::new("chr1", 0, "A", vec!["AC".into()]);
        assert!(has_only_snvs(&[snv.clone()]));
        assert!(has_only_snvs(&[]));
        assert!(!has_only_snvs(&[snv, indel]));
    }

    #[test]
    fn test_has_variation() {
        let hom_ref = Variant::new("chr1", 0, "A", vec!["G".into()]).with_calls(calls(&[&[0, 0]]));
        assert!(!hom_ref.has_variation());

        let het = Variant::new("chr1", 0, "A", vec!["G".into()]).with_calls(calls(&[&[0, 1]]));
        assert!(het.has_variation());

        // A no-call is treated as potential variation.
        let no_call = Variant::new("chr1", 0, "A", vec!["G".into()]).with_calls(calls(&[&[-1, 0]]));
        assert!(no_call.has_variation());

        let haploid_ref = Variant::new("chr1", 0, "A", vec!["G".into()]).with_calls(calls(&[&[0]]));
        assert!(!haploid_ref.has_variation());
    }

    #[test]
    fn test_position_cmp() {
        let a = Variant::new("chr1", 5, "A", vec!["G".into()]);
        let b = Variant::new("chr1", 7, "A", vec!["G".into()]);
        let c = Variant::new("chr2", 1, "A", vec!["G".into()]);
        let mut v = vec![c.clone(), b.clone(), a.clone()];
        v.sort_by(|x, y| x.position_cmp(y));
        assert_eq!(v, vec![a, b, c]);
    }

    #[test]
    fn test_call_builders() {
        let call = VariantCall::new(vec![0, 1])
            .with_name("sample1")
            .with_phased(true)
            .with_likelihoods(vec![-1.0, -0.1, -2.0]);
        assert_eq!(call.call_set_name, "sample1");
        assert!(call.phased);
        assert_eq!(call.genotype_likelihood.len(), 3);
        assert!(call.is_non_reference());
    }

    #[test]
    fn test_info_value_display() {
        assert_eq!(InfoValue::Integer(42).to_string(), "42");
        assert_eq!(InfoValue::Float(1.25).to_string(), "1.25");
        assert_eq!(InfoValue::String("DP".into()).to_string(), "DP");
        assert_eq!(InfoValue::Flag.to_string(), "");
    }
}
