//! Homologous region pairs linking the query and target assemblies

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::WarpError;
use crate::interval::{GenomeInterval, RegionType, Strand};

/// A query interval paired with its lifted target interval.
///
/// Regions arrive from the liftover step with `region_type` unset
/// ([`RegionType::Unknown`]); classification fills it in. The invariant that
/// Identical/MismatchedBases regions have equal-length intervals is
/// established by [`crate::transform::classify_region`] — the transform
/// engine trusts the recorded type rather than re-deriving it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HomologousRegion {
    pub query: GenomeInterval,
    pub target: GenomeInterval,
    /// Strand of the target interval relative to the query.
    pub strand: Strand,
    pub region_type: RegionType,
}

impl HomologousRegion {
    /// Create a region with the type left unclassified.
    pub fn new(query: GenomeInterval, target: GenomeInterval, strand: Strand) -> Self {
        Self {
            query,
            target,
            strand,
            region_type: RegionType::Unknown,
        }
    }

    /// The same region with its classification recorded.
    pub fn with_type(mut self, region_type: RegionType) -> Self {
        self.region_type = region_type;
        self
    }
}

impl PartialOrd for HomologousRegion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HomologousRegion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.query
            .cmp(&other.query)
            .then_with(|| self.target.cmp(&other.target))
    }
}

/// Tab-separated annotated-region encoding, one region per line:
/// query name/start/end, target name/start/end, strand, region type.
impl fmt::Display for HomologousRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.query.reference_name,
            self.query.start,
            self.query.end,
            self.target.reference_name,
            self.target.start,
            self.target.end,
            self.strand,
            self.region_type
        )
    }
}

impl FromStr for HomologousRegion {
    type Err = WarpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('\t').collect();
        if parts.len() != 8 {
            return Err(WarpError::invalid_input(format!(
                "annotated region must have 8 tab-separated columns, got {}",
                parts.len()
            )));
        }
        let coord = |s: &str| -> Result<i64, WarpError> {
            s.parse()
                .map_err(|_| WarpError::invalid_input(format!("invalid coordinate: {s:?}")))
        };
        Ok(HomologousRegion {
            query: GenomeInterval::new(parts[0], coord(parts[1])?, coord(parts[2])?),
            target: GenomeInterval::new(parts[3], coord(parts[4])?, coord(parts[5])?),
            strand: parts[6].parse()?,
            region_type: parts[7].parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> HomologousRegion {
        HomologousRegion::new(
            GenomeInterval::new("chr1", 1, 40),
            GenomeInterval::new("chr1_same", 11, 50),
            Strand::Positive,
        )
        .with_type(RegionType::Identical)
    }

    #[test]
    fn test_round_trip() {
        let r = region();
        let encoded = r.to_string();
        assert_eq!(encoded, "chr1\t1\t40\tchr1_same\t11\t50\t+\tIDENTICAL");
        assert_eq!(encoded.parse::<HomologousRegion>().unwrap(), r);
    }

    #[test]
    fn test_parse_negative_strand() {
        let r: HomologousRegion = "chr2\t1\t43\tchr2_revcomp\t10\t52\t-\tIDENTICAL"
            .parse()
            .unwrap();
        assert_eq!(r.strand, Strand::Negative);
        assert_eq!(r.query.len(), r.target.len());
    }

    #[test]
    fn test_parse_errors() {
        assert!("chr1\t1\t40".parse::<HomologousRegion>().is_err());
        assert!("chr1\tx\t40\tchr1\t11\t50\t+\tIDENTICAL"
            .parse::<HomologousRegion>()
            .is_err());
        assert!("chr1\t1\t40\tchr1\t11\t50\t?\tIDENTICAL"
            .parse::<HomologousRegion>()
            .is_err());
    }

    #[test]
    fn test_ordering_by_query_then_target() {
        let a = HomologousRegion::new(
            GenomeInterval::new("chr1", 1, 10),
            GenomeInterval::new("chrT", 0, 9),
            Strand::Positive,
        );
        let b = HomologousRegion::new(
            GenomeInterval::new("chr1", 5, 10),
            GenomeInterval::new("chrA", 0, 5),
            Strand::Positive,
        );
        assert!(a < b);
    }

    #[test]
    fn test_new_is_unclassified() {
        let r = HomologousRegion::new(
            GenomeInterval::new("chr1", 0, 1),
            GenomeInterval::new("chr1", 0, 1),
            Strand::Positive,
        );
        assert_eq!(r.region_type, RegionType::Unknown);
    }
}
