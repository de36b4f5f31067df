//! Region classification
//!
//! Decides how (and whether) a homologous region can be transformed before
//! any variant is looked at.

use crate::dna::{is_valid_dna, reverse_complement};
use crate::fasta::FastaIndex;
use crate::interval::{RegionType, Strand};
use crate::region::HomologousRegion;
use crate::Result;

/// Classify a homologous region by comparing its reference sequences.
///
/// - Different interval lengths → [`RegionType::AlignmentRequired`].
/// - A chromosome missing from either assembly, or non-ACGT bases on either
///   side → [`RegionType::Unknown`] (the region is silently dropped from
///   pipeline output).
/// - Otherwise, exact base equality after strand canonicalization decides
///   between [`RegionType::Identical`] and [`RegionType::MismatchedBases`].
pub fn classify_region(
    region: &HomologousRegion,
    query_fasta: &dyn FastaIndex,
    target_fasta: &dyn FastaIndex,
) -> Result<RegionType> {
    if region.query.len() != region.target.len() {
        return Ok(RegionType::AlignmentRequired);
    }

    let Some(query_seq) = query_fasta
        .get(
            &region.query.reference_name,
            region.query.start,
            region.query.end,
        )?
        .known()
    else {
        return Ok(RegionType::Unknown);
    };
    let Some(target_seq) = target_fasta
        .get(
            &region.target.reference_name,
            region.target.start,
            region.target.end,
        )?
        .known()
    else {
        return Ok(RegionType::Unknown);
    };

    if !is_valid_dna(&query_seq) || !is_valid_dna(&target_seq) {
        return Ok(RegionType::Unknown);
    }

    let target_seq = match region.strand {
        Strand::Positive => target_seq,
        Strand::Negative => reverse_complement(&target_seq),
    };

    if query_seq.eq_ignore_ascii_case(&target_seq) {
        Ok(RegionType::Identical)
    } else {
        Ok(RegionType::MismatchedBases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fasta::MemoryFasta;
    use crate::interval::GenomeInterval;

    fn region(
        qname: &str,
        qstart: i64,
        qend: i64,
        tname: &str,
        tstart: i64,
        tend: i64,
        strand: Strand,
    ) -> HomologousRegion {
        HomologousRegion::new(
            GenomeInterval::new(qname, qstart, qend),
            GenomeInterval::new(tname, tstart, tend),
            strand,
        )
    }

    fn fixtures() -> (MemoryFasta, MemoryFasta) {
        let query = MemoryFasta::from_pairs([("chr1", "TACGTACGTA"), ("chrN", "ACGNNACGTA")]);
        let target = MemoryFasta::from_pairs([
            ("chr1_same", "GGTACGTACGTAGG"),
            ("chr1_mismatch", "GGTACGAACGTAGG"),
            ("chr1_rc", "GGTACGTACGTAGG"),
        ]);
        (query, target)
    }

    #[test]
    fn test_identical() {
        let (query, target) = fixtures();
        let r = region("chr1", 0, 10, "chr1_same", 2, 12, Strand::Positive);
        assert_eq!(
            classify_region(&r, &query, &target).unwrap(),
            RegionType::Identical
        );
    }

    #[test]
    fn test_mismatched_bases() {
        let (query, target) = fixtures();
        let r = region("chr1", 0, 10, "chr1_mismatch", 2, 12, Strand::Positive);
        assert_eq!(
            classify_region(&r, &query, &target).unwrap(),
            RegionType::MismatchedBases
        );
    }

    #[test]
    fn test_negative_strand_identical() {
        let (query, _) = fixtures();
        // revcomp("TACGT") == "ACGTA" == query [5, 10)
        let target = MemoryFasta::from_pairs([("chr1_rc", "CCTACGTCC")]);
        let r = region("chr1", 5, 10, "chr1_rc", 2, 7, Strand::Negative);
        assert_eq!(
            classify_region(&r, &query, &target).unwrap(),
            RegionType::Identical
        );
    }

    #[test]
    fn test_length_mismatch_is_alignment_required() {
        let (query, target) = fixtures();
        let r = region("chr1", 0, 10, "chr1_same", 2, 13, Strand::Positive);
        assert_eq!(
            classify_region(&r, &query, &target).unwrap(),
            RegionType::AlignmentRequired
        );
    }

    #[test]
    fn test_missing_target_chromosome_is_unknown() {
        let (query, target) = fixtures();
        let r = region("chr1", 0, 10, "chr_nope", 2, 12, Strand::Positive);
        assert_eq!(
            classify_region(&r, &query, &target).unwrap(),
            RegionType::Unknown
        );
    }

    #[test]
    fn test_non_dna_is_unknown() {
        let (query, target) = fixtures();
        let r = region("chrN", 0, 10, "chr1_same", 2, 12, Strand::Positive);
        assert_eq!(
            classify_region(&r, &query, &target).unwrap(),
            RegionType::Unknown
        );
    }
}
