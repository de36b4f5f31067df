//! DNA sequence utilities

/// Reverse complement a DNA sequence
///
/// Reverses the sequence and complements each nucleotide:
/// - A <-> T
/// - G <-> C
/// - Case is preserved
/// - Non-ATGC characters pass through unchanged
///
/// # Examples
///
/// ```
/// use genomewarp::dna::reverse_complement;
///
/// assert_eq!(reverse_complement("ATGC"), "GCAT");
/// assert_eq!(reverse_complement("aattggcc"), "ggccaatt");
/// assert_eq!(reverse_complement("ATGN"), "NCAT");
/// ```
pub fn reverse_complement(seq: &str) -> String {
    seq.chars()
        .rev()
        .map(|c| match c {
            'A' => 'T',
            'T' => 'A',
            'G' => 'C',
            'C' => 'G',
            'a' => 't',
            't' => 'a',
            'g' => 'c',
            'c' => 'g',
            _ => c,
        })
        .collect()
}

/// Returns true if the input is a valid DNA string, which we take to mean
/// containing only the characters ACTGactg. The empty string is valid.
pub fn is_valid_dna(seq: &str) -> bool {
    seq.bytes()
        .all(|b| matches!(b, b'A' | b'C' | b'G' | b'T' | b'a' | b'c' | b'g' | b't'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_complement_basic() {
        assert_eq!(reverse_complement("ATGC"), "GCAT");
    }

    #[test]
    fn test_reverse_complement_empty() {
        assert_eq!(reverse_complement(""), "");
    }

    #[test]
    fn test_reverse_complement_single_base() {
        assert_eq!(reverse_complement("A"), "T");
        assert_eq!(reverse_complement("T"), "A");
        assert_eq!(reverse_complement("G"), "C");
        assert_eq!(reverse_complement("C"), "G");
    }

    #[test]
    fn test_reverse_complement_lowercase() {
        assert_eq!(reverse_complement("atgc"), "gcat");
        assert_eq!(reverse_complement("AtGc"), "gCaT");
    }

    #[test]
    fn test_reverse_complement_involution() {
        let seq = "ATGCATGCATGCATGCATGC";
        assert_eq!(reverse_complement(&reverse_complement(seq)), seq);
    }

    #[test]
    fn test_reverse_complement_preserves_unknown_chars() {
        assert_eq!(reverse_complement("ATGN"), "NCAT");
        assert_eq!(reverse_complement("NNNN"), "NNNN");
    }

    #[test]
    fn test_is_valid_dna() {
        assert!(is_valid_dna("ACGT"));
        assert!(is_valid_dna("acgt"));
        assert!(is_valid_dna("AcGt"));
        assert!(is_valid_dna(""));
        assert!(!is_valid_dna("ACGN"));
        assert!(!is_valid_dna("ACG T"));
        assert!(!is_valid_dna("ACGU"));
    }
}
