//! Error types for genomewarp
//!
//! Everything that can abort a call is a [`WarpError`]. Expected per-region
//! outcomes (a region shape the engine does not handle) are *not* errors;
//! they are values of [`crate::transform::TransformationResult`] and the
//! caller drops the region and moves on.

use thiserror::Error;

/// Main error type for genomewarp operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WarpError {
    /// A caller precondition was violated (bad region, variant outside its
    /// region, unknown region type, mismatched callset names).
    #[error("Invalid input: {msg}")]
    InvalidInput { msg: String },

    /// A reference-genome difference was constructed with inconsistent
    /// alleles. Programmer error.
    #[error("Invalid reference genome difference: {msg}")]
    InvalidRefDiff { msg: String },

    /// Non-ACGT bases in a region that claimed to be classifiable.
    #[error("Invalid DNA in {context}: {sequence}")]
    DnaInvalid { context: String, sequence: String },

    /// The underlying FASTA file is malformed. Fatal for the whole run.
    #[error("Malformed FASTA {path}: {msg}")]
    BadFasta { path: String, msg: String },

    /// Text input (VCF, BED, chain, annotated regions) that does not parse.
    #[error("Parse error at line {line}: {msg}")]
    Parse { line: u64, msg: String },

    /// IO error (for file operations)
    #[error("IO error: {msg}")]
    Io { msg: String },
}

impl WarpError {
    /// Create an `InvalidInput` error from anything displayable.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        WarpError::InvalidInput { msg: msg.into() }
    }

    /// Create a `Parse` error for the given 1-based line number.
    pub fn parse(line: u64, msg: impl Into<String>) -> Self {
        WarpError::Parse {
            line,
            msg: msg.into(),
        }
    }
}

impl From<std::io::Error> for WarpError {
    fn from(err: std::io::Error) -> Self {
        WarpError::Io {
            msg: err.to_string(),
        }
    }
}
