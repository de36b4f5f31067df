//! gVCF splitting
//!
//! A gVCF interleaves variant records with homozygous-reference blocks. The
//! warp pipeline wants those as two inputs: a variant-only VCF and a BED of
//! confidently-called regions, which this helper extracts in one pass.

use std::io::{BufRead, Write};

use crate::error::WarpError;
use crate::Result;

/// The gVCF non-variant alternate allele.
const GVCF_ALT_ALLELE: &str = "<*>";
const PASS_FILTER: &str = "PASS";

/// Split a gVCF into a variant-only VCF and a confident-region BED.
///
/// Header lines go to the VCF untouched. A data line is a variant when its
/// ALT is neither `.` nor `<*>`; it contributes a confident region when its
/// FILTER is PASS, spanning the REF allele unless the INFO field carries an
/// `END=` key (1-based inclusive, i.e. a half-open end in 0-based terms).
pub fn extract_vcf_and_bed<R: BufRead, V: Write, B: Write>(
    gvcf: R,
    mut vcf_out: V,
    mut bed_out: B,
) -> Result<()> {
    for (i, line) in gvcf.lines().enumerate() {
        let line_number = i as u64 + 1;
        let line = line?;
        if line.starts_with('#') {
            writeln!(vcf_out, "{line}")?;
            continue;
        }
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 8 {
            return Err(WarpError::parse(
                line_number,
                format!("expected at least 8 fields, got {}", fields.len()),
            ));
        }

        let alternate = fields[4];
        if alternate != "." && alternate != GVCF_ALT_ALLELE {
            writeln!(vcf_out, "{line}")?;
        }

        if fields[6] == PASS_FILTER {
            let pos: i64 = fields[1].parse().map_err(|_| {
                WarpError::parse(line_number, format!("invalid position: {:?}", fields[1]))
            })?;
            let start = pos - 1;
            let mut end = start + fields[3].len() as i64;
            for token in fields[7].split(';') {
                if let Some(value) = token.strip_prefix("END=") {
                    end = value.parse().map_err(|_| {
                        WarpError::parse(line_number, format!("invalid END value: {value:?}"))
                    })?;
                }
            }
            writeln!(bed_out, "{}\t{start}\t{end}", fields[0])?;
        }
    }
    Ok(())
}
