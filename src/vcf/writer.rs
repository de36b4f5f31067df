//! VCF output and header rewriting

use std::io::Write;

use crate::variant::{InfoValue, Variant, NO_CALL};
use crate::Result;

/// Source identifier stamped into output headers.
pub const GENOME_WARP_VERSION: &str = concat!("genomewarp_v", env!("CARGO_PKG_VERSION"));

/// Render one variant as a VCF data line (no trailing newline).
pub fn variant_line(variant: &Variant) -> String {
    let mut line = format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        variant.reference_name,
        variant.start + 1,
        if variant.names.is_empty() {
            ".".to_string()
        } else {
            variant.names.join(";")
        },
        variant.reference_bases,
        if variant.alternate_bases.is_empty() {
            ".".to_string()
        } else {
            variant.alternate_bases.join(",")
        },
        variant
            .quality
            .map_or(".".to_string(), |q| format!("{q}")),
        if variant.filters.is_empty() {
            ".".to_string()
        } else {
            variant.filters.join(";")
        },
    );

    if variant.info.is_empty() {
        line.push_str("\t.");
    } else {
        let entries: Vec<String> = variant
            .info
            .iter()
            .map(|(key, values)| {
                if values == &[InfoValue::Flag] {
                    key.clone()
                } else {
                    let joined: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                    format!("{key}={}", joined.join(","))
                }
            })
            .collect();
        line.push('\t');
        line.push_str(&entries.join(";"));
    }

    if !variant.calls.is_empty() {
        let with_likelihoods = variant
            .calls
            .iter()
            .any(|c| !c.genotype_likelihood.is_empty());
        line.push_str(if with_likelihoods { "\tGT:GL" } else { "\tGT" });
        for call in &variant.calls {
            let separator = if call.phased { "|" } else { "/" };
            let gt: Vec<String> = call
                .genotype
                .iter()
                .map(|&g| {
                    if g == NO_CALL {
                        ".".to_string()
                    } else {
                        g.to_string()
                    }
                })
                .collect();
            line.push('\t');
            line.push_str(&gt.join(separator));
            if with_likelihoods {
                if call.genotype_likelihood.is_empty() {
                    line.push_str(":.");
                } else {
                    let gl: Vec<String> = call
                        .genotype_likelihood
                        .iter()
                        .map(|g| g.to_string())
                        .collect();
                    line.push(':');
                    line.push_str(&gl.join(","));
                }
            }
        }
    }

    line
}

/// Write a header followed by variant records.
pub fn write_vcf<W: Write>(
    mut writer: W,
    header_lines: &[String],
    variants: &[Variant],
) -> Result<()> {
    for line in header_lines {
        writeln!(writer, "{line}")?;
    }
    for variant in variants {
        writeln!(writer, "{}", variant_line(variant))?;
    }
    Ok(())
}

/// Rewrite a query VCF header for the target assembly.
///
/// The `reference` line is pointed at the target FASTA, the `source` line is
/// extended with this tool's version (or added), existing contig lines are
/// dropped, and fresh contig lines are generated from the target assembly's
/// reference order. The column header line stays last.
pub fn warp_header(
    input_lines: &[String],
    target_reference_order: &[(String, i64)],
    target_reference_path: &str,
    assembly: &str,
    species: &str,
) -> Vec<String> {
    let mut meta = Vec::new();
    let mut column_line = None;
    let mut has_source = false;

    for line in input_lines {
        if let Some(rest) = line.strip_prefix("##") {
            if rest.starts_with("contig=") {
                continue;
            }
            if rest.starts_with("reference=") {
                meta.push(format!("##reference={target_reference_path}"));
            } else if let Some(source) = rest.strip_prefix("source=") {
                meta.push(format!("##source={source}_and_{GENOME_WARP_VERSION}"));
                has_source = true;
            } else {
                meta.push(line.clone());
            }
        } else if line.starts_with('#') {
            column_line = Some(line.clone());
        }
    }

    if !has_source {
        meta.push(format!("##source={GENOME_WARP_VERSION}"));
    }
    for (name, length) in target_reference_order {
        meta.push(format!(
            "##contig=<ID={name},length={length},assembly={assembly},species=\"{species}\">"
        ));
    }
    if let Some(line) = column_line {
        meta.push(line);
    }
    meta
}
