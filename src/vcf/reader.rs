//! VCF parsing into [`Variant`]s

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::WarpError;
use crate::variant::{InfoValue, Variant, VariantCall, NO_CALL};
use crate::Result;

/// A parsed VCF header.
#[derive(Debug, Clone, Default)]
pub struct VcfHeader {
    /// Every header line, in input order, including the `#CHROM` line.
    pub lines: Vec<String>,
    /// Sample names from the `#CHROM` line, in column order.
    pub samples: Vec<String>,
}

impl VcfHeader {
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

/// Read a whole VCF stream into its header and records.
///
/// Calls are named from the header's sample columns in positional order.
pub fn read_vcf<R: BufRead>(reader: R) -> Result<(VcfHeader, Vec<Variant>)> {
    let mut header = VcfHeader::default();
    let mut variants = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line_number = i as u64 + 1;
        let line = line?;
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('#') {
            if rest.starts_with("CHROM") {
                // Fixed columns, FORMAT, then one column per sample.
                header.samples = rest
                    .split('\t')
                    .skip(8)
                    .skip(1)
                    .map(|s| s.to_string())
                    .collect();
            }
            header.lines.push(line);
            continue;
        }
        let mut variant = parse_vcf_line(&line, line_number)?;
        for (call, sample) in variant.calls.iter_mut().zip(&header.samples) {
            call.call_set_name = sample.clone();
        }
        variants.push(variant);
    }
    Ok((header, variants))
}

/// Open a VCF file, transparently decompressing `.gz` input.
pub fn open_vcf<P: AsRef<Path>>(path: P) -> Result<(VcfHeader, Vec<Variant>)> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| WarpError::Io {
        msg: format!("failed to open VCF {}: {e}", path.display()),
    })?;
    if path.extension().is_some_and(|e| e == "gz") {
        let decoder: Box<dyn Read> = Box::new(MultiGzDecoder::new(file));
        read_vcf(BufReader::new(decoder))
    } else {
        read_vcf(BufReader::new(file))
    }
}

/// Parse one VCF data line.
///
/// Requires the eight fixed columns; FORMAT and sample columns are parsed
/// when present (GT for genotypes and phasing, GL directly or PL as −PL/10
/// for genotype likelihoods; other keys are ignored). Callset names are left
/// empty — the caller fills them from its header.
pub fn parse_vcf_line(line: &str, line_number: u64) -> Result<Variant> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 8 {
        return Err(WarpError::parse(
            line_number,
            format!("expected at least 8 fields, got {}", fields.len()),
        ));
    }

    let pos: i64 = fields[1].parse().map_err(|_| {
        WarpError::parse(line_number, format!("invalid position: {:?}", fields[1]))
    })?;
    let start = pos - 1;

    let names = match fields[2] {
        "." => Vec::new(),
        ids => ids.split(';').map(|s| s.to_string()).collect(),
    };
    let reference = fields[3].to_string();
    let alternates: Vec<String> = match fields[4] {
        "." => Vec::new(),
        alts => alts.split(',').map(|s| s.to_string()).collect(),
    };
    let quality = match fields[5] {
        "." => None,
        q => Some(q.parse().map_err(|_| {
            WarpError::parse(line_number, format!("invalid quality: {q:?}"))
        })?),
    };
    let filters: Vec<String> = match fields[6] {
        "." => Vec::new(),
        f => f.split(';').map(|s| s.to_string()).collect(),
    };

    let mut variant = Variant::new(fields[0], start, reference, alternates)
        .with_names(names)
        .with_filters(filters);
    variant.quality = quality;

    if fields[7] != "." {
        for entry in fields[7].split(';') {
            match entry.split_once('=') {
                None => {
                    variant.info.insert(entry.to_string(), vec![InfoValue::Flag]);
                }
                Some((key, values)) => {
                    let parsed = values.split(',').map(parse_info_scalar).collect();
                    variant.info.insert(key.to_string(), parsed);
                }
            }
        }
    }

    if fields.len() > 9 {
        let format: Vec<&str> = fields[8].split(':').collect();
        for sample in &fields[9..] {
            variant
                .calls
                .push(parse_call(&format, sample, line_number)?);
        }
    }

    Ok(variant)
}

fn parse_info_scalar(value: &str) -> InfoValue {
    if let Ok(i) = value.parse::<i64>() {
        return InfoValue::Integer(i);
    }
    if let Ok(f) = value.parse::<f64>() {
        return InfoValue::Float(f);
    }
    InfoValue::String(value.to_string())
}

fn parse_call(format: &[&str], sample: &str, line_number: u64) -> Result<VariantCall> {
    let values: Vec<&str> = sample.split(':').collect();
    let mut call = VariantCall::default();
    for (key, value) in format.iter().zip(&values) {
        match *key {
            "GT" => {
                call.phased = value.contains('|');
                for allele in value.split(['/', '|']) {
                    if allele == "." {
                        call.genotype.push(NO_CALL);
                    } else {
                        call.genotype.push(allele.parse().map_err(|_| {
                            WarpError::parse(
                                line_number,
                                format!("invalid genotype allele: {allele:?}"),
                            )
                        })?);
                    }
                }
            }
            "GL" => {
                if *value != "." {
                    for gl in value.split(',') {
                        call.genotype_likelihood.push(gl.parse().map_err(|_| {
                            WarpError::parse(line_number, format!("invalid GL value: {gl:?}"))
                        })?);
                    }
                }
            }
            // PL folds into GL; favor an explicit GL when both appear.
            "PL" => {
                if *value != "." && call.genotype_likelihood.is_empty() {
                    for pl in value.split(',') {
                        let pl: f64 = pl.parse().map_err(|_| {
                            WarpError::parse(line_number, format!("invalid PL value: {pl:?}"))
                        })?;
                        call.genotype_likelihood.push(-pl / 10.0 + 0.0);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(call)
}
