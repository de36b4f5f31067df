//! UCSC chain file parser
//!
//! A chain file describing a query→target liftover lists the query assembly
//! as the chain's first ("target" in UCSC vocabulary) sequence and the
//! destination assembly as its second. To avoid that terminology clash with
//! the rest of this crate, fields here are named `source_*` (the assembly
//! being lifted from) and `dest_*` (the assembly being lifted onto).

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::WarpError;
use crate::interval::Strand;
use crate::Result;

/// A single chain (alignment between two sequences).
#[derive(Debug, Clone)]
pub struct Chain {
    /// Chain ID.
    pub id: u64,
    /// Alignment score (higher = more reliable).
    pub score: u64,
    /// Source sequence name.
    pub source_name: String,
    /// Source sequence size.
    pub source_size: i64,
    /// Start position in the source (0-based).
    pub source_start: i64,
    /// End position in the source (0-based, exclusive).
    pub source_end: i64,
    /// Destination sequence name.
    pub dest_name: String,
    /// Destination sequence size.
    pub dest_size: i64,
    /// Destination strand.
    pub dest_strand: Strand,
    /// Start position in the destination (0-based, strand coordinates).
    pub dest_start: i64,
    /// End position in the destination (0-based, exclusive).
    pub dest_end: i64,
    /// Alignment blocks.
    pub blocks: Vec<ChainBlock>,
}

/// An alignment block within a chain.
#[derive(Debug, Clone, Copy)]
pub struct ChainBlock {
    /// Size of the aligned block.
    pub size: i64,
    /// Gap in the source after this block.
    pub source_gap: i64,
    /// Gap in the destination after this block.
    pub dest_gap: i64,
}

impl Chain {
    /// Check if a source position falls within this chain's span.
    pub fn contains_source_pos(&self, pos: i64) -> bool {
        pos >= self.source_start && pos < self.source_end
    }

    /// Lift a position from source to destination coordinates.
    ///
    /// Returns `None` if the position falls in an alignment gap. On a
    /// minus-strand chain the result is mirrored onto plus-strand
    /// destination coordinates.
    pub fn lift_position(&self, source_pos: i64) -> Option<i64> {
        if !self.contains_source_pos(source_pos) {
            return None;
        }

        let mut s_pos = self.source_start;
        let mut d_pos = self.dest_start;

        for block in &self.blocks {
            let block_end = s_pos + block.size;

            if source_pos < block_end {
                let offset = source_pos - s_pos;
                return Some(match self.dest_strand {
                    Strand::Positive => d_pos + offset,
                    Strand::Negative => self.dest_size - (d_pos + offset) - 1,
                });
            }

            s_pos = block_end + block.source_gap;
            d_pos += block.size + block.dest_gap;

            if source_pos < s_pos {
                return None; // In a source gap.
            }
        }

        None
    }

    /// Number of bases of `[start, end)` covered by alignment blocks.
    pub fn mapped_bases(&self, start: i64, end: i64) -> i64 {
        let mut mapped = 0;
        let mut s_pos = self.source_start;
        for block in &self.blocks {
            let block_end = s_pos + block.size;
            mapped += (end.min(block_end) - start.max(s_pos)).max(0);
            s_pos = block_end + block.source_gap;
            if s_pos >= end {
                break;
            }
        }
        mapped
    }
}

/// Chain file contents indexed by source contig name.
#[derive(Debug, Clone, Default)]
pub struct ChainFile {
    chains: HashMap<String, Vec<Chain>>,
}

impl ChainFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a chain file from a path (supports `.chain` and `.chain.gz`).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| WarpError::Io {
            msg: format!("failed to open chain file {}: {e}", path.display()),
        })?;

        if path.to_string_lossy().ends_with(".gz") {
            Self::parse(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
        } else {
            Self::parse(BufReader::new(file))
        }
    }

    /// Parse chain data from a reader.
    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        let reader = BufReader::new(reader);
        let mut chains = ChainFile::new();
        let mut current: Option<Chain> = None;
        let mut line_number: u64 = 0;

        for line in reader.lines() {
            line_number += 1;
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with("chain") {
                if let Some(chain) = current.take() {
                    chains.add_chain(chain);
                }
                current = Some(parse_chain_header(line, line_number)?);
            } else if let Some(ref mut chain) = current {
                if let Some(block) = parse_block(line, line_number)? {
                    chain.blocks.push(block);
                }
            }
        }

        if let Some(chain) = current {
            chains.add_chain(chain);
        }
        Ok(chains)
    }

    pub fn add_chain(&mut self, chain: Chain) {
        self.chains
            .entry(chain.source_name.clone())
            .or_default()
            .push(chain);
    }

    /// All chains whose source span intersects `[start, end)` on a contig.
    pub fn overlapping_chains(&self, contig: &str, start: i64, end: i64) -> Vec<&Chain> {
        self.chains
            .get(contig)
            .map(|chains| {
                chains
                    .iter()
                    .filter(|c| c.source_start < end && c.source_end > start)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn chain_count(&self) -> usize {
        self.chains.values().map(|v| v.len()).sum()
    }
}

fn parse_chain_header(line: &str, line_number: u64) -> Result<Chain> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 12 {
        return Err(WarpError::parse(
            line_number,
            format!("chain header expects 12+ fields, got {}", parts.len()),
        ));
    }

    let int = |idx: usize, what: &str| -> Result<i64> {
        parts[idx]
            .parse()
            .map_err(|_| WarpError::parse(line_number, format!("invalid {what}: {:?}", parts[idx])))
    };
    let strand = |idx: usize| -> Result<Strand> {
        parts[idx]
            .parse()
            .map_err(|_| WarpError::parse(line_number, format!("invalid strand: {:?}", parts[idx])))
    };

    // UCSC requires the first sequence on the plus strand.
    if strand(4)? != Strand::Positive {
        return Err(WarpError::parse(
            line_number,
            "chain source strand must be +",
        ));
    }

    Ok(Chain {
        score: int(1, "score")? as u64,
        source_name: parts[2].to_string(),
        source_size: int(3, "source size")?,
        source_start: int(5, "source start")?,
        source_end: int(6, "source end")?,
        dest_name: parts[7].to_string(),
        dest_size: int(8, "dest size")?,
        dest_strand: strand(9)?,
        dest_start: int(10, "dest start")?,
        dest_end: int(11, "dest end")?,
        id: parts
            .get(12)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default(),
        blocks: Vec::new(),
    })
}

fn parse_block(line: &str, line_number: u64) -> Result<Option<ChainBlock>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.is_empty() {
        return Ok(None);
    }

    let size: i64 = parts[0]
        .parse()
        .map_err(|_| WarpError::parse(line_number, format!("invalid block size: {:?}", parts[0])))?;

    // The final block carries only a size.
    let (source_gap, dest_gap) = if parts.len() >= 3 {
        (
            parts[1].parse().unwrap_or(0),
            parts[2].parse().unwrap_or(0),
        )
    } else {
        (0, 0)
    };

    Ok(Some(ChainBlock {
        size,
        source_gap,
        dest_gap,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gapped_chain_data() -> &'static str {
        "chain 1000 chrQ 100 + 10 60 chrT 200 + 40 90 1\n20\t10\t0\n20\n\n"
    }

    #[test]
    fn test_parse_chain_file() {
        let chains = ChainFile::parse(gapped_chain_data().as_bytes()).unwrap();
        assert_eq!(chains.chain_count(), 1);
        let chain = &chains.overlapping_chains("chrQ", 0, 100)[0];
        assert_eq!(chain.id, 1);
        assert_eq!(chain.score, 1000);
        assert_eq!(chain.source_name, "chrQ");
        assert_eq!(chain.source_start, 10);
        assert_eq!(chain.source_end, 60);
        assert_eq!(chain.dest_name, "chrT");
        assert_eq!(chain.dest_strand, Strand::Positive);
        assert_eq!(chain.blocks.len(), 2);
        assert_eq!(chain.blocks[0].source_gap, 10);
    }

    #[test]
    fn test_lift_position_blocks_and_gaps() {
        let chains = ChainFile::parse(gapped_chain_data().as_bytes()).unwrap();
        let chain = &chains.overlapping_chains("chrQ", 0, 100)[0];
        // First block: source [10, 30) -> dest [40, 60).
        assert_eq!(chain.lift_position(10), Some(40));
        assert_eq!(chain.lift_position(29), Some(59));
        // Source gap [30, 40).
        assert_eq!(chain.lift_position(35), None);
        // Second block: source [40, 60) -> dest [60, 80).
        assert_eq!(chain.lift_position(40), Some(60));
        assert_eq!(chain.lift_position(59), Some(79));
        // Outside the chain.
        assert_eq!(chain.lift_position(5), None);
        assert_eq!(chain.lift_position(60), None);
    }

    #[test]
    fn test_lift_position_minus_strand() {
        let data = "chain 1000 chrQ 100 + 10 20 chrT 50 - 5 15 2\n10\n\n";
        let chains = ChainFile::parse(data.as_bytes()).unwrap();
        let chain = &chains.overlapping_chains("chrQ", 0, 100)[0];
        assert_eq!(chain.lift_position(10), Some(44));
        assert_eq!(chain.lift_position(19), Some(35));
    }

    #[test]
    fn test_mapped_bases() {
        let chains = ChainFile::parse(gapped_chain_data().as_bytes()).unwrap();
        let chain = &chains.overlapping_chains("chrQ", 0, 100)[0];
        assert_eq!(chain.mapped_bases(10, 60), 40);
        assert_eq!(chain.mapped_bases(15, 45), 20);
        assert_eq!(chain.mapped_bases(30, 40), 0);
    }

    #[test]
    fn test_overlapping_chains_filters() {
        let chains = ChainFile::parse(gapped_chain_data().as_bytes()).unwrap();
        assert_eq!(chains.overlapping_chains("chrQ", 0, 10).len(), 0);
        assert_eq!(chains.overlapping_chains("chrQ", 59, 70).len(), 1);
        assert_eq!(chains.overlapping_chains("chrZ", 0, 100).len(), 0);
    }

    #[test]
    fn test_rejects_minus_source_strand() {
        let data = "chain 1000 chrQ 100 - 10 20 chrT 50 + 5 15 2\n10\n\n";
        assert!(ChainFile::parse(data.as_bytes()).is_err());
    }

    #[test]
    fn test_skips_comments_and_blank_lines() {
        let data = "# a comment\n\nchain 1000 chrQ 100 + 10 20 chrT 50 + 5 15 2\n10\n\n";
        let chains = ChainFile::parse(data.as_bytes()).unwrap();
        assert_eq!(chains.chain_count(), 1);
    }
}
