//! Interval liftover over a chain file

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::liftover::chain::ChainFile;
use crate::regions::GenomeRange;

/// Lift one named range from the source assembly onto the destination.
///
/// The best-scoring chain covering the range is used. Both end positions
/// must map through that chain (no gap at either edge) and at least
/// `min_match` of the range's bases must fall in alignment blocks;
/// otherwise the range is unliftable and `None` is returned. The result
/// keeps the input name and carries the chain's destination strand, with
/// coordinates on the plus strand of the destination sequence.
pub fn lift_range(
    chains: &ChainFile,
    range: &GenomeRange,
    min_match: f64,
) -> Option<GenomeRange> {
    if range.start >= range.end {
        return None;
    }

    let mut candidates = chains.overlapping_chains(&range.chromosome, range.start, range.end);
    candidates.sort_by_key(|c| std::cmp::Reverse(c.score));

    for chain in candidates {
        let Some(first) = chain.lift_position(range.start) else {
            continue;
        };
        let Some(last) = chain.lift_position(range.end - 1) else {
            continue;
        };

        let mapped = chain.mapped_bases(range.start, range.end);
        let fraction = mapped as f64 / (range.end - range.start) as f64;
        if fraction < min_match {
            debug!(
                name = %range.name,
                fraction, "lifted fraction below the min-match threshold"
            );
            continue;
        }

        let (dest_start, dest_end) = if first <= last {
            (first, last + 1)
        } else {
            // Minus-strand chains mirror the coordinates.
            (last, first + 1)
        };
        return Some(
            GenomeRange::new(chain.dest_name.clone(), dest_start, dest_end)
                .with_name(range.name.clone())
                .with_strand(chain.dest_strand),
        );
    }

    None
}

/// Lift many ranges, grouping the results per destination chromosome.
///
/// Unliftable ranges are dropped (logged at debug level).
pub fn lift_ranges(
    chains: &ChainFile,
    ranges: &[GenomeRange],
    min_match: f64,
) -> BTreeMap<String, Vec<GenomeRange>> {
    info!("performing liftover on {} ranges", ranges.len());
    let mut lifted: BTreeMap<String, Vec<GenomeRange>> = BTreeMap::new();
    let mut failures = 0usize;
    for range in ranges {
        match lift_range(chains, range, min_match) {
            Some(out) => lifted.entry(out.chromosome.clone()).or_default().push(out),
            None => {
                debug!(name = %range.name, "failed to liftover an interval");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        info!("{failures} range(s) failed to lift");
    }
    lifted
}
