//! Chain-file-driven coordinate liftover
//!
//! Supplies homologous regions to the transform engine: confident-region
//! pieces are lifted from the query assembly onto the target assembly
//! through a UCSC chain file, keeping their names as the join key.

pub mod chain;
pub mod lift;

pub use chain::{Chain, ChainBlock, ChainFile};
pub use lift::{lift_range, lift_ranges};
