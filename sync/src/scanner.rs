use parity_traits::{BlockCatalog, Position};

use crate::flags::is_actionable;

/// First pass over `[blockstart, blockmax)`: counts positions that need
/// work (spec §4.3 C7), without performing any I/O. The count feeds
/// progress reporting and the autosave cadence, both of which need a
/// total before any block work starts.
pub struct PlanScanner;

impl PlanScanner {
    /// Number of actionable positions in `[blockstart, blockmax)`.
    pub fn scan(catalog: &dyn BlockCatalog, blockstart: Position, blockmax: Position) -> u64 {
        (blockstart..blockmax)
            .filter(|&p| is_actionable(catalog, p))
            .count() as u64
    }
}
