use parity_traits::{BlockCatalog, Position};

/// `(one_valid, one_invalid)` for position `p` across every disk slot
/// (spec §4.3). Shared between `PlanScanner`'s first pass and
/// `SyncDriver`'s step A, which recomputes the identical flags.
pub fn action_flags(catalog: &dyn BlockCatalog, p: Position) -> (bool, bool) {
    let mut one_valid = false;
    let mut one_invalid = false;
    for j in 0..catalog.disk_count() {
        let block = catalog.get(j, p);
        if block.has_file() {
            one_valid = true;
        }
        if block.has_invalid_parity() {
            one_invalid = true;
        }
    }
    (one_valid, one_invalid)
}

/// A position is actionable iff it has at least one file-bearing
/// descriptor and at least one invalid-parity descriptor.
pub fn is_actionable(catalog: &dyn BlockCatalog, p: Position) -> bool {
    let (one_valid, one_invalid) = action_flags(catalog, p);
    one_valid && one_invalid
}
