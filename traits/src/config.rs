use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Number of parity streams maintained for the array (spec §6: `level in
/// {1, 2}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParityLevel {
    /// Single parity stream (RAID-5-like).
    Single = 1,
    /// Primary + Q-parity streams (RAID-6-like).
    Dual = 2,
}

impl ParityLevel {
    /// Number of parity buffers/streams this level maintains.
    pub fn count(self) -> usize {
        match self {
            ParityLevel::Single => 1,
            ParityLevel::Dual => 2,
        }
    }
}

/// Run parameters for a sync (spec §6 "consumed from collaborators").
///
/// A front-end would typically deserialize this from the array's
/// configuration file and hand it to `state_sync`; the catalog's own
/// on-disk format is a separate, out-of-scope concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Block size in bytes; fixed for the whole array, must be a power of
    /// two.
    pub block_size: u32,
    /// Parity level for this array.
    pub level: ParityLevel,
    /// Key mixed into every block hash.
    pub hash_key: Vec<u8>,
    /// Byte threshold between autosave checkpoints; zero disables
    /// autosave.
    pub autosave_bytes: u64,
    /// Forwarded to data-file opens as a sequential-read hint.
    pub skip_sequential: bool,
    /// Forwarded to parity-file extension: skip sparse allocation.
    pub skip_fallocate: bool,
    /// Primary parity file location.
    pub parity_path: PathBuf,
    /// Q-parity file location; required iff `level == ParityLevel::Dual`.
    pub qarity_path: Option<PathBuf>,
}

impl SyncConfig {
    /// `autosave_limit` from spec §4.4 step E: the number of actionable
    /// positions between checkpoints, derived from the byte threshold.
    /// `None` when autosave is disabled or `disk_count` is zero.
    pub fn autosave_limit(&self, disk_count: usize) -> Option<u64> {
        if self.autosave_bytes == 0 || disk_count == 0 {
            return None;
        }
        let per_position = disk_count as u64 * self.block_size as u64;
        if per_position == 0 {
            return None;
        }
        Some(self.autosave_bytes / per_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autosave_limit_matches_byte_threshold_formula() {
        let cfg = SyncConfig {
            block_size: 256 * 1024,
            level: ParityLevel::Single,
            hash_key: vec![],
            autosave_bytes: 10 * 2 * 256 * 1024,
            skip_sequential: false,
            skip_fallocate: false,
            parity_path: "parity".into(),
            qarity_path: None,
        };
        assert_eq!(cfg.autosave_limit(2), Some(10));
    }

    #[test]
    fn autosave_disabled_when_zero() {
        let cfg = SyncConfig {
            block_size: 4096,
            level: ParityLevel::Single,
            hash_key: vec![],
            autosave_bytes: 0,
            skip_sequential: false,
            skip_fallocate: false,
            parity_path: "parity".into(),
            qarity_path: None,
        };
        assert_eq!(cfg.autosave_limit(2), None);
    }
}
