use std::sync::Arc;

use crate::FileRef;

/// Width, in bytes, of a block content hash.
pub const HASH_SIZE: usize = 32;

/// A fixed-width content hash over one block's worth of file bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Hash(pub [u8; HASH_SIZE]);

impl std::fmt::Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..")
    }
}

/// Lifecycle state of a block descriptor (spec §3).
///
/// Sync only ever performs the transitions in spec §4.6: `{Chg,New,Rep} ->
/// Blk` on a committed parity write, and `Deleted -> Empty` on either
/// branch. `Empty` and `Blk` are left untouched by sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// No file occupies this position on this disk.
    Empty,
    /// Fully protected: parity covers this position and `hash` is trusted.
    Blk,
    /// File-bearing, parity-invalid: the file at this position changed
    /// since the last successful sync. `hash`, if present, is the prior
    /// recorded value and must be re-verified against a fresh read.
    Chg,
    /// File-bearing, parity-invalid, brand new: no prior hash exists.
    New,
    /// File-bearing, parity-invalid: the chunk assigned to this position
    /// was reassigned (e.g. a rename). `hash`, if present, must be
    /// re-verified.
    Rep,
    /// Position previously had a file chunk, now removed; parity still
    /// reflects the old contents until reconciled.
    Deleted,
}

/// A block descriptor: the lifecycle state plus, for file-bearing states,
/// the file it references and the block's position within that file.
#[derive(Debug, Clone)]
pub struct Block {
    pub state: BlockState,
    pub hash: Option<Hash>,
    pub file: Option<Arc<FileRef>>,
    pub position_in_file: u64,
}

impl Default for Block {
    fn default() -> Self {
        Self::empty()
    }
}

impl Block {
    pub const fn empty() -> Self {
        Self {
            state: BlockState::Empty,
            hash: None,
            file: None,
            position_in_file: 0,
        }
    }

    pub fn deleted() -> Self {
        Self {
            state: BlockState::Deleted,
            hash: None,
            file: None,
            position_in_file: 0,
        }
    }

    pub fn file_bearing(
        state: BlockState,
        file: Arc<FileRef>,
        position_in_file: u64,
        hash: Option<Hash>,
    ) -> Self {
        debug_assert!(matches!(
            state,
            BlockState::Chg | BlockState::New | BlockState::Rep | BlockState::Blk
        ));
        debug_assert!(
            !matches!(state, BlockState::Chg | BlockState::Rep | BlockState::Blk) || hash.is_some(),
            "Chg/Rep/Blk descriptors must carry the prior hash they are trusted to check against"
        );
        Self {
            state,
            hash,
            file: Some(file),
            position_in_file,
        }
    }

    /// `has_file(b)` from spec §3: state carries a live file chunk.
    pub fn has_file(&self) -> bool {
        matches!(
            self.state,
            BlockState::Blk | BlockState::Chg | BlockState::New | BlockState::Rep
        )
    }

    /// `has_invalid_parity(b)` from spec §3: parity at this position does
    /// not yet (or no longer) reflect this disk's contents.
    pub fn has_invalid_parity(&self) -> bool {
        matches!(
            self.state,
            BlockState::Chg | BlockState::New | BlockState::Rep | BlockState::Deleted
        )
    }

    /// `has_hash(b)` from spec §3: state carries a previously recorded hash
    /// that must be verified, not merely overwritten, on re-read.
    pub fn has_hash(&self) -> bool {
        matches!(self.state, BlockState::Blk | BlockState::Chg | BlockState::Rep)
    }

    /// Transition a successfully-protected, file-bearing block to `Blk`,
    /// recording the freshly computed hash as now-trusted.
    pub fn protect(&mut self, hash: Hash) {
        debug_assert!(self.has_file());
        self.state = BlockState::Blk;
        self.hash = Some(hash);
    }

    /// Transition a `Deleted` descriptor to `Empty`, dropping the file
    /// reference (there is none) and any stale hash.
    pub fn clear_deleted(&mut self) {
        debug_assert_eq!(self.state, BlockState::Deleted);
        *self = Self::empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_match_spec_table() {
        let empty = Block::empty();
        assert!(!empty.has_file());
        assert!(!empty.has_invalid_parity());
        assert!(!empty.has_hash());

        let deleted = Block::deleted();
        assert!(!deleted.has_file());
        assert!(deleted.has_invalid_parity());
        assert!(!deleted.has_hash());

        let file = Arc::new(FileRef::new("a".into(), 4096, 0, 0, 1));
        let new = Block::file_bearing(BlockState::New, file.clone(), 0, None);
        assert!(new.has_file());
        assert!(new.has_invalid_parity());
        assert!(!new.has_hash());

        let chg = Block::file_bearing(BlockState::Chg, file.clone(), 0, Some(Hash([0; HASH_SIZE])));
        assert!(chg.has_file());
        assert!(chg.has_invalid_parity());
        assert!(chg.has_hash());

        let blk = Block::file_bearing(BlockState::Blk, file, 0, Some(Hash([0; HASH_SIZE])));
        assert!(blk.has_file());
        assert!(!blk.has_invalid_parity());
        assert!(blk.has_hash());
    }

    #[test]
    fn protect_transitions_to_blk_and_records_hash() {
        let file = Arc::new(FileRef::new("a".into(), 4096, 0, 0, 1));
        let mut block = Block::file_bearing(BlockState::New, file, 0, None);
        block.protect(Hash([7; HASH_SIZE]));
        assert_eq!(block.state, BlockState::Blk);
        assert!(block.has_hash());
    }

    #[test]
    fn clear_deleted_yields_empty() {
        let mut block = Block::deleted();
        block.clear_deleted();
        assert_eq!(block.state, BlockState::Empty);
        assert!(!block.has_file());
        assert!(!block.has_invalid_parity());
    }
}
