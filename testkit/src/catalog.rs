use std::collections::HashMap;

use parity_traits::{Block, BlockCatalog, BlockState, Disk, Error, Position};

/// In-memory `BlockCatalog`, grounded on `node/db/src/memory.rs`'s
/// `MemoryDB`: a thread-unaware, sparse, `HashMap`-backed store good
/// enough to drive the driver's unit and property tests without a real
/// catalog parser/serializer.
#[derive(Debug)]
pub struct MemoryCatalog {
    disks: Vec<Option<Disk>>,
    blocks: Vec<HashMap<Position, Block>>,
    disk_array_len: Vec<Position>,
    parity_size: Position,
    loaded_parity_size: Position,
    dirty: bool,
    persist_count: usize,
    overflowed: Option<u64>,
}

impl MemoryCatalog {
    /// `disks[j]` is the disk occupying slot `j` (`None` for an unattached
    /// slot). `disk_array_len[j]` bounds how far that disk's sparse array
    /// extends. `parity_size` is the catalog's precomputed
    /// `parity_size(state)`.
    pub fn new(disks: Vec<Option<Disk>>, disk_array_len: Vec<Position>, parity_size: Position) -> Self {
        let n = disks.len();
        assert_eq!(disk_array_len.len(), n);
        Self {
            disks,
            blocks: (0..n).map(|_| HashMap::new()).collect(),
            disk_array_len,
            parity_size,
            loaded_parity_size: parity_size,
            dirty: false,
            persist_count: 0,
            overflowed: None,
        }
    }

    /// Override the size the parity file was already persisted at before
    /// this run, for tests that exercise the too-small / overflow paths.
    pub fn with_loaded_parity_size(mut self, loaded: Position) -> Self {
        self.loaded_parity_size = loaded;
        self
    }

    /// Seed the descriptor at `(j, position)` for test setup, bypassing
    /// the driver's own mutation path.
    pub fn put(&mut self, j: usize, position: Position, block: Block) {
        self.blocks[j].insert(position, block);
    }

    /// Number of times [`BlockCatalog::persist`] has been called so far;
    /// used to assert autosave cadence (spec §8 scenario S6).
    pub fn persist_count(&self) -> usize {
        self.persist_count
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn overflowed(&self) -> Option<u64> {
        self.overflowed
    }
}

impl BlockCatalog for MemoryCatalog {
    fn disk_count(&self) -> usize {
        self.disks.len()
    }

    fn disk(&self, j: usize) -> Option<&Disk> {
        self.disks.get(j).and_then(|d| d.as_ref())
    }

    fn get(&self, j: usize, position: Position) -> Block {
        if self.disks.get(j).and_then(|d| d.as_ref()).is_none() {
            return Block::empty();
        }
        self.blocks[j].get(&position).cloned().unwrap_or_default()
    }

    fn set(&mut self, j: usize, position: Position, block: Block) {
        if block.state == BlockState::Empty {
            self.blocks[j].remove(&position);
        } else {
            self.blocks[j].insert(position, block);
        }
    }

    fn disk_array_len(&self, j: usize) -> Position {
        self.disk_array_len.get(j).copied().unwrap_or(0)
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn persist(&mut self) -> Result<(), Error> {
        self.persist_count += 1;
        self.dirty = false;
        Ok(())
    }

    fn parity_size(&self) -> Position {
        self.parity_size
    }

    fn loaded_parity_size(&self) -> Position {
        self.loaded_parity_size
    }

    fn parity_overflow(&mut self, actual_size: u64) {
        self.overflowed = Some(actual_size);
    }
}
