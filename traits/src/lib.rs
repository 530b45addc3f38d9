//! Interfaces consumed by the sync driver but implemented elsewhere (spec
//! §1 "out of scope" / §6 "consumed from collaborators"):
//!
//! - [`BlockCatalog`]: the per-disk sparse array of block descriptors.
//! - [`ParityFile`]: create/extend/write-at/fsync/close of a parity stream.
//! - [`RaidCodec`]: the RAID coding primitive, a pure function.
//! - [`Hasher`]: the keyed content-hash primitive, a pure function.
//!
//! [`parity_testkit`](../parity_testkit/index.html) provides in-memory
//! reference implementations of all four for testing.

mod config;
mod error;

pub use config::{ParityLevel, SyncConfig};
pub use error::Error;
pub use parity_types::{Block, BlockState, Disk, DiskId, FileRef, Hash, Position, HASH_SIZE};

use std::path::Path;

/// Per-disk sparse array of block descriptors, plus the catalog-wide
/// bookkeeping the driver needs: dirty tracking, persistence, and the
/// derived parity size.
///
/// Implementations are free to store descriptors however they like; an
/// `Empty` descriptor (spec §3 invariant 4) may be aliased rather than
/// materialized per position.
pub trait BlockCatalog {
    /// Number of data-disk slots in this run (`N` in spec §2/§4).
    fn disk_count(&self) -> usize;

    /// The disk occupying slot `j`, or `None` if the slot has no disk
    /// attached in this run (spec §6: "some possibly null").
    fn disk(&self, j: usize) -> Option<&Disk>;

    /// The block descriptor at `position` on disk `j`. Returns the
    /// canonical empty descriptor if `position` is beyond the disk's own
    /// maximum or the slot has no disk attached.
    fn get(&self, j: usize, position: Position) -> Block;

    /// Overwrite the descriptor at `position` on disk `j`.
    fn set(&mut self, j: usize, position: Position, block: Block);

    /// The highest position + 1 that any disk's array may have a non-empty
    /// descriptor at, used to bound full-array scans.
    fn disk_array_len(&self, j: usize) -> Position;

    /// Mark the catalog as having unsaved changes.
    fn mark_dirty(&mut self);

    /// Persist the catalog to its backing store (the external
    /// parser/serializer). Called at autosave checkpoints and at the end
    /// of a run.
    fn persist(&mut self) -> Result<(), Error>;

    /// The number of positions the parity file(s) will cover given the
    /// current file inventory (`parity_size(state)` in spec §4.5/§6).
    fn parity_size(&self) -> Position;

    /// The parity size as of the last successful sync (`loaded_blockmax`
    /// in spec §4.5 step 4): the parity file must be at least this long
    /// already, or it was truncated out from under the tool.
    fn loaded_parity_size(&self) -> Position;

    /// Invoked when extending a parity file to `parity_size() *
    /// block_size` fails, so the catalog can be rewritten to reflect a
    /// smaller usable parity region before the caller aborts (spec §4.5
    /// step 4, §6).
    fn parity_overflow(&mut self, actual_size: u64);
}

/// A single parity stream (primary or Q-parity).
///
/// All operations are blocking, matching the single-threaded, sequential
/// scheduling model of the driver (spec §5).
pub trait ParityFile {
    /// Open (creating if necessary) the parity file at `path`.
    fn create(path: &Path, skip_sequential: bool) -> Result<Self, Error>
    where
        Self: Sized;

    /// Current length in bytes.
    fn size(&self) -> Result<u64, Error>;

    /// Grow (never shrink) the file to `new_len` bytes, using sparse
    /// allocation when `skip_fallocate` is false and the platform supports
    /// it.
    fn extend(&mut self, new_len: u64, skip_fallocate: bool) -> Result<(), Error>;

    /// Write `buf` at byte offset `offset`. `buf.len()` is always exactly
    /// `block_size`.
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<(), Error>;

    /// Force the file's data and metadata to stable storage.
    fn fsync(&mut self) -> Result<(), Error>;

    /// Close the file, surfacing any deferred error.
    fn close(self) -> Result<(), Error>
    where
        Self: Sized;
}

/// RAID coding primitive: given `level` and one buffer per data disk,
/// produce `level` parity buffers, all `block_size` bytes long.
///
/// A pure function over its inputs: given the same `data` and `level`, the
/// same `parity` bytes are produced (spec invariant 1).
pub trait RaidCodec {
    fn encode(&self, level: ParityLevel, data: &[&[u8]], parity: &mut [&mut [u8]]);
}

/// Keyed hash primitive over a single block's worth of bytes.
pub trait Hasher {
    fn hash(&self, key: &[u8], data: &[u8]) -> Hash;
}
