//! Data model for the array-wide block grid.
//!
//! A [`Position`] is a 0-based index into the logical block grid shared by
//! every disk and every parity file: the same position selects the same
//! byte offset (`position * block_size`) everywhere. Each disk owns a
//! sparse array of [`Block`] descriptors indexed by position; see
//! [`BlockState`] for the lifecycle states a descriptor can be in.

mod block;
mod disk;
mod file;

pub use block::{Block, BlockState, Hash, HASH_SIZE};
pub use disk::{Disk, DiskId};
pub use file::FileRef;

/// A 0-based index into the array-wide logical block grid.
///
/// The same position selects the same byte offset in every data file's
/// chunking and in every parity file.
pub type Position = u64;

/// Number of data-disk slots plus parity levels a single sync run spans.
pub type SlotCount = usize;
