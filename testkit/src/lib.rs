//! Reference implementations of [`parity_traits`]'s external collaborator
//! traits, grounded on `node/db/src/memory.rs`'s in-memory `Store`. Used by
//! `parity_sync`'s integration tests, never by production code.

mod catalog;
mod codec;
mod hasher;
mod parity_file;

pub use catalog::MemoryCatalog;
pub use codec::XorRaidCodec;
pub use hasher::Blake2Hasher;
pub use parity_file::FileParity;
