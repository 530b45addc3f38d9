//! Sync engine core (spec §4): the second-pass driver that reconciles a
//! [`BlockCatalog`] against on-disk file contents, computes RAID parity,
//! and updates block lifecycle state, with crash-safe autosave
//! checkpointing.
//!
//! [`state_sync`] is the top-level entry point a front-end calls once per
//! run; everything else in this crate is structured so that entry point's
//! three phases -- prepare, drive, finalize -- stay separately testable.

mod buffer_pool;
mod driver;
mod flags;
mod handle_pool;
mod prepare;
mod progress;
mod scanner;

pub use buffer_pool::BufferPool;
pub use driver::{SyncDriver, SyncOutcome};
pub use flags::{action_flags, is_actionable};
pub use handle_pool::{FileHandlePool, StatSnapshot};
pub use prepare::PrepareAndFinalize;
pub use progress::{NoopProgress, ProgressSink};
pub use scanner::PlanScanner;

use parity_traits::{BlockCatalog, Error, Hasher, ParityFile, Position, RaidCodec, SyncConfig};

/// Outcome of a full [`state_sync`] call: the drive phase's result plus
/// any cleanup-noisy errors from finalize, which never override the
/// drive phase's own outcome.
#[derive(Debug)]
pub struct StateSyncResult {
    pub outcome: SyncOutcome,
    pub finalize_errors: Vec<Error>,
}

/// Run a complete sync: prepare, drive the per-position pipeline, then
/// finalize -- the last step runs regardless of how drive ended (spec
/// §4.5, §6).
///
/// `blockcount == 0` means "no cap", matching spec §6's convention.
/// Mirrors the `0 | -1` convention from spec §6 via
/// [`SyncOutcome::is_clean`]; callers that need the exit code directly can
/// map it with `if result.outcome.is_clean() { 0 } else { -1 }`.
#[allow(clippy::too_many_arguments)]
pub fn state_sync<P: ParityFile>(
    catalog: &mut dyn BlockCatalog,
    mut parity: P,
    mut qarity: Option<P>,
    codec: &dyn RaidCodec,
    hasher: &dyn Hasher,
    config: &SyncConfig,
    blockstart: Position,
    blockcount: u64,
    progress: &mut dyn ProgressSink,
) -> Result<StateSyncResult, Error> {
    let disk_count = catalog.disk_count();

    let (blockstart, blockmax) = PrepareAndFinalize::prepare(
        catalog,
        &mut parity,
        qarity.as_mut().map(|q| q as &mut dyn ParityFile),
        config,
        blockstart,
        blockcount,
    )?;

    let mut handles = FileHandlePool::new(disk_count, config.skip_sequential);
    let data_slots = disk_count;
    let parity_slots = config.level.count();
    let mut buffers = BufferPool::new(data_slots, parity_slots, config.block_size as usize);

    let outcome = {
        let mut driver = SyncDriver {
            catalog,
            handles: &mut handles,
            buffers: &mut buffers,
            parity: &mut parity,
            qarity: qarity.as_mut().map(|q| q as &mut dyn ParityFile),
            codec,
            hasher,
            config,
        };
        driver.run(blockstart, blockmax, progress)
    };

    let finalize_errors = PrepareAndFinalize::finalize(parity, qarity);

    Ok(StateSyncResult {
        outcome,
        finalize_errors,
    })
}
