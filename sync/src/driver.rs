use tracing::{debug, trace, warn};

use parity_traits::{
    Block, BlockCatalog, Error, Hash, Hasher, ParityFile, Position, RaidCodec, SyncConfig,
};

use crate::buffer_pool::BufferPool;
use crate::flags::action_flags;
use crate::handle_pool::FileHandlePool;
use crate::progress::ProgressSink;
use crate::scanner::PlanScanner;

/// Result of a completed `state_sync` (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Number of fatal aborts plus per-position skips. Zero iff the run
    /// was fully clean.
    pub unrecoverable_error: u64,
    /// Number of actionable positions the driver attempted (whether or
    /// not they ultimately committed).
    pub positions_attempted: u64,
    /// Total actionable positions the plan scan found.
    pub positions_total: u64,
}

impl SyncOutcome {
    /// Matches the C-style `0 | -1` return convention from spec §6.
    pub fn is_clean(&self) -> bool {
        self.unrecoverable_error == 0
    }
}

enum PositionOutcome {
    /// Actionable, but at least one disk's file vanished or was modified
    /// mid-sync; no descriptor at this position transitioned.
    Skipped { skip_events: u64 },
    /// Actionable and committed: parity was written and every
    /// file-bearing/deleted descriptor transitioned per spec §4.6.
    Committed,
}

/// The per-position pipeline (spec §4.4) plus the §4.3 non-actionable
/// cleanup, run over every position in `[blockstart, blockmax)` by
/// [`run`].
pub struct SyncDriver<'a> {
    pub catalog: &'a mut dyn BlockCatalog,
    pub handles: &'a mut FileHandlePool,
    pub buffers: &'a mut BufferPool,
    pub parity: &'a mut dyn ParityFile,
    pub qarity: Option<&'a mut dyn ParityFile>,
    pub codec: &'a dyn RaidCodec,
    pub hasher: &'a dyn Hasher,
    pub config: &'a SyncConfig,
}

impl<'a> SyncDriver<'a> {
    /// Run the second pass over `[blockstart, blockmax)`, honoring
    /// autosave checkpoints and the progress callback's stop requests.
    ///
    /// Cleanup (closing every open data-file handle) always runs, on both
    /// the normal-completion and fatal-abort paths (spec §4.4 step F).
    pub fn run(
        &mut self,
        blockstart: Position,
        blockmax: Position,
        progress: &mut dyn ProgressSink,
    ) -> SyncOutcome {
        let positions_total = PlanScanner::scan(self.catalog, blockstart, blockmax);
        let disk_count = self.catalog.disk_count();
        let autosave_limit = self.config.autosave_limit(disk_count);
        let mut autosave_missing = positions_total;
        let mut autosave_done = 0u64;

        let mut unrecoverable_error = 0u64;
        let mut positions_attempted = 0u64;

        progress.begin(blockstart, blockmax, positions_total);

        for p in blockstart..blockmax {
            let (one_valid, one_invalid) = action_flags(self.catalog, p);
            if !(one_valid && one_invalid) {
                self.cleanup_deleted_at(p);
                continue;
            }

            autosave_done += 1;
            autosave_missing = autosave_missing.saturating_sub(1);
            positions_attempted += 1;

            let outcome = match self.process_actionable(p) {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(position = p, error = %err, "fatal error, aborting sync");
                    unrecoverable_error += 1;
                    break;
                }
            };

            if let PositionOutcome::Skipped { skip_events } = outcome {
                unrecoverable_error += skip_events;
            }

            self.catalog.mark_dirty();

            let stop = progress.on_position(p, positions_attempted, positions_total);

            if let Some(limit) = autosave_limit {
                if autosave_done >= limit && autosave_missing >= limit {
                    autosave_done = 0;
                    progress.autosave_begin();
                    if let Err(err) = self.fsync_parity() {
                        warn!(error = %err, "autosave fsync failed");
                        unrecoverable_error += 1;
                    } else if let Err(err) = self.catalog.persist() {
                        warn!(error = %err, "autosave persist failed");
                        unrecoverable_error += 1;
                    }
                    progress.autosave_end();
                }
            }

            if stop {
                break;
            }
        }

        progress.end(positions_attempted, positions_total);

        for err in self.handles.close_all() {
            warn!(error = %err, "close failure during cleanup");
            unrecoverable_error += 1;
        }

        SyncOutcome {
            unrecoverable_error,
            positions_attempted,
            positions_total,
        }
    }

    /// Parity fsync before catalog persist (spec §5 ordering guarantee /
    /// §9 "autosave-as-barrier"): after a crash, a descriptor is either
    /// still pre-`Blk` (redone next run) or `Blk` with its parity bytes
    /// already durable.
    fn fsync_parity(&mut self) -> Result<(), Error> {
        self.parity.fsync()?;
        if let Some(q) = self.qarity.as_deref_mut() {
            q.fsync()?;
        }
        Ok(())
    }

    /// Step B: rewrite every `Deleted` descriptor at a non-actionable
    /// position to `Empty`.
    fn cleanup_deleted_at(&mut self, p: Position) {
        for j in 0..self.catalog.disk_count() {
            let block = self.catalog.get(j, p);
            if block.state == parity_traits::BlockState::Deleted {
                self.catalog.set(j, p, Block::empty());
                self.catalog.mark_dirty();
            }
        }
    }

    /// Steps C and D: populate buffers for every disk at `p`, then
    /// commit parity + state transitions if nothing was skipped.
    fn process_actionable(&mut self, p: Position) -> Result<PositionOutcome, Error> {
        self.buffers.zero_all();

        let disk_count = self.catalog.disk_count();
        let mut skip_events = 0u64;
        let mut skip_this_block = false;
        let mut computed_hash: Vec<Option<Hash>> = vec![None; disk_count];

        for j in 0..disk_count {
            if self.catalog.disk(j).is_none() {
                continue;
            }
            let block = self.catalog.get(j, p);
            if !block.has_file() {
                continue;
            }
            let file = block
                .file
                .clone()
                .expect("has_file() implies a file reference");

            let stat = match self.handles.ensure_open(j, &file) {
                Ok(stat) => stat,
                Err(Error::Missing { path }) => {
                    warn!(path = %path.display(), position = p, "file missing mid-sync, skipping position");
                    skip_events += 1;
                    skip_this_block = true;
                    continue;
                }
                Err(other) => return Err(other),
            };

            if !stat.matches(&file) {
                warn!(
                    path = %file.path.display(),
                    position = p,
                    "file changed mid-sync, skipping position"
                );
                skip_events += 1;
                skip_this_block = true;
                continue;
            }

            let offset = block.position_in_file * self.buffers.block_size() as u64;
            let buf = self.buffers.data_mut(j);
            let read_size = self.handles.read(j, offset, buf)?;

            let digest = self.hasher.hash(&self.config.hash_key, &buf[..read_size]);
            trace!(disk = j, position = p, read_size, "computed block hash");

            if block.has_hash() {
                let prior = block.hash.expect("has_hash() implies a recorded hash");
                if prior.0 != digest.0 {
                    return Err(Error::Corruption {
                        path: file.path.clone(),
                        position: p,
                    });
                }
            } else {
                computed_hash[j] = Some(digest);
            }
        }

        if skip_this_block {
            return Ok(PositionOutcome::Skipped { skip_events });
        }

        self.buffers.encode(self.codec, self.config.level);
        let offset = p * self.buffers.block_size() as u64;
        self.parity.write_at(offset, self.buffers.parity(0))?;
        if self.config.level.count() >= 2 {
            let q = self
                .qarity
                .as_deref_mut()
                .expect("level Dual requires a Q-parity stream");
            q.write_at(offset, self.buffers.parity(1))?;
        }

        for j in 0..disk_count {
            let block = self.catalog.get(j, p);
            if block.state == parity_traits::BlockState::Deleted {
                self.catalog.set(j, p, Block::empty());
            } else if block.has_file() {
                let hash = computed_hash[j]
                    .or(block.hash)
                    .expect("file-bearing block always ends up with a hash");
                let mut updated = block;
                updated.protect(hash);
                self.catalog.set(j, p, updated);
            }
        }

        debug!(position = p, "committed parity");
        Ok(PositionOutcome::Committed)
    }
}
