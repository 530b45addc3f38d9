use tracing::{info, warn};

use parity_traits::{BlockCatalog, Block, BlockState, Error, ParityFile, Position, SyncConfig};

/// Pre-trim, parity sizing, and end-of-run fsync/close (spec §4.5 C9).
pub struct PrepareAndFinalize;

impl PrepareAndFinalize {
    /// Compute the run's `blockmax`, trim out-of-range `Deleted`
    /// descriptors, and size both parity files. Returns the effective
    /// `(blockstart, blockmax)` for the driver's second pass.
    ///
    /// On any failure here the caller should treat it as
    /// fatal-preparation (spec §7): no block work has started yet.
    pub fn prepare(
        catalog: &mut dyn BlockCatalog,
        parity: &mut dyn ParityFile,
        qarity: Option<&mut dyn ParityFile>,
        config: &SyncConfig,
        blockstart: Position,
        blockcount: u64,
    ) -> Result<(Position, Position), Error> {
        let mut blockmax = catalog.parity_size();
        let loaded_blockmax = catalog.loaded_parity_size();

        // Invariant 3: positions >= blockmax must have no Deleted entries
        // left over; it's safe to drop them since nothing after blockmax
        // can ever be a live, used block.
        for j in 0..catalog.disk_count() {
            let disk_len = catalog.disk_array_len(j);
            for p in blockmax..disk_len {
                if catalog.get(j, p).state == BlockState::Deleted {
                    catalog.set(j, p, Block::empty());
                    catalog.mark_dirty();
                }
            }
        }

        if blockstart > blockmax {
            return Err(Error::StartBeyondParitySize {
                blockstart,
                parity_size: blockmax,
            });
        }

        if blockcount != 0 && blockstart + blockcount < blockmax {
            blockmax = blockstart + blockcount;
        }

        let block_size = config.block_size as u64;
        Self::size_parity_file(
            parity,
            &config.parity_path,
            block_size,
            config.skip_fallocate,
            loaded_blockmax,
            blockmax,
            catalog,
        )?;
        if config.level.count() >= 2 {
            let q = qarity.expect("level Dual requires a Q-parity stream");
            let qpath = config
                .qarity_path
                .as_ref()
                .expect("level Dual requires qarity_path");
            Self::size_parity_file(
                q,
                qpath,
                block_size,
                config.skip_fallocate,
                loaded_blockmax,
                blockmax,
                catalog,
            )?;
        }

        info!(blockstart, blockmax, "sync prepared");
        Ok((blockstart, blockmax))
    }

    fn size_parity_file(
        file: &mut dyn ParityFile,
        path: &std::path::Path,
        block_size: u64,
        skip_fallocate: bool,
        loaded_blockmax: Position,
        blockmax: Position,
        catalog: &mut dyn BlockCatalog,
    ) -> Result<(), Error> {
        let loaded_size = loaded_blockmax * block_size;
        let target_size = blockmax * block_size;

        let current_size = file.size()?;
        if current_size < loaded_size {
            return Err(Error::TooSmall {
                path: path.to_path_buf(),
                actual: current_size,
                expected: loaded_size,
            });
        }

        if let Err(err) = file.extend(target_size, skip_fallocate) {
            let actual = file.size().unwrap_or(current_size);
            catalog.parity_overflow(actual);
            return Err(err);
        }

        Ok(())
    }

    /// Fsync and close both parity files regardless of the driver's
    /// outcome (spec §4.5 "Finalize"). Failures are recorded but never
    /// abort the finalize sequence itself (cleanup-noisy, spec §7).
    pub fn finalize(
        parity: impl ParityFile,
        qarity: Option<impl ParityFile>,
    ) -> Vec<Error> {
        let mut errors = Vec::new();

        let mut parity = parity;
        if let Err(err) = parity.fsync() {
            warn!(error = %err, "parity fsync failed during finalize");
            errors.push(err);
        }
        if let Err(err) = parity.close() {
            warn!(error = %err, "parity close failed during finalize");
            errors.push(err);
        }

        if let Some(mut q) = qarity {
            if let Err(err) = q.fsync() {
                warn!(error = %err, "qarity fsync failed during finalize");
                errors.push(err);
            }
            if let Err(err) = q.close() {
                warn!(error = %err, "qarity close failed during finalize");
                errors.push(err);
            }
        }

        errors
    }
}
