use std::path::PathBuf;

/// Error taxonomy for the sync engine (spec §7).
///
/// Variants are grouped by the severity classes in spec §7's table; the
/// driver (`parity_sync`) decides per call site whether a given variant is
/// fatal (abort the whole run) or a per-position skip (bump a counter,
/// continue).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `ENOENT` on open: the file vanished mid-sync. Concurrent-mutation
    /// class — non-fatal per position.
    #[error("missing file: {path}")]
    Missing { path: PathBuf },

    /// Permission denied on open. Fatal-I/O class.
    #[error("permission denied opening {path}")]
    Denied { path: PathBuf },

    /// Any other open failure. Fatal-I/O class.
    #[error("open error on {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A previously-open handle could not be closed. Fatal-I/O class
    /// during the run; cleanup-noisy class during final cleanup.
    #[error("close error on {path}: {source}")]
    Close {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Read failure on a data disk. Fatal-I/O class.
    #[error("read error on {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Write failure on a parity stream. Fatal-I/O class.
    #[error("write error on parity file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parity file could not be created or opened. Fatal-preparation
    /// class.
    #[error("could not create parity file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A pre-existing parity file is smaller than the previously-loaded
    /// blockmax implies it should be (spec §4.5 step 4). Fatal-preparation
    /// class.
    #[error("parity file {path} is smaller than expected: {actual} < {expected}")]
    TooSmall {
        path: PathBuf,
        actual: u64,
        expected: u64,
    },

    /// The parity file could not be extended to the target size.
    /// Fatal-preparation class; the caller invokes
    /// [`BlockCatalog::parity_overflow`](crate::BlockCatalog::parity_overflow)
    /// before propagating this.
    #[error("could not extend parity file {path} to {wanted} bytes: {source}")]
    Extend {
        path: PathBuf,
        wanted: u64,
        #[source]
        source: std::io::Error,
    },

    /// A freshly computed hash did not match a previously recorded,
    /// trusted hash. Silent-corruption class: same handling as Fatal-I/O,
    /// but the caller should be pointed at a separate repair workflow.
    #[error(
        "hash mismatch for {path} at file position {position}: data corruption detected, run the check workflow"
    )]
    Corruption { path: PathBuf, position: u64 },

    /// `blockstart` was greater than the catalog's parity size. Usage
    /// error, rejected before any block work begins.
    #[error("starting position {blockstart} is beyond parity size {parity_size}")]
    StartBeyondParitySize {
        blockstart: u64,
        parity_size: u64,
    },

    /// The catalog's serializer failed during an autosave or final
    /// persist.
    #[error("catalog persist failed: {source}")]
    Persist {
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    /// True for the "concurrent mutation" class (spec §7): the position is
    /// skipped and a counter bumped, but the run continues.
    pub fn is_concurrent_mutation(&self) -> bool {
        matches!(self, Error::Missing { .. })
    }
}
