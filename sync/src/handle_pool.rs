use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::os::unix::fs::FileExt;
use std::os::unix::fs::MetadataExt;
use std::sync::Arc;

use parity_traits::{Error, FileRef};

/// The `stat` snapshot captured at the moment a data file was opened,
/// compared against the catalog's recorded file metadata to detect
/// concurrent modification (spec §4.1, §4.4 step C3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatSnapshot {
    pub size: u64,
    pub mtime_sec: i64,
    pub mtime_nsec: u32,
    pub inode: u64,
}

impl StatSnapshot {
    fn from_metadata(meta: &std::fs::Metadata) -> Self {
        Self {
            size: meta.len(),
            mtime_sec: meta.mtime(),
            mtime_nsec: meta.mtime_nsec() as u32,
            inode: meta.ino(),
        }
    }

    /// True iff this snapshot still matches the file the catalog expects
    /// at this position (spec §4.4 step C3).
    pub fn matches(&self, expected: &FileRef) -> bool {
        expected.matches_stat(self.size, self.mtime_sec, self.mtime_nsec, self.inode)
    }
}

struct OpenSlot {
    file: Arc<FileRef>,
    handle: File,
    stat: StatSnapshot,
}

/// One open-file handle per data-disk slot, opened lazily and kept across
/// positions so sequential read patterns aren't defeated by needless
/// reopens (spec §4.1 C5).
pub struct FileHandlePool {
    slots: Vec<Option<OpenSlot>>,
    #[allow(dead_code)]
    skip_sequential: bool,
}

impl FileHandlePool {
    pub fn new(disk_count: usize, skip_sequential: bool) -> Self {
        Self {
            slots: (0..disk_count).map(|_| None).collect(),
            skip_sequential,
        }
    }

    /// Ensure slot `j` currently has `file` open, opening (or reopening,
    /// if the slot held a different file) as needed. Returns the
    /// open-time stat snapshot.
    ///
    /// Errors are pre-classified per spec §4.4 step C2: `Error::Missing`
    /// for `ENOENT` (concurrent deletion, non-fatal), `Error::Denied` for
    /// permission failures, `Error::Open`/`Error::Close` otherwise
    /// (fatal).
    pub fn ensure_open(&mut self, j: usize, file: &Arc<FileRef>) -> Result<StatSnapshot, Error> {
        let needs_reopen = match &self.slots[j] {
            Some(slot) => !Arc::ptr_eq(&slot.file, file) && slot.file.path != file.path,
            None => true,
        };

        if needs_reopen {
            if let Some(slot) = self.slots[j].take() {
                drop(slot.handle);
            }

            // Hint the kernel that reads will be sequential (skipped when
            // `skip_sequential` is set). A real implementation would issue
            // posix_fadvise(POSIX_FADV_SEQUENTIAL) here; omitted for now
            // since it's an optimization hint, not a correctness
            // requirement -- see car/plain.rs's own fadvise "Future work"
            // note for the same tradeoff made elsewhere in this style of
            // codebase.
            let handle = OpenOptions::new().read(true).open(&file.path).map_err(|source| {
                match source.kind() {
                    ErrorKind::NotFound => Error::Missing {
                        path: file.path.clone(),
                    },
                    ErrorKind::PermissionDenied => Error::Denied {
                        path: file.path.clone(),
                    },
                    _ => Error::Open {
                        path: file.path.clone(),
                        source,
                    },
                }
            })?;

            let meta = handle.metadata().map_err(|source| Error::Open {
                path: file.path.clone(),
                source,
            })?;
            let stat = StatSnapshot::from_metadata(&meta);

            self.slots[j] = Some(OpenSlot {
                file: Arc::clone(file),
                handle,
                stat,
            });
        }

        Ok(self.slots[j].as_ref().expect("just opened").stat)
    }

    /// Read `buf.len()` bytes starting at `position_in_file * buf.len()`
    /// from the currently open file in slot `j`. A short read at EOF is
    /// zero-padded; the actual byte count read from the file is returned.
    pub fn read(
        &mut self,
        j: usize,
        offset: u64,
        buf: &mut [u8],
    ) -> Result<usize, Error> {
        let slot = self.slots[j].as_ref().expect("ensure_open called first");
        let mut total = 0usize;
        loop {
            match slot.handle.read_at(&mut buf[total..], offset + total as u64) {
                Ok(0) => break,
                Ok(n) => {
                    total += n;
                    if total == buf.len() {
                        break;
                    }
                }
                Err(source) => {
                    return Err(Error::Read {
                        path: slot.file.path.clone(),
                        source,
                    })
                }
            }
        }
        for byte in &mut buf[total..] {
            *byte = 0;
        }
        Ok(total)
    }

    /// Close every open slot. Individual close failures are reported via
    /// the returned list of errors but do not prevent closing the rest
    /// (spec §7 "cleanup-noisy").
    pub fn close_all(&mut self) -> Vec<Error> {
        let mut errors = Vec::new();
        for slot in self.slots.iter_mut() {
            if let Some(open) = slot.take() {
                // std::fs::File has no explicit close(); drop() is
                // infallible in safe Rust, but the underlying close(2)
                // can still fail. We surface that via a best-effort
                // sync_all() immediately before drop, matching the
                // "close failure" observability the spec calls for
                // without relying on unsafe raw-fd handling.
                if let Err(source) = open.handle.sync_all() {
                    errors.push(Error::Close {
                        path: open.file.path.clone(),
                        source,
                    });
                }
                drop(open.handle);
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &std::path::Path, name: &str, contents: &[u8]) -> Arc<FileRef> {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents).unwrap();
        drop(f);
        let meta = std::fs::metadata(&path).unwrap();
        Arc::new(FileRef::new(
            path,
            meta.len(),
            meta.mtime(),
            meta.mtime_nsec() as u32,
            meta.ino(),
        ))
    }

    #[test]
    fn opens_and_reads_whole_blocks() {
        let dir = tempdir().unwrap();
        let file = write_file(dir.path(), "a", &[1u8; 8]);
        let mut pool = FileHandlePool::new(1, false);
        let stat = pool.ensure_open(0, &file).unwrap();
        assert!(stat.matches(&file));

        let mut buf = [0u8; 4];
        let n = pool.read(0, 0, &mut buf).unwrap();
        assert_eq!(n, 4);
        assert_eq!(buf, [1u8; 4]);
    }

    #[test]
    fn short_read_at_eof_is_zero_padded() {
        let dir = tempdir().unwrap();
        let file = write_file(dir.path(), "a", &[9u8; 3]);
        let mut pool = FileHandlePool::new(1, false);
        pool.ensure_open(0, &file).unwrap();

        let mut buf = [0xAAu8; 8];
        let n = pool.read(0, 0, &mut buf).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..3], &[9u8; 3]);
        assert_eq!(&buf[3..], &[0u8; 5]);
    }

    #[test]
    fn missing_file_classifies_as_missing() {
        let dir = tempdir().unwrap();
        let ghost = Arc::new(FileRef::new(dir.path().join("ghost"), 0, 0, 0, 0));
        let mut pool = FileHandlePool::new(1, false);
        let err = pool.ensure_open(0, &ghost).unwrap_err();
        assert!(matches!(err, Error::Missing { .. }));
    }

    #[test]
    fn reopen_on_file_change_closes_previous_handle() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a", &[1u8; 4]);
        let b = write_file(dir.path(), "b", &[2u8; 4]);
        let mut pool = FileHandlePool::new(1, false);
        pool.ensure_open(0, &a).unwrap();
        pool.ensure_open(0, &b).unwrap();

        let mut buf = [0u8; 4];
        pool.read(0, 0, &mut buf).unwrap();
        assert_eq!(buf, [2u8; 4]);
    }
}
