use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use parity_traits::{Error, ParityFile};

/// `ParityFile` backed by a plain `std::fs::File`, using positioned writes
/// (`pwrite`) so sync's per-position writes don't need to track or
/// serialize a shared cursor.
#[derive(Debug)]
pub struct FileParity {
    path: PathBuf,
    file: File,
}

impl ParityFile for FileParity {
    fn create(path: &Path, _skip_sequential: bool) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|source| Error::Create {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    fn size(&self) -> Result<u64, Error> {
        self.file
            .metadata()
            .map(|m| m.len())
            .map_err(|source| Error::Create {
                path: self.path.clone(),
                source,
            })
    }

    fn extend(&mut self, new_len: u64, _skip_fallocate: bool) -> Result<(), Error> {
        self.file
            .set_len(new_len)
            .map_err(|source| Error::Extend {
                path: self.path.clone(),
                wanted: new_len,
                source,
            })
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<(), Error> {
        self.file
            .write_all_at(buf, offset)
            .map_err(|source| Error::Write {
                path: self.path.clone(),
                source,
            })
    }

    fn fsync(&mut self) -> Result<(), Error> {
        self.file.sync_all().map_err(|source| Error::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn close(self) -> Result<(), Error> {
        drop(self.file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn extend_then_write_then_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("parity.bin");
        let mut parity = FileParity::create(&path, false).unwrap();
        parity.extend(4096, false).unwrap();
        assert_eq!(parity.size().unwrap(), 4096);
        let payload = vec![0x42u8; 1024];
        parity.write_at(1024, &payload).unwrap();
        parity.fsync().unwrap();
        parity.close().unwrap();

        let contents = std::fs::read(&path).unwrap();
        assert_eq!(contents.len(), 4096);
        assert_eq!(&contents[1024..2048], &payload[..]);
        assert!(contents[..1024].iter().all(|&b| b == 0));
    }
}
