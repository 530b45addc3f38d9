//! Property and randomized tests for the invariants the sync engine must
//! hold regardless of which bytes happen to be on disk.

use std::fs::File;
use std::io::Write as _;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::sync::Arc;

use proptest::prelude::*;
use rand::Rng;

use parity_sync::{BufferPool, FileHandlePool, NoopProgress, SyncDriver};
use parity_testkit::{Blake2Hasher, FileParity, MemoryCatalog, XorRaidCodec};
use parity_traits::{
    Block, BlockCatalog, BlockState, Disk, DiskId, FileRef, Hasher, ParityFile, ParityLevel,
    SyncConfig,
};

const BLOCK_SIZE: usize = 8;

fn write_block_file(dir: &Path, name: &str, contents: &[u8]) -> Arc<FileRef> {
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

fn run_once(
    catalog: &mut MemoryCatalog,
    parity: &mut FileParity,
    disk_count: usize,
) -> parity_sync::SyncOutcome {
    let mut handles = FileHandlePool::new(disk_count, false);
    let mut buffers = BufferPool::new(disk_count, 1, BLOCK_SIZE);
    let codec = XorRaidCodec;
    let hasher = Blake2Hasher;
    let cfg = SyncConfig {
        block_size: BLOCK_SIZE as u32,
        level: ParityLevel::Single,
        hash_key: b"invariant-key".to_vec(),
        autosave_bytes: 0,
        skip_sequential: false,
        skip_fallocate: false,
        parity_path: "unused".into(),
        qarity_path: None,
    };
    let mut driver = SyncDriver {
        catalog,
        handles: &mut handles,
        buffers: &mut buffers,
        parity,
        qarity: None,
        codec: &codec,
        hasher: &hasher,
        config: &cfg,
    };
    driver.run(0, 1, &mut NoopProgress)
}

proptest! {
    /// Invariant 1: the parity byte written for a position is the XOR of
    /// every data disk's byte at that position, for any disk contents.
    #[test]
    fn parity_equals_xor_of_disk_contents(
        blocks in prop::collection::vec(prop::array::uniform8(any::<u8>()), 2..=4)
    ) {
        let dir = tempfile::tempdir().unwrap();
        let disk_count = blocks.len();
        let disks = (0..disk_count)
            .map(|j| Some(Disk::new(DiskId(j), format!("disk{j}"))))
            .collect();
        let mut catalog = MemoryCatalog::new(disks, vec![1; disk_count], 1);

        for (j, block_bytes) in blocks.iter().enumerate() {
            let file = write_block_file(dir.path(), &format!("f{j}"), block_bytes);
            catalog.put(j, 0, Block::file_bearing(BlockState::New, file, 0, None));
        }

        let parity_path = dir.path().join("parity.bin");
        let mut parity = FileParity::create(&parity_path, false).unwrap();
        parity.extend(BLOCK_SIZE as u64, false).unwrap();

        let outcome = run_once(&mut catalog, &mut parity, disk_count);
        prop_assert!(outcome.is_clean());

        let mut expected = [0u8; BLOCK_SIZE];
        for block_bytes in &blocks {
            for (out, &b) in expected.iter_mut().zip(block_bytes.iter()) {
                *out ^= b;
            }
        }

        let stored = std::fs::read(&parity_path).unwrap();
        prop_assert_eq!(&stored[..BLOCK_SIZE], &expected[..]);
    }

    /// Invariant 2 / 5: once a position is fully protected (`Blk`), a
    /// second run over the same range is a no-op -- the position is no
    /// longer actionable and the descriptor doesn't regress.
    #[test]
    fn second_run_over_protected_blocks_is_a_no_op(
        blocks in prop::collection::vec(prop::array::uniform8(any::<u8>()), 2..=3)
    ) {
        let dir = tempfile::tempdir().unwrap();
        let disk_count = blocks.len();
        let disks = (0..disk_count)
            .map(|j| Some(Disk::new(DiskId(j), format!("disk{j}"))))
            .collect();
        let mut catalog = MemoryCatalog::new(disks, vec![1; disk_count], 1);

        for (j, block_bytes) in blocks.iter().enumerate() {
            let file = write_block_file(dir.path(), &format!("f{j}"), block_bytes);
            catalog.put(j, 0, Block::file_bearing(BlockState::New, file, 0, None));
        }

        let parity_path = dir.path().join("parity.bin");
        let mut parity = FileParity::create(&parity_path, false).unwrap();
        parity.extend(BLOCK_SIZE as u64, false).unwrap();

        let first = run_once(&mut catalog, &mut parity, disk_count);
        prop_assert!(first.is_clean());
        for j in 0..disk_count {
            prop_assert_eq!(catalog.get(j, 0).state, BlockState::Blk);
        }
        let after_first = std::fs::read(&parity_path).unwrap();

        let second = run_once(&mut catalog, &mut parity, disk_count);
        prop_assert!(second.is_clean());
        prop_assert_eq!(second.positions_attempted, 0);
        for j in 0..disk_count {
            prop_assert_eq!(catalog.get(j, 0).state, BlockState::Blk);
        }
        let after_second = std::fs::read(&parity_path).unwrap();
        prop_assert_eq!(after_first, after_second);
    }
}

/// Invariant 6: after a committed sync, every file-bearing descriptor's
/// recorded hash matches an independent recomputation from the file's
/// actual bytes, across a handful of randomly sized arrays.
#[test]
fn committed_hash_matches_independent_recomputation() {
    let mut rng = rand::thread_rng();
    let hasher = Blake2Hasher;
    let key = b"invariant-key".to_vec();

    for _trial in 0..5 {
        let dir = tempfile::tempdir().unwrap();
        let disk_count = rng.gen_range(1..=4);
        let disks = (0..disk_count)
            .map(|j| Some(Disk::new(DiskId(j), format!("disk{j}"))))
            .collect();
        let mut catalog = MemoryCatalog::new(disks, vec![1; disk_count], 1);

        let mut contents = Vec::with_capacity(disk_count);
        for j in 0..disk_count {
            let mut block_bytes = vec![0u8; BLOCK_SIZE];
            rng.fill(block_bytes.as_mut_slice());
            let file = write_block_file(dir.path(), &format!("f{j}"), &block_bytes);
            catalog.put(j, 0, Block::file_bearing(BlockState::New, file, 0, None));
            contents.push(block_bytes);
        }

        let parity_path = dir.path().join("parity.bin");
        let mut parity = FileParity::create(&parity_path, false).unwrap();
        parity.extend(BLOCK_SIZE as u64, false).unwrap();

        let outcome = run_once(&mut catalog, &mut parity, disk_count);
        assert!(outcome.is_clean());

        for (j, block_bytes) in contents.iter().enumerate() {
            let descriptor = catalog.get(j, 0);
            assert_eq!(descriptor.state, BlockState::Blk);
            let recomputed = hasher.hash(&key, block_bytes);
            assert_eq!(descriptor.hash.unwrap().0, recomputed.0);
        }
    }
}
