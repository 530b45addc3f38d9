/// Index of a data-disk slot in the array, `0 <= id < N`.
///
/// A slot may be unoccupied in a given run (spec §6: "some possibly null");
/// its data is then treated as all-zero for every position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiskId(pub usize);

/// A named data source owning a sparse, index-addressable array of [`Block`](crate::Block)
/// descriptors, indexed by [`Position`](crate::Position).
///
/// The array itself lives behind the `BlockCatalog` collaborator (out of
/// scope for this crate); `Disk` only carries the identity needed to look
/// a disk's slot up in the catalog and in the `FileHandlePool`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disk {
    pub id: DiskId,
    pub name: String,
}

impl Disk {
    pub fn new(id: DiskId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
