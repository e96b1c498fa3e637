//! Mount/unmount lifecycle and the filesystem's public operations. This is
//! the in-memory superblock: it owns the device, the bitmaps, and the
//! dentry/inode arenas for one mount.

use crate::bitmap::Bitmap;
use crate::dentry::{Dentry, DentryId};
use crate::device::Device;
use crate::driver::{BlockDriver, FileDriver};
use crate::error::{Error, Result};
use crate::inode::{Inode, InodeId};
use crate::layout::{FileType, Layout, SuperblockRecord, MAX_DATA, MAX_INO, ROOT_INO,
    SUPERBLOCK_RECORD_SIZE};
use std::path::PathBuf;

/// Options passed to [`Filesystem::mount`].
pub struct MountOptions {
    /// Path to the block device (or disk-image file) to mount.
    pub device: PathBuf,
}

/// The mounted filesystem: device, bitmaps, and the in-memory dentry/inode
/// graph, all owned by one value.
pub struct Filesystem<D: BlockDriver> {
    pub(crate) device: Device<D>,
    pub(crate) layout: Layout,
    pub(crate) inode_bitmap: Bitmap,
    pub(crate) data_bitmap: Bitmap,
    pub(crate) dentries: Vec<Dentry>,
    pub(crate) inodes: Vec<Inode>,
    pub(crate) root: Option<DentryId>,
    pub(crate) mounted: bool,
}

impl Filesystem<FileDriver> {
    /// Mounts the filesystem found at `options.device`, opening the file
    /// driver concretization of the block device.
    pub fn mount(options: MountOptions) -> Result<Self> {
        let driver = FileDriver::open(&options.device)?;
        Self::mount_with_driver(driver)
    }
}

impl<D: BlockDriver> Filesystem<D> {
    /// Mounts the filesystem over an already-open driver.
    pub fn mount_with_driver(driver: D) -> Result<Self> {
        let mut device = Device::new(driver);
        let block_size = device.block_size();

        let mut sb_buf = [0u8; SUPERBLOCK_RECORD_SIZE];
        device.read(0, &mut sb_buf)?;
        let sb_record = SuperblockRecord::decode(&sb_buf);

        let fresh = sb_record.magic != crate::layout::MAGIC;
        let layout = Layout::new(block_size);

        let mut fs = Self {
            device,
            layout,
            inode_bitmap: Bitmap::new(MAX_INO),
            data_bitmap: Bitmap::new(MAX_DATA),
            dentries: Vec::new(),
            inodes: Vec::new(),
            root: None,
            mounted: false,
        };

        if fresh {
            // Step 3-4: fresh layout, zeroed bitmaps already in memory.
            let sb = SuperblockRecord::fresh(&fs.layout);
            fs.device.write(0, &sb.encode())?;
            fs.write_bitmaps()?;

            // Step 5: allocate and sync the root directory.
            let root_dentry = fs.push_dentry(Dentry::new("/".to_owned(), FileType::Directory));
            fs.root = Some(root_dentry);
            let root_inode = fs.alloc_inode(root_dentry)?;
            fs.sync_inode(root_inode)?;
        } else {
            // Step 4: load the bitmaps from disk.
            let mut inode_bits = vec![0u8; crate::util::ceil_div(MAX_INO as u64, 8) as usize];
            fs.device.read(fs.layout.inode_bitmap_offset, &mut inode_bits)?;
            fs.inode_bitmap = Bitmap::from_bytes(inode_bits, MAX_INO);

            let mut data_bits = vec![0u8; crate::util::ceil_div(MAX_DATA as u64, 8) as usize];
            fs.device.read(fs.layout.data_bitmap_offset, &mut data_bits)?;
            fs.data_bitmap = Bitmap::from_bytes(data_bits, MAX_DATA);

            let root_dentry = fs.push_dentry(Dentry::new("/".to_owned(), FileType::Directory));
            fs.root = Some(root_dentry);
        }

        // Step 6: read the root inode (idempotent on the fresh path, since
        // nothing else touched `root_dentry` in between).
        let root_dentry = fs.root.unwrap();
        let root_inode = fs.read_inode(root_dentry, ROOT_INO)?;
        fs.dentry_mut(root_dentry).inode = Some(root_inode);
        fs.dentry_mut(root_dentry).ino = ROOT_INO;

        fs.mounted = true;
        Ok(fs)
    }

    /// Unmounts the filesystem. A no-op if already
    /// unmounted, so callers may call it more than once.
    pub fn umount(&mut self) -> Result<()> {
        if !self.mounted {
            return Ok(());
        }

        let root_dentry = self.root.expect("mounted filesystem has a root");
        if let Some(root_inode) = self.dentry(root_dentry).inode {
            self.sync_inode(root_inode)?;
        }

        let sb = SuperblockRecord::fresh(&self.layout);
        self.device.write(0, &sb.encode())?;
        self.write_bitmaps()?;

        self.mounted = false;
        Ok(())
    }

    /// Returns the `index`-th child of `inode` in sibling-list order
    /// (newest-first, since `alloc_dentry` head-inserts).
    pub fn get_dentry(&self, inode: InodeId, index: usize) -> Option<DentryId> {
        let mut cur = self.inode(inode).children;
        let mut remaining = index;
        while let Some(id) = cur {
            if remaining == 0 {
                return Some(id);
            }
            remaining -= 1;
            cur = self.dentry(id).sibling;
        }
        None
    }

    /// The root dentry of the mounted filesystem.
    pub fn root(&self) -> DentryId {
        self.root.expect("filesystem is mounted")
    }

    pub fn dentry(&self, id: DentryId) -> &Dentry {
        &self.dentries[id.0 as usize]
    }

    pub fn dentry_mut(&mut self, id: DentryId) -> &mut Dentry {
        &mut self.dentries[id.0 as usize]
    }

    /// The inode-allocation bitmap, exposed read-only for the bitmap
    /// consistency invariant.
    pub fn inode_bitmap(&self) -> &Bitmap {
        &self.inode_bitmap
    }

    /// The data-block allocation bitmap, exposed read-only for the bitmap
    /// consistency invariant.
    pub fn data_bitmap(&self) -> &Bitmap {
        &self.data_bitmap
    }

    pub fn inode(&self, id: InodeId) -> &Inode {
        &self.inodes[id.0 as usize]
    }

    pub fn inode_mut(&mut self, id: InodeId) -> &mut Inode {
        &mut self.inodes[id.0 as usize]
    }

    /// Inserts a detached dentry into the arena and returns its id. The
    /// caller attaches it to a parent via `alloc_dentry`.
    pub fn push_dentry(&mut self, d: Dentry) -> DentryId {
        let id = DentryId(self.dentries.len() as u32);
        self.dentries.push(d);
        id
    }

    /// Inserts an inode into the arena and returns its id.
    pub fn push_inode(&mut self, i: Inode) -> InodeId {
        let id = InodeId(self.inodes.len() as u32);
        self.inodes.push(i);
        id
    }

    fn write_bitmaps(&mut self) -> Result<()> {
        let inode_bytes = self.inode_bitmap.as_bytes().to_vec();
        self.device.write(self.layout.inode_bitmap_offset, &inode_bytes)?;
        let data_bytes = self.data_bitmap.as_bytes().to_vec();
        self.device.write(self.layout.data_bitmap_offset, &data_bytes)?;
        Ok(())
    }
}

impl<D: BlockDriver> Drop for Filesystem<D> {
    fn drop(&mut self) {
        let _ = self.umount();
    }
}

/// Checks that `id` refers to a loaded directory, or returns
/// `Error::Inval`. Used before attaching a child dentry to it.
pub(crate) fn require_dir<D: BlockDriver>(fs: &Filesystem<D>, id: InodeId) -> Result<()> {
    if fs.inode(id).is_dir() {
        Ok(())
    } else {
        Err(Error::Inval)
    }
}
