//! The allocator: first-fit over the inode and data bitmaps, with
//! the inode/dentry attachment `alloc_inode` performs as a post-condition.

use crate::dentry::DentryId;
use crate::driver::BlockDriver;
use crate::error::{Error, Result};
use crate::fs::{require_dir, Filesystem};
use crate::inode::{Inode, InodeId};
use crate::layout::BLOCKS_PER_FILE;

impl<D: BlockDriver> Filesystem<D> {
    /// Allocates a fresh inode for `dentry`, reserving `BLOCKS_PER_FILE`
    /// data blocks for it.
    ///
    /// On data-bitmap exhaustion, rolls back both the partial data
    /// reservations and the inode reservation before returning
    /// `Error::NoSpace`, leaving no inode bit set without its data blocks.
    pub fn alloc_inode(&mut self, dentry: DentryId) -> Result<InodeId> {
        let ino = self.inode_bitmap.alloc_first_fit().ok_or(Error::NoSpace)?;

        let mut bno = [0u32; BLOCKS_PER_FILE];
        let mut reserved = 0;
        while reserved < BLOCKS_PER_FILE {
            match self.data_bitmap.alloc_first_fit() {
                Some(b) => {
                    bno[reserved] = b as u32;
                    reserved += 1;
                }
                None => break,
            }
        }

        if reserved < BLOCKS_PER_FILE {
            // Roll back every block reserved so far, then the inode bit.
            for &b in &bno[..reserved] {
                self.data_bitmap.clear(b as usize);
            }
            self.inode_bitmap.clear(ino);
            return Err(Error::NoSpace);
        }

        let ftype = self.dentry(dentry).ftype;
        let data = if ftype == crate::layout::FileType::Regular {
            let block_size = self.device.block_size() as usize;
            Some(std::array::from_fn(|_| vec![0u8; block_size]))
        } else {
            None
        };

        let inode = Inode {
            ino: ino as u32,
            size: 0,
            target_path: String::new(),
            dir_cnt: 0,
            ftype,
            bno,
            dentry,
            children: None,
            data,
        };
        let inode_id = self.push_inode(inode);

        let d = self.dentry_mut(dentry);
        d.inode = Some(inode_id);
        d.ino = ino as u32;

        Ok(inode_id)
    }

    /// Head-inserts `dentry` into `inode`'s child list and returns the new
    /// `dir_cnt`.
    ///
    /// `inode` must be a directory; this is checked and reported as
    /// `Error::Inval` rather than silently corrupting a file's data blocks.
    ///
    /// Also sets `dentry.parent` to `inode`'s own dentry, mirroring what
    /// `read_inode` does for children it loads from disk, so the parent
    /// link is consistent regardless of how a dentry entered memory.
    pub fn alloc_dentry(&mut self, inode: InodeId, dentry: DentryId) -> Result<u32> {
        require_dir(self, inode)?;

        let parent = self.inode(inode).dentry;
        let prev_head = self.inode(inode).children;

        let d = self.dentry_mut(dentry);
        d.sibling = prev_head;
        d.parent = Some(parent);

        let i = self.inode_mut(inode);
        i.children = Some(dentry);
        i.dir_cnt += 1;
        Ok(i.dir_cnt)
    }
}
