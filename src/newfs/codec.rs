//! The serialization codec: `sync_inode`'s recursive depth-first
//! flush and `read_inode`'s lazy load.

use crate::dentry::{Dentry, DentryId};
use crate::dentry::DentryRecord;
use crate::driver::BlockDriver;
use crate::error::Result;
use crate::fs::Filesystem;
use crate::inode::{Inode, InodeId, InodeRecord};
use crate::layout::{DENTRY_RECORD_SIZE, BLOCKS_PER_FILE};

impl<D: BlockDriver> Filesystem<D> {
    /// Recursively flushes `inode` and, for directories, every child whose
    /// inode has been touched in memory.
    ///
    /// Both the inode record and any directory data are addressed using
    /// the data-region base consistently.
    pub fn sync_inode(&mut self, inode_id: InodeId) -> Result<()> {
        let ino = self.inode(inode_id).ino;
        let record = {
            let inode = self.inode(inode_id);
            InodeRecord {
                ino: inode.ino,
                size: inode.size,
                target_path: inode.target_path.clone(),
                dir_cnt: inode.dir_cnt,
                ftype: inode.ftype,
                bno: inode.bno,
            }
        };
        self.device.write(self.layout.inode_offset(ino), &record.encode())?;

        if self.inode(inode_id).is_dir() {
            self.sync_dir_entries(inode_id)?;
        } else if self.inode(inode_id).is_regular() {
            let bno = self.inode(inode_id).bno;
            let data = self
                .inode(inode_id)
                .data
                .as_ref()
                .expect("regular file always has data buffers")
                .clone();
            for k in 0..BLOCKS_PER_FILE {
                let off = self.layout.data_block_offset(bno[k]);
                self.device.write(off, &data[k])?;
            }
        }
        // Symlinks persist only the target path, already in the record.
        Ok(())
    }

    fn sync_dir_entries(&mut self, inode_id: InodeId) -> Result<()> {
        let bno = self.inode(inode_id).bno;
        let block_size = self.device.block_size() as usize;
        let per_block = block_size / DENTRY_RECORD_SIZE;

        let mut cursor = self.inode(inode_id).children;
        'blocks: for k in 0..BLOCKS_PER_FILE {
            let block_off = self.layout.data_block_offset(bno[k]);
            for slot in 0..per_block {
                let Some(child) = cursor else {
                    break 'blocks;
                };
                let record = DentryRecord {
                    fname: self.dentry(child).fname.clone(),
                    ftype: self.dentry(child).ftype,
                    ino: self.dentry(child).ino,
                };
                let off = block_off + (slot * DENTRY_RECORD_SIZE) as u64;
                self.device.write(off, &record.encode())?;

                if let Some(child_inode) = self.dentry(child).inode {
                    self.sync_inode(child_inode)?;
                }
                cursor = self.dentry(child).sibling;
            }
        }
        Ok(())
    }

    /// Loads the on-disk inode `ino` into memory, attaching it to
    /// `dentry` by back-reference only. The caller is responsible for
    /// setting `dentry.inode` once this returns.
    pub fn read_inode(&mut self, dentry: DentryId, ino: u32) -> Result<InodeId> {
        let mut buf = vec![0u8; crate::layout::INODE_RECORD_SIZE];
        self.device.read(self.layout.inode_offset(ino), &mut buf)?;
        let record = InodeRecord::decode(&buf)?;

        let inode = Inode {
            ino: record.ino,
            size: record.size,
            target_path: record.target_path,
            dir_cnt: 0,
            ftype: record.ftype,
            bno: record.bno,
            dentry,
            children: None,
            data: None,
        };
        let inode_id = self.push_inode(inode);

        if self.inode(inode_id).is_dir() {
            self.read_dir_entries(inode_id, record.dir_cnt)?;
        } else if self.inode(inode_id).is_regular() {
            let bno = self.inode(inode_id).bno;
            let block_size = self.device.block_size() as usize;
            let mut buffers: [Vec<u8>; BLOCKS_PER_FILE] = Default::default();
            for k in 0..BLOCKS_PER_FILE {
                let mut block_buf = vec![0u8; block_size];
                self.device.read(self.layout.data_block_offset(bno[k]), &mut block_buf)?;
                buffers[k] = block_buf;
            }
            self.inode_mut(inode_id).data = Some(buffers);
        }

        Ok(inode_id)
    }

    fn read_dir_entries(&mut self, inode_id: InodeId, dir_cnt: u32) -> Result<()> {
        let bno = self.inode(inode_id).bno;
        let block_size = self.device.block_size() as usize;
        let per_block = block_size / DENTRY_RECORD_SIZE;

        let mut remaining = dir_cnt as usize;
        let mut buf = vec![0u8; DENTRY_RECORD_SIZE];
        'blocks: for k in 0..BLOCKS_PER_FILE {
            let block_off = self.layout.data_block_offset(bno[k]);
            for slot in 0..per_block {
                if remaining == 0 {
                    break 'blocks;
                }
                let off = block_off + (slot * DENTRY_RECORD_SIZE) as u64;
                self.device.read(off, &mut buf)?;
                let record = DentryRecord::decode(&buf)?;

                let mut child = Dentry::new(record.fname, record.ftype);
                child.ino = record.ino;
                let child_id = self.push_dentry(child);
                self.alloc_dentry(inode_id, child_id)?;

                remaining -= 1;
            }
        }
        Ok(())
    }
}
