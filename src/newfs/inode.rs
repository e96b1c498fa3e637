//! Inodes: the on-disk record and the in-memory node stored in the
//! filesystem's inode arena.

use crate::dentry::DentryId;
use crate::layout::{self, FileType, Reader, Writer, BLOCKS_PER_FILE, INODE_RECORD_SIZE, NAME_LEN};

/// An index into the filesystem's inode arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InodeId(pub u32);

/// The on-disk inode record: fixed size, one per logical block in the
/// inode table.
#[derive(Debug, Clone)]
pub struct InodeRecord {
    pub ino: u32,
    pub size: u32,
    pub target_path: String,
    pub dir_cnt: u32,
    pub ftype: FileType,
    pub bno: [u32; BLOCKS_PER_FILE],
}

impl InodeRecord {
    pub fn encode(&self) -> [u8; INODE_RECORD_SIZE] {
        let mut buf = [0u8; INODE_RECORD_SIZE];
        let mut w = Writer::new(&mut buf);
        w.put_u32(self.ino);
        w.put_u32(self.size);
        w.put_bytes(&layout::pack_name(&self.target_path));
        w.put_u32(self.dir_cnt);
        w.put_u32(self.ftype as u32);
        for b in self.bno {
            w.put_u32(b);
        }
        buf
    }

    pub fn decode(buf: &[u8]) -> crate::error::Result<Self> {
        let mut r = Reader::new(buf);
        let ino = r.get_u32();
        let size = r.get_u32();
        let target_path = layout::unpack_name(r.get_bytes(NAME_LEN));
        let dir_cnt = r.get_u32();
        let ftype = FileType::from_u32(r.get_u32())?;
        let mut bno = [0u32; BLOCKS_PER_FILE];
        for b in &mut bno {
            *b = r.get_u32();
        }
        Ok(Self {
            ino,
            size,
            target_path,
            dir_cnt,
            ftype,
            bno,
        })
    }
}

/// The in-memory inode.
///
/// Per 's design note, the back-reference to its dentry is an id into the
/// dentry arena, not an owning pointer. `children` is the head of the
/// directory's child dentry list (also an id), populated lazily by
/// `read_inode` or directly by `alloc_dentry`.
pub struct Inode {
    pub ino: u32,
    pub size: u32,
    pub target_path: String,
    pub dir_cnt: u32,
    pub ftype: FileType,
    pub bno: [u32; BLOCKS_PER_FILE],
    pub dentry: DentryId,
    pub children: Option<DentryId>,
    /// In-memory data buffers, one per reserved block, regular files only.
    pub data: Option<[Vec<u8>; BLOCKS_PER_FILE]>,
}

impl Inode {
    pub fn is_dir(&self) -> bool {
        self.ftype == FileType::Directory
    }

    pub fn is_regular(&self) -> bool {
        self.ftype == FileType::Regular
    }

    pub fn is_symlink(&self) -> bool {
        self.ftype == FileType::Symlink
    }
}
