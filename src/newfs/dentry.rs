//! Directory entries: the on-disk record and the in-memory node stored
//! in the filesystem's dentry arena.

use crate::inode::InodeId;
use crate::layout::{self, FileType, Reader, Writer, DENTRY_RECORD_SIZE, NAME_LEN};

/// An index into the filesystem's dentry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DentryId(pub u32);

/// The on-disk directory-entry record: fixed size, packed
/// contiguously from the start of each directory data block.
#[derive(Debug, Clone)]
pub struct DentryRecord {
    pub fname: String,
    pub ftype: FileType,
    pub ino: u32,
}

impl DentryRecord {
    pub fn encode(&self) -> [u8; DENTRY_RECORD_SIZE] {
        let mut buf = [0u8; DENTRY_RECORD_SIZE];
        let mut w = Writer::new(&mut buf);
        w.put_bytes(&layout::pack_name(&self.fname));
        w.put_u32(self.ftype as u32);
        w.put_u32(self.ino);
        buf
    }

    pub fn decode(buf: &[u8]) -> crate::error::Result<Self> {
        let mut r = Reader::new(buf);
        let fname = layout::unpack_name(r.get_bytes(NAME_LEN));
        let ftype = FileType::from_u32(r.get_u32())?;
        let ino = r.get_u32();
        Ok(Self { fname, ftype, ino })
    }
}

/// The in-memory dentry.
///
/// `parent` and `sibling` are ids into the dentry arena rather than owning
/// pointers; `inode` is `None` until the dentry is resolved by
/// `read_inode`.
pub struct Dentry {
    pub fname: String,
    pub parent: Option<DentryId>,
    pub sibling: Option<DentryId>,
    pub ino: u32,
    pub inode: Option<InodeId>,
    pub ftype: FileType,
}

impl Dentry {
    /// Creates a detached dentry with no inode attached yet.
    pub fn new(fname: String, ftype: FileType) -> Self {
        Self {
            fname,
            parent: None,
            sibling: None,
            ino: 0,
            inode: None,
            ftype,
        }
    }
}
