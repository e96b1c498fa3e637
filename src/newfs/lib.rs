//! `newfs`: a fixed-layout userspace filesystem storage engine.
//!
//! This crate implements the on-disk format and in-memory graph described
//! in `SPEC_FULL.md` — superblock, bitmaps, inode table, and data region
//! laid out over a block device in four contiguous regions — without the
//! FUSE glue or VFS adapter an embedding program would add on top.

pub mod alloc;
pub mod bitmap;
pub mod codec;
pub mod dentry;
pub mod device;
pub mod driver;
pub mod error;
pub mod fs;
pub mod inode;
pub mod layout;
pub mod path;
pub mod util;

pub use bitmap::Bitmap;
pub use dentry::{Dentry, DentryId};
pub use driver::{BlockDriver, FileDriver};
pub use error::{Error, Result};
pub use fs::{Filesystem, MountOptions};
pub use inode::{Inode, InodeId};
pub use layout::FileType;
pub use path::{calc_lvl, get_fname, Lookup};
