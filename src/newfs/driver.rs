//! The block driver: an opaque handle offering `open`/`seek`/fixed-size
//! `read`/`write` plus an `ioctl`-style query for device geometry.
//!
//! The engine itself never assumes anything about the backing store beyond
//! this trait; [`FileDriver`] is the one concrete implementation it ships,
//! usable against both real block/char devices and plain disk-image files.

use crate::error::{Error, Result};
use libc::ioctl;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::io::{Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;

/// ioctl macro: command encoding, mirroring the kernel's `_IOR` shape.
macro_rules! ior {
    ($ty:expr, $nr:expr, $sz:expr) => {
        (2u64 << 30) | (($ty) << 8) | ($nr) | (($sz) << 16)
    };
}

/// ioctl command: get the size of the block device in bytes (`BLKGETSIZE64`).
const BLKGETSIZE64: u64 = ior!(0x12, 114, 8);
/// ioctl command: get the logical sector size in bytes (`BLKSSZGET`).
const BLKSSZGET: u64 = ior!(0x12, 104, std::mem::size_of::<libc::c_int>() as u64);

/// A block-addressed driver device.
///
/// An opaque handle: `open`, `close` (via `Drop`), `seek`, fixed-size
/// `read`/`write`, and an `ioctl` returning device size and I/O unit size.
pub trait BlockDriver {
    /// Returns the size of the device in bytes.
    fn device_size(&self) -> u64;

    /// Returns the size of one I/O unit in bytes (`U`).
    fn io_unit_size(&self) -> u64;

    /// Seeks to `offset` bytes from the start of the device.
    fn seek(&mut self, offset: u64) -> Result<()>;

    /// Reads exactly one I/O unit into `buf`.
    ///
    /// `buf` must be exactly [`BlockDriver::io_unit_size`] bytes long.
    fn read_unit(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Writes exactly one I/O unit from `buf`.
    ///
    /// `buf` must be exactly [`BlockDriver::io_unit_size`] bytes long.
    fn write_unit(&mut self, buf: &[u8]) -> Result<()>;
}

/// A driver backed by a `std::fs::File`: a real block/char device, or a
/// plain regular file standing in for one (disk images, tests).
pub struct FileDriver {
    file: File,
    device_size: u64,
    io_unit_size: u64,
}

impl FileDriver {
    /// Opens the device at `path` for reading and writing.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let metadata = file.metadata()?;
        let file_type = metadata.file_type();

        let (device_size, io_unit_size) = if file_type.is_block_device() || file_type.is_char_device()
        {
            (Self::query_device_size(&file)?, Self::query_io_unit_size(&file)?)
        } else {
            // Plain file: fall back to its length and a conventional sector
            // size, matching `mkfs`'s own `sector_size = 512` fallback.
            (metadata.len(), 512)
        };

        Ok(Self {
            file,
            device_size,
            io_unit_size,
        })
    }

    fn query_device_size(file: &File) -> Result<u64> {
        let mut size: u64 = 0;
        let ret = unsafe { ioctl(file.as_raw_fd(), BLKGETSIZE64 as _, &mut size) };
        if ret < 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(size)
    }

    fn query_io_unit_size(file: &File) -> Result<u64> {
        let mut size: libc::c_int = 0;
        let ret = unsafe { ioctl(file.as_raw_fd(), BLKSSZGET as _, &mut size) };
        if ret < 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(size as u64)
    }
}

impl BlockDriver for FileDriver {
    fn device_size(&self) -> u64 {
        self.device_size
    }

    fn io_unit_size(&self) -> u64 {
        self.io_unit_size
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|_| Error::Seek)?;
        Ok(())
    }

    fn read_unit(&mut self, buf: &mut [u8]) -> Result<()> {
        debug_assert_eq!(buf.len() as u64, self.io_unit_size);
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn write_unit(&mut self, buf: &[u8]) -> Result<()> {
        debug_assert_eq!(buf.len() as u64, self.io_unit_size);
        self.file.write_all(buf)?;
        Ok(())
    }
}
