//! The block device adapter: byte-granular `read`/`write` over a
//! [`BlockDriver`] that only speaks fixed `U`-byte transfers.
//!
//! The driver accepts only `U`-byte transfers at `U`-aligned offsets, but
//! the rest of the engine reasons in logical blocks and arbitrary byte
//! ranges (e.g. a 4-byte superblock field at an arbitrary offset). This
//! adapter hides both mismatches by aligning every request down to a
//! logical-block boundary and issuing back-to-back `U`-byte transfers.

use crate::driver::BlockDriver;
use crate::error::Result;

/// Wraps a [`BlockDriver`] to offer byte-addressed, arbitrary-length
/// `read`/`write` in terms of the driver's fixed I/O unit.
pub struct Device<D: BlockDriver> {
    driver: D,
    /// The logical block size `B = 2 * U`.
    block_size: u64,
}

impl<D: BlockDriver> Device<D> {
    /// Wraps `driver`, deriving the logical block size from its I/O unit.
    pub fn new(driver: D) -> Self {
        let block_size = 2 * driver.io_unit_size();
        Self { driver, block_size }
    }

    /// The logical block size `B`.
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// The device's I/O unit size `U`.
    pub fn io_unit_size(&self) -> u64 {
        self.driver.io_unit_size()
    }

    /// The device's total size in bytes.
    pub fn device_size(&self) -> u64 {
        self.driver.device_size()
    }

    /// Reads `buf.len()` bytes starting at byte `offset`.
    pub fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let (offset_aligned, bias) = self.align_down(offset);
        let size_aligned = self.align_up(buf.len() as u64 + bias);
        let mut scratch = vec![0u8; size_aligned as usize];
        self.read_aligned(offset_aligned, &mut scratch)?;
        buf.copy_from_slice(&scratch[bias as usize..bias as usize + buf.len()]);
        Ok(())
    }

    /// Writes `buf` starting at byte `offset`, via read-modify-write on the
    /// aligned region.
    pub fn write(&mut self, offset: u64, buf: &[u8]) -> Result<()> {
        let (offset_aligned, bias) = self.align_down(offset);
        let size_aligned = self.align_up(buf.len() as u64 + bias);
        let mut scratch = vec![0u8; size_aligned as usize];
        self.read_aligned(offset_aligned, &mut scratch)?;
        scratch[bias as usize..bias as usize + buf.len()].copy_from_slice(buf);
        self.write_aligned(offset_aligned, &scratch)
    }

    fn align_down(&self, offset: u64) -> (u64, u64) {
        let offset_aligned = (offset / self.block_size) * self.block_size;
        (offset_aligned, offset - offset_aligned)
    }

    fn align_up(&self, size: u64) -> u64 {
        crate::util::ceil_div(size, self.block_size) * self.block_size
    }

    fn read_aligned(&mut self, offset_aligned: u64, buf: &mut [u8]) -> Result<()> {
        debug_assert_eq!(buf.len() as u64 % self.block_size, 0);
        let unit = self.driver.io_unit_size() as usize;
        self.driver.seek(offset_aligned)?;
        for chunk in buf.chunks_mut(unit) {
            self.driver.read_unit(chunk)?;
        }
        Ok(())
    }

    fn write_aligned(&mut self, offset_aligned: u64, buf: &[u8]) -> Result<()> {
        debug_assert_eq!(buf.len() as u64 % self.block_size, 0);
        let unit = self.driver.io_unit_size() as usize;
        self.driver.seek(offset_aligned)?;
        for chunk in buf.chunks(unit) {
            self.driver.write_unit(chunk)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::driver::FileDriver;
    use std::fs::OpenOptions;

    fn scratch_device(len: u64) -> (Device<FileDriver>, std::path::PathBuf) {
        let path = std::env::temp_dir().join(format!(
            "newfs-device-test-{}-{}",
            std::process::id(),
            len
        ));
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&path)
            .unwrap();
        file.set_len(len).unwrap();
        drop(file);
        let driver = FileDriver::open(&path).unwrap();
        (Device::new(driver), path)
    }

    #[test]
    fn unaligned_write_then_read_roundtrips() {
        let (mut dev, path) = scratch_device(4096);
        dev.write(10, b"hello").unwrap();
        let mut buf = [0u8; 5];
        dev.read(10, &mut buf).unwrap();
        assert_eq!(&buf, b"hello");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn write_does_not_clobber_neighboring_bytes() {
        let (mut dev, path) = scratch_device(4096);
        dev.write(0, &[0xAAu8; 16]).unwrap();
        dev.write(4, &[0xBBu8; 4]).unwrap();
        let mut buf = [0u8; 16];
        dev.read(0, &mut buf).unwrap();
        assert_eq!(&buf[0..4], &[0xAA; 4]);
        assert_eq!(&buf[4..8], &[0xBB; 4]);
        assert_eq!(&buf[8..16], &[0xAA; 8]);
        std::fs::remove_file(path).ok();
    }
}
