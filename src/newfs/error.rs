//! The engine's error taxonomy.
//!
//! The on-disk format has no notion of permissions, hard links or extended
//! attributes, so most of the POSIX-flavored variants below exist only to
//! give the upper-layer adapter a stable, closed set of outcomes to match
//! on, even though this crate itself only ever produces a handful of them.

use std::io;

/// The result type used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors the engine can report to its caller.
///
/// Maps onto the POSIX-flavored taxonomy the upper-layer adapter expects:
/// `ACCESS`, `SEEK`, `ISDIR`, `NOSPACE`, `EXISTS`, `NOTFOUND`, `UNSUPPORTED`,
/// `IO`, `INVAL`. There is no `NONE` variant: success is `Ok`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Permission was denied by the underlying driver.
    #[error("access denied")]
    Access,
    /// A seek on the block driver failed or landed out of range.
    #[error("invalid seek")]
    Seek,
    /// An operation that requires a regular file found a directory instead.
    #[error("is a directory")]
    IsDir,
    /// The inode or data bitmap has no free bit left.
    #[error("no space left on device")]
    NoSpace,
    /// The target of a creation already exists.
    #[error("file exists")]
    Exists,
    /// A lookup failed to resolve a path component.
    #[error("no such file or directory")]
    NotFound,
    /// The operation is not implemented by this format.
    #[error("operation not supported")]
    Unsupported,
    /// Argument validation failed (out-of-range inode number, empty path, ...).
    #[error("invalid argument")]
    Inval,
    /// An I/O error was reported by the block driver.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns the POSIX-flavored error kind's name (`ACCESS`, `SEEK`, ...).
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Access => "ACCESS",
            Self::Seek => "SEEK",
            Self::IsDir => "ISDIR",
            Self::NoSpace => "NOSPACE",
            Self::Exists => "EXISTS",
            Self::NotFound => "NOTFOUND",
            Self::Unsupported => "UNSUPPORTED",
            Self::Inval => "INVAL",
            Self::Io(_) => "IO",
        }
    }
}
