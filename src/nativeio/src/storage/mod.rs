//! The asynchronous storage subsystem the bridge drives.
//!
//! Everything here completes later: open, delete and enumerate on the
//! fileset, and read, write, set-length, get-length, flush and close on an
//! open file.  The bridge never looks inside a handle; it only forwards
//! calls and reports outcomes.
//!
//! Two backends ship with the crate: [`MemoryStorage`] keeps the fileset in
//! process memory and [`DirStorage`] keeps one regular file per name in a
//! directory.  Anything else implementing [`Storage`] can be plugged in with
//! [`crate::nativeio_start_with`].
use async_trait::async_trait;
use sysdefs::constants::lind_platform_const::{is_name_char, MAX_NAME_LEN};
use thiserror::Error;

mod dir;
mod memory;

pub use dir::DirStorage;
pub use memory::{MemoryStorage, DEFAULT_MAX_FILE_LEN};

/// Everything storage can report back.  The bridge logs these and collapses
/// them into one sentinel, so the variants are for diagnosis only.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no file named {0:?}")]
    NotFound(String),
    #[error("file {0:?} is already open")]
    AlreadyOpen(String),
    #[error("invalid file name {0:?}")]
    InvalidName(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("no room for a file of {requested} bytes")]
    NoSpace { requested: u64 },
    #[error("file handle is closed")]
    Closed,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The fileset.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Opens `name`, creating it empty if it does not exist.
    async fn open(&self, name: &str) -> Result<Box<dyn FileHandle>, StorageError>;

    /// Removes `name` from the fileset.
    async fn delete(&self, name: &str) -> Result<(), StorageError>;

    /// Every name currently in the fileset, in the backend's order.
    async fn get_all(&self) -> Result<Vec<String>, StorageError>;
}

/// An open file.
#[async_trait]
pub trait FileHandle: Send + Sync {
    /// Fills `buf` from `offset`.  Returns how many bytes were read, which is
    /// short (possibly 0) at the end of the file.
    async fn read(&self, buf: &mut [u8], offset: u64) -> Result<usize, StorageError>;

    /// Writes all of `buf` at `offset`, zero-filling any gap past the
    /// current end.  Returns how many bytes were written.
    async fn write(&self, buf: &[u8], offset: u64) -> Result<usize, StorageError>;

    /// Truncates to, or zero-extends to, `length` bytes.
    async fn set_length(&self, length: u64) -> Result<(), StorageError>;

    /// Current length in bytes.
    async fn get_length(&self) -> Result<u64, StorageError>;

    /// Pushes buffered changes down to durable storage.
    async fn flush(&self) -> Result<(), StorageError>;

    /// Closes the file.  Every later call on this handle fails with
    /// [`StorageError::Closed`].
    async fn close(&self) -> Result<(), StorageError>;
}

/// File names are 1 to `MAX_NAME_LEN` characters from `a-z`, `0-9` and `_`.
pub fn validate_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN || !name.bytes().all(is_name_char) {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Offsets past `usize` can't address an in-memory buffer.
pub(crate) fn to_index(value: u64) -> Result<usize, StorageError> {
    usize::try_from(value)
        .map_err(|_| StorageError::InvalidArgument(format!("{value} is too large")))
}
