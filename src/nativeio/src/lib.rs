// NativeIO - blocking file calls over an asynchronous storage subsystem
//
// Foreign code that expects blocking system-call semantics calls the
// NativeIO_* entry points in `abi`.  Each call decodes its arguments, looks
// up the descriptor, starts the storage operation and parks the calling
// thread until it settles.  Every failure comes back as the single
// NATIVEIO_ERROR sentinel; the cause goes to the log.

pub mod abi;
pub mod bridge;
pub mod config;
pub mod error;
pub mod fs_calls;
pub mod init;
pub mod storage;

pub use config::{BackendConfig, ConfigError, NativeIoConfig};
pub use error::NativeIoError;
pub use fs_calls::NativeIo;
pub use init::{nativeio_shutdown, nativeio_start, nativeio_start_with};
pub use storage::{DirStorage, FileHandle, MemoryStorage, Storage, StorageError};
pub use sysdefs::constants::NATIVEIO_ERROR;

#[cfg(test)]
mod tests;
