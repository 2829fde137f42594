//! The one error type the bridge deals in.  None of it reaches foreign
//! callers: each variant is logged and then collapsed to `NATIVEIO_ERROR`.
use crate::config::ConfigError;
use crate::storage::StorageError;
use sysdefs::constants::err_const::Errno;
use thiserror::Error;
use typemap::{MarshalError, RangeError, TypeConvError};

#[derive(Debug, Error)]
pub enum NativeIoError {
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error(transparent)]
    Conversion(#[from] TypeConvError),
    #[error(transparent)]
    Marshal(#[from] MarshalError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("descriptor {0} is not open")]
    BadDescriptor(u64),
    #[error("result {0} does not fit the return type")]
    Overflow(u64),
    #[error("NativeIO has not been started")]
    NotStarted,
}

impl NativeIoError {
    /// The errno class a log line files this failure under.
    pub fn errno(&self) -> Errno {
        match self {
            NativeIoError::Range(_) => Errno::ERANGE,
            NativeIoError::Conversion(TypeConvError::NullPointer { .. })
            | NativeIoError::Conversion(TypeConvError::NullString) => Errno::EFAULT,
            NativeIoError::Conversion(_) => Errno::EINVAL,
            NativeIoError::Marshal(MarshalError::OutOfMemory { .. }) => Errno::ENOMEM,
            NativeIoError::Marshal(_) => Errno::EINVAL,
            NativeIoError::Storage(e) => match e {
                StorageError::NotFound(_) => Errno::ENOENT,
                StorageError::AlreadyOpen(_) => Errno::EBUSY,
                StorageError::InvalidName(_) | StorageError::InvalidArgument(_) => Errno::EINVAL,
                StorageError::NoSpace { .. } => Errno::ENOSPC,
                StorageError::Closed => Errno::EBADF,
                StorageError::Io(_) => Errno::EIO,
            },
            NativeIoError::Config(_) => Errno::EINVAL,
            NativeIoError::BadDescriptor(_) => Errno::EBADF,
            NativeIoError::Overflow(_) => Errno::EOVERFLOW,
            NativeIoError::NotStarted => Errno::EPERM,
        }
    }
}
