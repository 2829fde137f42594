//! Errno values understood by callers of the bridge.
//!
//! Callers only ever see [`NATIVEIO_ERROR`]: every failure, whatever its
//! source, collapses to that one value. The other errnos are kept so log
//! lines can name the class of failure.

// Let's not have clippy warn for EINVAL, etc.
#![allow(clippy::upper_case_acronyms)]

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Errno {
    EPERM = 1,
    ENOENT = 2,
    EIO = 5,
    EBADF = 9,
    ENOMEM = 12,
    EFAULT = 14,
    EBUSY = 16,
    EEXIST = 17,
    EINVAL = 22,
    EMFILE = 24,
    ENOSPC = 28,
    ERANGE = 34,
    ENAMETOOLONG = 36,
    EOVERFLOW = 75,
}

impl Errno {
    pub const fn as_retval(self) -> i32 {
        -(self as i32)
    }
}

/// The single value returned by every failed NativeIO call.
pub const NATIVEIO_ERROR: i32 = Errno::EINVAL.as_retval();

/// Logs a failed call and returns the errno negated, in the shape the C
/// entry points hand back to their callers.
pub fn syscall_error(e: Errno, syscall: &str, message: &str) -> i32 {
    log::warn!("NativeIO error in {}: {:?}: {}", syscall, e, message);
    e.as_retval()
}
