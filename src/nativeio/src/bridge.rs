//! Suspension bridge
//!
//! Every entry point is synchronous from the caller's side while storage only
//! ever answers with a future.  `run_blocking` reconciles the two: it parks
//! the calling thread on the future with `pollster::block_on`, and when the
//! future settles it turns the outcome into the `i32` the caller expects.
//! This is the only place in the crate that blocks.
use crate::error::NativeIoError;
use std::fmt;
use std::future::Future;
use sysdefs::constants::err_const::{self, NATIVEIO_ERROR};

/// What a call was aimed at, for log lines.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Name(&'a str),
    Fd(u64),
    /// Raw descriptor argument that did not decode.
    RawFd(i32),
    Fileset,
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Name(name) => write!(f, "name {:?}", name),
            Target::Fd(fd) => write!(f, "fd {}", fd),
            Target::RawFd(fd) => write!(f, "fd {}", fd),
            Target::Fileset => f.write_str("fileset"),
        }
    }
}

/// Success values of the storage calls, as seen by a C caller.
pub trait RetVal {
    fn into_retval(self) -> Result<i32, NativeIoError>;
}

impl RetVal for () {
    fn into_retval(self) -> Result<i32, NativeIoError> {
        Ok(0)
    }
}

impl RetVal for i32 {
    fn into_retval(self) -> Result<i32, NativeIoError> {
        Ok(self)
    }
}

impl RetVal for u64 {
    fn into_retval(self) -> Result<i32, NativeIoError> {
        i32::try_from(self).map_err(|_| NativeIoError::Overflow(self))
    }
}

impl RetVal for usize {
    fn into_retval(self) -> Result<i32, NativeIoError> {
        i32::try_from(self).map_err(|_| NativeIoError::Overflow(self as u64))
    }
}

/// Parks the calling thread until `fut` settles and hands back its output.
pub fn suspend<F: Future>(op: &'static str, fut: F) -> F::Output {
    log::trace!("{}: suspending caller", op);
    let out = pollster::block_on(fut);
    log::trace!("{}: resumed", op);
    out
}

/// Runs one storage call to completion on behalf of a blocking caller.
///
/// ## Returns:
/// Success: the settled value as an `i32`
/// Fail: `NATIVEIO_ERROR`, after logging `op`, `target` and the cause
pub fn run_blocking<T, F>(op: &'static str, target: Target<'_>, fut: F) -> i32
where
    T: RetVal,
    F: Future<Output = Result<T, NativeIoError>>,
{
    match suspend(op, fut).and_then(RetVal::into_retval) {
        Ok(ret) => ret,
        Err(e) => syscall_error(op, target, &e),
    }
}

/// Logs a failed call and collapses it to the sentinel.
pub fn syscall_error(op: &'static str, target: Target<'_>, err: &NativeIoError) -> i32 {
    err_const::syscall_error(err.errno(), op, &format!("{}: {}", target, err));
    NATIVEIO_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    #[test]
    fn success_values_map_to_i32() {
        assert_eq!(run_blocking("flush", Target::Fd(101), async { Ok::<_, NativeIoError>(()) }), 0);
        assert_eq!(
            run_blocking("read", Target::Fd(101), async { Ok::<_, NativeIoError>(17usize) }),
            17
        );
        assert_eq!(
            run_blocking("getlength", Target::Fd(101), async { Ok::<_, NativeIoError>(4u64) }),
            4
        );
    }

    #[test]
    fn failures_collapse_to_sentinel() {
        let ret = run_blocking("open", Target::Name("log"), async {
            Err::<i32, _>(NativeIoError::from(StorageError::AlreadyOpen("log".into())))
        });
        assert_eq!(ret, NATIVEIO_ERROR);
    }

    #[test]
    fn oversized_results_collapse_to_sentinel() {
        let ret = run_blocking("getlength", Target::Fd(101), async {
            Ok::<_, NativeIoError>(u64::from(u32::MAX))
        });
        assert_eq!(ret, NATIVEIO_ERROR);
    }

    #[test]
    fn targets_display() {
        assert_eq!(Target::Name("log").to_string(), "name \"log\"");
        assert_eq!(Target::Fd(101).to_string(), "fd 101");
        assert_eq!(Target::RawFd(-3).to_string(), "fd -3");
        assert_eq!(Target::Fileset.to_string(), "fileset");
    }
}
