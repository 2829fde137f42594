//! The C entry points.
//!
//! Each one forwards to the installed [`NativeIo`](crate::NativeIo) and
//! returns `NATIVEIO_ERROR` when nothing is installed.  64-bit offsets and
//! lengths arrive as a (low, high) pair of 32-bit words.
#![allow(non_snake_case)]

use crate::init::with_nativeio;
use std::ffi::{c_char, c_int};
use std::ptr;
use sysdefs::constants::NATIVEIO_ERROR;

/// # Safety
/// `name` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn NativeIO_Open(name: *const c_char) -> c_int {
    with_nativeio("open", |nativeio| unsafe { nativeio.open_syscall(name) })
        .unwrap_or(NATIVEIO_ERROR)
}

/// # Safety
/// `name` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn NativeIO_Delete(name: *const c_char) -> c_int {
    with_nativeio("delete", |nativeio| unsafe { nativeio.delete_syscall(name) })
        .unwrap_or(NATIVEIO_ERROR)
}

/// The array and strings are `malloc`ed; release each string and then the
/// array with `free`.
///
/// # Safety
/// `result_len` must be null or valid for an `int` write.
#[no_mangle]
pub unsafe extern "C" fn NativeIO_GetAll(result_len: *mut c_int) -> *mut *mut c_char {
    with_nativeio("getall", |nativeio| unsafe {
        nativeio.getall_syscall(result_len)
    })
    .unwrap_or_else(|| {
        // SAFETY: forwarded to the caller.
        if let Some(slot) = unsafe { result_len.as_mut() } {
            *slot = NATIVEIO_ERROR;
        }
        ptr::null_mut()
    })
}

/// # Safety
/// `buf..buf+len` must be writable until the call returns.
#[no_mangle]
pub unsafe extern "C" fn NativeIO_Read(
    fd: c_int,
    buf: *mut u8,
    len: c_int,
    offset_low: u32,
    offset_high: u32,
) -> c_int {
    with_nativeio("read", |nativeio| unsafe {
        nativeio.read_syscall(fd, buf, len, offset_low, offset_high)
    })
    .unwrap_or(NATIVEIO_ERROR)
}

/// # Safety
/// `buf..buf+len` must be readable until the call returns.
#[no_mangle]
pub unsafe extern "C" fn NativeIO_Write(
    fd: c_int,
    buf: *const u8,
    len: c_int,
    offset_low: u32,
    offset_high: u32,
) -> c_int {
    with_nativeio("write", |nativeio| unsafe {
        nativeio.write_syscall(fd, buf, len, offset_low, offset_high)
    })
    .unwrap_or(NATIVEIO_ERROR)
}

#[no_mangle]
pub extern "C" fn NativeIO_SetLength(fd: c_int, length_low: u32, length_high: u32) -> c_int {
    with_nativeio("setlength", |nativeio| {
        nativeio.setlength_syscall(fd, length_low, length_high)
    })
    .unwrap_or(NATIVEIO_ERROR)
}

#[no_mangle]
pub extern "C" fn NativeIO_GetLength(fd: c_int) -> c_int {
    with_nativeio("getlength", |nativeio| nativeio.getlength_syscall(fd)).unwrap_or(NATIVEIO_ERROR)
}

#[no_mangle]
pub extern "C" fn NativeIO_Flush(fd: c_int) -> c_int {
    with_nativeio("flush", |nativeio| nativeio.flush_syscall(fd)).unwrap_or(NATIVEIO_ERROR)
}

#[no_mangle]
pub extern "C" fn NativeIO_Close(fd: c_int) -> c_int {
    with_nativeio("close", |nativeio| nativeio.close_syscall(fd)).unwrap_or(NATIVEIO_ERROR)
}
