//! Buffer views for file payloads.
//!
//! Read and write hand storage a window straight onto the caller's memory.
//! Nothing is copied, so the caller's region is aliased for as long as the
//! call is in flight, which includes the whole time the call is suspended
//! waiting for storage.  The lifetime `'a` on the views is that window: the
//! façade creates a view, suspends on the storage future that borrows it,
//! and drops it before returning to foreign code.
use crate::conv_error::TypeConvError;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

/// Read-only window onto caller memory (the payload of a write).
#[derive(Debug)]
pub struct BufferView<'a> {
    slice: &'a [u8],
}

/// Writable window onto caller memory (the target of a read).
#[derive(Debug)]
pub struct BufferViewMut<'a> {
    slice: &'a mut [u8],
}

/// `sc_convert_buf` views `len` bytes of caller memory starting at `ptr`.
///
/// The only check is that a non-empty region has a non-null start; anything
/// beyond that is the caller's contract.  A zero length gives an empty view
/// whatever the pointer is.
///
/// # Safety
/// `ptr..ptr+len` must be readable and must stay valid and unmodified by
/// anyone else for all of `'a`.
pub unsafe fn sc_convert_buf<'a>(ptr: *const u8, len: usize) -> Result<BufferView<'a>, TypeConvError> {
    if len == 0 {
        return Ok(BufferView { slice: &[] });
    }
    let start = NonNull::new(ptr.cast_mut()).ok_or(TypeConvError::NullPointer { len })?;
    // SAFETY: non-null, and the caller vouches for the rest.
    let slice = unsafe { std::slice::from_raw_parts(start.as_ptr().cast_const(), len) };
    Ok(BufferView { slice })
}

/// `sc_convert_buf_mut` is the writable counterpart of `sc_convert_buf`.
///
/// # Safety
/// `ptr..ptr+len` must be writable and must not be touched by anyone else
/// for all of `'a`.
pub unsafe fn sc_convert_buf_mut<'a>(ptr: *mut u8, len: usize) -> Result<BufferViewMut<'a>, TypeConvError> {
    if len == 0 {
        return Ok(BufferViewMut { slice: &mut [] });
    }
    let start = NonNull::new(ptr).ok_or(TypeConvError::NullPointer { len })?;
    // SAFETY: non-null, and the caller vouches for the rest.
    let slice = unsafe { std::slice::from_raw_parts_mut(start.as_ptr(), len) };
    Ok(BufferViewMut { slice })
}

impl Deref for BufferView<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.slice
    }
}

impl Deref for BufferViewMut<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.slice
    }
}

impl DerefMut for BufferViewMut<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.slice
    }
}
