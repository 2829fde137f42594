//! Name list marshaling API
//!
//! Enumerate hands the caller a `char**` plus a count.  Every string and the
//! array itself come from a `GuestAllocator` so the caller can release them
//! with the matching `free`; after the call returns this layer forgets about
//! them.
use crate::conv_error::MarshalError;
use std::ffi::c_char;
use std::mem::size_of;
use std::ptr;

/// The heap the caller reads results out of (and frees them into).
pub trait GuestAllocator: Send + Sync {
    /// Returns `size` fresh bytes, or null if the heap is exhausted.
    fn malloc(&self, size: usize) -> *mut u8;

    /// Gives back a block obtained from `malloc`.
    ///
    /// # Safety
    /// `ptr` must come from this allocator's `malloc` and not be freed twice.
    unsafe fn free(&self, ptr: *mut u8);
}

/// The C heap, for callers that release results with `free(3)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibcAllocator;

impl GuestAllocator for LibcAllocator {
    fn malloc(&self, size: usize) -> *mut u8 {
        // SAFETY: plain malloc, null is handled by the caller.
        unsafe { libc::malloc(size) }.cast()
    }

    unsafe fn free(&self, ptr: *mut u8) {
        // SAFETY: forwarded to the caller.
        unsafe { libc::free(ptr.cast()) }
    }
}

/// A marshaled list: `count` pointers to NUL-terminated strings.
#[derive(Debug)]
pub struct NameList {
    pub ptrs: *mut *mut c_char,
    pub count: usize,
}

/// `sc_marshal_name_list` copies `names` into caller-owned memory.
///
/// For each name a buffer of its encoded length plus one is allocated and
/// filled; then one array of `count` pointers is allocated and filled in
/// input order.  The array always has room for at least one pointer so an
/// empty list is still a valid non-null array.  `count` is written to
/// `result_len`.
///
/// On failure whatever was allocated so far is given back and `result_len`
/// is left untouched.
pub fn sc_marshal_name_list(
    names: &[String],
    alloc: &dyn GuestAllocator,
    result_len: &mut i32,
) -> Result<NameList, MarshalError> {
    let count = i32::try_from(names.len()).map_err(|_| MarshalError::TooMany(names.len()))?;

    let mut name_ptrs: Vec<*mut c_char> = Vec::with_capacity(names.len());
    for name in names {
        match copy_name(name, alloc) {
            Ok(p) => name_ptrs.push(p),
            Err(e) => {
                release_names(&name_ptrs, alloc);
                return Err(e);
            }
        }
    }

    let array_size = name_ptrs.len().max(1) * size_of::<*mut c_char>();
    let array = alloc.malloc(array_size).cast::<*mut c_char>();
    if array.is_null() {
        release_names(&name_ptrs, alloc);
        return Err(MarshalError::OutOfMemory { size: array_size });
    }
    for (i, name_ptr) in name_ptrs.iter().enumerate() {
        // SAFETY: the array holds at least name_ptrs.len() slots.
        unsafe { array.add(i).write_unaligned(*name_ptr) };
    }

    log::debug!(
        "typemap: marshaled {} names into array at {:p}",
        name_ptrs.len(),
        array
    );
    *result_len = count;
    Ok(NameList {
        ptrs: array,
        count: name_ptrs.len(),
    })
}

/// Releases a list built by `sc_marshal_name_list`.  Foreign callers do this
/// themselves with `free`; this is for callers on our side.
///
/// # Safety
/// `list` must come from `sc_marshal_name_list` with the same allocator and
/// must not be used afterwards.
pub unsafe fn sc_free_name_list(list: NameList, alloc: &dyn GuestAllocator) {
    for i in 0..list.count {
        // SAFETY: the list holds `count` valid entries.
        unsafe { alloc.free(list.ptrs.add(i).read_unaligned().cast()) };
    }
    // SAFETY: the array came from this allocator.
    unsafe { alloc.free(list.ptrs.cast()) };
}

/// Reads a marshaled list back into owned strings.
///
/// # Safety
/// `list` must come from `sc_marshal_name_list` and still be alive.
pub unsafe fn sc_read_name_list(list: &NameList) -> Vec<String> {
    (0..list.count)
        .map(|i| {
            // SAFETY: the list holds `count` NUL-terminated strings.
            let p = unsafe { list.ptrs.add(i).read_unaligned() };
            unsafe { std::ffi::CStr::from_ptr(p) }
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

fn copy_name(name: &str, alloc: &dyn GuestAllocator) -> Result<*mut c_char, MarshalError> {
    let bytes = name.as_bytes();
    if bytes.contains(&0) {
        return Err(MarshalError::InteriorNul(name.to_string()));
    }
    let size = bytes.len() + 1;
    let buf = alloc.malloc(size);
    if buf.is_null() {
        log::debug!("typemap: allocation of {} bytes for {:?} failed", size, name);
        return Err(MarshalError::OutOfMemory { size });
    }
    // SAFETY: buf has room for the bytes and the terminator.
    unsafe {
        ptr::copy_nonoverlapping(bytes.as_ptr(), buf, bytes.len());
        buf.add(bytes.len()).write(0);
    }
    Ok(buf.cast())
}

fn release_names(name_ptrs: &[*mut c_char], alloc: &dyn GuestAllocator) {
    for p in name_ptrs {
        // SAFETY: every entry came from alloc.malloc in copy_name.
        unsafe { alloc.free(p.cast()) };
    }
}
