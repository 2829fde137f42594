//! Operation façade
//!
//! One method per NativeIO entry point.  Each call goes through the same
//! steps in the same order: decode the primitive arguments, resolve the
//! descriptor, hand the work to storage and park on it via the bridge.  A
//! failure at any step is logged and collapsed to `NATIVEIO_ERROR`, and a
//! failure while decoding means the descriptor table and storage are never
//! touched.
use crate::bridge::{run_blocking, suspend, syscall_error, Target};
use crate::error::NativeIoError;
use crate::storage::{FileHandle, Storage};
use fdtables::FdTable;
use std::ffi::c_char;
use std::ptr;
use std::sync::Arc;
use typemap::{
    sc_convert_buf, sc_convert_buf_mut, sc_convert_buflen, sc_convert_fd, sc_convert_i64_halves,
    sc_convert_name, sc_convert_offset, sc_marshal_name_list, BufferView, BufferViewMut,
    GuestAllocator, LibcAllocator, TypeConvError,
};

/// A bridge instance: the storage it forwards to, the descriptors it has
/// handed out and the heap enumerate results are allocated from.
pub struct NativeIo {
    storage: Arc<dyn Storage>,
    fdtable: FdTable<dyn FileHandle>,
    allocator: Box<dyn GuestAllocator>,
}

impl NativeIo {
    /// A bridge over `storage` whose enumerate results live on the C heap.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_allocator(storage, Box::new(LibcAllocator))
    }

    pub fn with_allocator(storage: Arc<dyn Storage>, allocator: Box<dyn GuestAllocator>) -> Self {
        NativeIo {
            storage,
            fdtable: FdTable::new(),
            allocator,
        }
    }

    /// Like [`NativeIo::new`], but descriptors start after `last_reserved`.
    pub fn with_reserved_range(storage: Arc<dyn Storage>, last_reserved: u64) -> Self {
        NativeIo {
            storage,
            fdtable: FdTable::with_reserved_range(last_reserved),
            allocator: Box::new(LibcAllocator),
        }
    }

    pub fn fdtable(&self) -> &FdTable<dyn FileHandle> {
        &self.fdtable
    }

    fn lookup(&self, fd: u64) -> Result<Arc<dyn FileHandle>, NativeIoError> {
        self.fdtable
            .resolve(fd)
            .ok_or(NativeIoError::BadDescriptor(fd))
    }

    /// Opens `name`, creating it if needed.
    ///
    /// ## Returns:
    /// Success: a fresh descriptor, greater than every one handed out before
    /// Fail: `NATIVEIO_ERROR`; no descriptor is left behind
    ///
    /// # Safety
    /// `name` must be null or point at a NUL-terminated string.
    pub unsafe fn open_syscall(&self, name: *const c_char) -> i32 {
        // SAFETY: forwarded to the caller.
        let name = match unsafe { sc_convert_name(name) } {
            Ok(name) => name,
            Err(e) => return syscall_error("open", Target::Fileset, &e.into()),
        };
        run_blocking("open", Target::Name(name), self.open_file(name))
    }

    async fn open_file(&self, name: &str) -> Result<i32, NativeIoError> {
        let handle: Arc<dyn FileHandle> = Arc::from(self.storage.open(name).await?);
        let fd = self.fdtable.allocate(Arc::clone(&handle));
        match i32::try_from(fd) {
            Ok(ret) => Ok(ret),
            Err(_) => {
                // The caller can't hold this descriptor, so undo the open.
                self.fdtable.release(fd);
                if let Err(e) = handle.close().await {
                    log::warn!("open: closing unreturnable fd {}: {}", fd, e);
                }
                Err(NativeIoError::Overflow(fd))
            }
        }
    }

    /// Removes `name` from the fileset.  The name must not be open.
    ///
    /// # Safety
    /// `name` must be null or point at a NUL-terminated string.
    pub unsafe fn delete_syscall(&self, name: *const c_char) -> i32 {
        // SAFETY: forwarded to the caller.
        let name = match unsafe { sc_convert_name(name) } {
            Ok(name) => name,
            Err(e) => return syscall_error("delete", Target::Fileset, &e.into()),
        };
        run_blocking("delete", Target::Name(name), async {
            Ok::<_, NativeIoError>(self.storage.delete(name).await?)
        })
    }

    /// Lists every name in the fileset.
    ///
    /// The array and each string in it come from this bridge's allocator and
    /// belong to the caller afterwards.  The number of names goes to
    /// `*result_len`.
    ///
    /// ## Returns:
    /// Success: the array, never null, even when empty
    /// Fail: null, with `NATIVEIO_ERROR` in `*result_len`
    ///
    /// # Safety
    /// `result_len` must be null or valid for an `i32` write.
    pub unsafe fn getall_syscall(&self, result_len: *mut i32) -> *mut *mut c_char {
        // SAFETY: forwarded to the caller.
        let Some(slot) = (unsafe { result_len.as_mut() }) else {
            let err = TypeConvError::NullPointer {
                len: std::mem::size_of::<i32>(),
            };
            syscall_error("getall", Target::Fileset, &err.into());
            return ptr::null_mut();
        };

        let names = match suspend("getall", self.storage.get_all()) {
            Ok(names) => names,
            Err(e) => {
                *slot = syscall_error("getall", Target::Fileset, &e.into());
                return ptr::null_mut();
            }
        };
        match sc_marshal_name_list(&names, self.allocator.as_ref(), slot) {
            Ok(list) => list.ptrs,
            Err(e) => {
                *slot = syscall_error("getall", Target::Fileset, &e.into());
                ptr::null_mut()
            }
        }
    }

    /// Reads up to `len` bytes at the offset `(offset_low, offset_high)` into
    /// `buf`.  Returns the number of bytes read, 0 at or past the end.
    ///
    /// # Safety
    /// `buf..buf+len` must be writable and left alone until the call returns.
    pub unsafe fn read_syscall(
        &self,
        fd: i32,
        buf: *mut u8,
        len: i32,
        offset_low: u32,
        offset_high: u32,
    ) -> i32 {
        let (vfd, len, offset) = match decode_io_args(fd, len, offset_low, offset_high) {
            Ok(args) => args,
            Err(e) => return syscall_error("read", Target::RawFd(fd), &e),
        };
        // SAFETY: forwarded to the caller.
        let view = match unsafe { sc_convert_buf_mut(buf, len) } {
            Ok(view) => view,
            Err(e) => return syscall_error("read", Target::Fd(vfd), &e.into()),
        };
        let handle = match self.lookup(vfd) {
            Ok(handle) => handle,
            Err(e) => return syscall_error("read", Target::Fd(vfd), &e),
        };
        run_blocking("read", Target::Fd(vfd), read_into(handle, view, offset))
    }

    /// Writes `len` bytes from `buf` at the offset `(offset_low,
    /// offset_high)`.  Returns the number of bytes written.
    ///
    /// # Safety
    /// `buf..buf+len` must be readable and left alone until the call returns.
    pub unsafe fn write_syscall(
        &self,
        fd: i32,
        buf: *const u8,
        len: i32,
        offset_low: u32,
        offset_high: u32,
    ) -> i32 {
        let (vfd, len, offset) = match decode_io_args(fd, len, offset_low, offset_high) {
            Ok(args) => args,
            Err(e) => return syscall_error("write", Target::RawFd(fd), &e),
        };
        // SAFETY: forwarded to the caller.
        let view = match unsafe { sc_convert_buf(buf, len) } {
            Ok(view) => view,
            Err(e) => return syscall_error("write", Target::Fd(vfd), &e.into()),
        };
        let handle = match self.lookup(vfd) {
            Ok(handle) => handle,
            Err(e) => return syscall_error("write", Target::Fd(vfd), &e),
        };
        run_blocking("write", Target::Fd(vfd), write_from(handle, view, offset))
    }

    /// Truncates or zero-extends the file to `(length_low, length_high)`.
    pub fn setlength_syscall(&self, fd: i32, length_low: u32, length_high: u32) -> i32 {
        let decoded = sc_convert_i64_halves(length_low, length_high)
            .map_err(NativeIoError::from)
            .and_then(|length| Ok(sc_convert_offset(length, "length")?))
            .and_then(|length| Ok((sc_convert_fd(fd)?, length)));
        let (vfd, length) = match decoded {
            Ok(args) => args,
            Err(e) => return syscall_error("setlength", Target::RawFd(fd), &e),
        };
        let handle = match self.lookup(vfd) {
            Ok(handle) => handle,
            Err(e) => return syscall_error("setlength", Target::Fd(vfd), &e),
        };
        run_blocking("setlength", Target::Fd(vfd), async move {
            Ok::<_, NativeIoError>(handle.set_length(length).await?)
        })
    }

    /// Current length of the file.  Lengths past `i32::MAX` can't be
    /// returned and fail.
    pub fn getlength_syscall(&self, fd: i32) -> i32 {
        let (vfd, handle) = match self.resolve_raw("getlength", fd) {
            Ok(resolved) => resolved,
            Err(ret) => return ret,
        };
        run_blocking("getlength", Target::Fd(vfd), async move {
            Ok::<_, NativeIoError>(handle.get_length().await?)
        })
    }

    pub fn flush_syscall(&self, fd: i32) -> i32 {
        let (vfd, handle) = match self.resolve_raw("flush", fd) {
            Ok(resolved) => resolved,
            Err(ret) => return ret,
        };
        run_blocking("flush", Target::Fd(vfd), async move {
            Ok::<_, NativeIoError>(handle.flush().await?)
        })
    }

    /// Closes `fd`.  The descriptor stays valid if storage fails the close,
    /// so the caller may try again.
    pub fn close_syscall(&self, fd: i32) -> i32 {
        let (vfd, handle) = match self.resolve_raw("close", fd) {
            Ok(resolved) => resolved,
            Err(ret) => return ret,
        };
        run_blocking("close", Target::Fd(vfd), async move {
            handle.close().await?;
            self.fdtable.release(vfd);
            Ok::<_, NativeIoError>(())
        })
    }

    // Decode and resolve for the calls whose only argument is a descriptor.
    fn resolve_raw(&self, op: &'static str, fd: i32) -> Result<(u64, Arc<dyn FileHandle>), i32> {
        let vfd = sc_convert_fd(fd).map_err(|e| syscall_error(op, Target::RawFd(fd), &e.into()))?;
        let handle = self
            .lookup(vfd)
            .map_err(|e| syscall_error(op, Target::Fd(vfd), &e))?;
        Ok((vfd, handle))
    }

    /// Closes every descriptor still open and returns how many there were.
    /// Failed closes are logged; their entries are gone either way.
    pub fn shutdown(&self) -> usize {
        let entries = self.fdtable.drain();
        let count = entries.len();
        for (fd, handle) in entries {
            if let Err(e) = suspend("shutdown", handle.close()) {
                log::warn!("shutdown: closing fd {}: {}", fd, e);
            }
        }
        count
    }
}

// Offset first: a bad offset never gets as far as the descriptor table.
fn decode_io_args(
    fd: i32,
    len: i32,
    offset_low: u32,
    offset_high: u32,
) -> Result<(u64, usize, u64), NativeIoError> {
    let offset = sc_convert_offset(sc_convert_i64_halves(offset_low, offset_high)?, "offset")?;
    Ok((sc_convert_fd(fd)?, sc_convert_buflen(len)?, offset))
}

// The views borrow caller memory and are moved into the future, so they live
// exactly as long as the suspended call.
async fn read_into(
    handle: Arc<dyn FileHandle>,
    mut buf: BufferViewMut<'_>,
    offset: u64,
) -> Result<usize, NativeIoError> {
    Ok(handle.read(&mut buf, offset).await?)
}

async fn write_from(
    handle: Arc<dyn FileHandle>,
    buf: BufferView<'_>,
    offset: u64,
) -> Result<usize, NativeIoError> {
    Ok(handle.write(&buf, offset).await?)
}
