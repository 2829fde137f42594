// NativeIO Test Suite
//
// Unit tests for the bridge, driven through `NativeIo` directly so they can
// run in parallel.  The C entry points share one global instance and are
// covered separately in tests/abi_test.rs.

mod bridge_tests; // suspension with futures completed on other threads

use crate::fs_calls::NativeIo;
use crate::storage::{FileHandle, MemoryStorage, Storage, StorageError};
use async_trait::async_trait;
use futures::channel::oneshot;
use std::ffi::CString;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use typemap::{sc_free_name_list, sc_read_name_list, sc_split_i64, LibcAllocator, NameList};

/// Setup function for tests.  Returns a bridge over a fresh in-memory
/// fileset plus a second view of that fileset for checking what landed.
pub fn test_setup() -> (NativeIo, MemoryStorage) {
    init_logging();
    let storage = MemoryStorage::new();
    let nativeio = NativeIo::new(Arc::new(storage.clone()));
    (nativeio, storage)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// === CALL HELPERS ===

pub fn open(nativeio: &NativeIo, name: &str) -> i32 {
    let name = CString::new(name).unwrap();
    unsafe { nativeio.open_syscall(name.as_ptr()) }
}

pub fn delete(nativeio: &NativeIo, name: &str) -> i32 {
    let name = CString::new(name).unwrap();
    unsafe { nativeio.delete_syscall(name.as_ptr()) }
}

pub fn write(nativeio: &NativeIo, fd: i32, data: &[u8], offset: i64) -> i32 {
    let (low, high) = sc_split_i64(offset);
    unsafe { nativeio.write_syscall(fd, data.as_ptr(), data.len() as i32, low, high) }
}

/// Reads up to `len` bytes; returns the call's result and the bytes it
/// reported as read.
pub fn read(nativeio: &NativeIo, fd: i32, len: usize, offset: i64) -> (i32, Vec<u8>) {
    let (low, high) = sc_split_i64(offset);
    let mut buf = vec![0xAAu8; len];
    let ret = unsafe { nativeio.read_syscall(fd, buf.as_mut_ptr(), len as i32, low, high) };
    buf.truncate(ret.max(0) as usize);
    (ret, buf)
}

pub fn set_length(nativeio: &NativeIo, fd: i32, length: i64) -> i32 {
    let (low, high) = sc_split_i64(length);
    nativeio.setlength_syscall(fd, low, high)
}

/// Enumerates and frees the result.  `None` when the call returned null.
pub fn get_all(nativeio: &NativeIo) -> (i32, Option<Vec<String>>) {
    let mut count = -1;
    let ptrs = unsafe { nativeio.getall_syscall(&mut count) };
    if ptrs.is_null() {
        return (count, None);
    }
    let list = NameList {
        ptrs,
        count: count as usize,
    };
    let names = unsafe { sc_read_name_list(&list) };
    unsafe { sc_free_name_list(list, &LibcAllocator) };
    (count, Some(names))
}

// === STORAGE DOUBLES ===

/// Forwards to a `MemoryStorage` and counts every call that reaches storage,
/// fileset and handle calls alike.  Closes can be made to fail.
#[derive(Clone, Default)]
pub struct CountingStorage {
    pub inner: MemoryStorage,
    pub calls: Arc<AtomicUsize>,
    pub fail_close: Arc<AtomicBool>,
}

impl CountingStorage {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for CountingStorage {
    async fn open(&self, name: &str) -> Result<Box<dyn FileHandle>, StorageError> {
        self.count();
        let inner = self.inner.open(name).await?;
        Ok(Box::new(CountingHandle {
            inner,
            storage: self.clone(),
        }))
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        self.count();
        self.inner.delete(name).await
    }

    async fn get_all(&self) -> Result<Vec<String>, StorageError> {
        self.count();
        self.inner.get_all().await
    }
}

struct CountingHandle {
    inner: Box<dyn FileHandle>,
    storage: CountingStorage,
}

#[async_trait]
impl FileHandle for CountingHandle {
    async fn read(&self, buf: &mut [u8], offset: u64) -> Result<usize, StorageError> {
        self.storage.count();
        self.inner.read(buf, offset).await
    }

    async fn write(&self, buf: &[u8], offset: u64) -> Result<usize, StorageError> {
        self.storage.count();
        self.inner.write(buf, offset).await
    }

    async fn set_length(&self, length: u64) -> Result<(), StorageError> {
        self.storage.count();
        self.inner.set_length(length).await
    }

    async fn get_length(&self) -> Result<u64, StorageError> {
        self.storage.count();
        self.inner.get_length().await
    }

    async fn flush(&self) -> Result<(), StorageError> {
        self.storage.count();
        self.inner.flush().await
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.storage.count();
        if self.storage.fail_close.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "close refused",
            )));
        }
        self.inner.close().await
    }
}

/// Completes fileset calls on a separate thread after a short delay, so the
/// caller really is parked until a wakeup arrives from elsewhere.
#[derive(Clone, Default)]
pub struct DeferredStorage {
    pub inner: MemoryStorage,
}

const DEFER: Duration = Duration::from_millis(20);

fn canceled(_: oneshot::Canceled) -> StorageError {
    StorageError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        "completion dropped",
    ))
}

#[async_trait]
impl Storage for DeferredStorage {
    async fn open(&self, name: &str) -> Result<Box<dyn FileHandle>, StorageError> {
        let (tx, rx) = oneshot::channel();
        let inner = self.inner.clone();
        let name = name.to_string();
        thread::spawn(move || {
            thread::sleep(DEFER);
            let _ = tx.send(pollster::block_on(inner.open(&name)));
        });
        rx.await.map_err(canceled)?
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let (tx, rx) = oneshot::channel();
        let inner = self.inner.clone();
        let name = name.to_string();
        thread::spawn(move || {
            thread::sleep(DEFER);
            let _ = tx.send(pollster::block_on(inner.delete(&name)));
        });
        rx.await.map_err(canceled)?
    }

    async fn get_all(&self) -> Result<Vec<String>, StorageError> {
        let (tx, rx) = oneshot::channel();
        let inner = self.inner.clone();
        thread::spawn(move || {
            thread::sleep(DEFER);
            let _ = tx.send(pollster::block_on(inner.get_all()));
        });
        rx.await.map_err(canceled)?
    }
}
