use super::{to_index, validate_name, FileHandle, Storage, StorageError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Bytes = Arc<Mutex<Vec<u8>>>;

// One entry per name.  `open` enforces one handle per name at a time, the
// way the NativeIO fileset does.
#[derive(Debug, Default)]
struct MemoryFile {
    data: Bytes,
    open: bool,
}

type Fileset = Arc<Mutex<BTreeMap<String, MemoryFile>>>;

/// Largest file a `MemoryStorage` holds unless told otherwise (1 GiB).
pub const DEFAULT_MAX_FILE_LEN: usize = 1 << 30;

/// A fileset held in process memory.  Names are reported in sorted order.
///
/// Every future it returns is already complete, so driving it never parks
/// the calling thread.  Files can't grow past `max_file_len` bytes; a write
/// or set-length that would take one further fails with `NoSpace`.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    files: Fileset,
    max_file_len: usize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::with_max_file_len(DEFAULT_MAX_FILE_LEN)
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_file_len(max_file_len: usize) -> Self {
        MemoryStorage {
            files: Fileset::default(),
            max_file_len,
        }
    }

    /// Snapshot of a file's bytes, open or not.
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().get(name).map(|f| f.data.lock().clone())
    }

    /// Whether `name` currently has an open handle.
    pub fn is_open(&self, name: &str) -> bool {
        self.files.lock().get(name).is_some_and(|f| f.open)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<Box<dyn FileHandle>, StorageError> {
        validate_name(name)?;
        let mut files = self.files.lock();
        let file = files.entry(name.to_string()).or_default();
        if file.open {
            return Err(StorageError::AlreadyOpen(name.to_string()));
        }
        file.open = true;
        Ok(Box::new(MemoryHandle {
            name: name.to_string(),
            data: Arc::clone(&file.data),
            files: Arc::clone(&self.files),
            max_file_len: self.max_file_len,
            closed: AtomicBool::new(false),
        }))
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        validate_name(name)?;
        let mut files = self.files.lock();
        match files.get(name) {
            None => Err(StorageError::NotFound(name.to_string())),
            Some(file) if file.open => Err(StorageError::AlreadyOpen(name.to_string())),
            Some(_) => {
                files.remove(name);
                Ok(())
            }
        }
    }

    async fn get_all(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.files.lock().keys().cloned().collect())
    }
}

struct MemoryHandle {
    name: String,
    data: Bytes,
    files: Fileset,
    max_file_len: usize,
    closed: AtomicBool,
}

impl MemoryHandle {
    fn check_open(&self) -> Result<(), StorageError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }

    // Resizes to `len`, failing instead of aborting when the memory isn't
    // there.
    fn resize(&self, data: &mut Vec<u8>, len: usize) -> Result<(), StorageError> {
        let no_space = || StorageError::NoSpace {
            requested: len as u64,
        };
        if len > self.max_file_len {
            return Err(no_space());
        }
        if len > data.len() {
            data.try_reserve_exact(len - data.len())
                .map_err(|_| no_space())?;
        }
        data.resize(len, 0);
        Ok(())
    }

    fn mark_closed(&self) {
        if let Some(file) = self.files.lock().get_mut(&self.name) {
            file.open = false;
        }
    }
}

// A handle dropped without close still gives its name back.
impl Drop for MemoryHandle {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::SeqCst) {
            self.mark_closed();
        }
    }
}

#[async_trait]
impl FileHandle for MemoryHandle {
    async fn read(&self, buf: &mut [u8], offset: u64) -> Result<usize, StorageError> {
        self.check_open()?;
        let data = self.data.lock();
        let start = to_index(offset)?;
        if start >= data.len() {
            return Ok(0);
        }
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    async fn write(&self, buf: &[u8], offset: u64) -> Result<usize, StorageError> {
        self.check_open()?;
        let mut data = self.data.lock();
        let start = to_index(offset)?;
        let end = start
            .checked_add(buf.len())
            .ok_or_else(|| StorageError::InvalidArgument(format!("write past {offset} overflows")))?;
        if end > data.len() {
            self.resize(&mut data, end)?;
        }
        data[start..end].copy_from_slice(buf);
        Ok(buf.len())
    }

    async fn set_length(&self, length: u64) -> Result<(), StorageError> {
        self.check_open()?;
        let length = to_index(length)?;
        self.resize(&mut self.data.lock(), length)
    }

    async fn get_length(&self) -> Result<u64, StorageError> {
        self.check_open()?;
        Ok(self.data.lock().len() as u64)
    }

    async fn flush(&self) -> Result<(), StorageError> {
        self.check_open()
    }

    async fn close(&self) -> Result<(), StorageError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(StorageError::Closed);
        }
        self.mark_closed();
        Ok(())
    }
}
