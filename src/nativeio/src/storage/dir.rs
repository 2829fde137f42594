use super::{validate_name, FileHandle, Storage, StorageError};
use async_trait::async_trait;
use dashmap::DashSet;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A fileset kept as one regular file per name inside `root`.
///
/// The futures do their I/O with blocking `std::fs` calls when polled.
/// That is fine here since the caller is parked on the result anyway.
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: PathBuf,
    // names with a live handle, one handle per name
    open_names: Arc<DashSet<String>>,
}

impl DirStorage {
    /// Uses `root` as the fileset, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(DirStorage {
            root,
            open_names: Arc::new(DashSet::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl Storage for DirStorage {
    async fn open(&self, name: &str) -> Result<Box<dyn FileHandle>, StorageError> {
        validate_name(name)?;
        if !self.open_names.insert(name.to_string()) {
            return Err(StorageError::AlreadyOpen(name.to_string()));
        }
        let opened = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.path_of(name));
        match opened {
            Ok(file) => Ok(Box::new(DirHandle {
                name: name.to_string(),
                file: Mutex::new(Some(file)),
                open_names: Arc::clone(&self.open_names),
            })),
            Err(e) => {
                self.open_names.remove(name);
                Err(e.into())
            }
        }
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        validate_name(name)?;
        // Hold the name while removing so an open can't race in between.
        if !self.open_names.insert(name.to_string()) {
            return Err(StorageError::AlreadyOpen(name.to_string()));
        }
        let removed = fs::remove_file(self.path_of(name)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(name.to_string()),
            _ => StorageError::Io(e),
        });
        self.open_names.remove(name);
        removed
    }

    async fn get_all(&self) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            // Anything that isn't a valid name was not put there by us.
            if let Some(name) = entry.file_name().to_str() {
                if validate_name(name).is_ok() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort_unstable();
        Ok(names)
    }
}

struct DirHandle {
    name: String,
    // None once closed
    file: Mutex<Option<File>>,
    open_names: Arc<DashSet<String>>,
}

impl DirHandle {
    fn with_file<T>(
        &self,
        f: impl FnOnce(&mut File) -> std::io::Result<T>,
    ) -> Result<T, StorageError> {
        let mut guard = self.file.lock();
        let file = guard.as_mut().ok_or(StorageError::Closed)?;
        Ok(f(file)?)
    }
}

impl Drop for DirHandle {
    fn drop(&mut self) {
        if self.file.get_mut().is_some() {
            self.open_names.remove(&self.name);
        }
    }
}

#[async_trait]
impl FileHandle for DirHandle {
    async fn read(&self, buf: &mut [u8], offset: u64) -> Result<usize, StorageError> {
        self.with_file(|file| {
            file.seek(SeekFrom::Start(offset))?;
            let mut filled = 0;
            while filled < buf.len() {
                match file.read(&mut buf[filled..]) {
                    Ok(0) => break,
                    Ok(n) => filled += n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(e) => return Err(e),
                }
            }
            Ok(filled)
        })
    }

    async fn write(&self, buf: &[u8], offset: u64) -> Result<usize, StorageError> {
        self.with_file(|file| {
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(buf)?;
            Ok(buf.len())
        })
    }

    async fn set_length(&self, length: u64) -> Result<(), StorageError> {
        self.with_file(|file| file.set_len(length))
    }

    async fn get_length(&self) -> Result<u64, StorageError> {
        self.with_file(|file| Ok(file.metadata()?.len()))
    }

    async fn flush(&self) -> Result<(), StorageError> {
        self.with_file(|file| file.sync_all())
    }

    async fn close(&self) -> Result<(), StorageError> {
        let file = self.file.lock().take().ok_or(StorageError::Closed)?;
        drop(file);
        self.open_names.remove(&self.name);
        Ok(())
    }
}
