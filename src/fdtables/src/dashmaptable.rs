use dashmap::DashMap;

use std::sync::atomic::{AtomicU64, Ordering};

use std::sync::Arc;

// This uses a DashMap keyed by descriptor, with the handle stored behind an
// Arc so a lookup hands back a reference the caller can keep for the
// duration of one operation without holding a shard lock across it.

// Get constants about the fd table, etc.
pub use super::commonconstants::*;

// algorithm name.  Need not be listed.  Used in benchmarking output
#[doc(hidden)]
pub const ALGONAME: &str = "DashMapCounter";

// Descriptors come from a counter instead of the lowest free slot.  This
// means a descriptor that was closed is never reused, so a stale descriptor
// held by foreign code can only ever miss, never hit somebody else's file.
// The increment-and-store is a single fetch_add so two threads opening at
// the same moment can't be handed the same number.
//
// Counter exhaustion (2^64 opens) is not handled.

/// Maps descriptors to open handles.  See the crate docs.
#[derive(Debug)]
pub struct FdTable<H: ?Sized> {
    last_fd: AtomicU64,
    entries: DashMap<u64, Arc<H>>,
}

impl<H: ?Sized> Default for FdTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> FdTable<H> {
    /// A table whose first descriptor is [`FIRST_VIRTUAL_FD`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_reserved_range(LAST_RESERVED_FD)
    }

    /// A table that never hands out a descriptor at or below
    /// `last_reserved`.
    #[must_use]
    pub fn with_reserved_range(last_reserved: u64) -> Self {
        FdTable {
            last_fd: AtomicU64::new(last_reserved),
            entries: DashMap::new(),
        }
    }

    /// Stores `handle` under a fresh descriptor and returns it.  Never fails.
    pub fn allocate(&self, handle: Arc<H>) -> u64 {
        let fd = self.last_fd.fetch_add(1, Ordering::SeqCst) + 1;
        // The counter never repeats, so there can't be an old entry here.
        let previous = self.entries.insert(fd, handle);
        debug_assert!(previous.is_none(), "descriptor {fd} handed out twice");
        log::debug!("fdtables: allocated descriptor {}", fd);
        fd
    }

    /// Looks up the handle behind `fd`.  `None` means the descriptor was
    /// never handed out or has already been released.
    pub fn resolve(&self, fd: u64) -> Option<Arc<H>> {
        self.entries.get(&fd).map(|entry| Arc::clone(entry.value()))
    }

    /// Removes the mapping for `fd` and returns the handle it held.
    ///
    /// Only call this once the storage side has confirmed the handle is
    /// closed; after this the descriptor can't address it anymore.
    pub fn release(&self, fd: u64) -> Option<Arc<H>> {
        let removed = self.entries.remove(&fd).map(|(_, handle)| handle);
        if removed.is_some() {
            log::debug!("fdtables: released descriptor {}", fd);
        }
        removed
    }

    /// Number of live descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live descriptors in ascending order.
    #[must_use]
    pub fn open_fds(&self) -> Vec<u64> {
        let mut fds: Vec<u64> = self.entries.iter().map(|entry| *entry.key()).collect();
        fds.sort_unstable();
        fds
    }

    /// Removes every entry and returns them in descriptor order.  The
    /// counter keeps going, so descriptors are still not reused afterwards.
    pub fn drain(&self) -> Vec<(u64, Arc<H>)> {
        self.open_fds()
            .into_iter()
            .filter_map(|fd| self.entries.remove(&fd))
            .collect()
    }
}
