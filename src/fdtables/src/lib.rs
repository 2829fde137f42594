//! This module provides an fdtable for NativeIO: the mapping between the
//! small integer descriptors that foreign code holds and the open file
//! handles the storage subsystem hands back on open.
//!
//! Descriptors are allocated from a monotonic counter seeded above a
//! reserved low range, so a NativeIO descriptor never collides with the
//! standard streams or anything the foreign runtime numbered before us, and
//! a descriptor value is never handed out twice during the life of a table.
//!
//! The table does not know what a handle is.  It stores whatever the caller
//! gives it behind an `Arc`, so an operation that is in flight can keep using
//! a handle while another thread closes the same descriptor.
//!
//! Note that the code re-exports an implementation from a specific submodule.
//! You, the caller, should only use the base `fdtables` API and not
//! `fdtables::algorithmname` directly.

// ********************** CLIPPY DISCUSSION **************************** //
// We set base lints to give the fullest, most pedantic feedback possible.
// Though we prefer that they are just warnings during development so that
// build-denial is only enforced in CI.
#![warn(
    clippy::all,
    // It's always good to write as much documentation as possible
    missing_docs,
    clippy::pedantic,
)]
// Descriptors are u64 internally but travel as i32 / usize at the edges.
#![allow(clippy::cast_possible_truncation)]
// ********************* END CLIPPY DISCUSSION ************************* //

// This includes general constants and definitions for things that are
// needed everywhere.  I use the * import here to flatten the namespace so
// folks importing this have the symbols directly imported.
mod commonconstants;
pub use commonconstants::*;

// This includes the specific implementation of the algorithm chosen.
mod dashmaptable;
pub use dashmaptable::*;

/***************************** TESTS FOLLOW ******************************/

// I'm including my unit tests in-line, in this code.
#[cfg(test)]
mod tests {

    use std::collections::HashSet;

    use std::sync::Arc;

    use std::thread;

    // Import the symbols, etc. in this file...
    use super::*;

    // Stand-in for a storage handle.
    #[derive(Debug, PartialEq, Eq)]
    struct FakeHandle(&'static str);

    #[test]
    // The first descriptor handed out sits right above the reserved range.
    fn first_fd_follows_reserved_range() {
        let table: FdTable<FakeHandle> = FdTable::new();
        let fd = table.allocate(Arc::new(FakeHandle("log")));
        assert_eq!(fd, FIRST_VIRTUAL_FD);
        assert_eq!(fd, 101);
    }

    #[test]
    // Basic test to ensure that I can get a descriptor and find the handle
    // in the table afterwards...
    fn allocate_and_resolve_work() {
        let table = FdTable::new();
        let fd1 = table.allocate(Arc::new(FakeHandle("a")));
        let fd2 = table.allocate(Arc::new(FakeHandle("b")));
        assert_ne!(fd1, fd2);
        assert_eq!(*table.resolve(fd1).unwrap(), FakeHandle("a"));
        assert_eq!(*table.resolve(fd2).unwrap(), FakeHandle("b"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn resolve_unknown_fd_is_none() {
        let table: FdTable<FakeHandle> = FdTable::new();
        assert!(table.resolve(0).is_none());
        assert!(table.resolve(FIRST_VIRTUAL_FD).is_none());
        assert!(table.resolve(u64::MAX).is_none());
    }

    #[test]
    // Once released, the descriptor is gone and is never handed out again.
    fn release_removes_and_never_reuses() {
        let table = FdTable::new();
        let fd = table.allocate(Arc::new(FakeHandle("a")));
        assert!(table.release(fd).is_some());
        assert!(table.resolve(fd).is_none());
        // second release finds nothing
        assert!(table.release(fd).is_none());

        let next = table.allocate(Arc::new(FakeHandle("a")));
        assert!(next > fd);
        assert!(!table.is_empty());
    }

    #[test]
    // Descriptors keep increasing no matter how opens and closes interleave.
    fn fds_strictly_increase_across_closes() {
        let table = FdTable::new();
        let mut last = LAST_RESERVED_FD;
        for round in 0..50 {
            let fd = table.allocate(Arc::new(FakeHandle("x")));
            assert!(fd > last);
            last = fd;
            if round % 3 == 0 {
                table.release(fd);
            }
        }
        assert_eq!(last, LAST_RESERVED_FD + 50);
    }

    #[test]
    fn custom_reserved_range() {
        let table = FdTable::with_reserved_range(2);
        assert_eq!(table.allocate(Arc::new(FakeHandle("a"))), 3);
        assert_eq!(table.allocate(Arc::new(FakeHandle("b"))), 4);
    }

    #[test]
    // A handle resolved before the release stays usable by its holder.
    fn resolved_handle_outlives_release() {
        let table = FdTable::new();
        let fd = table.allocate(Arc::new(FakeHandle("a")));
        let held = table.resolve(fd).unwrap();
        table.release(fd);
        assert_eq!(*held, FakeHandle("a"));
        assert!(table.resolve(fd).is_none());
    }

    #[test]
    fn open_fds_are_sorted() {
        let table = FdTable::new();
        let fds: Vec<u64> = (0..10)
            .map(|_| table.allocate(Arc::new(FakeHandle("a"))))
            .collect();
        table.release(fds[4]);
        let mut expected = fds.clone();
        expected.remove(4);
        assert_eq!(table.open_fds(), expected);
    }

    #[test]
    fn drain_empties_table() {
        let table = FdTable::new();
        let fd1 = table.allocate(Arc::new(FakeHandle("a")));
        let fd2 = table.allocate(Arc::new(FakeHandle("b")));
        let drained = table.drain();
        assert_eq!(
            drained.iter().map(|(fd, _)| *fd).collect::<Vec<_>>(),
            vec![fd1, fd2]
        );
        assert!(table.is_empty());
        // the counter is not reset by a drain
        assert_eq!(table.allocate(Arc::new(FakeHandle("c"))), fd2 + 1);
    }

    #[test]
    // Many threads allocating at once must never see the same descriptor.
    fn concurrent_allocations_are_unique() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 200;

        let table = Arc::new(FdTable::new());
        let mut joins = Vec::new();
        for _ in 0..THREADS {
            let table = Arc::clone(&table);
            joins.push(thread::spawn(move || {
                let mut mine = Vec::with_capacity(PER_THREAD);
                for i in 0..PER_THREAD {
                    let fd = table.allocate(Arc::new(FakeHandle("t")));
                    if i % 2 == 0 {
                        table.release(fd);
                    }
                    mine.push(fd);
                }
                mine
            }));
        }

        let mut seen = HashSet::new();
        for join in joins {
            for fd in join.join().unwrap() {
                assert!(seen.insert(fd), "descriptor {fd} handed out twice");
            }
        }
        assert_eq!(seen.len(), THREADS * PER_THREAD);
        assert_eq!(table.len(), THREADS * PER_THREAD / 2);
    }
}
