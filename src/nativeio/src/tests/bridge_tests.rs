// Suspension bridge tests
//
// These complete futures from another thread, so the calling thread really
// parks and is woken from outside.

use crate::bridge::{run_blocking, suspend, Target};
use crate::error::NativeIoError;
use crate::fs_calls::NativeIo;
use crate::storage::StorageError;
use crate::tests::*;
use crate::NATIVEIO_ERROR;
use futures::channel::oneshot;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Test: suspend waits for a value sent from another thread
#[test]
fn test_suspend_resumes_with_remote_value() {
    let (tx, rx) = oneshot::channel();
    let sender = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        tx.send(7).unwrap();
    });
    assert_eq!(suspend("test", rx), Ok(7));
    sender.join().unwrap();
}

/// Test: a remote failure comes back as the sentinel
#[test]
fn test_run_blocking_remote_failure() {
    init_logging();
    let (tx, rx) = oneshot::channel::<Result<(), StorageError>>();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        let _ = tx.send(Err(StorageError::Closed));
    });
    let ret = run_blocking("flush", Target::Fd(101), async move {
        let settled = rx.await.map_err(|_| NativeIoError::BadDescriptor(101))?;
        Ok::<_, NativeIoError>(settled?)
    });
    assert_eq!(ret, NATIVEIO_ERROR);
}

/// Test: the fileset calls work over storage that completes elsewhere
#[test]
fn test_deferred_storage_end_to_end() {
    init_logging();
    let storage = DeferredStorage::default();
    let nativeio = NativeIo::new(Arc::new(storage.clone()));

    let fd = open(&nativeio, "later");
    assert_eq!(fd, 101);
    assert_eq!(write(&nativeio, fd, b"abc", 0), 3);
    assert_eq!(nativeio.close_syscall(fd), 0);
    assert_eq!(get_all(&nativeio), (1, Some(vec!["later".to_string()])));
    assert_eq!(open(&nativeio, "Nope"), NATIVEIO_ERROR);
    assert_eq!(delete(&nativeio, "later"), 0);
    assert_eq!(storage.inner.contents("later"), None);
}

/// Test: several threads parked at once all resume with their own result
#[test]
fn test_parallel_suspensions() {
    init_logging();
    let nativeio = Arc::new(NativeIo::new(Arc::new(DeferredStorage::default())));
    let workers: Vec<_> = (0..4)
        .map(|i| {
            let nativeio = Arc::clone(&nativeio);
            thread::spawn(move || open(&nativeio, &format!("p{}", i)))
        })
        .collect();
    let mut fds: Vec<i32> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    fds.sort_unstable();
    assert_eq!(fds, vec![101, 102, 103, 104]);
}
