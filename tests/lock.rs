//! Cross-handle advisory locking tests.
//!
//! Each handle comes from an independent re-open of the same file, so
//! the OS sees separate lock contexts, the same as separate processes.

use std::fs::File;
use std::time::{Duration, Instant};

use dbmap::{lock, LockError};
use tempfile::NamedTempFile;

fn lock_contexts() -> (NamedTempFile, File, File) {
    let tmp = NamedTempFile::new().expect("tempfile");
    let a = tmp.reopen().expect("reopen a");
    let b = tmp.reopen().expect("reopen b");
    (tmp, a, b)
}

#[test]
fn exclusive_locks_are_mutually_exclusive() {
    let (_tmp, first, second) = lock_contexts();

    lock::acquire(&first, true, Duration::ZERO).expect("first wins");

    // The second context cannot acquire until the first releases.
    let err = lock::acquire(&second, true, Duration::from_millis(120))
        .expect_err("second must time out");
    assert!(matches!(err, LockError::Timeout { .. }));

    lock::release(&first).expect("release first");
    lock::acquire(&second, true, Duration::from_millis(500)).expect("second after release");
    lock::release(&second).expect("release second");
}

#[test]
fn timeout_respects_wall_clock() {
    let (_tmp, holder, contender) = lock_contexts();
    lock::acquire(&holder, true, Duration::ZERO).expect("holder");

    let timeout = Duration::from_millis(150);
    let started = Instant::now();
    let err = lock::acquire(&contender, true, timeout).expect_err("must time out");
    let elapsed = started.elapsed();

    match err {
        LockError::Timeout { waited } => assert!(waited > timeout),
        other => panic!("expected Timeout, got {other:?}"),
    }
    assert!(elapsed > timeout);

    lock::release(&holder).expect("release");
}

#[test]
fn shared_then_exclusive_upgrade_pattern() {
    let (_tmp, reader_a, reader_b) = lock_contexts();

    lock::acquire(&reader_a, false, Duration::ZERO).expect("shared a");
    lock::acquire(&reader_b, false, Duration::ZERO).expect("shared b");

    // Releasing one reader is not enough for a writer.
    lock::release(&reader_a).expect("release a");
    let err = lock::acquire(&reader_a, true, Duration::from_millis(120))
        .expect_err("writer blocked by remaining reader");
    assert!(matches!(err, LockError::Timeout { .. }));

    lock::release(&reader_b).expect("release b");
    lock::acquire(&reader_a, true, Duration::from_millis(500)).expect("writer after readers");
    lock::release(&reader_a).expect("release writer");
}
