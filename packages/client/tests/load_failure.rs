//! Library load failure and recovery.
//!
//! Lives in its own test binary: the load guard is process-wide, and this is
//! the only place that may observe a failed first load. A single test keeps
//! the ordering deterministic.

use aqueduct_client::{init_count, load, load_test_library};

#[test]
fn failed_load_does_not_latch_and_may_be_retried() {
    // Force the first bind attempt to fail.
    load_test_library("");
    let err = load().unwrap_err();
    assert!(err.is_initialization());
    assert_eq!(init_count(), 0, "failed load must not count as initialized");

    // Failure does not latch: a corrected name loads fine.
    load_test_library("aqueduct_engine_test");
    load().expect("load succeeds after the name is corrected");
    assert_eq!(init_count(), 1);

    // And the override is ignored once loaded.
    load_test_library("some_other_library");
    load().expect("load stays idempotent");
    assert_eq!(init_count(), 1);
}
