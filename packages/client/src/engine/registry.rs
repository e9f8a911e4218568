//! Process-wide engine support registry.
//!
//! Owns two guarantees: library support is initialized at most once per
//! process (first caller pays the cost, concurrent callers block briefly and
//! observe the result), and at most one engine instance is live at a time.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use once_cell::sync::Lazy;

use crate::error::{self, Result};

/// Library name bound when the caller never overrides it.
pub const DEFAULT_LIBRARY: &str = "aqueduct_engine";

struct LibraryGuard {
    /// Fast path: set only after a fully successful initialization.
    loaded: AtomicBool,
    /// Slow path: serializes contending first callers.
    lock: Mutex<()>,
    name: Mutex<String>,
    init_calls: AtomicUsize,
}

static LIBRARY: Lazy<LibraryGuard> = Lazy::new(|| LibraryGuard {
    loaded: AtomicBool::new(false),
    lock: Mutex::new(()),
    name: Mutex::new(DEFAULT_LIBRARY.to_string()),
    init_calls: AtomicUsize::new(0),
});

/// The single live-engine slot; holds the id of the running engine.
static ACTIVE_ENGINE: Lazy<Mutex<Option<u64>>> = Lazy::new(|| Mutex::new(None));

/// Initializes engine support, at most once per process.
///
/// Safe under concurrent first calls: exactly one caller performs the
/// initialization while the others block on the guard and then observe the
/// already-initialized support. On failure the guard does not record
/// success, so a later call may retry.
pub fn load() -> Result<()> {
    if LIBRARY.loaded.load(Ordering::Acquire) {
        return Ok(());
    }

    let _guard = LIBRARY.lock.lock().unwrap_or_else(PoisonError::into_inner);
    if LIBRARY.loaded.load(Ordering::Acquire) {
        return Ok(());
    }

    let name = LIBRARY
        .name
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    bind_library(&name)?;
    LIBRARY.loaded.store(true, Ordering::Release);
    tracing::debug!(library = %name, "engine support initialized");
    Ok(())
}

/// Overrides the library name bound by [`load`].
///
/// Only honored before the first successful `load()` call; afterwards the
/// library is already bound and this has no effect. For testing only.
pub fn load_test_library(name: &str) {
    if LIBRARY.loaded.load(Ordering::Acquire) {
        return;
    }
    let _guard = LIBRARY.lock.lock().unwrap_or_else(PoisonError::into_inner);
    if LIBRARY.loaded.load(Ordering::Acquire) {
        return;
    }
    *LIBRARY.name.lock().unwrap_or_else(PoisonError::into_inner) = name.to_string();
}

/// Number of times library initialization actually ran. Test observability
/// for the at-most-once contract.
#[must_use]
pub fn init_count() -> usize {
    LIBRARY.init_calls.load(Ordering::Acquire)
}

fn bind_library(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(error::initialization("library name is empty"));
    }
    LIBRARY.init_calls.fetch_add(1, Ordering::AcqRel);
    Ok(())
}

/// Claims the process-wide engine slot for `engine_id`.
///
/// The one-time-load guarantee covers a single engine instance; a second
/// live engine is refused deterministically.
pub(crate) fn claim_engine(engine_id: u64) -> Result<()> {
    let mut slot = ACTIVE_ENGINE.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(active) = *slot {
        return Err(error::lifecycle_order(format!(
            "engine {active} is already running in this process"
        )));
    }
    *slot = Some(engine_id);
    Ok(())
}

/// Releases the engine slot. Re-creation after a release is supported for
/// testing.
pub(crate) fn release_engine(engine_id: u64) {
    let mut slot = ACTIVE_ENGINE.lock().unwrap_or_else(PoisonError::into_inner);
    if *slot == Some(engine_id) {
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrent_loads_initialize_once() {
        let handles: Vec<_> = (0..16)
            .map(|_| std::thread::spawn(|| load().is_ok()))
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(init_count(), 1);
    }

    #[test]
    fn load_is_idempotent() {
        assert!(load().is_ok());
        assert!(load().is_ok());
        assert_eq!(init_count(), 1);
    }

    #[test]
    fn test_library_override_is_ignored_after_load() {
        assert!(load().is_ok());
        load_test_library("something_else");
        assert!(load().is_ok());
        assert_eq!(init_count(), 1);
    }

    #[test]
    fn engine_slot_is_exclusive() {
        // Claim a sentinel id well clear of ids used by session tests.
        let id = u64::MAX - 1;
        if claim_engine(id).is_err() {
            // Another test holds the slot; nothing further to assert here.
            return;
        }
        let err = claim_engine(u64::MAX).unwrap_err();
        assert!(err.is_lifecycle_order());
        release_engine(id);
    }
}
