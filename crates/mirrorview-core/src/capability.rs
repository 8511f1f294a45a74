//! Process-wide native-mode capability gate
//!
//! Whether native peers can be hosted at all is determined by a single
//! platform-version probe. The probe is expensive and its answer cannot
//! change within a process, so it runs at most once and the result is
//! cached for the process lifetime; every backend decision reads the cache.
//!
//! The cache is one lazily initialized immutable value behind an explicit
//! accessor, not a singleton with mutable fields scattered across call
//! sites. Tests get a reset hook.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::Result;

const UNPROBED: u8 = 0;
const NATIVE: u8 = 1;
const FALLBACK: u8 = 2;

/// Written once by `ensure_initialized`, read many times afterwards
static NATIVE_MODE: AtomicU8 = AtomicU8::new(UNPROBED);

/// Run the capability probe if it has not run yet; return the cached answer.
///
/// On probe failure the gate defaults to *available* (optimistic). A probe
/// can fail for reasons other than "OS too old", and the pessimistic
/// default would fail safe instead; the optimistic choice matches the
/// shipping behavior and is kept deliberately.
pub fn ensure_initialized(probe: impl FnOnce() -> Result<bool>) -> bool {
    match NATIVE_MODE.load(Ordering::Acquire) {
        NATIVE => return true,
        FALLBACK => return false,
        _ => {}
    }

    let available = match probe() {
        Ok(available) => available,
        Err(err) => {
            tracing::warn!("capability probe failed, assuming native mode: {err}");
            true
        }
    };

    let value = if available { NATIVE } else { FALLBACK };
    // First writer wins; a concurrent prober that lost the race re-reads
    // the stored value so all callers agree.
    match NATIVE_MODE.compare_exchange(UNPROBED, value, Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => available,
        Err(stored) => stored == NATIVE,
    }
}

/// Read the cached capability without probing.
///
/// Before `ensure_initialized` has run, answers optimistically; the
/// embedder runs the probe once at startup.
pub fn is_native_mode_available() -> bool {
    NATIVE_MODE.load(Ordering::Acquire) != FALLBACK
}

/// Drop the cached probe result so the next `ensure_initialized` re-probes
#[cfg(any(test, feature = "test-helpers"))]
pub fn reset_for_testing() {
    NATIVE_MODE.store(UNPROBED, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serial_test::serial;
    use std::cell::Cell;

    // The gate is process-global state; these tests must not interleave.

    #[test]
    #[serial]
    fn test_probe_runs_once() {
        reset_for_testing();
        let calls = Cell::new(0);

        let first = ensure_initialized(|| {
            calls.set(calls.get() + 1);
            Ok(false)
        });
        let second = ensure_initialized(|| {
            calls.set(calls.get() + 1);
            Ok(true)
        });

        assert!(!first);
        assert!(!second, "second call must reuse the cached answer");
        assert_eq!(calls.get(), 1);
        reset_for_testing();
    }

    #[test]
    #[serial]
    fn test_probe_failure_defaults_to_available() {
        reset_for_testing();
        let available = ensure_initialized(|| Err(Error::capability_probe("version read failed")));
        assert!(available);
        assert!(is_native_mode_available());
        reset_for_testing();
    }

    #[test]
    #[serial]
    fn test_reset_allows_reprobe() {
        reset_for_testing();
        assert!(ensure_initialized(|| Ok(true)));
        reset_for_testing();
        assert!(!ensure_initialized(|| Ok(false)));
        reset_for_testing();
    }
}
