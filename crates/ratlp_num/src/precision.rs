use std::sync::atomic::{AtomicU64, Ordering};

/// Default mantissa width for [`crate::Mpf`] arithmetic, in bits.
pub const DEFAULT_PRECISION: u64 = 128;

static MPF_PRECISION: AtomicU64 = AtomicU64::new(DEFAULT_PRECISION);

/// Mantissa width, in bits, that new `Mpf` results are rounded to.
pub fn current_precision() -> u64 {
    MPF_PRECISION.load(Ordering::Relaxed)
}

/// Set the process-wide `Mpf` precision, returning the previous value.
///
/// This is a process-wide mutation: callers must not drive two solves at
/// different precisions concurrently. Prefer [`PrecisionGuard`].
pub fn set_precision(bits: u64) -> u64 {
    MPF_PRECISION.swap(bits.max(2), Ordering::Relaxed)
}

/// Scoped precision change: sets the process-wide `Mpf` precision on
/// creation and restores the previous value on drop.
#[derive(Debug)]
pub struct PrecisionGuard {
    prev: u64,
}

impl PrecisionGuard {
    pub fn new(bits: u64) -> Self {
        Self {
            prev: set_precision(bits),
        }
    }
}

impl Drop for PrecisionGuard {
    fn drop(&mut self) {
        set_precision(self.prev);
    }
}

/// The precision is process-wide state, so tests that change it must not
/// run interleaved. Tests take this lock before touching it.
#[cfg(test)]
pub(crate) static TEST_PRECISION_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
pub(crate) fn test_precision_lock() -> std::sync::MutexGuard<'static, ()> {
    TEST_PRECISION_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_restores_previous_precision() {
        let _lock = test_precision_lock();
        let before = current_precision();
        {
            let _guard = PrecisionGuard::new(before + 64);
            assert_eq!(current_precision(), before + 64);
            {
                let _inner = PrecisionGuard::new(32);
                assert_eq!(current_precision(), 32);
            }
            assert_eq!(current_precision(), before + 64);
        }
        assert_eq!(current_precision(), before);
    }

    #[test]
    fn precision_floor_is_two_bits() {
        let _lock = test_precision_lock();
        let prev = set_precision(0);
        assert_eq!(current_precision(), 2);
        set_precision(prev);
    }
}
