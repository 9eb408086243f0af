//! Trigger suspension.
//!
//! While a [`SuspendGuard`] is alive, every `trigger()` on the same thread
//! returns immediately without reaching any controller. Guards nest.
//!
//! The counter belongs to the thread, so the guard is `!Send`: it must be
//! dropped on the thread that created it.

use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static SUSPENDED: Cell<usize> = const { Cell::new(0) };
}

/// Suspend triggering on the current thread until the guard is dropped.
///
/// The guard cannot leave the thread that suspended:
///
/// ```compile_fail
/// let guard = reactives_core::graph::suspend();
/// std::thread::spawn(move || drop(guard));
/// ```
pub fn suspend() -> SuspendGuard {
    SUSPENDED.with(|depth| depth.set(depth.get() + 1));
    SuspendGuard {
        _not_send: PhantomData,
    }
}

/// Check whether triggering is suspended on the current thread.
pub fn is_suspended() -> bool {
    SUSPENDED.with(|depth| depth.get() > 0)
}

/// Guard that resumes triggering when dropped.
#[must_use = "triggering resumes as soon as the guard is dropped"]
pub struct SuspendGuard {
    _not_send: PhantomData<*const ()>,
}

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        SUSPENDED.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{PlainReactor, ReactorController};
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    #[test]
    fn suspended_trigger_does_nothing() {
        let count = Arc::new(AtomicI32::new(0));
        let count_clone = count.clone();
        let controller = ReactorController::new();
        controller
            .register(PlainReactor::new(move || {
                count_clone.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        {
            let _guard = suspend();
            controller.trigger().unwrap();
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!controller.is_triggered());

        controller.trigger().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn guards_nest() {
        assert!(!is_suspended());

        let outer = suspend();
        {
            let _inner = suspend();
            assert!(is_suspended());
        }
        assert!(is_suspended());

        drop(outer);
        assert!(!is_suspended());
    }

    #[test]
    fn guard_resumes_the_suspending_thread() {
        let count = Arc::new(AtomicI32::new(0));
        let count_clone = count.clone();
        let controller = ReactorController::new();
        controller
            .register(PlainReactor::new(move || {
                count_clone.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        let guard = suspend();
        // Another thread can neither see nor lift this thread's suspension.
        std::thread::spawn(|| assert!(!is_suspended())).join().unwrap();
        drop(guard);

        assert!(!is_suspended());
        controller.trigger().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn suspension_is_per_thread() {
        let _guard = suspend();

        let other = std::thread::spawn(is_suspended).join().unwrap();
        assert!(!other);
    }
}
