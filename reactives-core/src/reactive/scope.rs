//! Autowiring Scopes
//!
//! A scope is a collection window: while it is open, every reactive that
//! reports a read through [`Scope::register_use`] is recorded in the scope's
//! used set. Callers use the set to wire the computation's owner onto the
//! reactives it read.
//!
//! # Implementation
//!
//! Scopes live on a stack. Each thread has its own stack, and a future run
//! through [`with_task_scopes`] gets a task-local stack that follows it across
//! threads. Entering a scope pushes a frame; a guard pops it on every exit
//! path, including unwinding.
//!
//! Reads are attributed to the innermost open frame only. A frame opened with
//! [`Attribution::Bubble`] hands its used set to the enclosing frame when it
//! closes normally.

use std::cell::RefCell;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use super::controller::{Reactive, ReactorController};
use super::id::ControllerId;
use crate::config::Attribution;

thread_local! {
    static THREAD_SCOPES: ScopeStack = ScopeStack::default();
}

tokio::task_local! {
    static TASK_SCOPES: ScopeStack;
}

/// Run `f` against the task-local stack if one is installed, otherwise
/// against the current thread's stack.
fn with_stack<R>(f: impl FnOnce(&ScopeStack) -> R) -> R {
    if TASK_SCOPES.try_with(|_| ()).is_ok() {
        TASK_SCOPES.with(f)
    } else {
        THREAD_SCOPES.with(f)
    }
}

/// Run a future with its own scope stack.
///
/// Inside the future, scopes are isolated from whatever thread happens to
/// poll it, and from every other task.
pub async fn with_task_scopes<F: Future>(future: F) -> F::Output {
    TASK_SCOPES.scope(ScopeStack::default(), future).await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScopeId(u64);

impl ScopeId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy)]
enum FrameMode {
    Collect(Attribution),
    Untracked,
}

struct Frame {
    id: ScopeId,
    mode: FrameMode,
    used: UsedSet,
}

#[derive(Default)]
struct ScopeStack {
    frames: RefCell<Vec<Frame>>,
}

/// The reactives used while a scope was open, in first-use order.
#[derive(Debug, Clone, Default)]
pub struct UsedSet {
    reactives: IndexMap<ControllerId, ReactorController>,
}

impl UsedSet {
    fn insert(&mut self, controller: &ReactorController) {
        self.reactives
            .entry(controller.id())
            .or_insert_with(|| controller.clone());
    }

    fn merge(&mut self, other: UsedSet) {
        for (id, controller) in other.reactives {
            self.reactives.entry(id).or_insert(controller);
        }
    }

    pub fn len(&self) -> usize {
        self.reactives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactives.is_empty()
    }

    /// Check whether the given reactive was used.
    pub fn contains<R: Reactive + ?Sized>(&self, reactive: &R) -> bool {
        self.reactives.contains_key(&reactive.react().id())
    }

    /// Iterate over the used controllers in first-use order.
    pub fn iter(&self) -> impl Iterator<Item = &ReactorController> {
        self.reactives.values()
    }

    /// The IDs of the used controllers in first-use order.
    pub fn ids(&self) -> Vec<ControllerId> {
        self.reactives.keys().copied().collect()
    }
}

impl IntoIterator for UsedSet {
    type Item = ReactorController;
    type IntoIter = indexmap::map::IntoValues<ControllerId, ReactorController>;

    fn into_iter(self) -> Self::IntoIter {
        self.reactives.into_values()
    }
}

/// Pops its frame when dropped.
///
/// [`ScopeGuard::finish`] pops it on the normal path and returns the used
/// set; if the body unwinds, `Drop` pops it and the used set is discarded.
struct ScopeGuard {
    id: ScopeId,
    finished: bool,
}

impl ScopeGuard {
    fn enter(mode: FrameMode) -> Self {
        let id = ScopeId::new();
        with_stack(|stack| {
            stack.frames.borrow_mut().push(Frame {
                id,
                mode,
                used: UsedSet::default(),
            });
        });
        Self {
            id,
            finished: false,
        }
    }

    fn pop(&self) -> Option<Frame> {
        with_stack(|stack| {
            let popped = stack.frames.borrow_mut().pop();
            if let Some(frame) = &popped {
                debug_assert_eq!(
                    frame.id, self.id,
                    "Scope mismatch: expected {:?}, got {:?}",
                    self.id, frame.id
                );
            }
            popped
        })
    }

    fn finish(mut self) -> UsedSet {
        self.finished = true;
        let Some(frame) = self.pop() else {
            return UsedSet::default();
        };

        if let FrameMode::Collect(Attribution::Bubble) = frame.mode {
            with_stack(|stack| {
                if let Some(parent) = stack.frames.borrow_mut().last_mut() {
                    if let FrameMode::Collect(_) = parent.mode {
                        parent.used.merge(frame.used.clone());
                    }
                }
            });
        }

        frame.used
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.pop();
        }
    }
}

/// Entry points for the scope stack.
pub struct Scope;

impl Scope {
    /// Run `body` inside a new scope and return its result together with the
    /// reactives it used.
    ///
    /// # Example
    ///
    /// ```rust
    /// use reactives_core::reactive::{ReactorController, Scope};
    ///
    /// let source = ReactorController::new();
    /// let (value, used) = Scope::collect(|| {
    ///     Scope::register_use(&source);
    ///     42
    /// });
    ///
    /// assert_eq!(value, 42);
    /// assert!(used.contains(&source));
    /// ```
    pub fn collect<T>(body: impl FnOnce() -> T) -> (T, UsedSet) {
        Self::collect_with(Attribution::Innermost, body)
    }

    /// Like [`Scope::collect`], with an explicit attribution rule.
    pub fn collect_with<T>(attribution: Attribution, body: impl FnOnce() -> T) -> (T, UsedSet) {
        let guard = ScopeGuard::enter(FrameMode::Collect(attribution));
        let value = body();
        (value, guard.finish())
    }

    /// Run `body` with tracking disabled. Reads inside are recorded nowhere.
    pub fn untracked<T>(body: impl FnOnce() -> T) -> T {
        let guard = ScopeGuard::enter(FrameMode::Untracked);
        let value = body();
        drop(guard.finish());
        value
    }

    /// Record that `reactive` was used.
    ///
    /// Adds it to the innermost open scope. Does nothing if no scope is open
    /// or the innermost scope is untracked.
    pub fn register_use<R: Reactive + ?Sized>(reactive: &R) {
        // `react()` may itself query the scope stack.
        let controller = reactive.react();
        with_stack(|stack| {
            if let Some(frame) = stack.frames.borrow_mut().last_mut() {
                if let FrameMode::Collect(_) = frame.mode {
                    frame.used.insert(controller);
                }
            }
        });
    }

    /// The number of open scopes on the current stack.
    pub fn depth() -> usize {
        with_stack(|stack| stack.frames.borrow().len())
    }

    /// Check whether reads are currently being collected.
    pub fn is_collecting() -> bool {
        with_stack(|stack| {
            matches!(
                stack.frames.borrow().last(),
                Some(Frame {
                    mode: FrameMode::Collect(_),
                    ..
                })
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_records_uses() {
        let a = ReactorController::new();
        let b = ReactorController::new();

        assert!(!Scope::is_collecting());
        let ((), used) = Scope::collect(|| {
            assert!(Scope::is_collecting());
            Scope::register_use(&a);
            Scope::register_use(&b);
            Scope::register_use(&a);
        });

        assert_eq!(used.ids(), vec![a.id(), b.id()]);
        assert_eq!(Scope::depth(), 0);
    }

    #[test]
    fn uses_outside_scope_are_ignored() {
        let a = ReactorController::new();
        Scope::register_use(&a);

        let ((), used) = Scope::collect(|| {});
        assert!(used.is_empty());
    }

    #[test]
    fn nested_scopes_attribute_to_innermost() {
        let outer_read = ReactorController::new();
        let inner_read = ReactorController::new();

        let (inner_used, outer_used) = Scope::collect(|| {
            Scope::register_use(&outer_read);
            let ((), inner_used) = Scope::collect(|| {
                assert_eq!(Scope::depth(), 2);
                Scope::register_use(&inner_read);
            });
            inner_used
        });

        assert_eq!(inner_used.ids(), vec![inner_read.id()]);
        assert_eq!(outer_used.ids(), vec![outer_read.id()]);
    }

    #[test]
    fn bubbling_scope_hands_uses_to_parent() {
        let outer_read = ReactorController::new();
        let inner_read = ReactorController::new();

        let ((), outer_used) = Scope::collect(|| {
            Scope::register_use(&outer_read);
            let ((), inner_used) = Scope::collect_with(Attribution::Bubble, || {
                Scope::register_use(&inner_read);
            });
            assert_eq!(inner_used.len(), 1);
        });

        assert_eq!(outer_used.ids(), vec![outer_read.id(), inner_read.id()]);
    }

    #[test]
    fn untracked_hides_reads() {
        let hidden = ReactorController::new();
        let seen = ReactorController::new();

        let ((), used) = Scope::collect(|| {
            Scope::untracked(|| {
                assert!(!Scope::is_collecting());
                Scope::register_use(&hidden);
            });
            Scope::register_use(&seen);
        });

        assert_eq!(used.ids(), vec![seen.id()]);
    }

    struct DepthReading {
        controller: ReactorController,
        seen_depth: std::cell::Cell<usize>,
    }

    impl Reactive for DepthReading {
        fn react(&self) -> &ReactorController {
            self.seen_depth.set(Scope::depth());
            &self.controller
        }
    }

    #[test]
    fn react_may_query_the_scope_stack() {
        let reactive = DepthReading {
            controller: ReactorController::new(),
            seen_depth: std::cell::Cell::new(0),
        };

        let ((), used) = Scope::collect(|| {
            assert!(Scope::is_collecting());
            Scope::register_use(&reactive);
        });

        assert_eq!(reactive.seen_depth.get(), 1);
        assert_eq!(used.ids(), vec![reactive.controller.id()]);
    }

    #[test]
    fn scope_is_popped_when_body_panics() {
        let result = std::panic::catch_unwind(|| Scope::collect::<()>(|| panic!("body failed")));

        assert!(result.is_err());
        assert_eq!(Scope::depth(), 0);
    }

    #[test]
    fn scopes_are_per_thread() {
        let a = ReactorController::new();
        let a_clone = a.clone();

        let ((), used) = Scope::collect(move || {
            std::thread::spawn(move || {
                assert_eq!(Scope::depth(), 0);
                Scope::register_use(&a_clone);
            })
            .join()
            .unwrap();
        });

        assert!(!used.contains(&a));
    }

    #[tokio::test]
    async fn task_scopes_are_isolated() {
        let a = ReactorController::new();

        let ((), outer) = Scope::collect(|| {});
        assert!(outer.is_empty());

        let used = with_task_scopes(async {
            assert_eq!(Scope::depth(), 0);
            let ((), used) = Scope::collect(|| Scope::register_use(&a));
            used
        })
        .await;

        assert!(used.contains(&a));
        assert_eq!(Scope::depth(), 0);
    }
}
