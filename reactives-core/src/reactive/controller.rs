//! Reactor Controller
//!
//! Every reactive owns exactly one controller. The controller holds the
//! ordered set of reactors to call when the reactive is triggered, and a flag
//! recording whether it has been triggered yet.
//!
//! # Handle Semantics
//!
//! A controller is a cheap handle over shared state. Cloning it yields another
//! handle to the same controller (same [`ControllerId`], same reactor set).
//! Edges that must not keep a dependent alive hold a [`WeakController`]
//! instead.
//!
//! # Thread Safety
//!
//! The reactor set sits behind one `parking_lot::Mutex` per controller. The
//! lock is only held long enough to update or snapshot the set; it is never
//! held while a reactor runs, so reactors may freely register, unregister or
//! trigger.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use indexmap::map::Entry;
use indexmap::IndexMap;
use parking_lot::Mutex;
use smallvec::SmallVec;

use super::id::ControllerId;
use super::reactor::{PlainReactor, Reactor, ReactorKey};
use crate::config::FailurePolicy;
use crate::error::{ReactiveError, Result};
use crate::graph::{Cascade, Edge, EdgeStrength, TriggerOrigin};

/// A value with an attached [`ReactorController`].
pub trait Reactive {
    /// The controller owned by this reactive.
    fn react(&self) -> &ReactorController;
}

impl Reactive for ReactorController {
    fn react(&self) -> &ReactorController {
        self
    }
}

impl<T: Reactive + ?Sized> Reactive for Arc<T> {
    fn react(&self) -> &ReactorController {
        (**self).react()
    }
}

struct ControllerInner {
    id: ControllerId,

    /// Registered reactors in registration order, keyed by identity.
    reactors: Mutex<IndexMap<ReactorKey, Edge>>,

    /// Controllers this one was autowired onto by the last collection.
    dependencies: Mutex<Vec<WeakController>>,

    /// Set once any cascade reaches this controller.
    triggered: AtomicBool,

    /// Called when a cascade reaches this controller, before its reactors.
    on_trigger: Option<PlainReactor>,
}

/// The reactor registry of a single reactive.
///
/// # Example
///
/// ```rust
/// use reactives_core::reactive::{PlainReactor, ReactorController};
///
/// let controller = ReactorController::new();
/// controller.register(PlainReactor::new(|| println!("changed"))).unwrap();
///
/// controller.trigger().unwrap();
/// assert!(controller.is_triggered());
/// ```
#[derive(Clone)]
pub struct ReactorController {
    inner: Arc<ControllerInner>,
}

impl ReactorController {
    /// Create a controller with an empty reactor set.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a controller that calls `on_trigger` whenever a cascade reaches
    /// it, before any of its reactors.
    pub fn with_on_trigger(on_trigger: PlainReactor) -> Self {
        Self::build(Some(on_trigger))
    }

    fn build(on_trigger: Option<PlainReactor>) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                id: ControllerId::new(),
                reactors: Mutex::new(IndexMap::new()),
                dependencies: Mutex::new(Vec::new()),
                triggered: AtomicBool::new(false),
                on_trigger,
            }),
        }
    }

    /// Get the controller's unique ID.
    pub fn id(&self) -> ControllerId {
        self.inner.id
    }

    /// Register a reactor.
    ///
    /// Registering a reactor that is already present is a no-op and keeps its
    /// original position. A reactive reactor registered this way is held
    /// strongly: it stays alive until it is unregistered.
    pub fn register<R: Into<Reactor>>(&self, reactor: R) -> Result<()> {
        let reactor = reactor.into();
        if let Reactor::Reactive(dependent) = &reactor {
            self.check_not_self(dependent)?;
        }
        self.insert_edge(Edge::from(reactor));
        Ok(())
    }

    /// Register a plain reactor. Unlike [`register`](Self::register) this
    /// cannot fail.
    pub fn register_plain(&self, reactor: &PlainReactor) {
        self.insert_edge(Edge::Plain(reactor.clone()));
    }

    /// Register a reactive dependent through a weak back-reference.
    ///
    /// The edge does not keep `dependent` alive. Once it is dropped the edge
    /// is discarded the next time this controller is triggered.
    pub fn register_weak(&self, dependent: &ReactorController) -> Result<()> {
        self.check_not_self(dependent)?;
        self.insert_edge(Edge::Weak(dependent.downgrade()));
        Ok(())
    }

    fn check_not_self(&self, dependent: &ReactorController) -> Result<()> {
        if dependent.id() == self.id() {
            return Err(ReactiveError::SelfReaction {
                controller: self.id(),
            });
        }
        Ok(())
    }

    fn insert_edge(&self, edge: Edge) {
        let mut reactors = self.inner.reactors.lock();
        match reactors.entry(edge.key()) {
            Entry::Vacant(entry) => {
                entry.insert(edge);
            }
            // A manual registration upgrades an autowired edge in place.
            Entry::Occupied(mut entry) => {
                if entry.get().strength() == EdgeStrength::Weak
                    && edge.strength() == EdgeStrength::Strong
                {
                    entry.insert(edge);
                }
            }
        }
    }

    /// Remove a reactor. Removing a reactor that is not registered is a no-op.
    pub fn unregister<R: Into<Reactor>>(&self, reactor: R) {
        let key = reactor.into().key();
        self.inner.reactors.lock().shift_remove(&key);
    }

    /// Remove `dependent` only if it is held through a weak edge.
    pub(crate) fn unregister_weak(&self, dependent: &ReactorController) {
        let key = ReactorKey::Reactive(dependent.id());
        let mut reactors = self.inner.reactors.lock();
        if reactors.get(&key).map(Edge::strength) == Some(EdgeStrength::Weak) {
            reactors.shift_remove(&key);
        }
    }

    /// Remove every reactor.
    pub fn clear(&self) {
        self.inner.reactors.lock().clear();
    }

    /// Check whether a reactor is registered.
    pub fn contains<R: Into<Reactor>>(&self, reactor: R) -> bool {
        let key = reactor.into().key();
        self.inner
            .reactors
            .lock()
            .get(&key)
            .is_some_and(|edge| edge.resolve().is_some())
    }

    /// How the given reactor is held, if it is registered and alive.
    pub fn edge_strength<R: Into<Reactor>>(&self, reactor: R) -> Option<EdgeStrength> {
        self.edge_strength_by_key(reactor.into().key())
    }

    fn edge_strength_by_key(&self, key: ReactorKey) -> Option<EdgeStrength> {
        self.inner
            .reactors
            .lock()
            .get(&key)
            .filter(|edge| edge.resolve().is_some())
            .map(Edge::strength)
    }

    /// Get the live reactors in registration order.
    pub fn reactors(&self) -> Vec<Reactor> {
        self.inner
            .reactors
            .lock()
            .values()
            .filter_map(Edge::resolve)
            .collect()
    }

    /// Get the number of live reactors.
    pub fn reactor_count(&self) -> usize {
        self.inner
            .reactors
            .lock()
            .values()
            .filter(|edge| edge.resolve().is_some())
            .count()
    }

    /// Check whether any cascade has reached this controller.
    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Trigger this controller, aborting at the first failing reactor.
    pub fn trigger(&self) -> Result<()> {
        self.trigger_with(FailurePolicy::FailFast)
    }

    /// Trigger this controller with the given failure policy.
    pub fn trigger_with(&self, policy: FailurePolicy) -> Result<()> {
        Cascade::new(policy).run(self)
    }

    /// Trigger this controller for a change its own reactive made.
    ///
    /// Same as [`trigger`](Self::trigger), except this controller's
    /// `on_trigger` hook is not called. A reactive that caches a value it
    /// just wrote uses this to notify its dependents without discarding it.
    pub fn trigger_internal(&self) -> Result<()> {
        Cascade::new(FailurePolicy::FailFast).run_from(self, TriggerOrigin::Internal)
    }

    /// Create a weak back-reference to this controller.
    pub fn downgrade(&self) -> WeakController {
        WeakController {
            id: self.id(),
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Get the live controllers this one was last autowired onto.
    pub fn dependencies(&self) -> Vec<ReactorController> {
        self.inner
            .dependencies
            .lock()
            .iter()
            .filter_map(WeakController::upgrade)
            .collect()
    }

    pub(crate) fn take_dependencies(&self) -> Vec<WeakController> {
        std::mem::take(&mut *self.inner.dependencies.lock())
    }

    pub(crate) fn set_dependencies(&self, dependencies: Vec<WeakController>) {
        *self.inner.dependencies.lock() = dependencies;
    }

    pub(crate) fn mark_triggered(&self) {
        self.inner.triggered.store(true, Ordering::SeqCst);
    }

    pub(crate) fn on_trigger(&self) -> Option<&PlainReactor> {
        self.inner.on_trigger.as_ref()
    }

    /// Snapshot the live reactors for a cascade, pruning dead weak edges.
    pub(crate) fn snapshot(&self) -> SmallVec<[Reactor; 8]> {
        let mut live = SmallVec::new();
        let mut pruned = 0usize;

        self.inner.reactors.lock().retain(|_, edge| match edge.resolve() {
            Some(reactor) => {
                live.push(reactor);
                true
            }
            None => {
                pruned += 1;
                false
            }
        });

        if pruned > 0 {
            tracing::debug!(controller = %self.id(), pruned, "Pruned dead weak edges");
        }

        live
    }
}

impl Default for ReactorController {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ReactorController {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for ReactorController {}

impl Hash for ReactorController {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for ReactorController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactorController")
            .field("id", &self.id())
            .field("reactor_count", &self.reactor_count())
            .field("triggered", &self.is_triggered())
            .finish()
    }
}

/// A weak back-reference to a [`ReactorController`].
///
/// Holding one never keeps the controller alive.
#[derive(Clone)]
pub struct WeakController {
    id: ControllerId,
    inner: Weak<ControllerInner>,
}

impl WeakController {
    /// The ID of the referenced controller, valid even after it is dropped.
    pub fn id(&self) -> ControllerId {
        self.id
    }

    /// Get the controller back if it is still alive.
    pub fn upgrade(&self) -> Option<ReactorController> {
        self.inner.upgrade().map(|inner| ReactorController { inner })
    }

    /// Check whether the controller is still alive.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for WeakController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakController")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;

    fn counter() -> (Arc<AtomicI32>, PlainReactor) {
        let count = Arc::new(AtomicI32::new(0));
        let count_clone = count.clone();
        let reactor = PlainReactor::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        (count, reactor)
    }

    #[test]
    fn register_keeps_insertion_order() {
        let controller = ReactorController::new();
        let a = PlainReactor::new(|| {});
        let b = ReactorController::new();
        let c = PlainReactor::new(|| {});

        controller.register(&a).unwrap();
        controller.register(&b).unwrap();
        controller.register(&c).unwrap();

        let keys: Vec<_> = controller.reactors().iter().map(Reactor::key).collect();
        assert_eq!(
            keys,
            vec![
                ReactorKey::Plain(a.id()),
                ReactorKey::Reactive(b.id()),
                ReactorKey::Plain(c.id()),
            ]
        );
    }

    #[test]
    fn duplicate_registration_is_a_noop() {
        let controller = ReactorController::new();
        let (count, reactor) = counter();

        controller.register(&reactor).unwrap();
        controller.register(reactor.clone()).unwrap();
        assert_eq!(controller.reactor_count(), 1);

        controller.trigger().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregister_missing_reactor_is_a_noop() {
        let controller = ReactorController::new();
        let reactor = PlainReactor::new(|| {});

        controller.unregister(&reactor);
        controller.register(&reactor).unwrap();
        controller.unregister(&reactor);
        controller.unregister(&reactor);

        assert_eq!(controller.reactor_count(), 0);
    }

    #[test]
    fn self_registration_fails_fast() {
        let controller = ReactorController::new();

        let error = controller.register(&controller).unwrap_err();
        assert!(matches!(error, ReactiveError::SelfReaction { controller: id } if id == controller.id()));

        assert!(controller.register_weak(&controller).is_err());
        assert_eq!(controller.reactor_count(), 0);
    }

    #[test]
    fn clear_removes_everything() {
        let controller = ReactorController::new();
        let (count, reactor) = counter();
        controller.register(&reactor).unwrap();
        controller.register(ReactorController::new()).unwrap();

        controller.clear();
        controller.trigger().unwrap();

        assert_eq!(controller.reactor_count(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn trigger_sets_flag() {
        let controller = ReactorController::new();
        assert!(!controller.is_triggered());

        controller.trigger().unwrap();
        assert!(controller.is_triggered());
    }

    #[test]
    fn strong_registration_upgrades_weak_edge() {
        let controller = ReactorController::new();
        let dependent = ReactorController::new();

        controller.register_weak(&dependent).unwrap();
        assert_eq!(controller.edge_strength(&dependent), Some(EdgeStrength::Weak));

        controller.register(&dependent).unwrap();
        assert_eq!(controller.edge_strength(&dependent), Some(EdgeStrength::Strong));

        // The reverse does not downgrade.
        controller.register_weak(&dependent).unwrap();
        assert_eq!(controller.edge_strength(&dependent), Some(EdgeStrength::Strong));
    }

    #[test]
    fn weak_edge_does_not_keep_dependent_alive() {
        let controller = ReactorController::new();
        let dependent = ReactorController::new();
        let weak = dependent.downgrade();

        controller.register_weak(&dependent).unwrap();
        assert!(controller.contains(&dependent));
        drop(dependent);

        assert!(!weak.is_alive());
        assert_eq!(controller.reactor_count(), 0);
        assert_eq!(controller.edge_strength_by_key(ReactorKey::Reactive(weak.id())), None);
        assert!(controller.snapshot().is_empty());
    }

    #[test]
    fn strong_edge_keeps_dependent_alive() {
        let controller = ReactorController::new();
        let dependent = ReactorController::new();
        let weak = dependent.downgrade();

        controller.register(&dependent).unwrap();
        drop(dependent);

        assert!(weak.is_alive());
        controller.clear();
        assert!(!weak.is_alive());
    }

    #[test]
    fn register_plain_matches_register() {
        let controller = ReactorController::new();
        let (count, reactor) = counter();

        controller.register_plain(&reactor);
        controller.register(&reactor).unwrap();
        assert_eq!(controller.reactor_count(), 1);
        assert_eq!(controller.edge_strength(&reactor), Some(EdgeStrength::Strong));

        controller.trigger().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clones_share_state() {
        let controller = ReactorController::new();
        let clone = controller.clone();

        controller.register(PlainReactor::new(|| {})).unwrap();
        assert_eq!(clone.reactor_count(), 1);
        assert_eq!(controller, clone);

        clone.trigger().unwrap();
        assert!(controller.is_triggered());
    }
}
