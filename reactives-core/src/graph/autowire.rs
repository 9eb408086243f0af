//! Edge Lifecycle
//!
//! Autowired edges are created and removed here rather than by hand. They
//! always point from a dependency to its dependent through a weak
//! back-reference, so a container never keeps its contents' observers alive
//! and a value never keeps the containers it was put into alive.
//!
//! Two sources of autowiring are supported:
//!
//! - Container membership: adapters call [`attach`] when a value enters a
//!   reactive container and [`detach`] when it leaves or is overwritten.
//! - Observed reads: [`collect_into`] runs a computation inside a scope and
//!   wires its owner onto every reactive it read, replacing the edges from
//!   the previous run.

use crate::config::Attribution;
use crate::reactive::{Reactive, Scope, WeakController};

/// Make `container` react to `value`.
///
/// Does nothing when `value` is `None` (not reactive) or when it is the
/// container itself. Attaching twice is the same as attaching once.
pub fn attach<C>(container: &C, value: Option<&dyn Reactive>)
where
    C: Reactive + ?Sized,
{
    let Some(value) = value else {
        return;
    };
    let (container, value) = (container.react(), value.react());

    match value.register_weak(container) {
        Ok(()) => tracing::trace!(container = %container.id(), value = %value.id(), "Attached"),
        Err(error) => tracing::debug!(%error, "Attachment skipped"),
    }
}

/// Stop `container` from reacting to `value`.
///
/// Does nothing when `value` is `None` or was never attached.
pub fn detach<C>(container: &C, value: Option<&dyn Reactive>)
where
    C: Reactive + ?Sized,
{
    let Some(value) = value else {
        return;
    };
    value.react().unregister(container.react());
    tracing::trace!(container = %container.react().id(), value = %value.react().id(), "Detached");
}

/// Run `body` and wire `dependent` onto every reactive it used.
///
/// Edges from the previous collection for the same dependent are removed
/// first, so a computation only ever reacts to what its latest run read.
pub fn collect_into<D, T>(dependent: &D, body: impl FnOnce() -> T) -> T
where
    D: Reactive + ?Sized,
{
    collect_into_with(dependent, Attribution::Innermost, body)
}

/// Like [`collect_into`], with an explicit attribution rule.
pub fn collect_into_with<D, T>(dependent: &D, attribution: Attribution, body: impl FnOnce() -> T) -> T
where
    D: Reactive + ?Sized,
{
    clear(dependent);

    let dependent = dependent.react();
    let (value, used) = Scope::collect_with(attribution, body);

    let mut dependencies: Vec<WeakController> = Vec::with_capacity(used.len());
    for dependency in used {
        // A computation reading its own reactive is not a dependency.
        if dependency.register_weak(dependent).is_ok() {
            dependencies.push(dependency.downgrade());
        }
    }

    tracing::debug!(
        dependent = %dependent.id(),
        dependencies = dependencies.len(),
        "Autowired dependent"
    );
    dependent.set_dependencies(dependencies);

    value
}

/// Remove every edge the last [`collect_into`] created for `dependent`.
///
/// Edges registered manually with [`ReactorController::register`](crate::reactive::ReactorController::register)
/// are left alone.
pub fn clear<D>(dependent: &D)
where
    D: Reactive + ?Sized,
{
    let dependent = dependent.react();
    for dependency in dependent.take_dependencies() {
        if let Some(dependency) = dependency.upgrade() {
            dependency.unregister_weak(dependent);
        }
    }
}
