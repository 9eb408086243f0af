//! Reactors: the things a controller calls when it is triggered.
//!
//! A reactor is either a plain zero-argument callable or another reactive's
//! controller. The two are kept apart in [`Reactor`] so the cascade can treat
//! plain reactors as leaves and reactive reactors as graph nodes to expand.

use std::fmt;
use std::sync::Arc;

use super::controller::ReactorController;
use super::id::{ControllerId, ReactorId};
use crate::error::BoxError;

type ReactorFn = dyn Fn() -> Result<(), BoxError> + Send + Sync;

/// An opaque callable reactor.
///
/// Identity is the [`ReactorId`] assigned at construction. Cloning keeps the
/// ID, so registering a clone of an already registered reactor is a no-op.
#[derive(Clone)]
pub struct PlainReactor {
    id: ReactorId,
    call: Arc<ReactorFn>,
}

impl PlainReactor {
    /// Create a reactor from an infallible callback.
    pub fn new<F>(call: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::fallible(move || {
            call();
            Ok::<(), BoxError>(())
        })
    }

    /// Create a reactor whose failures are reported by `trigger()`.
    pub fn fallible<F, E>(call: F) -> Self
    where
        F: Fn() -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            id: ReactorId::new(),
            call: Arc::new(move || call().map_err(Into::into)),
        }
    }

    /// Get the reactor's unique ID.
    pub fn id(&self) -> ReactorId {
        self.id
    }

    /// Invoke the reactor.
    pub fn call(&self) -> Result<(), BoxError> {
        (self.call)()
    }
}

impl fmt::Debug for PlainReactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainReactor").field("id", &self.id).finish()
    }
}

/// A reactor as seen by a controller's reactor set.
#[derive(Clone, Debug)]
pub enum Reactor {
    /// A terminal callable.
    Plain(PlainReactor),
    /// Another reactive; triggering reaches its controller and its reactors.
    Reactive(ReactorController),
}

impl Reactor {
    /// The identity this reactor is deduplicated by.
    pub fn key(&self) -> ReactorKey {
        match self {
            Self::Plain(reactor) => ReactorKey::Plain(reactor.id()),
            Self::Reactive(controller) => ReactorKey::Reactive(controller.id()),
        }
    }
}

impl From<PlainReactor> for Reactor {
    fn from(reactor: PlainReactor) -> Self {
        Self::Plain(reactor)
    }
}

impl From<&PlainReactor> for Reactor {
    fn from(reactor: &PlainReactor) -> Self {
        Self::Plain(reactor.clone())
    }
}

impl From<ReactorController> for Reactor {
    fn from(controller: ReactorController) -> Self {
        Self::Reactive(controller)
    }
}

impl From<&ReactorController> for Reactor {
    fn from(controller: &ReactorController) -> Self {
        Self::Reactive(controller.clone())
    }
}

/// Identity of an entry in a reactor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactorKey {
    Plain(ReactorId),
    Reactive(ControllerId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn plain_reactor_calls_callback() {
        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let reactor = PlainReactor::new(move || {
            called_clone.store(true, Ordering::SeqCst);
        });

        assert!(!called.load(Ordering::SeqCst));
        reactor.call().unwrap();
        assert!(called.load(Ordering::SeqCst));
    }

    #[test]
    fn fallible_reactor_reports_error() {
        let reactor = PlainReactor::fallible(|| Err("broken"));

        let error = reactor.call().unwrap_err();
        assert_eq!(error.to_string(), "broken");
    }

    #[test]
    fn clones_share_identity() {
        let reactor = PlainReactor::new(|| {});
        let clone = reactor.clone();

        assert_eq!(reactor.id(), clone.id());
        assert_eq!(Reactor::from(&reactor).key(), Reactor::from(clone).key());
    }

    #[test]
    fn distinct_reactors_have_distinct_keys() {
        let a = Reactor::from(PlainReactor::new(|| {}));
        let b = Reactor::from(PlainReactor::new(|| {}));

        assert_ne!(a.key(), b.key());
    }
}
