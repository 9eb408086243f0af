//! Graph Edges
//!
//! An edge is an entry in a dependency's reactor set. It points at the
//! dependent, either strongly or weakly.

use crate::reactive::{PlainReactor, Reactor, ReactorController, ReactorKey, WeakController};

/// How an edge refers to its dependent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeStrength {
    /// The edge keeps the dependent alive until it is unregistered.
    Strong,
    /// The edge is a lookup-only back-reference, dropped once the dependent is gone.
    Weak,
}

/// An entry in a controller's reactor set.
#[derive(Debug, Clone)]
pub(crate) enum Edge {
    /// A plain callable. Always held strongly.
    Plain(PlainReactor),

    /// A manually registered reactive dependent.
    Strong(ReactorController),

    /// An autowired reactive dependent.
    Weak(WeakController),
}

impl Edge {
    pub(crate) fn key(&self) -> ReactorKey {
        match self {
            Self::Plain(reactor) => ReactorKey::Plain(reactor.id()),
            Self::Strong(controller) => ReactorKey::Reactive(controller.id()),
            Self::Weak(controller) => ReactorKey::Reactive(controller.id()),
        }
    }

    pub(crate) fn strength(&self) -> EdgeStrength {
        match self {
            Self::Plain(_) | Self::Strong(_) => EdgeStrength::Strong,
            Self::Weak(_) => EdgeStrength::Weak,
        }
    }

    /// Resolve the edge to a reactor.
    ///
    /// Returns `None` for a weak edge whose dependent no longer exists.
    pub(crate) fn resolve(&self) -> Option<Reactor> {
        match self {
            Self::Plain(reactor) => Some(Reactor::Plain(reactor.clone())),
            Self::Strong(controller) => Some(Reactor::Reactive(controller.clone())),
            Self::Weak(controller) => controller.upgrade().map(Reactor::Reactive),
        }
    }
}

impl From<Reactor> for Edge {
    fn from(reactor: Reactor) -> Self {
        match reactor {
            Reactor::Plain(reactor) => Self::Plain(reactor),
            Reactor::Reactive(controller) => Self::Strong(controller),
        }
    }
}
