//! Reactive Primitives
//!
//! This module implements the building blocks every reactive value is made
//! of: a controller holding the value's reactors, the reactors themselves,
//! and the scopes that record which reactives a computation reads.
//!
//! # Concepts
//!
//! ## Controllers
//!
//! A [`ReactorController`] is owned by exactly one reactive. Anything that
//! owns one implements [`Reactive`]. Triggering the controller calls its
//! reactors, and any reactor that is itself reactive is triggered in turn.
//!
//! ## Reactors
//!
//! A [`Reactor`] is either a plain zero-argument callable or another
//! reactive. Reactors are deduplicated by identity, never by value.
//!
//! ## Scopes
//!
//! A [`Scope`] records the reactives used while it is open. Adapters call
//! [`Scope::register_use`] on every read; a computation run inside
//! [`Scope::collect`] gets back the set of reactives it read.

mod controller;
mod id;
mod reactor;
mod runtime;
mod scope;

pub use controller::{Reactive, ReactorController, WeakController};
pub use id::{ControllerId, ReactorId};
pub use reactor::{PlainReactor, Reactor, ReactorKey};
pub use runtime::Runtime;
pub use scope::{with_task_scopes, Scope, UsedSet};
