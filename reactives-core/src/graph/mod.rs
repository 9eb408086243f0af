//! Trigger Graph
//!
//! Controllers and their reactors form a directed graph: an edge runs from a
//! reactive to each reactor registered on it. This module walks that graph
//! when a reactive is triggered and manages the autowired edges.
//!
//! # Overview
//!
//! - [`Cascade`] visits every controller reachable from the triggered one in
//!   breadth-first order, calling each reachable plain reactor once.
//! - [`autowire`] adds and removes the weak edges created by container
//!   membership and by observed reads.
//! - [`suspend`] turns triggering into a no-op for the current thread while
//!   its guard is alive.
//!
//! Edges to reactive reactors are either strong or weak. Manual
//! registrations are strong; autowired ones are weak and disappear once the
//! dependent is dropped.

pub mod autowire;
mod cascade;
mod edge;
mod suspend;

pub use cascade::{Cascade, TriggerOrigin};
pub(crate) use edge::Edge;
pub use edge::EdgeStrength;
pub use suspend::{is_suspended, suspend, SuspendGuard};
