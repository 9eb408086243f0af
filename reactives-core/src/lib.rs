//! Reactives Core
//!
//! This crate provides the core of a reactive programming toolkit: values
//! that announce their own changes to whatever reacts to them.
//!
//! It implements:
//!
//! - Reactor controllers and identity-keyed reactor sets
//! - Breadth-first trigger propagation with cycle protection
//! - Scopes that record which reactives a computation reads
//! - Weak autowiring of containers and computations onto their dependencies
//!
//! Concrete reactive types (lists, maps, properties, computed values) are
//! built on top by owning a [`ReactorController`](reactive::ReactorController)
//! and implementing [`Reactive`](reactive::Reactive).
//!
//! # Architecture
//!
//! - `reactive`: controllers, reactors, scopes and the configured runtime
//! - `graph`: trigger cascades, edge strengths and autowiring
//! - `config`: failure policy and scope attribution settings
//! - `error`: the crate error type
//! - `testing`: call-count and scope assertions for downstream tests
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! use reactives_core::graph::autowire;
//! use reactives_core::reactive::{PlainReactor, ReactorController, Scope};
//!
//! let source = ReactorController::new();
//! let computed = ReactorController::new();
//!
//! // The computed value reads the source, so it is wired onto it.
//! autowire::collect_into(&computed, || Scope::register_use(&source));
//!
//! let runs = Arc::new(AtomicUsize::new(0));
//! let runs_clone = runs.clone();
//! computed
//!     .register(PlainReactor::new(move || {
//!         runs_clone.fetch_add(1, Ordering::SeqCst);
//!     }))
//!     .unwrap();
//!
//! source.trigger().unwrap();
//! assert_eq!(runs.load(Ordering::SeqCst), 1);
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod reactive;
pub mod testing;

pub use config::{Attribution, Config, FailurePolicy};
pub use error::{ReactiveError, ReactorFailure, Result};
pub use reactive::{PlainReactor, Reactive, Reactor, ReactorController, Scope};
