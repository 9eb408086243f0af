//! Error types for the reactive core.
//!
//! Registration problems are reported when the reactor is registered.
//! Reactor failures are reported by the `trigger()` call whose cascade
//! invoked the failing reactor.

use crate::reactive::{ControllerId, ReactorId};

/// Boxed error returned by fallible reactors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A single reactor that failed during a cascade.
#[derive(Debug, thiserror::Error)]
#[error("reactor {reactor} failed: {source}")]
pub struct ReactorFailure {
    /// The reactor that returned the error.
    pub reactor: ReactorId,
    /// The error it returned.
    #[source]
    pub source: BoxError,
}

/// Errors produced by the reactive core.
#[derive(Debug, thiserror::Error)]
pub enum ReactiveError {
    /// A controller was registered as a reactor on itself.
    #[error("controller {controller} cannot be registered as its own reactor")]
    SelfReaction { controller: ControllerId },

    /// A reactor failed and the cascade was aborted.
    #[error(transparent)]
    Reactor(#[from] ReactorFailure),

    /// One or more reactors failed; every reachable reactor was attempted.
    #[error("{} reactor(s) failed during the cascade", .0.len())]
    Aggregate(Vec<ReactorFailure>),

    /// The configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl ReactiveError {
    /// Iterate over the reactor failures carried by this error, if any.
    pub fn failures(&self) -> impl Iterator<Item = &ReactorFailure> {
        let failures: &[ReactorFailure] = match self {
            Self::Reactor(failure) => std::slice::from_ref(failure),
            Self::Aggregate(failures) => failures,
            _ => &[],
        };
        failures.iter()
    }
}

pub type Result<T> = std::result::Result<T, ReactiveError>;
