//! Test helpers for code built on the reactive core.
//!
//! Adapters need the same handful of assertions over and over: "this
//! reactive fired exactly once", "this read was tracked". These helpers
//! register a counting reactor or open a scope and panic with a readable
//! message when the expectation does not hold.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::BoxError;
use crate::reactive::{PlainReactor, Reactive, ReactorController, Scope};

/// How many times a reactor is expected to be called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedCalls {
    Exactly(usize),
    Between { min: Option<usize>, max: Option<usize> },
}

impl ExpectedCalls {
    pub fn never() -> Self {
        Self::Exactly(0)
    }

    pub fn once() -> Self {
        Self::Exactly(1)
    }

    pub fn at_least(min: usize) -> Self {
        Self::Between {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: usize) -> Self {
        Self::Between {
            min: None,
            max: Some(max),
        }
    }

    pub fn between(min: usize, max: usize) -> Self {
        Self::Between {
            min: Some(min),
            max: Some(max),
        }
    }

    fn max(&self) -> Option<usize> {
        match *self {
            Self::Exactly(count) => Some(count),
            Self::Between { max, .. } => max,
        }
    }

    /// Check an actual call count against the expectation.
    pub fn matches(&self, actual: usize) -> bool {
        match *self {
            Self::Exactly(count) => actual == count,
            Self::Between { min, max } => {
                min.map_or(true, |min| actual >= min) && max.map_or(true, |max| actual <= max)
            }
        }
    }
}

impl From<usize> for ExpectedCalls {
    fn from(count: usize) -> Self {
        Self::Exactly(count)
    }
}

impl fmt::Display for ExpectedCalls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Exactly(0) => write!(f, "never called"),
            Self::Exactly(1) => write!(f, "called exactly once"),
            Self::Exactly(count) => write!(f, "called exactly {count} times"),
            Self::Between { min, max } => match (min, max) {
                (Some(min), Some(max)) => write!(f, "called between {min} and {max} times"),
                (Some(min), None) => write!(f, "called at least {min} time(s)"),
                (None, Some(max)) => write!(f, "called at most {max} time(s)"),
                (None, None) => write!(f, "called any number of times"),
            },
        }
    }
}

/// A reactor that counts its calls.
///
/// Exceeding the expected maximum makes the reactor fail, so the overshoot
/// surfaces from the `trigger()` call that caused it.
#[derive(Clone)]
pub struct CallCounter {
    count: Arc<AtomicUsize>,
    expected: ExpectedCalls,
    reactor: PlainReactor,
}

impl CallCounter {
    pub fn new(expected: impl Into<ExpectedCalls>) -> Self {
        let expected = expected.into();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();

        let reactor = PlainReactor::fallible(move || -> Result<(), BoxError> {
            let actual = count_clone.fetch_add(1, Ordering::SeqCst) + 1;
            match expected.max() {
                Some(max) if actual > max => {
                    Err(format!("reactor was expected to be {expected}, but was called {actual} time(s)").into())
                }
                _ => Ok(()),
            }
        });

        Self {
            count,
            expected,
            reactor,
        }
    }

    pub fn reactor(&self) -> &PlainReactor {
        &self.reactor
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Panic unless the call count meets the expectation.
    #[track_caller]
    pub fn assert_call_count(&self) {
        let actual = self.count();
        assert!(
            self.expected.matches(actual),
            "Failed asserting that a reactor was {}. Instead, it was called {} time(s).",
            self.expected,
            actual
        );
    }
}

impl fmt::Debug for CallCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallCounter")
            .field("count", &self.count())
            .field("expected", &self.expected)
            .finish()
    }
}

/// A counting reactor registered on a controller.
///
/// The reactor is unregistered when the expectation is verified or dropped.
pub struct CallExpectation {
    controller: ReactorController,
    counter: CallCounter,
}

impl CallExpectation {
    pub fn counter(&self) -> &CallCounter {
        &self.counter
    }

    /// Unregister the reactor and assert its call count.
    #[track_caller]
    pub fn verify(self) {
        self.counter.assert_call_count();
    }
}

impl Drop for CallExpectation {
    fn drop(&mut self) {
        self.controller.unregister(self.counter.reactor());
    }
}

/// Expect `reactive` to be triggered the given number of times.
///
/// ```rust
/// use reactives_core::reactive::ReactorController;
/// use reactives_core::testing::expect_calls;
///
/// let controller = ReactorController::new();
/// let expectation = expect_calls(&controller, 1);
/// controller.trigger().unwrap();
/// expectation.verify();
/// ```
pub fn expect_calls<R: Reactive + ?Sized>(reactive: &R, expected: impl Into<ExpectedCalls>) -> CallExpectation {
    let controller = reactive.react().clone();
    let counter = CallCounter::new(expected);
    controller.register_plain(counter.reactor());
    CallExpectation { controller, counter }
}

/// Run `body` and panic unless every reactive in `expected` was used.
#[track_caller]
pub fn assert_in_scope<T>(expected: &[&dyn Reactive], body: impl FnOnce() -> T) -> T {
    let (value, used) = Scope::collect(body);
    for reactive in expected {
        assert!(
            used.contains(*reactive),
            "Failed asserting that {} was added to the scope. Used: {:?}",
            reactive.react().id(),
            used.ids()
        );
    }
    value
}

/// Run `body` and panic if it used any reactive.
#[track_caller]
pub fn assert_scope_empty<T>(body: impl FnOnce() -> T) -> T {
    let (value, used) = Scope::collect(body);
    assert!(
        used.is_empty(),
        "Failed asserting that the scope is empty. Instead it is: {:?}",
        used.ids()
    );
    value
}
