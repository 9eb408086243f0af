//! Identity types for controllers and reactors.
//!
//! Cascades deduplicate by identity, never by value. Every controller and
//! every plain reactor gets a process-unique ID from an atomic counter when it
//! is created; clones share the ID of the original.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a [`ReactorController`](super::ReactorController).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(u64);

impl ControllerId {
    /// Generate a new unique controller ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ControllerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "controller#{}", self.0)
    }
}

/// Unique identifier for a [`PlainReactor`](super::PlainReactor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReactorId(u64);

impl ReactorId {
    /// Generate a new unique reactor ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ReactorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReactorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reactor#{}", self.0)
    }
}
