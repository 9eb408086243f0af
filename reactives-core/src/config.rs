//! Runtime configuration.
//!
//! A [`Config`] selects how cascades treat failing reactors and how reads are
//! attributed to nested scopes. It is plain data: load it from JSON with
//! [`Config::from_json`] or build it in code, then hand it to a
//! [`Runtime`](crate::reactive::Runtime).

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What a cascade does when a reactor returns an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the cascade at the first failure and return it.
    ///
    /// Reactors that already ran stay run; reactors not yet reached are
    /// skipped.
    #[default]
    FailFast,

    /// Attempt every reachable reactor, then return all failures together.
    Collect,
}

/// Which open scopes a read is attributed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribution {
    /// Only the innermost open scope records the read.
    #[default]
    Innermost,

    /// The innermost scope records the read, and when it closes its used set
    /// is merged into the enclosing scope.
    Bubble,
}

/// Configuration for a [`Runtime`](crate::reactive::Runtime).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub failure_policy: FailurePolicy,
    pub attribution: Attribution,
}

impl Config {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.attribution = attribution;
        self
    }
}
