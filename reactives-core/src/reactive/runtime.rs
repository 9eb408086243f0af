//! Reactive Runtime
//!
//! The runtime applies a [`Config`] to the operations that have policy
//! choices: which failure policy a cascade uses and how nested scopes
//! attribute reads. It holds no graph state of its own; every edge lives in
//! the controllers.
//!
//! The free-standing entry points (`ReactorController::trigger`,
//! `Scope::collect`, `autowire::collect_into`) behave like a runtime built
//! from `Config::default()`.

use super::controller::Reactive;
use super::scope::{Scope, UsedSet};
use crate::config::Config;
use crate::error::Result;
use crate::graph::{autowire, Cascade, TriggerOrigin};

/// Applies a configuration to trigger and collect calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct Runtime {
    config: Config,
}

impl Runtime {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Build a runtime from a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        Config::from_json(json).map(Self::new)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Trigger a reactive with the configured failure policy.
    pub fn trigger<R: Reactive + ?Sized>(&self, reactive: &R) -> Result<()> {
        Cascade::new(self.config.failure_policy).run(reactive.react())
    }

    /// Trigger a reactive for a change it made to itself, skipping its own
    /// `on_trigger` hook.
    pub fn trigger_internal<R: Reactive + ?Sized>(&self, reactive: &R) -> Result<()> {
        Cascade::new(self.config.failure_policy).run_from(reactive.react(), TriggerOrigin::Internal)
    }

    /// Collect the reactives used by `body` with the configured attribution.
    pub fn collect<T>(&self, body: impl FnOnce() -> T) -> (T, UsedSet) {
        Scope::collect_with(self.config.attribution, body)
    }

    /// Run `body` and autowire `dependent` onto what it used.
    pub fn collect_into<D, T>(&self, dependent: &D, body: impl FnOnce() -> T) -> T
    where
        D: Reactive + ?Sized,
    {
        autowire::collect_into_with(dependent, self.config.attribution, body)
    }
}
