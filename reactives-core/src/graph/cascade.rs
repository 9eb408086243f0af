//! Trigger Cascade
//!
//! A cascade is one call to `trigger()`: it walks every controller reachable
//! from the root and calls every reachable plain reactor exactly once.
//!
//! # Algorithm
//!
//! Breadth-first over a single FIFO queue seeded with the root controller:
//!
//! 1. Pop a node.
//! 2. A plain reactor is a leaf. Call it unless it was already called in this
//!    cascade.
//! 3. A controller is expanded unless it was already visited: mark it
//!    visited and triggered, call its `on_trigger` hook, snapshot its reactor
//!    set and append the snapshot to the queue in registration order.
//! 4. Stop when the queue is empty.
//!
//! Every node is processed in discovery order, so the firing order is fully
//! determined by the graph and the order its edges were registered in. With
//! `parent -> [child, f]` and `child -> [g]`, `f` fires before `g`.
//!
//! Controllers are marked visited before their reactors are enqueued, so
//! cycles terminate: the visited set grows on every expansion and the graph
//! is finite.
//!
//! A reactor that triggers another reactive starts a new cascade with its own
//! visited sets. Nested cascades are never merged into the outer one.
//!
//! A [`TriggerOrigin::Internal`] cascade skips the root's `on_trigger` hook.
//! Adapters use it to announce a change they made to their own state without
//! invalidating that state. Hooks of every other reached controller still run.

use std::collections::{HashSet, VecDeque};

use super::suspend;
use crate::config::FailurePolicy;
use crate::error::{ReactiveError, ReactorFailure, Result};
use crate::reactive::{ControllerId, PlainReactor, Reactor, ReactorController, ReactorId};

/// Who caused a cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TriggerOrigin {
    /// Something outside the reactive changed it. The root's hook runs.
    #[default]
    External,
    /// The reactive changed itself. The root's hook is skipped.
    Internal,
}

/// State of a single trigger call.
pub struct Cascade {
    policy: FailurePolicy,

    /// Controllers already expanded.
    visited: HashSet<ControllerId>,

    /// Plain reactors already called.
    invoked: HashSet<ReactorId>,

    queue: VecDeque<Reactor>,

    /// Failures collected under [`FailurePolicy::Collect`].
    failures: Vec<ReactorFailure>,
}

impl Cascade {
    /// Create an empty cascade.
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            visited: HashSet::new(),
            invoked: HashSet::new(),
            queue: VecDeque::new(),
            failures: Vec::new(),
        }
    }

    /// Run the cascade rooted at `root`.
    ///
    /// Does nothing while triggering is suspended on this thread.
    pub fn run(self, root: &ReactorController) -> Result<()> {
        self.run_from(root, TriggerOrigin::External)
    }

    /// Run the cascade rooted at `root`, skipping the root's hook when the
    /// origin is internal.
    pub fn run_from(mut self, root: &ReactorController, origin: TriggerOrigin) -> Result<()> {
        if suspend::is_suspended() {
            tracing::trace!(root = %root.id(), "Trigger suspended");
            return Ok(());
        }

        tracing::trace!(root = %root.id(), policy = ?self.policy, ?origin, "Cascade started");

        self.expand(root, origin == TriggerOrigin::External)?;
        while let Some(node) = self.queue.pop_front() {
            match node {
                Reactor::Reactive(controller) => self.expand(&controller, true)?,
                Reactor::Plain(reactor) => self.invoke(&reactor)?,
            }
        }

        tracing::trace!(
            root = %root.id(),
            controllers = self.visited.len(),
            reactors = self.invoked.len(),
            "Cascade finished"
        );

        if self.failures.is_empty() {
            Ok(())
        } else {
            tracing::warn!(
                root = %root.id(),
                failed = self.failures.len(),
                "Reactors failed during cascade"
            );
            Err(ReactiveError::Aggregate(self.failures))
        }
    }

    fn expand(&mut self, controller: &ReactorController, run_hook: bool) -> Result<()> {
        if !self.visited.insert(controller.id()) {
            return Ok(());
        }

        controller.mark_triggered();
        if let Some(hook) = controller.on_trigger().filter(|_| run_hook) {
            self.invoke(hook)?;
        }

        self.queue.extend(controller.snapshot());
        Ok(())
    }

    fn invoke(&mut self, reactor: &PlainReactor) -> Result<()> {
        if !self.invoked.insert(reactor.id()) {
            return Ok(());
        }

        if let Err(source) = reactor.call() {
            let failure = ReactorFailure {
                reactor: reactor.id(),
                source,
            };
            match self.policy {
                FailurePolicy::FailFast => return Err(failure.into()),
                FailurePolicy::Collect => self.failures.push(failure),
            }
        }
        Ok(())
    }
}
