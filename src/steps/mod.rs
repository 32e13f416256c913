// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test steps composed into features.
//!
//! A step is one action of an e2e test: apply an object, wait for a claim,
//! delete it, run a command. A failing step is recorded and the remaining
//! steps still run, so a single feature run reports everything that broke.

pub mod apply;
pub mod delete;
pub mod exec;
pub mod wait;

pub use apply::ApplyObject;
pub use delete::{DeleteClaim, DeleteClaims};
pub use exec::ExecInPod;
pub use wait::{WaitCondition, WaitFor, WaitForClaimReady};

use crate::constants::{defaults, FIELD_OWNER_PREFIX};
use crate::crossplane::conditions::{ConditionExceptions, GroupKind};
use crate::error::Result;
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use kube::Client;
use std::time::Duration;
use tracing::{error, info};

/// Per-test configuration handed to every step
#[derive(Clone)]
pub struct StepContext {
    pub client: Client,
    /// Namespace applied to namespaced objects that do not carry one
    pub namespace: String,
    /// Name of the running test, used as the server-side apply field owner
    pub test_name: String,
}

impl StepContext {
    pub fn new(client: Client, namespace: impl Into<String>, test_name: impl Into<String>) -> Self {
        StepContext {
            client,
            namespace: namespace.into(),
            test_name: test_name.into(),
        }
    }

    pub fn field_owner(&self) -> String {
        format!("{}/{}", FIELD_OWNER_PREFIX, self.test_name)
    }
}

/// A single test step
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self, ctx: &StepContext) -> Result<()>;
}

/// Options shared by the waiting steps
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Interval between condition checks
    pub interval: Duration,
    /// Composed resources considered ready regardless of their conditions,
    /// matched by composition resource name
    pub ignored_resource_names: Vec<String>,
    /// Group-kinds without Synced/Ready conditions
    pub exceptions: ConditionExceptions,
    /// Retry policy for the fetches performed while waiting
    pub retry: RetryPolicy,
}

impl Default for WaitOptions {
    fn default() -> Self {
        WaitOptions {
            interval: defaults::POLL_INTERVAL,
            ignored_resource_names: Vec::new(),
            exceptions: ConditionExceptions::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl WaitOptions {
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Skip readiness checks for the composed resource with this
    /// composition resource name
    pub fn ignore_composed_resource_name(mut self, name: impl Into<String>) -> Self {
        self.ignored_resource_names.push(name.into());
        self
    }

    /// Treat the given group-kind as always ready
    pub fn register_kind_without_conditions(mut self, kind: GroupKind) -> Self {
        self.exceptions.register(kind);
        self
    }
}

/// Failure of a single step within a feature run
#[derive(Debug, Clone)]
pub struct StepFailure {
    pub step: String,
    pub message: String,
}

/// Outcome of running all steps of a feature
#[derive(Debug, Clone)]
pub struct FeatureReport {
    pub feature: String,
    pub failures: Vec<StepFailure>,
}

impl FeatureReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// An ordered sequence of steps executed against one cluster
pub struct Feature {
    name: String,
    steps: Vec<Box<dyn Step>>,
}

impl Feature {
    pub fn new(name: impl Into<String>) -> Self {
        Feature {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Run all steps in order. Step failures are collected, not fatal.
    pub async fn run(&self, ctx: &StepContext) -> FeatureReport {
        let mut failures = Vec::new();
        for step in &self.steps {
            info!("Running step {} of feature {}", step.name(), self.name);
            if let Err(err) = step.run(ctx).await {
                error!("Step {} failed: {}", step.name(), err);
                failures.push(StepFailure {
                    step: step.name().to_string(),
                    message: err.to_string(),
                });
            }
        }
        FeatureReport {
            feature: self.name.clone(),
            failures,
        }
    }
}
