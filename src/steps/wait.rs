// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Waiting steps: claim readiness and generic conditions

use crate::crossplane::tree::{collect_resource_tree, render_yaml};
use crate::error::{Result, TestkitError};
use crate::steps::{Step, StepContext, WaitOptions};
use crate::wait::{optional_timeout, poll_until, WaitParams};
use async_trait::async_trait;
use kube::api::DynamicObject;
use kube::{Client, ResourceExt};
use std::time::Duration;
use tracing::warn;

/// Wait until the claim, its composite and all composed resources have the
/// conditions Synced and Ready.
///
/// On timeout the resource tree is collected once more and the YAML of every
/// object that is still unready is attached to the error.
pub struct WaitForClaimReady {
    name: String,
    claim: DynamicObject,
    timeout: Duration,
    opts: WaitOptions,
}

impl WaitForClaimReady {
    pub fn new(claim: DynamicObject, timeout: Duration) -> Self {
        WaitForClaimReady {
            name: format!("wait-ready/{}", claim.name_any()),
            claim,
            timeout,
            opts: WaitOptions::default(),
        }
    }

    pub fn with_options(mut self, opts: WaitOptions) -> Self {
        self.opts = opts;
        self
    }
}

async fn tree_ready(client: &Client, claim: &DynamicObject, opts: &WaitOptions) -> Result<bool> {
    let tree = collect_resource_tree(client, &opts.retry, claim).await?;
    Ok(tree.is_synced_and_ready(&opts.exceptions, &opts.ignored_resource_names))
}

#[async_trait]
impl Step for WaitForClaimReady {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &StepContext) -> Result<()> {
        let params = WaitParams::new(self.opts.interval, optional_timeout(self.timeout));
        let result = poll_until(&params, || tree_ready(&ctx.client, &self.claim, &self.opts)).await;

        let Err(err) = result else {
            return Ok(());
        };

        // Best effort: attach the YAML of everything that is still unready
        match collect_resource_tree(&ctx.client, &self.opts.retry, &self.claim).await {
            Ok(tree) => {
                let unready =
                    tree.unready_objects(&self.opts.exceptions, &self.opts.ignored_resource_names);
                Err(TestkitError::Failure(format!(
                    "failed waiting for resources to become ready: {}\nunready resources:\n{}",
                    err,
                    render_yaml(&unready)
                )))
            }
            Err(tree_err) => {
                warn!("Cannot collect unready resources: {}", tree_err);
                Err(err)
            }
        }
    }
}

/// A caller-supplied wait condition evaluated against the step context
#[async_trait]
pub trait WaitCondition: Send + Sync {
    async fn check(&self, ctx: &StepContext) -> Result<bool>;
}

/// Generic polling step around a [`WaitCondition`]
pub struct WaitFor {
    name: String,
    condition: Box<dyn WaitCondition>,
    timeout: Duration,
    interval: Duration,
}

impl WaitFor {
    pub fn new(
        name: impl Into<String>,
        condition: impl WaitCondition + 'static,
        timeout: Duration,
    ) -> Self {
        let name: String = name.into();
        WaitFor {
            name: format!("wait-for/{}", name),
            condition: Box::new(condition),
            timeout,
            interval: WaitOptions::default().interval,
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[async_trait]
impl Step for WaitFor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &StepContext) -> Result<()> {
        let params = WaitParams::new(self.interval, optional_timeout(self.timeout));
        poll_until(&params, || self.condition.check(ctx)).await
    }
}
