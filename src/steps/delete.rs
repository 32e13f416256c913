// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Claim deletion steps with cascading foreground delete

use crate::crossplane::tree::{collect_resource_tree, render_yaml};
use crate::dynamic::{dynamic_api, get_dynamic, gvk_of, resolve_gvk};
use crate::error::{Result, TestkitError};
use crate::retry::RetryPolicy;
use crate::steps::{Step, StepContext, WaitOptions};
use crate::wait::{optional_timeout, poll_until, with_optional_deadline, WaitParams};
use async_trait::async_trait;
use kube::api::{DeleteParams, DynamicObject};
use kube::discovery::Scope;
use kube::{Client, ResourceExt};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, warn};

/// Delete a claim and wait until it is gone.
///
/// Claims cascade, so the claim object is the last one removed after all
/// composed resources are deleted. A zero timeout attaches no deadline to
/// the delete call or the wait.
pub struct DeleteClaim {
    name: String,
    claim: DynamicObject,
    timeout: Duration,
    opts: WaitOptions,
}

impl DeleteClaim {
    pub fn new(claim: DynamicObject, timeout: Duration) -> Self {
        DeleteClaim {
            name: format!("delete/{}", claim.name_any()),
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

#[async_trait]
impl Step for DeleteClaim {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &StepContext) -> Result<()> {
        // Namespaced claims without a namespace are deleted from the test
        // namespace
        let gvk = gvk_of(&self.claim)?;
        let (_, caps) = resolve_gvk(&ctx.client, &gvk).await?;
        let mut claim = self.claim.clone();
        if matches!(caps.scope, Scope::Namespaced) && claim.namespace().is_none() {
            claim.metadata.namespace = Some(ctx.namespace.clone());
        }

        let mut failures = Vec::new();
        if let Some(message) =
            delete_claim_object(&ctx.client, &self.opts.retry, &claim, self.timeout).await
        {
            failures.push(message);
        }

        let params = WaitParams::new(self.opts.interval, optional_timeout(self.timeout));
        if let Err(err) =
            poll_until(&params, || claim_absent(&ctx.client, &self.opts.retry, &claim)).await
        {
            match collect_resource_tree(&ctx.client, &self.opts.retry, &claim).await {
                Ok(tree) => failures.push(format!(
                    "failed waiting for resources to become deleted: {}\nundeleted resources:\n{}",
                    err,
                    render_yaml(&tree.objects())
                )),
                Err(tree_err) => {
                    warn!("Cannot collect undeleted resources: {}", tree_err);
                    failures.push(format!(
                        "failed waiting for resources to become deleted: {}",
                        err
                    ));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(TestkitError::Failure(failures.join("\n")))
        }
    }
}

/// Delete several claims and wait until all of them are gone at the same
/// time. Deletes are issued concurrently, one task per claim, and every
/// failure is reported independently.
pub struct DeleteClaims {
    name: String,
    claims: Vec<DynamicObject>,
    timeout: Duration,
    opts: WaitOptions,
}

impl DeleteClaims {
    pub fn new(claims: Vec<DynamicObject>, timeout: Duration) -> Self {
        DeleteClaims {
            name: format!("delete/{} claims", claims.len()),
            claims,
            timeout,
            opts: WaitOptions::default(),
        }
    }

    pub fn with_options(mut self, opts: WaitOptions) -> Self {
        self.opts = opts;
        self
    }
}

#[async_trait]
impl Step for DeleteClaims {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &StepContext) -> Result<()> {
        let mut tasks = JoinSet::new();
        for claim in &self.claims {
            let client = ctx.client.clone();
            let retry = self.opts.retry;
            let claim = claim.clone();
            let timeout = self.timeout;
            tasks
                .spawn(async move { delete_claim_object(&client, &retry, &claim, timeout).await });
        }

        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(message)) => failures.push(message),
                Ok(None) => {}
                Err(join_err) => failures.push(format!("delete task failed: {}", join_err)),
            }
        }

        let params = WaitParams::new(self.opts.interval, optional_timeout(self.timeout));
        if let Err(err) = poll_until(&params, || {
            all_claims_absent(&ctx.client, &self.opts.retry, &self.claims)
        })
        .await
        {
            failures.push(format!(
                "failed waiting for resources to become deleted: {}",
                err
            ));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(TestkitError::Failure(failures.join("\n")))
        }
    }
}

/// Issue a foreground cascading delete. A failure is reported together with
/// a dump of the resource tree that is still on the cluster, but does not
/// stop the caller from waiting for absence.
async fn delete_claim_object(
    client: &Client,
    retry: &RetryPolicy,
    claim: &DynamicObject,
    timeout: Duration,
) -> Option<String> {
    let deleted = async {
        let gvk = gvk_of(claim)?;
        let (ar, caps) = resolve_gvk(client, &gvk).await?;
        let api = dynamic_api(client, ar, &caps, claim.namespace().as_deref());
        let name = claim.name_any();
        match with_optional_deadline(timeout, api.delete(&name, &DeleteParams::foreground())).await
        {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(TestkitError::from(err)),
            Err(err) => Err(err),
        }
    }
    .await;

    let Err(err) = deleted else {
        return None;
    };
    error!("Failed to delete claim \"{}\": {}", claim.name_any(), err);

    match collect_resource_tree(client, retry, claim).await {
        Ok(tree) => Some(format!(
            "failed to delete resource: {}\nundeleted resources:\n{}",
            err,
            render_yaml(&tree.objects())
        )),
        Err(tree_err) => {
            warn!("Cannot collect undeleted resources: {}", tree_err);
            Some(format!("failed to delete resource: {}", err))
        }
    }
}

/// Absence means the claim get comes back not-found; any other API error
/// aborts the poll.
async fn claim_absent(
    client: &Client,
    policy: &RetryPolicy,
    claim: &DynamicObject,
) -> Result<bool> {
    let gvk = gvk_of(claim)?;
    let name = claim.name_any();
    match get_dynamic(client, policy, &gvk, &name, claim.namespace().as_deref()).await {
        Ok(_) => Ok(false),
        Err(err) if err.is_not_found() => Ok(true),
        Err(err) => Err(err),
    }
}

async fn all_claims_absent(
    client: &Client,
    policy: &RetryPolicy,
    claims: &[DynamicObject],
) -> Result<bool> {
    for claim in claims {
        if !claim_absent(client, policy, claim).await? {
            return Ok(false);
        }
    }
    Ok(true)
}
