// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Server-side apply step

use crate::dynamic::{dynamic_api, gvk_of, resolve_gvk};
use crate::error::Result;
use crate::retry::{retry, RetryPolicy};
use crate::steps::{Step, StepContext};
use async_trait::async_trait;
use kube::api::{DynamicObject, Patch, PatchParams};
use kube::discovery::Scope;
use kube::ResourceExt;
use tracing::info;

/// Mutation hook applied to the object right before it is sent
pub type Mutator = Box<dyn Fn(&mut DynamicObject) + Send + Sync>;

/// Apply an object with server-side apply, owned by the running test.
///
/// Stale apply metadata (managed fields, resource version, generation) is
/// stripped and namespaced objects without a namespace land in the test
/// namespace.
pub struct ApplyObject {
    name: String,
    object: DynamicObject,
    mutate: Option<Mutator>,
    retry: RetryPolicy,
}

impl ApplyObject {
    pub fn new(object: DynamicObject) -> Self {
        ApplyObject {
            name: format!("apply/{}", object.name_any()),
            object,
            mutate: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Modify the object right before applying it
    pub fn with_mutator(
        mut self,
        mutate: impl Fn(&mut DynamicObject) + Send + Sync + 'static,
    ) -> Self {
        self.mutate = Some(Box::new(mutate));
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl Step for ApplyObject {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &StepContext) -> Result<()> {
        let mut object = self.object.clone();

        // Server-side apply rejects requests carrying these
        object.metadata.managed_fields = None;
        object.metadata.resource_version = None;
        object.metadata.generation = None;

        let gvk = gvk_of(&object)?;
        let (ar, caps) = resolve_gvk(&ctx.client, &gvk).await?;
        if matches!(caps.scope, Scope::Namespaced) && object.namespace().is_none() {
            object.metadata.namespace = Some(ctx.namespace.clone());
        }
        if let Some(mutate) = &self.mutate {
            mutate(&mut object);
        }

        let api = dynamic_api(&ctx.client, ar, &caps, object.namespace().as_deref());
        let name = object.name_any();
        let params = PatchParams::apply(&ctx.field_owner()).force();

        retry(&self.retry, || {
            let api = api.clone();
            let name = name.clone();
            let params = params.clone();
            let object = object.clone();
            async move {
                api.patch(&name, &params, &Patch::Apply(&object))
                    .await
                    .map_err(Into::into)
            }
        })
        .await?;

        info!("Applied {} \"{}\"", gvk.kind, name);
        Ok(())
    }
}
