// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Claim → composite → composed resource tree collection and readiness.

use crate::crossplane::conditions::{is_object_synced_and_ready, ConditionExceptions};
use crate::crossplane::reference::{composed_refs, composite_ref, ResourceRef};
use crate::dynamic::{get_dynamic, gvk_of};
use crate::error::Result;
use crate::meta;
use crate::retry::RetryPolicy;
use kube::api::DynamicObject;
use kube::{Client, ResourceExt};
use tracing::instrument;

/// Snapshot of a claim and the resources behind it, as observed in a single
/// collection pass.
///
/// `composite_ref` is kept separately from the fetched `composite`: a claim
/// that references a composite which cannot be fetched yet is distinguishable
/// from a claim without any reference.
#[derive(Debug, Default)]
pub struct ResourceTree {
    pub claim: Option<DynamicObject>,
    pub composite_ref: Option<ResourceRef>,
    pub composite: Option<DynamicObject>,
    pub composed: Vec<DynamicObject>,
}

/// Collect the resource tree for the given claim.
///
/// A missing claim yields an empty tree. A composed resource that is not
/// found is skipped; any other fetch error aborts the collection.
#[instrument(skip(client, policy, claim), fields(claim = %claim.name_any()))]
pub async fn collect_resource_tree(
    client: &Client,
    policy: &RetryPolicy,
    claim: &DynamicObject,
) -> Result<ResourceTree> {
    let mut tree = ResourceTree::default();

    let claim_gvk = gvk_of(claim)?;
    let claim_name = claim.name_any();
    let claim_namespace = claim.namespace();
    let on_cluster = match get_dynamic(
        client,
        policy,
        &claim_gvk,
        &claim_name,
        claim_namespace.as_deref(),
    )
    .await
    {
        Ok(object) => object,
        Err(err) if err.is_not_found() => return Ok(tree),
        Err(err) => return Err(err.context("cannot get claim")),
    };

    tree.composite_ref = composite_ref(&on_cluster);
    tree.claim = Some(on_cluster);

    let Some(composite_ref) = tree.composite_ref.clone() else {
        return Ok(tree);
    };
    match get_dynamic(client, policy, &composite_ref.gvk(), &composite_ref.name, None).await {
        Ok(object) => tree.composite = Some(object),
        // Referenced but not created yet; the tree stays incomplete
        Err(err) if err.is_not_found() => return Ok(tree),
        Err(err) => return Err(err.context("cannot get composite")),
    }

    let refs = tree.composite.as_ref().map(composed_refs).unwrap_or_default();
    for r in refs {
        match get_dynamic(client, policy, &r.gvk(), &r.name, r.namespace.as_deref()).await {
            Ok(object) => tree.composed.push(object),
            Err(err) if err.is_not_found() => continue,
            Err(err) => {
                return Err(err.context(format!("cannot get object {} \"{}\"", r.kind, r.name)))
            }
        }
    }

    Ok(tree)
}

impl ResourceTree {
    /// All objects observed in this tree, claim first
    pub fn objects(&self) -> Vec<&DynamicObject> {
        self.claim
            .iter()
            .chain(self.composite.iter())
            .chain(self.composed.iter())
            .collect()
    }

    /// Check that the claim, its composite (if referenced) and every composed
    /// resource not in `ignored_resource_names` are synced and ready.
    pub fn is_synced_and_ready(
        &self,
        exceptions: &ConditionExceptions,
        ignored_resource_names: &[String],
    ) -> bool {
        let Some(claim) = &self.claim else {
            return false;
        };
        if !is_object_synced_and_ready(claim, exceptions) {
            return false;
        }
        match &self.composite {
            Some(composite) => {
                if !is_object_synced_and_ready(composite, exceptions) {
                    return false;
                }
            }
            // A referenced composite that could not be fetched is not ready
            None if self.composite_ref.is_some() => return false,
            None => {}
        }
        self.composed.iter().all(|object| {
            is_ignored(object, ignored_resource_names)
                || is_object_synced_and_ready(object, exceptions)
        })
    }

    /// Objects of this tree that block readiness, for diagnostics
    pub fn unready_objects(
        &self,
        exceptions: &ConditionExceptions,
        ignored_resource_names: &[String],
    ) -> Vec<&DynamicObject> {
        let mut unready = Vec::new();
        if let Some(claim) = &self.claim {
            if !is_object_synced_and_ready(claim, exceptions) {
                unready.push(claim);
            }
        }
        if let Some(composite) = &self.composite {
            if !is_object_synced_and_ready(composite, exceptions) {
                unready.push(composite);
            }
        }
        unready.extend(self.composed.iter().filter(|object| {
            !is_ignored(object, ignored_resource_names)
                && !is_object_synced_and_ready(object, exceptions)
        }));
        unready
    }
}

fn is_ignored(object: &DynamicObject, ignored_resource_names: &[String]) -> bool {
    meta::composition_resource_name(object)
        .map(|name| ignored_resource_names.iter().any(|i| i == name))
        .unwrap_or(false)
}

/// Render the objects as a `---`-separated YAML document for diagnostics.
/// Objects that fail to serialize are reported inline.
pub fn render_yaml(objects: &[&DynamicObject]) -> String {
    let mut out = String::new();
    for object in objects {
        match serde_yaml::to_string(object) {
            Ok(yaml) => {
                out.push_str("---\n");
                out.push_str(&yaml);
            }
            Err(err) => {
                out.push_str(&format!(
                    "---\nerror: cannot render object \"{}\": {}\n",
                    object.name_any(),
                    err
                ));
            }
        }
    }
    out
}
