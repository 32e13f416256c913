// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Dynamic (GVK-driven) object access via API discovery.

use crate::error::{Result, TestkitError};
use crate::retry::{retry, RetryPolicy};
use kube::api::{Api, ApiResource, DynamicObject};
use kube::core::GroupVersionKind;
use kube::discovery::{self, ApiCapabilities, Scope};
use kube::{Client, ResourceExt};

/// Group/version/kind of a dynamic object, taken from its type metadata
pub fn gvk_of(object: &DynamicObject) -> Result<GroupVersionKind> {
    let types = object.types.as_ref().ok_or_else(|| {
        TestkitError::InvalidObject(format!(
            "object \"{}\" has no apiVersion/kind",
            object.name_any()
        ))
    })?;
    Ok(parse_gvk(&types.api_version, &types.kind))
}

/// Split an `apiVersion` string into a GVK. Core-group objects carry only the
/// version.
pub fn parse_gvk(api_version: &str, kind: &str) -> GroupVersionKind {
    match api_version.split_once('/') {
        Some((group, version)) => GroupVersionKind::gvk(group, version, kind),
        None => GroupVersionKind::gvk("", api_version, kind),
    }
}

/// Resolve the API resource (plural name) and capabilities (scope) for a GVK
/// from the cluster's discovery endpoints.
pub async fn resolve_gvk(
    client: &Client,
    gvk: &GroupVersionKind,
) -> Result<(ApiResource, ApiCapabilities)> {
    Ok(discovery::pinned_kind(client, gvk).await?)
}

/// Build a dynamic API for the discovered resource. Cluster-scoped kinds
/// ignore the namespace; namespaced kinds without one use the client default.
pub fn dynamic_api(
    client: &Client,
    ar: ApiResource,
    caps: &ApiCapabilities,
    namespace: Option<&str>,
) -> Api<DynamicObject> {
    if matches!(caps.scope, Scope::Cluster) {
        Api::all_with(client.clone(), &ar)
    } else {
        match namespace {
            Some(namespace) => Api::namespaced_with(client.clone(), namespace, &ar),
            None => Api::default_namespaced_with(client.clone(), &ar),
        }
    }
}

/// Fetch an arbitrary object by GVK and name with bounded retry.
pub async fn get_dynamic(
    client: &Client,
    policy: &RetryPolicy,
    gvk: &GroupVersionKind,
    name: &str,
    namespace: Option<&str>,
) -> Result<DynamicObject> {
    let (ar, caps) = resolve_gvk(client, gvk).await?;
    let api = dynamic_api(client, ar, &caps, namespace);
    retry(policy, || {
        let api = api.clone();
        let name = name.to_string();
        async move { api.get(&name).await.map_err(Into::into) }
    })
    .await
}
