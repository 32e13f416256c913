// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Connection details exposed by claims, composites and composed resources
//! through their write-connection-secret references.

use crate::crossplane::composed::{get_composed_from_claim, get_composed_from_composite};
use crate::crossplane::reference::connection_secret_ref;
use crate::dynamic::{get_dynamic, gvk_of};
use crate::error::Result;
use crate::resources::secret::get_secret_data;
use crate::retry::{retry, RetryPolicy};
use kube::api::DynamicObject;
use kube::core::GroupVersionKind;
use kube::{Client, ResourceExt};
use std::collections::BTreeMap;

/// Secret data keyed by connection detail name
pub type ConnectionDetails = BTreeMap<String, Vec<u8>>;

/// Connection details of a claim. `None` if the claim has no secret
/// reference or the secret does not exist. The claim's secret lives in the
/// claim namespace.
pub async fn from_claim(
    client: &Client,
    claim: &DynamicObject,
) -> Result<Option<ConnectionDetails>> {
    let Some(secret_ref) = connection_secret_ref(claim) else {
        return Ok(None);
    };
    let namespace = claim.namespace().unwrap_or_default();
    get_connection_details(client, &secret_ref.name, &namespace).await
}

/// Connection details of a composite resource; the secret reference carries
/// its own namespace.
pub async fn from_composite(
    client: &Client,
    composite: &DynamicObject,
) -> Result<Option<ConnectionDetails>> {
    from_referenced_secret(client, composite).await
}

/// Connection details of a composed resource; the secret reference carries
/// its own namespace.
pub async fn from_composed(
    client: &Client,
    composed: &DynamicObject,
) -> Result<Option<ConnectionDetails>> {
    from_referenced_secret(client, composed).await
}

async fn from_referenced_secret(
    client: &Client,
    object: &DynamicObject,
) -> Result<Option<ConnectionDetails>> {
    let Some(secret_ref) = connection_secret_ref(object) else {
        return Ok(None);
    };
    let namespace = secret_ref.namespace.unwrap_or_default();
    get_connection_details(client, &secret_ref.name, &namespace).await
}

async fn get_connection_details(
    client: &Client,
    name: &str,
    namespace: &str,
) -> Result<Option<ConnectionDetails>> {
    match get_secret_data(client, name, namespace).await {
        Ok(data) => Ok(Some(data)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

/// Connection details of a claim that is re-fetched from the cluster first.
/// Use [`from_claim`] when the object in hand already carries its secret
/// reference.
pub async fn from_claim_object(
    client: &Client,
    policy: &RetryPolicy,
    claim: &DynamicObject,
) -> Result<Option<ConnectionDetails>> {
    let fresh = refetch(client, policy, claim).await?;
    from_claim(client, &fresh).await
}

/// Connection details of a composite that is re-fetched from the cluster
/// first.
pub async fn from_composite_object(
    client: &Client,
    policy: &RetryPolicy,
    composite: &DynamicObject,
) -> Result<Option<ConnectionDetails>> {
    let fresh = refetch(client, policy, composite).await?;
    from_composite(client, &fresh).await
}

/// Connection details of a composed resource that is re-fetched from the
/// cluster first.
pub async fn from_composed_object(
    client: &Client,
    policy: &RetryPolicy,
    composed: &DynamicObject,
) -> Result<Option<ConnectionDetails>> {
    let fresh = refetch(client, policy, composed).await?;
    from_composed(client, &fresh).await
}

async fn refetch(
    client: &Client,
    policy: &RetryPolicy,
    object: &DynamicObject,
) -> Result<DynamicObject> {
    let gvk = gvk_of(object)?;
    let name = object.name_any();
    get_dynamic(client, policy, &gvk, &name, object.namespace().as_deref()).await
}

/// Connection details of the composed resource identified by its claim and
/// composition resource name. The whole lookup is retried.
pub async fn from_composed_by_claim(
    client: &Client,
    policy: &RetryPolicy,
    claim: &DynamicObject,
    resource_name: &str,
    resource_gvk: &GroupVersionKind,
) -> Result<Option<ConnectionDetails>> {
    let composed = retry(policy, || {
        let client = client.clone();
        let claim = claim.clone();
        let resource_name = resource_name.to_string();
        let resource_gvk = resource_gvk.clone();
        async move { get_composed_from_claim(&client, &claim, &resource_name, &resource_gvk).await }
    })
    .await?;
    from_composed(client, &composed).await
}

/// Connection details of the composed resource identified by its composite
/// and composition resource name. The whole lookup is retried.
pub async fn from_composed_by_composite(
    client: &Client,
    policy: &RetryPolicy,
    composite: &DynamicObject,
    resource_name: &str,
    resource_gvk: &GroupVersionKind,
) -> Result<Option<ConnectionDetails>> {
    let composed = retry(policy, || {
        let client = client.clone();
        let composite = composite.clone();
        let resource_name = resource_name.to_string();
        let resource_gvk = resource_gvk.clone();
        async move {
            get_composed_from_composite(&client, &composite, &resource_name, &resource_gvk).await
        }
    })
    .await?;
    from_composed(client, &composed).await
}
