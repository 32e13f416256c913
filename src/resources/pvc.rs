// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! PersistentVolumeClaim phase and volume modification checks

use crate::client::get_with_retry;
use crate::error::Result;
use crate::retry::{retry, RetryPolicy};
use k8s_openapi::api::core::v1::{Event, PersistentVolumeClaim};
use kube::api::ListParams;
use kube::{Api, Client};

/// Check if the PVC has the given phase (e.g. "Bound")
pub async fn is_pvc_phase(
    client: &Client,
    phase: &str,
    name: &str,
    namespace: &str,
) -> Result<bool> {
    let api: Api<PersistentVolumeClaim> = Api::namespaced(client.clone(), namespace);
    let pvc = get_with_retry(&api, &RetryPolicy::default(), name).await?;
    Ok(pvc
        .status
        .and_then(|s| s.phase)
        .is_some_and(|p| p == phase))
}

/// Scan the PVC's events for a successful volume modification performed by
/// the volume modifier controller.
pub async fn is_volume_modification_successful(
    client: &Client,
    name: &str,
    namespace: &str,
) -> Result<bool> {
    let api: Api<Event> = Api::namespaced(client.clone(), namespace);
    let field_selector = format!("involvedObject.name={}", name);

    let list = retry(&RetryPolicy::default(), || {
        let api = api.clone();
        let field_selector = field_selector.clone();
        async move {
            api.list(&ListParams::default().fields(&field_selector))
                .await
                .map_err(Into::into)
        }
    })
    .await?;

    Ok(list
        .items
        .iter()
        .any(|event| event.reason.as_deref() == Some("VolumeModificationSuccessful")))
}
