// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret data access

use crate::client::get_with_retry;
use crate::error::Result;
use crate::retry::RetryPolicy;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use std::collections::BTreeMap;

/// Data of a Kubernetes secret as raw bytes per key
pub async fn get_secret_data(
    client: &Client,
    name: &str,
    namespace: &str,
) -> Result<BTreeMap<String, Vec<u8>>> {
    let api: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let secret = get_with_retry(&api, &RetryPolicy::default(), name).await?;
    Ok(secret
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, value.0))
        .collect())
}

/// A single key of a Kubernetes secret, `None` if the key does not exist
pub async fn get_secret_data_key(
    client: &Client,
    name: &str,
    namespace: &str,
    key: &str,
) -> Result<Option<Vec<u8>>> {
    let mut data = get_secret_data(client, name, namespace).await?;
    Ok(data.remove(key))
}
