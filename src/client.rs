// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes client construction and low-level access helpers.

use crate::constants::defaults;
use crate::crossplane::connection_details::{self, ConnectionDetails};
use crate::error::{Result, TestkitError};
use crate::retry::{retry, RetryPolicy};
use crate::transport::RetryLayer;
use k8s_openapi::api::authentication::v1::SelfSubjectReview;
use kube::api::{Api, DynamicObject, PostParams};
use kube::client::ClientBuilder;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::GroupVersionKind;
use kube::Client;
use serde::de::DeserializeOwned;
use tower::buffer::BufferLayer;
use tracing::instrument;

/// Create a client from raw kubeconfig bytes, e.g. the contents of a
/// connection details secret.
pub async fn client_from_kubeconfig_bytes(bytes: &[u8]) -> Result<Client> {
    let kubeconfig: Kubeconfig = serde_yaml::from_slice(bytes)
        .map_err(|e| TestkitError::KubeconfigError(format!("failed to parse kubeconfig: {}", e)))?;

    let mut config = kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(|e| TestkitError::KubeconfigError(format!("failed to create config: {}", e)))?;
    tune_config(&mut config);

    client_from_config(config)
}

/// Static client configuration: generous per-request timeouts for slow test
/// clusters. Response compression stays off (the gzip feature is not enabled)
/// and kube imposes no client-side rate limit that would need lifting.
pub fn tune_config(config: &mut kube::Config) {
    config.read_timeout = Some(defaults::REQUEST_TIMEOUT);
    config.write_timeout = Some(defaults::REQUEST_TIMEOUT);
}

/// Build a client from the given config with the retrying transport attached.
pub fn client_from_config(config: kube::Config) -> Result<Client> {
    let builder = ClientBuilder::try_from(config)?;
    // The buffer makes the underlying service cloneable for request replay
    Ok(builder
        .with_layer(&BufferLayer::new(1024))
        .with_layer(&RetryLayer::new(RetryPolicy::transport()))
        .build())
}

/// Create a client from a kubeconfig exposed in the connection details secret
/// of a claim.
pub async fn client_from_claim_connection_details(
    kube: &Client,
    claim: &DynamicObject,
    key: &str,
) -> Result<Client> {
    let details = connection_details::from_claim(kube, claim).await?;
    client_from_connection_details(details, key).await
}

/// Create a client from a kubeconfig exposed in the connection details secret
/// of a composite resource.
pub async fn client_from_composite_connection_details(
    kube: &Client,
    composite: &DynamicObject,
    key: &str,
) -> Result<Client> {
    let details = connection_details::from_composite(kube, composite).await?;
    client_from_connection_details(details, key).await
}

/// Create a client from a kubeconfig exposed in the connection details secret
/// of a composed resource, resolved through its claim.
pub async fn client_from_composed_connection_details(
    kube: &Client,
    policy: &RetryPolicy,
    claim: &DynamicObject,
    resource_name: &str,
    resource_gvk: &GroupVersionKind,
    key: &str,
) -> Result<Client> {
    let details =
        connection_details::from_composed_by_claim(kube, policy, claim, resource_name, resource_gvk)
            .await?;
    client_from_connection_details(details, key).await
}

async fn client_from_connection_details(
    details: Option<ConnectionDetails>,
    key: &str,
) -> Result<Client> {
    let bytes = details
        .and_then(|mut d| d.remove(key))
        .ok_or_else(|| TestkitError::MissingConnectionDetailsKey(key.to_string()))?;
    client_from_kubeconfig_bytes(&bytes).await
}

/// Resolve the authenticated username the same way `kubectl auth whoami`
/// does, via a self subject review.
#[instrument(skip(client))]
pub async fn get_kube_username(client: &Client) -> Result<String> {
    let api: Api<SelfSubjectReview> = Api::all(client.clone());
    let review = api
        .create(&PostParams::default(), &SelfSubjectReview::default())
        .await?;
    Ok(review
        .status
        .and_then(|s| s.user_info)
        .and_then(|u| u.username)
        .unwrap_or_default())
}

/// Typed object get wrapped in the retry policy.
pub async fn get_with_retry<K>(api: &Api<K>, policy: &RetryPolicy, name: &str) -> Result<K>
where
    K: Clone + DeserializeOwned + std::fmt::Debug,
{
    retry(policy, || {
        let api = api.clone();
        let name = name.to_string();
        async move { api.get(&name).await.map_err(Into::into) }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockService;

    #[tokio::test]
    async fn test_invalid_kubeconfig_bytes() {
        let result = client_from_kubeconfig_bytes(b"{not yaml: [").await;
        assert!(matches!(result, Err(TestkitError::KubeconfigError(_))));
    }

    #[tokio::test]
    async fn test_get_kube_username() {
        let body = serde_json::json!({
            "apiVersion": "authentication.k8s.io/v1",
            "kind": "SelfSubjectReview",
            "metadata": {},
            "status": {
                "userInfo": {
                    "username": "kubernetes-admin",
                    "groups": ["system:masters"]
                }
            }
        })
        .to_string();
        let client = MockService::new()
            .on_post(
                "/apis/authentication.k8s.io/v1/selfsubjectreviews",
                201,
                &body,
            )
            .into_client();

        let username = get_kube_username(&client).await.unwrap();
        assert_eq!(username, "kubernetes-admin");
    }

    #[tokio::test]
    async fn test_missing_connection_details_key() {
        let result = client_from_connection_details(Some(ConnectionDetails::new()), "kubeconfig")
            .await;
        assert!(matches!(
            result,
            Err(TestkitError::MissingConnectionDetailsKey(_))
        ));
    }

    #[tokio::test]
    async fn test_no_connection_details_at_all() {
        let result = client_from_connection_details(None, "kubeconfig").await;
        assert!(matches!(
            result,
            Err(TestkitError::MissingConnectionDetailsKey(_))
        ));
    }
}
