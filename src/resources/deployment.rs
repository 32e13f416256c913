// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deployment readiness and owned-workload lookups

use crate::client::get_with_retry;
use crate::error::Result;
use crate::retry::RetryPolicy;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::Pod;
use kube::api::ListParams;
use kube::{Api, Client};

/// Check the Available condition of a deployment
pub async fn is_deployment_available(
    client: &Client,
    name: &str,
    namespace: &str,
) -> Result<bool> {
    let api: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let deployment = get_with_retry(&api, &RetryPolicy::default(), name).await?;
    Ok(deployment
        .status
        .and_then(|s| s.conditions)
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Available" && c.status == "True")
        }))
}

/// The first replica set owned by the deployment that has available
/// replicas, `None` when no rollout is serving yet.
pub async fn get_active_replica_set(
    client: &Client,
    name: &str,
    namespace: &str,
) -> Result<Option<ReplicaSet>> {
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let deployment = get_with_retry(&deployments, &RetryPolicy::default(), name).await?;
    let deployment_name = deployment.metadata.name.unwrap_or_else(|| name.to_string());

    let replica_sets: Api<ReplicaSet> = Api::namespaced(client.clone(), namespace);
    let list = replica_sets.list(&ListParams::default()).await?;

    Ok(list.items.into_iter().find(|rs| {
        let available = rs
            .status
            .as_ref()
            .and_then(|s| s.available_replicas)
            .unwrap_or(0);
        if available < 1 {
            return false;
        }
        rs.metadata.owner_references.as_ref().is_some_and(|owners| {
            owners
                .iter()
                .any(|o| o.kind == "Deployment" && o.name == deployment_name)
        })
    }))
}

/// Pods selected by the deployment's label selector
pub async fn get_pods_for_deployment(
    client: &Client,
    name: &str,
    namespace: &str,
) -> Result<Vec<Pod>> {
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let deployment = get_with_retry(&deployments, &RetryPolicy::default(), name).await?;

    let match_labels = deployment
        .spec
        .and_then(|s| s.selector.match_labels)
        .unwrap_or_default();
    let selector = match_labels
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",");

    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let params = if selector.is_empty() {
        ListParams::default()
    } else {
        ListParams::default().labels(&selector)
    };
    Ok(pods.list(&params).await?.items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockService;
    use serde_json::json;

    fn deployment_json(name: &str, available: &str) -> String {
        json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": name, "namespace": "default"},
            "spec": {
                "selector": {"matchLabels": {"app": name}},
                "template": {
                    "metadata": {"labels": {"app": name}},
                    "spec": {"containers": [{"name": "main", "image": "busybox"}]}
                }
            },
            "status": {
                "conditions": [{"type": "Available", "status": available}]
            }
        })
        .to_string()
    }

    fn replica_set_list(owner: &str, available_replicas: i32) -> String {
        json!({
            "apiVersion": "apps/v1",
            "kind": "ReplicaSetList",
            "metadata": {},
            "items": [{
                "apiVersion": "apps/v1",
                "kind": "ReplicaSet",
                "metadata": {
                    "name": format!("{}-abc123", owner),
                    "namespace": "default",
                    "ownerReferences": [{
                        "apiVersion": "apps/v1",
                        "kind": "Deployment",
                        "name": owner,
                        "uid": "test-uid"
                    }]
                },
                "spec": {"selector": {"matchLabels": {"app": owner}}},
                "status": {"replicas": 1, "availableReplicas": available_replicas}
            }]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_is_deployment_available() {
        let client = MockService::new()
            .on_get(
                "/apis/apps/v1/namespaces/default/deployments/web",
                200,
                &deployment_json("web", "True"),
            )
            .into_client();

        assert!(is_deployment_available(&client, "web", "default")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_active_replica_set_found() {
        let client = MockService::new()
            .on_get(
                "/apis/apps/v1/namespaces/default/deployments/web",
                200,
                &deployment_json("web", "True"),
            )
            .on_get(
                "/apis/apps/v1/namespaces/default/replicasets",
                200,
                &replica_set_list("web", 1),
            )
            .into_client();

        let rs = get_active_replica_set(&client, "web", "default")
            .await
            .unwrap();
        assert!(rs.is_some());
    }

    #[tokio::test]
    async fn test_active_replica_set_none_without_available_replicas() {
        let client = MockService::new()
            .on_get(
                "/apis/apps/v1/namespaces/default/deployments/web",
                200,
                &deployment_json("web", "False"),
            )
            .on_get(
                "/apis/apps/v1/namespaces/default/replicasets",
                200,
                &replica_set_list("web", 0),
            )
            .into_client();

        let rs = get_active_replica_set(&client, "web", "default")
            .await
            .unwrap();
        assert!(rs.is_none());
    }

    #[tokio::test]
    async fn test_pods_for_deployment_uses_selector() {
        let mock = MockService::new()
            .on_get(
                "/apis/apps/v1/namespaces/default/deployments/web",
                200,
                &deployment_json("web", "True"),
            )
            .on_get(
                "/api/v1/namespaces/default/pods",
                200,
                &json!({
                    "apiVersion": "v1",
                    "kind": "PodList",
                    "metadata": {},
                    "items": [{
                        "apiVersion": "v1",
                        "kind": "Pod",
                        "metadata": {"name": "web-1", "namespace": "default", "labels": {"app": "web"}}
                    }]
                })
                .to_string(),
            );
        let recorder = mock.clone();
        let client = mock.into_client();

        let pods = get_pods_for_deployment(&client, "web", "default")
            .await
            .unwrap();

        assert_eq!(pods.len(), 1);
        let listed = recorder
            .requests()
            .into_iter()
            .find(|r| r.path == "/api/v1/namespaces/default/pods")
            .unwrap();
        assert!(listed.query.contains("app%3Dweb") || listed.query.contains("app=web"));
    }
}
