// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Ingress load balancer readiness

use crate::client::get_with_retry;
use crate::error::Result;
use crate::retry::RetryPolicy;
use k8s_openapi::api::networking::v1::Ingress;
use kube::{Api, Client};

/// Check that the ingress exposes the desired number of load balancers and
/// the most recent one has a hostname assigned. Returns the ingress for
/// further inspection.
pub async fn is_alb_available(
    client: &Client,
    desired_load_balancers: usize,
    name: &str,
    namespace: &str,
) -> Result<(bool, Ingress)> {
    let api: Api<Ingress> = Api::namespaced(client.clone(), namespace);
    let ingress = get_with_retry(&api, &RetryPolicy::default(), name).await?;

    let empty = Vec::new();
    let load_balancers = ingress
        .status
        .as_ref()
        .and_then(|s| s.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref())
        .unwrap_or(&empty);

    let available = load_balancers.len() == desired_load_balancers
        && load_balancers
            .last()
            .is_some_and(|lb| lb.hostname.as_deref().is_some_and(|h| !h.is_empty()));

    Ok((available, ingress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockService;
    use serde_json::json;

    fn ingress_json(hostnames: Vec<&str>) -> String {
        let entries: Vec<_> = hostnames
            .into_iter()
            .map(|h| json!({"hostname": h}))
            .collect();
        json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "metadata": {"name": "web", "namespace": "default"},
            "spec": {},
            "status": {"loadBalancer": {"ingress": entries}}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_alb_available() {
        let client = MockService::new()
            .on_get(
                "/apis/networking.k8s.io/v1/namespaces/default/ingresses/web",
                200,
                &ingress_json(vec!["alb-1.example.com"]),
            )
            .into_client();

        let (available, _) = is_alb_available(&client, 1, "web", "default").await.unwrap();
        assert!(available);
    }

    #[tokio::test]
    async fn test_alb_not_available_with_wrong_count() {
        let client = MockService::new()
            .on_get(
                "/apis/networking.k8s.io/v1/namespaces/default/ingresses/web",
                200,
                &ingress_json(vec!["alb-1.example.com"]),
            )
            .into_client();

        let (available, _) = is_alb_available(&client, 2, "web", "default").await.unwrap();
        assert!(!available);
    }

    #[tokio::test]
    async fn test_alb_not_available_without_hostname() {
        let client = MockService::new()
            .on_get(
                "/apis/networking.k8s.io/v1/namespaces/default/ingresses/web",
                200,
                &ingress_json(vec![""]),
            )
            .into_client();

        let (available, _) = is_alb_available(&client, 1, "web", "default").await.unwrap();
        assert!(!available);
    }
}
