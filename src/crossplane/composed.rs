// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Composed resource lookup via claim labels.

use crate::constants::labels;
use crate::dynamic::resolve_gvk;
use crate::error::{Result, TestkitError};
use crate::meta;
use kube::api::{Api, DynamicObject, ListParams};
use kube::core::GroupVersionKind;
use kube::{Client, ResourceExt};

/// Find the composed resource of the given kind that belongs to the claim
/// and carries the given composition resource name.
pub async fn get_composed_from_claim(
    client: &Client,
    claim: &DynamicObject,
    resource_name: &str,
    gvk: &GroupVersionKind,
) -> Result<DynamicObject> {
    let claim_name = claim.name_any();
    let claim_namespace = claim.namespace().unwrap_or_default();
    get_composed(client, &claim_name, &claim_namespace, resource_name, gvk).await
}

/// Find the composed resource of the given kind through the claim labels
/// stamped on a composite resource.
pub async fn get_composed_from_composite(
    client: &Client,
    composite: &DynamicObject,
    resource_name: &str,
    gvk: &GroupVersionKind,
) -> Result<DynamicObject> {
    let claim_name = meta::claim_name(composite).unwrap_or_default().to_string();
    let claim_namespace = meta::claim_namespace(composite)
        .unwrap_or_default()
        .to_string();
    get_composed(client, &claim_name, &claim_namespace, resource_name, gvk).await
}

async fn get_composed(
    client: &Client,
    claim_name: &str,
    claim_namespace: &str,
    resource_name: &str,
    gvk: &GroupVersionKind,
) -> Result<DynamicObject> {
    let (ar, _caps) = resolve_gvk(client, gvk).await?;
    let api: Api<DynamicObject> = Api::all_with(client.clone(), &ar);

    let selector = format!(
        "{}={},{}={}",
        labels::CLAIM_NAME,
        claim_name,
        labels::CLAIM_NAMESPACE,
        claim_namespace
    );
    let list = api
        .list(&ListParams::default().labels(&selector))
        .await
        .map_err(|e| TestkitError::from(e).context("cannot list objects"))?;

    // The composed resource is identified by its composition resource name
    // annotation; the first match wins.
    list.items
        .into_iter()
        .find(|object| {
            meta::composition_resource_name(object).is_some_and(|name| name == resource_name)
        })
        .ok_or_else(|| TestkitError::ComposedNotFound(resource_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{dynamic_object, MockService};
    use serde_json::json;

    fn bucket_gvk() -> GroupVersionKind {
        GroupVersionKind::gvk("aws.example.org", "v1beta1", "Bucket")
    }

    fn claim() -> DynamicObject {
        dynamic_object(
            "example.org/v1",
            "ExampleClaim",
            "db-claim",
            Some("default"),
            json!({}),
        )
    }

    fn bucket_item(name: &str, resource_name: &str) -> serde_json::Value {
        json!({
            "apiVersion": "aws.example.org/v1beta1",
            "kind": "Bucket",
            "metadata": {
                "name": name,
                "namespace": "default",
                "annotations": {"crossplane.io/composition-resource-name": resource_name},
                "labels": {
                    "crossplane.io/claim-name": "db-claim",
                    "crossplane.io/claim-namespace": "default"
                }
            }
        })
    }

    fn bucket_list(items: Vec<serde_json::Value>) -> String {
        json!({
            "apiVersion": "aws.example.org/v1beta1",
            "kind": "BucketList",
            "metadata": {},
            "items": items
        })
        .to_string()
    }

    fn mock_with_buckets(items: Vec<serde_json::Value>) -> MockService {
        MockService::new()
            .with_kind("aws.example.org", "v1beta1", "Bucket", "buckets", true)
            .on_get(
                "/apis/aws.example.org/v1beta1/buckets",
                200,
                &bucket_list(items),
            )
    }

    #[tokio::test]
    async fn test_returns_first_annotation_match() {
        let client = mock_with_buckets(vec![
            bucket_item("bucket-other", "logging-bucket"),
            bucket_item("bucket-a", "bucket"),
            bucket_item("bucket-b", "bucket"),
        ])
        .into_client();

        let composed = get_composed_from_claim(&client, &claim(), "bucket", &bucket_gvk())
            .await
            .unwrap();

        assert_eq!(composed.metadata.name.as_deref(), Some("bucket-a"));
    }

    #[tokio::test]
    async fn test_no_annotation_match_is_not_found() {
        let client = mock_with_buckets(vec![bucket_item("bucket-other", "logging-bucket")])
            .into_client();

        let result = get_composed_from_claim(&client, &claim(), "bucket", &bucket_gvk()).await;

        assert!(matches!(result, Err(TestkitError::ComposedNotFound(_))));
    }

    #[tokio::test]
    async fn test_lookup_from_composite_uses_claim_labels() {
        let mut composite = dynamic_object(
            "example.org/v1",
            "XExample",
            "db-composite",
            None,
            json!({}),
        );
        composite.metadata.labels = Some(
            [
                ("crossplane.io/claim-name".to_string(), "db-claim".to_string()),
                (
                    "crossplane.io/claim-namespace".to_string(),
                    "default".to_string(),
                ),
            ]
            .into_iter()
            .collect(),
        );

        let mock = mock_with_buckets(vec![bucket_item("bucket-a", "bucket")]);
        let requests = mock.clone();
        let client = mock.into_client();

        let composed =
            get_composed_from_composite(&client, &composite, "bucket", &bucket_gvk())
                .await
                .unwrap();

        assert_eq!(composed.metadata.name.as_deref(), Some("bucket-a"));
        // The list request carries the claim label selector
        let listed = requests
            .requests()
            .into_iter()
            .find(|r| r.method == "GET" && r.path == "/apis/aws.example.org/v1beta1/buckets")
            .unwrap();
        assert!(listed.query.contains("claim-name"));
    }
}
