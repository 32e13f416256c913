// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed views over the references Crossplane stores in object specs.

use crate::dynamic::parse_gvk;
use kube::api::DynamicObject;
use kube::core::GroupVersionKind;
use serde::{Deserialize, Serialize};

/// Reference from a claim to its composite, or from a composite to a
/// composed resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ResourceRef {
    pub fn gvk(&self) -> GroupVersionKind {
        parse_gvk(&self.api_version, &self.kind)
    }
}

/// Reference to the secret an object writes its connection details to.
/// Claims omit the namespace; the secret lives next to the claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Composite reference declared in a claim's `spec.resourceRef`
pub fn composite_ref(claim: &DynamicObject) -> Option<ResourceRef> {
    claim
        .data
        .pointer("/spec/resourceRef")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// Composed resource references declared in a composite's
/// `spec.resourceRefs`. Entries that do not parse as a reference are skipped.
pub fn composed_refs(composite: &DynamicObject) -> Vec<ResourceRef> {
    match composite.data.pointer("/spec/resourceRefs") {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// `spec.writeConnectionSecretToRef` of a claim, composite or composed
/// resource
pub fn connection_secret_ref(object: &DynamicObject) -> Option<SecretRef> {
    object
        .data
        .pointer("/spec/writeConnectionSecretToRef")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::{ApiResource, DynamicObject};
    use kube::core::GroupVersionKind;
    use serde_json::json;

    fn make_object(kind: &str, name: &str, data: serde_json::Value) -> DynamicObject {
        let gvk = GroupVersionKind::gvk("example.org", "v1", kind);
        let ar = ApiResource::from_gvk(&gvk);
        let mut object = DynamicObject::new(name, &ar);
        object.data = data;
        object
    }

    #[test]
    fn test_composite_ref_present() {
        let claim = make_object(
            "ExampleClaim",
            "db-claim",
            json!({
                "spec": {
                    "resourceRef": {
                        "apiVersion": "example.org/v1",
                        "kind": "XExample",
                        "name": "db-composite"
                    }
                }
            }),
        );

        let r = composite_ref(&claim).unwrap();
        assert_eq!(r.name, "db-composite");
        assert_eq!(r.gvk(), GroupVersionKind::gvk("example.org", "v1", "XExample"));
        assert_eq!(r.namespace, None);
    }

    #[test]
    fn test_composite_ref_absent() {
        let claim = make_object("ExampleClaim", "db-claim", json!({"spec": {}}));
        assert!(composite_ref(&claim).is_none());
    }

    #[test]
    fn test_composed_refs() {
        let composite = make_object(
            "XExample",
            "db-composite",
            json!({
                "spec": {
                    "resourceRefs": [
                        {
                            "apiVersion": "aws.example.org/v1beta1",
                            "kind": "Bucket",
                            "name": "bucket-a",
                            "namespace": "default"
                        },
                        {
                            "apiVersion": "aws.example.org/v1beta1",
                            "kind": "Role",
                            "name": "role-a"
                        }
                    ]
                }
            }),
        );

        let refs = composed_refs(&composite);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].namespace.as_deref(), Some("default"));
        assert_eq!(refs[1].name, "role-a");
        assert_eq!(refs[1].namespace, None);
    }

    #[test]
    fn test_composed_refs_skips_malformed_entries() {
        let composite = make_object(
            "XExample",
            "db-composite",
            json!({
                "spec": {
                    "resourceRefs": [
                        {"apiVersion": "aws.example.org/v1beta1"},
                        {
                            "apiVersion": "aws.example.org/v1beta1",
                            "kind": "Bucket",
                            "name": "bucket-a"
                        }
                    ]
                }
            }),
        );

        let refs = composed_refs(&composite);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "bucket-a");
    }

    #[test]
    fn test_composed_refs_absent() {
        let composite = make_object("XExample", "db-composite", json!({"spec": {}}));
        assert!(composed_refs(&composite).is_empty());
    }

    #[test]
    fn test_connection_secret_ref() {
        let claim = make_object(
            "ExampleClaim",
            "db-claim",
            json!({
                "spec": {
                    "writeConnectionSecretToRef": {"name": "db-conn"}
                }
            }),
        );
        let composed = make_object(
            "Bucket",
            "bucket-a",
            json!({
                "spec": {
                    "writeConnectionSecretToRef": {
                        "name": "bucket-conn",
                        "namespace": "crossplane-system"
                    }
                }
            }),
        );

        assert_eq!(
            connection_secret_ref(&claim),
            Some(SecretRef {
                name: "db-conn".to_string(),
                namespace: None
            })
        );
        assert_eq!(
            connection_secret_ref(&composed).unwrap().namespace.as_deref(),
            Some("crossplane-system")
        );
    }
}
