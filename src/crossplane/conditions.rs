// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Status condition parsing and the synced-and-ready predicate.

use crate::constants::conditions::{STATUS_TRUE, TYPE_READY, TYPE_SYNCED};
use kube::api::DynamicObject;
use kube::core::GroupVersionKind;
use serde::Deserialize;
use std::collections::HashSet;

/// A single entry of an object's `status.conditions`
#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Conditions of a dynamic object. Absent or malformed entries read as empty.
pub fn object_conditions(object: &DynamicObject) -> Vec<Condition> {
    match object.data.pointer("/status/conditions") {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Check that the condition of the given type exists with status `True`
pub fn is_condition_true(conditions: &[Condition], condition_type: &str) -> bool {
    conditions
        .iter()
        .any(|c| c.condition_type == condition_type && c.status == STATUS_TRUE)
}

/// Group and kind of a resource, version-independent
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKind {
    pub group: String,
    pub kind: String,
}

impl GroupKind {
    pub fn new(group: &str, kind: &str) -> Self {
        GroupKind {
            group: group.to_string(),
            kind: kind.to_string(),
        }
    }

    pub fn of(gvk: &GroupVersionKind) -> Self {
        GroupKind::new(&gvk.group, &gvk.kind)
    }
}

/// Group-kinds that never expose `Synced`/`Ready` conditions and are treated
/// as always ready.
///
/// This is an explicit value carried in the wait options; register additional
/// kinds before starting a wait. Kinds cannot be removed.
#[derive(Debug, Clone)]
pub struct ConditionExceptions {
    kinds: HashSet<GroupKind>,
}

impl ConditionExceptions {
    /// An empty exception set, every kind must carry conditions
    pub fn empty() -> Self {
        ConditionExceptions {
            kinds: HashSet::new(),
        }
    }

    pub fn register(&mut self, kind: GroupKind) {
        self.kinds.insert(kind);
    }

    pub fn register_all(&mut self, kinds: impl IntoIterator<Item = GroupKind>) {
        self.kinds.extend(kinds);
    }

    pub fn contains(&self, kind: &GroupKind) -> bool {
        self.kinds.contains(kind)
    }
}

impl Default for ConditionExceptions {
    /// Pre-seeded with provider configs and other condition-less kinds
    /// commonly found in composition trees
    fn default() -> Self {
        let mut exceptions = ConditionExceptions::empty();
        exceptions.register_all([
            GroupKind::new("aws.crossplane.io", "ProviderConfig"),
            GroupKind::new("gitlab.crossplane.io", "ProviderConfig"),
            GroupKind::new("grafana.crossplane.io", "ProviderConfig"),
            GroupKind::new("argocd.crossplane.io", "ProviderConfig"),
            GroupKind::new("helm.crossplane.io", "ProviderConfig"),
            GroupKind::new("kubernetes.crossplane.io", "ProviderConfig"),
            GroupKind::new("aws.upbound.io", "ProviderConfig"),
            GroupKind::new("rbac.authorization.k8s.io", "ClusterRole"),
            GroupKind::new("apiextensions.crossplane.io", "EnvironmentConfig"),
            GroupKind::new("apiextensions.crossplane.io", "Usage"),
        ]);
        exceptions
    }
}

/// Check that an object has both `Synced` and `Ready` conditions with status
/// `True`. Exception-listed group-kinds pass regardless of their condition
/// content; an object without type metadata is never ready.
pub fn is_object_synced_and_ready(
    object: &DynamicObject,
    exceptions: &ConditionExceptions,
) -> bool {
    let Some(types) = object.types.as_ref() else {
        return false;
    };
    let group = types
        .api_version
        .split_once('/')
        .map(|(group, _)| group)
        .unwrap_or("");
    if exceptions.contains(&GroupKind::new(group, &types.kind)) {
        return true;
    }

    let conditions = object_conditions(object);
    is_condition_true(&conditions, TYPE_SYNCED) && is_condition_true(&conditions, TYPE_READY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ApiResource;
    use serde_json::json;

    fn make_object(group: &str, kind: &str, conditions: Option<serde_json::Value>) -> DynamicObject {
        let gvk = GroupVersionKind::gvk(group, "v1", kind);
        let ar = ApiResource::from_gvk(&gvk);
        let mut object = DynamicObject::new("test", &ar);
        if let Some(conditions) = conditions {
            object.data = json!({"status": {"conditions": conditions}});
        }
        object
    }

    fn synced_and_ready() -> serde_json::Value {
        json!([
            {"type": "Synced", "status": "True", "reason": "ReconcileSuccess"},
            {"type": "Ready", "status": "True", "reason": "Available"}
        ])
    }

    #[test]
    fn test_ready_with_both_conditions_true() {
        let object = make_object("example.org", "Bucket", Some(synced_and_ready()));
        assert!(is_object_synced_and_ready(
            &object,
            &ConditionExceptions::default()
        ));
    }

    #[test]
    fn test_not_ready_when_ready_is_false() {
        let object = make_object(
            "example.org",
            "Bucket",
            Some(json!([
                {"type": "Synced", "status": "True"},
                {"type": "Ready", "status": "False"}
            ])),
        );
        assert!(!is_object_synced_and_ready(
            &object,
            &ConditionExceptions::default()
        ));
    }

    #[test]
    fn test_not_ready_when_synced_is_unknown() {
        let object = make_object(
            "example.org",
            "Bucket",
            Some(json!([
                {"type": "Synced", "status": "Unknown"},
                {"type": "Ready", "status": "True"}
            ])),
        );
        assert!(!is_object_synced_and_ready(
            &object,
            &ConditionExceptions::default()
        ));
    }

    #[test]
    fn test_not_ready_when_conditions_missing() {
        let object = make_object("example.org", "Bucket", None);
        assert!(!is_object_synced_and_ready(
            &object,
            &ConditionExceptions::default()
        ));
    }

    #[test]
    fn test_exception_listed_kind_is_always_ready() {
        let object = make_object("aws.crossplane.io", "ProviderConfig", None);
        assert!(is_object_synced_and_ready(
            &object,
            &ConditionExceptions::default()
        ));
    }

    #[test]
    fn test_exception_listed_kind_ignores_false_conditions() {
        let object = make_object(
            "rbac.authorization.k8s.io",
            "ClusterRole",
            Some(json!([{"type": "Ready", "status": "False"}])),
        );
        assert!(is_object_synced_and_ready(
            &object,
            &ConditionExceptions::default()
        ));
    }

    #[test]
    fn test_registered_kind_becomes_exception() {
        let object = make_object("custom.example.org", "Widget", None);
        let mut exceptions = ConditionExceptions::default();
        assert!(!is_object_synced_and_ready(&object, &exceptions));

        exceptions.register(GroupKind::new("custom.example.org", "Widget"));
        assert!(is_object_synced_and_ready(&object, &exceptions));
    }

    #[test]
    fn test_object_without_types_is_never_ready() {
        let object = DynamicObject {
            types: None,
            metadata: Default::default(),
            data: json!({"status": {"conditions": synced_and_ready()}}),
        };
        assert!(!is_object_synced_and_ready(
            &object,
            &ConditionExceptions::default()
        ));
    }

    #[test]
    fn test_malformed_conditions_read_as_empty() {
        let object = make_object("example.org", "Bucket", Some(json!("not-a-list")));
        assert!(object_conditions(&object).is_empty());
    }
}
