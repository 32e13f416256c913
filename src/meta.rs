// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Accessors for Crossplane well-known labels and annotations.

use crate::constants::{annotations, labels};
use kube::ResourceExt;

/// Claim name stored in the labels of a composed resource
pub fn claim_name(object: &impl ResourceExt) -> Option<&str> {
    object.labels().get(labels::CLAIM_NAME).map(String::as_str)
}

/// Claim namespace stored in the labels of a composed resource
pub fn claim_namespace(object: &impl ResourceExt) -> Option<&str> {
    object
        .labels()
        .get(labels::CLAIM_NAMESPACE)
        .map(String::as_str)
}

/// Composition resource name annotation of a composed resource
pub fn composition_resource_name(object: &impl ResourceExt) -> Option<&str> {
    object
        .annotations()
        .get(annotations::COMPOSITION_RESOURCE_NAME)
        .map(String::as_str)
}
