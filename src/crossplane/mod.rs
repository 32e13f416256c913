// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Crossplane claim, composite and composed resource handling.

pub mod composed;
pub mod conditions;
pub mod connection_details;
pub mod reference;
pub mod tree;

pub use composed::{get_composed_from_claim, get_composed_from_composite};
pub use conditions::{is_object_synced_and_ready, ConditionExceptions, GroupKind};
pub use reference::{composed_refs, composite_ref, connection_secret_ref, ResourceRef, SecretRef};
pub use tree::{collect_resource_tree, render_yaml, ResourceTree};
