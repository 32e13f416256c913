// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Crossplane well-known labels
pub mod labels {
    /// Name of the claim a composed resource belongs to
    pub const CLAIM_NAME: &str = "crossplane.io/claim-name";
    /// Namespace of the claim a composed resource belongs to
    pub const CLAIM_NAMESPACE: &str = "crossplane.io/claim-namespace";
}

/// Crossplane well-known annotations
pub mod annotations {
    /// Name of the entry in the composition that produced a composed resource
    pub const COMPOSITION_RESOURCE_NAME: &str = "crossplane.io/composition-resource-name";
}

/// Status condition types and values
pub mod conditions {
    /// Reconciliation succeeded
    pub const TYPE_SYNCED: &str = "Synced";
    /// Resource is operational
    pub const TYPE_READY: &str = "Ready";
    pub const STATUS_TRUE: &str = "True";
}

/// Prefix for the field owner used with server-side apply
pub const FIELD_OWNER_PREFIX: &str = "test";

/// Default timings
pub mod defaults {
    use std::time::Duration;

    /// Interval between wait-condition checks
    pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
    /// Per-request timeout applied to constructed clients
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
}
