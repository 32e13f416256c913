// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed accessors and readiness predicates for common resource kinds.

pub mod deployment;
pub mod ingress;
pub mod pod;
pub mod pvc;
pub mod secret;
