// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Helpers for end-to-end testing of Kubernetes clusters running Crossplane
//! compositions: apply objects, walk claim resource trees, wait for
//! readiness or deletion, resolve connection secrets and exec into pods.

pub mod client;
pub mod constants;
pub mod crossplane;
pub mod dynamic;
pub mod error;
pub mod meta;
pub mod resources;
pub mod retry;
pub mod steps;
pub mod test_utils;
pub mod transport;
pub mod wait;

pub use error::{Result, TestkitError};
