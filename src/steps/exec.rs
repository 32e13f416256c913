// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pod command execution step

use crate::error::Result;
use crate::resources::pod::exec_in_pod;
use crate::retry::RetryPolicy;
use crate::steps::{Step, StepContext};
use async_trait::async_trait;
use tracing::debug;

/// Execute a command in a container and fail the step if it does not exit
/// successfully. The error carries the captured stdout and stderr.
pub struct ExecInPod {
    name: String,
    namespace: String,
    pod: String,
    container: String,
    command: Vec<String>,
    retry: RetryPolicy,
}

impl ExecInPod {
    pub fn new(
        namespace: impl Into<String>,
        pod: impl Into<String>,
        container: impl Into<String>,
        command: Vec<String>,
    ) -> Self {
        let pod = pod.into();
        ExecInPod {
            name: format!("exec/{}", pod),
            namespace: namespace.into(),
            pod,
            container: container.into(),
            command,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl Step for ExecInPod {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &StepContext) -> Result<()> {
        let output = exec_in_pod(
            &ctx.client,
            &self.retry,
            &self.namespace,
            &self.pod,
            &self.container,
            &self.command,
        )
        .await?;
        debug!(
            "Command executed successfully in {}/{}: stdout {} bytes, stderr {} bytes",
            self.namespace,
            self.pod,
            output.stdout.len(),
            output.stderr.len()
        );
        Ok(())
    }
}
