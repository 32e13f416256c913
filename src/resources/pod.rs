// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pod access, readiness and command execution

use crate::client::get_with_retry;
use crate::error::{Result, TestkitError};
use crate::retry::{retry, RetryPolicy};
use k8s_openapi::api::core::v1::Pod;
use kube::api::AttachParams;
use kube::{Api, Client};
use tokio::io::AsyncReadExt;
use tracing::instrument;

/// Captured output of a command executed in a pod
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

pub async fn get_pod(client: &Client, name: &str, namespace: &str) -> Result<Pod> {
    let api: Api<Pod> = Api::namespaced(client.clone(), namespace);
    get_with_retry(&api, &RetryPolicy::default(), name).await
}

/// Check the ContainersReady condition of a pod
pub async fn is_pod_available(client: &Client, name: &str, namespace: &str) -> Result<bool> {
    let pod = get_pod(client, name, namespace).await?;
    Ok(pod
        .status
        .and_then(|s| s.conditions)
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "ContainersReady" && c.status == "True")
        }))
}

/// Execute the given command in the specified container and return the
/// recorded stdout and stderr. A nonzero exit or transport failure is an
/// error carrying both streams.
#[instrument(skip(client, command))]
pub async fn exec_in_pod(
    client: &Client,
    policy: &RetryPolicy,
    namespace: &str,
    pod: &str,
    container: &str,
    command: &[String],
) -> Result<ExecOutput> {
    retry(policy, || {
        let client = client.clone();
        let namespace = namespace.to_string();
        let pod = pod.to_string();
        let container = container.to_string();
        let command = command.to_vec();
        async move { exec_once(&client, &namespace, &pod, &container, &command).await }
    })
    .await
}

async fn exec_once(
    client: &Client,
    namespace: &str,
    pod: &str,
    container: &str,
    command: &[String],
) -> Result<ExecOutput> {
    let api: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let params = AttachParams::default()
        .container(container)
        .stdout(true)
        .stderr(true);

    let mut attached = api.exec(pod, command.to_vec(), &params).await?;

    let mut stdout_stream = attached
        .stdout()
        .ok_or_else(|| TestkitError::ExecError("no stdout stream attached".to_string()))?;
    let mut stderr_stream = attached
        .stderr()
        .ok_or_else(|| TestkitError::ExecError("no stderr stream attached".to_string()))?;
    let status_fut = attached
        .take_status()
        .ok_or_else(|| TestkitError::ExecError("no status stream attached".to_string()))?;

    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();
    let (stdout_read, stderr_read, status) = tokio::join!(
        stdout_stream.read_to_end(&mut stdout_buf),
        stderr_stream.read_to_end(&mut stderr_buf),
        status_fut
    );
    stdout_read.map_err(|e| TestkitError::ExecError(format!("reading stdout: {}", e)))?;
    stderr_read.map_err(|e| TestkitError::ExecError(format!("reading stderr: {}", e)))?;
    attached
        .join()
        .await
        .map_err(|e| TestkitError::ExecError(format!("joining exec session: {}", e)))?;

    let output = ExecOutput {
        stdout: String::from_utf8_lossy(&stdout_buf).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
    };

    let succeeded = status
        .as_ref()
        .is_some_and(|s| s.status.as_deref() == Some("Success"));
    if !succeeded {
        let reason = status
            .and_then(|s| s.message)
            .unwrap_or_else(|| "command terminated with nonzero exit code".to_string());
        return Err(TestkitError::ExecError(format!(
            "{}\n\nBEGIN STDOUT\n{}\nEND STDOUT\n\nBEGIN STDERR\n{}\nEND STDERR",
            reason, output.stdout, output.stderr
        )));
    }
    Ok(output)
}
