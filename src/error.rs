// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestkitError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to parse kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Invalid object: {0}")]
    InvalidObject(String),

    #[error("No composed resource with resource name \"{0}\"")]
    ComposedNotFound(String),

    #[error("No connection details for key \"{0}\"")]
    MissingConnectionDetailsKey(String),

    #[error("Timed out waiting for condition: {0}")]
    WaitTimeout(String),

    #[error("Command execution failed: {0}")]
    ExecError(String),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<TestkitError>,
    },

    #[error("{0}")]
    Failure(String),
}

impl TestkitError {
    /// Wrap this error with an additional context message
    pub fn context(self, context: impl Into<String>) -> Self {
        TestkitError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this error is a Kubernetes API not-found error
    pub fn is_not_found(&self) -> bool {
        match self {
            TestkitError::KubeError(kube::Error::Api(err)) => err.code == 404,
            TestkitError::Context { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TestkitError>;

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;

    fn api_error(code: u16) -> TestkitError {
        TestkitError::KubeError(kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "not found".to_string(),
            reason: "NotFound".to_string(),
            code,
        }))
    }

    #[test]
    fn test_is_not_found_for_404() {
        assert!(api_error(404).is_not_found());
    }

    #[test]
    fn test_is_not_found_for_other_codes() {
        assert!(!api_error(500).is_not_found());
        assert!(!TestkitError::Failure("boom".to_string()).is_not_found());
    }

    #[test]
    fn test_is_not_found_through_context() {
        assert!(api_error(404).context("cannot get claim").is_not_found());
    }

    #[test]
    fn test_context_display() {
        let err = api_error(404).context("cannot get claim");
        assert!(err.to_string().starts_with("cannot get claim: "));
    }
}
