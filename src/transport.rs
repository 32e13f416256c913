// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Retrying middleware for the Kubernetes client transport.
//!
//! Lost connections show up as transient transport errors on long test runs;
//! the layer replays the request a fixed number of times before giving up.

use crate::retry::RetryPolicy;
use bytes::Bytes;
use futures::future::BoxFuture;
use http::{Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use std::task::{Context, Poll};
use tower::{BoxError, Layer, Service, ServiceExt};
use tracing::debug;

/// Tower layer wrapping the client service in [`RetryService`].
#[derive(Debug, Clone)]
pub struct RetryLayer {
    policy: RetryPolicy,
}

impl RetryLayer {
    pub fn new(policy: RetryPolicy) -> Self {
        RetryLayer { policy }
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = RetryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryService {
            inner,
            policy: self.policy,
        }
    }
}

/// Retries a request on transient transport errors with a fixed backoff.
/// Any other error, and retry exhaustion, propagate the last error unchanged.
#[derive(Debug, Clone)]
pub struct RetryService<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S, B> Service<Request<Body>> for RetryService<S>
where
    S: Service<Request<Body>, Response = Response<B>> + Clone + Send + 'static,
    S::Error: Into<BoxError> + Send,
    S::Future: Send,
    B: Send + 'static,
{
    type Response = Response<B>;
    type Error = BoxError;
    type Future = BoxFuture<'static, std::result::Result<Response<B>, BoxError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // The clone takes the place of the service that was polled ready
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let policy = self.policy;

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let bytes = body.collect().await?.to_bytes();

            let mut attempt = 0;
            loop {
                let req = clone_request(&parts, &bytes);
                match inner.ready().await.map_err(Into::into)?.call(req).await {
                    Ok(response) => return Ok(response),
                    Err(err) => {
                        let err: BoxError = err.into();
                        attempt += 1;
                        if attempt >= policy.max_attempts || !is_transient_error(err.as_ref()) {
                            return Err(err);
                        }
                        debug!(
                            "Transient transport error (attempt {}/{}), retrying in {:?}: {}",
                            attempt, policy.max_attempts, policy.initial_backoff, err
                        );
                        tokio::time::sleep(policy.initial_backoff).await;
                    }
                }
            }
        })
    }
}

/// Requests are replayed from buffered parts. Extensions are not cloneable
/// and do not survive the replay.
fn clone_request(parts: &http::request::Parts, bytes: &Bytes) -> Request<Body> {
    let mut req = Request::new(Body::from(bytes.to_vec()));
    *req.method_mut() = parts.method.clone();
    *req.uri_mut() = parts.uri.clone();
    *req.version_mut() = parts.version;
    *req.headers_mut() = parts.headers.clone();
    req
}

/// Check if the error is transient: the connection was closed underneath the
/// client or the request deadline expired.
fn is_transient_error(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(cause) = current {
        if let Some(hyper_err) = cause.downcast_ref::<hyper::Error>() {
            if hyper_err.is_canceled() || hyper_err.is_incomplete_message() || hyper_err.is_timeout()
            {
                return true;
            }
        }
        let message = cause.to_string();
        if message.contains("connection closed")
            || message.contains("connection reset")
            || message.contains("connection lost")
            || message.contains("deadline has elapsed")
            || message.contains("deadline exceeded")
        {
            return true;
        }
        current = cause.source();
    }
    false
}
