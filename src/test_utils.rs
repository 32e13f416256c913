// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use crate::dynamic::parse_gvk;
use http::{Request, Response};
use http_body_util::BodyExt;
use kube::api::{ApiResource, DynamicObject};
use kube::client::Body;
use kube::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A request observed by the mock service
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub body: String,
}

/// A mock HTTP service that returns predefined responses based on request
/// method and exact path, and records every request it sees.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a response for requests matching the method and exact path
    pub fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            (status, body.to_string()),
        );
        self
    }

    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Register the discovery endpoints for a kind so that GVK resolution
    /// succeeds against this mock
    pub fn with_kind(
        self,
        group: &str,
        version: &str,
        kind: &str,
        plural: &str,
        namespaced: bool,
    ) -> Self {
        let group_path = format!("/apis/{}", group);
        let resources_path = format!("/apis/{}/{}", group, version);
        // A real cluster serves every kind of a group/version from the single
        // `/apis/{group}/{version}` endpoint, so merge into any list already
        // registered for this group/version instead of replacing it.
        let resource_list = match self.find_response("GET", &resources_path) {
            Some((_, existing)) => append_api_resource(&existing, kind, plural, namespaced),
            None => api_resource_list_json(group, version, kind, plural, namespaced),
        };
        self.on_get(&group_path, 200, &api_group_json(group, version))
            .on_get(&resources_path, 200, &resource_list)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// All requests observed so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        self.responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let query = req.uri().query().unwrap_or("").to_string();

        let response = self.find_response(&method, &path);
        let requests = self.requests.clone();

        Box::pin(async move {
            let body = req.into_body().collect().await?.to_bytes();
            requests.lock().unwrap().push(RecordedRequest {
                method,
                path: path.clone(),
                query,
                body: String::from_utf8_lossy(&body).into_owned(),
            });

            match response {
                Some((status, body)) => Ok(Response::builder()
                    .status(status)
                    .header("content-type", "application/json")
                    .body(Body::from(body.into_bytes()))
                    .unwrap()),
                None => {
                    // Default 404 for unmatched requests
                    let body = not_found_json("resource", &path);
                    Ok(Response::builder()
                        .status(404)
                        .header("content-type", "application/json")
                        .body(Body::from(body.into_bytes()))
                        .unwrap())
                }
            }
        })
    }
}

/// Create a dynamic object with the given type, name and content
pub fn dynamic_object(
    api_version: &str,
    kind: &str,
    name: &str,
    namespace: Option<&str>,
    data: serde_json::Value,
) -> DynamicObject {
    let gvk = parse_gvk(api_version, kind);
    let ar = ApiResource::from_gvk(&gvk);
    let mut object = DynamicObject::new(name, &ar);
    if let Some(namespace) = namespace {
        object = object.within(namespace);
    }
    object.data = data;
    object
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// Create a success Status response, e.g. for delete calls
pub fn status_success_json() -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Success",
        "metadata": {}
    })
    .to_string()
}

/// APIGroup discovery response
pub fn api_group_json(group: &str, version: &str) -> String {
    let group_version = format!("{}/{}", group, version);
    serde_json::json!({
        "kind": "APIGroup",
        "apiVersion": "v1",
        "name": group,
        "versions": [{"groupVersion": group_version, "version": version}],
        "preferredVersion": {"groupVersion": group_version, "version": version}
    })
    .to_string()
}

/// APIResourceList discovery response for a single kind
pub fn api_resource_list_json(
    group: &str,
    version: &str,
    kind: &str,
    plural: &str,
    namespaced: bool,
) -> String {
    let group_version = if group.is_empty() {
        version.to_string()
    } else {
        format!("{}/{}", group, version)
    };
    serde_json::json!({
        "kind": "APIResourceList",
        "apiVersion": "v1",
        "groupVersion": group_version,
        "resources": [{
            "name": plural,
            "singularName": kind.to_lowercase(),
            "namespaced": namespaced,
            "kind": kind,
            "verbs": ["get", "list", "create", "update", "patch", "delete"]
        }]
    })
    .to_string()
}

/// Append a single resource to an existing APIResourceList discovery body,
/// preserving its `groupVersion`. Used to register several kinds under one
/// group/version endpoint.
fn append_api_resource(existing: &str, kind: &str, plural: &str, namespaced: bool) -> String {
    let mut list: serde_json::Value =
        serde_json::from_str(existing).expect("existing discovery body is valid JSON");
    let resource = serde_json::json!({
        "name": plural,
        "singularName": kind.to_lowercase(),
        "namespaced": namespaced,
        "kind": kind,
        "verbs": ["get", "list", "create", "update", "patch", "delete"]
    });
    list["resources"]
        .as_array_mut()
        .expect("APIResourceList has a resources array")
        .push(resource);
    list.to_string()
}

/// Secret response with pre-encoded base64 data values
pub fn secret_json(name: &str, namespace: &str, data: &[(&str, &str)]) -> String {
    let entries: serde_json::Map<String, serde_json::Value> = data
        .iter()
        .map(|(key, value)| (key.to_string(), serde_json::Value::from(*value)))
        .collect();
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {"name": name, "namespace": namespace},
        "type": "Opaque",
        "data": entries
    })
    .to_string()
}

/// Composite resource response referencing composed resources in the
/// `aws.example.org/v1beta1` group, all in namespace `default`
pub fn composite_json(
    name: &str,
    composed: &[(&str, &str)],
    conditions: serde_json::Value,
) -> String {
    let refs: Vec<serde_json::Value> = composed
        .iter()
        .map(|(kind, ref_name)| {
            serde_json::json!({
                "apiVersion": "aws.example.org/v1beta1",
                "kind": kind,
                "name": ref_name,
                "namespace": "default"
            })
        })
        .collect();
    serde_json::json!({
        "apiVersion": "example.org/v1",
        "kind": "XExample",
        "metadata": {
            "name": name,
            "labels": {
                "crossplane.io/claim-name": "db-claim",
                "crossplane.io/claim-namespace": "default"
            }
        },
        "spec": {"resourceRefs": refs},
        "status": {"conditions": conditions}
    })
    .to_string()
}
