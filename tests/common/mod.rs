//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use tempfile::TempDir;

use fake_api::config::{ApiConfig, EndpointDefinition, FakeApiConfig, ResourceDefinition};

/// A resource root populated with the given files.
pub fn resource_root(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        write_file(dir.path(), name, contents);
    }
    dir
}

pub fn write_file(root: &Path, name: &str, contents: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

pub fn endpoint(path: &str) -> EndpointDefinition {
    EndpointDefinition {
        path: path.to_string(),
        ..Default::default()
    }
}

pub fn resource(name: &str) -> ResourceDefinition {
    ResourceDefinition {
        name: name.to_string(),
        ..Default::default()
    }
}

pub fn config(urls: Vec<EndpointDefinition>, resources: Vec<ResourceDefinition>) -> FakeApiConfig {
    FakeApiConfig {
        api: ApiConfig {
            urls,
            resources,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
