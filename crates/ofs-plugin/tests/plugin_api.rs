//! Integration tests for the volume plugin HTTP API.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use ofs_common::OfsPaths;
use ofs_plugin::api;
use ofs_plugin::api::types::PLUGIN_CONTENT_TYPE;
use ofs_volume::VolumeDriver;
use ofs_volume::testing::RecordingExecutor;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

struct Harness {
    app: Router,
    executor: RecordingExecutor,
    root: TempDir,
}

impl Harness {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let executor = RecordingExecutor::new();
        let driver = Arc::new(VolumeDriver::new(
            OfsPaths::with_root(root.path()),
            executor.clone(),
        ));
        Self {
            app: api::app(driver),
            executor,
            root,
        }
    }

    fn mountpoint(&self, name: &str) -> String {
        self.root
            .path()
            .join("objectivefs")
            .join(name)
            .display()
            .to_string()
    }

    async fn call(&self, route: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(route)
            .header(header::CONTENT_TYPE, PLUGIN_CONTENT_TYPE)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            PLUGIN_CONTENT_TYPE
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

#[tokio::test]
async fn activate_reports_volume_driver() {
    let h = Harness::new();
    let (status, body) = h.call("/Plugin.Activate", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "Implements": ["VolumeDriver"] }));
}

#[tokio::test]
async fn capabilities_are_local() {
    let h = Harness::new();
    let (status, body) = h.call("/VolumeDriver.Capabilities", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "Capabilities": { "Scope": "local" } }));
}

#[tokio::test]
async fn shared_volume_round_trip() {
    let h = Harness::new();
    let mountpoint = h.mountpoint("data");

    let (status, _) = h
        .call(
            "/VolumeDriver.Create",
            json!({ "Name": "data", "Opts": { "fs": "s3://bucket/data", "options": "listcache" } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = h.call("/VolumeDriver.Get", json!({ "Name": "data" })).await;
    assert_eq!(body["Volume"]["Name"], "data");
    assert_eq!(body["Volume"]["Mountpoint"], mountpoint.as_str());
    assert_eq!(body["Volume"]["Status"]["mounted"], false);

    let (_, body) = h.call("/VolumeDriver.Path", json!({ "Name": "data" })).await;
    assert_eq!(body, json!({ "Mountpoint": &mountpoint }));

    for id in ["containerA", "containerB"] {
        let (status, body) = h
            .call("/VolumeDriver.Mount", json!({ "Name": "data", "ID": id }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "Mountpoint": &mountpoint }));
    }
    assert_eq!(h.executor.mount_count(), 1);

    for id in ["containerA", "containerB"] {
        let (status, _) = h
            .call("/VolumeDriver.Unmount", json!({ "Name": "data", "ID": id }))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(h.executor.unmount_count(), 0);

    let (status, _) = h.call("/VolumeDriver.Remove", json!({ "Name": "data" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.executor.unmount_count(), 1);

    let (_, body) = h.call("/VolumeDriver.List", json!({})).await;
    assert_eq!(body, json!({ "Volumes": [] }));
}

#[tokio::test]
async fn list_omits_status() {
    let h = Harness::new();
    h.call("/VolumeDriver.Create", json!({ "Name": "a", "Opts": null }))
        .await;
    h.call("/VolumeDriver.Create", json!({ "Name": "b" })).await;

    let (status, body) = h.call("/VolumeDriver.List", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let volumes = body["Volumes"].as_array().unwrap();
    assert_eq!(volumes.len(), 2);
    assert!(volumes.iter().all(|v| v.get("Status").is_none()));
    assert!(volumes.iter().all(|v| v["CreatedAt"].is_string()));
}

#[tokio::test]
async fn errors_are_reported_in_err_field() {
    let h = Harness::new();

    let (status, body) = h.call("/VolumeDriver.Get", json!({ "Name": "nope" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "Err": "volume 'nope' not found" }));

    h.call("/VolumeDriver.Create", json!({ "Name": "data" })).await;
    let (status, body) = h.call("/VolumeDriver.Create", json!({ "Name": "data" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "Err": "volume 'data' already exists" }));

    h.call("/VolumeDriver.Mount", json!({ "Name": "data", "ID": "c1" }))
        .await;
    let (status, body) = h.call("/VolumeDriver.Remove", json!({ "Name": "data" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "Err": "volume 'data' currently in use (1 unique)" }));
}

#[tokio::test]
async fn mount_failure_includes_reason() {
    let h = Harness::new();
    h.call("/VolumeDriver.Create", json!({ "Name": "data", "Opts": { "fs": "x" } }))
        .await;
    h.executor.fail_mounts("exit status: 1");

    let (status, body) = h
        .call("/VolumeDriver.Mount", json!({ "Name": "data", "ID": "c1" }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let err = body["Err"].as_str().unwrap();
    assert!(err.contains("exit status: 1"));
    assert!(err.contains("/var/log/syslog"));
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let h = Harness::new();
    let (status, body) = h.call("/VolumeDriver.Mount", json!({ "Name": "data" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["Err"].as_str().unwrap().starts_with("Serialization error"));
}
