//! HTTP routes for the volume plugin protocol.
//!
//! Every route is a `POST` with a JSON body. Errors are returned as
//! `500 {"Err": "..."}`, which is what the runtime expects.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use ofs_common::OfsError;
use ofs_volume::{MountExecutor, VolumeDriver};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower_http::trace::TraceLayer;

use super::types::{
    ActivateResponse, AttachRequest, CapabilitiesResponse, CreateRequest, Empty, ErrorResponse,
    GetResponse, ListResponse, MountpointResponse, NameRequest, PLUGIN_CONTENT_TYPE, WireVolume,
};

type Driver<E> = Arc<VolumeDriver<E>>;

/// Build the plugin router around `driver`.
pub fn app<E: MountExecutor + 'static>(driver: Driver<E>) -> Router {
    Router::new()
        .route("/Plugin.Activate", post(activate))
        .route("/VolumeDriver.Create", post(create::<E>))
        .route("/VolumeDriver.List", post(list::<E>))
        .route("/VolumeDriver.Get", post(get::<E>))
        .route("/VolumeDriver.Remove", post(remove::<E>))
        .route("/VolumeDriver.Path", post(path::<E>))
        .route("/VolumeDriver.Mount", post(mount::<E>))
        .route("/VolumeDriver.Unmount", post(unmount::<E>))
        .route("/VolumeDriver.Capabilities", post(capabilities::<E>))
        .layer(TraceLayer::new_for_http())
        .with_state(driver)
}

/// JSON body sent with the plugin content type.
struct PluginJson<T>(T);

impl<T: Serialize> IntoResponse for PluginJson<T> {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, PLUGIN_CONTENT_TYPE)], Json(self.0)).into_response()
    }
}

/// Driver error rendered as a plugin error body.
struct ApiError(OfsError);

impl From<OfsError> for ApiError {
    fn from(err: OfsError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self.0, "Request failed");
        let body = ErrorResponse {
            err: self.0.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, PluginJson(body)).into_response()
    }
}

type ApiResult<T> = Result<PluginJson<T>, ApiError>;

fn decode<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError(e.into()))
}

async fn activate() -> PluginJson<ActivateResponse> {
    tracing::info!("Plugin activated");
    PluginJson(ActivateResponse {
        implements: vec!["VolumeDriver"],
    })
}

async fn create<E: MountExecutor>(State(driver): State<Driver<E>>, body: Bytes) -> ApiResult<Empty> {
    let req: CreateRequest = decode(&body)?;
    driver.create(&req.name, &req.opts.unwrap_or_default()).await?;
    Ok(PluginJson(Empty {}))
}

async fn list<E: MountExecutor>(State(driver): State<Driver<E>>) -> PluginJson<ListResponse> {
    let volumes = driver.list().await.into_iter().map(WireVolume::from).collect();
    PluginJson(ListResponse { volumes })
}

async fn get<E: MountExecutor>(State(driver): State<Driver<E>>, body: Bytes) -> ApiResult<GetResponse> {
    let req: NameRequest = decode(&body)?;
    let volume = driver.get(&req.name).await?.into();
    Ok(PluginJson(GetResponse { volume }))
}

async fn remove<E: MountExecutor>(State(driver): State<Driver<E>>, body: Bytes) -> ApiResult<Empty> {
    let req: NameRequest = decode(&body)?;
    driver.remove(&req.name).await?;
    Ok(PluginJson(Empty {}))
}

async fn path<E: MountExecutor>(
    State(driver): State<Driver<E>>,
    body: Bytes,
) -> ApiResult<MountpointResponse> {
    let req: NameRequest = decode(&body)?;
    let mountpoint = driver.path(&req.name).await?;
    Ok(PluginJson(MountpointResponse {
        mountpoint: mountpoint.display().to_string(),
    }))
}

async fn mount<E: MountExecutor>(
    State(driver): State<Driver<E>>,
    body: Bytes,
) -> ApiResult<MountpointResponse> {
    let req: AttachRequest = decode(&body)?;
    let mountpoint = driver.mount(&req.name, &req.id).await?;
    Ok(PluginJson(MountpointResponse {
        mountpoint: mountpoint.display().to_string(),
    }))
}

async fn unmount<E: MountExecutor>(State(driver): State<Driver<E>>, body: Bytes) -> ApiResult<Empty> {
    let req: AttachRequest = decode(&body)?;
    driver.unmount(&req.name, &req.id).await?;
    Ok(PluginJson(Empty {}))
}

async fn capabilities<E: MountExecutor>(
    State(driver): State<Driver<E>>,
) -> PluginJson<CapabilitiesResponse> {
    PluginJson(driver.capabilities().await.into())
}
