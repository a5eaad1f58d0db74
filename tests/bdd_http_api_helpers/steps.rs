//! Given/when steps for HTTP API scenarios.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use camino::Utf8PathBuf;
use deployhook::credentials::DockerConfigStore;
use deployhook::deploy::{Provisioner, RegistryPolicy};
use deployhook::server::{API_KEY_HEADER, AppState, DeployResponse, authorizer_for, create_router};
use http_body_util::BodyExt;
use rstest_bdd_macros::{given, when};
use tower::ServiceExt;

use super::StepResult;
use super::state::HttpState;

const REGISTRY: &str = "d.puneet.cc";
const ABSENT_DOCKER_CONFIG: &str = "/nonexistent/deployhook/docker-config";
const SVC1_REQUEST: &str = r#"{
    "name": "svc1",
    "image": "d.puneet.cc/app:latest",
    "portBindings": [{"container": "80", "host": "8080"}]
}"#;

#[given("a webhook without an api key")]
fn given_open_webhook(http_state: &HttpState) {
    let _ = http_state;
}

#[given("a webhook protected by api key {key}")]
fn given_protected_webhook(http_state: &HttpState, key: String) {
    http_state.api_key.set(key);
}

#[given("requests carry api key {key}")]
fn given_requests_carry_key(http_state: &HttpState, key: String) {
    http_state.sent_key.set(key);
}

fn router(http_state: &HttpState) -> StepResult<Router> {
    let engine = http_state
        .engine
        .get()
        .ok_or_else(|| String::from("engine should be configured"))?;
    let provisioner = Provisioner::new(
        engine,
        Arc::new(DockerConfigStore::new(Utf8PathBuf::from(ABSENT_DOCKER_CONFIG))),
        RegistryPolicy::new(REGISTRY),
    );
    let api_key = http_state.api_key.get();
    Ok(create_router(AppState::new(
        Arc::new(provisioner),
        authorizer_for(api_key.as_deref()),
    )))
}

fn send(http_state: &HttpState, request: Request<Body>) -> StepResult<()> {
    let router = router(http_state)?;
    let runtime =
        tokio::runtime::Runtime::new().map_err(|e| format!("failed to create runtime: {e}"))?;

    let (status, bytes) = runtime.block_on(async {
        let response = router
            .oneshot(request)
            .await
            .map_err(|e| format!("router failed: {e}"))?;
        let status = response.status().as_u16();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| format!("failed to read body: {e}"))?
            .to_bytes();
        Ok::<_, String>((status, bytes))
    })?;

    let body: DeployResponse =
        serde_json::from_slice(&bytes).map_err(|e| format!("response is not an envelope: {e}"))?;
    http_state.status.set(status);
    http_state.response.set(body);
    Ok(())
}

fn post(http_state: &HttpState, body: String) -> StepResult<()> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json");
    if let Some(key) = http_state.sent_key.get() {
        builder = builder.header(API_KEY_HEADER, key);
    }
    let request = builder
        .body(Body::from(body))
        .map_err(|e| format!("failed to build request: {e}"))?;
    send(http_state, request)
}

#[when("the svc1 deploy request is posted")]
fn when_svc1_posted(http_state: &HttpState) -> StepResult<()> {
    post(http_state, String::from(SVC1_REQUEST))
}

#[when("a deploy request for image {image} is posted")]
fn when_image_posted(http_state: &HttpState, image: String) -> StepResult<()> {
    post(
        http_state,
        format!(r#"{{"name": "svc1", "image": "{image}"}}"#),
    )
}

#[when("the health endpoint is requested")]
fn when_health_requested(http_state: &HttpState) -> StepResult<()> {
    let request = Request::builder()
        .uri("/healthz")
        .body(Body::empty())
        .map_err(|e| format!("failed to build request: {e}"))?;
    send(http_state, request)
}
