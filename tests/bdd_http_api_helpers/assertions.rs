//! Assertion steps for HTTP API behavioural tests.

use deployhook::server::DeployResponse;
use rstest_bdd_macros::then;

use super::StepResult;
use super::fake_engine::FakeContainer;
use super::state::HttpState;

fn response(http_state: &HttpState) -> StepResult<DeployResponse> {
    http_state
        .response
        .get()
        .ok_or_else(|| String::from("a response should have been received"))
}

fn container(http_state: &HttpState, name: &str) -> StepResult<FakeContainer> {
    http_state
        .engine
        .get()
        .ok_or_else(|| String::from("engine should be configured"))?
        .container(name)
        .ok_or_else(|| format!("container {name} should exist"))
}

#[then("the response status is {status}")]
fn response_status_is(http_state: &HttpState, status: u16) -> StepResult<()> {
    let actual = http_state
        .status
        .get()
        .ok_or_else(|| String::from("a response should have been received"))?;
    if actual == status {
        Ok(())
    } else {
        Err(format!("expected status {status}, got {actual}"))
    }
}

#[then("the response message is {message}")]
fn response_message_is(http_state: &HttpState, message: String) -> StepResult<()> {
    let body = response(http_state)?;
    let expected_error = u8::from(message != "Container Started" && message != "OK");
    if body.message == message && body.error == expected_error {
        Ok(())
    } else {
        Err(format!(
            "expected {{error: {expected_error}, message: {message}}}, got {body:?}"
        ))
    }
}

#[then("container {name} publishes {binding}")]
fn container_publishes(http_state: &HttpState, name: String, binding: String) -> StepResult<()> {
    let found = container(http_state, &name)?;
    if found.running && found.published == vec![binding.clone()] {
        Ok(())
    } else {
        Err(format!("expected running {name} publishing {binding}, got {found:?}"))
    }
}

#[then("container {name} restarts always")]
fn container_restarts_always(http_state: &HttpState, name: String) -> StepResult<()> {
    let found = container(http_state, &name)?;
    match found.restart_policy.as_deref() {
        Some("always") => Ok(()),
        other => Err(format!("expected restart policy always, got {other:?}")),
    }
}

#[then("the engine was not used")]
fn engine_not_used(http_state: &HttpState) -> StepResult<()> {
    let engine = http_state
        .engine
        .get()
        .ok_or_else(|| String::from("engine should be configured"))?;
    if engine.pulls().is_empty() && engine.container_count() == 0 {
        Ok(())
    } else {
        Err(format!(
            "expected no engine activity, got pulls {:?}",
            engine.pulls()
        ))
    }
}
