//! Assertion steps for deployment behavioural tests.

use rstest_bdd_macros::then;

use super::StepResult;
use super::state::{DeployOutcome, DeployState};

fn outcome(deploy_state: &DeployState) -> StepResult<DeployOutcome> {
    deploy_state
        .outcome
        .get()
        .ok_or_else(|| String::from("deploy outcome should be set"))
}

#[then("the deploy succeeds")]
fn deploy_succeeds(deploy_state: &DeployState) -> StepResult<()> {
    match outcome(deploy_state)? {
        DeployOutcome::Started(_) => Ok(()),
        DeployOutcome::Failed(message) => Err(format!("expected success, got error: {message}")),
    }
}

#[then("the deploy fails with an error containing {text}")]
fn deploy_fails_with(deploy_state: &DeployState, text: String) -> StepResult<()> {
    match outcome(deploy_state)? {
        DeployOutcome::Failed(message) if message.contains(&text) => Ok(()),
        DeployOutcome::Failed(message) => {
            Err(format!("expected error containing '{text}', got: {message}"))
        }
        DeployOutcome::Started(id) => Err(format!("expected failure, container {id} started")),
    }
}

#[then("container {name} is running image {image}")]
fn container_is_running(deploy_state: &DeployState, name: String, image: String) -> StepResult<()> {
    let engine = deploy_state
        .engine
        .get()
        .ok_or_else(|| String::from("engine should be configured"))?;
    let container = engine
        .container(&name)
        .ok_or_else(|| format!("container {name} should exist"))?;

    if !container.running {
        return Err(format!("container {name} exists but is not running"));
    }
    if container.image != image {
        return Err(format!(
            "container {name} runs {}, expected {image}",
            container.image
        ));
    }
    Ok(())
}

#[then("the engine holds {count} container")]
fn engine_holds(deploy_state: &DeployState, count: usize) -> StepResult<()> {
    let engine = deploy_state
        .engine
        .get()
        .ok_or_else(|| String::from("engine should be configured"))?;
    let actual = engine.container_count();
    if actual == count {
        Ok(())
    } else {
        Err(format!("expected {count} containers, found {actual}"))
    }
}

#[then("the container id of {name} changed")]
fn container_id_changed(deploy_state: &DeployState, name: String) -> StepResult<()> {
    let started = deploy_state.started_ids.get().unwrap_or_default();
    let [first, second] = started.as_slice() else {
        return Err(format!("expected two successful deploys, got {}", started.len()));
    };
    if first == second {
        return Err(format!("both deploys reported container id {first}"));
    }

    let engine = deploy_state
        .engine
        .get()
        .ok_or_else(|| String::from("engine should be configured"))?;
    let current = engine
        .container(&name)
        .ok_or_else(|| format!("container {name} should exist"))?;
    if &current.id == second {
        Ok(())
    } else {
        Err(format!(
            "engine runs {} but the last deploy started {second}",
            current.id
        ))
    }
}

#[then("no image was pulled")]
fn no_image_pulled(deploy_state: &DeployState) -> StepResult<()> {
    let engine = deploy_state
        .engine
        .get()
        .ok_or_else(|| String::from("engine should be configured"))?;
    let pulls = engine.pulls();
    if pulls.is_empty() {
        Ok(())
    } else {
        Err(format!("expected no pulls, got {pulls:?}"))
    }
}

#[then("the image was pulled as {user}")]
fn image_pulled_as(deploy_state: &DeployState, user: String) -> StepResult<()> {
    let engine = deploy_state
        .engine
        .get()
        .ok_or_else(|| String::from("engine should be configured"))?;
    let pulls = engine.pulls();
    match pulls.as_slice() {
        [(_, Some(username))] if *username == user => Ok(()),
        other => Err(format!("expected one pull as {user}, got {other:?}")),
    }
}
