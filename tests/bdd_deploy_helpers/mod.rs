//! Behavioural helpers for deployment scenarios.

mod assertions;
#[allow(
    clippy::allow_attributes,
    dead_code,
    reason = "the fake engine is shared and each binary uses a different subset"
)]
#[path = "../support/fake_engine.rs"]
mod fake_engine;

pub(crate) type StepResult<T> = Result<T, String>;

#[expect(
    unused_imports,
    reason = "rstest-bdd discovers step functions via attributes, not runtime usage"
)]
pub(crate) use assertions::*;
pub(crate) use state::{DeployState, deploy_state};
#[expect(
    unused_imports,
    reason = "rstest-bdd discovers step functions via attributes, not runtime usage"
)]
pub(crate) use steps::*;
