//! `deployhook` application entry point.
//!
//! Uses `eyre` for opaque error handling at the application boundary,
//! converting domain-specific errors into human-readable reports.
//!
//! Configuration is loaded with layered precedence via `OrthoConfig`:
//! 1. Application defaults
//! 2. Configuration file (`~/.config/deployhook/config.toml` or path from
//!    `DEPLOYHOOK_CONFIG_PATH`)
//! 3. Environment variables (`DEPLOYHOOK_*`)
//! 4. Command-line arguments

use std::sync::Arc;

use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use clap::Parser;
use deployhook::config::{AppConfig, Cli, Commands, DeployArgs, load_config};
use deployhook::credentials::DockerConfigStore;
use deployhook::deploy::{ContainerSpec, DeployRequest, Provisioner, RegistryPolicy};
use deployhook::engine::{EngineConnector, SocketResolver};
use deployhook::server::{self, AppState, DeployResponse, authorizer_for, create_router};
use eyre::{Result as EyreResult, WrapErr, eyre};
use mockable::DefaultEnv;
use tokio::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Application entry point.
///
/// Loads configuration, connects to the container engine, and dispatches to
/// the requested subcommand.
#[tokio::main]
async fn main() -> EyreResult<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let provisioner = build_provisioner(&config).await?;

    match cli.command_or_default() {
        Commands::Serve => serve(&config, provisioner).await,
        Commands::Deploy(args) => deploy_once(&provisioner, &args).await,
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deployhook=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Connect to the engine and locate registry credentials.
async fn build_provisioner(config: &AppConfig) -> EyreResult<Provisioner> {
    let env = DefaultEnv::new();
    let resolver = SocketResolver::new(&env);
    let socket = EngineConnector::resolve_socket(config.engine_socket.as_deref(), &resolver);
    tracing::info!(%socket, "connecting to container engine");
    let docker = EngineConnector::connect_and_verify(&socket).await?;

    let credentials =
        DockerConfigStore::locate(config.registry.docker_config_dir.as_deref(), &env);
    tracing::info!(docker_config = ?credentials.config_dir(), "registry credentials location");

    Ok(Provisioner::new(
        Arc::new(docker),
        Arc::new(credentials),
        RegistryPolicy::new(config.registry.host.as_str()),
    ))
}

async fn serve(config: &AppConfig, provisioner: Provisioner) -> EyreResult<()> {
    let address = config.listen_addr()?;
    let listener = TcpListener::bind(address)
        .await
        .wrap_err_with(|| format!("failed to bind {address}"))?;
    if config.auth.api_key.is_none() {
        tracing::warn!("no api key configured; every request is accepted");
    }

    let state = AppState::new(
        Arc::new(provisioner),
        authorizer_for(config.auth.api_key.as_deref()),
    );
    tracing::info!(registry = %config.registry.host, "accepting deploys");
    server::serve(listener, create_router(state), server::shutdown_signal())
        .await
        .wrap_err("server terminated")
}

/// Run a single deploy from a request file and print the response envelope.
#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
async fn deploy_once(provisioner: &Provisioner, args: &DeployArgs) -> EyreResult<()> {
    let body = read_spec_file(args)?;
    let spec = ContainerSpec::try_from(DeployRequest::from_json(&body)?)?;

    let response = match provisioner.deploy(&spec).await {
        Ok(report) => DeployResponse::success(server::STARTED_MESSAGE)
            .with_warnings(report.advisories().to_vec()),
        Err(error) => DeployResponse::failure(error.to_string()),
    };
    println!("{}", serde_json::to_string(&response)?);

    if response.is_success() {
        Ok(())
    } else {
        Err(eyre!("deploy of '{}' failed", spec.name()))
    }
}

fn read_spec_file(args: &DeployArgs) -> EyreResult<Vec<u8>> {
    let file_name = args
        .spec
        .file_name()
        .ok_or_else(|| eyre!("'{}' does not name a file", args.spec))?;
    let parent = args
        .spec
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .map_or_else(|| camino::Utf8PathBuf::from("."), camino::Utf8Path::to_path_buf);

    let dir = Dir::open_ambient_dir(&parent, ambient_authority())
        .wrap_err_with(|| format!("failed to open {parent}"))?;
    dir.read(file_name)
        .wrap_err_with(|| format!("failed to read {}", args.spec))
}
