//! Deployment webhook for containers hosted on a private registry.
//!
//! `deployhook` accepts a JSON container description over HTTP, pulls the
//! image from the private registry using locally stored Docker credentials,
//! replaces any existing container of the same name, and starts the new one
//! with an `always` restart policy.
//!
//! # Modules
//!
//! - [`config`]: Layered configuration (CLI > env > file > defaults)
//! - [`credentials`]: Registry credential resolution from Docker client config
//! - [`deploy`]: Request validation and the provisioning sequence
//! - [`engine`]: Container engine connection and lifecycle calls
//! - [`error`]: Semantic error types for the application
//! - [`server`]: HTTP routes, authorisation, and response envelopes

pub mod config;
pub mod credentials;
pub mod deploy;
pub mod engine;
pub mod error;
pub mod server;
