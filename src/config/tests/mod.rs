//! Unit tests for deployhook configuration types.
//!
//! - [`helpers`] - Shared fixtures and helper functions
//! - [`types_tests`] - Defaults and TOML deserialisation
//! - [`validation`] - Post-merge normalisation and validation
//! - [`layer_precedence_tests`] - `MergeComposer` layer precedence

mod helpers;
