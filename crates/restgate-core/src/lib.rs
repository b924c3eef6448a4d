//! Core types, configuration, and error handling for restgate.
//!
//! This crate provides the building blocks shared by the authentication and
//! HTTP dispatch crates: the environment-driven [`GatewayConfig`], the
//! [`Identity`] returned by a successful authentication, and the
//! infrastructure-level [`GatewayError`].

mod config;
mod error;
mod types;

pub use config::{ApiConfig, ConflictPolicy, GatewayConfig};
pub use error::{GatewayError, GatewayResult};
pub use types::Identity;
