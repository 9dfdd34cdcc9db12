//! # mcp-gateway
//!
//! Bearer-token gateway, signed sessions, and OAuth Protected Resource
//! Metadata for MCP servers, built on [Tower](https://docs.rs/tower) and
//! [axum](https://docs.rs/axum).
//!
//! The repository wires two small HTTP services:
//!
//! - **mcp-server**: an MCP tool endpoint protected by a bearer guard, with
//!   RFC 9728 discovery metadata served unauthenticated alongside it.
//! - **oauth-server**: an authorization-server stub that defers every OAuth
//!   operation to an external processing backend behind
//!   [`authz::AuthorizationBackend`].
//!
//! ## Request lifecycle
//!
//! Every request first resolves a signed, store-backed session. Requests to
//! the protected route additionally pass the bearer guard, which validates
//! the token and attaches an [`oauth::AccessTokenContext`] before dispatch.
//! Session and token are orthogonal: either may be present without the
//! other.
//!
//! ```text
//! RECEIVED -> SESSION_RESOLVED -> AUTH_CHECKED -> DISPATCHED -> RESPONDED
//!                                     |
//!                                     v (guard failure)
//!                                  REJECTED (401/403 + WWW-Authenticate)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mcp_gateway::{Gateway, GatewayConfig, oauth::JwtValidator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mcp_gateway::BoxError> {
//!     let config = GatewayConfig::from_env()?;
//!
//!     let validator = JwtValidator::from_secret(config.token_secret.as_bytes())
//!         .expected_issuer(config.issuer.as_str())
//!         .expected_audience(config.resource()?.as_str());
//!
//!     Gateway::new(config, validator).serve().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Key Types
//!
//! - [`Gateway`] - composes guard, sessions, metadata, and MCP dispatch
//!   into one router
//! - [`oauth::BearerGuardLayer`] - tower middleware validating bearer tokens
//! - [`oauth::ProtectedResourceMetadata`] - RFC 9728 discovery document
//! - [`session::SessionLayer`] - signed, store-backed session middleware
//! - [`session::SessionStore`] - pluggable persistence contract, with
//!   [`session::MemoryStore`] as the in-process default
//! - [`authz::AuthServer`] - the authorization-server stub application

pub mod authz;
pub mod config;
pub mod error;
pub mod gateway;
pub mod mcp;
pub mod oauth;
pub mod secret;
pub mod session;

// Re-exports
pub use config::{AuthServerConfig, ConfigError, GatewayConfig};
pub use error::{BoxError, Error, Result};
pub use gateway::Gateway;
pub use secret::SecretString;
