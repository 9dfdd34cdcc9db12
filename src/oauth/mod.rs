//! OAuth 2.1 resource-server support for the MCP gateway.
//!
//! The MCP endpoint acts as a **resource server**: it validates access
//! tokens issued by an external authorization server and serves Protected
//! Resource Metadata for discovery. This module contains everything the
//! gateway needs on that side of the boundary:
//!
//! - **Protected Resource Metadata** ([`ProtectedResourceMetadata`]): the
//!   document served under `/.well-known/oauth-protected-resource` so
//!   clients can discover which authorization server to use (RFC 9728).
//!
//! - **Token Validation** ([`TokenValidator`]): pluggable trait for
//!   validating access tokens. [`JwtValidator`] verifies JWTs with static
//!   keys; [`StaticTokenValidator`] accepts a fixed set of opaque tokens
//!   for development and tests.
//!
//! - **Scope Policy** ([`ScopePolicy`]): default and per-route scope
//!   requirements checked after validation.
//!
//! - **Bearer Guard** ([`BearerGuardLayer`]/[`BearerGuardService`]): tower
//!   middleware that extracts bearer tokens, validates them, checks scopes,
//!   and injects [`AccessTokenContext`] into request extensions.
//!
//! # Discovery Flow
//!
//! 1. Client requests the MCP endpoint without a token
//! 2. Gateway returns `401` with `WWW-Authenticate: Bearer resource_metadata="..."`
//! 3. Client fetches the protected-resource metadata to discover the
//!    authorization server
//! 4. Client obtains a token from the authorization server
//! 5. Client retries with `Authorization: Bearer <token>`

pub mod error;
pub mod guard;
pub mod metadata;
pub mod scope;
pub mod token;

// Re-exports
pub use error::AuthError;
pub use guard::{BearerGuardLayer, BearerGuardService};
pub use metadata::{ProtectedResourceMetadata, resource_url};
pub use scope::{ScopePolicy, ScopeRequirement};
pub use token::{AccessTokenContext, JwtValidator, StaticTokenValidator, TokenValidator};
