//! Protected Resource Metadata (RFC 9728 Section 3).
//!
//! Defines the metadata document served under
//! `/.well-known/oauth-protected-resource` so OAuth clients can discover
//! which authorization server and scopes guard the MCP endpoint.

use serde::{Deserialize, Serialize};
use url::Url;

/// Protected Resource Metadata per RFC 9728 Section 3.
///
/// A deterministic function of configuration, computed once at startup and
/// served unauthenticated: a client must be able to fetch resource metadata
/// before it holds a token.
///
/// # Example
///
/// ```rust
/// use mcp_gateway::oauth::ProtectedResourceMetadata;
///
/// let metadata = ProtectedResourceMetadata::new("https://mcp.example.com/mcp")
///     .authorization_server("https://auth.example.com")
///     .scope("mcp:read")
///     .scope("mcp:write")
///     .resource_name("Example MCP Server")
///     .resource_documentation("https://docs.example.com/mcp");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedResourceMetadata {
    /// The resource server's identifier URL.
    ///
    /// This MUST be the URL the client uses to access the resource.
    pub resource: String,

    /// Authorization server issuer URLs that can issue tokens for this resource.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorization_servers: Vec<String>,

    /// OAuth scopes supported by this resource server.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes_supported: Vec<String>,

    /// Human-readable display name for the resource server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,

    /// URL of documentation for this resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_documentation: Option<String>,

    /// Methods supported for sending bearer tokens.
    ///
    /// Defaults to `["header"]` per RFC 6750.
    #[serde(default = "default_bearer_methods")]
    pub bearer_methods_supported: Vec<String>,
}

fn default_bearer_methods() -> Vec<String> {
    vec!["header".to_string()]
}

impl ProtectedResourceMetadata {
    /// Create new metadata with the resource server's identifier URL.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            authorization_servers: Vec::new(),
            scopes_supported: Vec::new(),
            resource_name: None,
            resource_documentation: None,
            bearer_methods_supported: default_bearer_methods(),
        }
    }

    /// Add an authorization server issuer URL.
    pub fn authorization_server(mut self, issuer_url: impl Into<String>) -> Self {
        self.authorization_servers.push(issuer_url.into());
        self
    }

    /// Add a supported OAuth scope.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes_supported.push(scope.into());
        self
    }

    /// Set the resource display name.
    pub fn resource_name(mut self, name: impl Into<String>) -> Self {
        self.resource_name = Some(name.into());
        self
    }

    /// Set the resource documentation URL.
    pub fn resource_documentation(mut self, url: impl Into<String>) -> Self {
        self.resource_documentation = Some(url.into());
        self
    }

    /// The well-known path this document is served at for the given
    /// resource path, per RFC 9728.
    ///
    /// For a resource mounted at `/mcp` this is
    /// `/.well-known/oauth-protected-resource/mcp`.
    pub fn well_known_path(resource_path: &str) -> String {
        format!(
            "/.well-known/oauth-protected-resource/{}",
            resource_path.trim_start_matches('/')
        )
    }

    /// The absolute URL of the metadata document for this resource,
    /// advertised in `WWW-Authenticate` challenges.
    pub fn metadata_url(&self) -> String {
        match Url::parse(&self.resource) {
            Ok(url) => {
                let origin = url.origin().ascii_serialization();
                format!(
                    "{}{}",
                    origin,
                    Self::well_known_path(url.path())
                )
            }
            Err(_) => self.resource.clone(),
        }
    }
}

/// Join a base URL and a resource path with exactly one slash at the
/// boundary.
///
/// A base without a trailing slash has one appended before resolution, so
/// `https://host` + `/mcp` yields `https://host/mcp`, never `https://host.mcp`
/// or `https://host//mcp`.
pub fn resource_url(base: &str, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base)?.join(path.trim_start_matches('/'))
}
