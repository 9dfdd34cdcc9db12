//! Configuration for the two services.
//!
//! Both binaries read their configuration from the environment once at
//! startup. Invalid configuration is fatal before the listener binds; the
//! per-request path never re-validates.

use url::Url;

use crate::oauth::{ProtectedResourceMetadata, resource_url};
use crate::secret::SecretString;

/// Default listening port for the MCP server.
pub const DEFAULT_MCP_PORT: u16 = 3001;

/// Default listening port for the authorization-server stub.
pub const DEFAULT_AUTH_PORT: u16 = 3000;

/// Invalid or missing configuration, fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid URL in {name}: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid value in {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Configuration for the MCP server and its gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Listening port.
    pub port: u16,
    /// Public base URL of this resource server.
    pub base_url: Url,
    /// Path the MCP endpoint is mounted at, e.g. `/mcp`.
    pub resource_path: String,
    /// Issuer URL of the authorization server that guards this resource.
    pub issuer: Url,
    /// Scopes this resource server supports.
    pub scopes: Vec<String>,
    /// Human-readable resource display name.
    pub resource_name: String,
    /// Documentation URL advertised in the metadata document.
    pub documentation_url: Option<Url>,
    /// Secret used to verify access-token signatures.
    pub token_secret: SecretString,
    /// Secret used to sign session identifiers.
    pub session_secret: SecretString,
    /// Name reported by the MCP server.
    pub server_name: String,
    /// Version reported by the MCP server.
    pub server_version: String,
}

impl GatewayConfig {
    /// Load from the environment.
    ///
    /// Required: `ISSUER_URL`, `TOKEN_SECRET`, `SESSION_SECRET`. Everything
    /// else has a development default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_port("PORT", DEFAULT_MCP_PORT)?;
        let base_url = parse_url(
            "BASE_MCP_URL",
            std::env::var("BASE_MCP_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
        )?;
        let issuer = parse_url("ISSUER_URL", require("ISSUER_URL")?)?;
        let token_secret = SecretString::new(require("TOKEN_SECRET")?);
        let session_secret = SecretString::new(require("SESSION_SECRET")?);

        let scopes = std::env::var("SCOPES")
            .unwrap_or_else(|_| "mcp:read mcp:write".to_string())
            .split_whitespace()
            .map(String::from)
            .collect();

        let documentation_url = match std::env::var("DOCUMENTATION_URL") {
            Ok(raw) => Some(parse_url("DOCUMENTATION_URL", raw)?),
            Err(_) => None,
        };

        Ok(Self {
            port,
            base_url,
            resource_path: std::env::var("RESOURCE_PATH").unwrap_or_else(|_| "/mcp".to_string()),
            issuer,
            scopes,
            resource_name: std::env::var("RESOURCE_NAME")
                .unwrap_or_else(|_| "MCP Server".to_string()),
            documentation_url,
            token_secret,
            session_secret,
            server_name: std::env::var("SERVER_NAME")
                .unwrap_or_else(|_| env!("CARGO_PKG_NAME").to_string()),
            server_version: std::env::var("SERVER_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
        })
    }

    /// Canonical URL of the protected endpoint, joined with exactly one
    /// slash at the boundary.
    pub fn resource(&self) -> Result<Url, ConfigError> {
        resource_url(self.base_url.as_str(), &self.resource_path).map_err(|source| {
            ConfigError::InvalidUrl {
                name: "BASE_MCP_URL",
                source,
            }
        })
    }

    /// Build the protected-resource metadata document this deployment
    /// serves. Computed once at startup; the responder never recomputes it.
    pub fn metadata(&self) -> Result<ProtectedResourceMetadata, ConfigError> {
        let mut metadata = ProtectedResourceMetadata::new(self.resource()?)
            .authorization_server(self.issuer.as_str())
            .resource_name(&self.resource_name);
        for scope in &self.scopes {
            metadata = metadata.scope(scope);
        }
        if let Some(docs) = &self.documentation_url {
            metadata = metadata.resource_documentation(docs.as_str());
        }
        Ok(metadata)
    }
}

/// Configuration for the authorization-server stub.
#[derive(Debug, Clone)]
pub struct AuthServerConfig {
    /// Listening port.
    pub port: u16,
    /// Secret used to sign session identifiers.
    pub session_secret: SecretString,
    /// Origins allowed to call the credential-bearing endpoints.
    ///
    /// Explicit allow-list; cross-origin requests from anywhere else are
    /// refused rather than reflected back.
    pub allowed_origins: Vec<String>,
}

impl AuthServerConfig {
    /// Load from the environment. Required: `SESSION_SECRET`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: parse_port("PORT", DEFAULT_AUTH_PORT)?,
            session_secret: SecretString::new(require("SESSION_SECRET")?),
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn parse_url(name: &'static str, raw: String) -> Result<Url, ConfigError> {
    Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { name, source })
}

fn parse_port(name: &'static str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        Err(_) => Ok(default),
    }
}
