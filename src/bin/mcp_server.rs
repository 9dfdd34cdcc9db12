//! MCP server protected by the bearer-token gateway.
//!
//! Configuration comes from the environment; `ISSUER_URL`, `TOKEN_SECRET`,
//! and `SESSION_SECRET` are required and the process refuses to start
//! without them.
//!
//! Test with curl:
//!
//! ```bash
//! # 1. Discover the authorization server (public endpoint)
//! curl http://localhost:3001/.well-known/oauth-protected-resource/mcp
//!
//! # 2. Attempt without a token (401 with WWW-Authenticate challenge)
//! curl -v -X POST http://localhost:3001/mcp \
//!   -H "Content-Type: application/json" \
//!   -d '{"jsonrpc":"2.0","id":1,"method":"tools/list"}'
//!
//! # 3. Retry with a bearer token issued by the authorization server
//! curl -X POST http://localhost:3001/mcp \
//!   -H "Content-Type: application/json" \
//!   -H "Authorization: Bearer <token>" \
//!   -d '{"jsonrpc":"2.0","id":1,"method":"tools/list"}'
//! ```

use mcp_gateway::oauth::JwtValidator;
use mcp_gateway::{BoxError, Gateway, GatewayConfig};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcp_gateway=debug,mcp_server=debug,info".into()),
        )
        .init();

    let config = GatewayConfig::from_env()?;
    let resource = config.resource()?;

    let validator = JwtValidator::from_secret(config.token_secret.as_bytes())
        .expected_issuer(config.issuer.as_str())
        .expected_audience(resource.as_str());

    tracing::info!(%resource, issuer = %config.issuer, "starting mcp-server");

    Gateway::new(config, validator).serve().await?;
    Ok(())
}
