//! OAuth authorization-server stub.
//!
//! Every OAuth operation defers to the external authorization-processing
//! backend; the shipped backend answers `501 not_implemented`. Sessions are
//! signed with `SESSION_SECRET`, which is required at startup.

use mcp_gateway::authz::AuthServer;
use mcp_gateway::{AuthServerConfig, BoxError};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcp_gateway=debug,oauth_server=debug,info".into()),
        )
        .init();

    let config = AuthServerConfig::from_env()?;

    tracing::info!(port = config.port, "starting oauth-server");

    AuthServer::new(config).serve().await?;
    Ok(())
}
