//! Minimal MCP dispatch for the protected endpoint.
//!
//! The gateway treats MCP dispatch as a downstream collaborator: it receives
//! the request together with the [`AccessTokenContext`] the guard attached
//! and returns an HTTP response. This implementation answers the JSON-RPC
//! methods the echo/greet toolset needs and nothing more.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::JsonRpcError;
use crate::oauth::AccessTokenContext;

/// Protocol revision this dispatch speaks.
pub const PROTOCOL_VERSION: &str = "2025-11-25";

/// A JSON-RPC request as received on the MCP endpoint.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    /// Absent for notifications.
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct EchoInput {
    /// Text to echo back.
    message: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GreetInput {
    /// Name to greet.
    name: String,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Dispatches MCP requests to the registered tools.
#[derive(Debug, Clone)]
pub struct McpHandler {
    server_name: String,
    server_version: String,
}

impl McpHandler {
    /// Create a dispatcher reporting the given server identity.
    pub fn new(server_name: impl Into<String>, server_version: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            server_version: server_version.into(),
        }
    }

    /// Handle one JSON-RPC message.
    ///
    /// Returns `None` for notifications, which expect no response body.
    pub fn handle(&self, request: JsonRpcRequest, auth: &AccessTokenContext) -> Option<Value> {
        // Notifications carry no id and get no response.
        let Some(id) = request.id else {
            tracing::debug!(method = %request.method, "notification received");
            return None;
        };

        tracing::debug!(method = %request.method, subject = %auth.subject, "dispatching");

        let outcome = match request.method.as_str() {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": self.server_name,
                    "version": self.server_version,
                },
            })),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": Self::tool_list() })),
            "tools/call" => self.call_tool(request.params),
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err(error) => json!({ "jsonrpc": "2.0", "id": id, "error": error }),
        })
    }

    fn tool_list() -> Value {
        json!([
            {
                "name": "echo",
                "description": "Echo a message back to the caller",
                "inputSchema": schemars::schema_for!(EchoInput),
            },
            {
                "name": "greet",
                "description": "Greet someone by name",
                "inputSchema": schemars::schema_for!(GreetInput),
            },
        ])
    }

    fn call_tool(&self, params: Value) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;

        let text = match params.name.as_str() {
            "echo" => {
                let input: EchoInput = serde_json::from_value(params.arguments)
                    .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;
                input.message
            }
            "greet" => {
                let input: GreetInput = serde_json::from_value(params.arguments)
                    .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;
                format!("Hello, {}!", input.name)
            }
            other => {
                return Err(JsonRpcError::invalid_params(format!(
                    "Unknown tool: {}",
                    other
                )));
            }
        };

        Ok(json!({ "content": [{ "type": "text", "text": text }] }))
    }
}
