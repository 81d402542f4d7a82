use crate::handler::McpHandler;
use crate::rpc::{RpcError, RpcRequest, RpcResponse};
use crate::tools::tool_definitions;
use serde_json::{json, Value};

const PROTOCOL_VERSION: &str = "2024-11-05";

/// Dispatch one JSON-RPC request against a database-bound handler. Method
/// routing errors (`initialize`/`tools/list`/`tools/call` are the only
/// methods this server understands) come back as JSON-RPC errors; a
/// failure *inside* a tool call comes back as a successful RPC response
/// whose result carries `isError: true`, per the MCP tool-call convention
/// — the caller's session is fine, the tool call just failed.
pub async fn handle_request(request: RpcRequest, handler: &McpHandler) -> RpcResponse {
    let id = request.id.clone().unwrap_or(Value::Null);

    match request.method.as_str() {
        "initialize" => RpcResponse::ok(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": { "name": "cubegate", "version": env!("CARGO_PKG_VERSION") },
            }),
        ),
        "tools/list" => RpcResponse::ok(id, json!({ "tools": tool_definitions() })),
        "tools/call" => handle_tool_call(id, request.params, handler).await,
        "ping" => RpcResponse::ok(id, json!({})),
        other => RpcResponse::err(id, RpcError::method_not_found(other)),
    }
}

async fn handle_tool_call(id: Value, params: Value, handler: &McpHandler) -> RpcResponse {
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return RpcResponse::err(
            id,
            RpcError::invalid_params("tools/call requires a \"name\" string"),
        );
    };
    let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

    match handler.call_tool(name, &arguments).await {
        Ok(result) => RpcResponse::ok(
            id,
            json!({
                "content": [{ "type": "text", "text": result.to_string() }],
                "structuredContent": result,
                "isError": false,
            }),
        ),
        Err(e) => {
            let tool_error = e.as_tool_error();
            RpcResponse::ok(
                id,
                json!({
                    "content": [{ "type": "text", "text": tool_error.message }],
                    "structuredContent": { "error": tool_error },
                    "isError": true,
                }),
            )
        }
    }
}
