//! CubeGate MCP
//!
//! The MCP server surface: three tools (`catalog_search`, `catalog_describe`,
//! `query_semantic`) dispatched through a per-database handler cache, served
//! over stdio (one handler, resolved at startup) or HTTP with the
//! streamable-session transport (`mcp-session-id`-keyed handler cache).

mod dispatch;
mod factory;
mod handler;
mod http;
mod rpc;
mod stdio;
mod tools;

pub use dispatch::handle_request;
pub use factory::HandlerFactory;
pub use handler::McpHandler;
pub use http::mcp_router;
pub use rpc::{RpcError, RpcRequest, RpcResponse, SESSION_OR_ROUTING_ERROR};
pub use stdio::serve_stdio;
pub use tools::tool_definitions;
