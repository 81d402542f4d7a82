//! CubeGate API
//!
//! The admin REST surface and shared application state for the gateway's
//! HTTP-facing binary. The MCP transports live in `cubegate-mcp`; this
//! crate mounts them onto the same [`AppState`] the admin routes use.

pub mod admin;
mod auth;
mod config;
mod error;
mod slug;
mod state;

pub use admin::admin_router;
pub use config::GatewayConfig;
pub use error::ApiError;
pub use state::AppState;
