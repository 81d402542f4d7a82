//! CubeGate Cube
//!
//! A thin HTTP client for the upstream cube engine's REST surface
//! (`/meta`, `/load`, `/sql`) and the short-lived JWT each request to it
//! carries.

mod client;
mod jwt;
mod meta;

pub use client::CubeClient;
pub use jwt::mint_database_token;
pub use meta::{CubeMeta, CubeMetaCube, CubeMetaMember};
