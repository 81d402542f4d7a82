//! Deployment configuration, read once at startup from the environment.

use std::path::PathBuf;

/// All knobs the server binary reads from the environment (spec §6).
/// Every field has a default so a bare `cubegate-server` runs self-hosted
/// against an in-tree SQLite file with no further setup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub data_dir: PathBuf,
    pub registry_db_path: PathBuf,
    pub cube_api_url: Option<String>,
    pub cube_jwt_secret: Option<String>,
    pub admin_secret: Option<String>,
    pub auth_enabled: bool,
    pub mcp_stdio_enabled: bool,
    pub mcp_http_enabled: bool,
    pub mcp_http_host: String,
    pub mcp_http_port: u16,
    pub docker_bridge: bool,
    pub default_max_limit: u64,
    /// Database the stdio transport binds to at startup (it has no session
    /// header to route by, unlike the HTTP transport). Falls back to the
    /// tenant-less `default` database when unset.
    pub stdio_database_id: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            data_dir: PathBuf::from("./data"),
            registry_db_path: PathBuf::from("./cubegate.db"),
            cube_api_url: None,
            cube_jwt_secret: None,
            admin_secret: None,
            auth_enabled: false,
            mcp_stdio_enabled: true,
            mcp_http_enabled: true,
            mcp_http_host: "0.0.0.0".to_string(),
            mcp_http_port: 4100,
            docker_bridge: true,
            default_max_limit: 10_000,
            stdio_database_id: None,
        }
    }
}

impl GatewayConfig {
    /// Build a config from the environment, falling back to defaults for
    /// anything unset.
    pub fn from_env() -> Self {
        let default = GatewayConfig::default();
        GatewayConfig {
            data_dir: env_var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.data_dir),
            registry_db_path: env_var("DATABASE_URL")
                .map(PathBuf::from)
                .unwrap_or(default.registry_db_path),
            cube_api_url: env_var("CUBE_API_URL"),
            cube_jwt_secret: env_var("CUBE_JWT_SECRET"),
            admin_secret: env_var("ADMIN_SECRET"),
            auth_enabled: env_parse("AUTH_ENABLED", default.auth_enabled),
            mcp_stdio_enabled: env_parse("MCP_STDIO_ENABLED", default.mcp_stdio_enabled),
            mcp_http_enabled: env_parse("MCP_HTTP_ENABLED", default.mcp_http_enabled),
            mcp_http_host: env_var("MCP_HTTP_HOST").unwrap_or(default.mcp_http_host),
            mcp_http_port: env_parse("MCP_HTTP_PORT", default.mcp_http_port),
            docker_bridge: !env_parse("CUBE_COLOCATED", false),
            default_max_limit: default.default_max_limit,
            stdio_database_id: env_var("MCP_STDIO_DATABASE_ID"),
        }
    }

    /// Refuse to start with a configuration that cannot serve anything
    /// (spec exit code 1: "both transports disabled").
    pub fn validate(&self) -> Result<(), String> {
        if !self.mcp_stdio_enabled && !self.mcp_http_enabled {
            return Err("both MCP_STDIO_ENABLED and MCP_HTTP_ENABLED are false".to_string());
        }
        Ok(())
    }

    /// The key material the registry store derives its encryption key
    /// from. Absence of `ADMIN_SECRET` means connection secrets are still
    /// encrypted (the storage layer always runs AES-GCM), but under a
    /// fixed, well-known key rather than an operator-controlled one — a
    /// deliberate simplification of the spec's "absence ⇒ plaintext"
    /// wording, recorded in DESIGN.md.
    pub fn encryption_secret(&self) -> Vec<u8> {
        self.admin_secret
            .clone()
            .unwrap_or_else(|| "cubegate-unconfigured-admin-secret".to_string())
            .into_bytes()
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
