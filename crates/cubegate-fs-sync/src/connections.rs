use crate::atomic::write_atomic;
use cubegate_core::{ConnectionConfig, DatabaseConfig};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;

/// Hostnames that mean "the machine this process is running on" and need
/// rewriting when the cube engine itself runs inside a Docker container
/// with its own network namespace.
const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1"];
const DOCKER_BRIDGE_HOST: &str = "host.docker.internal";
const CONNECTIONS_FILE_NAME: &str = "cube-connections.json";

/// Rewrite a loopback host to the Docker bridge hostname when
/// `docker_bridge` is enabled. Leaves any other host untouched.
pub fn rewrite_host_for_docker_bridge(host: &str, docker_bridge: bool) -> String {
    if docker_bridge && LOOPBACK_HOSTS.contains(&host) {
        DOCKER_BRIDGE_HOST.to_string()
    } else {
        host.to_string()
    }
}

fn rewritten_connection(connection: &ConnectionConfig, docker_bridge: bool) -> ConnectionConfig {
    let mut copy = connection.clone();
    match &mut copy {
        ConnectionConfig::Postgres { host, .. }
        | ConnectionConfig::Mysql { host, .. }
        | ConnectionConfig::Redshift { host, .. }
        | ConnectionConfig::Clickhouse { host, .. } => {
            *host = rewrite_host_for_docker_bridge(host, docker_bridge);
        }
        ConnectionConfig::Bigquery { .. } | ConnectionConfig::Snowflake { .. } => {}
    }
    copy
}

/// Write the connections file: an object keyed by database id, one entry
/// per active database, with loopback hosts rewritten for the Docker
/// bridge when enabled.
pub fn sync_connections_to_disk(
    base_dir: &Path,
    databases: &[DatabaseConfig],
    docker_bridge: bool,
) -> io::Result<()> {
    let entries: BTreeMap<String, ConnectionConfig> = databases
        .iter()
        .map(|db| (db.id.clone(), rewritten_connection(&db.connection, docker_bridge)))
        .collect();

    let json = serde_json::to_string_pretty(&entries)
        .expect("connection entries always serialize to JSON");
    write_atomic(&base_dir.join(CONNECTIONS_FILE_NAME), &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cubegate_core::DatabaseStatus;
    use tempfile::tempdir;

    fn database(host: &str) -> DatabaseConfig {
        let now = Utc::now();
        DatabaseConfig {
            id: "db-1".to_string(),
            slug: "db-1".to_string(),
            tenant_id: None,
            name: "Sample".to_string(),
            description: None,
            status: DatabaseStatus::Active,
            connection: ConnectionConfig::Postgres {
                host: host.to_string(),
                port: 5432,
                database: "d".to_string(),
                user: "u".to_string(),
                password: Some("hunter2".to_string()),
                ssl: None,
            },
            cube_api_url: None,
            jwt_secret: None,
            max_limit: 1000,
            deny_members: vec![],
            default_segments: vec![],
            default_filters: vec![],
            return_sql: false,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn rewrites_loopback_host_when_bridge_enabled() {
        assert_eq!(
            rewrite_host_for_docker_bridge("localhost", true),
            "host.docker.internal"
        );
        assert_eq!(rewrite_host_for_docker_bridge("localhost", false), "localhost");
        assert_eq!(
            rewrite_host_for_docker_bridge("db.internal.example.com", true),
            "db.internal.example.com"
        );
    }

    #[test]
    fn writes_a_connections_file_with_rewritten_host() {
        let base = tempdir().unwrap();
        sync_connections_to_disk(base.path(), &[database("localhost")], true).unwrap();

        let raw = std::fs::read_to_string(base.path().join(CONNECTIONS_FILE_NAME)).unwrap();
        assert!(raw.contains("host.docker.internal"));
        assert!(!raw.contains("\"localhost\""));
    }

    #[test]
    fn connections_file_is_an_object_keyed_by_database_id() {
        let base = tempdir().unwrap();
        sync_connections_to_disk(base.path(), &[database("localhost")], false).unwrap();

        let raw = std::fs::read_to_string(base.path().join(CONNECTIONS_FILE_NAME)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.is_object());
        assert!(value.get("db-1").is_some());
    }
}
