use cubegate_core::{ConnectionConfig, GatewayError};

/// Structural check of a connection config: every variant's required
/// fields are present and non-empty. This is what `test_connection`
/// reduces to in the gateway — real connectivity to the warehouse is the
/// cube engine's job, exercised the first time the database is activated
/// and its schema is loaded.
pub fn validate_connection_shape(connection: &ConnectionConfig) -> Result<(), GatewayError> {
    let missing = |field: &str| {
        GatewayError::Validation {
            message: format!("connection is missing required field \"{field}\""),
            details: None,
        }
    };

    match connection {
        ConnectionConfig::Postgres {
            host,
            database,
            user,
            ..
        }
        | ConnectionConfig::Mysql {
            host,
            database,
            user,
            ..
        }
        | ConnectionConfig::Redshift {
            host,
            database,
            user,
            ..
        }
        | ConnectionConfig::Clickhouse {
            host,
            database,
            user,
            ..
        } => {
            if host.trim().is_empty() {
                return Err(missing("host"));
            }
            if database.trim().is_empty() {
                return Err(missing("database"));
            }
            if user.trim().is_empty() {
                return Err(missing("user"));
            }
        }
        ConnectionConfig::Bigquery {
            project_id,
            dataset,
            ..
        } => {
            if project_id.trim().is_empty() {
                return Err(missing("projectId"));
            }
            if dataset.trim().is_empty() {
                return Err(missing("dataset"));
            }
        }
        ConnectionConfig::Snowflake {
            account,
            warehouse,
            database,
            user,
            ..
        } => {
            if account.trim().is_empty() {
                return Err(missing("account"));
            }
            if warehouse.trim().is_empty() {
                return Err(missing("warehouse"));
            }
            if database.trim().is_empty() {
                return Err(missing("database"));
            }
            if user.trim().is_empty() {
                return Err(missing("user"));
            }
        }
    }
    Ok(())
}
