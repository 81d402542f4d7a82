use crate::{apply_defaults, PolicyEnforcer};
use cubegate_catalog::CatalogIndex;
use cubegate_core::{CubeQuery, DatabaseConfig, GatewayError};
use cubegate_cube::CubeClient;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Which cubes and members a query touched, derived from the catalog index
/// so callers can explain where the returned data came from.
#[derive(Debug, Serialize)]
pub struct QueryLineage {
    pub cubes: Vec<String>,
    pub members: Vec<String>,
}

/// Engine-facing details a caller only needs when debugging a result, kept
/// out of the top-level shape so the common case stays lean.
#[derive(Debug, Serialize)]
pub struct QueryDebug {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<Value>,
    pub cube_query: Value,
    pub query_hash: String,
}

/// Result of running a query through the full pipeline: validate ->
/// apply defaults -> call the cube engine -> decorate.
#[derive(Debug, Serialize)]
pub struct QueryResult {
    pub data: Value,
    pub schema: Value,
    pub normalized_query: Value,
    pub lineage: QueryLineage,
    pub notes: Vec<String>,
    pub debug: QueryDebug,
}

pub struct QueryPipeline;

impl QueryPipeline {
    /// Run one query end-to-end. `raw_query` is the untouched JSON body
    /// from the tool call or REST request.
    pub async fn execute(
        database: &DatabaseConfig,
        catalog: &CatalogIndex,
        cube_client: &CubeClient,
        raw_query: &Value,
    ) -> Result<QueryResult, GatewayError> {
        let mut query = CubeQuery::from_value(raw_query)?;
        PolicyEnforcer::validate(database, catalog, &query)?;

        let mut notes = Vec::new();
        let segments_before: BTreeSet<String> = query.segments.iter().cloned().collect();
        let filters_before: BTreeSet<String> =
            query.filters.iter().map(|f| f.member.clone()).collect();

        apply_defaults(database, catalog, &mut query);

        for segment in &query.segments {
            if !segments_before.contains(segment) {
                notes.push(format!("applied default segment \"{segment}\""));
            }
        }
        for filter in &query.filters {
            if !filters_before.contains(&filter.member) {
                notes.push(format!("applied default filter on \"{}\"", filter.member));
            }
        }

        let jwt_secret = database
            .jwt_secret
            .as_deref()
            .ok_or_else(|| GatewayError::Internal("database has no signing secret".to_string()))?;

        let normalized_query = query.to_value();
        let query_hash = hash_normalized_query(&normalized_query);

        let sql = if database.return_sql {
            Some(cube_client.sql(&database.id, jwt_secret, &normalized_query).await?)
        } else {
            None
        };

        let data = cube_client
            .load(&database.id, jwt_secret, &normalized_query)
            .await?;

        let members = query.referenced_members();
        let resolved: Vec<_> = members.iter().filter_map(|m| catalog.get(m)).collect();

        let cubes: Vec<String> = resolved
            .iter()
            .map(|m| m.cube_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let schema: Value = resolved
            .iter()
            .map(|m| {
                serde_json::json!({
                    "name": m.name,
                    "title": m.title,
                    "type": m.member_type.as_str(),
                })
            })
            .collect();

        let cube_query = normalized_query.clone();

        Ok(QueryResult {
            data,
            schema,
            normalized_query,
            lineage: QueryLineage { cubes, members },
            notes,
            debug: QueryDebug {
                sql,
                cube_query,
                query_hash,
            },
        })
    }
}

/// A stable hash of the normalized query, used by callers to de-duplicate
/// identical requests without re-deriving the canonical JSON themselves.
fn hash_normalized_query(normalized_query: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_query.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
