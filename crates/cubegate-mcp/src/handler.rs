use cubegate_catalog::CatalogRegistry;
use cubegate_core::GatewayError;
use cubegate_cube::CubeClient;
use cubegate_registry::RegistryManager;
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Per-database MCP tool handler. One instance is cached per database id
/// (spec: per-database handler cache) so repeated calls against the same
/// database reuse the same catalog lookup path instead of re-resolving it
/// on every request.
#[derive(Clone)]
pub struct McpHandler {
    pub database_id: String,
    pub tenant_id: Option<String>,
    registry: Arc<RegistryManager>,
    catalog: Arc<CatalogRegistry>,
    cube_client: CubeClient,
}

impl McpHandler {
    pub fn new(
        database_id: String,
        tenant_id: Option<String>,
        registry: Arc<RegistryManager>,
        catalog: Arc<CatalogRegistry>,
        cube_client: CubeClient,
    ) -> Self {
        McpHandler {
            database_id,
            tenant_id,
            registry,
            catalog,
            cube_client,
        }
    }

    pub async fn call_tool(&self, name: &str, arguments: &Value) -> Result<Value, GatewayError> {
        match name {
            "catalog_search" => self.catalog_search(arguments),
            "catalog_describe" => self.catalog_describe(arguments),
            "query_semantic" => self.query_semantic(arguments).await,
            other => Err(GatewayError::Validation {
                message: format!("unknown tool \"{other}\""),
                details: None,
            }),
        }
    }

    fn catalog_search(&self, arguments: &Value) -> Result<Value, GatewayError> {
        let query = arguments
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::Validation {
                message: "catalog_search requires a \"query\" string".to_string(),
                details: None,
            })?;
        let limit = arguments
            .get("limit")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_SEARCH_LIMIT as u64) as usize;
        let types = match arguments.get("types") {
            Some(value) => Some(serde_json::from_value(value.clone()).map_err(|e| {
                GatewayError::Validation {
                    message: format!("invalid \"types\": {e}"),
                    details: None,
                }
            })?),
            None => None,
        };
        let cubes = arguments.get("cubes").and_then(Value::as_array).map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        });
        let include_hidden = arguments
            .get("includeHidden")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let filter = cubegate_catalog::SearchFilter {
            types,
            cubes,
            include_hidden,
        };

        let index = self.catalog.get(&self.database_id)?;
        let hits = cubegate_catalog::search(&index, query, limit, &filter);
        Ok(serde_json::json!({ "results": hits }))
    }

    fn catalog_describe(&self, arguments: &Value) -> Result<Value, GatewayError> {
        let member = arguments
            .get("member")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::Validation {
                message: "catalog_describe requires a \"member\" string".to_string(),
                details: None,
            })?;

        let index = self.catalog.get(&self.database_id)?;
        let result = cubegate_catalog::describe(&index, member)?;
        serde_json::to_value(result)
            .map_err(|e| GatewayError::Internal(format!("failed to serialize describe result: {e}")))
    }

    async fn query_semantic(&self, arguments: &Value) -> Result<Value, GatewayError> {
        let database = self
            .registry
            .lookup_database(self.tenant_id.as_deref(), &self.database_id)?;
        let index = self.catalog.get(&self.database_id)?;

        let result = cubegate_policy::QueryPipeline::execute(
            &database,
            &index,
            &self.cube_client,
            arguments,
        )
        .await?;

        serde_json::to_value(result)
            .map_err(|e| GatewayError::Internal(format!("failed to serialize query result: {e}")))
    }
}
