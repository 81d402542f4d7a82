use cubegate_catalog::CatalogIndex;
use cubegate_core::{CubeQuery, DatabaseConfig};

/// Inject default segments and filters, skipping anything the caller
/// already specified for the same member. Defaults come from the catalog
/// config first; anything it doesn't cover falls back to the database's
/// own `default_segments`/`default_filters`. Runs after validation —
/// defaults are never checked against governance rules, only the caller's
/// explicit query is.
pub fn apply_defaults(database: &DatabaseConfig, catalog: &CatalogIndex, query: &mut CubeQuery) {
    for segment in catalog
        .default_segments()
        .iter()
        .chain(database.default_segments.iter())
    {
        if !query.segments.iter().any(|s| s == segment) {
            query.segments.push(segment.clone());
        }
    }

    for default_filter in catalog
        .default_filters()
        .iter()
        .chain(database.default_filters.iter())
    {
        let already_filtered = query
            .filters
            .iter()
            .any(|f| f.member == default_filter.member);
        if !already_filtered {
            query.filters.push(default_filter.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cubegate_core::{CatalogConfig, ConnectionConfig, DatabaseStatus, QueryFilter};
    use cubegate_cube::CubeMeta;
    use serde_json::json;

    fn empty_catalog() -> CatalogIndex {
        CatalogIndex::build(&CubeMeta { cubes: vec![] }, &CatalogConfig::default())
    }

    fn catalog_with_defaults(config: CatalogConfig) -> CatalogIndex {
        CatalogIndex::build(&CubeMeta { cubes: vec![] }, &config)
    }

    fn database_with_defaults() -> DatabaseConfig {
        let now = Utc::now();
        DatabaseConfig {
            id: "db-1".to_string(),
            slug: "db-1".to_string(),
            tenant_id: None,
            name: "Sample".to_string(),
            description: None,
            status: DatabaseStatus::Active,
            connection: ConnectionConfig::Postgres {
                host: "localhost".to_string(),
                port: 5432,
                database: "d".to_string(),
                user: "u".to_string(),
                password: None,
                ssl: None,
            },
            cube_api_url: None,
            jwt_secret: None,
            max_limit: 1000,
            deny_members: vec![],
            default_segments: vec!["Orders.active".to_string()],
            default_filters: vec![QueryFilter {
                member: "Orders.deleted".to_string(),
                operator: "equals".to_string(),
                values: Some(vec!["false".to_string()]),
            }],
            return_sql: false,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn injects_defaults_not_already_present() {
        let database = database_with_defaults();
        let mut query =
            CubeQuery::from_value(&json!({ "measures": ["Orders.count"], "limit": 10 })).unwrap();
        apply_defaults(&database, &empty_catalog(), &mut query);
        assert_eq!(query.segments, vec!["Orders.active".to_string()]);
        assert_eq!(query.filters.len(), 1);
    }

    #[test]
    fn does_not_duplicate_an_explicit_filter_on_the_same_member() {
        let database = database_with_defaults();
        let mut query = CubeQuery::from_value(&json!({
            "measures": ["Orders.count"],
            "limit": 10,
            "filters": [{ "member": "Orders.deleted", "operator": "equals", "values": ["true"] }]
        }))
        .unwrap();
        apply_defaults(&database, &empty_catalog(), &mut query);
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.filters[0].values, Some(vec!["true".to_string()]));
    }

    #[test]
    fn catalog_defaults_merge_with_and_take_priority_over_database_defaults() {
        let database = database_with_defaults();
        let catalog = catalog_with_defaults(CatalogConfig {
            default_segments: vec!["Orders.recent".to_string()],
            default_filters: vec![QueryFilter {
                member: "Orders.deleted".to_string(),
                operator: "equals".to_string(),
                values: Some(vec!["catalog-wins".to_string()]),
            }],
            ..Default::default()
        });
        let mut query =
            CubeQuery::from_value(&json!({ "measures": ["Orders.count"], "limit": 10 })).unwrap();
        apply_defaults(&database, &catalog, &mut query);

        assert_eq!(
            query.segments,
            vec!["Orders.recent".to_string(), "Orders.active".to_string()]
        );
        assert_eq!(query.filters.len(), 1);
        assert_eq!(
            query.filters[0].values,
            Some(vec!["catalog-wins".to_string()])
        );
    }
}
