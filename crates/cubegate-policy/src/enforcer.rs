use cubegate_catalog::CatalogIndex;
use cubegate_core::{CubeQuery, DatabaseConfig, GatewayError, IndexedMember};

/// Enforces governance rules against a parsed query, in a fixed order so
/// the first violation found is always the one reported (spec: strict
/// validation order). `validate` assumes `CubeQuery::from_value` already
/// rejected unknown top-level keys — that is step zero and happens before
/// a `CubeQuery` exists at all.
pub struct PolicyEnforcer;

impl PolicyEnforcer {
    /// Run every governance check. Returns the first failure.
    pub fn validate(
        database: &DatabaseConfig,
        catalog: &CatalogIndex,
        query: &CubeQuery,
    ) -> Result<(), GatewayError> {
        Self::check_limit(database, query)?;
        let members = Self::check_members(database, catalog, query)?;
        Self::check_group_by(query, &members)?;
        Self::check_time_dimension(query, &members)?;
        Ok(())
    }

    fn check_limit(database: &DatabaseConfig, query: &CubeQuery) -> Result<(), GatewayError> {
        let limit = query.limit.ok_or(GatewayError::MissingLimit)?;
        if limit > database.max_limit {
            return Err(GatewayError::LimitTooHigh {
                limit,
                max_limit: database.max_limit,
            });
        }
        Ok(())
    }

    /// Resolves every referenced member, checking unknown -> not-exposed ->
    /// PII -> per-database deny list, in that order, and returns the
    /// resolved set for the later group-by/time-dimension checks.
    fn check_members(
        database: &DatabaseConfig,
        catalog: &CatalogIndex,
        query: &CubeQuery,
    ) -> Result<Vec<IndexedMember>, GatewayError> {
        let mut resolved = Vec::new();
        for name in query.referenced_members() {
            let member = catalog.require(&name)?;
            if !member.exposed {
                return Err(GatewayError::MemberNotExposed(name));
            }
            if member.pii {
                return Err(GatewayError::PiiMemberBlocked(name));
            }
            if database.deny_members.iter().any(|d| d == &name) {
                return Err(GatewayError::PiiMemberBlocked(name));
            }
            resolved.push(member);
        }
        Ok(resolved)
    }

    fn check_group_by(
        query: &CubeQuery,
        members: &[IndexedMember],
    ) -> Result<(), GatewayError> {
        for measure_name in &query.measures {
            let Some(measure) = members.iter().find(|m| &m.name == measure_name) else {
                continue;
            };
            for dimension in query.dimensions.iter().chain(
                query
                    .time_dimensions
                    .iter()
                    .map(|t| &t.dimension),
            ) {
                if let Some(denied) = &measure.denied_group_by {
                    if denied.iter().any(|d| d == dimension) {
                        return Err(GatewayError::GroupByNotAllowed {
                            measure: measure_name.clone(),
                            dimension: dimension.clone(),
                        });
                    }
                }
                if let Some(allowed) = &measure.allowed_group_by {
                    if !allowed.iter().any(|a| a == dimension) {
                        return Err(GatewayError::GroupByNotAllowed {
                            measure: measure_name.clone(),
                            dimension: dimension.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn check_time_dimension(
        query: &CubeQuery,
        members: &[IndexedMember],
    ) -> Result<(), GatewayError> {
        for measure_name in &query.measures {
            let Some(measure) = members.iter().find(|m| &m.name == measure_name) else {
                continue;
            };
            if measure.requires_time_dimension && query.time_dimensions.is_empty() {
                return Err(GatewayError::MissingTimeDimension(measure_name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cubegate_core::{CatalogConfig, ConnectionConfig, DatabaseStatus, MemberOverride};
    use cubegate_cube::{CubeMeta, CubeMetaCube, CubeMetaMember};
    use serde_json::json;

    fn measure(name: &str) -> CubeMetaMember {
        CubeMetaMember {
            name: name.to_string(),
            title: name.to_string(),
            short_title: name.to_string(),
            description: None,
            member_type: Some("count".to_string()),
            agg_type: Some("count".to_string()),
            is_visible: true,
            public: true,
            primary_key: false,
            drill_members: vec![],
            granularities: vec![],
            format: None,
        }
    }

    fn sample_database() -> DatabaseConfig {
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
            deny_members: vec!["Orders.internal_cost".to_string()],
            default_segments: vec![],
            default_filters: vec![],
            return_sql: false,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_catalog() -> cubegate_catalog::CatalogIndex {
        let mut config = CatalogConfig::default();
        config.members.insert(
            "Orders.revenue".to_string(),
            MemberOverride {
                requires_time_dimension: Some(true),
                ..Default::default()
            },
        );
        config.members.insert(
            "Orders.internal_cost".to_string(),
            MemberOverride::default(),
        );
        let meta = CubeMeta {
            cubes: vec![CubeMetaCube {
                name: "Orders".to_string(),
                title: "Orders".to_string(),
                description: None,
                measures: vec![measure("Orders.count"), measure("Orders.revenue"), measure("Orders.internal_cost")],
                dimensions: vec![measure("Orders.status")],
                segments: vec![],
            }],
        };
        cubegate_catalog::CatalogIndex::build(&meta, &config)
    }

    #[test]
    fn rejects_missing_limit() {
        let query = CubeQuery::from_value(&json!({ "measures": ["Orders.count"] })).unwrap();
        let err = PolicyEnforcer::validate(&sample_database(), &sample_catalog(), &query)
            .unwrap_err();
        assert_eq!(err.code(), "MISSING_LIMIT");
    }

    #[test]
    fn rejects_limit_above_max() {
        let query =
            CubeQuery::from_value(&json!({ "measures": ["Orders.count"], "limit": 5000 })).unwrap();
        let err = PolicyEnforcer::validate(&sample_database(), &sample_catalog(), &query)
            .unwrap_err();
        assert_eq!(err.code(), "LIMIT_TOO_HIGH");
    }

    #[test]
    fn rejects_denied_members_before_group_by_checks() {
        let query = CubeQuery::from_value(
            &json!({ "measures": ["Orders.internal_cost"], "limit": 10 }),
        )
        .unwrap();
        let err = PolicyEnforcer::validate(&sample_database(), &sample_catalog(), &query)
            .unwrap_err();
        assert_eq!(err.code(), "PII_MEMBER_BLOCKED");
    }

    #[test]
    fn requires_time_dimension_for_flagged_measures() {
        let query =
            CubeQuery::from_value(&json!({ "measures": ["Orders.revenue"], "limit": 10 }))
                .unwrap();
        let err = PolicyEnforcer::validate(&sample_database(), &sample_catalog(), &query)
            .unwrap_err();
        assert_eq!(err.code(), "MISSING_TIME_DIMENSION");
    }

    #[test]
    fn accepts_a_well_formed_query() {
        let query = CubeQuery::from_value(&json!({
            "measures": ["Orders.count"],
            "dimensions": ["Orders.status"],
            "limit": 10
        }))
        .unwrap();
        assert!(PolicyEnforcer::validate(&sample_database(), &sample_catalog(), &query).is_ok());
    }
}
