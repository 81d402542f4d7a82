use cubegate_core::{CatalogConfig, GatewayError, IndexedMember, MemberType, QueryFilter};
use cubegate_cube::{CubeMeta, CubeMetaCube, CubeMetaMember};
use dashmap::DashMap;
use std::sync::Arc;

/// The fused member set for one database, rebuilt whenever the upstream
/// schema or the governance config changes. Cheap to clone — the member
/// map is reference-counted. Also carries the catalog-level default
/// segments/filters, since both are sourced from the same `CatalogConfig`
/// the index is built from.
#[derive(Clone)]
pub struct CatalogIndex {
    members: Arc<DashMap<String, IndexedMember>>,
    default_segments: Arc<Vec<String>>,
    default_filters: Arc<Vec<QueryFilter>>,
}

impl CatalogIndex {
    /// Build an index from a freshly fetched `/meta` response and the
    /// database's governance config.
    pub fn build(meta: &CubeMeta, config: &CatalogConfig) -> CatalogIndex {
        let members = DashMap::new();

        for cube in &meta.cubes {
            for m in &cube.measures {
                insert(&members, cube, m, MemberType::Measure, config);
            }
            for d in &cube.dimensions {
                let member_type = if d.member_type.as_deref() == Some("time") {
                    MemberType::TimeDimension
                } else {
                    MemberType::Dimension
                };
                insert(&members, cube, d, member_type, config);
            }
            for s in &cube.segments {
                insert(&members, cube, s, MemberType::Segment, config);
            }
        }

        CatalogIndex {
            members: Arc::new(members),
            default_segments: Arc::new(config.default_segments.clone()),
            default_filters: Arc::new(config.default_filters.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<IndexedMember> {
        self.members.get(name).map(|r| r.value().clone())
    }

    pub fn all(&self) -> Vec<IndexedMember> {
        self.members.iter().map(|r| r.value().clone()).collect()
    }

    pub fn require(&self, name: &str) -> Result<IndexedMember, GatewayError> {
        self.get(name).ok_or_else(|| GatewayError::UnknownMember {
            name: name.to_string(),
            suggestions: crate::search::suggest(self, name, 3),
        })
    }

    /// Catalog-level default segments, merged ahead of the database's own
    /// `default_segments` by the policy enforcer's default-injection step.
    pub fn default_segments(&self) -> &[String] {
        &self.default_segments
    }

    pub fn default_filters(&self) -> &[QueryFilter] {
        &self.default_filters
    }
}

fn insert(
    members: &DashMap<String, IndexedMember>,
    cube: &CubeMetaCube,
    m: &CubeMetaMember,
    member_type: MemberType,
    config: &CatalogConfig,
) {
    let override_ = config.members.get(&m.name);

    let exposed = override_
        .and_then(|o| o.exposed)
        .or(config.defaults.exposed)
        .unwrap_or(true);
    let pii = override_
        .and_then(|o| o.pii)
        .or(config.defaults.pii)
        .unwrap_or(false);
    let description = override_
        .and_then(|o| o.description.clone())
        .or_else(|| m.description.clone());
    let allowed_group_by = override_.and_then(|o| o.allowed_group_by.clone());
    let denied_group_by = override_.and_then(|o| o.denied_group_by.clone());
    let requires_time_dimension = override_
        .and_then(|o| o.requires_time_dimension)
        .unwrap_or(false);

    let indexed = IndexedMember {
        name: m.name.clone(),
        member_type,
        cube_name: cube.name.clone(),
        title: m.title.clone(),
        short_title: if m.short_title.is_empty() {
            m.title.clone()
        } else {
            m.short_title.clone()
        },
        description,
        primary_key: m.primary_key,
        agg_type: m.agg_type.clone(),
        drill_members: m.drill_members.clone(),
        granularities: m.granularities.iter().map(|g| g.name.clone()).collect(),
        format: m.format.clone(),
        is_visible: m.is_visible,
        public: m.public,
        exposed,
        pii,
        allowed_group_by,
        denied_group_by,
        requires_time_dimension,
    };

    members.insert(m.name.clone(), indexed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubegate_core::MemberOverride;

    fn sample_meta() -> CubeMeta {
        CubeMeta {
            cubes: vec![CubeMetaCube {
                name: "Orders".to_string(),
                title: "Orders".to_string(),
                description: None,
                measures: vec![CubeMetaMember {
                    name: "Orders.count".to_string(),
                    title: "Count".to_string(),
                    short_title: "Count".to_string(),
                    description: None,
                    member_type: Some("count".to_string()),
                    agg_type: Some("count".to_string()),
                    is_visible: true,
                    public: true,
                    primary_key: false,
                    drill_members: vec![],
                    granularities: vec![],
                    format: None,
                }],
                dimensions: vec![CubeMetaMember {
                    name: "Orders.email".to_string(),
                    title: "Email".to_string(),
                    short_title: "Email".to_string(),
                    description: None,
                    member_type: Some("string".to_string()),
                    agg_type: None,
                    is_visible: true,
                    public: true,
                    primary_key: false,
                    drill_members: vec![],
                    granularities: vec![],
                    format: None,
                }],
                segments: vec![],
            }],
        }
    }

    #[test]
    fn applies_pii_override() {
        let mut config = CatalogConfig::default();
        config.members.insert(
            "Orders.email".to_string(),
            MemberOverride {
                pii: Some(true),
                ..Default::default()
            },
        );
        let index = CatalogIndex::build(&sample_meta(), &config);
        assert!(index.get("Orders.email").unwrap().pii);
        assert!(!index.get("Orders.count").unwrap().pii);
    }

    #[test]
    fn defaults_apply_when_no_member_override() {
        let mut config = CatalogConfig::default();
        config.defaults.exposed = Some(false);
        let index = CatalogIndex::build(&sample_meta(), &config);
        assert!(!index.get("Orders.count").unwrap().exposed);
    }

    #[test]
    fn unknown_member_reports_suggestions() {
        let index = CatalogIndex::build(&sample_meta(), &CatalogConfig::default());
        let err = index.require("Orders.cuont").unwrap_err();
        match err {
            GatewayError::UnknownMember { suggestions, .. } => {
                assert!(suggestions.contains(&"Orders.count".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
