use crate::CatalogIndex;
use cubegate_core::GatewayError;
use dashmap::DashMap;

/// Per-database cache of built [`CatalogIndex`]es. A database with no
/// entry here has simply never had its catalog built — every path to a
/// query or a catalog lookup goes through [`CatalogRegistry::get`] and
/// gets `CATALOG_NOT_INITIALIZED` rather than panicking on a missing key.
#[derive(Default)]
pub struct CatalogRegistry {
    indexes: DashMap<String, CatalogIndex>,
}

impl CatalogRegistry {
    pub fn new() -> Self {
        CatalogRegistry {
            indexes: DashMap::new(),
        }
    }

    pub fn get(&self, database_id: &str) -> Result<CatalogIndex, GatewayError> {
        self.indexes
            .get(database_id)
            .map(|r| r.value().clone())
            .ok_or(GatewayError::CatalogNotInitialized)
    }

    pub fn put(&self, database_id: &str, index: CatalogIndex) {
        self.indexes.insert(database_id.to_string(), index);
    }

    pub fn remove(&self, database_id: &str) {
        self.indexes.remove(database_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubegate_core::CatalogConfig;
    use cubegate_cube::CubeMeta;

    #[test]
    fn missing_entry_reports_not_initialized() {
        let registry = CatalogRegistry::new();
        let err = registry.get("db-1").unwrap_err();
        assert_eq!(err.code(), "CATALOG_NOT_INITIALIZED");
    }

    #[test]
    fn put_then_get_round_trips() {
        let registry = CatalogRegistry::new();
        let index = CatalogIndex::build(&CubeMeta::default(), &CatalogConfig::default());
        registry.put("db-1", index);
        assert!(registry.get("db-1").is_ok());
    }
}
