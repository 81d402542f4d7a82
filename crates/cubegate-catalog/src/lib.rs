//! CubeGate Catalog
//!
//! Fuses upstream cube-engine `/meta` metadata with per-database governance
//! overrides into a single [`CatalogIndex`], and serves fuzzy search and
//! describe lookups over it.

mod index;
mod registry;
mod search;

pub use index::CatalogIndex;
pub use registry::CatalogRegistry;
pub use search::{describe, search, DescribeResult, SearchFilter, SearchHit};
