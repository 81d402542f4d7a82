//! CubeGate Policy
//!
//! Governance rule enforcement in the spec's fixed validation order, default
//! segment/filter injection, and the query pipeline that ties validation,
//! normalization, the upstream cube-engine call, and response decoration
//! together.

mod defaults;
mod enforcer;
mod pipeline;

pub use defaults::apply_defaults;
pub use enforcer::PolicyEnforcer;
pub use pipeline::{QueryPipeline, QueryResult};
