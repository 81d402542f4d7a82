use serde::{Deserialize, Serialize};

/// A single measure, dimension, or segment as reported by the cube
/// engine's `/meta` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubeMetaMember {
    pub name: String,
    pub title: String,
    #[serde(rename = "shortTitle", default)]
    pub short_title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub member_type: Option<String>,
    #[serde(rename = "aggType", default)]
    pub agg_type: Option<String>,
    #[serde(rename = "isVisible", default = "default_true")]
    pub is_visible: bool,
    #[serde(default = "default_true")]
    pub public: bool,
    #[serde(rename = "primaryKey", default)]
    pub primary_key: bool,
    #[serde(rename = "drillMembers", default)]
    pub drill_members: Vec<String>,
    #[serde(default)]
    pub granularities: Vec<CubeMetaGranularity>,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubeMetaGranularity {
    pub name: String,
}

fn default_true() -> bool {
    true
}

/// One cube's set of measures/dimensions/segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubeMetaCube {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub measures: Vec<CubeMetaMember>,
    #[serde(default)]
    pub dimensions: Vec<CubeMetaMember>,
    #[serde(default)]
    pub segments: Vec<CubeMetaMember>,
}

/// The full `/meta` response.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CubeMeta {
    #[serde(default)]
    pub cubes: Vec<CubeMetaCube>,
}
