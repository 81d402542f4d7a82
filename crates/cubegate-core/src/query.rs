//! The semantic query wire contract (spec §6) and its strict-keys parser.

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level keys an incoming query may carry. Anything else is rejected
/// with `QUERY_KEY_NOT_ALLOWED` before any other validation runs.
pub const ALLOWED_TOP_LEVEL_KEYS: &[&str] = &[
    "measures",
    "dimensions",
    "timeDimensions",
    "filters",
    "segments",
    "order",
    "limit",
    "offset",
];

/// One `timeDimensions[]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeDimensionInput {
    pub dimension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "dateRange")]
    pub date_range: Option<Value>,
}

/// A query filter as received on the wire. `dimension` is accepted as a
/// legacy alias for `member`.
#[derive(Debug, Clone, Deserialize)]
struct QueryFilterInput {
    member: Option<String>,
    dimension: Option<String>,
    operator: String,
    #[serde(default)]
    values: Option<Vec<String>>,
}

/// A semantic query, normalized from the raw JSON body. Construction via
/// [`CubeQuery::from_value`] is the only path — it enforces the strict
/// top-level key allowlist the raw `serde_json::Value` form needs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CubeQuery {
    #[serde(default)]
    pub measures: Vec<String>,
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default, rename = "timeDimensions")]
    pub time_dimensions: Vec<TimeDimensionInput>,
    #[serde(default)]
    pub filters: Vec<crate::types::QueryFilter>,
    #[serde(default)]
    pub segments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Value>,
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl CubeQuery {
    /// Parse a raw JSON query body, rejecting any top-level key outside
    /// [`ALLOWED_TOP_LEVEL_KEYS`] with `QUERY_KEY_NOT_ALLOWED`.
    pub fn from_value(value: &Value) -> Result<CubeQuery, GatewayError> {
        let obj = value.as_object().ok_or_else(|| GatewayError::Validation {
            message: "query body must be a JSON object".to_string(),
            details: None,
        })?;

        for key in obj.keys() {
            if !ALLOWED_TOP_LEVEL_KEYS.contains(&key.as_str()) {
                return Err(GatewayError::QueryKeyNotAllowed(key.clone()));
            }
        }

        let measures = string_array(obj.get("measures"))?;
        let dimensions = string_array(obj.get("dimensions"))?;
        let segments = string_array(obj.get("segments"))?;

        let time_dimensions = match obj.get("timeDimensions") {
            None | Some(Value::Null) => Vec::new(),
            Some(v) => serde_json::from_value::<Vec<TimeDimensionInput>>(v.clone()).map_err(
                |e| GatewayError::Validation {
                    message: format!("invalid timeDimensions: {e}"),
                    details: None,
                },
            )?,
        };

        let filters = match obj.get("filters") {
            None | Some(Value::Null) => Vec::new(),
            Some(v) => {
                let raw: Vec<QueryFilterInput> =
                    serde_json::from_value(v.clone()).map_err(|e| GatewayError::Validation {
                        message: format!("invalid filters: {e}"),
                        details: None,
                    })?;
                raw.into_iter()
                    .map(|f| {
                        let member = f.member.or(f.dimension).ok_or_else(|| {
                            GatewayError::Validation {
                                message: "filter is missing \"member\"".to_string(),
                                details: None,
                            }
                        })?;
                        Ok(crate::types::QueryFilter {
                            member,
                            operator: f.operator,
                            values: f.values,
                        })
                    })
                    .collect::<Result<Vec<_>, GatewayError>>()?
            }
        };

        let limit = match obj.get("limit") {
            None | Some(Value::Null) => None,
            Some(v) => Some(v.as_u64().ok_or_else(|| GatewayError::Validation {
                message: "limit must be a non-negative integer".to_string(),
                details: None,
            })?),
        };

        let offset = match obj.get("offset") {
            None | Some(Value::Null) => None,
            Some(v) => Some(v.as_u64().ok_or_else(|| GatewayError::Validation {
                message: "offset must be a non-negative integer".to_string(),
                details: None,
            })?),
        };

        Ok(CubeQuery {
            measures,
            dimensions,
            time_dimensions,
            filters,
            segments,
            order: obj.get("order").cloned(),
            limit,
            offset,
        })
    }

    /// Every member name referenced anywhere in the query: measures,
    /// dimensions, segments, `timeDimensions[*].dimension`, and
    /// `filters[*].member`.
    pub fn referenced_members(&self) -> Vec<String> {
        let mut out = Vec::new();
        out.extend(self.measures.iter().cloned());
        out.extend(self.dimensions.iter().cloned());
        out.extend(self.segments.iter().cloned());
        out.extend(self.time_dimensions.iter().map(|t| t.dimension.clone()));
        out.extend(self.filters.iter().map(|f| f.member.clone()));
        out
    }

    /// Serialize back to a plain JSON object, e.g. for `normalized_query`.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("CubeQuery always serializes")
    }
}

fn string_array(value: Option<&Value>) -> Result<Vec<String>, GatewayError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(v) => serde_json::from_value(v.clone()).map_err(|e| GatewayError::Validation {
            message: format!("expected an array of strings: {e}"),
            details: None,
        }),
    }
}
