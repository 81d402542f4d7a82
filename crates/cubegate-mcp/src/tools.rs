use serde_json::{json, Value};

/// The three tools this server exposes, in MCP `tools/list` shape.
pub fn tool_definitions() -> Value {
    json!([
        {
            "name": "catalog_search",
            "description": "Fuzzy-search exposed, non-PII measures, dimensions, and segments by name, title, or description.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "types": {
                        "type": "array",
                        "items": { "enum": ["measure", "dimension", "segment", "timeDimension"] }
                    },
                    "cubes": { "type": "array", "items": { "type": "string" } },
                    "includeHidden": { "type": "boolean" },
                    "limit": { "type": "integer", "minimum": 1, "maximum": 50 }
                },
                "required": ["query"]
            }
        },
        {
            "name": "catalog_describe",
            "description": "Describe a single measure, dimension, or segment, including related members in the same cube.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "member": { "type": "string" }
                },
                "required": ["member"]
            }
        },
        {
            "name": "query_semantic",
            "description": "Execute a governed semantic query against the cube engine and return its results with lineage and notes. The query fields (measures, dimensions, timeDimensions, filters, segments, order, limit, offset) go directly at the top level, Cube.js-shaped.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "measures": { "type": "array", "items": { "type": "string" } },
                    "dimensions": { "type": "array", "items": { "type": "string" } },
                    "limit": { "type": "integer" }
                }
            }
        }
    ])
}
