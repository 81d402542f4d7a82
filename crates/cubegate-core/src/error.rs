//! Flat error taxonomy shared by every layer of the gateway.
//!
//! Component-internal code raises a `GatewayError`; the HTTP and MCP layers
//! are the only sites allowed to translate a variant into a status code or
//! JSON-RPC error object. No raw strings cross a crate boundary.

use serde::Serialize;

/// One entry per error code in the governance/catalog/registry/auth/upstream
/// taxonomy. `code()` returns the wire-stable string used in log lines and
/// response bodies.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    // --- Governance ---
    #[error("query is missing a required \"limit\"")]
    MissingLimit,

    #[error("limit {limit} exceeds the configured maximum of {max_limit}")]
    LimitTooHigh { limit: u64, max_limit: u64 },

    #[error("query key \"{0}\" is not allowed")]
    QueryKeyNotAllowed(String),

    #[error("unknown member \"{name}\"")]
    UnknownMember {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("member \"{0}\" is not exposed")]
    MemberNotExposed(String),

    #[error("member \"{0}\" is marked as PII and cannot be queried")]
    PiiMemberBlocked(String),

    #[error("dimension \"{dimension}\" is not an allowed group-by for \"{measure}\"")]
    GroupByNotAllowed { measure: String, dimension: String },

    #[error("measure \"{0}\" requires a time dimension")]
    MissingTimeDimension(String),

    // --- Catalog ---
    #[error("catalog index has not been built yet")]
    CatalogNotInitialized,

    #[error("upstream cube engine metadata is unavailable: {0}")]
    UpstreamMetaUnavailable(String),

    // --- Registry ---
    #[error("duplicate id \"{0}\"")]
    DuplicateId(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database \"{0}\" is active and cannot be deleted")]
    ActiveCannotDelete(String),

    #[error("database \"{0}\" is active; its connection cannot be mutated")]
    ActiveCannotMutateConnection(String),

    #[error("the default database cannot be deleted")]
    UndeletableDefault,

    // --- Auth ---
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden: org admin role required")]
    ForbiddenNotAdmin,

    #[error("an organization is required for this operation")]
    OrgRequired,

    #[error("slug \"{0}\" is already taken")]
    SlugTaken(String),

    // --- Validation ---
    #[error("validation error: {message}")]
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },

    // --- Upstream / internal ---
    #[error("upstream cube engine error ({status}): {body}")]
    UpstreamError { status: u16, body: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Stable machine-readable code, used in logs and response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::MissingLimit => "MISSING_LIMIT",
            GatewayError::LimitTooHigh { .. } => "LIMIT_TOO_HIGH",
            GatewayError::QueryKeyNotAllowed(_) => "QUERY_KEY_NOT_ALLOWED",
            GatewayError::UnknownMember { .. } => "UNKNOWN_MEMBER",
            GatewayError::MemberNotExposed(_) => "MEMBER_NOT_EXPOSED",
            GatewayError::PiiMemberBlocked(_) => "PII_MEMBER_BLOCKED",
            GatewayError::GroupByNotAllowed { .. } => "GROUP_BY_NOT_ALLOWED",
            GatewayError::MissingTimeDimension(_) => "MISSING_TIME_DIMENSION",
            GatewayError::CatalogNotInitialized => "CATALOG_NOT_INITIALIZED",
            GatewayError::UpstreamMetaUnavailable(_) => "UPSTREAM_META_UNAVAILABLE",
            GatewayError::DuplicateId(_) => "DUPLICATE_ID",
            GatewayError::NotFound(_) => "NOT_FOUND",
            GatewayError::ActiveCannotDelete(_) => "ACTIVE_CANNOT_DELETE",
            GatewayError::ActiveCannotMutateConnection(_) => "ACTIVE_CANNOT_MUTATE_CONNECTION",
            GatewayError::UndeletableDefault => "UNDELETABLE_DEFAULT",
            GatewayError::Unauthenticated => "UNAUTHENTICATED",
            GatewayError::ForbiddenNotAdmin => "FORBIDDEN_NOT_ADMIN",
            GatewayError::OrgRequired => "ORG_REQUIRED",
            GatewayError::SlugTaken(_) => "SLUG_TAKEN",
            GatewayError::Validation { .. } => "VALIDATION_ERROR",
            GatewayError::UpstreamError { .. } => "UPSTREAM_ERROR",
            GatewayError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code the admin REST layer should map this to (§7).
    pub fn http_status(&self) -> u16 {
        match self {
            GatewayError::MissingLimit
            | GatewayError::LimitTooHigh { .. }
            | GatewayError::QueryKeyNotAllowed(_)
            | GatewayError::UnknownMember { .. }
            | GatewayError::MemberNotExposed(_)
            | GatewayError::PiiMemberBlocked(_)
            | GatewayError::GroupByNotAllowed { .. }
            | GatewayError::MissingTimeDimension(_)
            | GatewayError::Validation { .. } => 400,
            GatewayError::Unauthenticated => 401,
            GatewayError::ForbiddenNotAdmin | GatewayError::OrgRequired => 403,
            GatewayError::NotFound(_) | GatewayError::CatalogNotInitialized => 404,
            GatewayError::DuplicateId(_)
            | GatewayError::SlugTaken(_)
            | GatewayError::ActiveCannotDelete(_)
            | GatewayError::ActiveCannotMutateConnection(_)
            | GatewayError::UndeletableDefault => 409,
            GatewayError::UpstreamError { .. } | GatewayError::UpstreamMetaUnavailable(_) => 502,
            GatewayError::Internal(_) => 500,
        }
    }

    /// JSON-RPC-shaped error body for the MCP tool-call surface.
    pub fn as_tool_error(&self) -> ToolError {
        let details = match self {
            GatewayError::UnknownMember { suggestions, .. } if !suggestions.is_empty() => {
                Some(serde_json::json!({ "suggestions": suggestions }))
            }
            GatewayError::Validation { details, .. } => details.clone(),
            _ => None,
        };
        ToolError {
            code: self.code().to_string(),
            message: self.to_string(),
            details,
        }
    }
}

/// `{error:{code,message,details?}}` — the shape every tool-call and REST
/// error body uses.
#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<rusqlite::Error> for GatewayError {
    fn from(e: rusqlite::Error) -> Self {
        GatewayError::Internal(format!("sqlite error: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
