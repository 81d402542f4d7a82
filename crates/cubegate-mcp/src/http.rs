use crate::dispatch::handle_request;
use crate::factory::HandlerFactory;
use crate::rpc::{RpcError, RpcRequest, RpcResponse};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

const SESSION_HEADER: &str = "mcp-session-id";
const DEFAULT_DATABASE_ID: &str = "default";

#[derive(Clone)]
struct McpHttpState {
    factory: HandlerFactory,
    sessions: Arc<DashMap<String, crate::handler::McpHandler>>,
}

/// Build the router for the HTTP streamable-session MCP transport. Routing
/// is path-based: `/mcp/:slug/:databaseId` for a tenanted deployment,
/// `/mcp/:databaseId` for a self-hosted one, and legacy `/mcp` bound to the
/// deployment-default database. `POST` without an `mcp-session-id` header
/// creates a session on `initialize`; otherwise every verb routes by that
/// header, `GET` opens an SSE stream, `DELETE` evicts the session.
pub fn mcp_router(factory: HandlerFactory) -> Router {
    let state = McpHttpState {
        factory,
        sessions: Arc::new(DashMap::new()),
    };

    Router::new()
        .route(
            "/mcp",
            post(post_mcp_legacy).get(get_mcp_legacy).delete(delete_mcp_legacy),
        )
        .route(
            "/mcp/:database_id",
            post(post_mcp_self_hosted)
                .get(get_mcp_self_hosted)
                .delete(delete_mcp_self_hosted),
        )
        .route(
            "/mcp/:slug/:database_id",
            post(post_mcp_tenanted)
                .get(get_mcp_tenanted)
                .delete(delete_mcp_tenanted),
        )
        .with_state(state)
}

async fn post_mcp_legacy(
    State(state): State<McpHttpState>,
    headers: HeaderMap,
    Json(request): Json<RpcRequest>,
) -> Response {
    post_mcp(&state, None, DEFAULT_DATABASE_ID, headers, request).await
}

async fn get_mcp_legacy(State(state): State<McpHttpState>, headers: HeaderMap) -> Response {
    get_mcp(&state, headers)
}

async fn delete_mcp_legacy(State(state): State<McpHttpState>, headers: HeaderMap) -> Response {
    delete_mcp(&state, headers)
}

async fn post_mcp_self_hosted(
    State(state): State<McpHttpState>,
    Path(database_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<RpcRequest>,
) -> Response {
    post_mcp(&state, None, &database_id, headers, request).await
}

async fn get_mcp_self_hosted(
    State(state): State<McpHttpState>,
    Path(_database_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    get_mcp(&state, headers)
}

async fn delete_mcp_self_hosted(
    State(state): State<McpHttpState>,
    Path(_database_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    delete_mcp(&state, headers)
}

async fn post_mcp_tenanted(
    State(state): State<McpHttpState>,
    Path((slug, database_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(request): Json<RpcRequest>,
) -> Response {
    let id = request.id.clone().unwrap_or(Value::Null);
    let tenant_id = match state.factory.resolve_tenant_slug(&slug) {
        Ok(tenant_id) => tenant_id,
        Err(e) => return mcp_error_response(id, RpcError::session_or_routing(e.to_string())),
    };
    post_mcp(&state, Some(tenant_id), &database_id, headers, request).await
}

async fn get_mcp_tenanted(
    State(state): State<McpHttpState>,
    Path((_slug, _database_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    get_mcp(&state, headers)
}

async fn delete_mcp_tenanted(
    State(state): State<McpHttpState>,
    Path((_slug, _database_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    delete_mcp(&state, headers)
}

async fn post_mcp(
    state: &McpHttpState,
    tenant_id: Option<String>,
    database_id: &str,
    headers: HeaderMap,
    request: RpcRequest,
) -> Response {
    let id = request.id.clone().unwrap_or(Value::Null);

    if request.method == "initialize" {
        let handler = match state.factory.build(tenant_id.as_deref(), database_id) {
            Ok(h) => h,
            Err(e) => return mcp_error_response(id, RpcError::session_or_routing(e.to_string())),
        };

        let session_id = uuid::Uuid::new_v4().to_string();
        state.sessions.insert(session_id.clone(), handler.clone());

        let response = handle_request(request, &handler).await;
        let mut http_response = Json(response).into_response();
        http_response
            .headers_mut()
            .insert(SESSION_HEADER, session_id.parse().unwrap());
        return http_response;
    }

    let session_id = match headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) {
        Some(v) => v.to_string(),
        None => {
            return unknown_session_response(
                id,
                RpcError::session_or_routing(format!("missing {SESSION_HEADER} header")),
            )
        }
    };
    let Some(handler) = state.sessions.get(&session_id).map(|h| h.clone()) else {
        return unknown_session_response(
            id,
            RpcError::session_or_routing(format!("unknown session \"{session_id}\"")),
        );
    };

    Json(handle_request(request, &handler).await).into_response()
}

fn get_mcp(state: &McpHttpState, headers: HeaderMap) -> Response {
    let Some(session_id) = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) else {
        return (StatusCode::BAD_REQUEST, format!("missing {SESSION_HEADER} header")).into_response();
    };
    if !state.sessions.contains_key(session_id) {
        return unknown_session_response(
            Value::Null,
            RpcError::session_or_routing(format!("unknown session \"{session_id}\"")),
        );
    }
    // A real SSE body would stream server-initiated notifications; this
    // server has none to push today, so the stream opens and idles.
    (StatusCode::OK, [("content-type", "text/event-stream")], ":ok\n\n").into_response()
}

fn delete_mcp(state: &McpHttpState, headers: HeaderMap) -> Response {
    match headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) {
        Some(session_id) => {
            if state.sessions.remove(session_id).is_none() {
                return unknown_session_response(
                    Value::Null,
                    RpcError::session_or_routing(format!("unknown session \"{session_id}\"")),
                );
            }
            StatusCode::NO_CONTENT.into_response()
        }
        None => unknown_session_response(
            Value::Null,
            RpcError::session_or_routing(format!("missing {SESSION_HEADER} header")),
        ),
    }
}

fn mcp_error_response(id: Value, error: RpcError) -> Response {
    Json(RpcResponse::err(id, error)).into_response()
}

/// `POST`/`GET`/`DELETE` against an unknown or absent session id always
/// returns HTTP 404 alongside the JSON-RPC `-32000` body.
fn unknown_session_response(id: Value, error: RpcError) -> Response {
    (StatusCode::NOT_FOUND, Json(RpcResponse::err(id, error))).into_response()
}
