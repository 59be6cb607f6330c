use axum::{
    Form, Json,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use crate::config::join_path;
use crate::input::normalize_query;
use crate::orchestrator::{RequestState, SearchOrchestrator};

use super::AppState;
use super::page::render_page;

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub query: String,
}

pub async fn index_handler() -> Html<String> {
    Html(render_page("", &RequestState::Idle))
}

/// Form submit. Blank queries re-render the empty page without calling out.
pub async fn search_form_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SearchForm>,
) -> Html<String> {
    let Some(query) = normalize_query(&form.query) else {
        return Html(render_page(&form.query, &RequestState::Idle));
    };

    let orchestrator = SearchOrchestrator::new(state.search.clone());
    orchestrator.submit_query(query).await;

    Html(render_page(&form.query, &orchestrator.state()))
}

/// Relays `/api/<path>` to the configured upstream unchanged.
pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();

    let mut url = join_path(&state.proxy_target, &format!("api/{path}")).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": format!("Proxy error: {e}") })),
        )
    })?;
    url.set_query(query.as_deref());

    let mut upstream = state.proxy.request(method.clone(), url.clone()).body(body);
    for name in [header::CONTENT_TYPE, header::ACCEPT] {
        if let Some(value) = headers.get(&name) {
            upstream = upstream.header(name, value.clone());
        }
    }

    let res = upstream.send().await.map_err(|e| {
        tracing::error!("proxy request to {url} failed: {:#}", e);
        (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "detail": format!("Upstream unavailable: {e}") })),
        )
    })?;

    let status = res.status();
    let content_type = res.headers().get(header::CONTENT_TYPE).cloned();
    let body = res.bytes().await.map_err(|e| {
        (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "detail": format!("Upstream body error: {e}") })),
        )
    })?;

    tracing::info!(
        %method,
        %url,
        status = status.as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "proxied"
    );

    let mut response = (status, body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        content_type.unwrap_or_else(|| HeaderValue::from_static("application/octet-stream")),
    );
    Ok(response)
}
