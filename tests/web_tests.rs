use anyhow::Result;
use axum::http::StatusCode;
use std::sync::Arc;
use tokio::net::TcpListener;

use stratos::api::HttpSearchClient;
use stratos::config::ClientConfig;
use stratos::web::{AppState, create_router};

mod common;
use common::{dead_base_url, spawn_upstream};

/// Start the search page in front of `base_url`, return its address.
async fn spawn_frontend(base_url: &str) -> Result<String> {
    let config = ClientConfig::with_base_url(base_url)?;
    let client = HttpSearchClient::new(&config)?;
    let state = Arc::new(AppState::new(Arc::new(client), &config));
    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Ok(format!("http://{addr}"))
}

#[tokio::test]
async fn test_index_renders_empty_form() -> Result<()> {
    let upstream = spawn_upstream(StatusCode::OK, "{}").await;
    let frontend = spawn_frontend(&upstream.base_url).await?;

    let html = reqwest::get(&frontend).await?.text().await?;
    assert!(html.contains(r#"<form method="post" action="/">"#));
    assert!(html.contains(r#"placeholder="Ask your question...""#));
    assert!(!html.contains("result-card"));
    Ok(())
}

#[tokio::test]
async fn test_only_search_page_and_api_are_routed() -> Result<()> {
    let upstream = spawn_upstream(StatusCode::OK, "{}").await;
    let frontend = spawn_frontend(&upstream.base_url).await?;

    let res = reqwest::get(format!("{frontend}/static/style.css")).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let html = reqwest::get(&frontend).await?.text().await?;
    assert!(!html.contains("/static"));
    Ok(())
}

#[tokio::test]
async fn test_form_submit_renders_answer_and_links() -> Result<()> {
    let upstream = spawn_upstream(
        StatusCode::OK,
        r#"{"answer":"Paris","sources":["https://example.com/a","https://example.com/b"]}"#,
    )
    .await;
    let frontend = spawn_frontend(&upstream.base_url).await?;

    let res = reqwest::Client::new()
        .post(&frontend)
        .form(&[("query", "  what is the capital of France ")])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let html = res.text().await?;

    assert!(html.contains(r#"<div class="answer">Paris</div>"#));
    let a = html.find(r#"href="https://example.com/a""#).unwrap();
    let b = html.find(r#"href="https://example.com/b""#).unwrap();
    assert!(a < b);
    assert_eq!(html.matches(r#"rel="noopener noreferrer""#).count(), 2);
    assert!(html.contains(r#"value="  what is the capital of France ""#));

    let body: serde_json::Value = serde_json::from_str(&upstream.hits()[0].body)?;
    assert_eq!(body["query"], "what is the capital of France");
    Ok(())
}

#[tokio::test]
async fn test_form_submit_blank_query_skips_upstream() -> Result<()> {
    let upstream = spawn_upstream(StatusCode::OK, r#"{"answer":"A","sources":[]}"#).await;
    let frontend = spawn_frontend(&upstream.base_url).await?;

    let html = reqwest::Client::new()
        .post(&frontend)
        .form(&[("query", "   ")])
        .send()
        .await?
        .text()
        .await?;
    assert!(!html.contains("result-card"));
    assert!(upstream.hits().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_form_submit_shows_server_detail() -> Result<()> {
    let upstream = spawn_upstream(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"detail":"index unavailable"}"#,
    )
    .await;
    let frontend = spawn_frontend(&upstream.base_url).await?;

    let html = reqwest::Client::new()
        .post(&frontend)
        .form(&[("query", "q")])
        .send()
        .await?
        .text()
        .await?;
    assert!(html.contains(r#"<div class="error-message">index unavailable</div>"#));
    assert!(!html.contains("loading-message"));
    Ok(())
}

#[tokio::test]
async fn test_proxy_relays_api_calls() -> Result<()> {
    let upstream = spawn_upstream(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"detail":"index unavailable"}"#,
    )
    .await;
    let frontend = spawn_frontend(&upstream.base_url).await?;

    let res = reqwest::Client::new()
        .post(format!("{frontend}/api/search"))
        .json(&serde_json::json!({ "query": "via proxy" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["detail"], "index unavailable");

    let hits = upstream.hits();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].content_type.as_deref(), Some("application/json"));
    assert!(hits[0].body.contains("via proxy"));
    Ok(())
}

#[tokio::test]
async fn test_proxy_reports_dead_upstream() -> Result<()> {
    let frontend = spawn_frontend(&dead_base_url()).await?;

    let res = reqwest::Client::new()
        .post(format!("{frontend}/api/search"))
        .json(&serde_json::json!({ "query": "q" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = res.json().await?;
    assert!(body["detail"].as_str().unwrap().starts_with("Upstream unavailable"));
    Ok(())
}
