//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - JSON API under `/api/v1/...`
/// - Static page from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/lessons", get(http::http_get_lessons))
        .route("/api/v1/session", post(http::http_post_session))
        .route("/api/v1/question", get(http::http_get_question))
        .route("/api/v1/mode", post(http::http_post_mode))
        .route("/api/v1/answer", post(http::http_post_answer))
        .route("/api/v1/next", post(http::http_post_next))
        .route("/api/v1/lesson", post(http::http_post_lesson))
        .route("/api/v1/translate", post(http::http_post_translate))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::state::tests::test_state;

    async fn call(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn session_question_answer_next_over_http() {
        let app = build_router(Arc::new(test_state(10)));

        let (st, body) = call(app.clone(), post("/api/v1/session", serde_json::json!({}))).await;
        assert_eq!(st, StatusCode::OK);
        let id = body["sessionId"].as_str().unwrap().to_string();

        let uri = format!("/api/v1/question?sessionId={id}&mode=choice_th_zh");
        let (st, q) = call(app.clone(), Request::get(uri).body(Body::empty()).unwrap()).await;
        assert_eq!(st, StatusCode::OK);
        assert_eq!(q["options"].as_array().map(Vec::len), Some(4));

        let (st, err) = call(app.clone(), post("/api/v1/next", serde_json::json!({"sessionId": id, "mode": "choice_th_zh"}))).await;
        assert_eq!(st, StatusCode::CONFLICT);
        assert_eq!(err["kind"], "warning");

        let pick = q["options"][0].as_str().unwrap();
        let (st, ans) = call(
            app.clone(),
            post("/api/v1/answer", serde_json::json!({"sessionId": id, "mode": "choice_th_zh", "input": pick})),
        )
        .await;
        assert_eq!(st, StatusCode::OK);
        assert!(ans["correct"].is_boolean());

        let (st, next) = call(app, post("/api/v1/next", serde_json::json!({"sessionId": id, "mode": "choice_th_zh"}))).await;
        assert_eq!(st, StatusCode::OK);
        assert_eq!(next["answered"], false);
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let app = build_router(Arc::new(test_state(4)));
        let (st, body) = call(app, post("/api/v1/mode", serde_json::json!({"sessionId": "x", "mode": "word_zh_th"}))).await;
        assert_eq!(st, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "unknown_session");
    }

    #[tokio::test]
    async fn lessons_are_listed() {
        let app = build_router(Arc::new(test_state(6)));
        let (st, body) = call(app, Request::get("/api/v1/lessons").body(Body::empty()).unwrap()).await;
        assert_eq!(st, StatusCode::OK);
        assert_eq!(body["total"], 6);
        assert_eq!(body["lessons"], serde_json::json!(["L1", "L2"]));
    }
}
