//! HTTP surface for the drawer UI
//!
//! A thin request/response layer over the store and the LED controller.
//! Every endpoint answers HTTP 200 with a `{success, ...}` JSON envelope;
//! domain failures are reported inside the envelope, never as raw faults.

use crate::drawer::DrawerId;
use crate::leds::LedController;
use crate::store::DrawerStore;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Default listen port
pub const DEFAULT_PORT: u16 = 5000;

/// Shared state for API handlers
pub struct ApiState {
    pub store: DrawerStore,
    pub leds: Arc<LedController>,
}

/// Build the application router
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/drawers", get(get_drawers).post(save_drawers))
        .route("/api/led/:drawer_id/toggle", post(toggle_led))
        .route("/api/led/all/:state", post(set_all_leds))
        .route("/api/led/test", post(run_led_test))
        .route("/api/export", get(export_data))
        .route("/api/status", get(get_status))
        .with_state(state)
}

/// GET / - the embedded single-page UI
async fn index() -> impl IntoResponse {
    Html(include_str!("../../static/index.html"))
}

/// GET /api/drawers - full drawer document
async fn get_drawers(State(state): State<Arc<ApiState>>) -> Json<serde_json::Value> {
    let doc = state.store.load().await;
    Json(json!({ "success": true, "drawers": doc }))
}

/// POST /api/drawers - overwrite the drawer document
///
/// The body is parsed by hand so a malformed payload lands in the envelope
/// instead of an extractor rejection.
async fn save_drawers(State(state): State<Arc<ApiState>>, body: Bytes) -> Json<serde_json::Value> {
    let doc = match serde_json::from_slice(&body) {
        Ok(doc) => doc,
        Err(e) => return Json(json!({ "success": false, "error": e.to_string() })),
    };

    match state.store.save(&doc).await {
        Ok(()) => Json(json!({ "success": true })),
        Err(e) => {
            error!("Failed to save drawer data: {}", e);
            Json(json!({ "success": false, "error": e.to_string() }))
        }
    }
}

/// POST /api/led/:drawer_id/toggle - flip one locator LED
async fn toggle_led(
    Path(drawer_id): Path<String>,
    State(state): State<Arc<ApiState>>,
) -> Json<serde_json::Value> {
    let Ok(id) = drawer_id.parse::<DrawerId>() else {
        return Json(json!({ "success": false, "error": "Érvénytelen fiók ID" }));
    };

    match state.leds.toggle(id) {
        Ok(new_state) => Json(json!({ "success": true, "state": new_state })),
        Err(e) => Json(json!({ "success": false, "error": e.to_string() })),
    }
}

/// POST /api/led/all/:state - drive every assigned LED; `on` means on,
/// anything else means off (case-insensitive)
async fn set_all_leds(
    Path(desired): Path<String>,
    State(state): State<Arc<ApiState>>,
) -> Json<serde_json::Value> {
    let on = desired.eq_ignore_ascii_case("on");
    state.leds.set_all(on);
    Json(json!({ "success": true, "state": on }))
}

/// POST /api/led/test - start the diagnostic chase, returning immediately
async fn run_led_test(State(state): State<Arc<ApiState>>) -> Json<serde_json::Value> {
    match state.leds.clone().start_test() {
        Ok(()) => Json(json!({ "success": true })),
        Err(e) => Json(json!({ "success": false, "error": e.to_string() })),
    }
}

/// GET /api/export - downloadable snapshot of the drawer document
async fn export_data(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let doc = state.store.load().await;
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let filename = format!("alkartesz_tarolo_{}.json", timestamp);

    let body = match serde_json::to_string_pretty(&doc) {
        Ok(json) => json,
        Err(e) => {
            return Json(json!({ "success": false, "error": e.to_string() })).into_response()
        }
    };

    (
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// GET /api/status - liveness, LED count and current LED states
async fn get_status(State(state): State<Arc<ApiState>>) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "status": "online",
        "led_count": state.leds.lit_count(),
        "led_states": state.leds.snapshot(),
        "test_running": state.leds.test_running(),
        "timestamp": chrono::Local::now().to_rfc3339(),
    }))
}

/// Bind and serve until the shutdown future resolves
pub async fn start_server(
    state: Arc<ApiState>,
    host: &str,
    port: u16,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let router = build_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawer::DrawerDocument;
    use crate::gpio::{LedBackend, MockBackend};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_router() -> (Router, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = DrawerStore::new(dir.path().join("data.json"));
        let backend = Arc::new(MockBackend::new());
        let leds = Arc::new(LedController::new(backend as Arc<dyn LedBackend>));
        let router = build_router(Arc::new(ApiState { store, leds }));
        (router, dir)
    }

    async fn request(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<String>,
    ) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .unwrap();

        let response = router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_get_drawers_fresh_install() {
        let (router, _dir) = test_router();
        let (status, body) = request(&router, "GET", "/api/drawers", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));

        let drawers = body["drawers"].as_object().unwrap();
        assert_eq!(drawers.len(), 32);
        assert_eq!(
            drawers["3-2"],
            json!({"id": "3-2", "name": "", "items": [], "notes": "", "row": 3, "col": 2})
        );
    }

    #[tokio::test]
    async fn test_save_then_get_drawers() {
        let (router, _dir) = test_router();

        let mut doc = DrawerDocument::default();
        doc.0.get_mut("1-1").unwrap().name = "Ellenállások".to_string();
        let payload = serde_json::to_string(&doc).unwrap();

        let (_, body) = request(&router, "POST", "/api/drawers", Some(payload)).await;
        assert_eq!(body, json!({"success": true}));

        let (_, body) = request(&router, "GET", "/api/drawers", None).await;
        assert_eq!(body["drawers"]["1-1"]["name"], json!("Ellenállások"));
    }

    #[tokio::test]
    async fn test_save_malformed_body_is_enveloped() {
        let (router, _dir) = test_router();
        let (status, body) =
            request(&router, "POST", "/api/drawers", Some("{ nope".to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(false));
        assert!(!body["error"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_wrong_key_set_rejected() {
        let (router, dir) = test_router();

        let mut doc = DrawerDocument::default();
        doc.0.remove("2-2");
        let payload = serde_json::to_string(&doc).unwrap();

        let (_, body) = request(&router, "POST", "/api/drawers", Some(payload)).await;
        assert_eq!(body["success"], json!(false));
        assert!(!dir.path().join("data.json").exists());
    }

    #[tokio::test]
    async fn test_toggle_led_twice() {
        let (router, _dir) = test_router();

        let (_, body) = request(&router, "POST", "/api/led/1-1/toggle", None).await;
        assert_eq!(body, json!({"success": true, "state": true}));

        let (_, body) = request(&router, "POST", "/api/led/1-1/toggle", None).await;
        assert_eq!(body, json!({"success": true, "state": false}));
    }

    #[tokio::test]
    async fn test_toggle_row_eight_rejected() {
        let (router, _dir) = test_router();
        let (status, body) = request(&router, "POST", "/api/led/8-1/toggle", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"success": false, "error": "Érvénytelen fiók ID"})
        );
    }

    #[tokio::test]
    async fn test_toggle_unknown_drawer_rejected() {
        let (router, _dir) = test_router();
        let (_, body) = request(&router, "POST", "/api/led/99-1/toggle", None).await;
        assert_eq!(
            body,
            json!({"success": false, "error": "Érvénytelen fiók ID"})
        );
    }

    #[tokio::test]
    async fn test_set_all_and_status() {
        let (router, _dir) = test_router();

        let (_, body) = request(&router, "POST", "/api/led/all/ON", None).await;
        assert_eq!(body, json!({"success": true, "state": true}));

        let (_, body) = request(&router, "GET", "/api/status", None).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["status"], json!("online"));
        assert_eq!(body["led_count"], json!(28));

        let states = body["led_states"].as_object().unwrap();
        assert_eq!(states.len(), 32);
        for (id, on) in states {
            let row: u8 = id.split('-').next().unwrap().parse().unwrap();
            assert_eq!(on, &json!(row <= 7), "drawer {}", id);
        }

        let (_, body) = request(&router, "POST", "/api/led/all/off", None).await;
        assert_eq!(body, json!({"success": true, "state": false}));
    }

    #[tokio::test]
    async fn test_led_test_rejects_second_start() {
        let (router, _dir) = test_router();

        let (_, body) = request(&router, "POST", "/api/led/test", None).await;
        assert_eq!(body, json!({"success": true}));

        let (_, body) = request(&router, "POST", "/api/led/test", None).await;
        assert_eq!(body["success"], json!(false));

        let (_, body) = request(&router, "GET", "/api/status", None).await;
        assert_eq!(body["test_running"], json!(true));
    }

    #[tokio::test]
    async fn test_export_headers() {
        let (router, _dir) = test_router();

        let req = Request::builder()
            .method("GET")
            .uri("/api/export")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(disposition.starts_with("attachment; filename=\"alkartesz_tarolo_"));
        assert!(disposition.ends_with(".json\""));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let doc: DrawerDocument = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(doc.len(), 32);
    }

    #[tokio::test]
    async fn test_index_serves_html() {
        let (router, _dir) = test_router();

        let req = Request::builder()
            .method("GET")
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("drawerGrid"));
    }
}
