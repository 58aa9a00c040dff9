use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    server::AppState,
    transport::routes::{content, health},
};

pub fn router(state: Arc<AppState>) -> Router {
    let content_routes = Router::new()
        .route("/search", get(content::search))
        .route("/metadata", get(content::metadata))
        .route("/stream", get(content::stream))
        .route("/seasons", get(content::seasons))
        .route("/episodes", get(content::episodes));

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .nest("/content", content_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::Config;

    /// App wired against unroutable upstreams; handler behavior only.
    async fn spawn_app() -> String {
        let mut config = Config::default();
        config.fmovies.base_url = "http://127.0.0.1:9".into();
        config.videostr.base_url = "http://127.0.0.1:9".into();
        config.keys.registry_url = "http://127.0.0.1:9/keys.json".into();
        config.browser.enabled = false;

        let state = Arc::new(AppState::new(config).unwrap());
        let app = router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn root_serves_the_banner() {
        let base = spawn_app().await;
        let body = reqwest::get(base).await.unwrap().text().await.unwrap();
        assert_eq!(body, "vidnest API is running");
    }

    #[tokio::test]
    async fn search_without_title_is_a_structured_400() {
        let base = spawn_app().await;
        let response = reqwest::get(format!("{base}/content/search")).await.unwrap();
        assert_eq!(response.status(), 400);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Bad Request");
        assert_eq!(body["path"], "/content/search");
        assert!(body["message"].as_str().unwrap().contains("title"));
    }

    #[tokio::test]
    async fn stream_with_unknown_media_type_is_a_400() {
        let base = spawn_app().await;
        let response = reqwest::get(format!("{base}/content/stream?id=19977&type=cartoon"))
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn unresolvable_stream_surfaces_one_terminal_error() {
        let base = spawn_app().await;
        let response = reqwest::get(format!("{base}/content/stream?id=19977&type=movie"))
            .await
            .unwrap();
        assert_eq!(response.status(), 500);

        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["message"].as_str().unwrap().contains("discovery failed"));
    }

    #[tokio::test]
    async fn health_reports_degraded_when_upstream_is_down() {
        let base = spawn_app().await;
        let body: serde_json::Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["upstreamReachable"], false);
    }
}
