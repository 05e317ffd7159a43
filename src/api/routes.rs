//! API Routes
//!
//! Configures the Axum router with all bus tracker endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    all_vehicles_handler, clear_cache_handler, health_handler, line_handler, position_handler,
    stats_handler, AppState,
};
use super::rate_limit::rate_limit;

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - Rate limit: fixed window per client IP, `/api` routes only
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/api/sppo", get(all_vehicles_handler))
        .route("/api/sppo/linha/:linha", get(line_handler))
        .route("/api/sppo/posicao", get(position_handler))
        .route("/api/sppo/stats", get(stats_handler))
        .route("/api/sppo/cache/clear", post(clear_cache_handler))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit,
        ));

    Router::new()
        .merge(api)
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RateLimiter;
    use crate::cache::NamespacedCache;
    use crate::error::{Result, SppoError};
    use crate::sppo::{BusDataService, FeedSource, ServiceSettings};
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    struct DownFeed;

    #[async_trait]
    impl FeedSource for DownFeed {
        async fn fetch_raw(&self) -> Result<Vec<Value>> {
            Err(SppoError::Upstream("connection refused".to_string()))
        }
    }

    fn create_test_app(max_requests: u32) -> Router {
        let service = BusDataService::new(
            Arc::new(DownFeed),
            NamespacedCache::new(100, 300, 180, 120),
            ServiceSettings::default(),
        );
        let limiter = RateLimiter::new(Duration::from_secs(60), max_requests);
        create_router(AppState::new(service, limiter))
    }

    async fn status_of(app: Router, method: &str, uri: &str) -> StatusCode {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        assert_eq!(status_of(create_test_app(10), "GET", "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upstream_down_is_500() {
        let app = create_test_app(10);
        assert_eq!(
            status_of(app, "GET", "/api/sppo").await,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_clear_requires_post() {
        let app = create_test_app(10);
        assert_eq!(
            status_of(app.clone(), "GET", "/api/sppo/cache/clear").await,
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            status_of(app, "POST", "/api/sppo/cache/clear").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_rate_limit_applies_to_api_only() {
        let app = create_test_app(1);

        assert_eq!(
            status_of(app.clone(), "POST", "/api/sppo/cache/clear").await,
            StatusCode::OK
        );
        assert_eq!(
            status_of(app.clone(), "POST", "/api/sppo/cache/clear").await,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(status_of(app, "GET", "/health").await, StatusCode::OK);
    }
}
