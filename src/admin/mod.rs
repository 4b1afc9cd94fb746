//! Diagnostic HTTP endpoint.
//!
//! Read-only views of the health registry; nothing here mutates provider
//! state or creates records.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::health::HealthRegistry;
use crate::lifecycle::ShutdownSignal;

/// State shared by the diagnostic handlers.
#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<HealthRegistry>,
    pub api_key: Option<String>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/health/providers", get(get_providers))
        .route("/health/providers/{id}", get(get_provider))
        .route("/health/order", get(get_order))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the diagnostic endpoint until shutdown is signalled.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    shutdown: ShutdownSignal,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Diagnostic endpoint listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(shutdown.wait())
        .await?;

    tracing::info!("Diagnostic endpoint stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HealthConfig;
    use crate::health::FailureReason;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn state(api_key: Option<&str>) -> AdminState {
        let registry = Arc::new(HealthRegistry::new(HealthConfig::default()));
        registry.record_success(&"alpha".into(), 120, true);
        registry.record_failure(&"beta".into(), None, FailureReason::Json, "truncated");
        AdminState {
            registry,
            api_key: api_key.map(str::to_string),
        }
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_snapshot_endpoint() {
        let (status, json) = get_json(setup_admin_router(state(None)), "/health/providers").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["providers"]["alpha"]["success"], 1);
        assert_eq!(json["providers"]["beta"]["last_failure_reason"], "json");
        assert_eq!(json["order"], serde_json::json!(["alpha", "beta"]));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_not_created() {
        let state = state(None);
        let registry = state.registry.clone();
        let (status, _) = get_json(setup_admin_router(state), "/health/providers/gamma").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(registry.known_providers().len(), 2);
    }

    #[tokio::test]
    async fn test_bearer_auth() {
        let router = setup_admin_router(state(Some("secret")));
        let (status, _) = get_json(router.clone(), "/status").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let response = router
            .oneshot(
                Request::get("/status")
                    .header("Authorization", "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
