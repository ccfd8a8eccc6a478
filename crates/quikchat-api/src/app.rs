//! Application builder: wires router, middleware, and state into an Axum app.

use axum::Router;
use tower_http::trace::TraceLayer;

use quikchat_core::config::app::CorsConfig;

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState, cors_config: &CorsConfig) -> Router {
    build_router(state)
        .layer(build_cors_layer(cors_config))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use quikchat_core::config::realtime::RealtimeConfig;
    use quikchat_core::events::{Event, EventPayload};
    use quikchat_core::traits::EventBuffer;
    use quikchat_core::types::{UserId, UserProfile};
    use quikchat_realtime::RealtimeEngine;
    use quikchat_service::EventService;
    use quikchat_service::testing::{
        InMemoryEventStore, InMemoryGroupDirectory, InMemoryUserDirectory, MemoryEventBuffer,
        StaticAuthenticator, UnavailableBuffer,
    };

    use super::*;
    use crate::probe::{BufferProbe, HealthProbe};

    struct TestApp {
        app: Router,
        events: EventService,
        alice: UserId,
    }

    fn test_app(buffer: Arc<dyn EventBuffer>) -> TestApp {
        let events = EventService::new(buffer.clone(), Arc::new(InMemoryEventStore::default()));
        let engine = RealtimeEngine::new(
            RealtimeConfig::default(),
            events.clone(),
            Arc::new(InMemoryUserDirectory::default()),
            Arc::new(InMemoryGroupDirectory::default()),
        );
        let auth = StaticAuthenticator::default();
        let alice = UserId::new();
        auth.allow("alice-token", alice, "alice");

        let probes: Vec<Arc<dyn HealthProbe>> = vec![Arc::new(BufferProbe(buffer))];
        let state = AppState::new(Arc::new(auth), events.clone(), engine, probes);
        TestApp {
            app: build_app(state, &CorsConfig::default()),
            events,
            alice,
        }
    }

    fn notice(recipient: UserId) -> Event {
        Event::new(
            recipient,
            None,
            EventPayload::FriendRequestAccepted(UserProfile {
                id: UserId::new(),
                username: "bob".to_string(),
                profile_pic_url: String::new(),
            }),
        )
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn authed(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, "Bearer alice-token")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let t = test_app(Arc::new(MemoryEventBuffer::default()));
        let response = t
            .app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_detailed_health_reports_down_buffer() {
        let t = test_app(Arc::new(UnavailableBuffer));
        let response = t
            .app
            .oneshot(
                Request::get("/api/health/detailed")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json(response).await;
        assert_eq!(body["data"]["status"], "degraded");
        assert_eq!(body["data"]["checks"]["buffer"], "down");
        assert_eq!(body["data"]["online_users"], 0);
    }

    #[tokio::test]
    async fn test_events_require_token() {
        let t = test_app(Arc::new(MemoryEventBuffer::default()));
        let response = t
            .app
            .oneshot(Request::get("/api/events").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json(response).await;
        assert_eq!(body["error"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_list_events_returns_own_pending() {
        let t = test_app(Arc::new(MemoryEventBuffer::default()));
        let mine = notice(t.alice);
        t.events.store(&mine).await.unwrap();
        t.events.store(&notice(UserId::new())).await.unwrap();

        let response = t.app.oneshot(authed("GET", "/api/events")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        let listed = body["data"]["events"].as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], mine.id.to_string());
        assert_eq!(listed[0]["type"], "friend_request_accepted");
    }

    #[tokio::test]
    async fn test_list_events_rejects_bad_limit() {
        let t = test_app(Arc::new(MemoryEventBuffer::default()));
        let response = t
            .app
            .oneshot(authed("GET", "/api/events?limit=0"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_acknowledge_removes_event() {
        let t = test_app(Arc::new(MemoryEventBuffer::default()));
        let mine = notice(t.alice);
        t.events.store(&mine).await.unwrap();

        let uri = format!("/api/events/{}", mine.id);
        let response = t.app.clone().oneshot(authed("DELETE", &uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let again = t.app.oneshot(authed("DELETE", &uri)).await.unwrap();
        assert_eq!(again.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ws_rejects_bad_token_before_upgrade() {
        let t = test_app(Arc::new(MemoryEventBuffer::default()));
        let response = t
            .app
            .oneshot(Request::get("/ws?token=nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
