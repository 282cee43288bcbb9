//! Axum router configuration with middleware.
//!
//! Middleware: CORS restricted to one origin, request tracing. Preflight
//! `OPTIONS` requests are answered by the CORS layer.

use std::sync::Arc;

use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::relay::{self, RelayState};

/// Build the relay router with all routes and middleware.
pub fn build_router(state: RelayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.allowed_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            ACCEPT,
            HeaderName::from_static("x-glean-backend"),
            HeaderName::from_static("x-glean-actas"),
        ]);

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/glean/{*path}",
            get(relay::forward_chat)
                .post(relay::forward_chat)
                .fallback(relay::method_not_allowed),
        )
        .fallback(relay::forward_tracker)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use opsdesk_types::config::{JiraSettings, RelaySettings};

    use super::*;

    fn router_with(relay: RelaySettings) -> Router {
        build_router(
            RelayState::new(&relay, &JiraSettings::default())
                .unwrap()
                .with_chat_scheme("http"),
        )
    }

    fn router() -> Router {
        router_with(RelaySettings::default())
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_preflight_allows_configured_origin() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/glean/rest/api/v1/chat")
                    .header("Origin", "http://localhost:8000")
                    .header("Access-Control-Request-Method", "POST")
                    .header("Access-Control-Request-Headers", "x-glean-backend")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:8000"
        );
        let methods = response
            .headers()
            .get("access-control-allow-methods")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(methods.contains("POST"));
    }

    #[tokio::test]
    async fn test_other_methods_are_rejected() {
        for uri in ["/rest/api/3/issue", "/glean/rest/api/v1/chat"] {
            let response = router()
                .oneshot(
                    Request::builder()
                        .method(Method::PUT)
                        .uri(uri)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{uri}");
            assert!(body_text(response).await.contains("Method not allowed"));
        }
    }

    #[tokio::test]
    async fn test_chat_requires_allowed_backend() {
        let missing = router()
            .oneshot(Request::post("/glean/rest/api/v1/chat").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let foreign = router()
            .oneshot(
                Request::post("/glean/rest/api/v1/chat")
                    .header("X-Glean-Backend", "evil.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(foreign.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(foreign).await.contains("evil.example.com"));
    }

    #[tokio::test]
    async fn test_chat_forwards_headers_and_streams_body() {
        let server = MockServer::start().await;
        let ndjson = "{\"messages\":[]}\n{\"chatSessionTrackingToken\":\"t\"}\n";
        Mock::given(method("POST"))
            .and(path("/rest/api/v1/chat"))
            .and(header("Authorization", "Bearer tok"))
            .and(header("X-Glean-ActAs", "me@acme.com"))
            .and(body_string("{\"stream\":true}"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(ndjson, "application/x-ndjson"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let backend = server.address().to_string();
        let relay = RelaySettings {
            allowed_backend_suffix: format!(":{}", server.address().port()),
            ..RelaySettings::default()
        };
        let response = router_with(relay)
            .oneshot(
                Request::post("/glean/rest/api/v1/chat")
                    .header("X-Glean-Backend", backend)
                    .header("X-Glean-ActAs", "me@acme.com")
                    .header("Authorization", "Bearer tok")
                    .header("Content-Type", "application/json")
                    .body(Body::from("{\"stream\":true}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("content-type").unwrap(), "application/x-ndjson");
        assert_eq!(body_text(response).await, ndjson);
    }

    #[tokio::test]
    async fn test_tracker_forwarding_keeps_status_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/search"))
            .and(query_param("jql", "project=OPS"))
            .and(header("Authorization", "Basic abc"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string("{\"errorMessages\":[\"nope\"]}"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let relay = RelaySettings {
            jira_base: Some(server.uri()),
            ..RelaySettings::default()
        };
        let response = router_with(relay)
            .oneshot(
                Request::get("/rest/api/3/search?jql=project=OPS")
                    .header("Authorization", "Basic abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers().get("content-type").unwrap(), "application/json");
        assert!(body_text(response).await.contains("nope"));
    }

    #[tokio::test]
    async fn test_tracker_post_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/3/issue"))
            .and(header("Content-Type", "application/json"))
            .and(body_string("{\"fields\":{}}"))
            .respond_with(ResponseTemplate::new(201).set_body_string("{\"key\":\"OPS-1\"}"))
            .expect(1)
            .mount(&server)
            .await;

        let relay = RelaySettings {
            jira_base: Some(server.uri()),
            ..RelaySettings::default()
        };
        let response = router_with(relay)
            .oneshot(
                Request::post("/rest/api/3/issue")
                    .body(Body::from("{\"fields\":{}}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_text(response).await, "{\"key\":\"OPS-1\"}");
    }

    #[tokio::test]
    async fn test_unreachable_tracker_is_bad_gateway() {
        let relay = RelaySettings {
            jira_base: Some("http://127.0.0.1:1".to_string()),
            ..RelaySettings::default()
        };
        let response = router_with(relay)
            .oneshot(Request::get("/rest/api/3/myself").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_unconfigured_tracker() {
        let response = router()
            .oneshot(Request::get("/rest/api/3/myself").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
