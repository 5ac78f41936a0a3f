//! Route definitions and router setup
//!
//! Configures all API routes and middleware.

mod community;

use crate::config::Settings;
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    let cors = build_cors_layer(settings);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let middleware = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    Router::new()
        .route("/health", get(health_check))
        // Community RPCs
        .route("/community/create", post(community::create_community))
        .route("/community/get", post(community::get_community))
        .route("/community/list", post(community::list_communities))
        .route("/community/update", post(community::update_community))
        .route("/community/delete", post(community::delete_community))
        .route("/community/isValid", post(community::is_community_valid))
        // Membership RPCs
        .route("/community/join", post(community::join_community))
        .route("/community/leave", post(community::leave_community))
        .layer(middleware)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let cors = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(origins)
    };

    cors.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CorsConfig, DatabaseConfig, IdentityConfig, ServerConfig};
    use crate::db::community::MockCommunityStore;
    use crate::db::membership::MockMembershipStore;
    use crate::error::AppError;
    use crate::identity::{IdentityUser, MockUserDirectory};
    use crate::services::{CommunityService, MembershipService};
    use crate::state::AppState;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn settings() -> Settings {
        Settings {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            identity: IdentityConfig::default(),
            cors: CorsConfig::default(),
        }
    }

    fn router(
        store: MockCommunityStore,
        users: MockUserDirectory,
        members: MockMembershipStore,
    ) -> Router {
        let state = AppState::new(
            CommunityService::new(Arc::new(store)),
            MembershipService::new(Arc::new(users), Arc::new(members)),
        );
        create_router(Arc::new(state), &settings())
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = router(
            MockCommunityStore::new(),
            MockUserDirectory::new(),
            MockMembershipStore::new(),
        );

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_join_success_returns_message() {
        let community_id = Uuid::new_v4();
        let mut users = MockUserDirectory::new();
        users.expect_get_user_by_id().returning(|id| {
            Ok(IdentityUser {
                user_id: id,
                username: "alice".into(),
                email: String::new(),
                created_at: String::new(),
                updated_at: String::new(),
            })
        });
        let mut members = MockMembershipStore::new();
        members.expect_join().returning(|cid, uid, at| {
            Ok(crate::db::membership::DbMembership {
                community_id: cid,
                user_id: uid,
                joined_at: at,
                created_at: at,
                updated_at: at,
            })
        });
        let app = router(MockCommunityStore::new(), users, members);

        let response = app
            .oneshot(post_json(
                "/community/join",
                serde_json::json!({ "community_id": community_id.to_string(), "user_id": "u-1" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(
            body["message"],
            format!("alice successfully joined the community {}", community_id)
        );
    }

    #[tokio::test]
    async fn test_join_without_user_is_bad_request() {
        let mut users = MockUserDirectory::new();
        users.expect_get_user_by_id().never();
        let app = router(MockCommunityStore::new(), users, MockMembershipStore::new());

        let response = app
            .oneshot(post_json(
                "/community/join",
                serde_json::json!({ "community_id": Uuid::new_v4().to_string() }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["message"], "error joining community: user id is empty");
    }

    #[tokio::test]
    async fn test_get_persistence_error_maps_to_500() {
        let mut store = MockCommunityStore::new();
        store
            .expect_get_by_id()
            .returning(|_| Err(AppError::Persistence("Failed to get community: no rows".into())));
        let app = router(store, MockUserDirectory::new(), MockMembershipStore::new());

        let response = app
            .oneshot(post_json(
                "/community/get",
                serde_json::json!({ "id": Uuid::new_v4().to_string() }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["code"], "PERSISTENCE_ERROR");
        assert_eq!(
            body["message"],
            "error getting community: Failed to get community: no rows"
        );
    }

    #[tokio::test]
    async fn test_list_accepts_empty_filter() {
        let mut store = MockCommunityStore::new();
        store
            .expect_list()
            .withf(|f| *f == crate::db::community::CommunityListFilter::default())
            .returning(|_| Ok(vec![]));
        let app = router(store, MockUserDirectory::new(), MockMembershipStore::new());

        let response = app
            .oneshot(post_json("/community/list", serde_json::json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["communities"], serde_json::json!([]));
    }
}
