pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::{auth, events, profile, realtime, requests, resume, teams};

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/signup", post(auth::handlers::handle_sign_up))
        .route("/api/v1/auth/login", post(auth::handlers::handle_sign_in))
        .route("/api/v1/auth/logout", post(auth::handlers::handle_sign_out))
        // Profile
        .route(
            "/api/v1/profile",
            get(profile::handlers::handle_get_profile).put(profile::handlers::handle_update_profile),
        )
        // Events
        .route(
            "/api/v1/events/active",
            get(events::handlers::handle_active_event),
        )
        // Teams
        .route(
            "/api/v1/teams",
            get(teams::handlers::handle_list_teams).post(teams::handlers::handle_create_team),
        )
        .route("/api/v1/teams/:id", get(teams::handlers::handle_get_team))
        .route(
            "/api/v1/teams/:id/join-requests",
            post(teams::handlers::handle_join_request),
        )
        .route(
            "/api/v1/teams/:id/candidates",
            get(teams::handlers::handle_candidates),
        )
        .route(
            "/api/v1/teams/:id/invitations",
            post(teams::handlers::handle_invite),
        )
        // Notifications
        .route(
            "/api/v1/notifications/join-requests",
            get(requests::handlers::handle_list_join_requests),
        )
        .route(
            "/api/v1/notifications/invitations",
            get(requests::handlers::handle_list_invitations),
        )
        .route(
            "/api/v1/notifications/stream",
            get(realtime::handlers::handle_notification_stream),
        )
        // Requests
        .route(
            "/api/v1/requests/:id/accept",
            post(requests::handlers::handle_accept),
        )
        .route(
            "/api/v1/requests/:id/reject",
            post(requests::handlers::handle_reject),
        )
        // Resume
        .route(
            "/api/v1/resume/analyze",
            post(resume::handlers::handle_analyze_resume).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::{
        AuthError, AuthProvider, AuthSession, SessionIdentity, SignInRequest, SignUpOutcome,
        SignUpRequest,
    };
    use crate::config::Config;
    use crate::llm_client::LlmClient;
    use crate::matching::scorer::HeuristicScorer;
    use crate::realtime::ChangeFeed;

    /// Rejects every session; signup and login are never reached in these tests.
    struct RejectingAuth;

    #[async_trait]
    impl AuthProvider for RejectingAuth {
        async fn verify(&self, _access_token: &str) -> Result<SessionIdentity, AuthError> {
            Err(AuthError::InvalidSession)
        }
        async fn sign_up(&self, _request: &SignUpRequest) -> Result<SignUpOutcome, AuthError> {
            Err(AuthError::Unexpected("not available in tests".to_string()))
        }
        async fn sign_in(&self, _request: &SignInRequest) -> Result<AuthSession, AuthError> {
            Err(AuthError::Unexpected("not available in tests".to_string()))
        }
        async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
            Ok(())
        }
    }

    fn test_router() -> Router {
        let config = Config::for_tests();
        let state = AppState {
            db: PgPoolOptions::new()
                .connect_lazy(&config.database_url)
                .unwrap(),
            llm: LlmClient::new(config.gemini_api_key.clone()).unwrap(),
            auth: Arc::new(RejectingAuth),
            config,
            scorer: Arc::new(HeuristicScorer),
            feed: ChangeFeed::new(),
        };
        build_router(state)
    }

    async fn error_code(response: axum::response::Response) -> String {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        json["error"]["code"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_bearer_is_unauthorized() {
        for uri in [
            "/api/v1/profile",
            "/api/v1/notifications/join-requests",
            "/api/v1/notifications/stream",
        ] {
            let response = test_router()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(error_code(response).await, "UNAUTHORIZED");
        }
    }

    #[tokio::test]
    async fn test_invalid_session_is_unauthorized() {
        let request = Request::post("/api/v1/requests/00000000-0000-0000-0000-000000000001/accept")
            .header(header::AUTHORIZATION, "Bearer expired-token")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_resume_upload_without_file_is_bad_request() {
        let boundary = "teamup-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"note\"\r\n\r\n\
             no file here\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::post("/api/v1/resume/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["message"], "No resume file provided");
    }
}
