pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};

use crate::admin::handlers as admin;
use crate::interviews::handlers as interviews;
use crate::market::handlers as market;
use crate::recruiters::handlers as recruiters;
use crate::state::AppState;
use crate::storage::MAX_RESUME_BYTES;
use crate::students::handlers as students;

/// Multipart framing on top of the file itself.
const RESUME_BODY_LIMIT: usize = MAX_RESUME_BYTES + 64 * 1024;

fn student_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/me",
            get(students::handle_get_me).put(students::handle_update_me),
        )
        .route("/me/projects", post(students::handle_create_project))
        .route("/me/projects/:id", delete(students::handle_delete_project))
        .route(
            "/me/certifications",
            post(students::handle_create_certification),
        )
        .route(
            "/me/resume",
            post(students::handle_upload_resume).layer(DefaultBodyLimit::max(RESUME_BODY_LIMIT)),
        )
        .route("/me/github/sync", post(students::handle_github_sync))
        .route("/me/leetcode/sync", post(students::handle_leetcode_sync))
        .route("/me/jobs", get(students::handle_my_jobs))
        .route(
            "/me/notifications",
            get(students::handle_list_notifications),
        )
        .route(
            "/me/notifications/:id/read",
            patch(students::handle_mark_notification_read),
        )
        .route(
            "/me/roadmaps",
            get(students::handle_list_roadmaps).post(students::handle_create_roadmap),
        )
        .route(
            "/me/roadmaps/:id/steps/:index",
            patch(students::handle_toggle_roadmap_step),
        )
}

fn recruiter_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/jobs",
            get(recruiters::handle_list_jobs).post(recruiters::handle_create_job),
        )
        .route("/jobs/:id", get(recruiters::handle_get_job))
        .route("/jobs/:id/status", patch(recruiters::handle_update_job_status))
        .route("/jobs/:id/matches", get(recruiters::handle_job_matches))
        .route("/talent", get(recruiters::handle_talent_search))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/submissions/pending",
            get(admin::handle_pending_submissions),
        )
        .route("/projects/:id/review", patch(admin::handle_review_project))
        .route(
            "/certifications/:id/review",
            patch(admin::handle_review_certification),
        )
        .route("/students/:id/review", patch(admin::handle_review_student))
        .route("/market/refresh", post(admin::handle_market_refresh))
        .route("/market/status", get(admin::handle_market_status))
}

fn interview_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(interviews::handle_list_interviews).post(interviews::handle_create_interview),
        )
        .route("/:id", get(interviews::handle_get_interview))
        .route("/:id/answers", post(interviews::handle_submit_answers))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api/students", student_routes())
        .nest("/api/recruiters", recruiter_routes())
        .nest("/api/admin", admin_routes())
        .nest("/api/interviews", interview_routes())
        .route("/api/market/skills", get(market::handle_market_skills))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{BehaviorVersion, Region};
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use chrono::Duration;
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::{issue_token, Role};
    use crate::config::test_config;

    /// Nothing here connects until a handler touches the database, Redis or S3.
    fn lazy_state() -> AppState {
        let config = test_config();
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let redis = redis::Client::open(config.redis_url.clone()).unwrap();
        let s3 = aws_sdk_s3::Client::from_conf(
            aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new("us-east-1"))
                .build(),
        );
        AppState::new(config, db, redis, s3).unwrap()
    }

    fn bearer(state: &AppState, role: Role) -> String {
        let token = issue_token(&state.auth, Uuid::new_v4(), role, Duration::hours(1)).unwrap();
        format!("Bearer {token}")
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = build_router(lazy_state());
        let (status, body) = send(
            app,
            Request::builder().uri("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "placement-api");
    }

    #[tokio::test]
    async fn test_missing_token_is_401_with_error_body() {
        let app = build_router(lazy_state());
        let (status, body) = send(
            app,
            Request::builder()
                .uri("/api/students/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert!(body["message"].as_str().unwrap().contains("Authorization"));
        assert!(body.get("stack").is_none());
    }

    #[tokio::test]
    async fn test_wrong_role_is_403() {
        let state = lazy_state();
        let auth = bearer(&state, Role::Recruiter);
        let app = build_router(state);
        let (status, body) = send(
            app,
            Request::builder()
                .uri("/api/admin/market/status")
                .header(header::AUTHORIZATION, auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_admin_market_status_before_any_run() {
        let state = lazy_state();
        let auth = bearer(&state, Role::Admin);
        let app = build_router(state);
        let (status, body) = send(
            app,
            Request::builder()
                .uri("/api/admin/market/status")
                .header(header::AUTHORIZATION, auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_running"], false);
        assert!(body["last_run"].is_null());
    }

    #[tokio::test]
    async fn test_profile_update_validates_before_touching_storage() {
        let state = lazy_state();
        let auth = bearer(&state, Role::Student);
        let app = build_router(state);
        let (status, body) = send(
            app,
            Request::builder()
                .method(Method::PUT)
                .uri("/api/students/me")
                .header(header::AUTHORIZATION, auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"cgpa": 11.2}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_interview_difficulty_is_validated() {
        let state = lazy_state();
        let auth = bearer(&state, Role::Student);
        let app = build_router(state);
        let (status, body) = send(
            app,
            Request::builder()
                .method(Method::POST)
                .uri("/api/interviews")
                .header(header::AUTHORIZATION, auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"role": "SDE", "difficulty": "impossible"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("difficulty"));
    }

    #[tokio::test]
    async fn test_review_rejects_non_final_status() {
        let state = lazy_state();
        let auth = bearer(&state, Role::Admin);
        let app = build_router(state);
        let (status, _) = send(
            app,
            Request::builder()
                .method(Method::PATCH)
                .uri(format!("/api/admin/projects/{}/review", Uuid::new_v4()))
                .header(header::AUTHORIZATION, auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"status": "pending"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = build_router(lazy_state());
        let (status, _) = send(
            app,
            Request::builder()
                .uri("/api/unknown")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
