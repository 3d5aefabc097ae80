pub mod health;
pub mod jobs;
pub mod notifications;
pub mod pipeline;
pub mod realtime;
pub mod reports;
pub mod schedules;
pub mod stages;
pub mod users;

use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    middleware::{
        auth::require_auth,
        rate_limit::{rps_middleware, RateLimiter},
    },
    AppState,
};

/// Builds the full HTTP surface. Everything except health and the stage
/// catalog helpers requires a bearer token.
pub fn router(state: AppState, api_rps: u32, public_rps: u32) -> Router {
    let public_api = Router::new()
        .route("/health", get(health::health))
        .route("/api/stages/options", get(stages::options))
        .route("/api/stages/preview", post(stages::preview))
        .route("/api/stages/reorder", post(stages::reorder))
        .layer(axum::middleware::from_fn_with_state(
            RateLimiter::new(public_rps),
            rps_middleware,
        ));

    let authed_api = Router::new()
        .route("/api/me", get(users::me))
        .route("/api/users", post(users::register))
        .route("/api/users/role", get(users::role_by_email))
        .route("/api/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route(
            "/api/jobs/job/:id",
            get(jobs::get_job).patch(jobs::update_job),
        )
        .route("/api/recruiter/jobs", get(jobs::list_recruiter_jobs))
        .route("/api/jobs/job/:id/apply", post(pipeline::apply))
        .route("/api/jobs/job/:id/applicants", get(pipeline::list_applicants))
        .route(
            "/api/jobs/job/:id/applicants/:candidate_id/progress",
            get(pipeline::get_progress),
        )
        .route(
            "/api/jobs/job/:id/applicants/:candidate_id/advance",
            post(pipeline::advance),
        )
        .route(
            "/api/jobs/job/:id/applicants/:candidate_id/schedules",
            post(pipeline::create_schedule),
        )
        .route("/api/applications/mine", get(pipeline::my_applications))
        .route("/api/schedules", get(schedules::list_schedules))
        .route(
            "/api/notifications",
            get(notifications::list_notifications),
        )
        .route(
            "/api/notifications/:id/read",
            post(notifications::mark_read),
        )
        .route(
            "/api/notifications/read-all",
            post(notifications::mark_all_read),
        )
        .route("/api/realtime", get(realtime::connect))
        .route("/api/admin/reports", get(reports::pipeline_report))
        .layer(axum::middleware::from_fn_with_state(
            RateLimiter::new(api_rps),
            rps_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    public_api.merge(authed_api).with_state(state)
}
