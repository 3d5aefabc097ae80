use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::pipeline_dto::{AdvancePayload, ApplyPayload, CreateSchedulePayload, ProgressResponse},
    error::Result,
    middleware::auth::AuthUser,
    models::{schedule::Schedule, user::Capability},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/jobs/job/{id}/apply",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    request_body = ApplyPayload,
    responses(
        (status = 201, description = "Application created", body = Json<ProgressResponse>),
        (status = 400, description = "Deadline passed or invalid payload"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Already applied")
    )
)]
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(job_id): Path<Uuid>,
    payload: Option<Json<ApplyPayload>>,
) -> Result<impl IntoResponse> {
    user.require(Capability::ApplyToJobs)?;
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate()?;
    let progress = state.application_service.apply(job_id, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(progress)))
}

#[utoipa::path(
    get,
    path = "/api/jobs/job/{id}/applicants",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Applicants with their pipeline position", body = Json<Vec<ProgressResponse>>),
        (status = 403, description = "Not the posting recruiter"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn list_applicants(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    user.require(Capability::ManageApplicants)?;
    let applicants = state
        .application_service
        .list_applicants(job_id, user.id)
        .await?;
    Ok(Json(applicants))
}

#[utoipa::path(
    get,
    path = "/api/applications/mine",
    responses(
        (status = 200, description = "The caller's applications", body = Json<Vec<ProgressResponse>>)
    )
)]
#[axum::debug_handler]
pub async fn my_applications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    user.require(Capability::ApplyToJobs)?;
    let applications = state.application_service.list_for_candidate(user.id).await?;
    Ok(Json(applications))
}

#[utoipa::path(
    get,
    path = "/api/jobs/job/{id}/applicants/{candidate_id}/progress",
    params(
        ("id" = Uuid, Path, description = "Job ID"),
        ("candidate_id" = Uuid, Path, description = "Candidate user ID")
    ),
    responses(
        (status = 200, description = "Progress with stage classification", body = Json<ProgressResponse>),
        (status = 403, description = "Neither the candidate nor the posting recruiter"),
        (status = 404, description = "Job or application not found")
    )
)]
#[axum::debug_handler]
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((job_id, candidate_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let progress = state
        .progress_service
        .view(job_id, candidate_id, &user)
        .await?;
    Ok(Json(progress))
}

#[utoipa::path(
    post,
    path = "/api/jobs/job/{id}/applicants/{candidate_id}/advance",
    params(
        ("id" = Uuid, Path, description = "Job ID"),
        ("candidate_id" = Uuid, Path, description = "Candidate user ID")
    ),
    request_body = AdvancePayload,
    responses(
        (status = 200, description = "Candidate moved to the next stage", body = Json<ProgressResponse>),
        (status = 403, description = "Not the posting recruiter"),
        (status = 404, description = "Job or application not found"),
        (status = 409, description = "Invalid transition or stale stage; re-fetch and retry")
    )
)]
#[axum::debug_handler]
pub async fn advance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((job_id, candidate_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AdvancePayload>,
) -> Result<impl IntoResponse> {
    user.require(Capability::ManageApplicants)?;
    payload.validate()?;
    let progress = state
        .progress_service
        .advance(job_id, candidate_id, &payload.to_stage, user.id)
        .await?;
    Ok(Json(progress))
}

#[utoipa::path(
    post,
    path = "/api/jobs/job/{id}/applicants/{candidate_id}/schedules",
    params(
        ("id" = Uuid, Path, description = "Job ID"),
        ("candidate_id" = Uuid, Path, description = "Candidate user ID")
    ),
    request_body = CreateSchedulePayload,
    responses(
        (status = 201, description = "Meeting booked for the current stage", body = Json<Schedule>),
        (status = 400, description = "Unknown or unreached stage, or invalid times"),
        (status = 409, description = "Candidate already moved past the stage")
    )
)]
#[axum::debug_handler]
pub async fn create_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((job_id, candidate_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CreateSchedulePayload>,
) -> Result<impl IntoResponse> {
    user.require(Capability::ManageApplicants)?;
    payload.validate()?;
    let schedule = state
        .schedule_service
        .create(job_id, candidate_id, user.id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}
