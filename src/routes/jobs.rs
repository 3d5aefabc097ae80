use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::job_dto::{
        CreateJobPayload, JobListQuery, JobListResponse, JobResponse, UpdateJobPayload,
    },
    error::Result,
    middleware::auth::AuthUser,
    models::user::Capability,
    utils::time,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = CreateJobPayload,
    responses(
        (status = 201, description = "Job posted", body = Json<JobResponse>),
        (status = 400, description = "Invalid payload or stage selection"),
        (status = 403, description = "Caller cannot post jobs")
    )
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    user.require(Capability::PostJobs)?;
    payload.validate()?;
    let job = state.job_service.create(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(JobResponse::new(job, time::today()))))
}

#[utoipa::path(
    get,
    path = "/api/jobs",
    params(
        ("search" = Option<String>, Query, description = "Matches title, description or category"),
        ("category" = Option<String>, Query, description = "Exact category"),
        ("location" = Option<String>, Query, description = "Location substring"),
        ("job_type" = Option<String>, Query, description = "Job type"),
        ("open_only" = Option<bool>, Query, description = "Hide jobs past their deadline"),
        ("sort" = Option<String>, Query, description = "newest, oldest, salary_high, salary_low or deadline"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Job board page", body = Json<JobListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse> {
    user.require(Capability::BrowseJobs)?;
    let today = time::today();
    let page = state.job_service.list(&query, today).await?;
    Ok(Json(JobListResponse::new(page, today)))
}

#[utoipa::path(
    get,
    path = "/api/jobs/job/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job found", body = Json<JobResponse>),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    user.require(Capability::BrowseJobs)?;
    let job = state.job_service.get(id).await?;
    Ok(Json(JobResponse::new(job, time::today())))
}

#[utoipa::path(
    patch,
    path = "/api/jobs/job/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    request_body = UpdateJobPayload,
    responses(
        (status = 200, description = "Job updated", body = Json<JobResponse>),
        (status = 400, description = "Invalid payload or attempt to change stages"),
        (status = 403, description = "Not the posting recruiter"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<impl IntoResponse> {
    user.require(Capability::PostJobs)?;
    payload.validate()?;
    let job = state.job_service.update(id, user.id, payload).await?;
    Ok(Json(JobResponse::new(job, time::today())))
}

#[utoipa::path(
    get,
    path = "/api/recruiter/jobs",
    responses(
        (status = 200, description = "Jobs posted by the caller", body = Json<Vec<JobResponse>>),
        (status = 403, description = "Caller is not a recruiter")
    )
)]
#[axum::debug_handler]
pub async fn list_recruiter_jobs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    user.require(Capability::PostJobs)?;
    let today = time::today();
    let jobs = state.job_service.list_for_recruiter(user.id).await?;
    let items: Vec<JobResponse> = jobs
        .into_iter()
        .map(|job| JobResponse::new(job, today))
        .collect();
    Ok(Json(items))
}
