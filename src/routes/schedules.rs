use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::pipeline_dto::ScheduleListResponse, error::Result, middleware::auth::AuthUser, AppState,
};

#[utoipa::path(
    get,
    path = "/api/schedules",
    responses(
        (status = 200, description = "Schedules grouped by day with status", body = Json<ScheduleListResponse>),
        (status = 403, description = "Role cannot view schedules")
    )
)]
#[axum::debug_handler]
pub async fn list_schedules(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let schedules = state.schedule_service.list_for(&user).await?;
    Ok(Json(schedules))
}
