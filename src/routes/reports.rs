use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    error::Result,
    middleware::auth::AuthUser,
    models::{report::PipelineReport, user::Capability},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/reports",
    responses(
        (status = 200, description = "Pipeline aggregates", body = Json<PipelineReport>),
        (status = 403, description = "Caller is not an admin")
    )
)]
#[axum::debug_handler]
pub async fn pipeline_report(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    user.require(Capability::ViewReports)?;
    let report = state.report_service.pipeline().await?;
    Ok(Json(report))
}
