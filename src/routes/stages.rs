use axum::response::{IntoResponse, Json};

use crate::{
    dto::pipeline_dto::{
        ReorderStagesPayload, StageOptionsResponse, StagePreviewResponse, StageSelectionPayload,
    },
    error::Result,
    models::stage::{self, StageCatalog, FIRST_STAGE, LAST_STAGE, MIDDLE_STAGE_OPTIONS},
};

#[utoipa::path(
    get,
    path = "/api/stages/options",
    responses(
        (status = 200, description = "Fixed ends and selectable middle stages", body = Json<StageOptionsResponse>)
    )
)]
#[axum::debug_handler]
pub async fn options() -> impl IntoResponse {
    Json(StageOptionsResponse {
        first_stage: FIRST_STAGE.to_string(),
        last_stage: LAST_STAGE.to_string(),
        middle_stage_options: MIDDLE_STAGE_OPTIONS.iter().map(|s| s.to_string()).collect(),
    })
}

#[utoipa::path(
    post,
    path = "/api/stages/preview",
    request_body = StageSelectionPayload,
    responses(
        (status = 200, description = "Full stage list for the selection", body = Json<StagePreviewResponse>),
        (status = 400, description = "Empty, unknown or duplicate stage")
    )
)]
#[axum::debug_handler]
pub async fn preview(Json(payload): Json<StageSelectionPayload>) -> Result<impl IntoResponse> {
    let catalog = StageCatalog::build(&payload.middle_stages)?;
    Ok(Json(StagePreviewResponse {
        middle_stages: catalog.middle_stages().to_vec(),
        stages: catalog.stages(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/stages/reorder",
    request_body = ReorderStagesPayload,
    responses(
        (status = 200, description = "Selection after the adjacent swap", body = Json<StagePreviewResponse>)
    )
)]
#[axum::debug_handler]
pub async fn reorder(Json(payload): Json<ReorderStagesPayload>) -> Result<impl IntoResponse> {
    let middle_stages = stage::reorder(&payload.middle_stages, payload.from_index, payload.to_index);
    let stages = stage::build_stages(&middle_stages)?;
    Ok(Json(StagePreviewResponse {
        middle_stages,
        stages,
    }))
}
