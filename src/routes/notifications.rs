use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::user_dto::{MarkAllReadResponse, NotificationQuery},
    error::Result,
    middleware::auth::AuthUser,
    models::notification::Notification,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/notifications",
    params(
        ("unread" = Option<bool>, Query, description = "Only unread notifications")
    ),
    responses(
        (status = 200, description = "Newest first", body = Json<Vec<Notification>>)
    )
)]
#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<NotificationQuery>,
) -> Result<impl IntoResponse> {
    let notifications = state
        .notification_service
        .list(user.id, query.unread.unwrap_or(false))
        .await?;
    Ok(Json(notifications))
}

#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked as read", body = Json<Notification>),
        (status = 404, description = "Notification not found")
    )
)]
#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let notification = state.notification_service.mark_read(user.id, id).await?;
    Ok(Json(notification))
}

#[utoipa::path(
    post,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "Number of notifications marked", body = Json<MarkAllReadResponse>)
    )
)]
#[axum::debug_handler]
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let updated = state.notification_service.mark_all_read(user.id).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
