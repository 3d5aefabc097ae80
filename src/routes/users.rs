use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::user_dto::{MeResponse, RegisterUserPayload, RoleQuery, RoleResponse},
    error::{Error, Result},
    middleware::auth::AuthUser,
    models::user::User,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Caller registered with the chosen role", body = Json<User>),
        (status = 403, description = "Admin role requested")
    )
)]
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let display_name = payload
        .display_name
        .or(user.display_name)
        .unwrap_or_else(|| user.email.clone());
    let created = state
        .user_service
        .register(user.id, &user.email, &display_name, payload.role)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Identity, role and capabilities", body = Json<MeResponse>)
    )
)]
#[axum::debug_handler]
pub async fn me(Extension(user): Extension<AuthUser>) -> impl IntoResponse {
    Json(MeResponse {
        id: user.id,
        capabilities: user.role.capabilities().to_vec(),
        email: user.email,
        display_name: user.display_name,
        role: user.role,
    })
}

#[utoipa::path(
    get,
    path = "/api/users/role",
    params(
        ("email" = String, Query, description = "Email to look up")
    ),
    responses(
        (status = 200, description = "Role for the email; unknown emails are users", body = Json<RoleResponse>)
    )
)]
#[axum::debug_handler]
pub async fn role_by_email(
    State(state): State<AppState>,
    Query(query): Query<RoleQuery>,
) -> Result<impl IntoResponse> {
    let email = query.email.trim();
    if email.is_empty() {
        return Err(Error::BadRequest("email is required".to_string()));
    }
    let role = state.user_service.role_for_email(email).await?;
    Ok(Json(RoleResponse {
        email: email.to_string(),
        role,
    }))
}
