use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::{Capability, Role};
use crate::AppState;

/// Claims issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: usize,
}

/// The authenticated caller, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
}

impl AuthUser {
    pub fn require(&self, capability: Capability) -> Result<()> {
        if self.role.can(capability) {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "Role '{}' is not allowed to perform this action",
                self.role.as_str()
            )))
        }
    }
}

fn reject(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "error": code, "code": code, "retryable": false }))).into_response()
}

/// Bearer token from the `Authorization` header, or `?token=` for WebSocket
/// upgrades where browsers cannot set headers.
fn extract_token(req: &Request) -> std::result::Result<String, &'static str> {
    if let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) {
        let Ok(auth_str) = auth_header.to_str() else {
            return Err("bad_authorization");
        };
        return auth_str
            .strip_prefix("Bearer ")
            .map(str::to_string)
            .ok_or("unsupported_scheme");
    }

    req.uri()
        .query()
        .and_then(|query| {
            query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, _)| *key == "token")
                .map(|(_, value)| value.to_string())
        })
        .ok_or("missing_authorization")
}

pub fn decode_claims(token: &str, secret: &str) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()
    .map(|data| data.claims)
}

pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = match extract_token(&req) {
        Ok(token) => token,
        Err(code) => return reject(StatusCode::UNAUTHORIZED, code),
    };

    let Some(claims) = decode_claims(&token, &state.jwt_secret) else {
        return reject(StatusCode::UNAUTHORIZED, "invalid_token");
    };
    let Ok(id) = Uuid::parse_str(&claims.sub) else {
        return reject(StatusCode::UNAUTHORIZED, "invalid_subject");
    };

    let role = match state.user_service.role_for_email(&claims.email).await {
        Ok(role) => role,
        Err(err) => {
            tracing::error!(error = %err, "role lookup failed");
            return err.into_response();
        }
    };

    req.extensions_mut().insert(AuthUser {
        id,
        email: claims.email,
        display_name: claims.name,
        role,
    });
    next.run(req).await
}
