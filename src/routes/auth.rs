/// Authentication Routes
///
/// Sign-up, login, refresh-token rotation, logout and account status.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AuthService, Principal, TokenPair};
use crate::error::AppError;

/// Sign-up request; missing fields are reported as validation errors
#[derive(Deserialize)]
pub struct SignUpRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

/// Authentication response with access and refresh tokens
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub expires_in: i64,
    pub refresh_token: String,
    pub user_id: Uuid,
}

impl From<TokenPair> for AuthResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            token: pair.access_token,
            expires_in: pair.expires_in,
            refresh_token: pair.refresh_token,
            user_id: pair.user_id,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// PUT /auth/signup
///
/// # Errors
/// - 422: Validation errors, with every violated field listed
/// - 409: Email already registered
pub async fn sign_up(
    form: web::Json<SignUpRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let user_id = auth
        .sign_up(
            form.name.as_deref().unwrap_or_default(),
            form.email.as_deref().unwrap_or_default(),
            form.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(HttpResponse::Created().json(MessageResponse {
        message: "User created",
        user_id: Some(user_id),
    }))
}

/// POST /auth/login
///
/// # Errors
/// - 422: Malformed email
/// - 401: Unknown email or wrong password (distinct messages)
pub async fn log_in(
    form: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let pair = auth
        .log_in(
            form.email.as_deref().unwrap_or_default(),
            form.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(AuthResponse::from(pair)))
}

/// POST /auth/refresh-token
///
/// Token rotation: the presented refresh token is spent and a new pair is
/// returned.
///
/// # Errors
/// - 400: No refresh token in the body
/// - 401: Token does not verify, or its account is gone
/// - 422: Token verifies but is stale (already rotated, reused, or logged out)
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let pair = auth.refresh(form.refresh_token.as_deref()).await?;

    Ok(HttpResponse::Ok().json(AuthResponse::from(pair)))
}

/// POST /auth/logout
///
/// **Requires a valid access token.** The access token itself stays valid
/// until it expires; only the refresh token is revoked.
pub async fn log_out(
    principal: web::ReqData<Principal>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    auth.log_out(principal.user_id).await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Logged Out successfully!",
        user_id: Some(principal.user_id),
    }))
}

/// GET /auth/status
pub async fn get_status(
    principal: web::ReqData<Principal>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let status = auth.get_status(principal.user_id).await?;

    Ok(HttpResponse::Ok().json(StatusResponse { status }))
}

/// PATCH /auth/status
pub async fn update_status(
    principal: web::ReqData<Principal>,
    form: web::Json<StatusRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    auth.update_status(principal.user_id, form.status.as_deref().unwrap_or_default())
        .await?;

    Ok(HttpResponse::Created().json(MessageResponse {
        message: "User Status Updated!",
        user_id: None,
    }))
}
