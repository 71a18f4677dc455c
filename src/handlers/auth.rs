use crate::error::{AppError, AppResult};
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::auth::{AuthService, SignupFields};
use crate::services::email::EmailService;
use crate::utils::validate::{validate_username_not_me, USERNAME_RE};
use axum::{response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    /// Username (letters, digits, ./@/+/-, max 150; "me" is reserved)
    #[validate(
        length(min = 1, max = 150),
        regex(path = *USERNAME_RE),
        custom(function = validate_username_not_me)
    )]
    pub username: String,
    /// Email address (max 254)
    #[validate(email, length(max = 254))]
    pub email: String,
    /// First name
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    /// Last name
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    /// Short bio
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    /// Optional password (min 8 characters when present)
    #[validate(length(min = 8))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TokenRequest {
    /// Username the code was issued for
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    /// Confirmation code from the signup email
    #[validate(length(min = 1, max = 16))]
    pub confirmation_code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupResponse {
    /// Username
    pub username: String,
    /// Email the confirmation code was sent to
    pub email: String,
}

impl From<UserModel> for SignupResponse {
    fn from(user: UserModel) -> Self {
        Self {
            username: user.username,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// Bearer token
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "User registered, confirmation code sent", body = SignupResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "Username or email collision", body = AppError),
    ),
    tag = "auth"
)]
pub async fn signup(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    let user = service
        .signup(
            SignupFields {
                username: payload.username,
                email: payload.email,
                first_name: payload.first_name,
                last_name: payload.last_name,
                bio: payload.bio,
                password: payload.password,
            },
            &email_service,
        )
        .await?;

    Ok(ApiResponse::with_message(
        SignupResponse::from(user),
        "Confirmation code sent".to_string(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid confirmation code", body = AppError),
        (status = 404, description = "Unknown username", body = AppError),
    ),
    tag = "auth"
)]
pub async fn issue_token(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<TokenRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    let token = service
        .issue_token(&payload.username, &payload.confirmation_code)
        .await?;

    Ok(ApiResponse::ok(TokenResponse { token }))
}
