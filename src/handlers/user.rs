use crate::error::{AppError, AppResult};
use crate::middleware::auth::{authorize, authorize_write, AuthUser};
use crate::models::UserModel;
use crate::policy::{Action, ResourceKind};
use crate::response::{ApiResponse, PaginatedResponse};
use crate::services::user::{ProfileUpdate, UserService};
use crate::utils::validate::{validate_username_not_me, USERNAME_RE};
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    /// Username
    pub username: String,
    /// Email address
    pub email: String,
    /// First name
    pub first_name: Option<String>,
    /// Last name
    pub last_name: Option<String>,
    /// Short bio
    pub bio: Option<String>,
    /// Role (user, moderator, admin)
    pub role: String,
}

impl From<UserModel> for UserResponse {
    fn from(u: UserModel) -> Self {
        Self {
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            bio: u.bio,
            role: u.role,
        }
    }
}

/// Self-service update; there is deliberately no role field here.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateMeRequest {
    /// Username (letters, digits, ./@/+/-, max 150; "me" is reserved)
    #[validate(
        length(min = 1, max = 150),
        regex(path = *USERNAME_RE),
        custom(function = validate_username_not_me)
    )]
    pub username: Option<String>,
    /// Email address (max 254)
    #[validate(email, length(max = 254))]
    pub email: Option<String>,
    /// First name
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    /// Last name
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    /// Short bio
    #[validate(length(max = 500))]
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdminUpdateUserRequest {
    /// Username (letters, digits, ./@/+/-, max 150; "me" is reserved)
    #[validate(
        length(min = 1, max = 150),
        regex(path = *USERNAME_RE),
        custom(function = validate_username_not_me)
    )]
    pub username: Option<String>,
    /// Email address (max 254)
    #[validate(email, length(max = 254))]
    pub email: Option<String>,
    /// First name
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    /// Last name
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    /// Short bio
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    /// Role (user, moderator, admin)
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserListQuery {
    /// Username substring filter
    pub search: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_me(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = UserService::new(db);
    let user = service.get_by_id(auth_user.user_id).await?;
    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    security(("jwt_token" = [])),
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Profile updated; role is read-only here", body = UserResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 409, description = "Username or email already taken", body = AppError),
    ),
    tag = "users"
)]
pub async fn update_me(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<UpdateMeRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = UserService::new(db);
    let user = service
        .update_self(
            auth_user.user_id,
            ProfileUpdate {
                username: payload.username,
                email: payload.email,
                first_name: payload.first_name,
                last_name: payload.last_name,
                bio: payload.bio,
                role: None,
            },
        )
        .await?;

    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    security(("jwt_token" = [])),
    params(
        ("search" = Option<String>, Query, description = "Username substring"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "List users", body = PaginatedResponse<UserResponse>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "users"
)]
pub async fn list_users(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<UserListQuery>,
) -> AppResult<impl IntoResponse> {
    authorize(&db, &auth_user, Action::Read, ResourceKind::UserAccount, None).await?;

    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20).min(100);

    let service = UserService::new(db);
    let (users, total) = service
        .list(params.search.as_deref(), page, per_page)
        .await?;
    let items: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{username}",
    security(("jwt_token" = [])),
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(username): Path<String>,
) -> AppResult<impl IntoResponse> {
    authorize(&db, &auth_user, Action::Read, ResourceKind::UserAccount, None).await?;

    let service = UserService::new(db);
    let user = service.get_by_username(&username).await?;
    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{username}",
    security(("jwt_token" = [])),
    params(("username" = String, Path, description = "Username")),
    request_body = AdminUpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn admin_update_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(username): Path<String>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    authorize_write(&db, &auth_user, ResourceKind::UserAccount, None).await?;

    let service = UserService::new(db);
    let user = service
        .update_by_admin(
            &username,
            ProfileUpdate {
                username: payload.username,
                email: payload.email,
                first_name: payload.first_name,
                last_name: payload.last_name,
                bio: payload.bio,
                role: payload.role,
            },
        )
        .await?;

    Ok(ApiResponse::ok(UserResponse::from(user)))
}

/// Full-replace updates of arbitrary users are rejected; PATCH is the only
/// supported update method on this path.
pub async fn user_put_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
