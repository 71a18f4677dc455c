use crate::error::{AppError, AppResult};
use crate::middleware::auth::{authorize_write, AuthUser};
use crate::models::GenreModel;
use crate::policy::ResourceKind;
use crate::response::{ApiResponse, PaginatedResponse};
use crate::services::genre::GenreService;
use crate::utils::validate::SLUG_RE;
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGenreRequest {
    /// Genre name (1-256 characters)
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    /// URL slug (letters, digits, dash, underscore; max 50)
    #[validate(length(min = 1, max = 50), regex(path = *SLUG_RE))]
    pub slug: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenreListQuery {
    /// Name substring filter
    pub search: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenreResponse {
    /// Genre name
    pub name: String,
    /// URL slug
    pub slug: String,
}

impl From<GenreModel> for GenreResponse {
    fn from(g: GenreModel) -> Self {
        Self {
            name: g.name,
            slug: g.slug,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/genres",
    params(
        ("search" = Option<String>, Query, description = "Name substring"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "List genres", body = PaginatedResponse<GenreResponse>),
    ),
    tag = "genres"
)]
pub async fn list_genres(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<GenreListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20).min(100);

    let service = GenreService::new(db);
    let (genres, total) = service
        .list(params.search.as_deref(), page, per_page)
        .await?;
    let items: Vec<GenreResponse> = genres.into_iter().map(GenreResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/genres",
    security(("jwt_token" = [])),
    request_body = CreateGenreRequest,
    responses(
        (status = 200, description = "Genre created", body = GenreResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 409, description = "Slug already exists", body = AppError),
    ),
    tag = "genres"
)]
pub async fn create_genre(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateGenreRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    authorize_write(&db, &auth_user, ResourceKind::Genre, None).await?;

    let service = GenreService::new(db);
    let genre = service.create(&payload.name, &payload.slug).await?;

    Ok(ApiResponse::ok(GenreResponse::from(genre)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/genres/{slug}",
    security(("jwt_token" = [])),
    params(("slug" = String, Path, description = "Genre slug")),
    responses(
        (status = 200, description = "Genre deleted", body = String),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Genre not found", body = AppError),
    ),
    tag = "genres"
)]
pub async fn delete_genre(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    authorize_write(&db, &auth_user, ResourceKind::Genre, None).await?;

    let service = GenreService::new(db);
    service.delete(&slug).await?;

    Ok(ApiResponse::ok("Genre deleted"))
}
