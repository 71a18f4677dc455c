use crate::error::{AppError, AppResult};
use crate::handlers::category::CategoryResponse;
use crate::handlers::genre::GenreResponse;
use crate::middleware::auth::{authorize_write, AuthUser};
use crate::models::TitleModel;
use crate::policy::ResourceKind;
use crate::response::{ApiResponse, PaginatedResponse};
use crate::services::review::ReviewService;
use crate::services::title::{TitleFilters, TitleService};
use crate::utils::validate::validate_year_not_future;
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
pub struct CreateTitleRequest {
    /// Title name (1-256 characters)
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    /// Release year (not in the future)
    #[validate(custom(function = validate_year_not_future))]
    pub year: i32,
    /// Optional description
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Category slug
    pub category: Option<String>,
    /// Genre slugs
    #[serde(default)]
    pub genre: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTitleRequest {
    /// Title name (1-256 characters)
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,
    /// Release year (not in the future)
    #[validate(custom(function = validate_year_not_future))]
    pub year: Option<i32>,
    /// Description
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Category slug
    pub category: Option<String>,
    /// Genre slugs (replaces the whole set when present)
    pub genre: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TitleListQuery {
    /// Category slug filter
    pub category: Option<String>,
    /// Genre slug filter
    pub genre: Option<String>,
    /// Name substring filter
    pub name: Option<String>,
    /// Exact year filter
    pub year: Option<i32>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TitleResponse {
    /// Title ID
    pub id: i32,
    /// Title name
    pub name: String,
    /// Release year
    pub year: i32,
    /// Mean review score, absent when there are no reviews
    pub rating: Option<f64>,
    /// Description
    pub description: Option<String>,
    /// Genres
    pub genre: Vec<GenreResponse>,
    /// Category
    pub category: Option<CategoryResponse>,
}

async fn shape_title(
    titles: &TitleService,
    reviews: &ReviewService,
    title: TitleModel,
) -> AppResult<TitleResponse> {
    let category = titles
        .category_for(&title)
        .await?
        .map(CategoryResponse::from);
    let genre = titles
        .genres_for(title.id)
        .await?
        .into_iter()
        .map(GenreResponse::from)
        .collect();
    let rating = reviews.rating_for_title(title.id).await?;

    Ok(TitleResponse {
        id: title.id,
        name: title.name,
        year: title.year,
        rating,
        description: title.description,
        genre,
        category,
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/titles",
    params(
        ("category" = Option<String>, Query, description = "Category slug"),
        ("genre" = Option<String>, Query, description = "Genre slug"),
        ("name" = Option<String>, Query, description = "Name substring"),
        ("year" = Option<i32>, Query, description = "Exact year"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "List titles", body = PaginatedResponse<TitleResponse>),
    ),
    tag = "titles"
)]
pub async fn list_titles(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<TitleListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20).min(100);

    let filters = TitleFilters {
        category: params.category,
        genre: params.genre,
        name: params.name,
        year: params.year,
    };

    let titles = TitleService::new(db.clone());
    let reviews = ReviewService::new(db);
    let (models, total) = titles.list(&filters, page, per_page).await?;

    let mut items = Vec::with_capacity(models.len());
    for title in models {
        items.push(shape_title(&titles, &reviews, title).await?);
    }

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/titles/{id}",
    params(("id" = i32, Path, description = "Title ID")),
    responses(
        (status = 200, description = "Title details", body = TitleResponse),
        (status = 404, description = "Title not found", body = AppError),
    ),
    tag = "titles"
)]
pub async fn get_title(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let titles = TitleService::new(db.clone());
    let reviews = ReviewService::new(db);
    let title = titles.get_by_id(id).await?;
    Ok(ApiResponse::ok(
        shape_title(&titles, &reviews, title).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/titles",
    security(("jwt_token" = [])),
    request_body = CreateTitleRequest,
    responses(
        (status = 200, description = "Title created", body = TitleResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "titles"
)]
pub async fn create_title(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateTitleRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    authorize_write(&db, &auth_user, ResourceKind::Title, None).await?;

    let titles = TitleService::new(db.clone());
    let reviews = ReviewService::new(db);
    let title = titles
        .create(
            &payload.name,
            payload.year,
            payload.description,
            payload.category.as_deref(),
            &payload.genre,
        )
        .await?;

    Ok(ApiResponse::ok(
        shape_title(&titles, &reviews, title).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/titles/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Title ID")),
    request_body = UpdateTitleRequest,
    responses(
        (status = 200, description = "Title updated", body = TitleResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Title not found", body = AppError),
    ),
    tag = "titles"
)]
pub async fn update_title(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateTitleRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    authorize_write(&db, &auth_user, ResourceKind::Title, None).await?;

    let titles = TitleService::new(db.clone());
    let reviews = ReviewService::new(db);
    let title = titles
        .update(
            id,
            payload.name,
            payload.year,
            payload.description,
            payload.category.as_deref(),
            payload.genre.as_deref(),
        )
        .await?;

    Ok(ApiResponse::ok(
        shape_title(&titles, &reviews, title).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/titles/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Title ID")),
    responses(
        (status = 200, description = "Title deleted", body = String),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Title not found", body = AppError),
    ),
    tag = "titles"
)]
pub async fn delete_title(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    authorize_write(&db, &auth_user, ResourceKind::Title, None).await?;

    let service = TitleService::new(db);
    service.delete(id).await?;

    Ok(ApiResponse::ok("Title deleted"))
}
