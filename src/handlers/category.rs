use crate::error::{AppError, AppResult};
use crate::middleware::auth::{authorize_write, AuthUser};
use crate::models::CategoryModel;
use crate::policy::ResourceKind;
use crate::response::{ApiResponse, PaginatedResponse};
use crate::services::category::CategoryService;
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
pub struct CreateCategoryRequest {
    /// Category name (1-256 characters)
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    /// URL slug (letters, digits, dash, underscore; max 50)
    #[validate(length(min = 1, max = 50), regex(path = *SLUG_RE))]
    pub slug: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryListQuery {
    /// Name substring filter
    pub search: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    /// Category name
    pub name: String,
    /// URL slug
    pub slug: String,
}

impl From<CategoryModel> for CategoryResponse {
    fn from(c: CategoryModel) -> Self {
        Self {
            name: c.name,
            slug: c.slug,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    params(
        ("search" = Option<String>, Query, description = "Name substring"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "List categories", body = PaginatedResponse<CategoryResponse>),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<CategoryListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20).min(100);

    let service = CategoryService::new(db);
    let (categories, total) = service
        .list(params.search.as_deref(), page, per_page)
        .await?;
    let items: Vec<CategoryResponse> = categories
        .into_iter()
        .map(CategoryResponse::from)
        .collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    security(("jwt_token" = [])),
    request_body = CreateCategoryRequest,
    responses(
        (status = 200, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 409, description = "Slug already exists", body = AppError),
    ),
    tag = "categories"
)]
pub async fn create_category(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    authorize_write(&db, &auth_user, ResourceKind::Category, None).await?;

    let service = CategoryService::new(db);
    let category = service.create(&payload.name, &payload.slug).await?;

    Ok(ApiResponse::ok(CategoryResponse::from(category)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{slug}",
    security(("jwt_token" = [])),
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category deleted", body = String),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Category not found", body = AppError),
    ),
    tag = "categories"
)]
pub async fn delete_category(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    authorize_write(&db, &auth_user, ResourceKind::Category, None).await?;

    let service = CategoryService::new(db);
    service.delete(&slug).await?;

    Ok(ApiResponse::ok("Category deleted"))
}
