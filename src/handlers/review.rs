use crate::error::{AppError, AppResult};
use crate::middleware::auth::{authorize_write, AuthUser};
use crate::models::ReviewModel;
use crate::policy::ResourceKind;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::review::ReviewService;
use crate::services::title::TitleService;
use crate::services::user::UserService;
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
pub struct CreateReviewRequest {
    /// Review text
    #[validate(length(min = 1))]
    pub text: String,
    /// Score from 1 to 10
    #[validate(range(min = 1, max = 10))]
    pub score: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateReviewRequest {
    /// Review text
    #[validate(length(min = 1))]
    pub text: Option<String>,
    /// Score from 1 to 10
    #[validate(range(min = 1, max = 10))]
    pub score: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    /// Review ID
    pub id: i32,
    /// Reviewed title ID
    pub title_id: i32,
    /// Author username
    pub author: String,
    /// Review text
    pub text: String,
    /// Score from 1 to 10
    pub score: i32,
    /// Publication timestamp
    pub pub_date: String,
}

impl ReviewResponse {
    fn from_model(review: ReviewModel, author: String) -> Self {
        Self {
            id: review.id,
            title_id: review.title_id,
            author,
            text: review.text,
            score: review.score,
            pub_date: review.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "List reviews for a title", body = PaginatedResponse<ReviewResponse>),
        (status = 404, description = "Title not found", body = AppError),
    ),
    tag = "reviews"
)]
pub async fn list_reviews(
    Extension(db): Extension<DatabaseConnection>,
    Path(title_id): Path<i32>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20).min(100);

    TitleService::new(db.clone()).get_by_id(title_id).await?;

    let service = ReviewService::new(db.clone());
    let (reviews, total) = service.list_for_title(title_id, page, per_page).await?;

    let author_ids: Vec<i32> = reviews.iter().map(|r| r.author_id).collect();
    let usernames = UserService::new(db).usernames_for(&author_ids).await?;

    let items: Vec<ReviewResponse> = reviews
        .into_iter()
        .map(|r| {
            let author = usernames.get(&r.author_id).cloned().unwrap_or_default();
            ReviewResponse::from_model(r, author)
        })
        .collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{id}",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("id" = i32, Path, description = "Review ID"),
    ),
    responses(
        (status = 200, description = "Review details", body = ReviewResponse),
        (status = 404, description = "Title or review not found", body = AppError),
    ),
    tag = "reviews"
)]
pub async fn get_review(
    Extension(db): Extension<DatabaseConnection>,
    Path((title_id, id)): Path<(i32, i32)>,
) -> AppResult<impl IntoResponse> {
    TitleService::new(db.clone()).get_by_id(title_id).await?;

    let service = ReviewService::new(db.clone());
    let review = service.get_scoped(title_id, id).await?;

    let author = UserService::new(db).get_by_id(review.author_id).await?;
    Ok(ApiResponse::ok(ReviewResponse::from_model(
        review,
        author.username,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/titles/{title_id}/reviews",
    security(("jwt_token" = [])),
    params(("title_id" = i32, Path, description = "Title ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 200, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Title not found", body = AppError),
        (status = 409, description = "Review already exists", body = AppError),
    ),
    tag = "reviews"
)]
pub async fn create_review(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(title_id): Path<i32>,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    TitleService::new(db.clone()).get_by_id(title_id).await?;

    let requester = authorize_write(
        &db,
        &auth_user,
        ResourceKind::Review,
        Some(auth_user.user_id),
    )
    .await?;

    let service = ReviewService::new(db.clone());
    let review = service
        .create(title_id, requester.user_id, &payload.text, payload.score)
        .await?;

    let author = UserService::new(db).get_by_id(review.author_id).await?;
    Ok(ApiResponse::ok(ReviewResponse::from_model(
        review,
        author.username,
    )))
}

#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}/reviews/{id}",
    security(("jwt_token" = [])),
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("id" = i32, Path, description = "Review ID"),
    ),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = ReviewResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not the author or a moderator", body = AppError),
        (status = 404, description = "Title or review not found", body = AppError),
    ),
    tag = "reviews"
)]
pub async fn update_review(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path((title_id, id)): Path<(i32, i32)>,
    Json(payload): Json<UpdateReviewRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    TitleService::new(db.clone()).get_by_id(title_id).await?;

    let service = ReviewService::new(db.clone());
    let existing = service.get_scoped(title_id, id).await?;

    authorize_write(
        &db,
        &auth_user,
        ResourceKind::Review,
        Some(existing.author_id),
    )
    .await?;

    let review = service
        .update(existing, payload.text, payload.score)
        .await?;

    let author = UserService::new(db).get_by_id(review.author_id).await?;
    Ok(ApiResponse::ok(ReviewResponse::from_model(
        review,
        author.username,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}/reviews/{id}",
    security(("jwt_token" = [])),
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("id" = i32, Path, description = "Review ID"),
    ),
    responses(
        (status = 200, description = "Review deleted", body = String),
        (status = 403, description = "Not the author or a moderator", body = AppError),
        (status = 404, description = "Title or review not found", body = AppError),
    ),
    tag = "reviews"
)]
pub async fn delete_review(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path((title_id, id)): Path<(i32, i32)>,
) -> AppResult<impl IntoResponse> {
    TitleService::new(db.clone()).get_by_id(title_id).await?;

    let service = ReviewService::new(db.clone());
    let existing = service.get_scoped(title_id, id).await?;

    authorize_write(
        &db,
        &auth_user,
        ResourceKind::Review,
        Some(existing.author_id),
    )
    .await?;

    service.delete(existing.id).await?;

    Ok(ApiResponse::ok("Review deleted"))
}
