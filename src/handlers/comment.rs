use crate::error::{AppError, AppResult};
use crate::middleware::auth::{authorize_write, AuthUser};
use crate::models::CommentModel;
use crate::policy::ResourceKind;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::comment::CommentService;
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
pub struct CreateCommentRequest {
    /// Comment text
    #[validate(length(min = 1))]
    pub text: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCommentRequest {
    /// Comment text
    #[validate(length(min = 1))]
    pub text: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    /// Comment ID
    pub id: i32,
    /// Parent review ID
    pub review_id: i32,
    /// Author username
    pub author: String,
    /// Comment text
    pub text: String,
    /// Publication timestamp
    pub pub_date: String,
}

impl CommentResponse {
    fn from_model(comment: CommentModel, author: String) -> Self {
        Self {
            id: comment.id,
            review_id: comment.review_id,
            author,
            text: comment.text,
            pub_date: comment.created_at.to_string(),
        }
    }
}

/// Verify the title/review parent chain from the path, returning the review id.
async fn resolve_parents(db: &DatabaseConnection, title_id: i32, review_id: i32) -> AppResult<i32> {
    TitleService::new(db.clone()).get_by_id(title_id).await?;
    let review = ReviewService::new(db.clone())
        .get_scoped(title_id, review_id)
        .await?;
    Ok(review.id)
}

#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "List comments for a review", body = PaginatedResponse<CommentResponse>),
        (status = 404, description = "Title or review not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn list_comments(
    Extension(db): Extension<DatabaseConnection>,
    Path((title_id, review_id)): Path<(i32, i32)>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20).min(100);

    let review_id = resolve_parents(&db, title_id, review_id).await?;

    let service = CommentService::new(db.clone());
    let (comments, total) = service.list_for_review(review_id, page, per_page).await?;

    let author_ids: Vec<i32> = comments.iter().map(|c| c.author_id).collect();
    let usernames = UserService::new(db).usernames_for(&author_ids).await?;

    let items: Vec<CommentResponse> = comments
        .into_iter()
        .map(|c| {
            let author = usernames.get(&c.author_id).cloned().unwrap_or_default();
            CommentResponse::from_model(c, author)
        })
        .collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{id}",
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 200, description = "Comment details", body = CommentResponse),
        (status = 404, description = "Parent or comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn get_comment(
    Extension(db): Extension<DatabaseConnection>,
    Path((title_id, review_id, id)): Path<(i32, i32, i32)>,
) -> AppResult<impl IntoResponse> {
    let review_id = resolve_parents(&db, title_id, review_id).await?;

    let service = CommentService::new(db.clone());
    let comment = service.get_scoped(review_id, id).await?;

    let author = UserService::new(db).get_by_id(comment.author_id).await?;
    Ok(ApiResponse::ok(CommentResponse::from_model(
        comment,
        author.username,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments",
    security(("jwt_token" = [])),
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
    ),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Title or review not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn create_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path((title_id, review_id)): Path<(i32, i32)>,
    Json(payload): Json<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let review_id = resolve_parents(&db, title_id, review_id).await?;

    let requester = authorize_write(
        &db,
        &auth_user,
        ResourceKind::Comment,
        Some(auth_user.user_id),
    )
    .await?;

    let service = CommentService::new(db.clone());
    let comment = service
        .create(review_id, requester.user_id, &payload.text)
        .await?;

    let author = UserService::new(db).get_by_id(comment.author_id).await?;
    Ok(ApiResponse::ok(CommentResponse::from_model(
        comment,
        author.username,
    )))
}

#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{id}",
    security(("jwt_token" = [])),
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("id" = i32, Path, description = "Comment ID"),
    ),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not the author or a moderator", body = AppError),
        (status = 404, description = "Parent or comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn update_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path((title_id, review_id, id)): Path<(i32, i32, i32)>,
    Json(payload): Json<UpdateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let review_id = resolve_parents(&db, title_id, review_id).await?;

    let service = CommentService::new(db.clone());
    let existing = service.get_scoped(review_id, id).await?;

    authorize_write(
        &db,
        &auth_user,
        ResourceKind::Comment,
        Some(existing.author_id),
    )
    .await?;

    let comment = service.update(existing, payload.text).await?;

    let author = UserService::new(db).get_by_id(comment.author_id).await?;
    Ok(ApiResponse::ok(CommentResponse::from_model(
        comment,
        author.username,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{id}",
    security(("jwt_token" = [])),
    params(
        ("title_id" = i32, Path, description = "Title ID"),
        ("review_id" = i32, Path, description = "Review ID"),
        ("id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 200, description = "Comment deleted", body = String),
        (status = 403, description = "Not the author or a moderator", body = AppError),
        (status = 404, description = "Parent or comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn delete_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path((title_id, review_id, id)): Path<(i32, i32, i32)>,
) -> AppResult<impl IntoResponse> {
    let review_id = resolve_parents(&db, title_id, review_id).await?;

    let service = CommentService::new(db.clone());
    let existing = service.get_scoped(review_id, id).await?;

    authorize_write(
        &db,
        &auth_user,
        ResourceKind::Comment,
        Some(existing.author_id),
    )
    .await?;

    service.delete(existing.id).await?;

    Ok(ApiResponse::ok("Comment deleted"))
}
