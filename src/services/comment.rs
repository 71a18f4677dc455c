use crate::{
    error::{AppError, AppResult},
    models::{comment, Comment, CommentModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

pub struct CommentService {
    db: DatabaseConnection,
}

impl CommentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_for_review(
        &self,
        review_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<CommentModel>, u64)> {
        let paginator = Comment::find()
            .filter(comment::Column::ReviewId.eq(review_id))
            .order_by_asc(comment::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let comments = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((comments, total))
    }

    /// Fetch a comment under the given review; a mismatched parent is a 404.
    pub async fn get_scoped(&self, review_id: i32, comment_id: i32) -> AppResult<CommentModel> {
        let comment = Comment::find_by_id(comment_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        if comment.review_id != review_id {
            return Err(AppError::NotFound);
        }
        Ok(comment)
    }

    pub async fn create(
        &self,
        review_id: i32,
        author_id: i32,
        text: &str,
    ) -> AppResult<CommentModel> {
        let now = chrono::Utc::now().naive_utc();

        let new_comment = comment::ActiveModel {
            review_id: sea_orm::ActiveValue::Set(review_id),
            author_id: sea_orm::ActiveValue::Set(author_id),
            text: sea_orm::ActiveValue::Set(text.to_string()),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let comment = new_comment.insert(&self.db).await?;
        Ok(comment)
    }

    pub async fn update(&self, existing: CommentModel, text: String) -> AppResult<CommentModel> {
        let now = chrono::Utc::now().naive_utc();

        let mut active: comment::ActiveModel = existing.into();
        active.text = sea_orm::ActiveValue::Set(text);
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    pub async fn delete(&self, comment_id: i32) -> AppResult<()> {
        Comment::delete_by_id(comment_id).exec(&self.db).await?;
        Ok(())
    }
}
