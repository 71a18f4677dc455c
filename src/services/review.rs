use crate::{
    error::{AppError, AppResult},
    models::{review, Review, ReviewModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, SqlErr,
};

pub struct ReviewService {
    db: DatabaseConnection,
}

impl ReviewService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_for_title(
        &self,
        title_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ReviewModel>, u64)> {
        let paginator = Review::find()
            .filter(review::Column::TitleId.eq(title_id))
            .order_by_asc(review::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let reviews = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((reviews, total))
    }

    /// Fetch a review under the given title; a mismatched parent is a 404.
    pub async fn get_scoped(&self, title_id: i32, review_id: i32) -> AppResult<ReviewModel> {
        let review = Review::find_by_id(review_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        if review.title_id != title_id {
            return Err(AppError::NotFound);
        }
        Ok(review)
    }

    pub async fn create(
        &self,
        title_id: i32,
        author_id: i32,
        text: &str,
        score: i32,
    ) -> AppResult<ReviewModel> {
        let already_reviewed = Review::find()
            .filter(review::Column::TitleId.eq(title_id))
            .filter(review::Column::AuthorId.eq(author_id))
            .one(&self.db)
            .await?
            .is_some();
        if already_reviewed {
            return Err(AppError::Conflict(
                "Review for this title already exists".to_string(),
            ));
        }

        let now = chrono::Utc::now().naive_utc();
        let new_review = review::ActiveModel {
            title_id: sea_orm::ActiveValue::Set(title_id),
            author_id: sea_orm::ActiveValue::Set(author_id),
            text: sea_orm::ActiveValue::Set(text.to_string()),
            score: sea_orm::ActiveValue::Set(score),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        match new_review.insert(&self.db).await {
            Ok(r) => Ok(r),
            // Concurrent duplicate settled by the unique index.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
                AppError::Conflict("Review for this title already exists".to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update(
        &self,
        existing: ReviewModel,
        text: Option<String>,
        score: Option<i32>,
    ) -> AppResult<ReviewModel> {
        let now = chrono::Utc::now().naive_utc();

        let mut active: review::ActiveModel = existing.into();
        if let Some(text) = text {
            active.text = sea_orm::ActiveValue::Set(text);
        }
        if let Some(score) = score {
            active.score = sea_orm::ActiveValue::Set(score);
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    pub async fn delete(&self, review_id: i32) -> AppResult<()> {
        Review::delete_by_id(review_id).exec(&self.db).await?;
        Ok(())
    }

    /// All scores for a title, for the derived rating.
    pub async fn scores_for_title(&self, title_id: i32) -> AppResult<Vec<i32>> {
        let scores: Vec<i32> = Review::find()
            .filter(review::Column::TitleId.eq(title_id))
            .select_only()
            .column(review::Column::Score)
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(scores)
    }

    /// Mean review score, None when the title has no reviews.
    pub async fn rating_for_title(&self, title_id: i32) -> AppResult<Option<f64>> {
        let scores = self.scores_for_title(title_id).await?;
        if scores.is_empty() {
            return Ok(None);
        }
        let sum: i64 = scores.iter().map(|s| *s as i64).sum();
        Ok(Some(sum as f64 / scores.len() as f64))
    }
}
