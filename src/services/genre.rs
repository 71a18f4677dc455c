use crate::{
    error::{AppError, AppResult},
    models::{genre, Genre, GenreModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, SqlErr,
};

pub struct GenreService {
    db: DatabaseConnection,
}

impl GenreService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<GenreModel>, u64)> {
        let mut query = Genre::find().order_by_asc(genre::Column::Name);
        if let Some(needle) = search {
            query = query.filter(genre::Column::Name.contains(needle));
        }

        let paginator = query.paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let genres = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((genres, total))
    }

    pub async fn get_by_slug(&self, slug: &str) -> AppResult<GenreModel> {
        Genre::find()
            .filter(genre::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(&self, name: &str, slug: &str) -> AppResult<GenreModel> {
        let exists = Genre::find()
            .filter(genre::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .is_some();
        if exists {
            return Err(AppError::Conflict(
                "Genre with this slug already exists".to_string(),
            ));
        }

        let now = chrono::Utc::now().naive_utc();
        let new_genre = genre::ActiveModel {
            name: sea_orm::ActiveValue::Set(name.to_string()),
            slug: sea_orm::ActiveValue::Set(slug.to_string()),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        match new_genre.insert(&self.db).await {
            Ok(g) => Ok(g),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
                AppError::Conflict("Genre with this slug already exists".to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, slug: &str) -> AppResult<()> {
        let existing = self.get_by_slug(slug).await?;
        Genre::delete_by_id(existing.id).exec(&self.db).await?;
        Ok(())
    }
}
