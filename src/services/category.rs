use crate::{
    error::{AppError, AppResult},
    models::{category, Category, CategoryModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, SqlErr,
};

pub struct CategoryService {
    db: DatabaseConnection,
}

impl CategoryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<CategoryModel>, u64)> {
        let mut query = Category::find().order_by_asc(category::Column::Name);
        if let Some(needle) = search {
            query = query.filter(category::Column::Name.contains(needle));
        }

        let paginator = query.paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let categories = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((categories, total))
    }

    pub async fn get_by_slug(&self, slug: &str) -> AppResult<CategoryModel> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(&self, name: &str, slug: &str) -> AppResult<CategoryModel> {
        let exists = Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .is_some();
        if exists {
            return Err(AppError::Conflict(
                "Category with this slug already exists".to_string(),
            ));
        }

        let now = chrono::Utc::now().naive_utc();
        let new_category = category::ActiveModel {
            name: sea_orm::ActiveValue::Set(name.to_string()),
            slug: sea_orm::ActiveValue::Set(slug.to_string()),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        match new_category.insert(&self.db).await {
            Ok(c) => Ok(c),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
                AppError::Conflict("Category with this slug already exists".to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, slug: &str) -> AppResult<()> {
        let existing = self.get_by_slug(slug).await?;
        Category::delete_by_id(existing.id).exec(&self.db).await?;
        Ok(())
    }
}
