use crate::{
    error::{AppError, AppResult},
    models::{
        category, genre, title, title_genre, Category, CategoryModel, Genre, GenreModel, Title,
        TitleGenre, TitleModel,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};

/// Optional list filters, all combinable.
#[derive(Debug, Default)]
pub struct TitleFilters {
    pub category: Option<String>,
    pub genre: Option<String>,
    pub name: Option<String>,
    pub year: Option<i32>,
}

pub struct TitleService {
    db: DatabaseConnection,
}

impl TitleService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        filters: &TitleFilters,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<TitleModel>, u64)> {
        let mut query = Title::find().order_by_asc(title::Column::Name);

        if let Some(slug) = filters.category.as_deref() {
            query = query
                .join(JoinType::InnerJoin, title::Relation::Category.def())
                .filter(category::Column::Slug.eq(slug));
        }
        if let Some(slug) = filters.genre.as_deref() {
            query = query
                .join(
                    JoinType::InnerJoin,
                    title_genre::Relation::Title.def().rev(),
                )
                .join(JoinType::InnerJoin, title_genre::Relation::Genre.def())
                .filter(genre::Column::Slug.eq(slug));
        }
        if let Some(needle) = filters.name.as_deref() {
            query = query.filter(title::Column::Name.contains(needle));
        }
        if let Some(year) = filters.year {
            query = query.filter(title::Column::Year.eq(year));
        }

        let paginator = query.paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let titles = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((titles, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<TitleModel> {
        Title::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(
        &self,
        name: &str,
        year: i32,
        description: Option<String>,
        category_slug: Option<&str>,
        genre_slugs: &[String],
    ) -> AppResult<TitleModel> {
        let category_id = match category_slug {
            Some(slug) => Some(self.resolve_category(slug).await?.id),
            None => None,
        };
        let genre_ids = self.resolve_genres(genre_slugs).await?;

        let now = chrono::Utc::now().naive_utc();
        let new_title = title::ActiveModel {
            name: sea_orm::ActiveValue::Set(name.to_string()),
            year: sea_orm::ActiveValue::Set(year),
            description: sea_orm::ActiveValue::Set(description),
            category_id: sea_orm::ActiveValue::Set(category_id),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let title = new_title.insert(&self.db).await?;
        self.set_genres(title.id, &genre_ids).await?;
        Ok(title)
    }

    /// Partial update; absent fields are left unchanged.
    pub async fn update(
        &self,
        id: i32,
        name: Option<String>,
        year: Option<i32>,
        description: Option<String>,
        category_slug: Option<&str>,
        genre_slugs: Option<&[String]>,
    ) -> AppResult<TitleModel> {
        let existing = self.get_by_id(id).await?;

        let category_id = match category_slug {
            Some(slug) => Some(self.resolve_category(slug).await?.id),
            None => existing.category_id,
        };
        let genre_ids = match genre_slugs {
            Some(slugs) => Some(self.resolve_genres(slugs).await?),
            None => None,
        };

        let now = chrono::Utc::now().naive_utc();
        let mut active: title::ActiveModel = existing.into();
        if let Some(name) = name {
            active.name = sea_orm::ActiveValue::Set(name);
        }
        if let Some(year) = year {
            active.year = sea_orm::ActiveValue::Set(year);
        }
        if let Some(description) = description {
            active.description = sea_orm::ActiveValue::Set(Some(description));
        }
        active.category_id = sea_orm::ActiveValue::Set(category_id);
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        if let Some(genre_ids) = genre_ids {
            self.set_genres(updated.id, &genre_ids).await?;
        }
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.get_by_id(id).await?;
        Title::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    pub async fn category_for(&self, title: &TitleModel) -> AppResult<Option<CategoryModel>> {
        let Some(category_id) = title.category_id else {
            return Ok(None);
        };
        Ok(Category::find_by_id(category_id).one(&self.db).await?)
    }

    pub async fn genres_for(&self, title_id: i32) -> AppResult<Vec<GenreModel>> {
        let genre_ids: Vec<i32> = TitleGenre::find()
            .filter(title_genre::Column::TitleId.eq(title_id))
            .select_only()
            .column(title_genre::Column::GenreId)
            .into_tuple()
            .all(&self.db)
            .await?;

        let genres = Genre::find()
            .filter(genre::Column::Id.is_in(genre_ids))
            .order_by_asc(genre::Column::Name)
            .all(&self.db)
            .await?;
        Ok(genres)
    }

    async fn resolve_category(&self, slug: &str) -> AppResult<CategoryModel> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Unknown category slug '{}'", slug)))
    }

    async fn resolve_genres(&self, slugs: &[String]) -> AppResult<Vec<i32>> {
        let mut ids = Vec::with_capacity(slugs.len());
        for slug in slugs {
            let genre = Genre::find()
                .filter(genre::Column::Slug.eq(slug.as_str()))
                .one(&self.db)
                .await?
                .ok_or_else(|| AppError::Validation(format!("Unknown genre slug '{}'", slug)))?;
            ids.push(genre.id);
        }
        Ok(ids)
    }

    /// Replace the genre set for a title.
    async fn set_genres(&self, title_id: i32, genre_ids: &[i32]) -> AppResult<()> {
        TitleGenre::delete_many()
            .filter(title_genre::Column::TitleId.eq(title_id))
            .exec(&self.db)
            .await?;

        if genre_ids.is_empty() {
            return Ok(());
        }

        let rows: Vec<title_genre::ActiveModel> = genre_ids
            .iter()
            .map(|genre_id| title_genre::ActiveModel {
                title_id: sea_orm::ActiveValue::Set(title_id),
                genre_id: sea_orm::ActiveValue::Set(*genre_id),
            })
            .collect();
        TitleGenre::insert_many(rows).exec(&self.db).await?;
        Ok(())
    }
}
