use crate::{
    error::{AppError, AppResult},
    models::{user, User, UserModel},
    policy::Role,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// Partial profile update. Absent fields are left unchanged; `role` is only
/// honored on the admin path.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<String>,
}

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn get_by_username(&self, username: &str) -> AppResult<UserModel> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Batch username lookup for shaping review/comment authors.
    pub async fn usernames_for(
        &self,
        ids: &[i32],
    ) -> AppResult<std::collections::HashMap<i32, String>> {
        if ids.is_empty() {
            return Ok(std::collections::HashMap::new());
        }
        let users = User::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await?;
        Ok(users.into_iter().map(|u| (u.id, u.username)).collect())
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<UserModel>, u64)> {
        let mut query = User::find().order_by_asc(user::Column::Username);
        if let Some(needle) = search {
            query = query.filter(user::Column::Username.contains(needle));
        }

        let paginator = query.paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((users, total))
    }

    /// Self-service update: the role field is ignored even if supplied.
    pub async fn update_self(&self, user_id: i32, update: ProfileUpdate) -> AppResult<UserModel> {
        let existing = self.get_by_id(user_id).await?;
        self.apply_update(existing, update, false).await
    }

    /// Admin update of an arbitrary user, including the role.
    pub async fn update_by_admin(
        &self,
        username: &str,
        update: ProfileUpdate,
    ) -> AppResult<UserModel> {
        let existing = self.get_by_username(username).await?;
        self.apply_update(existing, update, true).await
    }

    async fn apply_update(
        &self,
        existing: UserModel,
        update: ProfileUpdate,
        allow_role_change: bool,
    ) -> AppResult<UserModel> {
        if let Some(username) = update.username.as_deref() {
            if username != existing.username {
                let taken = User::find()
                    .filter(user::Column::Username.eq(username))
                    .one(&self.db)
                    .await?
                    .is_some();
                if taken {
                    return Err(AppError::Conflict(
                        "Username is already taken".to_string(),
                    ));
                }
            }
        }
        if let Some(email) = update.email.as_deref() {
            if email != existing.email {
                let taken = User::find()
                    .filter(user::Column::Email.eq(email))
                    .one(&self.db)
                    .await?
                    .is_some();
                if taken {
                    return Err(AppError::Conflict(
                        "Email is already registered".to_string(),
                    ));
                }
            }
        }

        let role = match (allow_role_change, update.role.as_deref()) {
            (true, Some(raw)) => {
                let role = Role::parse(raw).ok_or_else(|| {
                    AppError::Validation(format!(
                        "Invalid role '{}'. Must be one of: user, moderator, admin",
                        raw
                    ))
                })?;
                Some(role.as_str().to_string())
            }
            _ => None,
        };

        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = existing.into();
        if let Some(username) = update.username {
            active.username = sea_orm::ActiveValue::Set(username);
        }
        if let Some(email) = update.email {
            active.email = sea_orm::ActiveValue::Set(email);
        }
        if let Some(first_name) = update.first_name {
            active.first_name = sea_orm::ActiveValue::Set(Some(first_name));
        }
        if let Some(last_name) = update.last_name {
            active.last_name = sea_orm::ActiveValue::Set(Some(last_name));
        }
        if let Some(bio) = update.bio {
            active.bio = sea_orm::ActiveValue::Set(Some(bio));
        }
        if let Some(role) = role {
            active.role = sea_orm::ActiveValue::Set(role);
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }
}
