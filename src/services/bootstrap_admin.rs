use crate::error::AppResult;
use crate::models::{user, User};
use crate::policy::Role;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::env;

#[derive(Debug, Clone)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub email: String,
}

impl BootstrapAdminConfig {
    pub fn from_env() -> Option<Self> {
        let enabled = env::var("BOOTSTRAP_ADMIN_ENABLED")
            .ok()
            .map(|v| v.trim().to_ascii_lowercase())
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes" | "y" | "on"))
            .unwrap_or(false);

        if !enabled {
            return None;
        }

        Some(Self {
            username: env::var("BOOTSTRAP_ADMIN_USERNAME").ok()?,
            email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok()?,
        })
    }
}

/// Seed the first admin at startup so role management has an entry point:
/// - if any admin exists already, nothing happens;
/// - if the configured username/email matches an existing user, it is
///   promoted;
/// - otherwise a new admin record is created (it still signs in through the
///   regular confirmation-code flow).
pub async fn ensure_bootstrap_admin(db: &DatabaseConnection) -> AppResult<()> {
    let Some(cfg) = BootstrapAdminConfig::from_env() else {
        return Ok(());
    };

    let admin_exists = User::find()
        .filter(user::Column::Role.eq(Role::Admin.as_str()))
        .one(db)
        .await?
        .is_some();
    if admin_exists {
        return Ok(());
    }

    let existing = User::find()
        .filter(
            sea_orm::Condition::any()
                .add(user::Column::Email.eq(cfg.email.clone()))
                .add(user::Column::Username.eq(cfg.username.clone())),
        )
        .one(db)
        .await?;

    let now = chrono::Utc::now().naive_utc();

    if let Some(user) = existing {
        let username = user.username.clone();
        let mut active: user::ActiveModel = user.into();
        active.role = sea_orm::ActiveValue::Set(Role::Admin.as_str().to_string());
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(db).await?;
        tracing::info!("Promoted '{}' to admin", username);
        return Ok(());
    }

    let new_user = user::ActiveModel {
        username: sea_orm::ActiveValue::Set(cfg.username.clone()),
        email: sea_orm::ActiveValue::Set(cfg.email),
        password_hash: sea_orm::ActiveValue::Set(None),
        role: sea_orm::ActiveValue::Set(Role::Admin.as_str().to_string()),
        is_superuser: sea_orm::ActiveValue::Set(false),
        confirmation_code: sea_orm::ActiveValue::Set(None),
        created_at: sea_orm::ActiveValue::Set(now),
        updated_at: sea_orm::ActiveValue::Set(now),
        ..Default::default()
    };

    new_user.insert(db).await?;
    tracing::info!("Created bootstrap admin '{}'", cfg.username);
    Ok(())
}
