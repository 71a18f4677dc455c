use crate::{
    error::{AppError, AppResult},
    models::{user, User, UserModel},
    services::email::EmailService,
    utils::{encode_token, generate_confirmation_code, hash_password},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, SqlErr};

pub struct AuthService {
    db: DatabaseConnection,
}

pub struct SignupFields {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub password: Option<String>,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a user and send the confirmation code.
    ///
    /// Re-registering the exact (username, email) pair is idempotent: the
    /// existing record gets a fresh code and the email is re-sent. A taken
    /// username with a different email, or vice versa, is a conflict.
    pub async fn signup(
        &self,
        fields: SignupFields,
        email_service: &EmailService,
    ) -> AppResult<UserModel> {
        let by_username = User::find()
            .filter(user::Column::Username.eq(fields.username.as_str()))
            .one(&self.db)
            .await?;
        let by_email = User::find()
            .filter(user::Column::Email.eq(fields.email.as_str()))
            .one(&self.db)
            .await?;

        let code = generate_confirmation_code()?;
        let now = chrono::Utc::now().naive_utc();

        let user = match (by_username, by_email) {
            (Some(u), Some(e)) if u.id == e.id => {
                // Same person signing up again: reissue the code.
                let mut active: user::ActiveModel = u.into();
                active.confirmation_code = sea_orm::ActiveValue::Set(Some(code.clone()));
                active.updated_at = sea_orm::ActiveValue::Set(now);
                active.update(&self.db).await?
            }
            (Some(_), _) => {
                return Err(AppError::Conflict(
                    "Username is already taken with a different email".to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(AppError::Conflict(
                    "Email is already registered to a different username".to_string(),
                ));
            }
            (None, None) => {
                let password_hash = match fields.password.as_deref() {
                    Some(p) => Some(hash_password(p)?),
                    None => None,
                };

                let new_user = user::ActiveModel {
                    username: sea_orm::ActiveValue::Set(fields.username),
                    email: sea_orm::ActiveValue::Set(fields.email),
                    password_hash: sea_orm::ActiveValue::Set(password_hash),
                    role: sea_orm::ActiveValue::Set(
                        crate::policy::Role::User.as_str().to_string(),
                    ),
                    is_superuser: sea_orm::ActiveValue::Set(false),
                    confirmation_code: sea_orm::ActiveValue::Set(Some(code.clone())),
                    bio: sea_orm::ActiveValue::Set(fields.bio),
                    first_name: sea_orm::ActiveValue::Set(fields.first_name),
                    last_name: sea_orm::ActiveValue::Set(fields.last_name),
                    created_at: sea_orm::ActiveValue::Set(now),
                    updated_at: sea_orm::ActiveValue::Set(now),
                    ..Default::default()
                };

                match new_user.insert(&self.db).await {
                    Ok(u) => u,
                    // Lost a signup race on username/email uniqueness.
                    Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                        return Err(AppError::Conflict(
                            "Username or email is already registered".to_string(),
                        ));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        // Code delivery failure is not fatal; signup can be repeated.
        if let Err(e) = email_service
            .send_confirmation_email(&user.email, &code)
            .await
        {
            tracing::warn!("Failed to send confirmation email: {e}");
        }

        Ok(user)
    }

    /// Exchange (username, confirmation_code) for a bearer token.
    ///
    /// The stored code is compared verbatim; it is not invalidated on
    /// success.
    pub async fn issue_token(&self, username: &str, confirmation_code: &str) -> AppResult<String> {
        let user = User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        match user.confirmation_code.as_deref() {
            Some(stored) if stored == confirmation_code => {}
            _ => return Err(AppError::Unauthorized),
        }

        let token = encode_token(&user.id.to_string())?;
        Ok(token)
    }
}
