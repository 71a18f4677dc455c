use crate::{
    error::{AppError, AppResult},
    models::{User, UserModel},
    policy::{self, Action, Decision, Requester, ResourceKind, Role},
    utils::jwt::decode_token,
};
use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response, Extension};
use sea_orm::{DatabaseConnection, EntityTrait};

/// Identity extracted from the bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i32,
}

/// JWT authentication middleware.
///
/// Verifies the token from the Authorization header, confirms the user still
/// exists, and adds the identity to request extensions.
pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers).ok_or(AppError::Unauthorized)?;

    let claims = decode_token(&token).map_err(|_| AppError::Unauthorized)?;

    let user_id: i32 = claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized)?;

    User::find_by_id(user_id)
        .one(&db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Fetch the caller's user record and build the policy-facing requester.
pub async fn load_requester(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
) -> AppResult<(UserModel, Requester)> {
    let user = User::find_by_id(auth_user.user_id)
        .one(db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let role = Role::parse(&user.role).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("Unknown role '{}' stored for user", user.role))
    })?;

    let requester = Requester {
        user_id: user.id,
        role,
        is_superuser: user.is_superuser,
    };
    Ok((user, requester))
}

/// Run the policy evaluator for an authenticated request and translate a
/// deny into 403.
pub async fn authorize(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
    action: Action,
    kind: ResourceKind,
    owner: Option<i32>,
) -> AppResult<Requester> {
    let (_, requester) = load_requester(db, auth_user).await?;
    match policy::decide(action, kind, Some(&requester), owner) {
        Decision::Allow => Ok(requester),
        Decision::Deny => Err(AppError::Forbidden),
    }
}

pub async fn authorize_write(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
    kind: ResourceKind,
    owner: Option<i32>,
) -> AppResult<Requester> {
    authorize(db, auth_user, Action::Write, kind, owner).await
}

/// Extractor for AuthUser from request extensions
use axum::extract::FromRequestParts;

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(AppError::Unauthorized)
    }
}
