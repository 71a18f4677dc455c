use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api/v1", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public_read = public_read_routes(&rate_limit_config);
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    auth.merge(public_read).merge(protected)
}

/// Auth routes: signup and confirmation-code token exchange.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/signup", routing::post(handlers::signup))
        .route("/auth/token", routing::post(handlers::issue_token));

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Public read routes: the whole catalog plus reviews and comments.
fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Titles
        .route("/titles", routing::get(handlers::title::list_titles))
        .route("/titles/{id}", routing::get(handlers::title::get_title))
        // Categories
        .route(
            "/categories",
            routing::get(handlers::category::list_categories),
        )
        // Genres
        .route("/genres", routing::get(handlers::genre::list_genres))
        // Reviews
        .route(
            "/titles/{title_id}/reviews",
            routing::get(handlers::review::list_reviews),
        )
        .route(
            "/titles/{title_id}/reviews/{id}",
            routing::get(handlers::review::get_review),
        )
        // Comments
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments",
            routing::get(handlers::comment::list_comments),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{id}",
            routing::get(handlers::comment::get_comment),
        );

    with_optional_rate_limit(router, config.enabled, config.public_read)
}

/// Protected routes: all authenticated writes plus user management.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Titles (admin only - checked via the policy evaluator)
        .route("/titles", routing::post(handlers::title::create_title))
        .route(
            "/titles/{id}",
            routing::patch(handlers::title::update_title)
                .delete(handlers::title::delete_title),
        )
        // Categories
        .route(
            "/categories",
            routing::post(handlers::category::create_category),
        )
        .route(
            "/categories/{slug}",
            routing::delete(handlers::category::delete_category),
        )
        // Genres
        .route("/genres", routing::post(handlers::genre::create_genre))
        .route(
            "/genres/{slug}",
            routing::delete(handlers::genre::delete_genre),
        )
        // Reviews
        .route(
            "/titles/{title_id}/reviews",
            routing::post(handlers::review::create_review),
        )
        .route(
            "/titles/{title_id}/reviews/{id}",
            routing::patch(handlers::review::update_review)
                .delete(handlers::review::delete_review),
        )
        // Comments
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments",
            routing::post(handlers::comment::create_comment),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{id}",
            routing::patch(handlers::comment::update_comment)
                .delete(handlers::comment::delete_comment),
        )
        // Self profile; PUT and PATCH share partial-update semantics
        .route(
            "/users/me",
            routing::get(handlers::user::get_me)
                .put(handlers::user::update_me)
                .patch(handlers::user::update_me),
        )
        // Admin user management; PUT is explicitly rejected
        .route("/users", routing::get(handlers::user::list_users))
        .route(
            "/users/{username}",
            routing::get(handlers::user::get_user)
                .patch(handlers::user::admin_update_user)
                .put(handlers::user::user_put_not_allowed),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
        .expect("Invalid rate limit configuration");

    router.layer(GovernorLayer::new(governor_conf))
}
