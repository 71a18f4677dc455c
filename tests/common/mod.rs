#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Statement};
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, LazyLock, Once,
};

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);

// Tests share one database; hold a global lock for the duration of each test
// so table cleanup cannot race a neighbour.
static TEST_LOCK: LazyLock<Arc<tokio::sync::Mutex<()>>> =
    LazyLock::new(|| Arc::new(tokio::sync::Mutex::new(())));

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        // Rate limiting off so rapid test requests are not throttled
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        let config = kritika::config::jwt::JwtConfig::from_env().unwrap();
        let _ = kritika::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
    _lock: tokio::sync::OwnedMutexGuard<()>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let lock = TEST_LOCK.clone().lock_owned().await;

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Run migrations only once globally (using atomic bool for thread safety)
    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        kritika::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    // Clean data tables (reverse dependency order)
    cleanup_tables(&db).await;

    let email_service = kritika::services::email::EmailService::from_env();

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(kritika::routes::create_routes())
        .layer(axum::middleware::from_fn(
            kritika::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(email_service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let addr_str = format!("http://{}", addr);
    let client = Client::new();

    TestApp {
        addr: addr_str,
        db,
        client,
        _lock: lock,
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "comments",
        "reviews",
        "title_genres",
        "titles",
        "genres",
        "categories",
        "users",
    ];

    for table in tables {
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                format!("DELETE FROM {}", table),
            ))
            .await;
    }
}

/// Read the confirmation code straight from the store, standing in for the
/// email inbox.
pub async fn confirmation_code_for(db: &DatabaseConnection, username: &str) -> String {
    let user = kritika::models::User::find()
        .filter(kritika::models::user::Column::Username.eq(username))
        .one(db)
        .await
        .unwrap()
        .expect("user should exist");
    user.confirmation_code.expect("confirmation code should be set")
}

/// Sign up, grab the confirmation code, and exchange it for a token.
/// Returns (user_id, token).
pub async fn create_test_user(app: &TestApp, username: &str) -> (i32, String) {
    let email = format!("{}@example.com", username);

    let resp = app
        .client
        .post(app.url("/auth/signup"))
        .json(&serde_json::json!({
            "username": username,
            "email": email,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "signup should succeed");

    let code = confirmation_code_for(&app.db, username).await;

    let resp = app
        .client
        .post(app.url("/auth/token"))
        .json(&serde_json::json!({
            "username": username,
            "confirmation_code": code,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "token exchange should succeed");

    let body: serde_json::Value = resp.json().await.unwrap();
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let user = kritika::models::User::find()
        .filter(kritika::models::user::Column::Username.eq(username))
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();

    (user.id, token)
}

pub async fn set_role(db: &DatabaseConnection, user_id: i32, role: &str) {
    use sea_orm::ActiveModelTrait;

    let user = kritika::models::User::find_by_id(user_id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    let mut active: kritika::models::user::ActiveModel = user.into();
    active.role = sea_orm::ActiveValue::Set(role.to_string());
    active.update(db).await.unwrap();
}

pub async fn make_admin(db: &DatabaseConnection, user_id: i32) {
    set_role(db, user_id, "admin").await;
}

pub async fn make_moderator(db: &DatabaseConnection, user_id: i32) {
    set_role(db, user_id, "moderator").await;
}

/// Create a category as the given admin and return its slug.
pub async fn create_test_category(app: &TestApp, admin_token: &str, slug: &str) -> String {
    let resp = app
        .client
        .post(app.url("/categories"))
        .bearer_auth(admin_token)
        .json(&serde_json::json!({
            "name": format!("Category {}", slug),
            "slug": slug,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "category creation should succeed");
    slug.to_string()
}

/// Create a genre as the given admin and return its slug.
pub async fn create_test_genre(app: &TestApp, admin_token: &str, slug: &str) -> String {
    let resp = app
        .client
        .post(app.url("/genres"))
        .bearer_auth(admin_token)
        .json(&serde_json::json!({
            "name": format!("Genre {}", slug),
            "slug": slug,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "genre creation should succeed");
    slug.to_string()
}

/// Create a bare title (no category/genres) and return its id.
pub async fn create_test_title(app: &TestApp, admin_token: &str, name: &str) -> i64 {
    let resp = app
        .client
        .post(app.url("/titles"))
        .bearer_auth(admin_token)
        .json(&serde_json::json!({
            "name": name,
            "year": 2020,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "title creation should succeed");
    let body: serde_json::Value = resp.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap()
}

/// Create a review on a title and return its id.
pub async fn create_test_review(app: &TestApp, token: &str, title_id: i64, score: i32) -> i64 {
    let resp = app
        .client
        .post(app.url(&format!("/titles/{}/reviews", title_id)))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "text": "A fine piece of work",
            "score": score,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "review creation should succeed");
    let body: serde_json::Value = resp.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap()
}
