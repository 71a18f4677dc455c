mod common;

use serde_json::Value;

#[tokio::test]
async fn anonymous_can_list_genres() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/genres")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn anonymous_cannot_create_genre() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/genres"))
        .json(&serde_json::json!({ "name": "Drama", "slug": "drama" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn admin_creates_genre() {
    let app = common::spawn_app().await;
    let (id, token) = common::create_test_user(&app, "genre_admin").await;
    common::make_admin(&app.db, id).await;

    let resp = app
        .client
        .post(app.url("/genres"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "name": "Drama", "slug": "drama" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["slug"].as_str().unwrap(), "drama");
}

#[tokio::test]
async fn duplicate_genre_slug_is_conflict() {
    let app = common::spawn_app().await;
    let (id, token) = common::create_test_user(&app, "genre_admin2").await;
    common::make_admin(&app.db, id).await;

    common::create_test_genre(&app, &token, "horror").await;

    let resp = app
        .client
        .post(app.url("/genres"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "name": "More Horror", "slug": "horror" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn admin_deletes_genre_by_slug() {
    let app = common::spawn_app().await;
    let (id, token) = common::create_test_user(&app, "genre_admin3").await;
    common::make_admin(&app.db, id).await;

    common::create_test_genre(&app, &token, "noir").await;

    let resp = app
        .client
        .delete(app.url("/genres/noir"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .delete(app.url("/genres/noir"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
