mod common;

use serde_json::Value;

#[tokio::test]
async fn me_returns_own_profile() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "selfie").await;

    let resp = app
        .client
        .get(app.url("/users/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["username"].as_str().unwrap(), "selfie");
    assert_eq!(body["data"]["role"].as_str().unwrap(), "user");
}

#[tokio::test]
async fn me_requires_authentication() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/users/me")).send().await.unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn me_patch_updates_profile_fields() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "profile_user").await;

    let resp = app
        .client
        .patch(app.url("/users/me"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "first_name": "Pat",
            "bio": "Writes about westerns",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["first_name"].as_str().unwrap(), "Pat");
    assert_eq!(body["data"]["bio"].as_str().unwrap(), "Writes about westerns");
}

#[tokio::test]
async fn me_cannot_self_promote() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "ambitious").await;

    // The role field is not part of the self-service update; it is ignored.
    let resp = app
        .client
        .patch(app.url("/users/me"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "role": "admin", "bio": "still plain" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["role"].as_str().unwrap(), "user");
}

#[tokio::test]
async fn me_put_behaves_like_patch() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "putter").await;

    let resp = app
        .client
        .put(app.url("/users/me"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "last_name": "Putnik" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["last_name"].as_str().unwrap(), "Putnik");
}

#[tokio::test]
async fn admin_lists_and_searches_users() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "user_admin").await;
    common::make_admin(&app.db, admin_id).await;
    common::create_test_user(&app, "findable").await;

    let resp = app
        .client
        .get(app.url("/users"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);

    let resp = app
        .client
        .get(app.url("/users?search=find"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["username"].as_str().unwrap(), "findable");
}

#[tokio::test]
async fn plain_user_cannot_list_users() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "nosy").await;

    let resp = app
        .client
        .get(app.url("/users"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn admin_promotes_user_to_moderator() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "promoter").await;
    common::make_admin(&app.db, admin_id).await;
    common::create_test_user(&app, "promotee").await;

    let resp = app
        .client
        .patch(app.url("/users/promotee"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "role": "moderator" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["role"].as_str().unwrap(), "moderator");
}

#[tokio::test]
async fn invalid_role_is_rejected() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "role_admin").await;
    common::make_admin(&app.db, admin_id).await;
    common::create_test_user(&app, "role_target").await;

    let resp = app
        .client
        .patch(app.url("/users/role_target"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "role": "banned" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn put_on_user_management_path_is_method_not_allowed() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "put_admin").await;
    common::make_admin(&app.db, admin_id).await;
    common::create_test_user(&app, "put_target").await;

    let resp = app
        .client
        .put(app.url("/users/put_target"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "role": "moderator" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 405);

    // PATCH on the same path works.
    let resp = app
        .client
        .patch(app.url("/users/put_target"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "role": "moderator" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn plain_user_cannot_patch_other_users() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "plain_patcher").await;
    common::create_test_user(&app, "patch_victim").await;

    let resp = app
        .client
        .patch(app.url("/users/patch_victim"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "bio": "hacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn admin_gets_missing_user_not_found() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "getter_admin").await;
    common::make_admin(&app.db, admin_id).await;

    let resp = app
        .client
        .get(app.url("/users/ghost"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn username_change_to_taken_name_is_conflict() {
    let app = common::spawn_app().await;
    common::create_test_user(&app, "original_name").await;
    let (_, token) = common::create_test_user(&app, "wants_rename").await;

    let resp = app
        .client
        .patch(app.url("/users/me"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "username": "original_name" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}
