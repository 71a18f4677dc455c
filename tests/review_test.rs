mod common;

use serde_json::Value;

#[tokio::test]
async fn user_creates_review() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "rev_admin").await;
    common::make_admin(&app.db, admin_id).await;
    let title_id = common::create_test_title(&app, &admin_token, "Reviewed Work").await;

    let (_, token) = common::create_test_user(&app, "reviewer").await;
    let resp = app
        .client
        .post(app.url(&format!("/titles/{}/reviews", title_id)))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "text": "Loved it", "score": 8 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["author"].as_str().unwrap(), "reviewer");
    assert_eq!(body["data"]["score"].as_i64().unwrap(), 8);
    assert!(body["data"]["pub_date"].as_str().is_some());
}

#[tokio::test]
async fn out_of_range_scores_are_rejected() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "rev_admin2").await;
    common::make_admin(&app.db, admin_id).await;
    let title_id = common::create_test_title(&app, &admin_token, "Scored Work").await;

    let (_, token) = common::create_test_user(&app, "scorer").await;
    for bad_score in [0, 11] {
        let resp = app
            .client
            .post(app.url(&format!("/titles/{}/reviews", title_id)))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "text": "Out of range", "score": bad_score }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "score {} should be rejected", bad_score);
    }

    for good_score in [1, 10] {
        let resp = app
            .client
            .post(app.url(&format!("/titles/{}/reviews", title_id)))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "text": "Boundary", "score": good_score }))
            .send()
            .await
            .unwrap();
        // Only the first in-range attempt succeeds; the second one hits the
        // one-review-per-title rule.
        assert!(
            resp.status() == 200 || resp.status() == 409,
            "score {} should pass validation",
            good_score
        );
    }
}

#[tokio::test]
async fn second_review_for_same_title_is_conflict() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "rev_admin3").await;
    common::make_admin(&app.db, admin_id).await;
    let title_id = common::create_test_title(&app, &admin_token, "Once Only").await;

    let (_, token) = common::create_test_user(&app, "one_review").await;
    common::create_test_review(&app, &token, title_id, 7).await;

    let resp = app
        .client
        .post(app.url(&format!("/titles/{}/reviews", title_id)))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "text": "Again!", "score": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn same_user_can_review_different_titles() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "rev_admin4").await;
    common::make_admin(&app.db, admin_id).await;
    let first = common::create_test_title(&app, &admin_token, "First Work").await;
    let second = common::create_test_title(&app, &admin_token, "Second Work").await;

    let (_, token) = common::create_test_user(&app, "busy_reviewer").await;
    common::create_test_review(&app, &token, first, 5).await;
    common::create_test_review(&app, &token, second, 6).await;
}

#[tokio::test]
async fn author_updates_own_review() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "rev_admin5").await;
    common::make_admin(&app.db, admin_id).await;
    let title_id = common::create_test_title(&app, &admin_token, "Edited Work").await;

    let (_, token) = common::create_test_user(&app, "editor").await;
    let review_id = common::create_test_review(&app, &token, title_id, 3).await;

    let resp = app
        .client
        .patch(app.url(&format!("/titles/{}/reviews/{}", title_id, review_id)))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "score": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["score"].as_i64().unwrap(), 9);
}

#[tokio::test]
async fn stranger_cannot_update_review() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "rev_admin6").await;
    common::make_admin(&app.db, admin_id).await;
    let title_id = common::create_test_title(&app, &admin_token, "Protected Work").await;

    let (_, author_token) = common::create_test_user(&app, "orig_author").await;
    let review_id = common::create_test_review(&app, &author_token, title_id, 5).await;

    let (_, stranger_token) = common::create_test_user(&app, "stranger").await;
    let resp = app
        .client
        .patch(app.url(&format!("/titles/{}/reviews/{}", title_id, review_id)))
        .bearer_auth(&stranger_token)
        .json(&serde_json::json!({ "score": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn moderator_updates_any_review() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "rev_admin7").await;
    common::make_admin(&app.db, admin_id).await;
    let title_id = common::create_test_title(&app, &admin_token, "Moderated Work").await;

    let (_, author_token) = common::create_test_user(&app, "mod_target").await;
    let review_id = common::create_test_review(&app, &author_token, title_id, 2).await;

    let (mod_id, mod_token) = common::create_test_user(&app, "the_moderator").await;
    common::make_moderator(&app.db, mod_id).await;

    let resp = app
        .client
        .patch(app.url(&format!("/titles/{}/reviews/{}", title_id, review_id)))
        .bearer_auth(&mod_token)
        .json(&serde_json::json!({ "text": "Cleaned up by moderation" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn review_delete_cascades_to_comments() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "rev_admin8").await;
    common::make_admin(&app.db, admin_id).await;
    let title_id = common::create_test_title(&app, &admin_token, "Cascading Work").await;

    let (_, token) = common::create_test_user(&app, "cascade_author").await;
    let review_id = common::create_test_review(&app, &token, title_id, 5).await;

    let resp = app
        .client
        .post(app.url(&format!(
            "/titles/{}/reviews/{}/comments",
            title_id, review_id
        )))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "text": "A comment to be swept away" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .delete(app.url(&format!("/titles/{}/reviews/{}", title_id, review_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // The comment listing 404s with its parent gone.
    let resp = app
        .client
        .get(app.url(&format!(
            "/titles/{}/reviews/{}/comments",
            title_id, review_id
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn reviews_for_missing_title_are_not_found() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/titles/999999/reviews"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn review_under_wrong_title_is_not_found() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_test_user(&app, "rev_admin9").await;
    common::make_admin(&app.db, admin_id).await;
    let first = common::create_test_title(&app, &admin_token, "Own Parent").await;
    let second = common::create_test_title(&app, &admin_token, "Other Parent").await;

    let (_, token) = common::create_test_user(&app, "scoped_author").await;
    let review_id = common::create_test_review(&app, &token, first, 5).await;

    let resp = app
        .client
        .get(app.url(&format!("/titles/{}/reviews/{}", second, review_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
