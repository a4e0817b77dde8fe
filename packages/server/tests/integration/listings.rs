use serde_json::json;
use uuid::Uuid;

use crate::common::{TestApp, routes};

async fn item(app: &TestApp, token: &str) -> String {
    let artisan = app.create_artisan(token, "Meera Devi").await;
    app.create_item(token, &artisan, 5).await
}

#[tokio::test]
async fn listing_defaults_to_active_and_names_its_item() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_operator("ops@hunarkart.in").await;
    let item = item(&app, &token).await;

    let res = app
        .post_with_token(
            routes::LISTINGS,
            &json!({"item_id": item, "platform_name": "Etsy"}),
            &token,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["data"]["status"], "Active");
    assert!(res.body["data"]["listing_url"].is_null());
    assert_eq!(res.body["data"]["item"]["name"], "Blue pottery vase");
}

#[tokio::test]
async fn listing_requires_an_existing_item_and_a_web_url() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_operator("ops@hunarkart.in").await;
    let item = item(&app, &token).await;

    let res = app
        .post_with_token(
            routes::LISTINGS,
            &json!({"item_id": Uuid::now_v7(), "platform_name": "Etsy"}),
            &token,
        )
        .await;
    assert_eq!(res.status, 404);

    let res = app
        .post_with_token(
            routes::LISTINGS,
            &json!({"item_id": item, "platform_name": "Etsy", "listing_url": "ftp://etsy.com/x"}),
            &token,
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn update_can_deactivate_and_clear_url() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_operator("ops@hunarkart.in").await;
    let item = item(&app, &token).await;
    let listing = app.create_listing(&token, &item, "Etsy").await;

    let res = app
        .patch_with_token(
            &routes::listing(&listing),
            &json!({"status": "Inactive", "listing_url": null}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"]["status"], "Inactive");
    assert!(res.body["data"]["listing_url"].is_null());
    assert_eq!(res.body["data"]["platform_name"], "Etsy");

    let res = app
        .get_with_token(&format!("{}?status=Active", routes::LISTINGS), &token)
        .await;
    assert_eq!(res.body["data"]["pagination"]["total"], 0);
    let res = app
        .get_with_token(&format!("{}?item_id={item}", routes::LISTINGS), &token)
        .await;
    assert_eq!(res.body["data"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn delete_is_not_found_the_second_time() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_operator("ops@hunarkart.in").await;
    let item = item(&app, &token).await;
    let listing = app.create_listing(&token, &item, "Etsy").await;

    let res = app.delete_with_token(&routes::listing(&listing), &token).await;
    assert_eq!(res.status, 204);
    let res = app.delete_with_token(&routes::listing(&listing), &token).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}
