use serde_json::json;
use uuid::Uuid;

use crate::common::{TestApp, routes};

fn vase(artisan_id: &str) -> serde_json::Value {
    json!({
        "artisan_id": artisan_id,
        "name": "Blue pottery vase",
        "description": "Hand-painted vase",
        "category": "Pottery",
        "price": 1499.0,
        "quantity": 4,
    })
}

#[tokio::test]
async fn item_is_created_available_with_its_owner() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_operator("ops@hunarkart.in").await;
    let artisan = app.create_artisan(&token, "Meera Devi").await;

    let res = app.post_with_token(routes::ITEMS, &vase(&artisan), &token).await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["data"]["status"], "Available");
    assert_eq!(res.body["data"]["quantity"], 4);
    assert_eq!(res.body["data"]["artisan"]["name"], "Meera Devi");
}

#[tokio::test]
async fn item_needs_an_existing_artisan() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_operator("ops@hunarkart.in").await;

    let res = app
        .post_with_token(routes::ITEMS, &vase(&Uuid::now_v7().to_string()), &token)
        .await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn negative_price_or_quantity_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_operator("ops@hunarkart.in").await;
    let artisan = app.create_artisan(&token, "Meera Devi").await;

    let mut body = vase(&artisan);
    body["price"] = json!(-1.0);
    let res = app.post_with_token(routes::ITEMS, &body, &token).await;
    assert_eq!(res.status, 400);

    let mut body = vase(&artisan);
    body["quantity"] = json!(-1);
    let res = app.post_with_token(routes::ITEMS, &body, &token).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn list_filters_by_artisan_status_and_category() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_operator("ops@hunarkart.in").await;
    let meera = app.create_artisan(&token, "Meera Devi").await;
    let ramesh = app.create_artisan(&token, "Ramesh Kumar").await;
    app.create_item(&token, &meera, 2).await;
    let mut shawl = vase(&ramesh);
    shawl["category"] = json!("Textiles");
    shawl["status"] = json!("Draft");
    let res = app.post_with_token(routes::ITEMS, &shawl, &token).await;
    assert_eq!(res.status, 201, "{}", res.text);

    let res = app
        .get_with_token(&format!("{}?artisan_id={meera}", routes::ITEMS), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"]["pagination"]["total"], 1);

    let res = app
        .get_with_token(&format!("{}?status=Draft", routes::ITEMS), &token)
        .await;
    assert_eq!(res.body["data"]["pagination"]["total"], 1);
    assert_eq!(res.body["data"]["items"][0]["artisan"]["name"], "Ramesh Kumar");

    let res = app
        .get_with_token(&format!("{}?category=Textiles", routes::ITEMS), &token)
        .await;
    assert_eq!(res.body["data"]["pagination"]["total"], 1);

    let res = app
        .get_with_token(&format!("{}?artisan_id=bogus", routes::ITEMS), &token)
        .await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn pagination_is_bounded() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_operator("ops@hunarkart.in").await;
    let artisan = app.create_artisan(&token, "Meera Devi").await;
    for _ in 0..3 {
        app.create_item(&token, &artisan, 1).await;
    }

    let res = app
        .get_with_token(&format!("{}?page=2&per_page=2", routes::ITEMS), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(res.body["data"]["pagination"]["total_pages"], 2);

    let res = app
        .get_with_token(&format!("{}?page={}&per_page=100", routes::ITEMS, u64::MAX), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert!(res.body["data"]["items"].as_array().unwrap().is_empty());
    assert_eq!(res.body["data"]["pagination"]["total"], 3);
}

#[tokio::test]
async fn manual_update_changes_only_given_fields() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_operator("ops@hunarkart.in").await;
    let artisan = app.create_artisan(&token, "Meera Devi").await;
    let item = app.create_item(&token, &artisan, 4).await;

    let res = app
        .patch_with_token(&routes::item(&item), &json!({"price": 1299.0}), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"]["price"], 1299.0);
    assert_eq!(res.body["data"]["quantity"], 4);
    assert_eq!(res.body["data"]["name"], "Blue pottery vase");
}

#[tokio::test]
async fn deleting_an_item_removes_its_listings_but_keeps_sales() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_operator("ops@hunarkart.in").await;
    let artisan = app.create_artisan(&token, "Meera Devi").await;
    let item = app.create_item(&token, &artisan, 4).await;
    app.create_listing(&token, &item, "Etsy").await;
    let sale = app.sell(&token, &item, &artisan, 1).await.id();

    let res = app.delete_with_token(&routes::item(&item), &token).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"]["listings_removed"], 1);

    assert_eq!(app.count_where("platform_listing", "item_id", &item).await, 0);
    let res = app.get_with_token(&routes::sale(&sale), &token).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert!(res.body["data"]["item"].is_null());
}
