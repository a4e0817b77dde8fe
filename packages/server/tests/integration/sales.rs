use serde_json::json;
use uuid::Uuid;

use crate::common::{TestApp, routes};

struct Fixture {
    app: TestApp,
    token: String,
    admin: String,
    artisan: String,
}

async fn fixture() -> Fixture {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_operator("ops@hunarkart.in").await;
    let admin = app.create_admin("admin@hunarkart.in").await;
    let artisan = app.create_artisan(&token, "Meera Devi").await;
    Fixture {
        app,
        token,
        admin,
        artisan,
    }
}

mod recording {
    use super::*;

    #[tokio::test]
    async fn oversell_is_rejected_without_side_effects() {
        let f = fixture().await;
        let item = f.app.create_item(&f.token, &f.artisan, 3).await;

        let res = f.app.sell(&f.token, &item, &f.artisan, 5).await;
        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        assert_eq!(f.app.stock(&f.token, &item).await, (3, "Available".into()));
        assert_eq!(f.app.count_where("sale", "item_id", &item).await, 0);
    }

    #[tokio::test]
    async fn selling_the_last_unit_marks_item_sold_and_delete_restores_it() {
        let f = fixture().await;
        let item = f.app.create_item(&f.token, &f.artisan, 3).await;

        let res = f.app.sell(&f.token, &item, &f.artisan, 3).await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["data"]["quantity_sold"], 3);
        assert_eq!(res.body["data"]["item"]["id"], item.as_str());
        assert_eq!(res.body["data"]["artisan"]["name"], "Meera Devi");
        let sale = res.id();
        assert_eq!(f.app.stock(&f.token, &item).await, (0, "Sold".into()));

        let res = f.app.delete_with_token(&routes::sale(&sale), &f.admin).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"]["restored_quantity"], 3);
        assert_eq!(res.body["data"]["item_status"], "Available");
        assert_eq!(f.app.stock(&f.token, &item).await, (3, "Available".into()));
    }

    #[tokio::test]
    async fn partial_sale_keeps_status() {
        let f = fixture().await;
        let item = f.app.create_item(&f.token, &f.artisan, 10).await;

        let res = f.app.sell(&f.token, &item, &f.artisan, 4).await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(f.app.stock(&f.token, &item).await, (6, "Available".into()));
    }

    #[tokio::test]
    async fn stock_stays_consistent_across_a_sequence() {
        let f = fixture().await;
        let item = f.app.create_item(&f.token, &f.artisan, 5).await;

        let mut sales = Vec::new();
        for quantity in [2, 1, 2] {
            let res = f.app.sell(&f.token, &item, &f.artisan, quantity).await;
            assert_eq!(res.status, 201, "{}", res.text);
            sales.push(res.id());
        }
        assert_eq!(f.app.stock(&f.token, &item).await, (0, "Sold".into()));

        let res = f.app.sell(&f.token, &item, &f.artisan, 1).await;
        assert_eq!(res.status, 400);
        assert_eq!(f.app.stock(&f.token, &item).await, (0, "Sold".into()));

        let res = f
            .app
            .delete_with_token(&routes::sale(&sales[1]), &f.admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(f.app.stock(&f.token, &item).await, (1, "Available".into()));

        let res = f.app.sell(&f.token, &item, &f.artisan, 1).await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(f.app.stock(&f.token, &item).await, (0, "Sold".into()));
    }

    #[tokio::test]
    async fn concurrent_sales_cannot_oversell() {
        let f = fixture().await;
        let item = f.app.create_item(&f.token, &f.artisan, 5).await;

        let (a, b) = tokio::join!(
            f.app.sell(&f.token, &item, &f.artisan, 3),
            f.app.sell(&f.token, &item, &f.artisan, 3),
        );

        let mut statuses = vec![a.status, b.status];
        statuses.sort();
        assert_eq!(statuses[0], 201, "one sale must succeed: {} / {}", a.text, b.text);
        assert!(
            statuses[1] == 400 || statuses[1] == 409,
            "the other must be rejected: {} / {}",
            a.text,
            b.text
        );
        assert_eq!(f.app.stock(&f.token, &item).await, (2, "Available".into()));
        assert_eq!(f.app.count_where("sale", "item_id", &item).await, 1);
    }

    #[tokio::test]
    async fn artisan_must_own_the_item() {
        let f = fixture().await;
        let other = f.app.create_artisan(&f.token, "Ramesh Kumar").await;
        let item = f.app.create_item(&f.token, &f.artisan, 3).await;

        let res = f.app.sell(&f.token, &item, &other, 1).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(f.app.stock(&f.token, &item).await, (3, "Available".into()));
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let f = fixture().await;

        let res = f
            .app
            .sell(&f.token, &Uuid::now_v7().to_string(), &f.artisan, 1)
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn missing_fields_and_non_positive_quantity_are_rejected() {
        let f = fixture().await;
        let item = f.app.create_item(&f.token, &f.artisan, 3).await;

        let res = f
            .app
            .post_with_token(
                routes::SALES,
                &json!({"item_id": item, "artisan_id": f.artisan, "quantity_sold": 1}),
                &f.token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        for quantity in [0, -2] {
            let res = f.app.sell(&f.token, &item, &f.artisan, quantity).await;
            assert_eq!(res.status, 400, "quantity {quantity} must be rejected");
        }
        assert_eq!(f.app.stock(&f.token, &item).await, (3, "Available".into()));
    }

    #[tokio::test]
    async fn explicit_sale_date_is_kept() {
        let f = fixture().await;
        let item = f.app.create_item(&f.token, &f.artisan, 3).await;

        let res = f
            .app
            .post_with_token(
                routes::SALES,
                &json!({
                    "item_id": item,
                    "artisan_id": f.artisan,
                    "platform_name": "Flipkart Samarth",
                    "quantity_sold": 1,
                    "total_revenue": 999.5,
                    "sale_date": "2024-03-01T10:00:00Z",
                }),
                &f.token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert!(
            res.body["data"]["sale_date"]
                .as_str()
                .unwrap()
                .starts_with("2024-03-01T10:00:00")
        );
    }
}

mod revoking {
    use super::*;

    #[tokio::test]
    async fn only_admins_delete_sales() {
        let f = fixture().await;
        let item = f.app.create_item(&f.token, &f.artisan, 3).await;
        let sale = f.app.sell(&f.token, &item, &f.artisan, 1).await.id();

        let res = f.app.delete_with_token(&routes::sale(&sale), &f.token).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
        assert_eq!(f.app.stock(&f.token, &item).await, (2, "Available".into()));
    }

    #[tokio::test]
    async fn restore_keeps_draft_items_in_draft() {
        let f = fixture().await;
        let item = f.app.create_item(&f.token, &f.artisan, 3).await;
        let sale = f.app.sell(&f.token, &item, &f.artisan, 1).await.id();
        let res = f
            .app
            .patch_with_token(&routes::item(&item), &json!({"status": "Draft"}), &f.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = f.app.delete_with_token(&routes::sale(&sale), &f.admin).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(f.app.stock(&f.token, &item).await, (3, "Draft".into()));
    }

    #[tokio::test]
    async fn deleting_a_sale_of_a_deleted_item_still_succeeds() {
        let f = fixture().await;
        let item = f.app.create_item(&f.token, &f.artisan, 3).await;
        let sale = f.app.sell(&f.token, &item, &f.artisan, 1).await.id();
        let res = f.app.delete_with_token(&routes::item(&item), &f.token).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = f.app.delete_with_token(&routes::sale(&sale), &f.admin).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["data"]["restored_quantity"].is_null());

        let res = f.app.get_with_token(&routes::sale(&sale), &f.token).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let f = fixture().await;
        let item = f.app.create_item(&f.token, &f.artisan, 3).await;
        let sale = f.app.sell(&f.token, &item, &f.artisan, 1).await.id();

        let first = f.app.delete_with_token(&routes::sale(&sale), &f.admin).await;
        assert_eq!(first.status, 200);
        let second = f.app.delete_with_token(&routes::sale(&sale), &f.admin).await;
        assert_eq!(second.status, 404);
        assert_eq!(f.app.stock(&f.token, &item).await, (3, "Available".into()));
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn filters_by_item_and_artisan() {
        let f = fixture().await;
        let other = f.app.create_artisan(&f.token, "Ramesh Kumar").await;
        let mine = f.app.create_item(&f.token, &f.artisan, 5).await;
        let theirs = f.app.create_item(&f.token, &other, 5).await;
        f.app.sell(&f.token, &mine, &f.artisan, 1).await;
        f.app.sell(&f.token, &mine, &f.artisan, 1).await;
        f.app.sell(&f.token, &theirs, &other, 1).await;

        let res = f.app.get_with_token(routes::SALES, &f.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"]["pagination"]["total"], 3);

        let res = f
            .app
            .get_with_token(&format!("{}?item_id={mine}", routes::SALES), &f.token)
            .await;
        assert_eq!(res.body["data"]["pagination"]["total"], 2);

        let res = f
            .app
            .get_with_token(&format!("{}?artisan_id={other}", routes::SALES), &f.token)
            .await;
        assert_eq!(res.body["data"]["pagination"]["total"], 1);
        assert_eq!(res.body["data"]["items"][0]["item_id"], theirs.as_str());
    }
}
