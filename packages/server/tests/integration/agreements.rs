use reqwest::Method;
use uuid::Uuid;

use crate::common::{FilePart, TestApp, routes};

fn document() -> FilePart<'static> {
    FilePart {
        field: "document",
        file_name: "agreement.pdf",
        mime: "application/pdf",
        bytes: b"%PDF-1.4 signed".to_vec(),
    }
}

#[tokio::test]
async fn agreement_upload_stores_the_document() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_operator("ops@hunarkart.in").await;
    let artisan = app.create_artisan(&token, "Meera Devi").await;

    let res = app
        .multipart_with_token(
            Method::POST,
            routes::AGREEMENTS,
            &[
                ("artisan_id", artisan.as_str()),
                ("date_signed", "2024-01-15"),
                ("valid_until", "2026-01-15"),
            ],
            vec![document()],
            &token,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert!(
        res.body["data"]["file_url"]
            .as_str()
            .unwrap()
            .starts_with("https://media.test/agreements/")
    );
    assert!(
        res.body["data"]["date_signed"]
            .as_str()
            .unwrap()
            .starts_with("2024-01-15T00:00:00")
    );
    assert_eq!(res.body["data"]["artisan"]["name"], "Meera Devi");
    assert_eq!(app.blobs.uploads.lock().unwrap().len(), 1);

    let res = app
        .get_with_token(
            &format!("{}?artisan_id={artisan}", routes::AGREEMENTS),
            &token,
        )
        .await;
    assert_eq!(res.body["data"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn invalid_fields_leave_nothing_in_storage() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_operator("ops@hunarkart.in").await;
    let artisan = app.create_artisan(&token, "Meera Devi").await;

    let res = app
        .multipart_with_token(
            Method::POST,
            routes::AGREEMENTS,
            &[
                ("artisan_id", artisan.as_str()),
                ("date_signed", "2024-01-15"),
                ("valid_until", "2023-01-15"),
            ],
            vec![document()],
            &token,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let unknown = Uuid::now_v7().to_string();
    let res = app
        .multipart_with_token(
            Method::POST,
            routes::AGREEMENTS,
            &[("artisan_id", unknown.as_str()), ("date_signed", "2024-01-15")],
            vec![document()],
            &token,
        )
        .await;
    assert_eq!(res.status, 404, "{}", res.text);

    assert!(app.blobs.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn document_is_required_and_must_be_a_supported_type() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_operator("ops@hunarkart.in").await;
    let artisan = app.create_artisan(&token, "Meera Devi").await;
    let fields = [("artisan_id", artisan.as_str()), ("date_signed", "2024-01-15")];

    let res = app
        .multipart_with_token(Method::POST, routes::AGREEMENTS, &fields, vec![], &token)
        .await;
    assert_eq!(res.status, 400, "{}", res.text);

    let res = app
        .multipart_with_token(
            Method::POST,
            routes::AGREEMENTS,
            &fields,
            vec![FilePart {
                field: "document",
                file_name: "agreement.exe",
                mime: "application/octet-stream",
                bytes: b"MZ".to_vec(),
            }],
            &token,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert!(app.blobs.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_an_agreement_deletes_its_blob() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_operator("ops@hunarkart.in").await;
    let artisan = app.create_artisan(&token, "Meera Devi").await;
    let res = app
        .multipart_with_token(
            Method::POST,
            routes::AGREEMENTS,
            &[("artisan_id", artisan.as_str()), ("date_signed", "2024-01-15")],
            vec![document()],
            &token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let id = res.id();
    let key = app.blobs.uploads.lock().unwrap()[0].clone();

    let res = app.delete_with_token(&routes::agreement(&id), &token).await;
    assert_eq!(res.status, 204);
    assert_eq!(app.deleted_blobs(), vec![key]);

    let res = app.get_with_token(&routes::agreement(&id), &token).await;
    assert_eq!(res.status, 404);
}
