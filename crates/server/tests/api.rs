//! End-to-end tests of the HTTP surface against an in-memory database.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use engine::{Engine, User};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use server::ServerState;
use tower::ServiceExt;

async fn test_app() -> (Router, Arc<Engine>) {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    Migrator::up(&db, None).await.expect("migrations");

    let engine = Arc::new(Engine::builder().database(db).build());
    engine
        .new_user(&User {
            id: "u1".to_string(),
            name: "Sari".to_string(),
            phone: Some("6281234567890".to_string()),
            primary_asset_id: None,
        })
        .await
        .expect("seed user");

    let state = ServerState {
        engine: engine.clone(),
        bot: None,
        webhook_secret: Some("hush".to_string()),
    };
    (server::router(state), engine)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn requests_without_a_user_header_are_unauthorized() {
    let (app, _engine) = test_app().await;

    let response = app
        .oneshot(Request::get("/assets").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_users_are_unauthorized() {
    let (app, _engine) = test_app().await;

    let response = app
        .oneshot(
            Request::get("/assets")
                .header("x-user-id", "nobody")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn created_assets_show_up_in_the_listing() {
    let (app, _engine) = test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::post("/assets")
                .header("x-user-id", "u1")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"country":"JP","name":"PayPay","kind":"e-money","currency":"JPY","balance_minor":5000}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(
            Request::get("/assets")
                .header("x-user-id", "u1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let listing = body_json(response).await;
    let assets = listing.as_array().unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0]["name"], "PayPay");
    assert_eq!(assets[0]["balance_minor"], 5000);
}

#[tokio::test]
async fn overspending_is_rejected_with_422() {
    let (app, engine) = test_app().await;

    let asset = engine
        .new_asset(engine::NewAsset {
            owner: engine::OwnerRef::User("u1".to_string()),
            country: "JP".to_string(),
            name: "Yucho".to_string(),
            kind: engine::AssetKind::Savings,
            currency: engine::Currency::Jpy,
            balance_minor: 100,
        })
        .await
        .unwrap();

    let body = format!(
        r#"{{"asset_id":"{}","category":"Makanan","amount_minor":101,"date":"2026-08-30T00:00:00Z"}}"#,
        asset.id
    );
    let response = app
        .oneshot(
            Request::post("/expense")
                .header("x-user-id", "u1")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn recorded_income_is_listed_newest_first() {
    let (app, engine) = test_app().await;

    let asset = engine
        .new_asset(engine::NewAsset {
            owner: engine::OwnerRef::User("u1".to_string()),
            country: "ID".to_string(),
            name: "BCA".to_string(),
            kind: engine::AssetKind::Savings,
            currency: engine::Currency::Idr,
            balance_minor: 0,
        })
        .await
        .unwrap();

    for (amount, date) in [(100_00, "2026-08-01"), (250_00, "2026-08-15")] {
        let body = format!(
            r#"{{"asset_id":"{}","category":"Gaji","amount_minor":{amount},"date":"{date}T00:00:00Z"}}"#,
            asset.id
        );
        let response = app
            .clone()
            .oneshot(
                Request::post("/income")
                    .header("x-user-id", "u1")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(
            Request::get("/transactions")
                .header("x-user-id", "u1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let listing = body_json(response).await;
    let transactions = listing.as_array().unwrap();
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0]["amount_minor"], 250_00);
    assert_eq!(transactions[1]["amount_minor"], 100_00);
}

#[tokio::test]
async fn primary_asset_can_be_set_over_http() {
    let (app, engine) = test_app().await;

    let asset = engine
        .new_asset(engine::NewAsset {
            owner: engine::OwnerRef::User("u1".to_string()),
            country: "JP".to_string(),
            name: "PayPay".to_string(),
            kind: engine::AssetKind::EMoney,
            currency: engine::Currency::Jpy,
            balance_minor: 0,
        })
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::put(format!("/assets/{}/primary", asset.id))
                .header("x-user-id", "u1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let user = engine.user("u1").await.unwrap();
    assert_eq!(user.primary_asset_id, Some(asset.id));
}

#[tokio::test]
async fn export_downloads_as_csv_attachment() {
    let (app, engine) = test_app().await;

    let export = engine
        .create_export(
            "u1",
            "Laporan_Bulan ini_2026-08-30.csv",
            "Bulan ini",
            b"Tanggal,Tipe\n".to_vec(),
        )
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::get(format!("/exports/{}", export.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"Tanggal,Tipe\n");
}

#[tokio::test]
async fn unknown_export_tokens_are_not_found() {
    let (app, _engine) = test_app().await;

    let response = app
        .oneshot(
            Request::get(format!("/exports/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn webhook_rejects_a_wrong_secret() {
    let (app, _engine) = test_app().await;

    let response = app
        .oneshot(
            Request::post("/webhooks/whatsapp")
                .header("x-webhook-secret", "wrong")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"event":"message","payload":{}}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_acknowledges_uninteresting_events() {
    let (app, _engine) = test_app().await;

    let response = app
        .oneshot(
            Request::post("/webhooks/whatsapp")
                .header("x-webhook-secret", "hush")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"event":"session.status","payload":{}}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
