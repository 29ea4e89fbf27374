mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use common::{test_config, two_line_cart, Fixture};
use serde_json::{json, Value};
use storefront_checkout::{app_router, clock::Clock, handlers::AppServices, AppState};
use tower::ServiceExt;
use uuid::Uuid;

fn router(fx: &Fixture) -> Router {
    let clock: Arc<dyn Clock> = fx.clock.clone();
    let config = test_config();
    let services = AppServices::new(fx.shared_store(), clock, &config, None);
    app_router(AppState {
        config,
        services,
        db: None,
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(payload) => {
            request = request.header("content-type", "application/json");
            Body::from(payload.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn order_payload(fx: &Fixture, coupon_code: Option<&str>) -> Value {
    json!({
        "draft": fx.draft(&fx.standard_shipping, coupon_code),
        "items": two_line_cart(),
    })
}

#[tokio::test]
async fn health_reports_up_without_a_database() {
    let fx = Fixture::new().await;
    let (status, body) = send(&router(&fx), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "up");
    assert_eq!(body["data"]["database"], "not_configured");
}

#[tokio::test]
async fn coupon_validation_reports_rejections_as_data() {
    let fx = Fixture::new().await;
    let app = router(&fx);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/coupons/validate",
        Some(json!({ "code": "SUMMER10", "order_amount": 250000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], true);
    assert_eq!(body["data"]["coupon"]["code"], "SUMMER10");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/coupons/validate",
        Some(json!({ "code": "NOPE", "order_amount": 250000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], false);
    assert_eq!(body["data"]["code"], "not_found");
}

#[tokio::test]
async fn coupon_apply_returns_discount_quote() {
    let fx = Fixture::new().await;
    let (status, body) = send(
        &router(&fx),
        Method::POST,
        "/api/v1/coupons/apply",
        Some(json!({ "code": "SUMMER10", "order_amount": 250000 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["discount_amount"], 20000);
    assert_eq!(body["data"]["coupon_id"], fx.summer10.id.to_string());
}

#[tokio::test]
async fn coupon_codes_are_trimmed_and_blank_codes_rejected() {
    let fx = Fixture::new().await;
    let app = router(&fx);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/coupons/validate",
        Some(json!({ "code": " SUMMER10 ", "order_amount": 250000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], true);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/coupons/apply",
        Some(json!({ "code": "   ", "order_amount": 250000 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");
}

#[tokio::test]
async fn order_placement_and_status_flow() {
    let fx = Fixture::new().await;
    let app = router(&fx);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/orders",
        Some(order_payload(&fx, Some("SUMMER10"))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["order"]["total_amount"], 260000);
    assert_eq!(body["data"]["order"]["status"], "Pending");

    let order_id = body["data"]["order"]["id"].as_str().unwrap().to_string();
    let payment_id = body["data"]["payment"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/orders/{}", order_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(2));

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/payments/{}/status", payment_id),
        Some(json!({ "status": "Completed", "transaction_id": "txn_api" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["payment"]["status"], "Completed");
    assert_eq!(body["data"]["order_status_change"]["to"], "Processing");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/orders/{}/status", order_id),
        Some(json!({ "status": "Delivered" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "invalid_status");
}

#[tokio::test]
async fn empty_cart_is_a_bad_request() {
    let fx = Fixture::new().await;
    let payload = json!({
        "draft": fx.draft(&fx.standard_shipping, None),
        "items": [],
    });

    let (status, body) = send(&router(&fx), Method::POST, "/api/v1/orders", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");
    assert_eq!(fx.store.call_count(), 0);
}

#[tokio::test]
async fn unknown_order_is_404() {
    let fx = Fixture::new().await;
    let (status, body) = send(
        &router(&fx),
        Method::GET,
        &format!("/api/v1/orders/{}", Uuid::new_v4()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let fx = Fixture::new().await;
    let (status, body) = send(&router(&fx), Method::GET, "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/orders"].is_object());
}
