//! Cart API driven through the full storefront router.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use tjs_integration_tests::file_backed_state;
use tjs_storefront::state::AppState;

async fn send(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = tjs_storefront::app(state.clone())
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_product_and_bundle_with_same_id_are_separate_lines() {
    let dir = tempfile::tempdir().unwrap();
    let state = file_backed_state(dir.path());

    let wrap = json!({
        "id": "p1", "kind": "product", "name": "Cold Therapy Wrap", "price": "10.00"
    });
    send(&state, "POST", "/cart/add", Some(wrap.clone())).await;
    send(&state, "POST", "/cart/add", Some(wrap)).await;
    let (status, count) = send(
        &state,
        "POST",
        "/cart/add",
        Some(json!({
            "id": "p1", "kind": "product", "name": "Cold Therapy Wrap",
            "price": "10.00", "quantity": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count["count"], 3);

    let (_, count) = send(
        &state,
        "POST",
        "/cart/add",
        Some(json!({
            "id": "p1", "kind": "bundle", "name": "Knee Recovery Kit", "price": "50.00"
        })),
    )
    .await;
    assert_eq!(count["count"], 4);

    let (_, cart) = send(&state, "GET", "/cart", None).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 2);
    assert_eq!(cart["subtotal"], "$80.00");
    assert_eq!(cart["ships_free"], true);
    assert_eq!(cart["tax"], "$6.40");
    assert_eq!(cart["total"], "$86.40");

    let (_, cart) = send(
        &state,
        "POST",
        "/cart/update",
        Some(json!({ "id": "p1", "kind": "bundle", "quantity": 0 })),
    )
    .await;
    assert_eq!(cart["item_count"], 3);
    assert_eq!(cart["subtotal"], "$30.00");
    assert_eq!(cart["shipping"], "$9.99");
    assert_eq!(cart["free_shipping_remaining"], "$45.00");
    assert_eq!(cart["items"][0]["kind"], "product");
}

#[tokio::test]
async fn test_cart_is_restored_by_a_new_server() {
    let dir = tempfile::tempdir().unwrap();
    {
        let state = file_backed_state(dir.path());
        send(
            &state,
            "POST",
            "/cart/add",
            Some(json!({
                "id": "k7", "kind": "bundle", "name": "Shoulder Recovery Kit",
                "price": "129.00", "quantity": 2
            })),
        )
        .await;
        state.cart().flush().await;
    }

    let state = file_backed_state(dir.path());
    let (_, count) = send(&state, "GET", "/cart/count", None).await;
    assert_eq!(count["count"], 2);

    let (_, cart) = send(&state, "POST", "/cart/clear", None).await;
    assert_eq!(cart["is_empty"], true);
    state.cart().flush().await;

    let state = file_backed_state(dir.path());
    let (_, count) = send(&state, "GET", "/cart/count", None).await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn test_remove_only_touches_matching_kind() {
    let dir = tempfile::tempdir().unwrap();
    let state = file_backed_state(dir.path());
    for kind in ["product", "bundle"] {
        send(
            &state,
            "POST",
            "/cart/add",
            Some(json!({ "id": "p1", "kind": kind, "name": "Item", "price": "5.00" })),
        )
        .await;
    }

    let (status, cart) = send(
        &state,
        "POST",
        "/cart/remove",
        Some(json!({ "id": "p1", "kind": "product" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["kind"], "bundle");
}

#[tokio::test]
async fn test_readiness_reports_corrupt_storage() {
    let dir = tempfile::tempdir().unwrap();
    let state = file_backed_state(dir.path());
    let (status, _) = send(&state, "GET", "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);

    let path = dir.path().join("tjs-cart-storage.json");
    std::fs::write(&path, "garbage").unwrap();
    let (status, _) = send(&state, "GET", "/health/ready", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
