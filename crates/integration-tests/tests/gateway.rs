//! Request gateway behaviour against the mock backend.

#![allow(clippy::unwrap_used)]

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use serde_json::Value;

use fastbite_client::gateway::GENERIC_FAILURE_MESSAGE;
use fastbite_client::{ApiError, RequestOptions, Route, channels};
use fastbite_core::{OrderId, OrderStatus, Price, ProductId};
use fastbite_integration_tests::{MockBackend, PASSWORD};

#[tokio::test]
async fn test_anonymous_request_has_no_authorization() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();

    let products = runtime.gateway().products().await.unwrap().unwrap();
    assert_eq!(products.len(), 3);
    assert_eq!(products.first().unwrap().price, Price::parse("3.50").unwrap());

    let seen = backend.requests_to("/products");
    assert_eq!(seen.len(), 1);
    assert!(seen.first().unwrap().authorization.is_none());
    assert_eq!(
        seen.first().unwrap().content_type.as_deref(),
        Some("application/json")
    );
}

#[tokio::test]
async fn test_credential_is_injected_after_login() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();
    runtime
        .sign_in("cocina@fastbite.com", PASSWORD)
        .await
        .unwrap();
    let token = runtime.session().credential().unwrap().expose().to_owned();

    runtime.gateway().kitchen_orders().await.unwrap().unwrap();

    let seen = backend.requests_to("/orders/kitchen");
    assert_eq!(
        seen.first().unwrap().authorization.as_deref(),
        Some(format!("Bearer {token}").as_str())
    );
}

#[tokio::test]
async fn test_caller_headers_are_kept() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();

    let options = RequestOptions::get().header(
        HeaderName::from_static("x-fastbite-test"),
        HeaderValue::from_static("yes"),
    );
    runtime
        .gateway()
        .request::<Value>("/products", options)
        .await
        .unwrap();

    let seen = backend.requests_to("/products");
    assert_eq!(seen.first().unwrap().custom.as_deref(), Some("yes"));
}

#[tokio::test]
async fn test_caller_content_type_wins() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();

    let options =
        RequestOptions::get().header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    runtime
        .gateway()
        .request::<Value>("/products", options)
        .await
        .unwrap();

    let seen = backend.requests_to("/products");
    assert_eq!(seen.first().unwrap().content_type.as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn test_unauthorized_clears_session_and_returns_nothing() {
    let backend = MockBackend::spawn().await;
    let (runtime, navigator) = backend.runtime();
    runtime
        .sign_in("cocina@fastbite.com", PASSWORD)
        .await
        .unwrap();
    backend.revoke_all();

    let orders = runtime.gateway().kitchen_orders().await.unwrap();

    assert!(orders.is_none());
    assert!(runtime.session().credential().is_none());
    assert!(runtime.session().profile().is_none());
    assert_eq!(navigator.current(), Some(Route::Login));
}

#[tokio::test]
async fn test_unauthorized_closes_live_channels() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();
    runtime
        .sign_in("cocina@fastbite.com", PASSWORD)
        .await
        .unwrap();
    runtime
        .streams()
        .connect::<Value, _>(&channels::all_orders(), |_| {}, None)
        .unwrap();
    assert!(runtime.streams().is_connected("/orders/stream"));
    backend.revoke_all();

    let orders = runtime.gateway().kitchen_orders().await.unwrap();

    assert!(orders.is_none());
    assert!(!runtime.session().is_authenticated());
    assert!(runtime.streams().channels().is_empty());
}

#[tokio::test]
async fn test_error_status_carries_body_text() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();

    let err = runtime
        .gateway()
        .product(&ProductId::from(99))
        .await
        .unwrap_err();

    match err {
        ApiError::Request { status, message } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(message, "Producto no encontrado: 99");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_status_without_body_uses_generic_message() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();

    let err = runtime
        .gateway()
        .request::<Value>("/quirks/blank-error", RequestOptions::get())
        .await
        .unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
    assert!(matches!(err, ApiError::Request { ref message, .. } if message == GENERIC_FAILURE_MESSAGE));
}

#[tokio::test]
async fn test_forbidden_without_body_is_not_a_teardown() {
    let backend = MockBackend::spawn().await;
    let (runtime, navigator) = backend.runtime();
    runtime
        .sign_in("cliente@fastbite.com", PASSWORD)
        .await
        .unwrap();

    let err = runtime.gateway().kitchen_orders().await.unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(403));
    assert!(runtime.session().is_authenticated());
    assert_eq!(navigator.current(), Some(Route::CustomerMenu));
}

#[tokio::test]
async fn test_empty_success_body_is_no_result() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();

    let empty = runtime
        .gateway()
        .request::<Value>("/quirks/empty", RequestOptions::get())
        .await
        .unwrap();
    assert!(empty.is_none());

    let no_content = runtime
        .gateway()
        .request::<Value>(
            "/quirks/no-content",
            RequestOptions::json(Method::POST, &serde_json::json!({})).unwrap(),
        )
        .await
        .unwrap();
    assert!(no_content.is_none());
}

#[tokio::test]
async fn test_unparsable_success_body_is_protocol_error() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();

    let err = runtime
        .gateway()
        .request::<Value>("/quirks/garbage", RequestOptions::get())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Protocol { ref endpoint, .. } if endpoint == "/quirks/garbage"));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let backend = MockBackend::spawn().await;
    let mut config = backend.config();
    config.api_url = "http://127.0.0.1:9/api".parse().unwrap();
    let session = backend.runtime().0.session().clone();
    let gateway = fastbite_client::RequestGateway::new(&config, session).unwrap();

    let err = gateway.products().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn test_status_update_and_comments() {
    let backend = MockBackend::spawn().await;
    let (runtime, _) = backend.runtime();
    runtime
        .sign_in("cocina@fastbite.com", PASSWORD)
        .await
        .unwrap();
    let id = OrderId::from(7);

    let order = runtime
        .gateway()
        .update_order_status(&id, OrderStatus::Ready)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Ready);

    let patch = backend.requests_to("/orders/7/status");
    assert_eq!(patch.first().unwrap().method, "PATCH");

    let comment = runtime
        .gateway()
        .add_comment(&id, "Listo para recoger")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(comment.message, "Listo para recoger");

    let comments = runtime.gateway().comments(&id).await.unwrap().unwrap();
    assert_eq!(comments.len(), 1);
}
