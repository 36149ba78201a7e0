//! Typed wrappers over [`RequestGateway::request`].
//!
//! These only shape parameters into a verb, path, and body. All response
//! handling, including session teardown on `401`, happens in `request`.

use reqwest::Method;
use tracing::instrument;

use fastbite_core::models::{
    AuthResponse, Comment, CreateCommentRequest, CreateOrderRequest, LoginRequest, Order, Product,
    RegisterRequest, UpdateStatusRequest,
};
use fastbite_core::{OrderId, OrderStatus, ProductId};

use super::{ApiError, RequestGateway, RequestOptions};

/// Result of a typed endpoint: `Ok(None)` is the "no result" sentinel.
pub type ApiResult<T> = Result<Option<T>, ApiError>;

impl RequestGateway {
    // =========================================================================
    // Auth
    // =========================================================================

    /// `POST /auth/register`
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &RegisterRequest) -> ApiResult<AuthResponse> {
        self.request(
            "/auth/register",
            RequestOptions::json(Method::POST, registration)?,
        )
        .await
    }

    /// `POST /auth/login`
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let body = LoginRequest {
            email: email.to_owned(),
            password: password.to_owned(),
        };
        self.request("/auth/login", RequestOptions::json(Method::POST, &body)?)
            .await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// `GET /products`
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self))]
    pub async fn products(&self) -> ApiResult<Vec<Product>> {
        self.request("/products", RequestOptions::get()).await
    }

    /// `GET /products/{id}`
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> ApiResult<Product> {
        self.request(&format!("/products/{id}"), RequestOptions::get())
            .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// `POST /orders`
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self, order), fields(lines = order.items.len()))]
    pub async fn create_order(&self, order: &CreateOrderRequest) -> ApiResult<Order> {
        self.request("/orders", RequestOptions::json(Method::POST, order)?)
            .await
    }

    /// `GET /orders/my`
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self))]
    pub async fn my_orders(&self) -> ApiResult<Vec<Order>> {
        self.request("/orders/my", RequestOptions::get()).await
    }

    /// `GET /orders/{id}`
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order(&self, id: &OrderId) -> ApiResult<Order> {
        self.request(&format!("/orders/{id}"), RequestOptions::get())
            .await
    }

    /// `GET /orders/kitchen`
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self))]
    pub async fn kitchen_orders(&self) -> ApiResult<Vec<Order>> {
        self.request("/orders/kitchen", RequestOptions::get()).await
    }

    /// `GET /orders/delivery`
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self))]
    pub async fn delivery_orders(&self) -> ApiResult<Vec<Order>> {
        self.request("/orders/delivery", RequestOptions::get()).await
    }

    /// `PATCH /orders/{id}/status` with `{status}`
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> ApiResult<Order> {
        self.request(
            &format!("/orders/{id}/status"),
            RequestOptions::json(Method::PATCH, &UpdateStatusRequest { status })?,
        )
        .await
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// `GET /orders/{id}/comments`
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn comments(&self, order_id: &OrderId) -> ApiResult<Vec<Comment>> {
        self.request(
            &format!("/orders/{order_id}/comments"),
            RequestOptions::get(),
        )
        .await
    }

    /// `POST /orders/{id}/comments` with `{message}`
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self, message), fields(order_id = %order_id))]
    pub async fn add_comment(&self, order_id: &OrderId, message: &str) -> ApiResult<Comment> {
        let body = CreateCommentRequest {
            message: message.to_owned(),
        };
        self.request(
            &format!("/orders/{order_id}/comments"),
            RequestOptions::json(Method::POST, &body)?,
        )
        .await
    }
}
