//! `reqwest` implementation of [`CommerceApi`].
//!
//! Every request carries the session's bearer token when there is one. A 401
//! from any endpoint clears the session and sends the navigator to the login
//! route before the error is handed back, so callers never need to handle
//! expiry themselves.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use scuffmart_core::{
    CartSnapshot, Email, Order, OrderId, OrderStatus, Product, ProductId, User,
};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::instrument;
use url::Url;

use super::{Ack, AuthResponse, CheckoutOutcome, CommerceApi, MeResponse, ProductForm};
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::navigation::{Navigator, Route};
use crate::session::SessionStore;

/// Longest response excerpt included in logs.
const LOG_BODY_LIMIT: usize = 500;

/// HTTP client for the commerce backend.
#[derive(Clone)]
pub struct HttpApi {
    inner: Arc<HttpApiInner>,
}

struct HttpApiInner {
    client: reqwest::Client,
    base_url: Url,
    session: SessionStore,
    navigator: Navigator,
}

impl HttpApi {
    /// Create a client for `config.api_url`.
    ///
    /// `session` supplies the bearer token and is cleared on 401;
    /// `navigator` is sent to the login route at the same moment.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: SessionStore, navigator: Navigator) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("scuffmart/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpApiInner {
                client,
                base_url: config.api_url.clone(),
                session,
                navigator,
            }),
        })
    }

    /// Start a request to `path` (relative to the base URL) with auth attached.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.inner.base_url.join(path)?;
        let builder = self.inner.client.request(method, url);
        Ok(match self.inner.session.token() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        })
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        let status = response.status();

        // Before the body is read: a failed read must not skip the reset.
        if status == StatusCode::UNAUTHORIZED {
            self.expire_session();
            return Err(ApiError::Unauthorized);
        }

        let body = response.text().await?;

        if !status.is_success() {
            let message = server_message(&body);
            tracing::debug!(
                status = %status,
                message = message.as_deref().unwrap_or(""),
                "Backend returned non-success status"
            );
            return Err(ApiError::Rejected { status, message });
        }

        Ok(body)
    }

    /// Global handling of a 401: forget the session and head to login.
    fn expire_session(&self) {
        tracing::warn!("Backend rejected credentials, clearing session");
        self.inner.session.clear();
        self.inner.navigator.navigate(Route::Login);
    }

    /// Send a request and decode its JSON body.
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Decode(e)
        })
    }

    /// Send a mutation and decode its acknowledgement.
    async fn mutate(&self, request: RequestBuilder) -> Result<Ack> {
        let body = self.send(request).await?;
        Ok(Ack::from_body(&body))
    }
}

/// `message` field of an error body, if it has one.
fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_owned)
}

fn multipart(form: &ProductForm) -> Result<Form> {
    let mut multipart = Form::new();
    for (name, value) in form.text_fields() {
        multipart = multipart.text(name, value);
    }
    if let Some(image) = &form.image {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        multipart = multipart.part("image", part);
    }
    Ok(multipart)
}

#[async_trait]
impl CommerceApi for HttpApi {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn login(&self, email: &Email, password: &SecretString) -> Result<AuthResponse> {
        let request = self.request(Method::POST, "auth/login")?.json(&json!({
            "email": email,
            "password": password.expose_secret(),
        }));
        self.fetch(request).await
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn register(
        &self,
        name: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthResponse> {
        let request = self.request(Method::POST, "auth/register")?.json(&json!({
            "name": name,
            "email": email,
            "password": password.expose_secret(),
        }));
        self.fetch(request).await
    }

    #[instrument(skip(self))]
    async fn me(&self) -> Result<User> {
        let request = self.request(Method::GET, "auth/me")?;
        let me: MeResponse = self.fetch(request).await?;
        Ok(me.user)
    }

    #[instrument(skip(self))]
    async fn products(&self) -> Result<Vec<Product>> {
        self.fetch(self.request(Method::GET, "products")?).await
    }

    #[instrument(skip(self))]
    async fn product(&self, id: ProductId) -> Result<Product> {
        self.fetch(self.request(Method::GET, &format!("products/{id}"))?)
            .await
    }

    #[instrument(skip(self, form), fields(name = %form.name))]
    async fn create_product(&self, form: &ProductForm) -> Result<Ack> {
        let request = self
            .request(Method::POST, "products")?
            .multipart(multipart(form)?);
        self.mutate(request).await
    }

    #[instrument(skip(self, form), fields(name = %form.name))]
    async fn update_product(&self, id: ProductId, form: &ProductForm) -> Result<Ack> {
        let request = self
            .request(Method::PUT, &format!("products/{id}"))?
            .multipart(multipart(form)?);
        self.mutate(request).await
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: ProductId) -> Result<Ack> {
        self.mutate(self.request(Method::DELETE, &format!("products/{id}"))?)
            .await
    }

    #[instrument(skip(self))]
    async fn update_stock(&self, id: ProductId, stock: u32) -> Result<Ack> {
        let request = self
            .request(Method::PUT, &format!("products/{id}/stock"))?
            .json(&json!({ "stock": stock }));
        self.mutate(request).await
    }

    #[instrument(skip(self))]
    async fn cart(&self) -> Result<CartSnapshot> {
        self.fetch(self.request(Method::GET, "cart")?).await
    }

    #[instrument(skip(self))]
    async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> Result<Ack> {
        let request = self
            .request(Method::POST, "cart/add")?
            .json(&json!({ "productId": product_id, "quantity": quantity }));
        self.mutate(request).await
    }

    #[instrument(skip(self))]
    async fn update_cart_item(&self, product_id: ProductId, quantity: u32) -> Result<Ack> {
        let request = self
            .request(Method::PUT, "cart/update")?
            .json(&json!({ "productId": product_id, "quantity": quantity }));
        self.mutate(request).await
    }

    #[instrument(skip(self))]
    async fn remove_from_cart(&self, product_id: ProductId) -> Result<Ack> {
        let request = self
            .request(Method::DELETE, "cart/remove")?
            .json(&json!({ "productId": product_id }));
        self.mutate(request).await
    }

    #[instrument(skip(self))]
    async fn orders(&self) -> Result<Vec<Order>> {
        self.fetch(self.request(Method::GET, "orders")?).await
    }

    #[instrument(skip(self))]
    async fn checkout(&self) -> Result<CheckoutOutcome> {
        let body = self.send(self.request(Method::POST, "orders")?).await?;
        Ok(serde_json::from_str(&body)
            .unwrap_or_else(|_| CheckoutOutcome::Acknowledged(Ack::from_body(&body))))
    }

    #[instrument(skip(self))]
    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Ack> {
        let request = self
            .request(Method::PUT, &format!("orders/{id}/status"))?
            .json(&json!({ "status": status }));
        self.mutate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_extraction() {
        assert_eq!(
            server_message(r#"{"message":"Insufficient stock"}"#).as_deref(),
            Some("Insufficient stock")
        );
        assert_eq!(server_message(r#"{"error":"x"}"#), None);
        assert_eq!(server_message("<html>502</html>"), None);
    }
}
