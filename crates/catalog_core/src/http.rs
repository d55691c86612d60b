//! `CatalogApi` over the hosted product API.
//!
//! Admin endpoints live under `{base}/api/{path}/admin/...`; sign-in, session
//! check and sign-out sit directly under the base URL. The token travels
//! verbatim in the `Authorization` header.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{
    header::AUTHORIZATION,
    multipart::{Form, Part},
    Client, RequestBuilder, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::{CollectionPage, Credentials, Product, ProductId, Session},
    error::ApiException,
    protocol::{
        ApiMessage, DataEnvelope, ProductListResponse, ProductMutationResponse, SignInRequest,
        SignInResponse, StatusResponse, UploadResponse,
    },
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{AssetUpload, CatalogApi, ConsoleError};

const UPLOAD_FIELD: &str = "file-to-upload";

#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    http: Client,
    base_url: String,
    api_path: String,
}

impl HttpCatalogClient {
    pub fn new(
        base_url: &str,
        api_path: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConsoleError> {
        let parsed = Url::parse(base_url)
            .map_err(|err| ConsoleError::Validation(format!("invalid API base '{base_url}': {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConsoleError::Validation(format!(
                "API base must be http or https, got '{}'",
                parsed.scheme()
            )));
        }
        let api_path = api_path.into().trim_matches('/').to_string();
        if api_path.is_empty() {
            return Err(ConsoleError::Validation("API path is empty".to_string()));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_path,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_path(&self) -> &str {
        &self.api_path
    }

    fn admin_url(&self, tail: &str) -> String {
        format!("{}/api/{}/admin/{tail}", self.base_url, self.api_path)
    }

    fn authorized(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        request.header(AUTHORIZATION, session.token.as_str())
    }
}

/// Reads a JSON body, turning non-2xx statuses into classified errors. The
/// server's own message is preferred over the status line when it sends one.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ConsoleError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<StatusResponse>(&body)
            .ok()
            .map(|status| status.message_text())
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| status.to_string());
        return Err(ApiException::from_status(status.as_u16(), message).into());
    }
    serde_json::from_str(&body)
        .map_err(|err| ConsoleError::Transport(format!("malformed response: {err}")))
}

/// A 2xx reply that still carries `success: false`.
fn rejected(message: Option<&ApiMessage>, fallback: &str) -> ConsoleError {
    let text = message
        .map(ApiMessage::joined)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| fallback.to_string());
    ConsoleError::Validation(text)
}

fn into_session_error(err: ConsoleError) -> ConsoleError {
    match err {
        ConsoleError::Validation(message) | ConsoleError::NotFound(message) => {
            ConsoleError::SessionInvalid(message)
        }
        other => other,
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, ConsoleError> {
        let response = self
            .http
            .post(format!("{}/admin/signin", self.base_url))
            .json(&SignInRequest {
                username: credentials.username.clone(),
                password: credentials.password.clone(),
            })
            .send()
            .await?;
        let body: SignInResponse = read_json(response).await.map_err(into_session_error)?;
        if !body.success || body.token.is_empty() {
            return Err(ConsoleError::SessionInvalid(
                body.message
                    .as_ref()
                    .map(ApiMessage::joined)
                    .unwrap_or_else(|| "sign-in rejected".to_string()),
            ));
        }
        let expires_at = body.expired.and_then(DateTime::<Utc>::from_timestamp_millis);
        info!(username = %credentials.username, ?expires_at, "sign-in accepted");
        Ok(Session {
            token: body.token,
            expires_at,
        })
    }

    async fn verify_session(&self, session: &Session) -> Result<(), ConsoleError> {
        let request = self
            .http
            .post(format!("{}/api/user/check", self.base_url));
        let response = self.authorized(request, session).send().await?;
        let body: StatusResponse = read_json(response).await.map_err(into_session_error)?;
        if !body.success {
            let message = body.message_text();
            return Err(ConsoleError::SessionInvalid(if message.is_empty() {
                "session check failed".to_string()
            } else {
                message
            }));
        }
        debug!("session verified");
        Ok(())
    }

    async fn list_products(
        &self,
        session: &Session,
        page: u32,
    ) -> Result<CollectionPage, ConsoleError> {
        let request = self
            .http
            .get(self.admin_url("products"))
            .query(&[("page", page)]);
        let response = self.authorized(request, session).send().await?;
        let body: ProductListResponse = read_json(response).await?;
        if !body.success {
            return Err(rejected(None, "product list rejected"));
        }
        if body.products.skipped > 0 {
            warn!(page, skipped = body.products.skipped, "unreadable products dropped from page");
        }
        let page: CollectionPage = body.into();
        debug!(
            count = page.products.len(),
            current_page = page.pagination.current_page,
            total_pages = page.pagination.total_pages,
            "product page received"
        );
        Ok(page)
    }

    async fn create_product(
        &self,
        session: &Session,
        payload: &Product,
    ) -> Result<Product, ConsoleError> {
        let request = self
            .http
            .post(self.admin_url("product"))
            .json(&DataEnvelope::new(payload));
        let response = self.authorized(request, session).send().await?;
        let body: ProductMutationResponse = read_json(response).await?;
        if !body.success {
            return Err(rejected(body.message.as_ref(), "create rejected"));
        }
        debug!(title = %payload.title, "product created");
        Ok(body.product.unwrap_or_else(|| payload.clone()))
    }

    async fn update_product(
        &self,
        session: &Session,
        id: &ProductId,
        payload: &Product,
    ) -> Result<Product, ConsoleError> {
        let request = self
            .http
            .put(self.admin_url(&format!("product/{id}")))
            .json(&DataEnvelope::new(payload));
        let response = self.authorized(request, session).send().await?;
        let body: ProductMutationResponse = read_json(response).await?;
        if !body.success {
            return Err(rejected(body.message.as_ref(), "update rejected"));
        }
        debug!(product_id = %id, "product updated");
        Ok(body.product.unwrap_or_else(|| Product {
            id: Some(id.clone()),
            ..payload.clone()
        }))
    }

    async fn delete_product(&self, session: &Session, id: &ProductId) -> Result<(), ConsoleError> {
        let request = self.http.delete(self.admin_url(&format!("product/{id}")));
        let response = self.authorized(request, session).send().await?;
        let body: StatusResponse = read_json(response).await?;
        if !body.success {
            return Err(rejected(body.message.as_ref(), "delete rejected"));
        }
        debug!(product_id = %id, "product deleted");
        Ok(())
    }

    async fn upload_asset(
        &self,
        session: &Session,
        asset: &AssetUpload,
    ) -> Result<String, ConsoleError> {
        let part = Part::bytes(asset.bytes.clone())
            .file_name(asset.filename.clone())
            .mime_str(asset.content_type())?;
        let request = self
            .http
            .post(self.admin_url("upload"))
            .multipart(Form::new().part(UPLOAD_FIELD, part));
        let response = self.authorized(request, session).send().await?;
        let body: UploadResponse = read_json(response).await?;
        if !body.success || body.image_url.is_empty() {
            return Err(rejected(body.message.as_ref(), "upload rejected"));
        }
        debug!(filename = %asset.filename, url = %body.image_url, "asset stored");
        Ok(body.image_url)
    }

    async fn end_session(&self, session: &Session) -> Result<(), ConsoleError> {
        let request = self.http.post(format!("{}/logout", self.base_url));
        let response = self.authorized(request, session).send().await?;
        let body: StatusResponse = read_json(response).await.map_err(into_session_error)?;
        if !body.success {
            return Err(ConsoleError::SessionInvalid(body.message_text()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
