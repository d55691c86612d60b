use std::path::Path;

use async_trait::async_trait;
use shared::domain::{CollectionPage, Credentials, Product, ProductId, Session};

pub mod console;
pub mod dialog;
pub mod draft;
pub mod error;
pub mod http;
pub mod list;

pub use console::{ConsoleEvent, EditorMode, ProductConsole};
pub use dialog::{
    DialogKind, DialogNotice, DialogState, DialogSurface, DialogWidget, HeadlessSurface,
    ModalLifecycleController, WidgetEvents, WidgetSignal,
};
pub use draft::{DraftStore, InputKind, ProductField};
pub use error::{ConsoleError, DraftError, ErrorCategory, Operation};
pub use http::HttpCatalogClient;
pub use list::{ListController, RemoveError};

/// Largest asset accepted for upload, checked before any network call.
pub const MAX_ASSET_BYTES: u64 = 3 * 1024 * 1024;

const ACCEPTED_ASSET_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// The remote product API the console drives. Every call takes the session
/// explicitly; implementations hold no ambient credential.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, ConsoleError>;
    async fn verify_session(&self, session: &Session) -> Result<(), ConsoleError>;
    async fn list_products(
        &self,
        session: &Session,
        page: u32,
    ) -> Result<CollectionPage, ConsoleError>;
    async fn create_product(
        &self,
        session: &Session,
        payload: &Product,
    ) -> Result<Product, ConsoleError>;
    async fn update_product(
        &self,
        session: &Session,
        id: &ProductId,
        payload: &Product,
    ) -> Result<Product, ConsoleError>;
    async fn delete_product(&self, session: &Session, id: &ProductId) -> Result<(), ConsoleError>;
    async fn upload_asset(
        &self,
        session: &Session,
        asset: &AssetUpload,
    ) -> Result<String, ConsoleError>;
    async fn end_session(&self, session: &Session) -> Result<(), ConsoleError>;
}

#[derive(Debug, Clone)]
pub struct AssetUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl AssetUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let mime_type = mime_guess::from_path(Path::new(&filename))
            .first()
            .map(|mime| mime.essence_str().to_string());
        Self {
            filename,
            mime_type,
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn content_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .unwrap_or("application/octet-stream")
    }

    /// Local checks run before the asset is handed to the API.
    pub fn validate(&self) -> Result<(), ConsoleError> {
        if self.size() > MAX_ASSET_BYTES {
            return Err(ConsoleError::AssetTooLarge {
                size: self.size(),
                limit: MAX_ASSET_BYTES,
            });
        }
        let content_type = self.content_type();
        if !ACCEPTED_ASSET_TYPES.contains(&content_type) {
            return Err(ConsoleError::UnsupportedAsset(content_type.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
