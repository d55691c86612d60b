use std::collections::BTreeMap;

use serde::{de::IgnoredAny, Deserialize, Serialize};

use crate::domain::{CollectionPage, Pagination, Product};

/// Request bodies wrap the product in a `data` member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Remote messages arrive either as a single string or as a list of
/// per-field validation messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ApiMessage {
    One(String),
    Many(Vec<String>),
}

impl ApiMessage {
    pub fn joined(&self) -> String {
        match self {
            Self::One(message) => message.clone(),
            Self::Many(messages) => messages.join("; "),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ApiMessage>,
    #[serde(default)]
    pub token: String,
    /// Expiry as a unix timestamp in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ApiMessage>,
}

impl StatusResponse {
    pub fn message_text(&self) -> String {
        self.message
            .as_ref()
            .map(ApiMessage::joined)
            .unwrap_or_default()
    }
}

/// One element of a product collection. A record that does not decode as a
/// product is kept as `Unreadable` so the rest of the page survives.
#[derive(Deserialize)]
#[serde(untagged)]
enum Entry {
    Product(Product),
    Unreadable(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCollection {
    List(Vec<Entry>),
    Keyed(BTreeMap<String, Entry>),
    Empty(()),
}

/// Product lists arrive either as an array or as an object keyed by id.
/// Records that cannot be read are dropped and counted in `skipped`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawCollection")]
pub struct ProductCollection {
    pub products: Vec<Product>,
    pub skipped: usize,
}

impl From<RawCollection> for ProductCollection {
    fn from(raw: RawCollection) -> Self {
        let entries: Vec<Entry> = match raw {
            RawCollection::List(entries) => entries,
            RawCollection::Keyed(entries) => entries.into_values().collect(),
            RawCollection::Empty(()) => Vec::new(),
        };
        let mut collection = Self::default();
        for entry in entries {
            match entry {
                Entry::Product(product) => collection.products.push(product),
                Entry::Unreadable(_) => collection.skipped += 1,
            }
        }
        collection
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductListResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub products: ProductCollection,
    #[serde(default)]
    pub pagination: Pagination,
}

impl From<ProductListResponse> for CollectionPage {
    fn from(value: ProductListResponse) -> Self {
        Self {
            products: value.products.products,
            pagination: value.pagination,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMutationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ApiMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ApiMessage>,
    #[serde(default, rename = "imageUrl")]
    pub image_url: String,
}
