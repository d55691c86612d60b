use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Upper bound on secondary image references carried by a product.
pub const MAX_SECONDARY_IMAGES: usize = 5;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(ProductId);

/// Binary enable flag. Serialized as the integer `0` or `1`; decodes from
/// integers, booleans, numeric strings and null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(into = "i64")]
pub enum EnabledFlag {
    Disabled,
    #[default]
    Enabled,
}

impl EnabledFlag {
    pub fn from_checked(checked: bool) -> Self {
        if checked {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }

    /// Coerces a radio/text value: "1", "true", "on" or any nonzero number
    /// enable; everything else disables.
    pub fn from_raw(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("on") {
            return Self::Enabled;
        }
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() && value != 0.0 => Self::Enabled,
            _ => Self::Disabled,
        }
    }

    pub fn as_int(self) -> i64 {
        match self {
            Self::Disabled => 0,
            Self::Enabled => 1,
        }
    }

    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }
}

impl From<i64> for EnabledFlag {
    fn from(value: i64) -> Self {
        if value == 0 {
            Self::Disabled
        } else {
            Self::Enabled
        }
    }
}

impl From<EnabledFlag> for i64 {
    fn from(value: EnabledFlag) -> Self {
        value.as_int()
    }
}

impl<'de> Deserialize<'de> for EnabledFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Number(f64),
            Text(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            None | Some(Raw::Flag(false)) => Self::Disabled,
            Some(Raw::Flag(true)) => Self::Enabled,
            Some(Raw::Number(value)) if value.is_finite() && value != 0.0 => Self::Enabled,
            Some(Raw::Number(_)) => Self::Disabled,
            Some(Raw::Text(text)) => Self::from_raw(&text),
        })
    }
}

/// Ordered secondary image references, never longer than
/// [`MAX_SECONDARY_IMAGES`]. A null list decodes as empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(into = "Vec<String>")]
pub struct ImageList(Vec<String>);

impl ImageList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.0.len() >= MAX_SECONDARY_IMAGES
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Returns a copy with `value` at `index`, or `None` when out of bounds.
    pub fn with_replaced(&self, index: usize, value: impl Into<String>) -> Option<Self> {
        if index >= self.0.len() {
            return None;
        }
        let mut next = self.0.clone();
        next[index] = value.into();
        Some(Self(next))
    }

    /// Returns a copy with `value` pushed, or `None` when already full.
    pub fn with_pushed(&self, value: impl Into<String>) -> Option<Self> {
        if self.is_full() {
            return None;
        }
        let mut next = self.0.clone();
        next.push(value.into());
        Some(Self(next))
    }

    pub fn without_last(&self) -> Self {
        let mut next = self.0.clone();
        next.pop();
        Self(next)
    }
}

impl From<Vec<String>> for ImageList {
    fn from(mut value: Vec<String>) -> Self {
        value.truncate(MAX_SECONDARY_IMAGES);
        Self(value)
    }
}

impl From<ImageList> for Vec<String> {
    fn from(value: ImageList) -> Self {
        value.0
    }
}

impl<'de> Deserialize<'de> for ImageList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<Vec<String>>::deserialize(deserializer)?
            .map(Self::from)
            .unwrap_or_default())
    }
}

/// Reads a price-like field given as a number, a numeric string or null.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(Raw::Number(value)) => Ok(value),
        Some(Raw::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(0.0);
            }
            text.parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| de::Error::custom(format!("not a number: {text:?}")))
        }
    }
}

/// A catalog product. `id` is present only for products that already exist
/// server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub origin_price: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub trending: f64,
    #[serde(default)]
    pub is_enabled: EnabledFlag,
    #[serde(default, rename = "imageUrl")]
    pub image_url: String,
    #[serde(default, rename = "imagesUrl")]
    pub images_url: ImageList,
}

impl Product {
    /// The fixed template a create draft starts from.
    pub fn empty_template() -> Self {
        Self {
            id: None,
            title: String::new(),
            category: String::new(),
            unit: String::new(),
            description: String::new(),
            content: String::new(),
            origin_price: 0.0,
            price: 0.0,
            trending: 0.0,
            is_enabled: EnabledFlag::Enabled,
            image_url: String::new(),
            images_url: ImageList::new(),
        }
    }

    pub fn without_id(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }
}

impl Default for Product {
    fn default() -> Self {
        Self::empty_template()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    #[serde(default, alias = "has_pre")]
    pub has_previous: bool,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            has_previous: false,
            has_next: false,
            category: String::new(),
            total: None,
        }
    }
}

/// One page of products plus its pagination metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectionPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

impl CollectionPage {
    pub fn find(&self, id: &ProductId) -> Option<&Product> {
        self.products
            .iter()
            .find(|product| product.id.as_ref() == Some(id))
    }
}

/// Credential passed explicitly into every remote call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
