//! The product draft under edit and the pure transformations applied to it.
//!
//! Every edit takes the current snapshot by reference and produces the next
//! one; the store only swaps snapshots, so a previously handed-out copy is
//! never mutated behind its holder's back.

use std::str::FromStr;

use shared::domain::{EnabledFlag, Product};
use tracing::{debug, warn};

use crate::error::DraftError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductField {
    Title,
    Category,
    Unit,
    Description,
    Content,
    OriginPrice,
    Price,
    Trending,
    IsEnabled,
    ImageUrl,
}

impl ProductField {
    pub const ALL: [ProductField; 10] = [
        Self::Title,
        Self::Category,
        Self::Unit,
        Self::Description,
        Self::Content,
        Self::OriginPrice,
        Self::Price,
        Self::Trending,
        Self::IsEnabled,
        Self::ImageUrl,
    ];

    /// Wire name of the field.
    pub fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Category => "category",
            Self::Unit => "unit",
            Self::Description => "description",
            Self::Content => "content",
            Self::OriginPrice => "origin_price",
            Self::Price => "price",
            Self::Trending => "trending",
            Self::IsEnabled => "is_enabled",
            Self::ImageUrl => "imageUrl",
        }
    }

    fn is_price(self) -> bool {
        matches!(self, Self::OriginPrice | Self::Price)
    }
}

impl FromStr for ProductField {
    type Err = DraftError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.name() == name)
            .or(match name {
                "image_url" => Some(Self::ImageUrl),
                _ => None,
            })
            .ok_or_else(|| DraftError::UnknownField(name.to_string()))
    }
}

/// How the presentation layer produced the raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    #[default]
    Text,
    Number,
    Radio,
    Toggle {
        checked: bool,
    },
}

fn parse_number(field: ProductField, raw: &str) -> Result<f64, DraftError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(DraftError::InvalidNumber {
            field: field.name(),
            raw: raw.to_string(),
        }),
    }
}

fn parse_price(field: ProductField, raw: &str) -> Result<f64, DraftError> {
    let value = parse_number(field, raw)?;
    if value < 0.0 {
        return Err(DraftError::NegativeNumber {
            field: field.name(),
            value,
        });
    }
    // "-0" passes the sign check; store it as plain zero.
    Ok(value + 0.0)
}

/// Returns `draft` with `field` set from `raw`, coerced according to the
/// field's type and the input kind.
pub fn with_field(
    draft: &Product,
    field: ProductField,
    raw: &str,
    kind: InputKind,
) -> Result<Product, DraftError> {
    let mut next = draft.clone();
    match (field, kind) {
        (ProductField::IsEnabled, InputKind::Toggle { checked }) => {
            next.is_enabled = EnabledFlag::from_checked(checked);
        }
        (other, InputKind::Toggle { .. }) => return Err(DraftError::NotAToggle(other.name())),
        (ProductField::OriginPrice, _) => next.origin_price = parse_price(field, raw)?,
        (ProductField::Price, _) => next.price = parse_price(field, raw)?,
        (ProductField::Trending, _) => next.trending = parse_number(field, raw)?,
        (ProductField::IsEnabled, _) => next.is_enabled = EnabledFlag::from_raw(raw),
        (ProductField::Title, _) => next.title = raw.to_string(),
        (ProductField::Category, _) => next.category = raw.to_string(),
        (ProductField::Unit, _) => next.unit = raw.to_string(),
        (ProductField::Description, _) => next.description = raw.to_string(),
        (ProductField::Content, _) => next.content = raw.to_string(),
        (ProductField::ImageUrl, _) => next.image_url = raw.to_string(),
    }
    if field.is_price() {
        debug!(field = field.name(), raw, "coerced price input");
    }
    Ok(next)
}

/// Returns `draft` with `images_url[index]` replaced.
///
/// An out-of-bounds index is a caller bug: it trips a debug assertion, and in
/// release builds it is logged and the draft is returned unchanged.
pub fn with_image_at(draft: &Product, index: usize, value: &str) -> Product {
    match draft.images_url.with_replaced(index, value) {
        Some(images_url) => Product {
            images_url,
            ..draft.clone()
        },
        None => {
            debug_assert!(
                false,
                "image index {index} out of bounds (len {})",
                draft.images_url.len()
            );
            warn!(
                index,
                len = draft.images_url.len(),
                "ignoring out-of-bounds image edit"
            );
            draft.clone()
        }
    }
}

/// Whether a new blank image slot may be appended.
pub fn can_append_image(draft: &Product) -> bool {
    let images = &draft.images_url;
    !images.is_full() && images.last().map_or(true, |last| !last.is_empty())
}

pub fn can_remove_image(draft: &Product) -> bool {
    !draft.images_url.is_empty()
}

/// Returns `draft` with a blank slot appended, or unchanged when appending is
/// not allowed.
pub fn with_appended_image(draft: &Product) -> Product {
    if !can_append_image(draft) {
        return draft.clone();
    }
    match draft.images_url.with_pushed(String::new()) {
        Some(images_url) => Product {
            images_url,
            ..draft.clone()
        },
        None => draft.clone(),
    }
}

pub fn without_last_image(draft: &Product) -> Product {
    Product {
        images_url: draft.images_url.without_last(),
        ..draft.clone()
    }
}

/// Holds the current draft snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftStore {
    current: Product,
}

impl Default for DraftStore {
    fn default() -> Self {
        Self::new(Product::empty_template())
    }
}

impl DraftStore {
    pub fn new(initial: Product) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> &Product {
        &self.current
    }

    pub fn snapshot(&self) -> Product {
        self.current.clone()
    }

    pub fn reset(&mut self, template: Product) -> &Product {
        self.current = template;
        &self.current
    }

    pub fn set_field(
        &mut self,
        name: &str,
        raw: &str,
        kind: InputKind,
    ) -> Result<&Product, DraftError> {
        let field = name.parse::<ProductField>()?;
        self.current = with_field(&self.current, field, raw, kind)?;
        Ok(&self.current)
    }

    pub fn set_image_at(&mut self, index: usize, value: &str) -> &Product {
        self.current = with_image_at(&self.current, index, value);
        &self.current
    }

    pub fn append_image(&mut self) -> &Product {
        self.current = with_appended_image(&self.current);
        &self.current
    }

    pub fn remove_last_image(&mut self) -> &Product {
        self.current = without_last_image(&self.current);
        &self.current
    }
}

#[cfg(test)]
#[path = "tests/draft_tests.rs"]
mod tests;
