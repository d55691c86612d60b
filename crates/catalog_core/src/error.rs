//! Error taxonomy for the console core.

use shared::error::{ApiException, ErrorCode};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Session,
    Validation,
    Asset,
    Transport,
    NotFound,
    Busy,
}

/// The operation a failure or notice belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SignIn,
    VerifySession,
    ListProducts,
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    UploadAsset,
    SignOut,
    EditDraft,
}

impl Operation {
    pub fn label(self) -> &'static str {
        match self {
            Self::SignIn => "sign_in",
            Self::VerifySession => "verify_session",
            Self::ListProducts => "list_products",
            Self::CreateProduct => "create_product",
            Self::UpdateProduct => "update_product",
            Self::DeleteProduct => "delete_product",
            Self::UploadAsset => "upload_asset",
            Self::SignOut => "sign_out",
            Self::EditDraft => "edit_draft",
        }
    }
}

/// Local draft edits that were refused. The draft is left unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftError {
    #[error("unknown product field '{0}'")]
    UnknownField(String),
    #[error("'{raw}' is not a number for field {field}")]
    InvalidNumber { field: &'static str, raw: String },
    #[error("{field} must not be negative (got {value})")]
    NegativeNumber { field: &'static str, value: f64 },
    #[error("field {0} is not a toggle")]
    NotAToggle(&'static str),
}

#[derive(Debug, Clone, Error)]
pub enum ConsoleError {
    #[error("session invalid: {0}")]
    SessionInvalid(String),
    #[error("rejected by server: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("asset is {size} bytes; the limit is {limit} bytes")]
    AssetTooLarge { size: u64, limit: u64 },
    #[error("unsupported asset type '{0}'; only JPEG and PNG images are accepted")]
    UnsupportedAsset(String),
    #[error("network failure: {0}")]
    Transport(String),
    #[error("a submit is already in flight")]
    SubmitInFlight,
    #[error(transparent)]
    Draft(#[from] DraftError),
}

impl ConsoleError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SessionInvalid(_) => ErrorCategory::Session,
            Self::Validation(_) | Self::Draft(_) => ErrorCategory::Validation,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::AssetTooLarge { .. } | Self::UnsupportedAsset(_) => ErrorCategory::Asset,
            Self::Transport(_) => ErrorCategory::Transport,
            Self::SubmitInFlight => ErrorCategory::Busy,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category() == ErrorCategory::Session
    }

    pub fn not_signed_in() -> Self {
        Self::SessionInvalid("not signed in".to_string())
    }
}

impl From<ApiException> for ConsoleError {
    fn from(value: ApiException) -> Self {
        match value.code {
            ErrorCode::Unauthorized => Self::SessionInvalid(value.message),
            ErrorCode::NotFound => Self::NotFound(value.message),
            ErrorCode::Validation | ErrorCode::PayloadTooLarge => Self::Validation(value.message),
            ErrorCode::Unavailable | ErrorCode::Internal => Self::Transport(match value.status {
                Some(status) => format!("HTTP {status}: {}", value.message),
                None => value.message,
            }),
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(value: reqwest::Error) -> Self {
        if let Some(status) = value.status() {
            return ApiException::from_status(status.as_u16(), value.to_string()).into();
        }
        if value.is_decode() {
            return Self::Transport(format!("malformed response: {value}"));
        }
        Self::Transport(value.to_string())
    }
}
