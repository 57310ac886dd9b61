use serde_json::Value as JsonValue;
use thiserror::Error;

pub type PaymentResult<T> = Result<T, PaymentError>;

#[derive(Debug, Clone, Error)]
pub enum PaymentError {
    #[error("Validation error: {message}")]
    ValidationError {
        message: String,
        field: Option<String>,
    },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Provider timed out after {timeout_secs}s")]
    TimeoutError { timeout_secs: u64 },

    /// The provider answered with a non-success status or an unreadable body.
    #[error("Provider error: provider={provider}, message={message}")]
    ProviderError {
        provider: String,
        message: String,
        status: Option<u16>,
        details: Option<JsonValue>,
    },
}

impl PaymentError {
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        PaymentError::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            PaymentError::ValidationError { .. } => 400,
            PaymentError::ConfigurationError { .. } => 500,
            PaymentError::NetworkError { .. } => 502,
            PaymentError::TimeoutError { .. } => 504,
            PaymentError::ProviderError { status, .. } => status.unwrap_or(502),
        }
    }
}

impl From<PaymentError> for crate::error::AppError {
    fn from(err: PaymentError) -> Self {
        use crate::error::{AppError, AppErrorKind, ExternalError, ValidationError};

        match err {
            PaymentError::ValidationError { message, field } => {
                AppError::new(AppErrorKind::Validation(match field.as_deref() {
                    Some("amount") => ValidationError::InvalidAmount {
                        amount: String::new(),
                        reason: message,
                    },
                    _ => ValidationError::InvalidPayload {
                        field,
                        reason: message,
                    },
                }))
            }
            PaymentError::ConfigurationError { message } => AppError::configuration(message),
            PaymentError::NetworkError { message } => {
                AppError::new(AppErrorKind::External(ExternalError::PaymentProvider {
                    provider: "Versell".to_string(),
                    message,
                    status: None,
                    details: None,
                }))
            }
            PaymentError::TimeoutError { timeout_secs } => {
                AppError::new(AppErrorKind::External(ExternalError::Timeout {
                    service: "Versell".to_string(),
                    timeout_secs,
                }))
            }
            PaymentError::ProviderError {
                provider,
                message,
                status,
                details,
            } => AppError::new(AppErrorKind::External(ExternalError::PaymentProvider {
                provider,
                message,
                status,
                details,
            })),
        }
    }
}
