//! Unified error handling for the Versell gateway
//!
//! Every handler failure is expressed as an [`AppError`], which knows its HTTP
//! status, its machine-readable code, and the message shown to the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Error codes for programmatic handling by clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    // Domain errors (4xx)
    #[serde(rename = "TRANSACTION_NOT_FOUND")]
    TransactionNotFound,

    // Infrastructure errors (5xx)
    #[serde(rename = "CACHE_ERROR")]
    CacheError,
    #[serde(rename = "CONFIGURATION_ERROR")]
    ConfigurationError,

    // External errors (provider status, 502, 504)
    #[serde(rename = "PAYMENT_PROVIDER_ERROR")]
    PaymentProviderError,
    #[serde(rename = "EXTERNAL_SERVICE_TIMEOUT")]
    ExternalServiceTimeout,

    // Generic
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
}

/// Domain-specific lookup errors
#[derive(Debug, Clone)]
pub enum DomainError {
    /// No status record is reachable from the given identifier
    TransactionNotFound { reference: String },
}

/// Infrastructure-level errors (store, configuration)
#[derive(Debug, Clone)]
pub enum InfrastructureError {
    /// Key-value store read or write failed
    Cache { message: String },
    /// Missing or invalid configuration
    Configuration { message: String },
}

/// External service errors (the PIX provider)
#[derive(Debug, Clone)]
pub enum ExternalError {
    /// The provider answered, or could not be reached.
    ///
    /// `status` is the provider's own HTTP status when it answered; it is sent
    /// back to the caller unchanged together with the provider body.
    PaymentProvider {
        provider: String,
        message: String,
        status: Option<u16>,
        details: Option<JsonValue>,
    },
    /// External service timeout
    Timeout { service: String, timeout_secs: u64 },
}

/// Input validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// Required field missing or blank
    MissingField { field: String },
    /// Amount is not a positive finite number
    InvalidAmount { amount: String, reason: String },
    /// Body is not a JSON object, or a field has the wrong shape
    InvalidPayload { field: Option<String>, reason: String },
}

impl ValidationError {
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::MissingField { field } => Some(field),
            ValidationError::InvalidAmount { .. } => Some("amount"),
            ValidationError::InvalidPayload { field, .. } => field.as_deref(),
        }
    }
}

/// Unified application error type
#[derive(Debug, Clone)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub request_id: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AppErrorKind {
    Domain(DomainError),
    Infrastructure(InfrastructureError),
    External(ExternalError),
    Validation(ValidationError),
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self {
            kind,
            request_id: None,
            context: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Validation(ValidationError::MissingField {
            field: field.into(),
        }))
    }

    pub fn not_found(reference: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Domain(DomainError::TransactionNotFound {
            reference: reference.into(),
        }))
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Infrastructure(
            InfrastructureError::Configuration {
                message: message.into(),
            },
        ))
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> u16 {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::TransactionNotFound { .. } => 404,
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Cache { .. } => 500,
                InfrastructureError::Configuration { .. } => 500,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentProvider { status, .. } => status
                    .filter(|s| (400..=599).contains(s))
                    .unwrap_or(502),
                ExternalError::Timeout { .. } => 504,
            },
            AppErrorKind::Validation(_) => 400,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> ErrorCode {
        match &self.kind {
            AppErrorKind::Domain(DomainError::TransactionNotFound { .. }) => {
                ErrorCode::TransactionNotFound
            }
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Cache { .. } => ErrorCode::CacheError,
                InfrastructureError::Configuration { .. } => ErrorCode::ConfigurationError,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentProvider { .. } => ErrorCode::PaymentProviderError,
                ExternalError::Timeout { .. } => ErrorCode::ExternalServiceTimeout,
            },
            AppErrorKind::Validation(_) => ErrorCode::ValidationError,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match &self.kind {
            AppErrorKind::Domain(DomainError::TransactionNotFound { reference }) => {
                format!("No payment status found for '{}'", reference)
            }
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Configuration { message } => message.clone(),
                InfrastructureError::Cache { .. } => {
                    "Payment status storage is unavailable; the charge may not be trackable"
                        .to_string()
                }
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentProvider {
                    provider, status, ..
                } => match status {
                    Some(_) => format!("{} request failed", provider),
                    None => format!("{} is temporarily unreachable", provider),
                },
                ExternalError::Timeout {
                    service,
                    timeout_secs,
                } => format!(
                    "{} request timed out after {} seconds. Please try again",
                    service, timeout_secs
                ),
            },
            AppErrorKind::Validation(err) => match err {
                ValidationError::MissingField { field } => format!("{} is required", field),
                ValidationError::InvalidAmount { reason, .. } => format!("amount {}", reason),
                ValidationError::InvalidPayload { reason, .. } => reason.clone(),
            },
        }
    }

    /// Provider body or field name to attach to the error response
    pub fn details(&self) -> Option<JsonValue> {
        match &self.kind {
            AppErrorKind::External(ExternalError::PaymentProvider { details, .. }) => {
                Some(details.clone().unwrap_or(JsonValue::Null))
            }
            AppErrorKind::Validation(err) => err
                .field()
                .map(|field| serde_json::json!({ "field": field })),
            _ => None,
        }
    }

    /// Whether the caller may retry the whole operation
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            AppErrorKind::Domain(_) => false,
            AppErrorKind::Validation(_) => false,
            AppErrorKind::Infrastructure(InfrastructureError::Configuration { .. }) => false,
            AppErrorKind::Infrastructure(InfrastructureError::Cache { .. }) => true,
            AppErrorKind::External(ExternalError::PaymentProvider { status, .. }) => {
                status.map_or(true, |s| s >= 500 || s == 429)
            }
            AppErrorKind::External(ExternalError::Timeout { .. }) => true,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AppErrorKind::External(ExternalError::PaymentProvider {
                provider, message, ..
            }) => write!(f, "{}: {}", provider, message)?,
            AppErrorKind::Infrastructure(InfrastructureError::Cache { message }) => {
                write!(f, "{}", message)?
            }
            _ => write!(f, "{}", self.user_message())?,
        }
        if let Some(context) = &self.context {
            write!(f, " ({})", context)?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}
