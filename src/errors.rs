use thiserror::Error;

/// Errors surfaced by the pricing and settlement services.
///
/// `Persistence` is the only retryable category; callers are expected to
/// retry with backoff. Everything else is terminal for the invocation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("no active pricing configuration is published")]
    ConfigInactive,

    #[error("commission record for order {order_id} is finalized and can no longer change")]
    CommissionFinalized { order_id: String },

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("storage error: {0}")]
    Persistence(#[from] mongodb::error::Error),
}

impl CoreError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        CoreError::Validation {
            field,
            message: message.into(),
        }
    }
}
