use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Unified error type for gateway operations.
///
/// Classification happens at the point a response is received; nothing is
/// swallowed except the documented benign cases (record-not-found during
/// delete, duplicate during profile creation).
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Malformed caller input. Raised by local validation; never reaches the
    /// remote gateway.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The gateway's response could not be interpreted into a valid local
    /// state transition. Local state is left unchanged.
    #[error("Invalid gateway response: {message}")]
    InvalidResponse { message: String },

    /// Business-level transaction failure. The customer may retry with a
    /// different card.
    #[error("Payment gateway error: {message}")]
    Gateway {
        message: String,
        code: Option<String>,
    },

    /// The gateway declared the transaction non-authorizable. Terminal for
    /// this attempt.
    #[error("Payment declined: {message}")]
    HardDecline {
        message: String,
        code: Option<String>,
    },

    /// The stored credential no longer exists on the gateway. The caller is
    /// responsible for deleting the referenced payment method before
    /// surfacing the failure, so nothing retries against a dead credential.
    #[error("The provided payment method is no longer valid")]
    InvalidPaymentMethod { method_id: String },

    /// Transport-level failure reported by the client implementation.
    #[error("Transport error: {message}")]
    Transport { message: String },
}

impl GatewayError {
    pub fn validation(message: impl Into<String>, field: Option<&str>) -> Self {
        GatewayError::Validation {
            message: message.into(),
            field: field.map(|f| f.to_string()),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        GatewayError::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Validation { .. } => false,
            GatewayError::InvalidResponse { .. } => false,
            GatewayError::Gateway { .. } => false,
            GatewayError::HardDecline { .. } => false,
            GatewayError::InvalidPaymentMethod { .. } => false,
            GatewayError::Transport { .. } => true,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Validation { message, .. } => message.clone(),
            GatewayError::InvalidResponse { .. } => {
                "The payment service returned an unexpected response".to_string()
            }
            GatewayError::Gateway { .. } => {
                "The payment could not be processed. Please try a different card".to_string()
            }
            GatewayError::HardDecline { .. } => "Payment was declined".to_string(),
            GatewayError::InvalidPaymentMethod { .. } => {
                "The provided payment method is no longer valid".to_string()
            }
            GatewayError::Transport { .. } => {
                "The payment service is temporarily unavailable".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_errors_are_retryable() {
        assert!(GatewayError::Transport {
            message: "timeout".to_string()
        }
        .is_retryable());
        assert!(!GatewayError::HardDecline {
            message: "declined".to_string(),
            code: None
        }
        .is_retryable());
        assert!(!GatewayError::InvalidPaymentMethod {
            method_id: "pm_1".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn validation_errors_surface_their_message() {
        let err = GatewayError::validation("amount must be positive", Some("amount"));
        assert_eq!(err.user_message(), "amount must be positive");
    }
}
