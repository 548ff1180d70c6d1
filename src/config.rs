use crate::error::{GatewayError, GatewayResult};
use crate::request::TransactionType;
use std::env;
use std::str::FromStr;

pub const SANDBOX_ENDPOINT: &str = "https://apitest.authorize.net/xml/v1/request.api";
pub const PRODUCTION_ENDPOINT: &str = "https://api.authorize.net/xml/v1/request.api";

/// Merchant credentials and processing defaults.
///
/// The client key is the public half used by the hosted tokenization
/// frontend; the transaction key is the shared secret and must never leave
/// the server side.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_login: String,
    pub transaction_key: String,
    pub client_key: Option<String>,
    pub sandbox: bool,
    /// Transaction type used during checkout when the caller does not pick
    /// one explicitly.
    pub default_transaction_type: TransactionType,
}

impl GatewayConfig {
    pub fn new(api_login: impl Into<String>, transaction_key: impl Into<String>) -> Self {
        Self {
            api_login: api_login.into(),
            transaction_key: transaction_key.into(),
            client_key: None,
            sandbox: true,
            default_transaction_type: TransactionType::AuthOnly,
        }
    }

    pub fn from_env() -> GatewayResult<Self> {
        let api_login = env::var("AUTHNET_API_LOGIN").map_err(|_| {
            GatewayError::validation(
                "AUTHNET_API_LOGIN environment variable is required",
                Some("AUTHNET_API_LOGIN"),
            )
        })?;
        let transaction_key = env::var("AUTHNET_TRANSACTION_KEY").map_err(|_| {
            GatewayError::validation(
                "AUTHNET_TRANSACTION_KEY environment variable is required",
                Some("AUTHNET_TRANSACTION_KEY"),
            )
        })?;

        let default_transaction_type = match env::var("AUTHNET_TRANSACTION_TYPE") {
            Ok(value) => TransactionType::from_str(&value)?,
            Err(_) => TransactionType::AuthOnly,
        };

        let config = Self {
            api_login,
            transaction_key,
            client_key: env::var("AUTHNET_CLIENT_KEY").ok(),
            sandbox: env::var("AUTHNET_SANDBOX")
                .ok()
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(true),
            default_transaction_type,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GatewayResult<()> {
        if self.api_login.trim().is_empty() {
            return Err(GatewayError::validation(
                "api_login must not be empty",
                Some("api_login"),
            ));
        }
        if self.transaction_key.trim().is_empty() {
            return Err(GatewayError::validation(
                "transaction_key must not be empty",
                Some("transaction_key"),
            ));
        }
        Ok(())
    }

    /// Whether the configured default transaction type captures immediately.
    pub fn captures_by_default(&self) -> bool {
        matches!(self.default_transaction_type, TransactionType::AuthCapture)
    }

    pub fn endpoint(&self) -> &'static str {
        if self.sandbox {
            SANDBOX_ENDPOINT
        } else {
            PRODUCTION_ENDPOINT
        }
    }
}
