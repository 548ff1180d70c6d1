use crate::error::GatewayResult;
use crate::request::{
    CreateCustomerPaymentProfileRequest, CreateCustomerProfileRequest,
    DeleteCustomerPaymentProfileRequest, TransactionRequest,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResultCode {
    Ok,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseMessage {
    pub code: String,
    pub text: String,
}

impl ResponseMessage {
    pub fn new(code: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            text: text.into(),
        }
    }
}

/// Structured gateway response, as decoded by the transport implementation.
///
/// `messages` carries the result-code detail; `errors` carries
/// transaction-level hard errors. Operation-specific fields are optional and
/// populated only where the operation returns them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub result_code: ResultCode,
    pub messages: Vec<ResponseMessage>,
    pub errors: Vec<ResponseMessage>,
    pub trans_id: Option<String>,
    pub customer_profile_id: Option<String>,
    pub customer_payment_profile_id: Option<String>,
    /// Raw provider payload, kept for diagnostics only.
    pub raw: Option<JsonValue>,
}

impl GatewayResponse {
    pub fn ok() -> Self {
        Self {
            result_code: ResultCode::Ok,
            messages: vec![ResponseMessage::new("I00001", "Successful.")],
            errors: Vec::new(),
            trans_id: None,
            customer_profile_id: None,
            customer_payment_profile_id: None,
            raw: None,
        }
    }

    pub fn error(code: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            result_code: ResultCode::Error,
            messages: vec![ResponseMessage::new(code, text)],
            errors: Vec::new(),
            trans_id: None,
            customer_profile_id: None,
            customer_payment_profile_id: None,
            raw: None,
        }
    }

    pub fn with_trans_id(mut self, trans_id: impl Into<String>) -> Self {
        self.trans_id = Some(trans_id.into());
        self
    }

    pub fn with_customer_profile_id(mut self, id: impl Into<String>) -> Self {
        self.customer_profile_id = Some(id.into());
        self
    }

    pub fn with_payment_profile_id(mut self, id: impl Into<String>) -> Self {
        self.customer_payment_profile_id = Some(id.into());
        self
    }

    pub fn with_transaction_error(mut self, code: impl Into<String>, text: impl Into<String>) -> Self {
        self.errors.push(ResponseMessage::new(code, text));
        self
    }

    pub fn is_ok(&self) -> bool {
        self.result_code == ResultCode::Ok
    }

    pub fn first_message(&self) -> Option<&ResponseMessage> {
        self.messages.first()
    }

    pub fn first_error(&self) -> Option<&ResponseMessage> {
        self.errors.first()
    }

    /// Formats the response as one `code: text` line per message.
    pub fn describe(&self) -> String {
        let lines: Vec<String> = self
            .messages
            .iter()
            .map(|m| format!("{}: {}", m.code, m.text))
            .collect();
        format!(
            "Received response with code {:?} from the gateway: {}",
            self.result_code,
            lines.join("\n")
        )
    }
}

/// Logs a gateway response; errors at error level, everything else at info.
pub fn log_response(response: &GatewayResponse) {
    let description = response.describe();
    match response.result_code {
        ResultCode::Error => error!(response = %description, "gateway returned an error response"),
        ResultCode::Ok => info!(response = %description, "gateway response received"),
    }
}

/// Transport seam to the remote processor. Implementations own HTTP and
/// wire-format concerns; every call is a single synchronous exchange with no
/// retry at this layer.
#[async_trait]
pub trait AuthNetClient: Send + Sync {
    async fn create_transaction(
        &self,
        request: TransactionRequest,
    ) -> GatewayResult<GatewayResponse>;

    async fn create_customer_profile(
        &self,
        request: CreateCustomerProfileRequest,
    ) -> GatewayResult<GatewayResponse>;

    async fn create_customer_payment_profile(
        &self,
        request: CreateCustomerPaymentProfileRequest,
    ) -> GatewayResult<GatewayResponse>;

    async fn delete_customer_payment_profile(
        &self,
        request: DeleteCustomerPaymentProfileRequest,
    ) -> GatewayResult<GatewayResponse>;

    /// Credential check used by configuration validation
    /// (`authenticateTestRequest`).
    async fn authenticate_test(&self) -> GatewayResult<GatewayResponse>;
}
