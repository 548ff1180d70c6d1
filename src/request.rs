//! Gateway request values.
//!
//! Every remote call takes one complete, immutable request value. The
//! builder assembles transaction requests field by field and hands out the
//! finished value once; nothing mutates a request after construction.

use crate::error::GatewayError;
use crate::types::Money;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TransactionType {
    AuthOnly,
    AuthCapture,
    PriorAuthCapture,
    Void,
    Refund,
}

impl TransactionType {
    /// The gateway's wire name for this transaction type.
    pub fn wire_name(&self) -> &'static str {
        match self {
            TransactionType::AuthOnly => "authOnlyTransaction",
            TransactionType::AuthCapture => "authCaptureTransaction",
            TransactionType::PriorAuthCapture => "priorAuthCaptureTransaction",
            TransactionType::Void => "voidTransaction",
            TransactionType::Refund => "refundTransaction",
        }
    }
}

impl FromStr for TransactionType {
    type Err = GatewayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "auth_only" => Ok(TransactionType::AuthOnly),
            "auth_capture" => Ok(TransactionType::AuthCapture),
            _ => Err(GatewayError::validation(
                format!("unsupported default transaction type: {}", value),
                Some("transaction_type"),
            )),
        }
    }
}

/// Remote customer profile + payment profile pair a transaction charges
/// against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRef {
    pub customer_profile_id: String,
    pub payment_profile_id: String,
}

/// Card re-authentication the gateway requires on refund requests: the
/// masked number (last 4) and `MMYYYY` expiration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardAuthentication {
    pub card_number: String,
    pub expiration_date: String,
}

impl CardAuthentication {
    pub fn for_refund(last4: &str, expiration_month: &str, expiration_year: &str) -> Self {
        Self {
            card_number: last4.to_string(),
            expiration_date: format!("{:0>2}{}", expiration_month, expiration_year),
        }
    }
}

/// One gateway transaction request, complete before the single remote call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub transaction_type: TransactionType,
    pub amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_trans_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(rename = "customerIP", skip_serializing_if = "Option::is_none")]
    pub customer_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<CardAuthentication>,
}

impl TransactionRequest {
    pub fn builder(transaction_type: TransactionType, amount: Money) -> TransactionRequestBuilder {
        TransactionRequestBuilder {
            transaction_type,
            amount,
            ref_trans_id: None,
            profile: None,
            invoice_number: None,
            customer_ip: None,
            payment: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransactionRequestBuilder {
    transaction_type: TransactionType,
    amount: Money,
    ref_trans_id: Option<String>,
    profile: Option<ProfileRef>,
    invoice_number: Option<String>,
    customer_ip: Option<String>,
    payment: Option<CardAuthentication>,
}

impl TransactionRequestBuilder {
    pub fn ref_trans_id(mut self, id: impl Into<String>) -> Self {
        self.ref_trans_id = Some(id.into());
        self
    }

    pub fn profile(mut self, profile: ProfileRef) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn invoice_number(mut self, invoice_number: impl Into<String>) -> Self {
        self.invoice_number = Some(invoice_number.into());
        self
    }

    pub fn customer_ip(mut self, ip: impl Into<String>) -> Self {
        self.customer_ip = Some(ip.into());
        self
    }

    pub fn payment(mut self, payment: CardAuthentication) -> Self {
        self.payment = Some(payment);
        self
    }

    pub fn build(self) -> TransactionRequest {
        TransactionRequest {
            transaction_type: self.transaction_type,
            amount: self.amount,
            ref_trans_id: self.ref_trans_id,
            profile: self.profile,
            invoice_number: self.invoice_number,
            customer_ip: self.customer_ip,
            payment: self.payment,
        }
    }
}

/// Payment credential carried on profile-creation requests. The orchestration
/// core never sees a raw PAN in the opaque-data variant; the card variant
/// exists for the non-tokenized integration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PaymentSource {
    #[serde(rename_all = "camelCase")]
    OpaqueData {
        data_descriptor: String,
        data_value: String,
    },
    #[serde(rename_all = "camelCase")]
    CreditCard {
        card_number: String,
        /// `YYYY-MM`, zero-padded month.
        expiration_date: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        card_code: Option<String>,
    },
}

/// Profile-creation expiration format: `YYYY-MM` with a zero-padded month.
pub fn profile_expiration(expiration_month: &str, expiration_year: &str) -> String {
    format!("{}-{:0>2}", expiration_year, expiration_month)
}

/// Billing address attached to a payment profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BillingAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// One stored card + billing address pair under a customer profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProfilePayload {
    pub customer_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_to: Option<BillingAddress>,
    pub payment: PaymentSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerProfileRequest {
    pub merchant_customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub payment_profile: PaymentProfilePayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPaymentProfileRequest {
    pub customer_profile_id: String,
    pub payment_profile: PaymentProfilePayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCustomerPaymentProfileRequest {
    pub customer_profile_id: String,
    pub customer_payment_profile_id: String,
}
