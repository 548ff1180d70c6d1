use crate::error::{GatewayError, GatewayResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A currency-qualified decimal amount.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn validate_positive(&self, field: &str) -> GatewayResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(GatewayError::validation(
                "amount must be greater than zero",
                Some(field),
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(GatewayError::validation(
                "currency is required",
                Some("currency"),
            ));
        }
        Ok(())
    }

    /// Fails unless `other` is denominated in the same currency.
    pub fn assert_same_currency(&self, other: &Money, field: &str) -> GatewayResult<()> {
        if self.currency != other.currency {
            return Err(GatewayError::validation(
                format!(
                    "currency mismatch: expected {}, got {}",
                    self.currency, other.currency
                ),
                Some(field),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Payment lifecycle states. Transitions happen only through the gateway
/// operations in [`crate::lifecycle`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    New,
    Authorization,
    AuthorizationVoided,
    Completed,
    PartiallyRefunded,
    Refunded,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::New => "new",
            PaymentState::Authorization => "authorization",
            PaymentState::AuthorizationVoided => "authorization_voided",
            PaymentState::Completed => "completed",
            PaymentState::PartiallyRefunded => "partially_refunded",
            PaymentState::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference to the order a payment belongs to, carrying the fields the
/// gateway wants echoed on authorization requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRef {
    pub invoice_number: String,
    pub customer_ip: Option<String>,
}

/// One attempted movement of funds. Persisted by the host application;
/// mutated only by the lifecycle operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub state: PaymentState,
    pub amount: Money,
    /// Monotonically non-decreasing, never exceeds `amount`.
    pub refunded_amount: Money,
    /// Gateway transaction id. Immutable once set.
    pub remote_id: Option<String>,
    pub order: OrderRef,
    pub method_id: String,
}

impl Payment {
    pub fn new(
        id: impl Into<String>,
        amount: Money,
        order: OrderRef,
        method_id: impl Into<String>,
    ) -> Self {
        let refunded_amount = Money::zero(amount.currency.clone());
        Self {
            id: id.into(),
            state: PaymentState::New,
            amount,
            refunded_amount,
            remote_id: None,
            order,
            method_id: method_id.into(),
        }
    }

    /// Balance still eligible for refund.
    pub fn remaining_refundable(&self) -> Decimal {
        self.amount.amount - self.refunded_amount.amount
    }
}

/// The customer a payment method belongs to. Anonymous owners have no
/// durable record, which changes how remote profile ids are stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Owner {
    Authenticated { id: String, email: String },
    Anonymous,
}

impl Owner {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Owner::Authenticated { .. })
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Owner::Authenticated { id, .. } => Some(id),
            Owner::Anonymous => None,
        }
    }
}

/// Card networks accepted by the gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CardBrand {
    Amex,
    DinersClub,
    Discover,
    Jcb,
    MasterCard,
    Visa,
}

impl CardBrand {
    /// Maps the gateway's card type label to a brand. Unsupported labels are
    /// a hard decline, matching how the remote reports them.
    pub fn from_gateway_name(name: &str) -> GatewayResult<Self> {
        match name {
            "American Express" => Ok(CardBrand::Amex),
            "Diners Club" => Ok(CardBrand::DinersClub),
            "Discover" => Ok(CardBrand::Discover),
            "JCB" => Ok(CardBrand::Jcb),
            "MasterCard" => Ok(CardBrand::MasterCard),
            "Visa" => Ok(CardBrand::Visa),
            other => Err(GatewayError::HardDecline {
                message: format!("Unsupported credit card type \"{}\"", other),
                code: None,
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CardBrand::Amex => "amex",
            CardBrand::DinersClub => "dinersclub",
            CardBrand::Discover => "discover",
            CardBrand::Jcb => "jcb",
            CardBrand::MasterCard => "mastercard",
            CardBrand::Visa => "visa",
        }
    }
}

/// A stored, tokenized card reference. The remote id format depends on the
/// owner: authenticated owners store only the payment-profile id, anonymous
/// owners store the composite `customerProfileId|paymentProfileId` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    pub owner: Owner,
    pub remote_id: String,
    pub brand: CardBrand,
    pub last4: String,
    pub expiration_month: String,
    pub expiration_year: String,
    pub reusable: bool,
    pub expires_at: Option<DateTime<Utc>>,
}
