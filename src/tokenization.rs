//! Payment-method lifecycle: exchanging a payment credential for a durable
//! customer/payment profile pair on the gateway, and deleting stored
//! profiles.
//!
//! Creation is a strictly sequential two-step flow at most: create a
//! customer profile, and on a duplicate-record report, recover the existing
//! id and create the payment profile under it.

use crate::client::{log_response, AuthNetClient};
use crate::codes::{classify, extract_duplicate_profile_id, Classification};
use crate::error::{GatewayError, GatewayResult};
use crate::lifecycle::AuthorizeNetGateway;
use crate::profile::{build_payment_profile, composite_token, guest_merchant_id, ProfileStore};
use crate::request::{
    profile_expiration, BillingAddress, CreateCustomerPaymentProfileRequest,
    CreateCustomerProfileRequest, DeleteCustomerPaymentProfileRequest, PaymentProfilePayload,
    PaymentSource,
};
use crate::types::{CardBrand, Owner, PaymentMethod};
use chrono::{DateTime, Duration, Utc};
use tracing::info;

/// Real lifetime of a one-time opaque token on the gateway side.
pub const OPAQUE_TOKEN_TTL_SECS: i64 = 900;
/// Margin subtracted so the local expiry never outlives the remote one.
pub const OPAQUE_TOKEN_SAFETY_MARGIN_SECS: i64 = 5;

/// Absolute expiry for a method sourced from a one-time opaque token.
pub fn opaque_token_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::seconds(OPAQUE_TOKEN_TTL_SECS - OPAQUE_TOKEN_SAFETY_MARGIN_SECS)
}

/// The payment credential supplied by the caller. The opaque variant is what
/// the hosted tokenization frontend produces; the card variant exists for
/// the non-tokenized integration and is the only place a PAN appears.
#[derive(Debug, Clone)]
pub enum PaymentCredential {
    Opaque {
        data_descriptor: String,
        data_value: String,
    },
    Card {
        number: String,
        security_code: Option<String>,
    },
}

/// Caller-supplied details for creating a payment method.
#[derive(Debug, Clone)]
pub struct PaymentMethodDetails {
    pub credential: PaymentCredential,
    /// Masked display digits. Ignored for the card variant, where the last
    /// four digits come from the number itself.
    pub last4: String,
    pub expiration_month: String,
    pub expiration_year: String,
    /// Card-type label reported by the tokenization frontend, e.g. "Visa" or
    /// "American Express". Required for the opaque variant; detected from
    /// the number for the card variant.
    pub card_type: Option<String>,
    /// Required for anonymous owners, who have no stored email.
    pub customer_email: Option<String>,
    pub billing: Option<BillingAddress>,
}

impl PaymentMethodDetails {
    fn require(value: &str, field: &str) -> GatewayResult<()> {
        if value.trim().is_empty() {
            return Err(GatewayError::validation(
                format!("{} is required", field),
                Some(field),
            ));
        }
        Ok(())
    }

    pub fn validate(&self, owner: &Owner) -> GatewayResult<()> {
        match &self.credential {
            PaymentCredential::Opaque {
                data_descriptor,
                data_value,
            } => {
                Self::require(data_descriptor, "data_descriptor")?;
                Self::require(data_value, "data_value")?;
                Self::require(&self.last4, "last4")?;
            }
            PaymentCredential::Card { number, .. } => {
                Self::require(number, "number")?;
                if !number.chars().all(|c| c.is_ascii_digit()) {
                    return Err(GatewayError::validation(
                        "card number must contain only digits",
                        Some("number"),
                    ));
                }
            }
        }
        Self::require(&self.expiration_month, "expiration_month")?;
        Self::require(&self.expiration_year, "expiration_year")?;
        if !owner.is_authenticated()
            && self
                .customer_email
                .as_deref()
                .unwrap_or("")
                .trim()
                .is_empty()
        {
            return Err(GatewayError::validation(
                "customer_email is required for guest checkout",
                Some("customer_email"),
            ));
        }
        Ok(())
    }

    pub fn resolve_brand(&self) -> GatewayResult<CardBrand> {
        if let Some(label) = &self.card_type {
            return CardBrand::from_gateway_name(label);
        }
        match &self.credential {
            PaymentCredential::Card { number, .. } => detect_brand(number),
            PaymentCredential::Opaque { .. } => Err(GatewayError::validation(
                "card_type is required for opaque payment data",
                Some("card_type"),
            )),
        }
    }

    pub fn display_last4(&self) -> String {
        match &self.credential {
            PaymentCredential::Card { number, .. } if number.chars().count() >= 4 => {
                let skip = number.chars().count() - 4;
                number.chars().skip(skip).collect()
            }
            _ => self.last4.clone(),
        }
    }

    fn payment_source(&self) -> PaymentSource {
        match &self.credential {
            PaymentCredential::Opaque {
                data_descriptor,
                data_value,
            } => PaymentSource::OpaqueData {
                data_descriptor: data_descriptor.clone(),
                data_value: data_value.clone(),
            },
            PaymentCredential::Card {
                number,
                security_code,
            } => PaymentSource::CreditCard {
                card_number: number.clone(),
                expiration_date: profile_expiration(&self.expiration_month, &self.expiration_year),
                card_code: security_code.clone(),
            },
        }
    }
}

/// Detects the card brand from a raw PAN prefix. Unsupported prefixes are a
/// hard decline, matching the gateway's accepted networks.
pub fn detect_brand(number: &str) -> GatewayResult<CardBrand> {
    let brand = if number.starts_with('4') {
        Some(CardBrand::Visa)
    } else if ("51"..="55").contains(&number.get(..2).unwrap_or("")) {
        Some(CardBrand::MasterCard)
    } else if number.starts_with("34") || number.starts_with("37") {
        Some(CardBrand::Amex)
    } else if number.starts_with("6011") || number.starts_with("65") {
        Some(CardBrand::Discover)
    } else if number.starts_with("35") {
        Some(CardBrand::Jcb)
    } else if number.starts_with("30") || number.starts_with("36") || number.starts_with("38") {
        Some(CardBrand::DinersClub)
    } else {
        None
    };
    brand.ok_or_else(|| GatewayError::HardDecline {
        message: "Unsupported credit card number".to_string(),
        code: None,
    })
}

/// What the gateway hands back for persistence onto the method entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedMethod {
    /// Remote id to store: the payment-profile id for authenticated owners,
    /// the composite `customer|payment` pair for anonymous owners.
    pub token: String,
    pub brand: CardBrand,
    pub last4: String,
    pub expiration_month: String,
    pub expiration_year: String,
    pub reusable: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl<C: AuthNetClient> AuthorizeNetGateway<C> {
    /// Exchanges a payment credential for a stored gateway profile and
    /// returns what the caller persists onto the method entity.
    pub async fn create_payment_method(
        &self,
        owner: &Owner,
        details: &PaymentMethodDetails,
        profiles: &mut dyn ProfileStore,
    ) -> GatewayResult<TokenizedMethod> {
        details.validate(owner)?;
        let brand = details.resolve_brand()?;
        let payload = build_payment_profile(details.payment_source(), details.billing.clone());

        let existing = owner.id().and_then(|id| profiles.get(id));
        let (customer_profile_id, payment_profile_id) = match existing {
            Some(customer_profile_id) => {
                let payment_profile_id = self
                    .create_payment_profile_under(&customer_profile_id, payload, owner, profiles)
                    .await?;
                (customer_profile_id, payment_profile_id)
            }
            None => {
                let (customer_profile_id, payment_profile_id) = self
                    .create_customer_with_profile(owner, details, payload)
                    .await?;
                if let Some(owner_id) = owner.id() {
                    profiles.set(owner_id, customer_profile_id.clone());
                }
                (customer_profile_id, payment_profile_id)
            }
        };

        let token = if owner.is_authenticated() {
            payment_profile_id
        } else {
            composite_token(&customer_profile_id, &payment_profile_id)
        };
        let (reusable, expires_at) = match &details.credential {
            PaymentCredential::Opaque { .. } => (false, Some(opaque_token_expiry(Utc::now()))),
            PaymentCredential::Card { .. } => (true, None),
        };
        info!(customer_profile = %customer_profile_id, "payment method tokenized");

        Ok(TokenizedMethod {
            token,
            brand,
            last4: details.display_last4(),
            expiration_month: details.expiration_month.clone(),
            expiration_year: details.expiration_year.clone(),
            reusable,
            expires_at,
        })
    }

    /// Deletes the remote payment profile behind a stored method. A
    /// record-not-found report means it is already gone and is not an error;
    /// the caller deletes the local entity either way.
    pub async fn delete_payment_method(
        &self,
        method: &PaymentMethod,
        profiles: &dyn ProfileStore,
    ) -> GatewayResult<()> {
        let pair = crate::profile::resolve_profile_pair(method, profiles)?;
        let request = DeleteCustomerPaymentProfileRequest {
            customer_profile_id: pair.customer_profile_id,
            customer_payment_profile_id: pair.payment_profile_id,
        };
        let response = self.client().delete_customer_payment_profile(request).await?;
        match classify(&response) {
            Classification::Approved => Ok(()),
            Classification::RecordNotFound { .. } => {
                info!(method = %method.id, "payment profile already deleted remotely");
                Ok(())
            }
            _ => {
                log_response(&response);
                Err(GatewayError::invalid_response(
                    "unable to delete payment method",
                ))
            }
        }
    }

    /// Creates a payment profile under an existing customer profile.
    async fn create_payment_profile_under(
        &self,
        customer_profile_id: &str,
        payload: PaymentProfilePayload,
        owner: &Owner,
        profiles: &mut dyn ProfileStore,
    ) -> GatewayResult<String> {
        let request = CreateCustomerPaymentProfileRequest {
            customer_profile_id: customer_profile_id.to_string(),
            payment_profile: payload,
        };
        let response = self.client().create_customer_payment_profile(request).await?;
        match classify(&response) {
            Classification::Approved => response.customer_payment_profile_id.clone().ok_or_else(|| {
                GatewayError::invalid_response("payment profile created but no id was returned")
            }),
            Classification::DuplicateRecord { .. } => {
                // The card is already stored under this customer; reuse the
                // id the gateway reports.
                response.customer_payment_profile_id.clone().ok_or_else(|| {
                    GatewayError::invalid_response(
                        "duplicate payment profile reported, but the existing id could not be recovered",
                    )
                })
            }
            Classification::RecordNotFound { .. } => {
                // The locally cached customer profile id points at a record
                // deleted remotely. Drop the stale reference so the next
                // attempt starts fresh.
                log_response(&response);
                if let Some(owner_id) = owner.id() {
                    profiles.clear(owner_id);
                }
                Err(GatewayError::invalid_response(
                    "the customer record could not be found",
                ))
            }
            Classification::HardDecline { text, .. }
            | Classification::Declined { text, .. } => {
                log_response(&response);
                Err(GatewayError::invalid_response(text))
            }
        }
    }

    /// Creates a brand-new customer profile carrying the payment profile.
    /// On a duplicate-customer report, recovers the existing id from the
    /// message text and retries payment-profile creation against it; failure
    /// of that retry is fatal.
    async fn create_customer_with_profile(
        &self,
        owner: &Owner,
        details: &PaymentMethodDetails,
        payload: PaymentProfilePayload,
    ) -> GatewayResult<(String, String)> {
        let (merchant_customer_id, email) = match owner {
            Owner::Authenticated { id, email } => (id.clone(), Some(email.clone())),
            Owner::Anonymous => (guest_merchant_id(), details.customer_email.clone()),
        };
        let request = CreateCustomerProfileRequest {
            merchant_customer_id,
            email,
            payment_profile: payload.clone(),
        };
        let response = self.client().create_customer_profile(request).await?;
        match classify(&response) {
            Classification::Approved => {
                let customer_profile_id =
                    response.customer_profile_id.clone().ok_or_else(|| {
                        GatewayError::invalid_response(
                            "customer profile created but no id was returned",
                        )
                    })?;
                let payment_profile_id =
                    response.customer_payment_profile_id.clone().ok_or_else(|| {
                        GatewayError::invalid_response(
                            "customer profile created but no payment profile id was returned",
                        )
                    })?;
                Ok((customer_profile_id, payment_profile_id))
            }
            Classification::DuplicateRecord { text } => {
                let customer_profile_id =
                    extract_duplicate_profile_id(&text).ok_or_else(|| {
                        GatewayError::invalid_response(
                            "duplicate customer profile reported, but the existing id could not be parsed",
                        )
                    })?;
                let retry = CreateCustomerPaymentProfileRequest {
                    customer_profile_id: customer_profile_id.clone(),
                    payment_profile: payload,
                };
                let response = self.client().create_customer_payment_profile(retry).await?;
                match classify(&response) {
                    Classification::Approved => {
                        let payment_profile_id =
                            response.customer_payment_profile_id.clone().ok_or_else(|| {
                                GatewayError::invalid_response(
                                    "payment profile created but no id was returned",
                                )
                            })?;
                        Ok((customer_profile_id, payment_profile_id))
                    }
                    _ => {
                        log_response(&response);
                        Err(GatewayError::invalid_response(
                            "unable to create payment profile for existing customer",
                        ))
                    }
                }
            }
            _ => {
                log_response(&response);
                Err(GatewayError::invalid_response(
                    "unable to create customer profile",
                ))
            }
        }
    }
}
