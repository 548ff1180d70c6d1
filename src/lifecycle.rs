//! Payment lifecycle operations.
//!
//! Each operation validates its precondition locally, issues exactly one
//! remote call, classifies the response and applies the outcome to the
//! payment. Callers must not run two operations against the same payment
//! concurrently; there is no optimistic-concurrency check on remote ids.

use crate::client::{log_response, AuthNetClient};
use crate::codes::{classify, Classification};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::profile::{resolve_profile_pair, ProfileStore};
use crate::request::{CardAuthentication, TransactionRequest, TransactionType};
use crate::types::{Money, Payment, PaymentMethod, PaymentState};
use chrono::Utc;
use tracing::info;

pub struct AuthorizeNetGateway<C> {
    config: GatewayConfig,
    client: C,
}

impl<C: AuthNetClient> AuthorizeNetGateway<C> {
    pub fn new(config: GatewayConfig, client: C) -> GatewayResult<Self> {
        config.validate()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &C {
        &self.client
    }

    fn assert_payment_state(payment: &Payment, allowed: &[PaymentState]) -> GatewayResult<()> {
        if !allowed.contains(&payment.state) {
            return Err(GatewayError::validation(
                format!(
                    "operation not allowed from payment state {}",
                    payment.state
                ),
                Some("state"),
            ));
        }
        Ok(())
    }

    fn assert_payment_method(payment: &Payment, method: &PaymentMethod) -> GatewayResult<()> {
        if method.id != payment.method_id {
            return Err(GatewayError::validation(
                "payment method does not belong to this payment",
                Some("payment_method"),
            ));
        }
        if let Some(expires_at) = method.expires_at {
            if expires_at <= Utc::now() {
                return Err(GatewayError::HardDecline {
                    message: "The provided payment method has expired".to_string(),
                    code: None,
                });
            }
        }
        Ok(())
    }

    fn remote_id(payment: &Payment) -> GatewayResult<String> {
        payment.remote_id.clone().ok_or_else(|| {
            GatewayError::validation(
                "payment has no remote transaction id",
                Some("remote_id"),
            )
        })
    }

    /// Places a hold on the payment amount, optionally capturing it in the
    /// same transaction. Valid only from `new`.
    ///
    /// A gateway report that the stored credential no longer exists surfaces
    /// as [`GatewayError::InvalidPaymentMethod`]; the caller is expected to
    /// delete the method before showing the failure.
    pub async fn authorize(
        &self,
        payment: &mut Payment,
        method: &PaymentMethod,
        profiles: &dyn ProfileStore,
        capture: bool,
    ) -> GatewayResult<()> {
        Self::assert_payment_state(payment, &[PaymentState::New])?;
        Self::assert_payment_method(payment, method)?;
        payment.amount.validate_positive("amount")?;
        let profile = resolve_profile_pair(method, profiles)?;

        let transaction_type = if capture {
            TransactionType::AuthCapture
        } else {
            TransactionType::AuthOnly
        };
        let mut builder = TransactionRequest::builder(transaction_type, payment.amount.clone())
            .profile(profile)
            .invoice_number(payment.order.invoice_number.clone());
        if let Some(ip) = &payment.order.customer_ip {
            builder = builder.customer_ip(ip.clone());
        }

        let response = self.client.create_transaction(builder.build()).await?;
        match classify(&response) {
            Classification::Approved => {
                let trans_id = response.trans_id.clone().ok_or_else(|| {
                    GatewayError::invalid_response("approved transaction carried no transaction id")
                })?;
                payment.state = if capture {
                    PaymentState::Completed
                } else {
                    PaymentState::Authorization
                };
                payment.remote_id = Some(trans_id);
                info!(
                    payment = %payment.id,
                    state = %payment.state,
                    "payment authorized"
                );
                Ok(())
            }
            Classification::RecordNotFound { .. } => {
                log_response(&response);
                Err(GatewayError::InvalidPaymentMethod {
                    method_id: method.id.clone(),
                })
            }
            Classification::HardDecline { code, text } => {
                log_response(&response);
                Err(GatewayError::HardDecline {
                    message: text,
                    code: Some(code),
                })
            }
            Classification::DuplicateRecord { text } => {
                log_response(&response);
                Err(GatewayError::Gateway {
                    message: text,
                    code: None,
                })
            }
            Classification::Declined { code, text } => {
                log_response(&response);
                Err(GatewayError::Gateway {
                    message: text,
                    code: Some(code),
                })
            }
        }
    }

    /// [`Self::authorize`] with the capture flag resolved from the configured
    /// default transaction type, as checkout does when the caller does not
    /// choose explicitly.
    pub async fn authorize_default(
        &self,
        payment: &mut Payment,
        method: &PaymentMethod,
        profiles: &dyn ProfileStore,
    ) -> GatewayResult<()> {
        let capture = self.config.captures_by_default();
        self.authorize(payment, method, profiles, capture).await
    }

    /// Converts an authorization hold into a charge. Valid only from
    /// `authorization`; defaults to the full authorized amount and supports
    /// partial capture, updating the payment amount to what was captured.
    pub async fn capture(
        &self,
        payment: &mut Payment,
        amount: Option<Money>,
    ) -> GatewayResult<()> {
        Self::assert_payment_state(payment, &[PaymentState::Authorization])?;
        let amount = amount.unwrap_or_else(|| payment.amount.clone());
        amount.validate_positive("amount")?;
        payment.amount.assert_same_currency(&amount, "amount")?;
        if amount.amount > payment.amount.amount {
            return Err(GatewayError::validation(
                "capture amount exceeds the authorized amount",
                Some("amount"),
            ));
        }
        let ref_trans_id = Self::remote_id(payment)?;

        let request =
            TransactionRequest::builder(TransactionType::PriorAuthCapture, amount.clone())
                .ref_trans_id(ref_trans_id)
                .build();
        let response = self.client.create_transaction(request).await?;
        self.apply_transaction_outcome(&response, || {
            payment.state = PaymentState::Completed;
            payment.amount = amount;
        })?;
        info!(payment = %payment.id, "authorization captured");
        Ok(())
    }

    /// Cancels an authorization before capture. Valid only from
    /// `authorization`.
    pub async fn void_payment(&self, payment: &mut Payment) -> GatewayResult<()> {
        Self::assert_payment_state(payment, &[PaymentState::Authorization])?;
        let ref_trans_id = Self::remote_id(payment)?;

        let request =
            TransactionRequest::builder(TransactionType::Void, payment.amount.clone())
                .ref_trans_id(ref_trans_id)
                .build();
        let response = self.client.create_transaction(request).await?;
        self.apply_transaction_outcome(&response, || {
            payment.state = PaymentState::AuthorizationVoided;
        })?;
        info!(payment = %payment.id, "authorization voided");
        Ok(())
    }

    /// Returns funds from a completed charge. Valid from `completed` and
    /// `partially_refunded`; defaults to the remaining unrefunded balance.
    /// The gateway requires the masked card number and expiration on refund
    /// requests for re-authentication.
    pub async fn refund(
        &self,
        payment: &mut Payment,
        method: &PaymentMethod,
        amount: Option<Money>,
    ) -> GatewayResult<()> {
        Self::assert_payment_state(
            payment,
            &[PaymentState::Completed, PaymentState::PartiallyRefunded],
        )?;
        let amount = amount.unwrap_or_else(|| {
            Money::new(payment.remaining_refundable(), payment.amount.currency.clone())
        });
        amount.validate_positive("amount")?;
        payment.amount.assert_same_currency(&amount, "amount")?;
        if amount.amount > payment.remaining_refundable() {
            return Err(GatewayError::validation(
                "refund amount exceeds the remaining refundable balance",
                Some("amount"),
            ));
        }
        let ref_trans_id = Self::remote_id(payment)?;

        let request = TransactionRequest::builder(TransactionType::Refund, amount.clone())
            .ref_trans_id(ref_trans_id)
            .payment(CardAuthentication::for_refund(
                &method.last4,
                &method.expiration_month,
                &method.expiration_year,
            ))
            .build();
        let response = self.client.create_transaction(request).await?;

        let new_refunded = payment.refunded_amount.amount + amount.amount;
        self.apply_transaction_outcome(&response, || {
            payment.refunded_amount.amount = new_refunded;
            payment.state = if new_refunded < payment.amount.amount {
                PaymentState::PartiallyRefunded
            } else {
                PaymentState::Refunded
            };
        })?;
        info!(
            payment = %payment.id,
            refunded = %payment.refunded_amount,
            state = %payment.state,
            "payment refunded"
        );
        Ok(())
    }

    /// Issues an authenticate-only request to check the configured merchant
    /// credentials, as used by admin configuration validation.
    pub async fn verify_credentials(&self) -> GatewayResult<()> {
        let response = self.client.authenticate_test().await?;
        if let Classification::Approved = classify(&response) {
            return Ok(());
        }
        log_response(&response);
        Err(GatewayError::Gateway {
            message: response.describe(),
            code: response.first_message().map(|m| m.code.clone()),
        })
    }

    /// Applies `on_approved` when the response is approved; otherwise maps
    /// the classification to an error without touching local state.
    fn apply_transaction_outcome(
        &self,
        response: &crate::client::GatewayResponse,
        on_approved: impl FnOnce(),
    ) -> GatewayResult<()> {
        match classify(response) {
            Classification::Approved => {
                on_approved();
                Ok(())
            }
            Classification::HardDecline { code, text } => {
                log_response(response);
                Err(GatewayError::HardDecline {
                    message: text,
                    code: Some(code),
                })
            }
            Classification::RecordNotFound { text }
            | Classification::DuplicateRecord { text } => {
                log_response(response);
                Err(GatewayError::Gateway {
                    message: text,
                    code: None,
                })
            }
            Classification::Declined { code, text } => {
                log_response(response);
                Err(GatewayError::Gateway {
                    message: text,
                    code: Some(code),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GatewayResponse;
    use crate::profile::MemoryProfileStore;
    use crate::request::{
        CreateCustomerPaymentProfileRequest, CreateCustomerProfileRequest,
        DeleteCustomerPaymentProfileRequest,
    };
    use crate::types::{CardBrand, OrderRef, Owner};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    /// Fails the test if any remote call is made.
    struct UnreachableClient;

    #[async_trait]
    impl AuthNetClient for UnreachableClient {
        async fn create_transaction(
            &self,
            _request: TransactionRequest,
        ) -> GatewayResult<GatewayResponse> {
            panic!("gateway must not be contacted");
        }

        async fn create_customer_profile(
            &self,
            _request: CreateCustomerProfileRequest,
        ) -> GatewayResult<GatewayResponse> {
            panic!("gateway must not be contacted");
        }

        async fn create_customer_payment_profile(
            &self,
            _request: CreateCustomerPaymentProfileRequest,
        ) -> GatewayResult<GatewayResponse> {
            panic!("gateway must not be contacted");
        }

        async fn delete_customer_payment_profile(
            &self,
            _request: DeleteCustomerPaymentProfileRequest,
        ) -> GatewayResult<GatewayResponse> {
            panic!("gateway must not be contacted");
        }

        async fn authenticate_test(&self) -> GatewayResult<GatewayResponse> {
            panic!("gateway must not be contacted");
        }
    }

    fn gateway() -> AuthorizeNetGateway<UnreachableClient> {
        AuthorizeNetGateway::new(GatewayConfig::new("login", "key"), UnreachableClient)
            .expect("config should validate")
    }

    fn payment_in(state: PaymentState) -> Payment {
        let mut payment = Payment::new(
            "pay_1",
            Money::new(dec!(50.00), "USD"),
            OrderRef {
                invoice_number: "1001".to_string(),
                customer_ip: None,
            },
            "pm_1",
        );
        payment.state = state;
        payment.remote_id = Some("tx123".to_string());
        payment
    }

    fn visa_method() -> PaymentMethod {
        PaymentMethod {
            id: "pm_1".to_string(),
            owner: Owner::Anonymous,
            remote_id: "100|200".to_string(),
            brand: CardBrand::Visa,
            last4: "1111".to_string(),
            expiration_month: "01".to_string(),
            expiration_year: "2030".to_string(),
            reusable: false,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn authorize_rejects_non_new_payments_without_remote_call() {
        let gateway = gateway();
        let store = MemoryProfileStore::new();
        let mut payment = payment_in(PaymentState::Completed);
        let err = gateway
            .authorize(&mut payment, &visa_method(), &store, false)
            .await
            .expect_err("authorize from completed must fail");
        assert!(matches!(err, GatewayError::Validation { .. }));
        assert_eq!(payment.state, PaymentState::Completed);
    }

    #[tokio::test]
    async fn capture_rejects_amount_above_authorization_without_remote_call() {
        let gateway = gateway();
        let mut payment = payment_in(PaymentState::Authorization);
        let err = gateway
            .capture(&mut payment, Some(Money::new(dec!(60.00), "USD")))
            .await
            .expect_err("over-capture must fail");
        assert!(matches!(err, GatewayError::Validation { .. }));
        assert_eq!(payment.state, PaymentState::Authorization);
        assert_eq!(payment.amount.amount, dec!(50.00));
    }

    #[tokio::test]
    async fn refund_rejects_amount_above_remaining_balance_without_remote_call() {
        let gateway = gateway();
        let mut payment = payment_in(PaymentState::PartiallyRefunded);
        payment.refunded_amount.amount = dec!(40.00);
        let err = gateway
            .refund(
                &mut payment,
                &visa_method(),
                Some(Money::new(dec!(10.01), "USD")),
            )
            .await
            .expect_err("over-refund must fail");
        assert!(matches!(err, GatewayError::Validation { .. }));
        assert_eq!(payment.refunded_amount.amount, dec!(40.00));
    }

    #[tokio::test]
    async fn refund_rejects_currency_mismatch() {
        let gateway = gateway();
        let mut payment = payment_in(PaymentState::Completed);
        let err = gateway
            .refund(
                &mut payment,
                &visa_method(),
                Some(Money::new(dec!(10.00), "EUR")),
            )
            .await
            .expect_err("currency mismatch must fail");
        assert!(matches!(err, GatewayError::Validation { .. }));
    }

    #[tokio::test]
    async fn void_rejects_payments_that_are_not_authorizations() {
        let gateway = gateway();
        let mut payment = payment_in(PaymentState::New);
        assert!(gateway.void_payment(&mut payment).await.is_err());
        assert_eq!(payment.state, PaymentState::New);
    }

    #[tokio::test]
    async fn expired_payment_method_is_declined_locally() {
        let gateway = gateway();
        let store = MemoryProfileStore::new();
        let mut payment = payment_in(PaymentState::New);
        payment.remote_id = None;
        let mut method = visa_method();
        method.expires_at = Some(Utc::now() - chrono::Duration::seconds(1));
        let err = gateway
            .authorize(&mut payment, &method, &store, true)
            .await
            .expect_err("expired method must decline");
        assert!(matches!(err, GatewayError::HardDecline { .. }));
    }
}
