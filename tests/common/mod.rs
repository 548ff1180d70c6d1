//! Scripted gateway client shared by the integration tests: responses are
//! queued up front, every request is recorded for inspection.

use async_trait::async_trait;
use authnet_gateway::client::{AuthNetClient, GatewayResponse};
use authnet_gateway::error::GatewayResult;
use authnet_gateway::request::{
    CreateCustomerPaymentProfileRequest, CreateCustomerProfileRequest,
    DeleteCustomerPaymentProfileRequest, TransactionRequest,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum SentRequest {
    Transaction(TransactionRequest),
    CustomerProfile(CreateCustomerProfileRequest),
    PaymentProfile(CreateCustomerPaymentProfileRequest),
    Delete(DeleteCustomerPaymentProfileRequest),
    Authenticate,
}

#[derive(Clone, Default)]
pub struct ScriptedClient {
    responses: Arc<Mutex<VecDeque<GatewayResult<GatewayResponse>>>>,
    sent: Arc<Mutex<Vec<SentRequest>>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(self, response: GatewayResponse) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(Ok(response));
        self
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.sent()
            .into_iter()
            .filter_map(|r| match r {
                SentRequest::Transaction(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    pub fn sent_payment_profiles(&self) -> Vec<CreateCustomerPaymentProfileRequest> {
        self.sent()
            .into_iter()
            .filter_map(|r| match r {
                SentRequest::PaymentProfile(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    pub fn sent_customer_profiles(&self) -> Vec<CreateCustomerProfileRequest> {
        self.sent()
            .into_iter()
            .filter_map(|r| match r {
                SentRequest::CustomerProfile(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    fn next_response(&self) -> GatewayResult<GatewayResponse> {
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .expect("a scripted response should be queued for every remote call")
    }

    fn record(&self, request: SentRequest) {
        self.sent.lock().expect("sent lock").push(request);
    }
}

#[async_trait]
impl AuthNetClient for ScriptedClient {
    async fn create_transaction(
        &self,
        request: TransactionRequest,
    ) -> GatewayResult<GatewayResponse> {
        self.record(SentRequest::Transaction(request));
        self.next_response()
    }

    async fn create_customer_profile(
        &self,
        request: CreateCustomerProfileRequest,
    ) -> GatewayResult<GatewayResponse> {
        self.record(SentRequest::CustomerProfile(request));
        self.next_response()
    }

    async fn create_customer_payment_profile(
        &self,
        request: CreateCustomerPaymentProfileRequest,
    ) -> GatewayResult<GatewayResponse> {
        self.record(SentRequest::PaymentProfile(request));
        self.next_response()
    }

    async fn delete_customer_payment_profile(
        &self,
        request: DeleteCustomerPaymentProfileRequest,
    ) -> GatewayResult<GatewayResponse> {
        self.record(SentRequest::Delete(request));
        self.next_response()
    }

    async fn authenticate_test(&self) -> GatewayResult<GatewayResponse> {
        self.record(SentRequest::Authenticate);
        self.next_response()
    }
}
