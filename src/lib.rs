//! Authorize.Net CIM gateway adapter.
//!
//! Maps a merchant's internal payment lifecycle (authorize, capture, void,
//! refund, tokenize a card into a reusable payment method) onto the remote
//! transaction API: request construction, response classification and the
//! state machines governing when money may move.
//!
//! Transport, persistence and the tokenization frontend are collaborators
//! behind traits: implement [`client::AuthNetClient`] for the wire and
//! [`profile::ProfileStore`] for the owner's remote-profile reference.

pub mod client;
pub mod codes;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod profile;
pub mod request;
pub mod tokenization;
pub mod types;

pub use client::{AuthNetClient, GatewayResponse, ResponseMessage, ResultCode};
pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use lifecycle::AuthorizeNetGateway;
pub use profile::{MemoryProfileStore, ProfileStore};
pub use tokenization::{PaymentCredential, PaymentMethodDetails, TokenizedMethod};
pub use types::{Money, Owner, Payment, PaymentMethod, PaymentState};
