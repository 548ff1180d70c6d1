//! Remote customer-profile resolution.
//!
//! The owner's remote customer profile id lives with the host application;
//! this crate reaches it only through the [`ProfileStore`] capability.
//! Absence means "no profile yet".

use crate::error::{GatewayError, GatewayResult};
use crate::request::{BillingAddress, PaymentProfilePayload, PaymentSource, ProfileRef};
use crate::types::{Owner, PaymentMethod};
use std::collections::HashMap;
use uuid::Uuid;

/// Separator inside composite remote ids stored for anonymous owners.
pub const COMPOSITE_SEPARATOR: char = '|';

/// Host-side storage of owner → remote customer profile id.
pub trait ProfileStore: Send + Sync {
    fn get(&self, owner_id: &str) -> Option<String>;
    fn set(&mut self, owner_id: &str, profile_id: String);
    fn clear(&mut self, owner_id: &str);
}

/// In-memory store, for tests and single-process hosts.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: HashMap<String, String>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn get(&self, owner_id: &str) -> Option<String> {
        self.profiles.get(owner_id).cloned()
    }

    fn set(&mut self, owner_id: &str, profile_id: String) {
        self.profiles.insert(owner_id.to_string(), profile_id);
    }

    fn clear(&mut self, owner_id: &str) {
        self.profiles.remove(owner_id);
    }
}

pub fn composite_token(customer_profile_id: &str, payment_profile_id: &str) -> String {
    format!(
        "{}{}{}",
        customer_profile_id, COMPOSITE_SEPARATOR, payment_profile_id
    )
}

pub fn split_composite_token(token: &str) -> Option<(&str, &str)> {
    let (customer, payment) = token.split_once(COMPOSITE_SEPARATOR)?;
    if customer.is_empty() || payment.is_empty() {
        return None;
    }
    Some((customer, payment))
}

/// Resolves the remote profile pair a stored method charges against.
///
/// Authenticated owners hold only the payment-profile id on the method; the
/// customer profile id comes from the owner's stored reference. Anonymous
/// owners carry the composite pair on the method itself.
pub fn resolve_profile_pair(
    method: &PaymentMethod,
    profiles: &dyn ProfileStore,
) -> GatewayResult<ProfileRef> {
    match &method.owner {
        Owner::Authenticated { id, .. } => {
            let customer_profile_id = profiles.get(id).ok_or_else(|| {
                GatewayError::validation(
                    "owner has no remote customer profile",
                    Some("payment_method"),
                )
            })?;
            Ok(ProfileRef {
                customer_profile_id,
                payment_profile_id: method.remote_id.clone(),
            })
        }
        Owner::Anonymous => {
            let (customer, payment) =
                split_composite_token(&method.remote_id).ok_or_else(|| {
                    GatewayError::validation(
                        "anonymous payment method carries a malformed remote id",
                        Some("payment_method"),
                    )
                })?;
            Ok(ProfileRef {
                customer_profile_id: customer.to_string(),
                payment_profile_id: payment.to_string(),
            })
        }
    }
}

/// Builds the payment profile payload sent on profile-creation requests.
pub fn build_payment_profile(
    source: PaymentSource,
    bill_to: Option<BillingAddress>,
) -> PaymentProfilePayload {
    PaymentProfilePayload {
        customer_type: "individual".to_string(),
        bill_to,
        payment: source,
    }
}

/// Synthesizes a unique merchant-customer id for a guest checkout. The
/// remote field is capped at 20 characters.
pub fn guest_merchant_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("guest-{}", &suffix[..12])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CardBrand, Owner};

    fn method_for(owner: Owner, remote_id: &str) -> PaymentMethod {
        PaymentMethod {
            id: "pm_1".to_string(),
            owner,
            remote_id: remote_id.to_string(),
            brand: CardBrand::Visa,
            last4: "1111".to_string(),
            expiration_month: "01".to_string(),
            expiration_year: "2030".to_string(),
            reusable: true,
            expires_at: None,
        }
    }

    #[test]
    fn memory_store_roundtrips_and_clears() {
        let mut store = MemoryProfileStore::new();
        assert_eq!(store.get("u1"), None);
        store.set("u1", "100".to_string());
        assert_eq!(store.get("u1").as_deref(), Some("100"));
        store.clear("u1");
        assert_eq!(store.get("u1"), None);
    }

    #[test]
    fn composite_tokens_split_into_their_parts() {
        let token = composite_token("100", "200");
        assert_eq!(token, "100|200");
        assert_eq!(split_composite_token(&token), Some(("100", "200")));
        assert_eq!(split_composite_token("100"), None);
        assert_eq!(split_composite_token("|200"), None);
    }

    #[test]
    fn authenticated_pair_comes_from_the_store() {
        let mut store = MemoryProfileStore::new();
        store.set("u1", "100".to_string());
        let method = method_for(
            Owner::Authenticated {
                id: "u1".to_string(),
                email: "u1@example.com".to_string(),
            },
            "200",
        );
        let pair = resolve_profile_pair(&method, &store).expect("pair should resolve");
        assert_eq!(pair.customer_profile_id, "100");
        assert_eq!(pair.payment_profile_id, "200");
    }

    #[test]
    fn authenticated_owner_without_profile_fails_locally() {
        let store = MemoryProfileStore::new();
        let method = method_for(
            Owner::Authenticated {
                id: "u1".to_string(),
                email: "u1@example.com".to_string(),
            },
            "200",
        );
        assert!(matches!(
            resolve_profile_pair(&method, &store),
            Err(GatewayError::Validation { .. })
        ));
    }

    #[test]
    fn anonymous_pair_comes_from_the_composite_token() {
        let store = MemoryProfileStore::new();
        let method = method_for(Owner::Anonymous, "100|200");
        let pair = resolve_profile_pair(&method, &store).expect("pair should resolve");
        assert_eq!(pair.customer_profile_id, "100");
        assert_eq!(pair.payment_profile_id, "200");

        let malformed = method_for(Owner::Anonymous, "200");
        assert!(resolve_profile_pair(&malformed, &store).is_err());
    }

    #[test]
    fn guest_merchant_ids_are_short_and_unique() {
        let a = guest_merchant_id();
        let b = guest_merchant_id();
        assert!(a.starts_with("guest-"));
        assert!(a.len() <= 20);
        assert_ne!(a, b);
    }
}
