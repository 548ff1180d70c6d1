//! Gateway message-code interpretation.
//!
//! Classification is driven by the machine-readable message code, never by
//! matching on message text. The one exception is
//! [`extract_duplicate_profile_id`], which recovers the pre-existing
//! customer profile id embedded in the duplicate-record message text; the
//! wording is not a stable contract, so a failed parse surfaces as an
//! invalid-response error at the call site instead of a panic.

use crate::client::GatewayResponse;

/// Known gateway message codes, with an explicit default arm for everything
/// unrecognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCode {
    /// `E00039`: a duplicate record already exists remotely.
    DuplicateRecord,
    /// `E00040`: the referenced remote record cannot be found.
    RecordNotFound,
    Other(String),
}

impl GatewayCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "E00039" => GatewayCode::DuplicateRecord,
            "E00040" => GatewayCode::RecordNotFound,
            other => GatewayCode::Other(other.to_string()),
        }
    }
}

/// Outcome of interpreting a raw gateway response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Approved,
    /// The gateway reported a transaction-level hard error: non-retryable,
    /// customer-facing decline.
    HardDecline { code: String, text: String },
    /// A matching remote record already exists. Idempotent recovery path:
    /// the caller should try to extract the pre-existing id.
    DuplicateRecord { text: String },
    /// The referenced remote state is absent. Benign during deletes; during
    /// a transaction it means the stored credential is gone; during profile
    /// creation it means a cached reference is stale.
    RecordNotFound { text: String },
    /// Any other non-Ok result, surfaced as-is.
    Declined { code: String, text: String },
}

/// Interprets a raw gateway response.
///
/// A non-`Ok` result code is classified from the first message. An `Ok`
/// result that still carries transaction errors is a hard decline.
pub fn classify(response: &GatewayResponse) -> Classification {
    if !response.is_ok() {
        let Some(message) = response.first_message() else {
            return Classification::Declined {
                code: String::new(),
                text: "gateway returned an error result with no messages".to_string(),
            };
        };
        return match GatewayCode::parse(&message.code) {
            GatewayCode::DuplicateRecord => Classification::DuplicateRecord {
                text: message.text.clone(),
            },
            GatewayCode::RecordNotFound => Classification::RecordNotFound {
                text: message.text.clone(),
            },
            GatewayCode::Other(code) => Classification::Declined {
                code,
                text: message.text.clone(),
            },
        };
    }

    if let Some(error) = response.first_error() {
        return Classification::HardDecline {
            code: error.code.clone(),
            text: error.text.clone(),
        };
    }

    Classification::Approved
}

/// Pulls the pre-existing customer profile id out of a duplicate-record
/// message such as `"A duplicate record exists with an ID of 12345."`.
///
/// Takes the first whitespace-delimited token that is all digits once
/// trailing punctuation is trimmed. Returns `None` when no such token
/// exists.
pub fn extract_duplicate_profile_id(text: &str) -> Option<String> {
    text.split_whitespace().find_map(|token| {
        let digits = token.trim_end_matches(['.', ',']);
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            Some(digits.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_response_without_errors_is_approved() {
        assert_eq!(classify(&GatewayResponse::ok()), Classification::Approved);
    }

    #[test]
    fn ok_response_with_transaction_errors_is_a_hard_decline() {
        let response = GatewayResponse::ok().with_transaction_error("2", "This transaction has been declined.");
        assert_eq!(
            classify(&response),
            Classification::HardDecline {
                code: "2".to_string(),
                text: "This transaction has been declined.".to_string(),
            }
        );
    }

    #[test]
    fn known_error_codes_map_to_their_classification() {
        let not_found = GatewayResponse::error("E00040", "The record cannot be found.");
        assert!(matches!(
            classify(&not_found),
            Classification::RecordNotFound { .. }
        ));

        let duplicate = GatewayResponse::error("E00039", "A duplicate record already exists.");
        assert!(matches!(
            classify(&duplicate),
            Classification::DuplicateRecord { .. }
        ));
    }

    #[test]
    fn unknown_error_codes_fall_through_to_declined() {
        let response = GatewayResponse::error("E00001", "An error occurred during processing.");
        assert_eq!(
            classify(&response),
            Classification::Declined {
                code: "E00001".to_string(),
                text: "An error occurred during processing.".to_string(),
            }
        );
    }

    #[test]
    fn error_result_with_no_messages_is_declined() {
        let mut response = GatewayResponse::error("E00039", "whatever");
        response.messages.clear();
        assert!(matches!(
            classify(&response),
            Classification::Declined { .. }
        ));
    }

    #[test]
    fn duplicate_id_extraction_finds_the_numeric_token() {
        assert_eq!(
            extract_duplicate_profile_id("A duplicate record exists with an ID of 12345."),
            Some("12345".to_string())
        );
        assert_eq!(
            extract_duplicate_profile_id("A duplicate record with id 998, was found"),
            Some("998".to_string())
        );
    }

    #[test]
    fn duplicate_id_extraction_fails_without_a_numeric_token() {
        assert_eq!(
            extract_duplicate_profile_id("A duplicate record already exists."),
            None
        );
        assert_eq!(extract_duplicate_profile_id(""), None);
    }

    #[test]
    fn alphanumeric_tokens_are_not_mistaken_for_ids() {
        assert_eq!(
            extract_duplicate_profile_id("Error E00039 reported: duplicate record"),
            None
        );
    }
}
