//! Invitation domain models and code generation.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Length of every invitation code.
pub const INVITATION_CODE_LENGTH: usize = 10;

/// Alphabet invitation codes are drawn from.
pub const INVITATION_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A single-use code granting membership in one circle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Invitation {
    pub id: Uuid,
    pub code: String,
    pub circle_id: Uuid,
    pub issued_by: Uuid,
    pub used_by: Option<Uuid>,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Request to join a circle with an invitation code.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RedeemInvitationRequest {
    #[validate(length(equal = 10, message = "Invalid invitation code."))]
    #[validate(regex(path = *INVITATION_CODE_REGEX, message = "Invalid invitation code."))]
    pub invitation_code: String,
}

lazy_static::lazy_static! {
    static ref INVITATION_CODE_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Z0-9]{10}$").unwrap();
}

/// A member's invitation allowance and their unused codes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitationsResponse {
    pub used_invitations: i32,
    pub remaining_invitations: i32,
    pub invitations: Vec<String>,
}

/// Generate a random code from `alphabet`. An empty alphabet yields an
/// empty string.
///
/// Uniqueness is the caller's job.
fn generate_code(alphabet: &[u8], length: usize) -> String {
    if alphabet.is_empty() {
        return String::new();
    }
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

/// Generate a random invitation code with the standard alphabet and length.
pub fn generate_invitation_code() -> String {
    generate_code(INVITATION_CODE_ALPHABET, INVITATION_CODE_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_invitation_code_format() {
        let code = generate_invitation_code();
        assert_eq!(code.len(), INVITATION_CODE_LENGTH);
        for c in code.chars() {
            assert!(
                c.is_ascii_uppercase() || c.is_ascii_digit(),
                "Invalid char: {}",
                c
            );
        }
    }

    #[test]
    fn test_generate_code_custom_alphabet() {
        let code = generate_code(b"AB", 6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c == 'A' || c == 'B'));
    }

    #[test]
    fn test_generate_code_empty_alphabet() {
        assert_eq!(generate_code(b"", 10), "");
    }

    #[test]
    fn test_generated_codes_vary() {
        let codes: std::collections::HashSet<String> =
            (0..50).map(|_| generate_invitation_code()).collect();
        assert!(codes.len() > 45);
    }

    #[test]
    fn test_redeem_request_validation() {
        let valid = RedeemInvitationRequest {
            invitation_code: "ABCD1234EF".to_string(),
        };
        assert!(valid.validate().is_ok());

        let lowercase = RedeemInvitationRequest {
            invitation_code: "abcd1234ef".to_string(),
        };
        assert!(lowercase.validate().is_err());

        let short = RedeemInvitationRequest {
            invitation_code: "ABCD".to_string(),
        };
        assert!(short.validate().is_err());
    }
}
