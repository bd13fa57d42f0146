//! Invitation ledger rules.
//!
//! Redemption checks run in a fixed order: existing membership, code
//! validity, circle capacity. The persistence layer evaluates them inside the
//! redeeming transaction with the invitation row locked.

use crate::error::{DomainError, DomainResult};
use crate::models::{Circle, Invitation, Membership};

pub const ALREADY_MEMBER: &str = "User is already a member of this circle.";
pub const INVALID_CODE: &str = "Invalid invitation code.";
pub const CIRCLE_FULL: &str = "Circle has reached its member limit.";

/// Validates a redemption attempt and returns the invitation to consume.
///
/// `invitation` must be the unused invitation with the requested code in
/// this circle, if one exists.
pub fn check_redemption<'a>(
    existing_membership: Option<&Membership>,
    invitation: Option<&'a Invitation>,
    circle: &Circle,
    active_members: i64,
) -> DomainResult<&'a Invitation> {
    if existing_membership.is_some() {
        return Err(DomainError::validation(ALREADY_MEMBER));
    }

    let invitation = match invitation {
        Some(inv) if !inv.used && inv.circle_id == circle.id => inv,
        _ => return Err(DomainError::validation(INVALID_CODE)),
    };

    if circle.is_limited {
        if let Some(limit) = circle.members_limit {
            if active_members >= i64::from(limit) {
                return Err(DomainError::validation(CIRCLE_FULL));
            }
        }
    }

    Ok(invitation)
}

/// Issuer balance after one redemption. Never drops below zero.
pub fn remaining_after_redemption(remaining: i32) -> i32 {
    (remaining - 1).max(0)
}

/// How many new codes to issue so the member holds one per remaining invitation.
pub fn codes_to_issue(remaining_invitations: i32, unused_codes: usize) -> usize {
    let target = usize::try_from(remaining_invitations.max(0)).unwrap_or(0);
    target.saturating_sub(unused_codes)
}
