//! Authorization predicates over circle membership and ride ownership.
//!
//! Each predicate works on facts the caller has already loaded; none of them
//! touch storage. The `require_*` helpers turn a denied predicate into a
//! [`DomainError::Permission`].

use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::{Membership, Ride};

/// True iff `membership` is an active admin membership of `user_id` in `circle_id`.
pub fn is_circle_admin(user_id: Uuid, circle_id: Uuid, membership: Option<&Membership>) -> bool {
    membership.is_some_and(|m| {
        m.user_id == user_id && m.circle_id == circle_id && m.is_active && m.is_admin
    })
}

/// True iff `membership` is an active membership of `user_id` in `circle_id`.
pub fn is_active_circle_member(
    user_id: Uuid,
    circle_id: Uuid,
    membership: Option<&Membership>,
) -> bool {
    membership.is_some_and(|m| m.user_id == user_id && m.circle_id == circle_id && m.is_active)
}

/// True iff the membership belongs to `user_id`.
pub fn is_self(user_id: Uuid, membership: &Membership) -> bool {
    membership.user_id == user_id
}

/// True iff `user_id` offered the ride.
pub fn is_ride_owner(user_id: Uuid, ride: &Ride) -> bool {
    ride.offered_by == Some(user_id)
}

pub fn is_not_ride_owner(user_id: Uuid, ride: &Ride) -> bool {
    !is_ride_owner(user_id, ride)
}

/// Circle update: active admin only.
pub fn require_circle_admin(
    user_id: Uuid,
    circle_id: Uuid,
    membership: Option<&Membership>,
) -> DomainResult<()> {
    if is_circle_admin(user_id, circle_id, membership) {
        Ok(())
    } else {
        Err(DomainError::permission(
            "Only circle admins can perform this action.",
        ))
    }
}

/// Any ride or member action: active member only.
pub fn require_active_member<'a>(
    user_id: Uuid,
    circle_id: Uuid,
    membership: Option<&'a Membership>,
) -> DomainResult<&'a Membership> {
    match membership {
        Some(m) if is_active_circle_member(user_id, circle_id, Some(m)) => Ok(m),
        _ => Err(DomainError::permission(
            "User is not an active member of the circle.",
        )),
    }
}

/// Membership removal and invitation listing: the member themself only.
pub fn require_self(user_id: Uuid, membership: &Membership) -> DomainResult<()> {
    if is_self(user_id, membership) {
        Ok(())
    } else {
        Err(DomainError::permission(
            "You can only perform this action on your own membership.",
        ))
    }
}

/// Ride update and finish: the offering user only.
pub fn require_ride_owner(user_id: Uuid, ride: &Ride) -> DomainResult<()> {
    if is_ride_owner(user_id, ride) {
        Ok(())
    } else {
        Err(DomainError::permission(
            "Only the user who offered the ride can perform this action.",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn membership(user_id: Uuid, circle_id: Uuid, is_admin: bool, is_active: bool) -> Membership {
        Membership {
            id: Uuid::new_v4(),
            user_id,
            circle_id,
            is_admin,
            is_active,
            used_invitations: 0,
            remaining_invitations: 0,
            invited_by: None,
            rides_taken: 0,
            rides_offered: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ride(offered_by: Option<Uuid>) -> Ride {
        let now = Utc::now();
        Ride {
            id: Uuid::new_v4(),
            offered_by,
            offered_in: None,
            available_seats: 1,
            comments: None,
            departure_location: "A".to_string(),
            departure_date: now,
            arrival_location: "B".to_string(),
            arrival_date: now,
            rating: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_is_circle_admin() {
        let user = Uuid::new_v4();
        let circle = Uuid::new_v4();

        assert!(is_circle_admin(user, circle, Some(&membership(user, circle, true, true))));
        assert!(!is_circle_admin(user, circle, Some(&membership(user, circle, true, false))));
        assert!(!is_circle_admin(user, circle, Some(&membership(user, circle, false, true))));
        assert!(!is_circle_admin(user, circle, None));
        // Membership in another circle does not count.
        let other = membership(user, Uuid::new_v4(), true, true);
        assert!(!is_circle_admin(user, circle, Some(&other)));
    }

    #[test]
    fn test_is_active_circle_member() {
        let user = Uuid::new_v4();
        let circle = Uuid::new_v4();

        assert!(is_active_circle_member(user, circle, Some(&membership(user, circle, false, true))));
        assert!(!is_active_circle_member(
            user,
            circle,
            Some(&membership(user, circle, false, false))
        ));
        assert!(!is_active_circle_member(
            Uuid::new_v4(),
            circle,
            Some(&membership(user, circle, false, true))
        ));
    }

    #[test]
    fn test_is_self() {
        let user = Uuid::new_v4();
        let m = membership(user, Uuid::new_v4(), false, true);
        assert!(is_self(user, &m));
        assert!(!is_self(Uuid::new_v4(), &m));
    }

    #[test]
    fn test_ride_ownership() {
        let owner = Uuid::new_v4();
        let r = ride(Some(owner));
        assert!(is_ride_owner(owner, &r));
        assert!(is_not_ride_owner(Uuid::new_v4(), &r));

        let orphan = ride(None);
        assert!(!is_ride_owner(owner, &orphan));
    }

    #[test]
    fn test_require_helpers_return_permission_errors() {
        let user = Uuid::new_v4();
        let circle = Uuid::new_v4();

        assert!(matches!(
            require_circle_admin(user, circle, None),
            Err(DomainError::Permission(_))
        ));
        assert!(matches!(
            require_active_member(user, circle, None),
            Err(DomainError::Permission(_))
        ));
        let m = membership(Uuid::new_v4(), circle, false, true);
        assert!(matches!(require_self(user, &m), Err(DomainError::Permission(_))));
        assert!(matches!(
            require_ride_owner(user, &ride(None)),
            Err(DomainError::Permission(_))
        ));
    }
}
