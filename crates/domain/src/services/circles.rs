//! Circle registry rules.

use crate::error::{DomainError, DomainResult};
use crate::models::circle::{
    Circle, CreateCircleRequest, UpdateCircleRequest, MAX_MEMBERS_LIMIT, MIN_MEMBERS_LIMIT,
};

/// A limited circle must declare a capacity; an unlimited one must not.
pub fn validate_member_limits(is_limited: bool, members_limit: Option<i32>) -> DomainResult<()> {
    match (is_limited, members_limit) {
        (true, None) => Err(DomainError::validation(
            "If circle is limited, a member limit must be provided.",
        )),
        (false, Some(_)) => Err(DomainError::validation(
            "If circle is not limited, a member limit must not be provided.",
        )),
        (true, Some(limit)) if !(MIN_MEMBERS_LIMIT..=MAX_MEMBERS_LIMIT).contains(&limit) => {
            Err(DomainError::validation(format!(
                "Members limit must be between {} and {}.",
                MIN_MEMBERS_LIMIT, MAX_MEMBERS_LIMIT
            )))
        }
        _ => Ok(()),
    }
}

pub fn validate_create(req: &CreateCircleRequest) -> DomainResult<()> {
    validate_member_limits(req.is_limited, req.members_limit)
}

/// Limits after applying `req` on top of `circle`.
///
/// Turning `is_limited` off clears the stored limit unless a new one is sent.
pub fn merged_limits(circle: &Circle, req: &UpdateCircleRequest) -> (bool, Option<i32>) {
    let is_limited = req.is_limited.unwrap_or(circle.is_limited);
    let members_limit = match (req.is_limited, req.members_limit) {
        (_, Some(limit)) => Some(limit),
        (Some(false), None) => None,
        _ => circle.members_limit,
    };
    (is_limited, members_limit)
}

/// Re-checks the capacity invariant against the merged state.
pub fn validate_update(circle: &Circle, req: &UpdateCircleRequest) -> DomainResult<(bool, Option<i32>)> {
    let (is_limited, members_limit) = merged_limits(circle, req);
    validate_member_limits(is_limited, members_limit)?;
    Ok((is_limited, members_limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn circle(is_limited: bool, members_limit: Option<i32>) -> Circle {
        Circle {
            id: Uuid::new_v4(),
            name: "Gaviotas".to_string(),
            slug: "gaviotas".to_string(),
            about: None,
            picture: None,
            rides_offered: 0,
            rides_taken: 0,
            is_verified: false,
            is_public: true,
            is_limited,
            members_limit,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_limited_requires_limit() {
        assert!(validate_member_limits(true, Some(20)).is_ok());
        assert!(validate_member_limits(false, None).is_ok());
        assert!(matches!(
            validate_member_limits(true, None),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            validate_member_limits(false, Some(20)),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_limit_must_be_positive() {
        assert!(validate_member_limits(true, Some(0)).is_err());
        assert!(validate_member_limits(true, Some(-3)).is_err());
        assert!(validate_member_limits(true, Some(MAX_MEMBERS_LIMIT + 1)).is_err());
        assert!(validate_member_limits(true, Some(MIN_MEMBERS_LIMIT)).is_ok());
    }

    #[test]
    fn test_update_turning_limit_off_clears_it() {
        let c = circle(true, Some(40));
        let req = UpdateCircleRequest {
            is_limited: Some(false),
            ..Default::default()
        };
        assert_eq!(validate_update(&c, &req).unwrap(), (false, None));
    }

    #[test]
    fn test_update_enabling_limit_needs_value() {
        let c = circle(false, None);
        let req = UpdateCircleRequest {
            is_limited: Some(true),
            ..Default::default()
        };
        assert!(validate_update(&c, &req).is_err());

        let req = UpdateCircleRequest {
            is_limited: Some(true),
            members_limit: Some(25),
            ..Default::default()
        };
        assert_eq!(validate_update(&c, &req).unwrap(), (true, Some(25)));
    }

    #[test]
    fn test_update_limit_on_unlimited_circle_rejected() {
        let c = circle(false, None);
        let req = UpdateCircleRequest {
            members_limit: Some(25),
            ..Default::default()
        };
        assert!(validate_update(&c, &req).is_err());
    }

    #[test]
    fn test_update_without_limit_fields_keeps_state() {
        let c = circle(true, Some(40));
        let req = UpdateCircleRequest {
            name: Some("Gaviotas Norte".to_string()),
            ..Default::default()
        };
        assert_eq!(validate_update(&c, &req).unwrap(), (true, Some(40)));
    }
}
