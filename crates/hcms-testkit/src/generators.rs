//! Proptest generators for property-based testing.

use proptest::prelude::*;

use hcms_auth::Action;
use hcms_core::{ComplaintCategory, ComplaintStatus, NewComplaint, Role, UserId};

/// Generate a ComplaintStatus.
pub fn status() -> impl Strategy<Value = ComplaintStatus> {
    prop::sample::select(ComplaintStatus::ALL.to_vec())
}

/// Generate a Role.
pub fn role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

/// Generate an Action.
pub fn action() -> impl Strategy<Value = Action> {
    prop::sample::select(Action::ALL.to_vec())
}

pub fn category() -> impl Strategy<Value = ComplaintCategory> {
    prop_oneof![
        Just(ComplaintCategory::Complaint),
        Just(ComplaintCategory::Request),
        Just(ComplaintCategory::Suggestion),
    ]
}

/// Generate a random UserId.
pub fn user_id() -> impl Strategy<Value = UserId> {
    any::<[u8; 16]>().prop_map(UserId::from_bytes)
}

/// Non-blank free text of at most `max_len` characters.
pub fn text(max_len: usize) -> impl Strategy<Value = String> {
    let max_len = max_len.max(1);
    prop::collection::vec(prop::char::range('a', 'z'), 1..=max_len)
        .prop_map(|chars| chars.into_iter().collect())
}

/// Generate a valid NewComplaint.
pub fn new_complaint() -> impl Strategy<Value = NewComplaint> {
    (
        1u64..=10_000,
        category(),
        proptest::option::of(text(40)),
        text(200),
    )
        .prop_map(|(hospital_id, category, department, description)| {
            let mut new = NewComplaint::new(hospital_id, description).category(category);
            new.department = department;
            new
        })
}

/// A sequence of requested status changes, valid or not.
pub fn transition_requests(max_len: usize) -> impl Strategy<Value = Vec<ComplaintStatus>> {
    prop::collection::vec(status(), 0..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcms_auth::authorize;
    use hcms_core::{Complaint, CoreError};

    proptest! {
        #[test]
        fn test_generated_complaints_open(new in new_complaint(), owner in user_id()) {
            let complaint = Complaint::open(owner, new.clone(), 0, 4000).unwrap();
            prop_assert_eq!(complaint.description(), new.description.as_str());
            prop_assert_eq!(complaint.status(), ComplaintStatus::Pending);
        }

        #[test]
        fn test_ownership_never_narrows_rights(r in role(), a in action()) {
            if authorize(r, a, false).is_allowed() {
                prop_assert!(authorize(r, a, true).is_allowed());
            }
            if r == Role::Admin {
                prop_assert!(authorize(r, a, false).is_allowed());
            }
        }

        #[test]
        fn test_requested_transitions_follow_table(
            new in new_complaint(),
            requests in transition_requests(30),
        ) {
            let mut current = Complaint::open(UserId::new(), new, 0, 4000).unwrap();
            for (step, to) in requests.into_iter().enumerate() {
                let allowed = current.status().can_transition_to(to);
                match current.transition(to, step as i64) {
                    Ok(next) => {
                        prop_assert!(allowed);
                        prop_assert_eq!(next.version(), current.version() + 1);
                        prop_assert_eq!(next.resolved_at().is_some(), to == ComplaintStatus::Solved);
                        current = next;
                    }
                    Err(err) => {
                        prop_assert!(!allowed);
                        let is_invalid_transition = matches!(err, CoreError::InvalidTransition { .. });
                        prop_assert!(is_invalid_transition);
                    }
                }
            }
        }

        #[test]
        fn test_text_is_never_blank(s in text(30)) {
            prop_assert!(!s.trim().is_empty());
            prop_assert!(s.chars().count() <= 30);
        }
    }
}
