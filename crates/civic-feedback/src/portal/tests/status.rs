use crate::portal::status::{Actor, SubmissionCategory, SubmissionStatus, UnknownStatus};

#[test]
fn wire_values_round_trip_through_from_str() {
    for status in SubmissionStatus::ALL {
        assert_eq!(status.as_str().parse::<SubmissionStatus>(), Ok(status));
    }
    for category in SubmissionCategory::ALL {
        assert_eq!(
            category.as_str().parse::<SubmissionCategory>(),
            Ok(category)
        );
    }
}

#[test]
fn serde_uses_snake_case_wire_names() {
    let json = serde_json::to_string(&SubmissionStatus::UnderReview).expect("serialize");
    assert_eq!(json, "\"under_review\"");
    let json = serde_json::to_string(&SubmissionCategory::EconomicDevelopment).expect("serialize");
    assert_eq!(json, "\"economic_development\"");
}

#[test]
fn unknown_status_is_rejected() {
    assert_eq!(
        "closed".parse::<SubmissionStatus>(),
        Err(UnknownStatus("closed".to_string()))
    );
    assert!("Pending".parse::<SubmissionStatus>().is_err());
}

#[test]
fn badges_are_fixed_per_state() {
    let badge = SubmissionStatus::Addressed.badge();
    assert_eq!(badge.label, "Addressed");
    assert_eq!(badge.emphasis, "success");
    assert_eq!(badge.icon, "check-circle");
    assert_eq!(SubmissionStatus::Rejected.badge().emphasis, "destructive");
    assert_eq!(SubmissionStatus::UnderReview.badge().label, "Under Review");
}

#[test]
fn administrators_follow_the_lifecycle_graph() {
    use SubmissionStatus::*;

    let allowed = [
        (Pending, UnderReview),
        (Pending, Addressed),
        (Pending, Rejected),
        (UnderReview, Addressed),
        (UnderReview, Rejected),
    ];

    for from in SubmissionStatus::ALL {
        for to in SubmissionStatus::ALL {
            let expected = allowed.contains(&(from, to));
            assert_eq!(
                from.can_transition_to(to, Actor::Administrator),
                expected,
                "{from} -> {to}"
            );
        }
    }
}

#[test]
fn terminal_states_have_no_exits() {
    for terminal in [SubmissionStatus::Addressed, SubmissionStatus::Rejected] {
        assert!(terminal.is_terminal());
        for to in SubmissionStatus::ALL {
            assert!(!terminal.can_transition_to(to, Actor::Administrator));
            assert!(!terminal.can_transition_to(to, Actor::Citizen));
        }
    }
}

#[test]
fn citizens_may_only_submit_drafts() {
    assert!(SubmissionStatus::Draft.can_transition_to(SubmissionStatus::Pending, Actor::Citizen));
    assert!(!SubmissionStatus::Pending.can_transition_to(
        SubmissionStatus::UnderReview,
        Actor::Citizen
    ));
    assert!(!SubmissionStatus::Draft.can_transition_to(
        SubmissionStatus::Pending,
        Actor::Administrator
    ));
}

#[test]
fn category_labels_match_the_form() {
    assert_eq!(
        SubmissionCategory::EconomicDevelopment.label(),
        "Economic Development"
    );
    assert!("transport".parse::<SubmissionCategory>().is_err());
}
