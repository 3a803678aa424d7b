//! Tests for the transition table.

use crate::model::ConfigStatus::{self, Applied, Deactivated, Deactivating, Error, Modified};
use crate::status::{
    ModifiedReason, StatusError, StatusEvent, Transition, device_transition, transition,
};

const ALL: [ConfigStatus; 5] = [Modified, Applied, Error, Deactivating, Deactivated];

fn modified() -> StatusEvent {
    StatusEvent::Modified(ModifiedReason::Templates)
}

fn to(from: ConfigStatus, event: &StatusEvent) -> ConfigStatus {
    transition(from, event).unwrap().status()
}

mod agent_reports {
    use super::*;

    #[test]
    fn applied_from_modified_or_error() {
        assert_eq!(
            transition(Modified, &StatusEvent::AgentApplied),
            Ok(Transition::Changed {
                from: Modified,
                to: Applied
            })
        );
        assert_eq!(to(Error, &StatusEvent::AgentApplied), Applied);
    }

    #[test]
    fn applied_twice_is_unchanged() {
        assert_eq!(
            transition(Applied, &StatusEvent::AgentApplied),
            Ok(Transition::Unchanged(Applied))
        );
    }

    #[test]
    fn applied_while_deactivating_is_rejected() {
        assert_eq!(
            transition(Deactivating, &StatusEvent::AgentApplied),
            Err(StatusError::InvalidTransition {
                from: Deactivating,
                event: "applied"
            })
        );
    }

    #[test]
    fn failure_from_any_state() {
        for status in ALL {
            assert_eq!(to(status, &StatusEvent::AgentFailed), Error);
        }
    }
}

mod modification {
    use super::*;

    #[test]
    fn applied_and_error_become_modified() {
        assert!(transition(Applied, &modified()).unwrap().is_change());
        assert!(transition(Error, &modified()).unwrap().is_change());
    }

    #[test]
    fn already_modified_is_not_a_change() {
        assert_eq!(
            transition(Modified, &modified()),
            Ok(Transition::Unchanged(Modified))
        );
    }

    #[test]
    fn deactivation_states_ignore_modification() {
        assert_eq!(to(Deactivating, &modified()), Deactivating);
        assert_eq!(to(Deactivated, &modified()), Deactivated);
    }
}

mod deactivation {
    use super::*;

    #[test]
    fn deactivate_from_active_states() {
        for status in [Modified, Applied, Error] {
            assert_eq!(to(status, &StatusEvent::Deactivate), Deactivating);
        }
    }

    #[test]
    fn deactivate_is_idempotent() {
        assert_eq!(
            transition(Deactivating, &StatusEvent::Deactivate),
            Ok(Transition::Unchanged(Deactivating))
        );
    }

    #[test]
    fn deactivate_after_deactivated_is_rejected() {
        assert!(transition(Deactivated, &StatusEvent::Deactivate).is_err());
    }

    #[test]
    fn confirmation_only_from_deactivating() {
        assert_eq!(to(Deactivating, &StatusEvent::ConfirmDeactivation), Deactivated);
        assert!(transition(Applied, &StatusEvent::ConfirmDeactivation).is_err());
    }

    #[test]
    fn activate_only_from_deactivated() {
        assert_eq!(to(Deactivated, &StatusEvent::Activate), Modified);
        for status in [Modified, Applied, Error, Deactivating] {
            assert!(transition(status, &StatusEvent::Activate).is_err());
        }
    }
}

mod inactive_device {
    use super::*;

    fn inactive(from: ConfigStatus, event: &StatusEvent) -> Result<Transition, StatusError> {
        device_transition(false, from, event)
    }

    #[test]
    fn active_devices_follow_the_table() {
        for status in ALL {
            assert_eq!(
                device_transition(true, status, &modified()),
                transition(status, &modified())
            );
        }
    }

    #[test]
    fn failure_is_recorded() {
        assert_eq!(
            inactive(Deactivated, &StatusEvent::AgentFailed).map(Transition::status),
            Ok(Error)
        );
    }

    #[test]
    fn modification_is_ignored_after_failure() {
        assert_eq!(inactive(Error, &modified()), Ok(Transition::Unchanged(Error)));
    }

    #[test]
    fn success_report_is_rejected() {
        assert_eq!(
            inactive(Error, &StatusEvent::AgentApplied),
            Err(StatusError::InvalidTransition {
                from: Error,
                event: "applied"
            })
        );
    }

    #[test]
    fn activation_from_error_or_deactivated() {
        for status in [Error, Deactivated] {
            assert_eq!(
                inactive(status, &StatusEvent::Activate).map(Transition::status),
                Ok(Modified)
            );
        }
        assert!(inactive(Deactivating, &StatusEvent::Activate).is_err());
    }
}

#[test]
fn event_display_includes_reason() {
    let event = StatusEvent::Modified(ModifiedReason::TemplateContent("t1".into()));
    assert_eq!(event.to_string(), "modified (template t1 changed)");
}
