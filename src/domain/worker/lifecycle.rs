//! Worker lifecycle states

use serde::{Deserialize, Serialize};

/// `Uninstalled -> Provisioning -> Ready -> Activating -> Active`, and `Redundant` once superseded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Uninstalled,
    Provisioning,
    /// Installed, not yet serving traffic
    Ready,
    Activating,
    Active,
    /// Superseded by a newer instance of the same lineage
    Redundant,
}

impl LifecycleState {
    /// Whether the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: LifecycleState) -> bool {
        use LifecycleState::*;

        matches!(
            (self, next),
            (Uninstalled, Provisioning)
                | (Provisioning, Ready)
                | (Provisioning, Uninstalled)
                | (Ready, Activating)
                | (Activating, Active)
                | (Activating, Ready)
                | (Ready, Redundant)
                | (Active, Redundant)
        )
    }

    /// Only an active instance intercepts requests
    pub fn intercepts(&self) -> bool {
        matches!(self, LifecycleState::Active)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleState::Uninstalled => "uninstalled",
            LifecycleState::Provisioning => "provisioning",
            LifecycleState::Ready => "ready",
            LifecycleState::Activating => "activating",
            LifecycleState::Active => "active",
            LifecycleState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        use LifecycleState::*;

        assert!(Uninstalled.can_transition_to(Provisioning));
        assert!(Provisioning.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Activating));
        assert!(Activating.can_transition_to(Active));
        assert!(Active.can_transition_to(Redundant));
    }

    #[test]
    fn test_cannot_skip_provisioning() {
        use LifecycleState::*;

        assert!(!Uninstalled.can_transition_to(Activating));
        assert!(!Uninstalled.can_transition_to(Active));
        assert!(!Provisioning.can_transition_to(Active));
    }

    #[test]
    fn test_redundant_is_terminal() {
        use LifecycleState::*;

        for next in [Uninstalled, Provisioning, Ready, Activating, Active] {
            assert!(!Redundant.can_transition_to(next));
        }
    }

    #[test]
    fn test_only_active_intercepts() {
        assert!(LifecycleState::Active.intercepts());
        assert!(!LifecycleState::Ready.intercepts());
        assert!(!LifecycleState::Activating.intercepts());
    }
}
