//! Onboarding state machine — status and step progression.

use serde::{Deserialize, Serialize};

/// Overall onboarding status mirrored on the user profile.
///
/// Progresses strictly forward: Pending → InProgress → Completed.
/// No reset or cancellation transition exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl OnboardingStatus {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: OnboardingStatus) -> bool {
        use OnboardingStatus::*;
        matches!((self, target), (Pending, InProgress) | (InProgress, Completed))
    }

    /// Whether this status is terminal (onboarding is done).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for OnboardingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// Number of completable steps. `Complete` below is a terminal marker,
/// not a step of its own.
pub const TOTAL_STEPS: u32 = 4;

/// One stage of the fixed onboarding sequence tracked per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    AccountType,
    PersonalInfo,
    BusinessInfo,
    Verification,
    Complete,
}

impl OnboardingStep {
    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<OnboardingStep> {
        use OnboardingStep::*;
        match self {
            AccountType => Some(PersonalInfo),
            PersonalInfo => Some(BusinessInfo),
            BusinessInfo => Some(Verification),
            Verification => Some(Complete),
            Complete => None,
        }
    }

    /// The four completable steps, in completion order.
    pub fn all() -> [OnboardingStep; TOTAL_STEPS as usize] {
        [
            Self::AccountType,
            Self::PersonalInfo,
            Self::BusinessInfo,
            Self::Verification,
        ]
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AccountType => "account_type",
            Self::PersonalInfo => "personal_info",
            Self::BusinessInfo => "business_info",
            Self::Verification => "verification",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_status_transitions() {
        use OnboardingStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
    }

    #[test]
    fn invalid_status_transitions() {
        use OnboardingStatus::*;
        // Skip
        assert!(!Pending.can_transition_to(Completed));
        // Backward
        assert!(!InProgress.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(Pending));
        // Self-transition
        assert!(!InProgress.can_transition_to(InProgress));
    }

    #[test]
    fn completed_is_terminal() {
        assert!(OnboardingStatus::Completed.is_terminal());
        assert!(!OnboardingStatus::Pending.is_terminal());
        assert!(!OnboardingStatus::InProgress.is_terminal());
    }

    #[test]
    fn step_next_walks_all_steps() {
        use OnboardingStep::*;
        let expected = [PersonalInfo, BusinessInfo, Verification, Complete];
        let mut current = AccountType;
        for expected_next in expected {
            let next = current.next().unwrap();
            assert_eq!(next, expected_next);
            current = next;
        }
        assert!(current.next().is_none());
    }

    #[test]
    fn all_lists_the_four_completable_steps() {
        let all = OnboardingStep::all();
        assert_eq!(all.len(), TOTAL_STEPS as usize);
        assert_eq!(all[0], OnboardingStep::AccountType);
        assert_eq!(all[3], OnboardingStep::Verification);
        assert!(!all.contains(&OnboardingStep::Complete));
    }

    #[test]
    fn display_matches_serde() {
        let steps = [
            OnboardingStep::AccountType,
            OnboardingStep::PersonalInfo,
            OnboardingStep::BusinessInfo,
            OnboardingStep::Verification,
            OnboardingStep::Complete,
        ];
        for step in steps {
            let display = format!("{step}");
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
        let statuses = [
            OnboardingStatus::Pending,
            OnboardingStatus::InProgress,
            OnboardingStatus::Completed,
        ];
        for status in statuses {
            let display = format!("{status}");
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
    }
}
