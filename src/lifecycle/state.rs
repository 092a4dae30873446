//! Lifecycle states for one trigger element.

use std::fmt;

/// Where a click currently is in its download lifecycle.
///
/// `Idle → Guarding → Fetching → (Succeeding | Failing) → Restoring → Idle`.
/// A click rejected by the in-flight guard goes straight from `Guarding`
/// back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Ready for a click.
    Idle,
    /// Options resolved, checking the in-flight marker.
    Guarding,
    /// Placeholder shown, request in flight.
    Fetching,
    /// Response received, handing the blob to the save target.
    Succeeding,
    /// Request or save failed.
    Failing,
    /// Putting the element back the way it was.
    Restoring,
}

impl LifecycleState {
    /// Returns the label used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Guarding => "guarding",
            Self::Fetching => "fetching",
            Self::Succeeding => "succeeding",
            Self::Failing => "failing",
            Self::Restoring => "restoring",
        }
    }

    /// Whether `next` is a legal successor of this state.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Guarding)
                | (Self::Guarding, Self::Fetching | Self::Idle)
                | (Self::Fetching, Self::Succeeding | Self::Failing)
                | (Self::Succeeding, Self::Failing | Self::Restoring)
                | (Self::Failing, Self::Restoring)
                | (Self::Restoring, Self::Idle)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
