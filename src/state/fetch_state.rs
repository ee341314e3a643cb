/// Report fetch state definitions
///
/// A report fetch walks `Unvalidated -> Validating -> Fetching -> Succeeded`, and may
/// drop to `Failed` from any non-terminal state. There are no retries, so terminal
/// states have no outgoing transitions.
use std::fmt;

/// Represents where a report fetch currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchState {
    /// Nothing has happened yet
    Unvalidated,

    /// The stored session is being replayed against the panel
    Validating,

    /// The session was accepted and the report page is being fetched
    Fetching,

    /// The report page was fetched and parsed
    Succeeded,

    /// Validation or fetching failed
    Failed,
}

impl FetchState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true if moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: FetchState) -> bool {
        matches!(
            (self, next),
            (Self::Unvalidated, Self::Validating)
                | (Self::Validating, Self::Fetching)
                | (Self::Fetching, Self::Succeeded)
                | (Self::Unvalidated | Self::Validating | Self::Fetching, Self::Failed)
        )
    }

    /// Moves to `next`, returning the new state
    ///
    /// An illegal transition leaves the state unchanged and returns `None`.
    pub fn advance(&mut self, next: FetchState) -> Option<FetchState> {
        if !self.can_transition_to(next) {
            tracing::warn!("Illegal fetch state transition: {} -> {}", self, next);
            return None;
        }
        tracing::debug!("Fetch state: {} -> {}", self, next);
        *self = next;
        Some(next)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unvalidated => "unvalidated",
            Self::Validating => "validating",
            Self::Fetching => "fetching",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
