use serde::{Deserialize, Serialize};
use std::fmt;

/// Node execution states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    /// Constructed, not yet started
    Idle,
    /// Pulling from inputs and pushing to outputs
    Running,
    /// Terminal; every owned output has been closed
    Closed,
}

impl NodeState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &NodeState) -> bool {
        use NodeState::*;

        matches!((self, target), (Idle, Running) | (Running, Closed))
    }

    /// Get human-readable state name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Closed => "Closed",
        }
    }
}

impl Default for NodeState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
