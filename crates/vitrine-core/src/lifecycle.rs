//! Agent lifecycle state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of the cache agent
///
/// The agent moves through `Installing -> Installed -> Activating ->
/// Activated`, version-keyed by the generation name. Install always
/// completes before activation begins; that ordering is enforced by the
/// host driving the coordinator, the phase guard here only rejects
/// out-of-order requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentPhase {
    Installing,
    Installed,
    Activating,
    Activated,
}

impl AgentPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentPhase::Installing => "installing",
            AgentPhase::Installed => "installed",
            AgentPhase::Activating => "activating",
            AgentPhase::Activated => "activated",
        }
    }

    /// Whether the install handler may run in this phase. Re-running
    /// install over an installed agent is allowed and idempotent.
    pub fn can_install(&self) -> bool {
        matches!(self, AgentPhase::Installing | AgentPhase::Installed)
    }

    /// Whether the activate handler may run in this phase
    pub fn can_activate(&self) -> bool {
        matches!(self, AgentPhase::Installed)
    }
}

impl fmt::Display for AgentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
