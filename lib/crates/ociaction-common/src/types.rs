use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Literal used for the tenancy root in compartment paths and names.
pub const ROOT_MARKER: &str = "root";

/// Lifecycle state of a compute instance as reported by the provider.
///
/// Names are matched exactly as the provider spells them. Anything else is
/// kept verbatim so a record always round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LifecycleState {
    Moving,
    Provisioning,
    Running,
    Starting,
    Stopping,
    Stopped,
    CreatingImage,
    Terminating,
    Terminated,
    Other(UnknownState),
}

/// A lifecycle name outside the known vocabulary.
///
/// Only built through `LifecycleState::from`, so it never holds a known name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnknownState(String);

impl UnknownState {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl LifecycleState {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Moving => "MOVING",
            Self::Provisioning => "PROVISIONING",
            Self::Running => "RUNNING",
            Self::Starting => "STARTING",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
            Self::CreatingImage => "CREATING_IMAGE",
            Self::Terminating => "TERMINATING",
            Self::Terminated => "TERMINATED",
            Self::Other(raw) => raw.as_str(),
        }
    }

    /// TERMINATED and TERMINATING instances are never part of the inventory.
    #[must_use]
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Terminated | Self::Terminating)
    }
}

impl From<String> for LifecycleState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "MOVING" => Self::Moving,
            "PROVISIONING" => Self::Provisioning,
            "RUNNING" => Self::Running,
            "STARTING" => Self::Starting,
            "STOPPING" => Self::Stopping,
            "STOPPED" => Self::Stopped,
            "CREATING_IMAGE" => Self::CreatingImage,
            "TERMINATING" => Self::Terminating,
            "TERMINATED" => Self::Terminated,
            _ => Self::Other(UnknownState(raw)),
        }
    }
}

impl From<&str> for LifecycleState {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<LifecycleState> for String {
    fn from(state: LifecycleState) -> Self {
        match state {
            LifecycleState::Other(UnknownState(raw)) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compartment as enumerated from the identity API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compartment {
    pub id: String,
    pub name: String,
    pub parent_id: String,
    pub tenancy_id: String,
}

/// A compute instance exactly as the provider reports it, before the
/// compartment path is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub display_name: String,
    pub compartment_id: String,
    pub region: String,
    pub lifecycle_state: LifecycleState,
}

/// Cached VM record.
///
/// JSON field names are the stored cache format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "ocid")]
    pub id: String,
    pub compartment_id: String,
    pub compartment_name: String,
    pub compartment_path: String,
    pub region: String,
    #[serde(rename = "status")]
    pub lifecycle_state: LifecycleState,
    pub profile: String,
}

/// Logical action accepted by the action API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Start,
    Stop,
    Restart,
}

/// Returned when an action name is not one of start, stop, restart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for ActionKind {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "restart" => Ok(Self::Restart),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

impl ActionKind {
    /// Provider lifecycle transition for this action. Stop and restart use
    /// the soft (ACPI) variants.
    #[must_use]
    pub fn instance_action(self) -> InstanceAction {
        match self {
            Self::Start => InstanceAction::Start,
            Self::Stop => InstanceAction::SoftStop,
            Self::Restart => InstanceAction::SoftRestart,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-side instance action vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceAction {
    Start,
    #[serde(rename = "SOFTSTOP")]
    SoftStop,
    #[serde(rename = "SOFTRESTART")]
    SoftRestart,
}

impl InstanceAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::SoftStop => "SOFTSTOP",
            Self::SoftRestart => "SOFTRESTART",
        }
    }
}

impl fmt::Display for InstanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /resource`.
///
/// `action` stays a plain string so an unknown value is reported as an
/// unrecognized action instead of a body parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub name: String,
    #[serde(default)]
    pub compartment: Option<String>,
    pub action: String,
}

/// Structured reply for every action-path outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub status: u16,
    pub msg: String,
}

impl ActionResponse {
    pub fn new(status: u16, msg: impl Into<String>) -> Self {
        Self {
            status,
            msg: msg.into(),
        }
    }
}
