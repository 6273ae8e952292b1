//! Playbooks, their executions, and the task statuses reported while an
//! execution is in progress.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::id::PlaybookId;
use crate::time::Timestamp;

/// A stored playbook that can be run against a set of devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playbook {
    pub id: PlaybookId,
    pub name: String,
    pub path: String,
}

/// Extra variable whose value is forced for an automated run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraVar {
    pub name: String,
    pub value: String,
}

/// Identifier handed back by the playbook runner for one execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of a playbook execution as reported by the runner.
///
/// Runner statuses are free-form strings; anything not recognised is kept
/// verbatim in [`TaskStatus::Other`] and treated as still in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Starting,
    Running,
    Success,
    Failed,
    Error,
    Canceled,
    Timeout,
    Other(String),
}

impl TaskStatus {
    /// A terminal status will not change any further.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failed | Self::Error | Self::Canceled | Self::Timeout
        )
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl FromStr for TaskStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "starting" => Self::Starting,
            "running" => Self::Running,
            "successful" | "success" => Self::Success,
            "failed" => Self::Failed,
            "error" => Self::Error,
            "canceled" | "cancelled" => Self::Canceled,
            "timeout" => Self::Timeout,
            _ => Self::Other(s.to_string()),
        })
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Starting => f.write_str("STARTING"),
            Self::Running => f.write_str("RUNNING"),
            Self::Success => f.write_str("SUCCESS"),
            Self::Failed => f.write_str("FAILED"),
            Self::Error => f.write_str("ERROR"),
            Self::Canceled => f.write_str("CANCELED"),
            Self::Timeout => f.write_str("TIMEOUT"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let Ok(status) = raw.parse::<Self>();
        Ok(status)
    }
}

/// One status entry recorded for an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatusRecord {
    pub execution_id: ExecutionId,
    pub status: TaskStatus,
    pub created_at: Timestamp,
}
