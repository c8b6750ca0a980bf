//! Task list and task domain records.
//!
//! # Invariants
//! - `Task::order` is written at creation by the append assigner and
//!   afterwards only by the position relocator.
//! - Ids are assigned by storage and never reused.

use crate::model::order_key::OrderKey;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Storage-assigned task list identifier.
pub type TaskListId = i64;

/// Storage-assigned task identifier.
pub type TaskId = i64;

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Newly created, not done yet.
    Created,
    /// Done.
    Completed,
}

impl TaskStatus {
    /// Stable wire and storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Completed => "COMPLETED",
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown task status name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTaskStatusError(pub String);

impl Display for ParseTaskStatusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown task status `{}`; expected CREATED|COMPLETED",
            self.0
        )
    }
}

impl std::error::Error for ParseTaskStatusError {}

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CREATED" => Ok(Self::Created),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(ParseTaskStatusError(value.to_string())),
        }
    }
}

/// Named container that owns an ordered set of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub id: TaskListId,
    pub title: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// One task inside a task list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    /// Position key. Ascending sort gives the visible sequence.
    pub order: OrderKey,
    pub task_list_id: TaskListId,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Partial update for a task. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.status.is_none()
    }
}
