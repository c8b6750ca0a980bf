//! Ordered-list maintenance for tasks.
//!
//! # Responsibility
//! - Assign order keys to appended tasks (`assign_append_key`).
//! - Move an existing task to a 1-based position with one key write
//!   (`relocate`).
//!
//! # Invariants
//! - Neighbor keys are never rewritten. No renumbering pass exists.
//! - `relocate` validates before it writes, so a failed move leaves every
//!   key untouched.
//! - Callers own transaction scope. `relocate` expects the store to observe
//!   one consistent snapshot for its reads and its write.

use crate::model::order_key::OrderKey;
use crate::model::task::{TaskId, TaskListId};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod append;
mod relocate;

#[cfg(test)]
mod memory;

pub use append::assign_append_key;
pub use relocate::relocate;

/// Persistence contract consumed by the ordering algorithms.
///
/// "Population" is the set of tasks a relocation ranks over. For the SQLite
/// store this is every task in the database, regardless of list.
pub trait OrderStore {
    type Error;

    /// Largest key among tasks of `list_id`, if the list has any task.
    fn last_key_in_list(&self, list_id: TaskListId) -> Result<Option<OrderKey>, Self::Error>;
    /// Whether `task_id` exists.
    fn contains_task(&self, task_id: TaskId) -> Result<bool, Self::Error>;
    /// Number of tasks in the population.
    fn population_count(&self) -> Result<u64, Self::Error>;
    /// Smallest key in the population.
    fn first_key(&self) -> Result<Option<OrderKey>, Self::Error>;
    /// Largest key in the population.
    fn last_key(&self) -> Result<Option<OrderKey>, Self::Error>;
    /// Keys sorted ascending (ties by task id), with `exclude` left out,
    /// after skipping `skip` entries and taking at most `take`.
    fn keys_window(
        &self,
        exclude: TaskId,
        skip: u64,
        take: u64,
    ) -> Result<Vec<OrderKey>, Self::Error>;
    /// Overwrites the key of `task_id`.
    fn write_key(&self, task_id: TaskId, key: OrderKey) -> Result<(), Self::Error>;
}

/// Failure of an ordering operation.
#[derive(Debug, PartialEq)]
pub enum OrderingError<E> {
    /// Relocation requested while the population holds no task.
    EmptyPopulation,
    /// Target position is outside `[1, total]`.
    InvalidPosition { position: i64, total: u64 },
    /// Task to move does not exist.
    TaskNotFound(TaskId),
    /// Floating-point keys cannot express the requested placement.
    KeySpaceExhausted,
    /// Failure reported by the backing store.
    Store(E),
}

impl<E: Display> Display for OrderingError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPopulation => write!(f, "no tasks to reposition among"),
            Self::InvalidPosition { position, total } => write!(
                f,
                "position {position} is out of range; expected 1..={total}"
            ),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::KeySpaceExhausted => {
                write!(f, "order key precision exhausted for requested placement")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl<E: Error + 'static> Error for OrderingError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}
