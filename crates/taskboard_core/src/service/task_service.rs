//! Task use-case service.
//!
//! # Invariants
//! - Titles are trimmed and must not be blank.
//! - Task creation always appends; the caller never picks the order key.
//! - Only `move_task` changes an existing task's order key.

use crate::model::task::{Task, TaskId, TaskList, TaskListId, TaskPatch};
use crate::repo::task_repo::{TaskQuery, TaskRepoError, TaskRepository};
use crate::service::normalize_text;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from task service operations.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Title is blank after trim.
    InvalidTitle,
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Target task list does not exist.
    TaskListNotFound(TaskListId),
    /// Move requested while no task exists.
    EmptyPopulation,
    /// Move target outside `[1, total]`.
    InvalidPosition { position: i64, total: u64 },
    /// Order keys cannot express the requested placement.
    KeySpaceExhausted,
    /// Repository-level failure.
    Repo(TaskRepoError),
}

impl TaskServiceError {
    /// Stable machine-readable failure code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTitle => "INVALID_INPUT",
            Self::TaskNotFound(_) | Self::TaskListNotFound(_) => "NOT_FOUND",
            Self::EmptyPopulation => "EMPTY_POPULATION",
            Self::InvalidPosition { .. } => "INVALID_POSITION",
            Self::KeySpaceExhausted => "KEY_SPACE_EXHAUSTED",
            Self::Repo(_) => "INTERNAL",
        }
    }
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "title must not be blank"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::TaskListNotFound(id) => write!(f, "task list not found: {id}"),
            Self::EmptyPopulation => write!(f, "no tasks to reposition among"),
            Self::InvalidPosition { position, total } => write!(
                f,
                "position {position} is out of range; expected 1..={total}"
            ),
            Self::KeySpaceExhausted => {
                write!(f, "order key precision exhausted for requested placement")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskRepoError> for TaskServiceError {
    fn from(value: TaskRepoError) -> Self {
        match value {
            TaskRepoError::TaskNotFound(id) => Self::TaskNotFound(id),
            TaskRepoError::TaskListNotFound(id) => Self::TaskListNotFound(id),
            TaskRepoError::EmptyPopulation => Self::EmptyPopulation,
            TaskRepoError::InvalidPosition { position, total } => {
                Self::InvalidPosition { position, total }
            }
            TaskRepoError::KeySpaceExhausted => Self::KeySpaceExhausted,
            other => Self::Repo(other),
        }
    }
}

pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Task service facade.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_task_list(&self, title: &str) -> TaskServiceResult<TaskList> {
        let title = normalize_text(title).ok_or(TaskServiceError::InvalidTitle)?;
        Ok(self.repo.create_task_list(&title)?)
    }

    /// Loads one task list. Absence is `Ok(None)`, not an error.
    pub fn task_list(&self, id: TaskListId) -> TaskServiceResult<Option<TaskList>> {
        Ok(self.repo.get_task_list(id)?)
    }

    pub fn task_lists(&self) -> TaskServiceResult<Vec<TaskList>> {
        Ok(self.repo.list_task_lists()?)
    }

    /// Renames a task list. `None` leaves it unchanged and returns it.
    pub fn update_task_list(
        &self,
        id: TaskListId,
        title: Option<&str>,
    ) -> TaskServiceResult<TaskList> {
        match title {
            Some(title) => {
                let title = normalize_text(title).ok_or(TaskServiceError::InvalidTitle)?;
                Ok(self.repo.rename_task_list(id, &title)?)
            }
            None => self
                .repo
                .get_task_list(id)?
                .ok_or(TaskServiceError::TaskListNotFound(id)),
        }
    }

    /// Deletes a task list with its tasks. Returns `false` when absent.
    pub fn delete_task_list(&self, id: TaskListId) -> TaskServiceResult<bool> {
        match self.repo.delete_task_list(id) {
            Ok(()) => Ok(true),
            Err(TaskRepoError::TaskListNotFound(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Appends a new task with status `CREATED` to the end of its list.
    pub fn create_task(&self, title: &str, task_list_id: TaskListId) -> TaskServiceResult<Task> {
        let title = normalize_text(title).ok_or(TaskServiceError::InvalidTitle)?;
        Ok(self.repo.create_task(task_list_id, &title)?)
    }

    /// Loads one task. Absence is `Ok(None)`, not an error.
    pub fn task(&self, id: TaskId) -> TaskServiceResult<Option<Task>> {
        Ok(self.repo.get_task(id)?)
    }

    /// Lists tasks in visible order.
    pub fn tasks(&self, query: &TaskQuery) -> TaskServiceResult<Vec<Task>> {
        Ok(self.repo.list_tasks(query)?)
    }

    /// Updates title and/or status.
    pub fn update_task(&self, id: TaskId, patch: TaskPatch) -> TaskServiceResult<Task> {
        let title = match patch.title.as_deref() {
            Some(value) => Some(normalize_text(value).ok_or(TaskServiceError::InvalidTitle)?),
            None => None,
        };
        let patch = TaskPatch {
            title,
            status: patch.status,
        };
        Ok(self.repo.update_task(id, &patch)?)
    }

    /// Deletes a task. Returns `false` when absent.
    pub fn delete_task(&self, id: TaskId) -> TaskServiceResult<bool> {
        match self.repo.delete_task(id) {
            Ok(()) => Ok(true),
            Err(TaskRepoError::TaskNotFound(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Moves a task to 1-based `position` and returns it with its new key.
    pub fn move_task(&self, id: TaskId, position: i64) -> TaskServiceResult<Task> {
        Ok(self.repo.move_task(id, position)?)
    }
}
