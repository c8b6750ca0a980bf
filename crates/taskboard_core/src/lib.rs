//! Core domain logic for taskboard: task lists with user-ordered tasks,
//! plus the user directory.
//! This crate owns every ordering invariant; callers only pass requests in.

pub mod db;
pub mod logging;
pub mod model;
pub mod ordering;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::order_key::OrderKey;
pub use model::task::{Task, TaskId, TaskList, TaskListId, TaskPatch, TaskStatus};
pub use model::user::{PasswordDigest, User, UserId};
pub use ordering::{assign_append_key, relocate, OrderStore, OrderingError};
pub use repo::task_repo::{
    SqliteTaskRepository, TaskQuery, TaskRepoError, TaskRepoResult, TaskRepository,
};
pub use repo::user_repo::{SqliteUserRepository, UserRepoError, UserRepoResult, UserRepository};
pub use repo::SchemaError;
pub use service::task_service::{TaskService, TaskServiceError, TaskServiceResult};
pub use service::user_service::{UserService, UserServiceError, UserServiceResult};
