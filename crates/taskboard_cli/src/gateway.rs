//! Request gateway over the task and user services.
//!
//! # Responsibility
//! - Route each request to the service that owns its entities.
//! - Wrap every outcome in one JSON envelope with stable error codes.
//!
//! # Invariants
//! - `execute` never panics; every failure becomes a `GatewayError`.
//! - Each request opens only the datastore of the service it targets.
//! - Reads of missing records yield `data: null`, deletes yield `false`.

use crate::config::GatewayConfig;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use taskboard_core::db::open_db;
use taskboard_core::{
    SqliteTaskRepository, SqliteUserRepository, TaskId, TaskListId, TaskPatch, TaskQuery,
    TaskService, TaskServiceError, TaskServiceResult, TaskStatus, UserId, UserService,
    UserServiceError, UserServiceResult,
};

/// One facade operation, tagged by `op`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GatewayRequest {
    CreateUser {
        username: String,
        password: String,
    },
    User {
        id: UserId,
    },
    Users,
    UpdateUser {
        id: UserId,
        #[serde(default)]
        username: Option<String>,
    },
    DeleteUser {
        id: UserId,
    },
    ChangePassword {
        id: UserId,
        current_password: String,
        new_password: String,
    },
    CreateTaskList {
        title: String,
    },
    TaskList {
        id: TaskListId,
    },
    TaskLists,
    UpdateTaskList {
        id: TaskListId,
        #[serde(default)]
        title: Option<String>,
    },
    DeleteTaskList {
        id: TaskListId,
    },
    CreateTask {
        title: String,
        task_list_id: TaskListId,
    },
    Task {
        id: TaskId,
    },
    Tasks {
        #[serde(default)]
        task_list_id: Option<TaskListId>,
        #[serde(default)]
        limit: Option<u32>,
        #[serde(default)]
        offset: u32,
    },
    UpdateTask {
        id: TaskId,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        status: Option<TaskStatus>,
    },
    DeleteTask {
        id: TaskId,
    },
    MoveTask {
        id: TaskId,
        position: i64,
    },
}

impl GatewayRequest {
    /// Stable operation name used in logs.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::CreateUser { .. } => "createUser",
            Self::User { .. } => "user",
            Self::Users => "users",
            Self::UpdateUser { .. } => "updateUser",
            Self::DeleteUser { .. } => "deleteUser",
            Self::ChangePassword { .. } => "changePassword",
            Self::CreateTaskList { .. } => "createTaskList",
            Self::TaskList { .. } => "taskList",
            Self::TaskLists => "taskLists",
            Self::UpdateTaskList { .. } => "updateTaskList",
            Self::DeleteTaskList { .. } => "deleteTaskList",
            Self::CreateTask { .. } => "createTask",
            Self::Task { .. } => "task",
            Self::Tasks { .. } => "tasks",
            Self::UpdateTask { .. } => "updateTask",
            Self::DeleteTask { .. } => "deleteTask",
            Self::MoveTask { .. } => "moveTask",
        }
    }
}

/// One failure entry in a response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayError {
    /// Machine-readable failure code.
    pub code: String,
    /// Human-readable diagnostic.
    pub message: String,
}

impl GatewayError {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Rejected request document.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    fn datastore(path: &Path, message: impl Into<String>) -> Self {
        Self::new(
            "DATASTORE_UNAVAILABLE",
            format!("{}: {}", path.display(), message.into()),
        )
    }
}

impl From<TaskServiceError> for GatewayError {
    fn from(value: TaskServiceError) -> Self {
        Self::new(value.code(), value.to_string())
    }
}

impl From<UserServiceError> for GatewayError {
    fn from(value: UserServiceError) -> Self {
        Self::new(value.code(), value.to_string())
    }
}

/// Response envelope: `data` on success, `errors` on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GatewayError>,
}

impl GatewayResponse {
    fn success(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// Envelope carrying a single error.
    pub fn failure(error: GatewayError) -> Self {
        Self {
            data: None,
            errors: vec![error],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Routes requests to the task and user services.
pub struct Gateway {
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// Parses a raw JSON request document and executes it.
    pub fn execute_json(&self, raw: &str) -> GatewayResponse {
        match serde_json::from_str::<GatewayRequest>(raw) {
            Ok(request) => self.execute(request),
            Err(err) => {
                warn!("event=gateway_execute module=gateway status=error code=BAD_REQUEST");
                GatewayResponse::failure(GatewayError::bad_request(err.to_string()))
            }
        }
    }

    /// Executes one request and wraps the outcome.
    pub fn execute(&self, request: GatewayRequest) -> GatewayResponse {
        let op = request.op_name();
        match self.dispatch(request) {
            Ok(data) => {
                info!("event=gateway_execute module=gateway status=ok op={op}");
                GatewayResponse::success(data)
            }
            Err(err) => {
                warn!(
                    "event=gateway_execute module=gateway status=error op={op} code={}",
                    err.code
                );
                GatewayResponse::failure(err)
            }
        }
    }

    fn dispatch(&self, request: GatewayRequest) -> Result<Value, GatewayError> {
        match request {
            GatewayRequest::CreateUser { username, password } => {
                self.with_user_service(|service| service.create_user(&username, &password))
            }
            GatewayRequest::User { id } => self.with_user_service(|service| service.user(id)),
            GatewayRequest::Users => self.with_user_service(|service| service.users()),
            GatewayRequest::UpdateUser { id, username } => {
                self.with_user_service(|service| service.update_user(id, username.as_deref()))
            }
            GatewayRequest::DeleteUser { id } => {
                self.with_user_service(|service| service.delete_user(id))
            }
            GatewayRequest::ChangePassword {
                id,
                current_password,
                new_password,
            } => self.with_user_service(|service| {
                service
                    .change_password(id, &current_password, &new_password)
                    .map(|()| true)
            }),
            GatewayRequest::CreateTaskList { title } => {
                self.with_task_service(|service| service.create_task_list(&title))
            }
            GatewayRequest::TaskList { id } => {
                self.with_task_service(|service| service.task_list(id))
            }
            GatewayRequest::TaskLists => self.with_task_service(|service| service.task_lists()),
            GatewayRequest::UpdateTaskList { id, title } => {
                self.with_task_service(|service| service.update_task_list(id, title.as_deref()))
            }
            GatewayRequest::DeleteTaskList { id } => {
                self.with_task_service(|service| service.delete_task_list(id))
            }
            GatewayRequest::CreateTask {
                title,
                task_list_id,
            } => self.with_task_service(|service| service.create_task(&title, task_list_id)),
            GatewayRequest::Task { id } => self.with_task_service(|service| service.task(id)),
            GatewayRequest::Tasks {
                task_list_id,
                limit,
                offset,
            } => {
                let query = TaskQuery {
                    task_list_id,
                    limit,
                    offset,
                };
                self.with_task_service(|service| service.tasks(&query))
            }
            GatewayRequest::UpdateTask { id, title, status } => self
                .with_task_service(|service| service.update_task(id, TaskPatch { title, status })),
            GatewayRequest::DeleteTask { id } => {
                self.with_task_service(|service| service.delete_task(id))
            }
            GatewayRequest::MoveTask { id, position } => {
                self.with_task_service(|service| service.move_task(id, position))
            }
        }
    }

    fn with_task_service<T: Serialize>(
        &self,
        f: impl FnOnce(&TaskService<SqliteTaskRepository<'_>>) -> TaskServiceResult<T>,
    ) -> Result<Value, GatewayError> {
        let path = self.config.task_db.as_path();
        let conn = open_db(path).map_err(|err| GatewayError::datastore(path, err.to_string()))?;
        let repo = SqliteTaskRepository::try_new(&conn)
            .map_err(|err| GatewayError::from(TaskServiceError::from(err)))?;
        let service = TaskService::new(repo);
        to_data(f(&service)?)
    }

    fn with_user_service<T: Serialize>(
        &self,
        f: impl FnOnce(&UserService<SqliteUserRepository<'_>>) -> UserServiceResult<T>,
    ) -> Result<Value, GatewayError> {
        let path = self.config.user_db.as_path();
        let conn = open_db(path).map_err(|err| GatewayError::datastore(path, err.to_string()))?;
        let repo = SqliteUserRepository::try_new(&conn)
            .map_err(|err| GatewayError::from(UserServiceError::from(err)))?;
        let service = UserService::new(repo);
        to_data(f(&service)?)
    }
}

fn to_data<T: Serialize>(value: T) -> Result<Value, GatewayError> {
    serde_json::to_value(value).map_err(|err| GatewayError::new("INTERNAL", err.to_string()))
}
