//! Task list and task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD persistence for `task_lists` and `tasks`.
//! - Run the append assigner and position relocator against SQLite inside
//!   write transactions.
//!
//! # Invariants
//! - Task listing is deterministic: `order_key ASC, id ASC`.
//! - `create_task` reads the list's last key and inserts in one IMMEDIATE
//!   transaction, so concurrent creates cannot share a key.
//! - `move_task` counts, reads neighbors and writes the new key in one
//!   IMMEDIATE transaction. Failed checks roll back with no write.
//! - Relocation ranks over every task in the database, not only the moved
//!   task's list.

use crate::db::DbError;
use crate::model::order_key::OrderKey;
use crate::model::task::{Task, TaskId, TaskList, TaskListId, TaskPatch, TaskStatus};
use crate::ordering::{assign_append_key, relocate, OrderStore, OrderingError};
use crate::repo::{ensure_connection_ready, SchemaError, NOW_EPOCH_MS_SQL};
use log::{info, warn};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    status,
    order_key,
    task_list_id,
    created_at,
    updated_at
FROM tasks";

const TASK_LIST_SELECT_SQL: &str = "SELECT
    id,
    title,
    created_at,
    updated_at
FROM task_lists";

/// Result type used by task repository operations.
pub type TaskRepoResult<T> = Result<T, TaskRepoError>;

/// Errors from task repository operations.
#[derive(Debug)]
pub enum TaskRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection is not migrated for task storage.
    Schema(SchemaError),
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
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for TaskRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Schema(err) => write!(f, "{err}"),
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
            Self::InvalidData(message) => write!(f, "invalid task data: {message}"),
        }
    }
}

impl Error for TaskRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Schema(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for TaskRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for TaskRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<SchemaError> for TaskRepoError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<OrderingError<TaskRepoError>> for TaskRepoError {
    fn from(value: OrderingError<TaskRepoError>) -> Self {
        match value {
            OrderingError::EmptyPopulation => Self::EmptyPopulation,
            OrderingError::InvalidPosition { position, total } => {
                Self::InvalidPosition { position, total }
            }
            OrderingError::TaskNotFound(id) => Self::TaskNotFound(id),
            OrderingError::KeySpaceExhausted => Self::KeySpaceExhausted,
            OrderingError::Store(err) => err,
        }
    }
}

/// Query options for listing tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Restrict to one task list.
    pub task_list_id: Option<TaskListId>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for task lists and tasks.
pub trait TaskRepository {
    /// Creates one task list.
    fn create_task_list(&self, title: &str) -> TaskRepoResult<TaskList>;
    /// Loads one task list by id.
    fn get_task_list(&self, id: TaskListId) -> TaskRepoResult<Option<TaskList>>;
    /// Lists all task lists by id.
    fn list_task_lists(&self) -> TaskRepoResult<Vec<TaskList>>;
    /// Renames one task list.
    fn rename_task_list(&self, id: TaskListId, title: &str) -> TaskRepoResult<TaskList>;
    /// Deletes one task list and, by cascade, its tasks.
    fn delete_task_list(&self, id: TaskListId) -> TaskRepoResult<()>;
    /// Appends one task to the end of its list.
    fn create_task(&self, task_list_id: TaskListId, title: &str) -> TaskRepoResult<Task>;
    /// Loads one task by id.
    fn get_task(&self, id: TaskId) -> TaskRepoResult<Option<Task>>;
    /// Lists tasks in ascending key order.
    fn list_tasks(&self, query: &TaskQuery) -> TaskRepoResult<Vec<Task>>;
    /// Applies title/status changes. Never touches the order key.
    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> TaskRepoResult<Task>;
    /// Deletes one task.
    fn delete_task(&self, id: TaskId) -> TaskRepoResult<()>;
    /// Relocates one task to a 1-based position.
    fn move_task(&self, id: TaskId, position: i64) -> TaskRepoResult<Task>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> TaskRepoResult<Self> {
        ensure_connection_ready(
            conn,
            "tasks",
            &[
                "id",
                "title",
                "status",
                "order_key",
                "task_list_id",
                "created_at",
                "updated_at",
            ],
        )?;
        ensure_connection_ready(conn, "task_lists", &["id", "title"])?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task_list(&self, title: &str) -> TaskRepoResult<TaskList> {
        self.conn
            .execute("INSERT INTO task_lists (title) VALUES (?1);", [title])?;
        let id = self.conn.last_insert_rowid();
        load_task_list(self.conn, id)?.ok_or(TaskRepoError::TaskListNotFound(id))
    }

    fn get_task_list(&self, id: TaskListId) -> TaskRepoResult<Option<TaskList>> {
        load_task_list(self.conn, id)
    }

    fn list_task_lists(&self) -> TaskRepoResult<Vec<TaskList>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_LIST_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            lists.push(parse_task_list_row(row)?);
        }
        Ok(lists)
    }

    fn rename_task_list(&self, id: TaskListId, title: &str) -> TaskRepoResult<TaskList> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE task_lists
                 SET title = ?2,
                     updated_at = {NOW_EPOCH_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![id, title],
        )?;
        if changed == 0 {
            return Err(TaskRepoError::TaskListNotFound(id));
        }
        load_task_list(self.conn, id)?.ok_or(TaskRepoError::TaskListNotFound(id))
    }

    fn delete_task_list(&self, id: TaskListId) -> TaskRepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM task_lists WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(TaskRepoError::TaskListNotFound(id));
        }
        info!("event=task_list_delete module=task_repo status=ok task_list_id={id}");
        Ok(())
    }

    fn create_task(&self, task_list_id: TaskListId, title: &str) -> TaskRepoResult<Task> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if load_task_list(&tx, task_list_id)?.is_none() {
            return Err(TaskRepoError::TaskListNotFound(task_list_id));
        }

        let order = assign_append_key(&SqliteOrderStore { conn: &tx }, task_list_id)?;
        tx.execute(
            "INSERT INTO tasks (title, status, order_key, task_list_id)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                title,
                TaskStatus::Created.as_str(),
                order.value(),
                task_list_id
            ],
        )?;
        let id = tx.last_insert_rowid();
        let task = load_task(&tx, id)?.ok_or(TaskRepoError::TaskNotFound(id))?;
        tx.commit()?;

        info!(
            "event=task_create module=task_repo status=ok task_id={id} task_list_id={task_list_id} order={order}"
        );
        Ok(task)
    }

    fn get_task(&self, id: TaskId) -> TaskRepoResult<Option<Task>> {
        load_task(self.conn, id)
    }

    fn list_tasks(&self, query: &TaskQuery) -> TaskRepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(task_list_id) = query.task_list_id {
            sql.push_str(" AND task_list_id = ?");
            bind_values.push(Value::Integer(task_list_id));
        }

        sql.push_str(" ORDER BY order_key ASC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> TaskRepoResult<Task> {
        if !patch.is_empty() {
            let changed = self.conn.execute(
                &format!(
                    "UPDATE tasks
                     SET title = COALESCE(?2, title),
                         status = COALESCE(?3, status),
                         updated_at = {NOW_EPOCH_MS_SQL}
                     WHERE id = ?1;"
                ),
                params![
                    id,
                    patch.title.as_deref(),
                    patch.status.map(TaskStatus::as_str)
                ],
            )?;
            if changed == 0 {
                return Err(TaskRepoError::TaskNotFound(id));
            }
        }
        load_task(self.conn, id)?.ok_or(TaskRepoError::TaskNotFound(id))
    }

    fn delete_task(&self, id: TaskId) -> TaskRepoResult<()> {
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(TaskRepoError::TaskNotFound(id));
        }
        Ok(())
    }

    fn move_task(&self, id: TaskId, position: i64) -> TaskRepoResult<Task> {
        let started_at = Instant::now();
        match self.relocate_in_transaction(id, position) {
            Ok((order, task)) => {
                info!(
                    "event=task_move module=task_repo status=ok task_id={id} position={position} order={order} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(task)
            }
            Err(err) => {
                warn!(
                    "event=task_move module=task_repo status=error task_id={id} position={position} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }
}

impl SqliteTaskRepository<'_> {
    fn relocate_in_transaction(
        &self,
        id: TaskId,
        position: i64,
    ) -> TaskRepoResult<(OrderKey, Task)> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let order = relocate(&SqliteOrderStore { conn: &tx }, id, position)?;
        let task = load_task(&tx, id)?.ok_or(TaskRepoError::TaskNotFound(id))?;
        tx.commit()?;
        Ok((order, task))
    }
}

/// `OrderStore` view over one open connection or transaction.
struct SqliteOrderStore<'a> {
    conn: &'a Connection,
}

impl OrderStore for SqliteOrderStore<'_> {
    type Error = TaskRepoError;

    fn last_key_in_list(&self, list_id: TaskListId) -> TaskRepoResult<Option<OrderKey>> {
        let value: Option<f64> = self.conn.query_row(
            "SELECT MAX(order_key) FROM tasks WHERE task_list_id = ?1;",
            [list_id],
            |row| row.get(0),
        )?;
        value.map(parse_order_key).transpose()
    }

    fn contains_task(&self, task_id: TaskId) -> TaskRepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1);",
            [task_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn population_count(&self) -> TaskRepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| TaskRepoError::InvalidData(format!("negative task count `{count}`")))
    }

    fn first_key(&self) -> TaskRepoResult<Option<OrderKey>> {
        let value: Option<f64> = self
            .conn
            .query_row(
                "SELECT order_key FROM tasks ORDER BY order_key ASC, id ASC LIMIT 1;",
                [],
                |row| row.get(0),
            )
            .optional()?;
        value.map(parse_order_key).transpose()
    }

    fn last_key(&self) -> TaskRepoResult<Option<OrderKey>> {
        let value: Option<f64> = self
            .conn
            .query_row(
                "SELECT order_key FROM tasks ORDER BY order_key DESC, id DESC LIMIT 1;",
                [],
                |row| row.get(0),
            )
            .optional()?;
        value.map(parse_order_key).transpose()
    }

    fn keys_window(&self, exclude: TaskId, skip: u64, take: u64) -> TaskRepoResult<Vec<OrderKey>> {
        let mut stmt = self.conn.prepare(
            "SELECT order_key
             FROM tasks
             WHERE id <> ?1
             ORDER BY order_key ASC, id ASC
             LIMIT ?2 OFFSET ?3;",
        )?;
        let mut rows = stmt.query(params![exclude, to_sql_count(take)?, to_sql_count(skip)?])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            keys.push(parse_order_key(row.get(0)?)?);
        }
        Ok(keys)
    }

    fn write_key(&self, task_id: TaskId, key: OrderKey) -> TaskRepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE tasks
                 SET order_key = ?2,
                     updated_at = {NOW_EPOCH_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![task_id, key.value()],
        )?;
        if changed == 0 {
            return Err(TaskRepoError::TaskNotFound(task_id));
        }
        Ok(())
    }
}

fn load_task(conn: &Connection, id: TaskId) -> TaskRepoResult<Option<Task>> {
    let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_task_row(row)?));
    }
    Ok(None)
}

fn load_task_list(conn: &Connection, id: TaskListId) -> TaskRepoResult<Option<TaskList>> {
    let mut stmt = conn.prepare(&format!("{TASK_LIST_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_task_list_row(row)?));
    }
    Ok(None)
}

fn parse_task_row(row: &Row<'_>) -> TaskRepoResult<Task> {
    let status_text: String = row.get("status")?;
    let status = status_text
        .parse::<TaskStatus>()
        .map_err(|err| TaskRepoError::InvalidData(format!("{err} in tasks.status")))?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        status,
        order: parse_order_key(row.get("order_key")?)?,
        task_list_id: row.get("task_list_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_task_list_row(row: &Row<'_>) -> TaskRepoResult<TaskList> {
    Ok(TaskList {
        id: row.get("id")?,
        title: row.get("title")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_order_key(value: f64) -> TaskRepoResult<OrderKey> {
    OrderKey::new(value).ok_or_else(|| {
        TaskRepoError::InvalidData(format!("non-finite order key `{value}` in tasks.order_key"))
    })
}

fn to_sql_count(value: u64) -> TaskRepoResult<i64> {
    i64::try_from(value)
        .map_err(|_| TaskRepoError::InvalidData(format!("row count `{value}` exceeds i64")))
}
