//! taskboard: command-line gateway over the task and user services.
//!
//! Every subcommand is translated into one `GatewayRequest`; the JSON
//! response envelope is printed to stdout. A non-empty `errors` list
//! exits with status 1.

mod config;
mod gateway;

use crate::config::{ConfigArgs, GatewayConfig};
use crate::gateway::{Gateway, GatewayRequest, GatewayResponse};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use taskboard_core::{TaskId, TaskListId, TaskStatus, UserId};

#[derive(Parser, Debug)]
#[command(name = "taskboard", version, about = "Task lists with user-ordered tasks")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// User directory operations
    #[command(subcommand)]
    User(UserCommand),
    /// Task list operations
    #[command(subcommand)]
    List(ListCommand),
    /// Task operations
    #[command(subcommand)]
    Task(TaskCommand),
    /// Execute a raw JSON request document, e.g. '{"op":"taskLists"}'
    Exec {
        /// Request document
        json: String,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create {
        #[arg(long)]
        username: String,
        #[arg(long, env = "TASKBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Get {
        id: UserId,
    },
    List,
    Update {
        id: UserId,
        #[arg(long)]
        username: Option<String>,
    },
    Delete {
        id: UserId,
    },
    /// Replace a user's password after checking the current one
    Passwd {
        id: UserId,
        #[arg(long, env = "TASKBOARD_PASSWORD", hide_env_values = true)]
        current: String,
        #[arg(long, env = "TASKBOARD_NEW_PASSWORD", hide_env_values = true)]
        new: String,
    },
}

#[derive(Subcommand, Debug)]
enum ListCommand {
    Create {
        title: String,
    },
    Get {
        id: TaskListId,
    },
    List,
    Update {
        id: TaskListId,
        #[arg(long)]
        title: Option<String>,
    },
    /// Delete a list together with its tasks
    Delete {
        id: TaskListId,
    },
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    /// Append a task to the end of a list
    Create {
        #[arg(long = "list")]
        task_list_id: TaskListId,
        title: String,
    },
    Get {
        id: TaskId,
    },
    /// List tasks in display order
    List {
        #[arg(long = "list")]
        task_list_id: Option<TaskListId>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    Update {
        id: TaskId,
        #[arg(long)]
        title: Option<String>,
        /// CREATED or COMPLETED
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    Delete {
        id: TaskId,
    },
    /// Move a task to a 1-based position
    Move {
        id: TaskId,
        #[arg(allow_negative_numbers = true)]
        position: i64,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = GatewayConfig::resolve(cli.config);

    if let Some(log_dir) = config.log_dir.as_deref() {
        let log_dir = log_dir
            .to_str()
            .context("log directory must be valid UTF-8")?;
        taskboard_core::init_logging(&config.log_level, log_dir)
            .context("failed to initialize logging")?;
    }

    let gateway = Gateway::new(config);
    let response = match cli.command {
        Command::User(command) => gateway.execute(user_request(command)),
        Command::List(command) => gateway.execute(list_request(command)),
        Command::Task(command) => gateway.execute(task_request(command)),
        Command::Exec { json } => gateway.execute_json(&json),
    };
    print_response(&response)?;

    Ok(if response.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn user_request(command: UserCommand) -> GatewayRequest {
    match command {
        UserCommand::Create { username, password } => {
            GatewayRequest::CreateUser { username, password }
        }
        UserCommand::Get { id } => GatewayRequest::User { id },
        UserCommand::List => GatewayRequest::Users,
        UserCommand::Update { id, username } => GatewayRequest::UpdateUser { id, username },
        UserCommand::Delete { id } => GatewayRequest::DeleteUser { id },
        UserCommand::Passwd { id, current, new } => GatewayRequest::ChangePassword {
            id,
            current_password: current,
            new_password: new,
        },
    }
}

fn list_request(command: ListCommand) -> GatewayRequest {
    match command {
        ListCommand::Create { title } => GatewayRequest::CreateTaskList { title },
        ListCommand::Get { id } => GatewayRequest::TaskList { id },
        ListCommand::List => GatewayRequest::TaskLists,
        ListCommand::Update { id, title } => GatewayRequest::UpdateTaskList { id, title },
        ListCommand::Delete { id } => GatewayRequest::DeleteTaskList { id },
    }
}

fn task_request(command: TaskCommand) -> GatewayRequest {
    match command {
        TaskCommand::Create {
            task_list_id,
            title,
        } => GatewayRequest::CreateTask {
            title,
            task_list_id,
        },
        TaskCommand::Get { id } => GatewayRequest::Task { id },
        TaskCommand::List {
            task_list_id,
            limit,
            offset,
        } => GatewayRequest::Tasks {
            task_list_id,
            limit,
            offset,
        },
        TaskCommand::Update { id, title, status } => {
            GatewayRequest::UpdateTask { id, title, status }
        }
        TaskCommand::Delete { id } => GatewayRequest::DeleteTask { id },
        TaskCommand::Move { id, position } => GatewayRequest::MoveTask { id, position },
    }
}

fn print_response(response: &GatewayResponse) -> anyhow::Result<()> {
    let rendered =
        serde_json::to_string_pretty(response).context("failed to render response")?;
    println!("{rendered}");
    Ok(())
}
