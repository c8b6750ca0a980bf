//! Gateway runtime configuration.
//!
//! # Responsibility
//! - Resolve datastore paths and logging options from flags and env vars.
//! - Fall back to temp-dir database files when nothing is configured.
//!
//! # Invariants
//! - The task and user services never share a datastore file by default.
//! - Blank env values count as unset.

use clap::Args;
use std::path::PathBuf;

const TASK_DB_FILE_NAME: &str = "taskboard_tasks.sqlite3";
const USER_DB_FILE_NAME: &str = "taskboard_users.sqlite3";

/// Global CLI options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// SQLite file backing task lists and tasks
    #[arg(long, global = true, env = "TASKBOARD_TASK_DB")]
    pub task_db: Option<PathBuf>,

    /// SQLite file backing users
    #[arg(long, global = true, env = "TASKBOARD_USER_DB")]
    pub user_db: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true, env = "TASKBOARD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true, env = "TASKBOARD_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

/// Resolved gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub task_db: PathBuf,
    pub user_db: PathBuf,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl GatewayConfig {
    /// Applies defaults to whatever the flags and environment left unset.
    pub fn resolve(args: ConfigArgs) -> Self {
        Self {
            task_db: non_blank_path(args.task_db)
                .unwrap_or_else(|| std::env::temp_dir().join(TASK_DB_FILE_NAME)),
            user_db: non_blank_path(args.user_db)
                .unwrap_or_else(|| std::env::temp_dir().join(USER_DB_FILE_NAME)),
            log_level: args
                .log_level
                .map(|level| level.trim().to_string())
                .filter(|level| !level.is_empty())
                .unwrap_or_else(|| taskboard_core::default_log_level().to_string()),
            log_dir: non_blank_path(args.log_dir),
        }
    }
}

fn non_blank_path(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|path| !path.as_os_str().to_string_lossy().trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{ConfigArgs, GatewayConfig, TASK_DB_FILE_NAME, USER_DB_FILE_NAME};
    use std::path::PathBuf;

    #[test]
    fn defaults_point_at_separate_temp_files() {
        let config = GatewayConfig::resolve(ConfigArgs::default());

        assert_eq!(config.task_db, std::env::temp_dir().join(TASK_DB_FILE_NAME));
        assert_eq!(config.user_db, std::env::temp_dir().join(USER_DB_FILE_NAME));
        assert_ne!(config.task_db, config.user_db);
        assert_eq!(config.log_level, taskboard_core::default_log_level());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn explicit_values_win_and_blank_ones_fall_back() {
        let config = GatewayConfig::resolve(ConfigArgs {
            task_db: Some(PathBuf::from("/data/tasks.db")),
            user_db: Some(PathBuf::from("  ")),
            log_level: Some(" warn ".to_string()),
            log_dir: Some(PathBuf::from("")),
        });

        assert_eq!(config.task_db, PathBuf::from("/data/tasks.db"));
        assert_eq!(config.user_db, std::env::temp_dir().join(USER_DB_FILE_NAME));
        assert_eq!(config.log_level, "warn");
        assert!(config.log_dir.is_none());
    }
}
