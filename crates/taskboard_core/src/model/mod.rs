//! Domain model for task lists, tasks and users.
//!
//! # Invariants
//! - A task belongs to exactly one task list.
//! - Ascending `OrderKey` defines the visible sequence of tasks.
//! - Users never carry password material in their read model.

pub mod order_key;
pub mod task;
pub mod user;
