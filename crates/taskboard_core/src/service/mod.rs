//! Use-case services: the CRUD facade in front of the repositories.
//!
//! # Responsibility
//! - Validate caller input before persistence.
//! - Route task creation and moves through the ordering algorithms.
//! - Map repository failures to stable, caller-facing error codes.
//!
//! # Invariants
//! - Delete operations report a missing record as `Ok(false)`.
//! - Services remain storage-agnostic and hold no connection of their own.

pub mod task_service;
pub mod user_service;

/// Normalizes a user-facing title or name: trimmed, never blank.
pub(crate) fn normalize_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
