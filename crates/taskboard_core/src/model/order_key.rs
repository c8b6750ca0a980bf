//! Numeric ordering key for tasks.
//!
//! # Responsibility
//! - Define comparison and insertion arithmetic over floating-point keys.
//!
//! # Invariants
//! - Keys are finite. Constructors reject NaN and infinities.
//! - Inserting "between" or "beyond" existing keys never rewrites them.
//! - Arithmetic that cannot land strictly on the requested side returns
//!   `None` instead of a silent tie.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Sortable position key of a task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderKey(f64);

impl OrderKey {
    /// Key assigned to the first task appended to an empty list.
    pub const ZERO: OrderKey = OrderKey(0.0);

    /// Wraps a raw value, rejecting non-finite numbers.
    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Total order over keys. Finite keys make this agree with `<`.
    pub fn cmp_key(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }

    /// Returns `(self + other) / 2`.
    ///
    /// Equal keys yield the same key back; ties are tolerated by callers.
    /// Returns `None` when two unequal keys are adjacent floats and no value
    /// lies strictly between them.
    pub fn midpoint(self, other: Self) -> Option<Self> {
        let (low, high) = if self.0 <= other.0 {
            (self.0, other.0)
        } else {
            (other.0, self.0)
        };
        if low == high {
            return Some(self);
        }
        let mid = low + (high - low) / 2.0;
        (low < mid && mid < high).then_some(Self(mid))
    }

    /// Smallest step past this key used for appends and move-to-end: `key + 1`.
    pub fn successor(self) -> Option<Self> {
        let next = self.0 + 1.0;
        (next.is_finite() && next > self.0).then_some(Self(next))
    }

    /// Key that sorts before this one, used for move-to-front.
    ///
    /// Positive keys are halved. Zero and negative keys step down by one,
    /// since halving them would tie or land after the current key.
    pub fn predecessor(self) -> Option<Self> {
        let prev = if self.0 > 0.0 {
            self.0 / 2.0
        } else {
            self.0 - 1.0
        };
        (prev.is_finite() && prev < self.0).then_some(Self(prev))
    }
}

impl Display for OrderKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
