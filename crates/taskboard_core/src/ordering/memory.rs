//! In-memory `OrderStore` used by unit tests.

use super::OrderStore;
use crate::model::order_key::OrderKey;
use crate::model::task::{TaskId, TaskListId};
use std::cell::RefCell;
use std::convert::Infallible;

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    rows: RefCell<Vec<(TaskId, TaskListId, OrderKey)>>,
}

impl MemoryStore {
    /// Inserts a task and returns its id.
    pub(crate) fn push(&self, list_id: TaskListId, key: OrderKey) -> TaskId {
        let mut rows = self.rows.borrow_mut();
        let id = rows.len() as TaskId + 1;
        rows.push((id, list_id, key));
        id
    }

    fn sorted(&self) -> Vec<(TaskId, TaskListId, OrderKey)> {
        let mut rows = self.rows.borrow().clone();
        rows.sort_by(|a, b| a.2.cmp_key(&b.2).then(a.0.cmp(&b.0)));
        rows
    }

    /// 1-based rank of `task_id` in ascending key order.
    pub(crate) fn rank_of(&self, task_id: TaskId) -> Option<usize> {
        self.sorted()
            .iter()
            .position(|row| row.0 == task_id)
            .map(|index| index + 1)
    }

    /// Keys in insertion order.
    pub(crate) fn keys(&self) -> Vec<f64> {
        self.rows.borrow().iter().map(|row| row.2.value()).collect()
    }
}

impl OrderStore for MemoryStore {
    type Error = Infallible;

    fn last_key_in_list(&self, list_id: TaskListId) -> Result<Option<OrderKey>, Infallible> {
        Ok(self
            .sorted()
            .into_iter()
            .filter(|row| row.1 == list_id)
            .last()
            .map(|row| row.2))
    }

    fn contains_task(&self, task_id: TaskId) -> Result<bool, Infallible> {
        Ok(self.rows.borrow().iter().any(|row| row.0 == task_id))
    }

    fn population_count(&self) -> Result<u64, Infallible> {
        Ok(self.rows.borrow().len() as u64)
    }

    fn first_key(&self) -> Result<Option<OrderKey>, Infallible> {
        Ok(self.sorted().first().map(|row| row.2))
    }

    fn last_key(&self) -> Result<Option<OrderKey>, Infallible> {
        Ok(self.sorted().last().map(|row| row.2))
    }

    fn keys_window(
        &self,
        exclude: TaskId,
        skip: u64,
        take: u64,
    ) -> Result<Vec<OrderKey>, Infallible> {
        Ok(self
            .sorted()
            .into_iter()
            .filter(|row| row.0 != exclude)
            .skip(skip as usize)
            .take(take as usize)
            .map(|row| row.2)
            .collect())
    }

    fn write_key(&self, task_id: TaskId, key: OrderKey) -> Result<(), Infallible> {
        if let Some(row) = self
            .rows
            .borrow_mut()
            .iter_mut()
            .find(|row| row.0 == task_id)
        {
            row.2 = key;
        }
        Ok(())
    }
}
