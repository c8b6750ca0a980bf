use super::{OrderStore, OrderingError};
use crate::model::order_key::OrderKey;
use crate::model::task::TaskListId;

/// Computes the key for a task appended to the end of `list_id`.
///
/// An empty list starts at `OrderKey::ZERO`; otherwise the result is the
/// list's largest key plus one. Only reads; the caller persists the task.
pub fn assign_append_key<S: OrderStore>(
    store: &S,
    list_id: TaskListId,
) -> Result<OrderKey, OrderingError<S::Error>> {
    match store
        .last_key_in_list(list_id)
        .map_err(OrderingError::Store)?
    {
        None => Ok(OrderKey::ZERO),
        Some(last) => last.successor().ok_or(OrderingError::KeySpaceExhausted),
    }
}
