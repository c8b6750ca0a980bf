use super::{OrderStore, OrderingError};
use crate::model::order_key::OrderKey;
use crate::model::task::TaskId;

/// Moves `task_id` to 1-based `position` over the whole population and
/// returns the key that was written.
///
/// # Contract
/// - `position == 1`: key sorts below the current smallest key.
/// - `position == total`: current largest key plus one.
/// - Otherwise: midpoint of the two tasks that will flank the moved task,
///   i.e. ranks `position - 1` and `position` among the other tasks.
/// - Exactly one write, issued only after every check passed.
///
/// # Errors
/// - `EmptyPopulation` when no task exists.
/// - `InvalidPosition` when `position` is outside `[1, total]`.
/// - `TaskNotFound` when `task_id` is not in the store.
pub fn relocate<S: OrderStore>(
    store: &S,
    task_id: TaskId,
    position: i64,
) -> Result<OrderKey, OrderingError<S::Error>> {
    let total = store.population_count().map_err(OrderingError::Store)?;
    if total == 0 {
        return Err(OrderingError::EmptyPopulation);
    }
    if position < 1 || position as u64 > total {
        return Err(OrderingError::InvalidPosition { position, total });
    }
    if !store.contains_task(task_id).map_err(OrderingError::Store)? {
        return Err(OrderingError::TaskNotFound(task_id));
    }

    let position = position as u64;
    let candidate = if position == 1 {
        let first = store
            .first_key()
            .map_err(OrderingError::Store)?
            .ok_or(OrderingError::EmptyPopulation)?;
        first.predecessor()
    } else if position == total {
        let last = store
            .last_key()
            .map_err(OrderingError::Store)?
            .ok_or(OrderingError::EmptyPopulation)?;
        last.successor()
    } else {
        // Interior positions imply total >= 3, so two flanking keys exist.
        let flanks = store
            .keys_window(task_id, position - 2, 2)
            .map_err(OrderingError::Store)?;
        match flanks.as_slice() {
            [before, after] => before.midpoint(*after),
            _ => return Err(OrderingError::EmptyPopulation),
        }
    };
    let new_key = candidate.ok_or(OrderingError::KeySpaceExhausted)?;

    store
        .write_key(task_id, new_key)
        .map_err(OrderingError::Store)?;
    Ok(new_key)
}

#[cfg(test)]
mod tests {
    use super::relocate;
    use crate::model::order_key::OrderKey;
    use crate::ordering::memory::MemoryStore;
    use crate::ordering::OrderingError;

    fn store_with(keys: &[f64]) -> (MemoryStore, Vec<i64>) {
        let store = MemoryStore::default();
        let ids = keys
            .iter()
            .map(|value| store.push(1, OrderKey::new(*value).unwrap()))
            .collect();
        (store, ids)
    }

    #[test]
    fn move_to_front_halves_smallest_key() {
        let (store, ids) = store_with(&[1.0, 2.0, 3.0]);
        let key = relocate(&store, ids[2], 1).unwrap();
        assert_eq!(key.value(), 0.5);
        assert_eq!(store.rank_of(ids[2]), Some(1));
    }

    #[test]
    fn move_to_front_below_zero_key_steps_down() {
        let (store, ids) = store_with(&[0.0, 1.0, 2.0]);
        let key = relocate(&store, ids[2], 1).unwrap();
        assert_eq!(key.value(), -1.0);
        assert_eq!(store.rank_of(ids[2]), Some(1));
    }

    #[test]
    fn move_to_end_adds_one_to_largest_key() {
        let (store, ids) = store_with(&[1.0, 2.0, 3.0]);
        let key = relocate(&store, ids[0], 3).unwrap();
        assert_eq!(key.value(), 4.0);
        assert_eq!(store.rank_of(ids[0]), Some(3));
    }

    #[test]
    fn move_down_to_interior_takes_midpoint() {
        let (store, ids) = store_with(&[1.0, 2.0, 3.0, 4.0]);
        let key = relocate(&store, ids[0], 2).unwrap();
        assert_eq!(key.value(), 2.5);
        assert_eq!(store.rank_of(ids[0]), Some(2));
    }

    #[test]
    fn move_up_to_interior_lands_on_requested_rank() {
        let (store, ids) = store_with(&[1.0, 2.0, 3.0, 4.0]);
        let key = relocate(&store, ids[3], 2).unwrap();
        assert_eq!(key.value(), 1.5);
        assert_eq!(store.rank_of(ids[3]), Some(2));
    }

    #[test]
    fn move_to_current_position_keeps_rank() {
        let (store, ids) = store_with(&[1.0, 2.0, 3.0, 4.0]);
        relocate(&store, ids[2], 3).unwrap();
        assert_eq!(store.rank_of(ids[2]), Some(3));
    }

    #[test]
    fn every_position_is_reachable_from_every_rank() {
        for from in 0..5 {
            for position in 1..=5 {
                let (store, ids) = store_with(&[1.0, 2.0, 3.0, 4.0, 5.0]);
                relocate(&store, ids[from], position).unwrap();
                assert_eq!(
                    store.rank_of(ids[from]),
                    Some(position as usize),
                    "moving rank {} to {position}",
                    from + 1
                );
            }
        }
    }

    #[test]
    fn empty_population_is_rejected() {
        let store = MemoryStore::default();
        assert_eq!(relocate(&store, 1, 1), Err(OrderingError::EmptyPopulation));
    }

    #[test]
    fn out_of_range_positions_are_rejected_without_writes() {
        let (store, ids) = store_with(&[1.0, 2.0, 3.0]);
        for position in [0, 4, -3] {
            assert_eq!(
                relocate(&store, ids[0], position),
                Err(OrderingError::InvalidPosition { position, total: 3 })
            );
        }
        assert_eq!(store.keys(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn unknown_task_is_rejected() {
        let (store, _) = store_with(&[1.0, 2.0]);
        assert_eq!(relocate(&store, 99, 1), Err(OrderingError::TaskNotFound(99)));
    }

    #[test]
    fn single_task_can_move_to_its_own_position() {
        let (store, ids) = store_with(&[4.0]);
        assert_eq!(relocate(&store, ids[0], 1).unwrap().value(), 2.0);
    }

    #[test]
    fn adjacent_float_neighbors_exhaust_key_space() {
        let tight = f64::from_bits(1.0f64.to_bits() + 1);
        let (store, ids) = store_with(&[1.0, tight, 5.0]);
        assert_eq!(
            relocate(&store, ids[2], 2),
            Err(OrderingError::KeySpaceExhausted)
        );
        assert_eq!(store.keys(), vec![1.0, tight, 5.0]);
    }
}
