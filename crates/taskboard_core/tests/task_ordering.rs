use rusqlite::Connection;
use std::collections::HashSet;
use std::thread;
use taskboard_core::db::{open_db, open_db_in_memory};
use taskboard_core::{
    SqliteTaskRepository, Task, TaskId, TaskListId, TaskQuery, TaskService, TaskServiceError,
};

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn service(conn: &Connection) -> TaskService<SqliteTaskRepository<'_>> {
    TaskService::new(SqliteTaskRepository::try_new(conn).unwrap())
}

/// Inserts tasks with explicit keys, bypassing the append assigner.
fn seed_keys(conn: &Connection, list_id: TaskListId, keys: &[f64]) -> Vec<TaskId> {
    keys.iter()
        .enumerate()
        .map(|(index, key)| {
            conn.execute(
                "INSERT INTO tasks (title, order_key, task_list_id) VALUES (?1, ?2, ?3);",
                rusqlite::params![format!("seeded {index}"), key, list_id],
            )
            .unwrap();
            conn.last_insert_rowid()
        })
        .collect()
}

fn ordered_ids(service: &TaskService<SqliteTaskRepository<'_>>, query: &TaskQuery) -> Vec<TaskId> {
    service
        .tasks(query)
        .unwrap()
        .into_iter()
        .map(|task: Task| task.id)
        .collect()
}

#[test]
fn appended_keys_start_at_zero_and_increase() {
    let conn = setup();
    let service = service(&conn);
    let list = service.create_task_list("Inbox").unwrap();

    let keys: Vec<f64> = (0..4)
        .map(|index| {
            service
                .create_task(&format!("task {index}"), list.id)
                .unwrap()
                .order
                .value()
        })
        .collect();

    assert_eq!(keys, vec![0.0, 1.0, 2.0, 3.0]);
}

#[test]
fn append_is_scoped_per_list() {
    let conn = setup();
    let service = service(&conn);
    let first = service.create_task_list("First").unwrap();
    let second = service.create_task_list("Second").unwrap();

    service.create_task("a", first.id).unwrap();
    service.create_task("b", first.id).unwrap();
    let other = service.create_task("c", second.id).unwrap();

    assert_eq!(other.order.value(), 0.0);
}

#[test]
fn move_to_front_halves_smallest_key() {
    let conn = setup();
    let service = service(&conn);
    let list = service.create_task_list("List").unwrap();
    let ids = seed_keys(&conn, list.id, &[1.0, 2.0, 3.0]);

    let moved = service.move_task(ids[2], 1).unwrap();

    assert_eq!(moved.order.value(), 0.5);
    assert_eq!(ordered_ids(&service, &TaskQuery::default())[0], ids[2]);
}

#[test]
fn move_to_front_when_smallest_key_is_zero_stays_strictly_first() {
    let conn = setup();
    let service = service(&conn);
    let list = service.create_task_list("List").unwrap();
    let first = service.create_task("first", list.id).unwrap();
    let second = service.create_task("second", list.id).unwrap();
    assert_eq!(first.order.value(), 0.0);

    let moved = service.move_task(second.id, 1).unwrap();

    assert!(moved.order.value() < 0.0);
    assert_eq!(
        ordered_ids(&service, &TaskQuery::default()),
        vec![second.id, first.id]
    );
}

#[test]
fn move_to_end_adds_one_to_largest_key() {
    let conn = setup();
    let service = service(&conn);
    let list = service.create_task_list("List").unwrap();
    let ids = seed_keys(&conn, list.id, &[1.0, 2.0, 3.0]);

    let moved = service.move_task(ids[0], 3).unwrap();

    assert_eq!(moved.order.value(), 4.0);
    assert_eq!(ordered_ids(&service, &TaskQuery::default())[2], ids[0]);
}

#[test]
fn move_to_interior_takes_midpoint_of_flanking_keys() {
    let conn = setup();
    let service = service(&conn);
    let list = service.create_task_list("List").unwrap();
    let ids = seed_keys(&conn, list.id, &[1.0, 2.0, 3.0, 4.0]);

    let moved = service.move_task(ids[0], 2).unwrap();

    assert_eq!(moved.order.value(), 2.5);
    assert_eq!(
        ordered_ids(&service, &TaskQuery::default()),
        vec![ids[1], ids[0], ids[2], ids[3]]
    );
}

#[test]
fn moving_up_into_interior_lands_on_requested_rank() {
    let conn = setup();
    let service = service(&conn);
    let list = service.create_task_list("List").unwrap();
    let ids = seed_keys(&conn, list.id, &[1.0, 2.0, 3.0, 4.0]);

    service.move_task(ids[3], 2).unwrap();

    let order = ordered_ids(&service, &TaskQuery::default());
    assert_eq!(order.iter().position(|id| *id == ids[3]), Some(1));
    assert_eq!(order.iter().filter(|id| **id == ids[3]).count(), 1);
}

#[test]
fn move_only_rewrites_the_moved_task() {
    let conn = setup();
    let service = service(&conn);
    let list = service.create_task_list("List").unwrap();
    let ids = seed_keys(&conn, list.id, &[1.0, 2.0, 3.0, 4.0]);

    service.move_task(ids[3], 2).unwrap();

    for (id, key) in ids[..3].iter().zip([1.0, 2.0, 3.0]) {
        assert_eq!(service.task(*id).unwrap().unwrap().order.value(), key);
    }
}

#[test]
fn empty_population_is_reported() {
    let conn = setup();
    let service = service(&conn);

    let err = service.move_task(1, 1).unwrap_err();
    assert!(matches!(err, TaskServiceError::EmptyPopulation));
    assert_eq!(err.code(), "EMPTY_POPULATION");
}

#[test]
fn out_of_range_positions_are_reported_without_writes() {
    let conn = setup();
    let service = service(&conn);
    let list = service.create_task_list("List").unwrap();
    let ids = seed_keys(&conn, list.id, &[1.0, 2.0, 3.0]);

    for position in [0, 4] {
        let err = service.move_task(ids[1], position).unwrap_err();
        assert!(matches!(
            err,
            TaskServiceError::InvalidPosition { position: p, total: 3 } if p == position
        ));
        assert_eq!(err.code(), "INVALID_POSITION");
    }
    assert_eq!(service.task(ids[1]).unwrap().unwrap().order.value(), 2.0);
}

#[test]
fn moving_missing_task_is_not_found() {
    let conn = setup();
    let service = service(&conn);
    let list = service.create_task_list("List").unwrap();
    seed_keys(&conn, list.id, &[1.0]);

    let err = service.move_task(404, 1).unwrap_err();
    assert!(matches!(err, TaskServiceError::TaskNotFound(404)));
}

#[test]
fn positions_rank_over_tasks_of_every_list() {
    let conn = setup();
    let service = service(&conn);
    let work = service.create_task_list("Work").unwrap();
    let home = service.create_task_list("Home").unwrap();
    let work_ids = seed_keys(&conn, work.id, &[1.0, 3.0, 5.0]);
    seed_keys(&conn, home.id, &[2.0, 4.0]);

    // Five tasks exist overall, so position 5 is valid although Work holds three.
    let moved = service.move_task(work_ids[0], 5).unwrap();
    assert_eq!(moved.order.value(), 6.0);

    // Position 2 sits between the global ranks 1 and 2 of the other tasks
    // (keys 2 and 3), one of which belongs to Home.
    let moved = service.move_task(work_ids[2], 2).unwrap();
    assert_eq!(moved.order.value(), 2.5);

    let work_only = TaskQuery {
        task_list_id: Some(work.id),
        ..TaskQuery::default()
    };
    assert_eq!(
        ordered_ids(&service, &work_only),
        vec![work_ids[2], work_ids[1], work_ids[0]]
    );
}

#[test]
fn create_after_move_appends_past_moved_keys() {
    let conn = setup();
    let service = service(&conn);
    let list = service.create_task_list("List").unwrap();
    let a = service.create_task("a", list.id).unwrap();
    service.create_task("b", list.id).unwrap();

    service.move_task(a.id, 2).unwrap();
    let c = service.create_task("c", list.id).unwrap();

    assert_eq!(c.order.value(), 3.0);
    assert_eq!(
        *ordered_ids(&service, &TaskQuery::default()).last().unwrap(),
        c.id
    );
}

fn distinct_keys(tasks: &[Task]) -> usize {
    tasks
        .iter()
        .map(|task| task.order.value().to_bits())
        .collect::<HashSet<_>>()
        .len()
}

#[test]
fn concurrent_creates_in_one_list_get_distinct_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.sqlite3");
    let list_id = {
        let conn = open_db(&path).unwrap();
        let list = service(&conn).create_task_list("Shared").unwrap();
        list.id
    };

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let path = path.clone();
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let service = service(&conn);
                for index in 0..20 {
                    service
                        .create_task(&format!("w{worker}-{index}"), list_id)
                        .unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let conn = open_db(&path).unwrap();
    let tasks = service(&conn).tasks(&TaskQuery::default()).unwrap();
    assert_eq!(tasks.len(), 160);
    assert_eq!(distinct_keys(&tasks), 160);
}

#[test]
fn concurrent_moves_to_front_each_land_below_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.sqlite3");
    let ids = {
        let conn = open_db(&path).unwrap();
        let service = service(&conn);
        let list = service.create_task_list("Shared").unwrap();
        let ids = (0..8)
            .map(|index| service.create_task(&format!("t{index}"), list.id).unwrap().id)
            .collect::<Vec<_>>();
        ids
    };

    let workers: Vec<_> = ids
        .iter()
        .copied()
        .map(|id| {
            let path = path.clone();
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let moved = service(&conn).move_task(id, 1).unwrap();
                moved.id
            })
        })
        .collect();
    for (worker, id) in workers.into_iter().zip(&ids) {
        assert_eq!(worker.join().unwrap(), *id);
    }

    let conn = open_db(&path).unwrap();
    let tasks = service(&conn).tasks(&TaskQuery::default()).unwrap();
    assert_eq!(tasks.len(), 8);
    assert_eq!(distinct_keys(&tasks), 8);
    assert!(tasks.iter().all(|task| task.order.value() < 0.0));
}
