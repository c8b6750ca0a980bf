use taskboard_core::db::open_db_in_memory;
use taskboard_core::{SqliteUserRepository, UserRepository, UserService, UserServiceError};
use uuid::Uuid;

#[test]
fn create_user_and_read_back() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());

    let user = service.create_user(" alice ", "s3cret").unwrap();
    assert_eq!(user.username, "alice");

    assert_eq!(service.user(user.id).unwrap(), Some(user.clone()));
    assert_eq!(service.users().unwrap(), vec![user]);
}

#[test]
fn password_is_stored_as_digest() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());

    let user = service.create_user("bob", "hunter2").unwrap();

    let digest = repo.password_digest(user.id).unwrap().unwrap();
    assert_ne!(digest.digest, "hunter2");
    assert!(digest.matches("hunter2"));
}

#[test]
fn missing_user_reads_as_none() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());

    assert!(service.user(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn invalid_input_is_rejected_without_rows() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());

    let err = service.create_user("  ", "pw").unwrap_err();
    assert!(matches!(err, UserServiceError::InvalidUsername));
    let err = service.create_user("carol", "").unwrap_err();
    assert!(matches!(err, UserServiceError::InvalidPassword));
    assert_eq!(err.code(), "INVALID_INPUT");

    assert!(service.users().unwrap().is_empty());
}

#[test]
fn duplicate_username_is_conflict() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());
    service.create_user("dave", "pw").unwrap();
    let other = service.create_user("erin", "pw").unwrap();

    let err = service.create_user("dave", "pw").unwrap_err();
    assert!(matches!(err, UserServiceError::UsernameTaken(ref name) if name == "dave"));
    assert_eq!(err.code(), "CONFLICT");

    let err = service.update_user(other.id, Some("dave")).unwrap_err();
    assert!(matches!(err, UserServiceError::UsernameTaken(_)));
}

#[test]
fn update_user_renames() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());
    let user = service.create_user("frank", "pw").unwrap();

    let renamed = service.update_user(user.id, Some("francis")).unwrap();
    assert_eq!(renamed.username, "francis");
    assert_eq!(service.users().unwrap().len(), 1);

    let unchanged = service.update_user(user.id, None).unwrap();
    assert_eq!(unchanged.username, "francis");
}

#[test]
fn update_missing_user_is_error() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());
    let id = Uuid::new_v4();

    let err = service.update_user(id, Some("ghost")).unwrap_err();
    assert!(matches!(err, UserServiceError::UserNotFound(missing) if missing == id));
    assert_eq!(err.code(), "NOT_FOUND");
}

#[test]
fn delete_user_reports_boolean_outcome() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());
    let user = service.create_user("gina", "pw").unwrap();

    assert!(!service.delete_user(Uuid::new_v4()).unwrap());
    assert_eq!(service.users().unwrap().len(), 1);

    assert!(service.delete_user(user.id).unwrap());
    assert!(service.user(user.id).unwrap().is_none());
}

#[test]
fn change_password_requires_current_password() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());
    let user = service.create_user("hank", "old-pw").unwrap();
    let before = repo.password_digest(user.id).unwrap().unwrap();

    let err = service
        .change_password(user.id, "wrong", "new-pw")
        .unwrap_err();
    assert!(matches!(err, UserServiceError::PasswordMismatch));
    assert_eq!(err.code(), "PASSWORD_MISMATCH");
    assert_eq!(repo.password_digest(user.id).unwrap().unwrap(), before);

    service.change_password(user.id, "old-pw", "new-pw").unwrap();
    let after = repo.password_digest(user.id).unwrap().unwrap();
    assert!(after.matches("new-pw"));
    assert!(!after.matches("old-pw"));
    assert_ne!(after.salt, before.salt);
}

#[test]
fn change_password_rejects_empty_and_missing_user() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());
    let user = service.create_user("ivy", "pw").unwrap();

    let err = service.change_password(user.id, "pw", "").unwrap_err();
    assert!(matches!(err, UserServiceError::InvalidPassword));

    let id = Uuid::new_v4();
    let err = service.change_password(id, "pw", "next").unwrap_err();
    assert!(matches!(err, UserServiceError::UserNotFound(missing) if missing == id));
}
