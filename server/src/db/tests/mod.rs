mod registration;
mod user;

use anyhow::{bail, Result};
use eventdesk_misc::api::user::{PutUserRequest, Role};

use super::types::CreateUserParams;
use super::Database;

pub fn run_tests(db: &Database) {
    user::run_user_tests(db);
    event::run_event_tests(db);
    registration::run_registration_tests(db);

    test_rollback(db);
}

fn test_rollback(db: &Database) {
    let result: Result<()> = db.with_transaction(|tx| {
        tx.create_user(CreateUserParams {
            id: String::from("rollback"),
            user: PutUserRequest {
                username: String::from("none"),
                email: String::from("none@example.com"),
                password: String::from("test123"),
                role: Some(Role::Tech),
            },
            salt: String::from("test_salt"),
            update_time: 50,
        })
        .unwrap();

        bail!("rollback");
    });
    assert!(result.is_err());

    db.with_transaction(|tx| {
        assert!(tx.get_user("rollback")?.is_none());
        Ok(())
    })
    .unwrap();
}
