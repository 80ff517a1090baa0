use eventdesk_misc::api::user::{GetUserRequest, PatchUserRequest, PutUserRequest, Role, User};
use eventdesk_misc::api::QueryRequest;

use crate::db::types::{CreateUserParams, UpdatePasswordParams, UserPassword};
use crate::db::Database;

pub fn run_user_tests(db: &Database) {
    test_create(db);
    test_get(db);
    test_conflict(db);
    test_update(db);
    test_delete(db);
}

fn music_user() -> User {
    User {
        id: String::from("u-music"),
        username: String::from("music_club"),
        email: String::from("music@example.com"),
        role: Role::Society,
        update_time: 50,
    }
}

fn staff_user() -> User {
    User {
        id: String::from("u-staff"),
        username: String::from("staff"),
        email: String::from("staff@example.com"),
        role: Role::Em,
        update_time: 100,
    }
}

fn test_create(db: &Database) {
    let users = [
        CreateUserParams {
            id: String::from("u-music"),
            user: PutUserRequest {
                username: String::from("music_club"),
                email: String::from("music@example.com"),
                password: String::from("hashed_music"),
                role: Some(Role::Society),
            },
            salt: String::from("salt_music"),
            update_time: 50,
        },
        CreateUserParams {
            id: String::from("u-staff"),
            user: PutUserRequest {
                username: String::from("staff"),
                email: String::from("staff@example.com"),
                password: String::from("hashed_staff"),
                role: Some(Role::Em),
            },
            salt: String::from("salt_staff"),
            update_time: 100,
        },
    ];

    db.with_transaction(|tx| {
        for user in users {
            tx.create_user(user)?;
        }
        Ok(())
    })
    .unwrap();

    // Usernames are unique.
    let result = db.with_transaction(|tx| {
        tx.create_user(CreateUserParams {
            id: String::from("u-other"),
            user: PutUserRequest {
                username: String::from("staff"),
                email: String::from("other@example.com"),
                password: String::from("x"),
                role: Some(Role::Em),
            },
            salt: String::from("s"),
            update_time: 1,
        })
    });
    assert!(result.is_err());
}

fn test_get(db: &Database) {
    db.with_transaction(|tx| {
        assert_eq!(tx.get_user("u-music")?, Some(music_user()));
        assert_eq!(tx.get_user("u-none")?, None);

        let users = tx.get_users(GetUserRequest::default())?;
        assert_eq!(users, vec![staff_user(), music_user()]);
        assert_eq!(tx.count_users(GetUserRequest::default())?, 2);

        let users = tx.get_users(GetUserRequest {
            query: QueryRequest {
                limit: Some(1),
                offset: Some(1),
                ..Default::default()
            },
            ..Default::default()
        })?;
        assert_eq!(users, vec![music_user()]);

        let req = GetUserRequest {
            role: Some(Role::Society),
            ..Default::default()
        };
        assert_eq!(tx.get_users(req.clone())?, vec![music_user()]);
        assert_eq!(tx.count_users(req)?, 1);

        // Search matches username or email.
        let req = GetUserRequest {
            query: QueryRequest {
                search: Some(String::from("staff@")),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(tx.get_users(req.clone())?, vec![staff_user()]);
        assert_eq!(tx.count_users(req)?, 1);

        let up = tx.get_user_password("music@example.com")?;
        assert_eq!(
            up,
            Some(UserPassword {
                id: String::from("u-music"),
                password: String::from("hashed_music"),
                salt: String::from("salt_music"),
                role: Role::Society,
            })
        );
        assert_eq!(tx.get_user_password("none@example.com")?, None);

        Ok(())
    })
    .unwrap();
}

fn test_conflict(db: &Database) {
    db.with_transaction(|tx| {
        assert!(tx.is_user_conflict(Some("staff"), None, None)?);
        assert!(tx.is_user_conflict(Some("new"), Some("music@example.com"), None)?);
        assert!(!tx.is_user_conflict(Some("new"), Some("new@example.com"), None)?);
        assert!(!tx.is_user_conflict(Some("staff"), Some("staff@example.com"), Some("u-staff"))?);
        assert!(!tx.is_user_conflict(None, None, None)?);
        Ok(())
    })
    .unwrap();
}

fn test_update(db: &Database) {
    db.with_transaction(|tx| {
        tx.update_user(
            PatchUserRequest {
                id: String::from("u-music"),
                email: Some(String::from("band@example.com")),
                role: Some(Role::Em),
                ..Default::default()
            },
            4000,
        )?;

        let expect = User {
            email: String::from("band@example.com"),
            role: Role::Em,
            update_time: 4000,
            ..music_user()
        };
        assert_eq!(tx.get_user("u-music")?, Some(expect));

        tx.update_user_password(UpdatePasswordParams {
            id: String::from("u-staff"),
            password: String::from("new_hash"),
            salt: String::from("new_salt"),
            update_time: 5000,
        })?;

        let up = tx.get_user_password("staff@example.com")?.unwrap();
        assert_eq!(up.password, "new_hash");
        assert_eq!(up.salt, "new_salt");
        assert_eq!(tx.get_user("u-staff")?.unwrap().update_time, 5000);

        Ok(())
    })
    .unwrap();
}

fn test_delete(db: &Database) {
    db.with_transaction(|tx| {
        tx.delete_user("u-music")?;
        assert_eq!(tx.get_user("u-music")?, None);
        assert_eq!(tx.count_users(GetUserRequest::default())?, 1);
        Ok(())
    })
    .unwrap();
}
