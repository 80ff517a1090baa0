use eventdesk_misc::api::registration::{
    CustomInputValue, GetRegistrationsRequest, Registration, TeamMember,
};
use eventdesk_misc::api::QueryRequest;

use crate::db::Database;

pub fn run_registration_tests(db: &Database) {
    test_create(db);
    test_get(db);
    test_delete_with_event(db);
}

fn registration(event_id: &str, user_id: &str, time: u64) -> Registration {
    Registration {
        id: 0,
        event_id: String::from(event_id),
        user_id: String::from(user_id),
        team_name: format!("team of {user_id}"),
        team_members: vec![TeamMember {
            name: String::from(user_id),
            age: String::from("20"),
            college: String::from("City College"),
            email: format!("{user_id}@example.com"),
            phone: String::new(),
            year_of_passing: String::from("2027"),
        }],
        custom_input_values: vec![CustomInputValue {
            input: 0,
            value: String::from("Rock"),
            file_url: None,
        }],
        registration_time: time,
    }
}

fn test_create(db: &Database) {
    db.with_transaction(|tx| {
        tx.create_registration(registration("e-bands", "p1", 20))?;
        tx.create_registration(registration("e-bands", "p2", 10))?;
        tx.create_registration(registration("e-dance", "p1", 30))?;
        Ok(())
    })
    .unwrap();

    // One registration per participant and event.
    let result = db.with_transaction(|tx| tx.create_registration(registration("e-bands", "p1", 40)));
    assert!(result.is_err());
}

fn test_get(db: &Database) {
    db.with_transaction(|tx| {
        let req = GetRegistrationsRequest {
            event_id: String::from("e-bands"),
            ..Default::default()
        };
        let registrations = tx.get_registrations(req.clone())?;
        assert_eq!(tx.count_registrations(req)?, 2);

        let users: Vec<_> = registrations.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(users, vec!["p2", "p1"]);

        let mut expect = registration("e-bands", "p2", 10);
        expect.id = registrations[0].id;
        assert_eq!(registrations[0], expect);

        let req = GetRegistrationsRequest {
            event_id: String::from("e-bands"),
            query: QueryRequest {
                search: Some(String::from("of p1")),
                ..Default::default()
            },
        };
        assert_eq!(tx.get_registrations(req)?.len(), 1);

        Ok(())
    })
    .unwrap();
}

fn test_delete_with_event(db: &Database) {
    db.with_transaction(|tx| {
        tx.delete_event("e-bands")?;
        let req = GetRegistrationsRequest {
            event_id: String::from("e-bands"),
            ..Default::default()
        };
        assert_eq!(tx.count_registrations(req)?, 0);

        let req = GetRegistrationsRequest {
            event_id: String::from("e-dance"),
            ..Default::default()
        };
        assert_eq!(tx.count_registrations(req)?, 1);
        Ok(())
    })
    .unwrap();
}
