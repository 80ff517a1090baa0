use eventdesk_misc::api::registration::{GetRegistrationsRequest, Registration};
use eventdesk_misc::api::{ListResponse, Response};
use log::{debug, error};

use crate::auth::session::RequestSession;
use crate::authz::{Caller, EventAction, EventTarget, Events};
use crate::context::ServerContext;
use crate::register_handlers;

use super::authz_failed;
use super::event::fetch_event;

register_handlers!(get_registrations);

async fn get_registrations(
    req: GetRegistrationsRequest,
    caller: Caller,
    session: &RequestSession<'_>,
    sc: &ServerContext,
) -> Response<ListResponse<Registration>> {
    let event = match fetch_event(sc, &req.event_id) {
        Ok(Some(event)) => event,
        Ok(None) => return Response::resource_not_found(),
        Err(resp) => return resp,
    };

    let target = EventTarget::from(&event);
    if let Err(e) = sc
        .evaluator(session)
        .authorize::<Events>(&caller, EventAction::ViewRegistrations, Some(&target))
        .await
    {
        return authz_failed(e);
    }
    debug!("Get registrations: {req:?}");

    let result = sc.db.with_transaction(|tx| {
        let total = tx.count_registrations(req.clone())?;
        let items = tx.get_registrations(req)?;
        Ok(ListResponse { items, total })
    });

    match result {
        Ok(list) => Response::with_data(list),
        Err(e) => {
            error!("Failed to get registrations: {e:#}");
            Response::database_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use eventdesk_misc::api::registration::TeamMember;

    use crate::auth::tests::{login, seed_users};
    use crate::handlers::event::tests::create_event;

    use super::*;

    fn register(sc: &ServerContext, event_id: &str, user_id: &str) {
        let registration = Registration {
            id: 0,
            event_id: String::from(event_id),
            user_id: String::from(user_id),
            team_name: String::new(),
            team_members: vec![TeamMember {
                name: String::from("Asha"),
                age: String::from("20"),
                college: String::from("City College"),
                email: format!("{user_id}@example.com"),
                phone: String::new(),
                year_of_passing: String::from("2027"),
            }],
            custom_input_values: vec![],
            registration_time: 10,
        };
        sc.db
            .with_transaction(|tx| tx.create_registration(registration))
            .unwrap();
    }

    fn request(event_id: &str) -> GetRegistrationsRequest {
        GetRegistrationsRequest {
            event_id: String::from(event_id),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_registrations() {
        let sc = ServerContext::new_test();
        seed_users(&sc);
        let id = create_event(&sc, "Battle of Bands", "music").await;
        register(&sc, &id, "p1");
        register(&sc, &id, "p2");

        let (music, session) = login(&sc, "music@example.com", "music");
        let resp = get_registrations(request(&id), music, &session, &sc).await;
        let list = resp.data.unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.items[0].team_members[0].college, "City College");

        let (dance, session) = login(&sc, "dance@example.com", "dance");
        let resp = get_registrations(request(&id), dance.clone(), &session, &sc).await;
        assert_eq!(resp.code, 403);
        let resp = get_registrations(request("missing"), dance, &session, &sc).await;
        assert_eq!(resp.code, 404);

        let (em, session) = login(&sc, "em@example.com", "em");
        let resp = get_registrations(request(&id), em, &session, &sc).await;
        assert_eq!(resp.data.unwrap().total, 2);
    }
}
