use chrono::Utc;
use eventdesk_misc::api::event::{
    DeleteEventRequest, Event, GetEventRequest, PatchEventDetailsRequest, PatchEventRequest,
    PutEventRequest,
};
use eventdesk_misc::api::{ListResponse, Response};
use log::{debug, error, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::session::RequestSession;
use crate::authz::{Caller, EventAction, EventTarget, Events};
use crate::context::ServerContext;
use crate::db::types::{CreateEventParams, GetEventsParams};
use crate::register_handlers;

use super::authz_failed;

register_handlers!(
    put_event,
    get_event,
    patch_event,
    patch_event_details,
    delete_event
);

async fn put_event(
    req: PutEventRequest,
    caller: Caller,
    session: &RequestSession<'_>,
    sc: &ServerContext,
) -> Response<Event> {
    let target = EventTarget::from(&req.base);
    if let Err(e) = sc
        .evaluator(session)
        .authorize::<Events>(&caller, EventAction::Create, Some(&target))
        .await
    {
        return authz_failed(e);
    }
    debug!("Create event {} for owner {}", req.base.name, req.base.owner);

    let result = sc.db.with_transaction(|tx| {
        if tx.get_user(&req.base.owner)?.is_none() {
            return Ok(Err("owner not found"));
        }
        if tx.is_event_duplicate(&req.base, None)? {
            return Ok(Err("event already scheduled in this slot"));
        }

        let now = Utc::now().timestamp() as u64;
        let event = Event {
            id: Uuid::new_v4().to_string(),
            name: req.base.name.clone(),
            owner: req.base.owner.clone(),
            day: req.base.day,
            start_time: req.base.start_time.clone(),
            end_time: req.base.end_time.clone(),
            details: req.details.clone(),
            update_time: now,
        };
        tx.create_event(CreateEventParams {
            id: event.id.clone(),
            event: req,
            update_time: now,
        })?;
        Ok(Ok(event))
    });

    match result {
        Ok(Ok(event)) => {
            info!("Event {} created by {}", event.id, caller.id);
            Response::with_data(event)
        }
        Ok(Err(msg)) => Response::bad_request(msg),
        Err(e) => {
            error!("Failed to create event: {e:#}");
            Response::database_error()
        }
    }
}

async fn get_event(
    req: GetEventRequest,
    caller: Caller,
    session: &RequestSession<'_>,
    sc: &ServerContext,
) -> Response<ListResponse<Event>> {
    if let Err(e) = sc
        .evaluator(session)
        .authorize::<Events>(&caller, EventAction::List, None)
        .await
    {
        return authz_failed(e);
    }

    let owner = if req.mine {
        Some(caller.id.clone())
    } else {
        None
    };
    let params = GetEventsParams { req, owner };
    debug!("List events: {params:?}");

    let result = sc.db.with_transaction(|tx| {
        let total = tx.count_events(params.clone())?;
        let items = tx.get_events(params)?;
        Ok(ListResponse { items, total })
    });

    match result {
        Ok(events) => Response::with_data(events),
        Err(e) => {
            error!("Failed to get events: {e:#}");
            Response::database_error()
        }
    }
}

/// Replaces the schedule of an event. Staff only.
async fn patch_event(
    req: PatchEventRequest,
    caller: Caller,
    session: &RequestSession<'_>,
    sc: &ServerContext,
) -> Response<()> {
    let stored = match fetch_event(sc, &req.id) {
        Ok(Some(event)) => event,
        Ok(None) => return Response::resource_not_found(),
        Err(resp) => return resp,
    };

    let target = EventTarget::from(&stored);
    if let Err(e) = sc
        .evaluator(session)
        .authorize::<Events>(&caller, EventAction::Update, Some(&target))
        .await
    {
        return authz_failed(e);
    }
    debug!("Patch event: {req:?}");

    let result = sc.db.with_transaction(|tx| {
        if tx.get_event(&req.id)?.is_none() {
            return Ok(Response::resource_not_found());
        }
        if tx.get_user(&req.base.owner)?.is_none() {
            return Ok(Response::bad_request("owner not found"));
        }
        if tx.is_event_duplicate(&req.base, Some(&req.id))? {
            return Ok(Response::bad_request("event already scheduled in this slot"));
        }

        let now = Utc::now().timestamp() as u64;
        tx.update_event(&req.id, req.base, now)?;
        Ok(Response::ok())
    });

    match result {
        Ok(resp) => resp,
        Err(e) => {
            error!("Failed to patch event: {e:#}");
            Response::database_error()
        }
    }
}

/// Replaces the owner-editable metadata of an event.
async fn patch_event_details(
    req: PatchEventDetailsRequest,
    caller: Caller,
    session: &RequestSession<'_>,
    sc: &ServerContext,
) -> Response<()> {
    let stored = match fetch_event(sc, &req.id) {
        Ok(Some(event)) => event,
        Ok(None) => return Response::resource_not_found(),
        Err(resp) => return resp,
    };

    let target = EventTarget::from(&stored);
    if let Err(e) = sc
        .evaluator(session)
        .authorize::<Events>(&caller, EventAction::UpdateOwn, Some(&target))
        .await
    {
        return authz_failed(e);
    }
    debug!("Patch details of event {} by {}", req.id, caller.id);

    let result = sc.db.with_transaction(|tx| {
        let current = match tx.get_event(&req.id)? {
            Some(event) => event,
            None => return Ok(Response::resource_not_found()),
        };
        if current.owner != stored.owner {
            return Ok(Response::forbidden());
        }

        let now = Utc::now().timestamp() as u64;
        tx.update_event_details(&req.id, req.details, now)?;
        Ok(Response::ok())
    });

    match result {
        Ok(resp) => resp,
        Err(e) => {
            error!("Failed to patch event details: {e:#}");
            Response::database_error()
        }
    }
}

async fn delete_event(
    req: DeleteEventRequest,
    caller: Caller,
    session: &RequestSession<'_>,
    sc: &ServerContext,
) -> Response<()> {
    let stored = match fetch_event(sc, &req.id) {
        Ok(Some(event)) => event,
        Ok(None) => return Response::resource_not_found(),
        Err(resp) => return resp,
    };

    let target = EventTarget::from(&stored);
    if let Err(e) = sc
        .evaluator(session)
        .authorize::<Events>(&caller, EventAction::Delete, Some(&target))
        .await
    {
        return authz_failed(e);
    }

    match sc.db.with_transaction(|tx| tx.delete_event(&req.id)) {
        Ok(()) => {
            info!("Event {} deleted by {}", req.id, caller.id);
            Response::ok()
        }
        Err(e) => {
            error!("Failed to delete event: {e:#}");
            Response::database_error()
        }
    }
}

pub(super) fn fetch_event<T>(sc: &ServerContext, id: &str) -> Result<Option<Event>, Response<T>>
where
    T: Serialize + DeserializeOwned,
{
    sc.db.with_transaction(|tx| tx.get_event(id)).map_err(|e| {
        error!("Failed to get event {id}: {e:#}");
        Response::database_error()
    })
}
