use chrono::Utc;
use eventdesk_misc::api::user::{
    DeleteUserRequest, GetUserRequest, PatchPasswordRequest, PatchUserRequest, PutUserRequest,
    User,
};
use eventdesk_misc::api::{ListResponse, Response};
use eventdesk_misc::code;
use log::{debug, error, info};
use uuid::Uuid;

use crate::auth::session::RequestSession;
use crate::authz::{Caller, UserAction, UserTarget, Users};
use crate::context::ServerContext;
use crate::db::types::{CreateUserParams, UpdatePasswordParams};
use crate::register_handlers;

use super::authz_failed;

register_handlers!(put_user, get_user, patch_user, patch_password, delete_user);

async fn put_user(
    mut req: PutUserRequest,
    caller: Caller,
    session: &RequestSession<'_>,
    sc: &ServerContext,
) -> Response<User> {
    let role = match req.role {
        Some(role) => role,
        None => return Response::bad_request("role is required"),
    };
    let target = UserTarget {
        id: None,
        email: req.email.clone(),
        role,
    };
    let evaluator = sc.evaluator(session);
    if let Err(e) = evaluator
        .authorize::<Users>(&caller, UserAction::Create, Some(&target))
        .await
    {
        return authz_failed(e);
    }
    debug!("Create user {} with role {role}", req.username);

    let result = sc.db.with_transaction(|tx| {
        if tx.is_user_conflict(Some(&req.username), Some(&req.email), None)? {
            return Ok(None);
        }

        let salt = code::generate_salt(sc.cfg.accounts.salt_length);
        req.password = code::hash_password(&req.password, &salt);

        let now = Utc::now().timestamp() as u64;
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: req.username.clone(),
            email: req.email.clone(),
            role,
            update_time: now,
        };
        tx.create_user(CreateUserParams {
            id: user.id.clone(),
            user: req,
            salt,
            update_time: now,
        })?;
        Ok(Some(user))
    });

    match result {
        Ok(Some(user)) => {
            info!("User {} created by {}", user.id, caller.id);
            Response::with_data(user)
        }
        Ok(None) => Response::bad_request("username or email already exists"),
        Err(e) => {
            error!("Failed to create user: {e:#}");
            Response::database_error()
        }
    }
}

async fn get_user(
    req: GetUserRequest,
    caller: Caller,
    session: &RequestSession<'_>,
    sc: &ServerContext,
) -> Response<ListResponse<User>> {
    let evaluator = sc.evaluator(session);

    if let Some(ref id) = req.id {
        let user = match fetch_user(sc, id) {
            Ok(Some(user)) => user,
            Ok(None) => return Response::resource_not_found(),
            Err(resp) => return resp,
        };
        let target = UserTarget::from(&user);
        if let Err(e) = evaluator
            .authorize::<Users>(&caller, UserAction::View, Some(&target))
            .await
        {
            return authz_failed(e);
        }
        return Response::with_data(ListResponse {
            items: vec![user],
            total: 1,
        });
    }

    if let Err(e) = evaluator
        .authorize::<Users>(&caller, UserAction::List, None)
        .await
    {
        return authz_failed(e);
    }
    debug!("List users: {req:?}");

    let result = sc.db.with_transaction(|tx| {
        let total = tx.count_users(req.clone())?;
        let items = tx.get_users(req)?;
        Ok(ListResponse { items, total })
    });

    match result {
        Ok(users) => Response::with_data(users),
        Err(e) => {
            error!("Failed to get users: {e:#}");
            Response::database_error()
        }
    }
}

/// The caller must be allowed to update the account both as stored and as
/// it would look after the patch, so a role change is checked against the
/// new role too.
async fn patch_user(
    req: PatchUserRequest,
    caller: Caller,
    session: &RequestSession<'_>,
    sc: &ServerContext,
) -> Response<()> {
    let stored = match fetch_user(sc, &req.id) {
        Ok(Some(user)) => user,
        Ok(None) => return Response::resource_not_found(),
        Err(resp) => return resp,
    };

    let before = UserTarget::from(&stored);
    let after = UserTarget {
        id: before.id.clone(),
        email: req.email.clone().unwrap_or_else(|| stored.email.clone()),
        role: req.role.unwrap_or(stored.role),
    };
    let evaluator = sc.evaluator(session);
    for target in [&before, &after] {
        if let Err(e) = evaluator
            .authorize::<Users>(&caller, UserAction::Update, Some(target))
            .await
        {
            return authz_failed(e);
        }
    }
    debug!("Patch user: {req:?}");

    let result = sc.db.with_transaction(|tx| {
        let current = match tx.get_user(&req.id)? {
            Some(user) => user,
            None => return Ok(Response::resource_not_found()),
        };
        if current.role != stored.role {
            return Ok(Response::forbidden());
        }

        let username = req.username.as_deref();
        let email = req.email.as_deref();
        if tx.is_user_conflict(username, email, Some(&req.id))? {
            return Ok(Response::bad_request("username or email already exists"));
        }

        let now = Utc::now().timestamp() as u64;
        tx.update_user(req, now)?;
        Ok(Response::ok())
    });

    match result {
        Ok(resp) => resp,
        Err(e) => {
            error!("Failed to patch user: {e:#}");
            Response::database_error()
        }
    }
}

async fn patch_password(
    req: PatchPasswordRequest,
    caller: Caller,
    session: &RequestSession<'_>,
    sc: &ServerContext,
) -> Response<()> {
    let stored = match fetch_user(sc, &req.id) {
        Ok(Some(user)) => user,
        Ok(None) => return Response::resource_not_found(),
        Err(resp) => return resp,
    };

    let target = UserTarget::from(&stored);
    if let Err(e) = sc
        .evaluator(session)
        .authorize::<Users>(&caller, UserAction::UpdatePassword, Some(&target))
        .await
    {
        return authz_failed(e);
    }
    debug!("Update password of user {} by {}", req.id, caller.id);

    let result = sc.db.with_transaction(|tx| {
        let current = match tx.get_user(&req.id)? {
            Some(user) => user,
            None => return Ok(Response::resource_not_found()),
        };
        if current.role != stored.role {
            return Ok(Response::forbidden());
        }

        let salt = code::generate_salt(sc.cfg.accounts.salt_length);
        tx.update_user_password(UpdatePasswordParams {
            password: code::hash_password(&req.password, &salt),
            id: req.id,
            salt,
            update_time: Utc::now().timestamp() as u64,
        })?;
        Ok(Response::ok())
    });

    match result {
        Ok(resp) => resp,
        Err(e) => {
            error!("Failed to update password: {e:#}");
            Response::database_error()
        }
    }
}

async fn delete_user(
    req: DeleteUserRequest,
    caller: Caller,
    session: &RequestSession<'_>,
    sc: &ServerContext,
) -> Response<()> {
    let stored = match fetch_user(sc, &req.id) {
        Ok(Some(user)) => user,
        Ok(None) => return Response::resource_not_found(),
        Err(resp) => return resp,
    };

    let target = UserTarget::from(&stored);
    if let Err(e) = sc
        .evaluator(session)
        .authorize::<Users>(&caller, UserAction::Delete, Some(&target))
        .await
    {
        return authz_failed(e);
    }

    let result = sc.db.with_transaction(|tx| {
        let current = match tx.get_user(&req.id)? {
            Some(user) => user,
            None => return Ok(Response::resource_not_found()),
        };
        if current.role != stored.role {
            return Ok(Response::forbidden());
        }
        tx.delete_user(&req.id)?;
        Ok(Response::ok())
    });

    match result {
        Ok(resp) => {
            if resp.is_ok() {
                info!("User {} deleted by {}", req.id, caller.id);
            }
            resp
        }
        Err(e) => {
            error!("Failed to delete user: {e:#}");
            Response::database_error()
        }
    }
}

fn fetch_user<T>(sc: &ServerContext, id: &str) -> Result<Option<User>, Response<T>>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    sc.db.with_transaction(|tx| tx.get_user(id)).map_err(|e| {
        error!("Failed to get user {id}: {e:#}");
        Response::database_error()
    })
}
