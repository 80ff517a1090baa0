use eventdesk_misc::api::user::Role;

use super::resource::{EventTarget, UserTarget};
use super::{Caller, CallerResolver, CheckFuture};

/// Managers may only act on owner accounts.
pub fn target_is_society(_caller: &Caller, target: &UserTarget) -> bool {
    target.role == Role::Society
}

pub fn owns_event(caller: &Caller, event: &EventTarget) -> bool {
    !caller.id.is_empty() && caller.id == event.owner
}

/// The live session must belong to the caller, and the target must be the
/// caller's own account.
pub fn own_password<'a>(
    session: &'a dyn CallerResolver,
    caller: &'a Caller,
    target: &'a UserTarget,
) -> CheckFuture<'a> {
    Box::pin(async move {
        let current = session.resolve_current_caller().await?;
        if current != *caller {
            return Ok(false);
        }
        Ok(is_self(&current, target))
    })
}

/// Like [`own_password`], but an owner account is also accepted as target.
pub fn own_or_society_password<'a>(
    session: &'a dyn CallerResolver,
    caller: &'a Caller,
    target: &'a UserTarget,
) -> CheckFuture<'a> {
    Box::pin(async move {
        let current = session.resolve_current_caller().await?;
        if current != *caller {
            return Ok(false);
        }
        Ok(is_self(&current, target) || target.role == Role::Society)
    })
}

fn is_self(caller: &Caller, target: &UserTarget) -> bool {
    target.id.as_deref() == Some(caller.id.as_str())
}
