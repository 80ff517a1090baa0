use anyhow::{bail, Result};
use chrono::Utc;
use log::error;

use crate::authz::Caller;
use crate::context::ServerContext;

/// Accepts a token only while its account exists and still holds the role
/// the token was issued for.
pub fn auth_bearer_token(sc: &ServerContext, token: &str) -> Result<Caller> {
    let now = Utc::now().timestamp() as u64;
    let caller = sc.jwt_validator.validate_token(token, now)?;

    let user = match sc.db.with_transaction(|tx| tx.get_user(&caller.id)) {
        Ok(user) => user,
        Err(e) => {
            error!("Auth database error: {e:#}");
            bail!("database error");
        }
    };
    let user = match user {
        Some(user) => user,
        None => bail!("user of the token no longer exists"),
    };
    if user.role != caller.role {
        bail!("role of the user has changed, please request a new token");
    }

    Ok(caller)
}
