use anyhow::{bail, Context, Result};
use eventdesk_misc::code;
use log::error;

use crate::authz::Caller;
use crate::context::ServerContext;

/// `auth` is `<email>:<base64(password)>`.
pub fn auth_basic(sc: &ServerContext, auth: &str) -> Result<Caller> {
    let (email, password) = match auth.split_once(':') {
        Some(fields) => fields,
        None => bail!("basic auth missing password"),
    };
    let password = code::base64_decode_string(password).context("decode password base64")?;

    let result = sc.db.with_transaction(|tx| {
        let up = match tx.get_user_password(email)? {
            Some(up) => up,
            None => return Ok(None),
        };
        if code::hash_password(&password, &up.salt) != up.password {
            return Ok(None);
        }
        Ok(Some(Caller {
            id: up.id,
            role: up.role,
        }))
    });
    let caller = match result {
        Ok(caller) => caller,
        Err(e) => {
            error!("Auth database error: {e:#}");
            bail!("database error");
        }
    };
    match caller {
        Some(caller) => Ok(caller),
        None => bail!("incorrect email or password"),
    }
}
