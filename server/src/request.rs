use std::collections::HashMap;

use actix_web::web::Bytes;
use actix_web::HttpRequest;
use anyhow::{bail, Context, Result};
use eventdesk_misc::api::Request;
use log::debug;
use url::form_urlencoded;

#[macro_export]
macro_rules! parse_request {
    ($req:expr, $body:expr) => {
        match $crate::request::parse_request_raw(&$req, $body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return eventdesk_misc::api::Response::bad_request(format!("bad request: {e:#}"))
            }
        }
    };
}

/// Builds `T` from the query string. Requests carrying data take the body
/// as their payload, the others read it as extra form-encoded fields.
pub fn parse_request_raw<T>(req: &HttpRequest, body: Option<Bytes>) -> Result<T>
where
    T: Request,
{
    let mut fields = parse_fields(req.query_string().as_bytes());

    let mut parsed = T::default();
    let body = body.filter(|b| !b.is_empty());
    if !parsed.is_data() {
        if let Some(ref body) = body {
            fields.extend(parse_fields(body));
        }
    }

    // Values are left out, they can carry passwords.
    let mut keys: Vec<&str> = fields.keys().map(|k| k.as_str()).collect();
    keys.sort_unstable();
    debug!(
        "- {} {}, fields: {:?}, peer: {:?}, with_body: {:?}",
        req.method(),
        req.path(),
        keys,
        req.peer_addr(),
        body.is_some()
    );

    parsed.complete(fields).context("parse fields")?;

    if parsed.is_data() {
        match body {
            Some(data) => parsed.set_data(data.to_vec())?,
            None => bail!("data is required"),
        }
    }

    Ok(parsed)
}

fn parse_fields(data: &[u8]) -> HashMap<String, String> {
    form_urlencoded::parse(data)
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
