use chrono::Utc;
use eventdesk_misc::api::{EmptyRequest, HealthResponse, Response};

use crate::auth::session::RequestSession;
use crate::authz::Caller;
use crate::context::ServerContext;
use crate::register_handlers;

register_handlers!(get_healthz);

async fn get_healthz(
    _req: EmptyRequest,
    _caller: Caller,
    _session: &RequestSession<'_>,
    _sc: &ServerContext,
) -> Response<HealthResponse> {
    let now = Utc::now().timestamp() as u64;
    Response::with_data(HealthResponse {
        version: env!("EVENTDESK_VERSION").to_string(),
        timestamp: now,
    })
}
