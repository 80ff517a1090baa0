use chrono::Utc;
use eventdesk_misc::api::user::TokenResponse;
use eventdesk_misc::api::{EmptyRequest, Response};
use log::{debug, error};

use crate::auth::session::RequestSession;
use crate::authz::Caller;
use crate::context::ServerContext;
use crate::register_handlers;

register_handlers!(get_token);

async fn get_token(
    _req: EmptyRequest,
    caller: Caller,
    _session: &RequestSession<'_>,
    sc: &ServerContext,
) -> Response<TokenResponse> {
    debug!("Generate token for caller: {caller:?}");
    let now = Utc::now().timestamp() as u64;
    match sc.jwt_generator.generate_token(&caller, now) {
        Ok(token) => Response::with_data(token),
        Err(e) => {
            error!("Failed to generate token: {e:#}");
            Response::internal_server_error("failed to generate token")
        }
    }
}

#[cfg(test)]
mod tests {
    use eventdesk_misc::api::user::Role;
    use eventdesk_misc::code;

    use crate::auth::authenticate;
    use crate::auth::tests::create_test_user;

    use super::*;

    #[tokio::test]
    async fn test_get_token() {
        let sc = ServerContext::new_test();
        create_test_user(&sc, "u1", "dance@example.com", "pass", Role::Society);

        let basic = format!("Basic dance@example.com:{}", code::base64_encode("pass"));
        let caller = authenticate(&sc, &basic).unwrap();
        let session = RequestSession::new(&sc, basic);

        let resp = get_token(EmptyRequest, caller.clone(), &session, &sc).await;
        let token = resp.data.unwrap();

        let bearer = format!("Bearer {}", token.token);
        assert_eq!(authenticate(&sc, &bearer).unwrap(), caller);
    }
}
