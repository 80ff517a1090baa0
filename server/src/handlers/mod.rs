use actix_web::HttpResponse;
use eventdesk_misc::api::{self, Response};
use log::{debug, error};
use serde::{de::DeserializeOwned, Serialize};

use crate::authz::AuthzError;

pub mod event;
pub mod healthz;
pub mod registration;
pub mod token;
pub mod user;

/// Generates an actix handler `<name>_handler` for every handler function.
/// Each function receives the parsed request, the authenticated caller, the
/// request session and the server context.
#[macro_export]
macro_rules! register_handlers {
    ($handler:ident) => {
        paste::paste! {
            pub async fn [< $handler _handler >](
                req: actix_web::HttpRequest,
                body: Option<actix_web::web::Bytes>,
                sc: actix_web::web::Data<$crate::context::ServerContext>,
            ) -> actix_web::HttpResponse {
                let sc = sc.get_ref();
                let f = || async move {
                    let (caller, session) = $crate::auth_request!(sc, req);
                    let req = $crate::parse_request!(req, body);
                    $handler(req, caller, &session, sc).await
                };
                let resp = f().await;
                $crate::handlers::convert_response(resp)
            }
        }
    };

    ($handler:ident, $($rest:ident),* $(,)?) => {
        $crate::register_handlers!($handler);
        $crate::register_handlers!($($rest),*);
    };
}

pub fn convert_response<T>(resp: Response<T>) -> HttpResponse
where
    T: Serialize + DeserializeOwned,
{
    let mut http_resp = match resp.code {
        api::STATUS_OK => HttpResponse::Ok(),
        api::STATUS_BAD_REQUEST => HttpResponse::BadRequest(),
        api::STATUS_UNAUTHORIZED => HttpResponse::Unauthorized(),
        api::STATUS_FORBIDDEN => HttpResponse::Forbidden(),
        api::STATUS_NOT_FOUND => HttpResponse::NotFound(),
        _ => HttpResponse::InternalServerError(),
    };
    http_resp.json(resp)
}

/// Turns a failed permission check into the response for the caller.
pub fn authz_failed<T>(e: AuthzError) -> Response<T>
where
    T: Serialize + DeserializeOwned,
{
    match e {
        AuthzError::Denied { .. } => {
            debug!("Permission denied: {e}");
            Response::forbidden()
        }
        AuthzError::Resolve(e) => {
            error!("Failed to resolve current caller: {e:#}");
            Response::internal_server_error("failed to resolve current caller")
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;
    use anyhow::anyhow;
    use eventdesk_misc::api::user::Role;

    use super::*;

    #[test]
    fn test_authz_failed() {
        let denied = AuthzError::Denied {
            role: Role::Society,
            resource: "users",
            action: "delete",
        };
        let resp: Response<()> = authz_failed(denied);
        assert_eq!(resp.code, 403);
        assert_eq!(resp.message.as_deref(), Some("Unauthorized"));

        let resp: Response<()> = authz_failed(AuthzError::Resolve(anyhow!("db down")));
        assert_eq!(resp.code, 500);
    }

    #[tokio::test]
    async fn test_convert_response() {
        let resp = convert_response(Response::<()>::forbidden());
        assert_eq!(resp.status().as_u16(), 403);
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(body.as_ref(), br#"{"code":403,"message":"Unauthorized"}"#);

        let resp = convert_response(Response::with_data(String::from("ok")));
        assert_eq!(resp.status().as_u16(), 200);

        let resp = convert_response(Response::<()>::database_error());
        assert_eq!(resp.status().as_u16(), 500);
    }
}
