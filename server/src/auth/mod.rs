mod basic;
mod bearer_token;

pub mod jwt;
pub mod session;

use actix_web::HttpRequest;
use anyhow::{bail, Context, Result};
use eventdesk_misc::api;

use crate::authz::Caller;
use crate::context::ServerContext;

use session::RequestSession;

/// Authenticates the request, returning the caller and its session, or an
/// unauthorized response from the enclosing handler.
#[macro_export]
macro_rules! auth_request {
    ($sc:expr, $req:expr) => {
        match $crate::auth::auth_request_raw($sc, &$req) {
            $crate::auth::AuthResult::Ok(caller, session) => (caller, session),
            $crate::auth::AuthResult::Failed(msg) => {
                return eventdesk_misc::api::Response::unauthorized(msg)
            }
        }
    };
}

pub enum AuthResult<'a> {
    Ok(Caller, RequestSession<'a>),
    Failed(String),
}

pub fn auth_request_raw<'a>(sc: &'a ServerContext, req: &HttpRequest) -> AuthResult<'a> {
    let header = match req.headers().get(api::HEADER_AUTHORIZATION) {
        Some(header) => match header.to_str() {
            Ok(s) => s.to_string(),
            Err(_) => return AuthResult::failed("invalid authorization header value"),
        },
        None => return AuthResult::failed("missing authorization"),
    };

    match authenticate(sc, &header) {
        Ok(caller) => AuthResult::Ok(caller, RequestSession::new(sc, header)),
        Err(e) => AuthResult::Failed(format!("{e:#}")),
    }
}

/// Resolves an `Authorization` header value to a caller.
pub fn authenticate(sc: &ServerContext, header: &str) -> Result<Caller> {
    let fields = header.split_whitespace().collect::<Vec<&str>>();
    if fields.len() != 2 {
        bail!("invalid authorization header format");
    }

    let auth = fields[1];
    match fields[0].to_lowercase().as_str() {
        "basic" => basic::auth_basic(sc, auth).context("basic auth failed"),
        "bearer" => bearer_token::auth_bearer_token(sc, auth).context("bearer token auth failed"),
        _ => bail!("unsupported authorization type"),
    }
}

impl AuthResult<'_> {
    fn failed(msg: impl ToString) -> Self {
        Self::Failed(msg.to_string())
    }
}

#[cfg(test)]
pub mod tests {
    use actix_web::test::TestRequest;
    use chrono::Utc;
    use eventdesk_misc::api::user::{PutUserRequest, Role};
    use eventdesk_misc::api::Response;
    use eventdesk_misc::code;

    use crate::db::types::CreateUserParams;

    use super::*;

    pub fn create_test_user(sc: &ServerContext, id: &str, email: &str, password: &str, role: Role) {
        let salt = code::generate_salt(16);
        sc.db
            .with_transaction(|tx| {
                tx.create_user(CreateUserParams {
                    id: String::from(id),
                    user: PutUserRequest {
                        username: String::from(id),
                        email: String::from(email),
                        password: code::hash_password(password, &salt),
                        role: Some(role),
                    },
                    salt,
                    update_time: 0,
                })
            })
            .unwrap();
    }

    /// Authenticates with basic credentials, the way a request would.
    pub fn login<'a>(
        sc: &'a ServerContext,
        email: &str,
        password: &str,
    ) -> (Caller, RequestSession<'a>) {
        let header = format!("Basic {email}:{}", code::base64_encode(password));
        let caller = authenticate(sc, &header).unwrap();
        (caller, RequestSession::new(sc, header))
    }

    /// Seeds one account per role plus a second owner account. Passwords
    /// equal the ids.
    pub fn seed_users(sc: &ServerContext) {
        create_test_user(sc, "tech", "tech@example.com", "tech", Role::Tech);
        create_test_user(sc, "em", "em@example.com", "em", Role::Em);
        create_test_user(sc, "music", "music@example.com", "music", Role::Society);
        create_test_user(sc, "dance", "dance@example.com", "dance", Role::Society);
    }

    fn test_handler(req: HttpRequest, sc: &ServerContext, expect: &Caller) -> Response<()> {
        let (caller, _session) = auth_request!(sc, req);
        assert_eq!(&caller, expect);
        Response::ok()
    }

    fn test_auth(auth: Option<&str>, sc: &ServerContext, expect: &Caller) -> Response<()> {
        let mut req = TestRequest::default();
        if let Some(auth) = auth {
            req = req.insert_header((api::HEADER_AUTHORIZATION, auth));
        }
        test_handler(req.to_http_request(), sc, expect)
    }

    #[test]
    fn test_auth_request() {
        let sc = ServerContext::new_test();
        create_test_user(&sc, "u1", "music@example.com", "test_password", Role::Society);
        let expect = Caller {
            id: String::from("u1"),
            role: Role::Society,
        };

        let basic = format!("Basic music@example.com:{}", code::base64_encode("test_password"));
        assert_eq!(test_auth(Some(basic.as_str()), &sc, &expect).code, 200);

        let lower = format!("basic music@example.com:{}", code::base64_encode("test_password"));
        assert_eq!(test_auth(Some(lower.as_str()), &sc, &expect).code, 200);

        let now = Utc::now().timestamp() as u64;
        let token = sc.jwt_generator.generate_token(&expect, now).unwrap();
        let bearer = format!("Bearer {}", token.token);
        assert_eq!(test_auth(Some(bearer.as_str()), &sc, &expect).code, 200);

        let wrong = format!("Basic music@example.com:{}", code::base64_encode("wrong"));
        let cases = [
            None,
            Some(wrong.as_str()),
            Some("Bearer"),
            Some("Digest abc"),
            Some("Bearer a b"),
        ];
        for auth in cases {
            assert_eq!(test_auth(auth, &sc, &expect).code, 401, "{auth:?}");
        }
    }
}
