use anyhow::Result;
use async_trait::async_trait;

use crate::authz::{Caller, CallerResolver};
use crate::context::ServerContext;

use super::authenticate;

/// The session of one in-flight request. Resolving it authenticates the
/// request credentials again against the current state of the database.
pub struct RequestSession<'a> {
    sc: &'a ServerContext,
    authorization: String,
}

impl<'a> RequestSession<'a> {
    pub fn new(sc: &'a ServerContext, authorization: String) -> Self {
        Self { sc, authorization }
    }
}

#[async_trait]
impl CallerResolver for RequestSession<'_> {
    async fn resolve_current_caller(&self) -> Result<Caller> {
        authenticate(self.sc, &self.authorization)
    }
}

#[cfg(test)]
mod tests {
    use eventdesk_misc::api::user::Role;
    use eventdesk_misc::code;

    use crate::auth::tests::create_test_user;

    use super::*;

    #[tokio::test]
    async fn test_resolve_current_caller() {
        let sc = ServerContext::new_test();
        create_test_user(&sc, "u1", "music@example.com", "test123", Role::Society);

        let header = format!("Basic music@example.com:{}", code::base64_encode("test123"));
        let session = RequestSession::new(&sc, header);
        let caller = session.resolve_current_caller().await.unwrap();
        assert_eq!(caller.id, "u1");

        sc.db.with_transaction(|tx| tx.delete_user("u1")).unwrap();
        assert!(session.resolve_current_caller().await.is_err());
    }
}
