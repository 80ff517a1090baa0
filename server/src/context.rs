use std::sync::Arc;

use crate::auth::jwt::{JwtTokenGenerator, JwtTokenValidator};
use crate::authz::{CallerResolver, Evaluator, Policy};
use crate::config::ServerConfig;
use crate::db::Database;

pub struct ServerContext {
    pub db: Database,

    pub jwt_generator: JwtTokenGenerator,
    pub jwt_validator: JwtTokenValidator,

    pub policy: Arc<Policy>,

    pub cfg: ServerConfig,
}

impl ServerContext {
    #[cfg(test)]
    pub fn new_test() -> Self {
        use eventdesk_misc::config::CommonConfig;
        use eventdesk_misc::rsa::TokenKeys;

        let keys = TokenKeys::generate().unwrap();
        let mut cfg = ServerConfig::default();
        cfg.accounts.admin_password = String::from("test_admin_password");
        Self {
            db: Database::new_test(),
            jwt_generator: JwtTokenGenerator::new(&keys.private_pem, 60).unwrap(),
            jwt_validator: JwtTokenValidator::new(&keys.public_pem).unwrap(),
            policy: Arc::new(Policy::standard()),
            cfg,
        }
    }

    /// Binds the shared policy to the session of one request.
    pub fn evaluator<'a>(&'a self, session: &'a dyn CallerResolver) -> Evaluator<'a> {
        Evaluator::new(&self.policy, session)
    }
}
