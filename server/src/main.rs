mod auth;
mod authz;
mod config;
mod context;
mod db;
mod handlers;
mod request;
mod restful;

use std::process;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use config::ServerConfig;
use eventdesk_misc::api::user::{PutUserRequest, Role};
use eventdesk_misc::code;
use eventdesk_misc::config::ConfigArgs;
use eventdesk_misc::display;
use log::{error, info, warn};
use uuid::Uuid;

use authz::Policy;
use context::ServerContext;
use db::types::CreateUserParams;

const ADMIN_USERNAME: &str = "admin";

#[derive(Parser, Debug)]
#[command(author, version = env!("EVENTDESK_VERSION"), about)]
struct ServerArgs {
    /// Print server configuration data (JSON) and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Print the role permission matrix (JSON) and exit.
    #[arg(long)]
    pub print_policy: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

async fn run(args: ServerArgs) -> Result<()> {
    if args.print_policy {
        return display::pretty_json(Policy::standard().entries());
    }

    let cfg: ServerConfig = args.config.load("server")?;

    if args.print_config {
        return display::pretty_json(cfg);
    }

    cfg.logs.init("server")?;
    info!(
        "Starting eventdesk server {} ({})",
        env!("EVENTDESK_VERSION"),
        env!("EVENTDESK_TARGET")
    );

    let ctx = cfg.build_ctx()?;
    ensure_admin(&ctx).context("ensure admin user")?;

    let restful_server = cfg.build_restful_server(ctx)?;
    restful_server.run().await.context("run restful server")?;

    info!("Server exited by user");
    Ok(())
}

#[derive(Debug, PartialEq)]
enum AdminState {
    Created,
    Unchanged,
    /// The stored admin credentials no longer match `[accounts]`.
    Stale,
    /// Another account owns `accounts.admin_email`.
    EmailTaken,
}

/// Creates the bootstrap staff account on first start.
fn ensure_admin(sc: &ServerContext) -> Result<AdminState> {
    let accounts = &sc.cfg.accounts;
    let state = sc.db.with_transaction(|tx| {
        if tx.is_user_conflict(Some(ADMIN_USERNAME), None, None)? {
            let matches = match tx.get_user_password(&accounts.admin_email)? {
                Some(up) => {
                    code::hash_password(&accounts.admin_password, &up.salt) == up.password
                }
                None => false,
            };
            return Ok(if matches {
                AdminState::Unchanged
            } else {
                AdminState::Stale
            });
        }

        if tx.is_user_conflict(None, Some(&accounts.admin_email), None)? {
            return Ok(AdminState::EmailTaken);
        }

        let salt = code::generate_salt(accounts.salt_length);
        tx.create_user(CreateUserParams {
            id: Uuid::new_v4().to_string(),
            user: PutUserRequest {
                username: String::from(ADMIN_USERNAME),
                email: accounts.admin_email.clone(),
                password: code::hash_password(&accounts.admin_password, &salt),
                role: Some(Role::Tech),
            },
            salt,
            update_time: Utc::now().timestamp() as u64,
        })?;
        Ok(AdminState::Created)
    })?;

    match state {
        AdminState::Created => info!("Created admin user with email {}", accounts.admin_email),
        AdminState::Unchanged => {}
        AdminState::Stale => warn!(
            "Admin user already exists, accounts.admin_email and accounts.admin_password \
             are only applied on first start; change the password through the api"
        ),
        AdminState::EmailTaken => warn!(
            "Skip creating admin user: email {} is used by another account",
            accounts.admin_email
        ),
    }
    Ok(state)
}

#[tokio::main]
async fn main() {
    let args = ServerArgs::parse();
    match run(args).await {
        Ok(()) => {}
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use eventdesk_misc::api::user::GetUserRequest;

    use crate::auth::authenticate;
    use crate::auth::tests::create_test_user;

    use super::*;

    fn count_users(sc: &ServerContext) -> u64 {
        sc.db
            .with_transaction(|tx| tx.count_users(GetUserRequest::default()))
            .unwrap()
    }

    #[test]
    fn test_ensure_admin() {
        let mut sc = ServerContext::new_test();
        assert_eq!(ensure_admin(&sc).unwrap(), AdminState::Created);
        assert_eq!(ensure_admin(&sc).unwrap(), AdminState::Unchanged);
        assert_eq!(count_users(&sc), 1);

        let header = format!(
            "Basic {}:{}",
            sc.cfg.accounts.admin_email,
            code::base64_encode(&sc.cfg.accounts.admin_password)
        );
        assert_eq!(authenticate(&sc, &header).unwrap().role, Role::Tech);

        sc.cfg.accounts.admin_password = String::from("rotated_password");
        assert_eq!(ensure_admin(&sc).unwrap(), AdminState::Stale);
        assert!(authenticate(&sc, &header).is_ok());
        assert_eq!(count_users(&sc), 1);
    }

    #[test]
    fn test_ensure_admin_email_taken() {
        let sc = ServerContext::new_test();
        let email = sc.cfg.accounts.admin_email.clone();
        create_test_user(&sc, "u1", &email, "test123", Role::Society);

        assert_eq!(ensure_admin(&sc).unwrap(), AdminState::EmailTaken);
        assert_eq!(count_users(&sc), 1);

        let header = format!("Basic {email}:{}", code::base64_encode("test123"));
        assert_eq!(authenticate(&sc, &header).unwrap().role, Role::Society);
    }
}
