use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use eventdesk_misc::config::{CommonConfig, PathSet};
use eventdesk_misc::dirs;
use eventdesk_misc::logs::LogsConfig;
use eventdesk_misc::rsa::TokenKeys;
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslFiletype, SslMethod};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{JwtTokenGenerator, JwtTokenValidator};
use crate::authz::Policy;
use crate::context::ServerContext;
use crate::db::config::DbConfig;
use crate::restful::RestfulServer;

/// `server.toml`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "HttpConfig::default")]
    pub http: HttpConfig,

    #[serde(default = "AccountsConfig::default")]
    pub accounts: AccountsConfig,

    #[serde(default = "DbConfig::default")]
    pub db: DbConfig,

    #[serde(default = "LogsConfig::default")]
    pub logs: LogsConfig,

    /// Holds the token signing keys and, with ssl, `cert.pem` and `key.pem`.
    #[serde(skip)]
    pki_dir: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "HttpConfig::default_bind")]
    pub bind: String,

    #[serde(default)]
    pub ssl: bool,

    pub keep_alive_secs: Option<u64>,

    pub workers: Option<u64>,

    #[serde(default = "HttpConfig::default_payload_limit_mib")]
    pub payload_limit_mib: u64,
}

/// Password hashing, session tokens and the bootstrap `admin` account.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccountsConfig {
    /// Required. Only applied when the admin account is created.
    #[serde(default)]
    pub admin_password: String,

    #[serde(default = "AccountsConfig::default_admin_email")]
    pub admin_email: String,

    #[serde(default = "AccountsConfig::default_salt_length")]
    pub salt_length: usize,

    #[serde(default = "AccountsConfig::default_token_expiration_secs")]
    pub token_expiration_secs: u64,
}

impl CommonConfig for ServerConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            accounts: AccountsConfig::default(),
            db: DbConfig::default(),
            logs: LogsConfig::default(),
            pki_dir: PathBuf::new(),
        }
    }

    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        self.http.complete(ps).context("http")?;
        self.accounts.complete(ps).context("accounts")?;
        self.db.complete(ps).context("db")?;
        self.logs.complete(ps).context("logs")?;

        self.pki_dir = ps.config_dir.join("pki");
        dirs::ensure_dir_exists(&self.pki_dir).context("ensure pki dir")?;
        Ok(())
    }
}

impl CommonConfig for HttpConfig {
    fn default() -> Self {
        Self {
            bind: Self::default_bind(),
            ssl: false,
            keep_alive_secs: None,
            workers: None,
            payload_limit_mib: Self::default_payload_limit_mib(),
        }
    }

    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        if self.bind.is_empty() {
            bail!("bind is required");
        }
        if let Some(secs) = self.keep_alive_secs {
            check_range("keep_alive_secs", secs, 1, 60 * 60)?;
        }
        if let Some(workers) = self.workers {
            check_range("workers", workers, 1, 256)?;
        }
        check_range("payload_limit_mib", self.payload_limit_mib, 1, 64)
    }
}

impl HttpConfig {
    fn default_bind() -> String {
        String::from("127.0.0.1:13580")
    }

    fn default_payload_limit_mib() -> u64 {
        2
    }
}

impl CommonConfig for AccountsConfig {
    fn default() -> Self {
        Self {
            admin_password: String::new(),
            admin_email: Self::default_admin_email(),
            salt_length: Self::default_salt_length(),
            token_expiration_secs: Self::default_token_expiration_secs(),
        }
    }

    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        if self.admin_password.is_empty() {
            bail!("admin_password is required");
        }
        if self.admin_password.chars().count() < Self::MIN_ADMIN_PASSWORD_LEN {
            bail!(
                "admin_password must have at least {} characters",
                Self::MIN_ADMIN_PASSWORD_LEN
            );
        }
        if !self.admin_email.contains('@') {
            bail!("admin_email must be an email address");
        }
        check_range("salt_length", self.salt_length, 8, 100)?;
        check_range(
            "token_expiration_secs",
            self.token_expiration_secs,
            60,
            60 * 60 * 24 * 365,
        )
    }
}

impl AccountsConfig {
    const MIN_ADMIN_PASSWORD_LEN: usize = 8;

    fn default_admin_email() -> String {
        String::from("admin@localhost")
    }

    fn default_salt_length() -> usize {
        24
    }

    fn default_token_expiration_secs() -> u64 {
        60 * 60 * 12
    }
}

impl ServerConfig {
    /// Opens the database, loads (or creates) the token keys and installs
    /// the standard role policy.
    pub fn build_ctx(&self) -> Result<Arc<ServerContext>> {
        let db = self.db.build().context("open database")?;

        let keys = TokenKeys::load_or_generate(&self.pki_dir).context("load token keys")?;
        let jwt_generator =
            JwtTokenGenerator::new(&keys.private_pem, self.accounts.token_expiration_secs)
                .context("create token generator")?;
        let jwt_validator =
            JwtTokenValidator::new(&keys.public_pem).context("create token validator")?;

        Ok(Arc::new(ServerContext {
            db,
            jwt_generator,
            jwt_validator,
            policy: Arc::new(Policy::standard()),
            cfg: self.clone(),
        }))
    }

    pub fn build_restful_server(&self, ctx: Arc<ServerContext>) -> Result<RestfulServer> {
        let http = &self.http;
        let mut srv = RestfulServer::new(http.bind.clone(), ctx);
        srv.set_payload_limit_mib(http.payload_limit_mib);
        if let Some(secs) = http.keep_alive_secs {
            srv.set_keep_alive_secs(secs);
        }
        if let Some(workers) = http.workers {
            srv.set_workers(workers);
        }
        if http.ssl {
            srv.set_ssl(self.build_ssl().context("init ssl")?);
        }
        Ok(srv)
    }

    fn build_ssl(&self) -> Result<SslAcceptorBuilder> {
        let mut builder = SslAcceptor::mozilla_intermediate(SslMethod::tls())?;

        let key = self.pki_file("key.pem")?;
        builder
            .set_private_key_file(&key, SslFiletype::PEM)
            .with_context(|| format!("load {}", key.display()))?;

        let cert = self.pki_file("cert.pem")?;
        builder
            .set_certificate_chain_file(&cert)
            .with_context(|| format!("load {}", cert.display()))?;

        Ok(builder)
    }

    fn pki_file(&self, name: &str) -> Result<PathBuf> {
        let path = self.pki_dir.join(name);
        if !path.is_file() {
            bail!("missing {}", path.display());
        }
        Ok(path)
    }
}

fn check_range<T>(name: &str, value: T, min: T, max: T) -> Result<()>
where
    T: PartialOrd + Display,
{
    if value < min || value > max {
        bail!("{name} must be in range [{min}, {max}], found {value}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{env, fs};

    use super::*;

    #[test]
    fn test_server_config() {
        let base = env::temp_dir().join("_eventdesk_test_server_config");
        let _ = fs::remove_dir_all(&base);
        let ps = PathSet::new(Some(base.join("config")), Some(base.join("data"))).unwrap();
        let path = ps.config_dir.join("server.toml");

        let result: Result<ServerConfig> = ps.load_config("server", ServerConfig::default);
        assert!(result.is_err());

        let accounts = "[accounts]\nadmin_password = \"s3cret-admin\"\n";
        fs::write(&path, accounts).unwrap();
        let cfg: ServerConfig = ps.load_config("server", ServerConfig::default).unwrap();
        assert_eq!(cfg.http.bind, "127.0.0.1:13580");
        assert_eq!(cfg.accounts.salt_length, 24);
        assert!(ps.config_dir.join("pki").is_dir());

        fs::write(
            &path,
            format!(
                "{accounts}\n[http]\nbind = \"0.0.0.0:8080\"\nworkers = 4\n\n[db.sqlite]\nmemory = true\n"
            ),
        )
        .unwrap();
        let cfg: ServerConfig = ps.load_config("server", ServerConfig::default).unwrap();
        assert_eq!(cfg.http.bind, "0.0.0.0:8080");
        assert_eq!(cfg.http.workers, Some(4));
        assert_eq!(cfg.accounts.admin_email, "admin@localhost");
        assert!(cfg.db.sqlite.memory);

        let ctx = cfg.build_ctx().unwrap();
        assert!(ps.config_dir.join("pki/token_public.pem").exists());
        assert!(!ctx.policy.entries().is_empty());

        let mut ssl = cfg.clone();
        ssl.http.ssl = true;
        assert!(ssl.build_restful_server(ctx).is_err());

        for bad in [
            "salt_length = 2\n",
            "token_expiration_secs = 1\n",
            "admin_email = \"admin\"\n",
            "[http]\nworkers = 0\n",
            "[http]\nbind = \"\"\n",
        ] {
            fs::write(&path, format!("{accounts}{bad}")).unwrap();
            let result: Result<ServerConfig> = ps.load_config("server", ServerConfig::default);
            assert!(result.is_err(), "{bad}");
        }

        for short in ["", "short"] {
            fs::write(&path, format!("[accounts]\nadmin_password = \"{short}\"\n")).unwrap();
            let result: Result<ServerConfig> = ps.load_config("server", ServerConfig::default);
            assert!(result.is_err(), "{short}");
        }

        fs::remove_dir_all(base).unwrap();
    }
}
