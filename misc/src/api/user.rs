use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::parse_from_map;

use super::{QueryRequest, Request};

pub const GET_TOKEN_PATH: &str = "/v1/token";
pub const USER_PATH: &str = "/v1/user";
pub const USER_PASSWORD_PATH: &str = "/v1/user/password";

/// Authorization class of an account. Every account holds exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Event owner, edits the events it owns.
    #[serde(rename = "SOCIETY")]
    Society,

    /// Event manager, runs events and manages society accounts.
    #[serde(rename = "EM")]
    Em,

    /// Technical staff, full access.
    #[serde(rename = "TECH")]
    Tech,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Society, Role::Em, Role::Tech];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Society => "SOCIETY",
            Role::Em => "EM",
            Role::Tech => "TECH",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SOCIETY" => Ok(Role::Society),
            "EM" => Ok(Role::Em),
            "TECH" => Ok(Role::Tech),
            _ => bail!("unknown role '{s}'"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct User {
    pub id: String,

    pub username: String,

    pub email: String,

    pub role: Role,

    pub update_time: u64,
}

#[derive(Debug, Default)]
pub struct PutUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

impl Request for PutUserRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.username = fields.remove("username").unwrap_or_default();
        if self.username.is_empty() {
            bail!("username is required to put user");
        }
        if !is_valid_name(&self.username) {
            bail!("invalid username");
        }

        self.email = fields.remove("email").unwrap_or_default();
        if !is_valid_email(&self.email) {
            bail!("invalid email");
        }

        self.password = fields.remove("password").unwrap_or_default();
        if self.password.is_empty() {
            bail!("password is required to put user");
        }

        self.role = parse_from_map!(fields, "role");
        if self.role.is_none() {
            bail!("role is required to put user");
        }

        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct GetUserRequest {
    pub id: Option<String>,

    pub role: Option<Role>,

    pub query: QueryRequest,
}

impl Request for GetUserRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.id = fields.remove("id");
        if self.id.is_some() {
            return Ok(());
        }

        self.role = parse_from_map!(fields, "role");
        self.query.complete(fields)?;

        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct PatchUserRequest {
    pub id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl Request for PatchUserRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.id = fields.remove("id").unwrap_or_default();
        if self.id.is_empty() {
            bail!("id is required to patch user");
        }

        self.username = fields.remove("username");
        if let Some(ref username) = self.username {
            if !is_valid_name(username) {
                bail!("invalid username");
            }
        }

        self.email = fields.remove("email");
        if let Some(ref email) = self.email {
            if !is_valid_email(email) {
                bail!("invalid email");
            }
        }

        self.role = parse_from_map!(fields, "role");

        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct PatchPasswordRequest {
    pub id: String,
    pub password: String,
}

impl Request for PatchPasswordRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.id = fields.remove("id").unwrap_or_default();
        if self.id.is_empty() {
            bail!("id is required to update password");
        }

        self.password = fields.remove("password").unwrap_or_default();
        if self.password.is_empty() {
            bail!("password is required to update password");
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DeleteUserRequest {
    pub id: String,
}

impl Request for DeleteUserRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.id = fields.remove("id").unwrap_or_default();
        if self.id.is_empty() {
            bail!("id is required to delete user");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub expire_after: u64,
}

static NAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.-]{2,64}$").unwrap());

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").unwrap());

fn is_valid_name(name: &str) -> bool {
    NAME_REGEX.is_match(name)
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}
