mod event;
mod registration;
mod user;

pub mod config;

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use eventdesk_misc::api::event::{Event, EventBase, EventDetails};
use eventdesk_misc::api::registration::{GetRegistrationsRequest, Registration};
use eventdesk_misc::api::user::{GetUserRequest, PatchUserRequest, User};
use rusqlite::types::{Type, Value as DbValue};
use rusqlite::Connection as RawConnection;
use rusqlite::Transaction as RawTransaction;
use serde::de::DeserializeOwned;

use super::sql::Value;
use super::types::{
    Connection, CreateEventParams, CreateUserParams, GetEventsParams, Transaction,
    UpdatePasswordParams, UserPassword,
};

pub struct SqliteConnection {
    conn: RawConnection,
}

pub struct SqliteTransaction<'a> {
    tx: RawTransaction<'a>,
}

impl SqliteConnection {
    /// Opens the database file, creating it and its tables when missing.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = RawConnection::open(path)
            .with_context(|| format!("open sqlite database {}", path.display()))?;
        Self::init(conn)
    }

    pub fn memory() -> Result<Self> {
        let conn = RawConnection::open_in_memory().context("open in-memory sqlite database")?;
        Self::init(conn)
    }

    fn init(conn: RawConnection) -> Result<Self> {
        user::create_table(&conn).context("create user table")?;
        event::create_table(&conn).context("create event table")?;
        registration::create_table(&conn).context("create registration table")?;
        Ok(Self { conn })
    }
}

impl<'a> Connection<'a, SqliteTransaction<'a>> for SqliteConnection {
    fn transaction(&'a mut self) -> Result<SqliteTransaction<'a>> {
        let tx = self.conn.transaction()?;
        Ok(SqliteTransaction { tx })
    }
}

impl Transaction for SqliteTransaction<'_> {
    fn create_user(&self, params: CreateUserParams) -> Result<()> {
        user::create(&self.tx, params)
    }

    fn update_user(&self, patch: PatchUserRequest, update_time: u64) -> Result<()> {
        user::update(&self.tx, patch, update_time)
    }

    fn update_user_password(&self, params: UpdatePasswordParams) -> Result<()> {
        user::update_password(&self.tx, params)
    }

    fn delete_user(&self, id: &str) -> Result<()> {
        user::delete(&self.tx, id)
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        user::get(&self.tx, id)
    }

    fn get_user_password(&self, email: &str) -> Result<Option<UserPassword>> {
        user::get_password(&self.tx, email)
    }

    fn is_user_conflict(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude_id: Option<&str>,
    ) -> Result<bool> {
        user::is_conflict(&self.tx, username, email, exclude_id)
    }

    fn count_users(&self, req: GetUserRequest) -> Result<u64> {
        user::count_users(&self.tx, req)
    }

    fn get_users(&self, req: GetUserRequest) -> Result<Vec<User>> {
        user::get_users(&self.tx, req)
    }

    fn create_event(&self, params: CreateEventParams) -> Result<()> {
        event::create(&self.tx, params)
    }

    fn update_event(&self, id: &str, base: EventBase, update_time: u64) -> Result<()> {
        event::update_base(&self.tx, id, base, update_time)
    }

    fn update_event_details(
        &self,
        id: &str,
        details: EventDetails,
        update_time: u64,
    ) -> Result<()> {
        event::update_details(&self.tx, id, details, update_time)
    }

    fn delete_event(&self, id: &str) -> Result<()> {
        registration::delete_by_event(&self.tx, id)?;
        event::delete(&self.tx, id)
    }

    fn get_event(&self, id: &str) -> Result<Option<Event>> {
        event::get(&self.tx, id)
    }

    fn is_event_duplicate(&self, base: &EventBase, exclude_id: Option<&str>) -> Result<bool> {
        event::is_duplicate(&self.tx, base, exclude_id)
    }

    fn count_events(&self, params: GetEventsParams) -> Result<u64> {
        event::count_events(&self.tx, params)
    }

    fn get_events(&self, params: GetEventsParams) -> Result<Vec<Event>> {
        event::get_events(&self.tx, params)
    }

    fn create_registration(&self, registration: Registration) -> Result<u64> {
        registration::create(&self.tx, registration)
    }

    fn count_registrations(&self, req: GetRegistrationsRequest) -> Result<u64> {
        registration::count_registrations(&self.tx, req)
    }

    fn get_registrations(&self, req: GetRegistrationsRequest) -> Result<Vec<Registration>> {
        registration::get_registrations(&self.tx, req)
    }

    fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }

    fn rollback(self) -> Result<()> {
        self.tx.rollback()?;
        Ok(())
    }
}

fn convert_values(values: Vec<Value>) -> Vec<DbValue> {
    values
        .into_iter()
        .map(|value| match value {
            Value::Text(s) => DbValue::Text(s),
            Value::Integer(n) => DbValue::Integer(n as i64),
        })
        .collect()
}

/// Parses a text column holding an enum name, such as a role.
fn parse_column<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = anyhow::Error>,
{
    value.parse().map_err(|e: anyhow::Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
    })
}

/// Decodes a text column holding JSON.
fn json_column<T: DeserializeOwned>(idx: usize, value: String) -> rusqlite::Result<T> {
    serde_json::from_str(&value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
