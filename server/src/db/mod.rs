mod sql;
mod sqlite;

#[cfg(test)]
mod tests;

pub mod config;
pub mod types;

use std::cell::RefCell;
use std::sync::Mutex;

use anyhow::{bail, Result};
use eventdesk_misc::api::event::{Event, EventBase, EventDetails};
use eventdesk_misc::api::registration::{GetRegistrationsRequest, Registration};
use eventdesk_misc::api::user::{GetUserRequest, PatchUserRequest, User};
use sqlite::{SqliteConnection, SqliteTransaction};
use types::{
    Connection, CreateEventParams, CreateUserParams, GetEventsParams, Transaction,
    UpdatePasswordParams, UserPassword,
};

pub struct Database {
    conn: Mutex<RefCell<UnionConnection>>,
}

impl Database {
    pub fn new(conn: UnionConnection) -> Self {
        Self {
            conn: Mutex::new(RefCell::new(conn)),
        }
    }

    #[cfg(test)]
    pub fn new_test() -> Self {
        let conn = SqliteConnection::memory().unwrap();
        Self::new(UnionConnection::Sqlite(conn))
    }

    /// Runs `f` inside one transaction, committed when `f` succeeds and
    /// rolled back otherwise.
    pub fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Transaction) -> Result<T>,
    {
        let conn = match self.conn.lock() {
            Ok(conn) => conn,
            Err(e) => bail!("failed to lock connection: {:#}", e),
        };
        let mut conn = conn.borrow_mut();
        let tx = conn.transaction()?;

        let result = f(&tx);

        if result.is_ok() {
            tx.commit()
        } else {
            tx.rollback()
        }?;

        result
    }
}

pub enum UnionConnection {
    Sqlite(SqliteConnection),
}

pub enum UnionTransaction<'a> {
    Sqlite(SqliteTransaction<'a>),
}

impl<'a> Connection<'a, UnionTransaction<'a>> for UnionConnection {
    fn transaction(&'a mut self) -> Result<UnionTransaction<'a>> {
        match self {
            UnionConnection::Sqlite(conn) => conn.transaction().map(UnionTransaction::Sqlite),
        }
    }
}

impl Transaction for UnionTransaction<'_> {
    fn create_user(&self, params: CreateUserParams) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.create_user(params),
        }
    }

    fn update_user(&self, patch: PatchUserRequest, update_time: u64) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.update_user(patch, update_time),
        }
    }

    fn update_user_password(&self, params: UpdatePasswordParams) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.update_user_password(params),
        }
    }

    fn delete_user(&self, id: &str) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.delete_user(id),
        }
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_user(id),
        }
    }

    fn get_user_password(&self, email: &str) -> Result<Option<UserPassword>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_user_password(email),
        }
    }

    fn is_user_conflict(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude_id: Option<&str>,
    ) -> Result<bool> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.is_user_conflict(username, email, exclude_id),
        }
    }

    fn count_users(&self, req: GetUserRequest) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.count_users(req),
        }
    }

    fn get_users(&self, req: GetUserRequest) -> Result<Vec<User>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_users(req),
        }
    }

    fn create_event(&self, params: CreateEventParams) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.create_event(params),
        }
    }

    fn update_event(&self, id: &str, base: EventBase, update_time: u64) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.update_event(id, base, update_time),
        }
    }

    fn update_event_details(
        &self,
        id: &str,
        details: EventDetails,
        update_time: u64,
    ) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.update_event_details(id, details, update_time),
        }
    }

    fn delete_event(&self, id: &str) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.delete_event(id),
        }
    }

    fn get_event(&self, id: &str) -> Result<Option<Event>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_event(id),
        }
    }

    fn is_event_duplicate(&self, base: &EventBase, exclude_id: Option<&str>) -> Result<bool> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.is_event_duplicate(base, exclude_id),
        }
    }

    fn count_events(&self, params: GetEventsParams) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.count_events(params),
        }
    }

    fn get_events(&self, params: GetEventsParams) -> Result<Vec<Event>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_events(params),
        }
    }

    fn create_registration(&self, registration: Registration) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.create_registration(registration),
        }
    }

    fn count_registrations(&self, req: GetRegistrationsRequest) -> Result<u64> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.count_registrations(req),
        }
    }

    fn get_registrations(&self, req: GetRegistrationsRequest) -> Result<Vec<Registration>> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.get_registrations(req),
        }
    }

    fn commit(self) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.commit(),
        }
    }

    fn rollback(self) -> Result<()> {
        match self {
            UnionTransaction::Sqlite(tx) => tx.rollback(),
        }
    }
}

#[cfg(test)]
mod db_tests {
    use super::*;

    #[test]
    fn test_sqlite() {
        let db = Database::new_test();
        tests::run_tests(&db);
    }
}
