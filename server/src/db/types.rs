use anyhow::Result;
use eventdesk_misc::api::event::{Event, EventBase, EventDetails, GetEventRequest, PutEventRequest};
use eventdesk_misc::api::registration::{GetRegistrationsRequest, Registration};
use eventdesk_misc::api::user::{GetUserRequest, PatchUserRequest, PutUserRequest, Role, User};

pub trait Connection<'a, T>
where
    T: Transaction + 'a,
{
    fn transaction(&'a mut self) -> Result<T>;
}

pub trait Transaction {
    fn create_user(&self, params: CreateUserParams) -> Result<()>;
    fn update_user(&self, patch: PatchUserRequest, update_time: u64) -> Result<()>;
    fn update_user_password(&self, params: UpdatePasswordParams) -> Result<()>;
    fn delete_user(&self, id: &str) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_password(&self, email: &str) -> Result<Option<UserPassword>>;
    fn is_user_conflict(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude_id: Option<&str>,
    ) -> Result<bool>;
    fn count_users(&self, req: GetUserRequest) -> Result<u64>;
    fn get_users(&self, req: GetUserRequest) -> Result<Vec<User>>;

    fn create_event(&self, params: CreateEventParams) -> Result<()>;
    fn update_event(&self, id: &str, base: EventBase, update_time: u64) -> Result<()>;
    fn update_event_details(&self, id: &str, details: EventDetails, update_time: u64)
        -> Result<()>;
    fn delete_event(&self, id: &str) -> Result<()>;
    fn get_event(&self, id: &str) -> Result<Option<Event>>;
    fn is_event_duplicate(&self, base: &EventBase, exclude_id: Option<&str>) -> Result<bool>;
    fn count_events(&self, params: GetEventsParams) -> Result<u64>;
    fn get_events(&self, params: GetEventsParams) -> Result<Vec<Event>>;

    fn create_registration(&self, registration: Registration) -> Result<u64>;
    fn count_registrations(&self, req: GetRegistrationsRequest) -> Result<u64>;
    fn get_registrations(&self, req: GetRegistrationsRequest) -> Result<Vec<Registration>>;

    fn commit(self) -> Result<()>
    where
        Self: Sized;
    fn rollback(self) -> Result<()>
    where
        Self: Sized;
}

/// `user.password` is already hashed with `salt`.
#[derive(Debug, Default)]
pub struct CreateUserParams {
    pub id: String,
    pub user: PutUserRequest,
    pub salt: String,
    pub update_time: u64,
}

#[derive(Debug, Default)]
pub struct UpdatePasswordParams {
    pub id: String,
    pub password: String,
    pub salt: String,
    pub update_time: u64,
}

#[derive(Debug, PartialEq)]
pub struct UserPassword {
    pub id: String,
    pub password: String,
    pub salt: String,
    pub role: Role,
}

#[derive(Debug, Default)]
pub struct CreateEventParams {
    pub id: String,
    pub event: PutEventRequest,
    pub update_time: u64,
}

#[derive(Debug, Default, Clone)]
pub struct GetEventsParams {
    pub req: GetEventRequest,

    /// Restricts the listing to events owned by this account.
    pub owner: Option<String>,
}
