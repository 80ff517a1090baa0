use std::fmt::Debug;
use std::hash::Hash;

use eventdesk_misc::api::event::{Event, EventBase};
use eventdesk_misc::api::user::{Role, User};

use super::policy::{RolePolicy, Rules};

/// A protected resource kind. Each kind has a closed set of actions and one
/// target data shape that its predicates receive.
pub trait Resource: Sized + 'static {
    const NAME: &'static str;

    type Action: Action;

    type Data: Send + Sync;

    fn actions() -> &'static [Self::Action];

    fn rules(role: &RolePolicy) -> &Rules<Self>;

    fn rules_mut(role: &mut RolePolicy) -> &mut Rules<Self>;
}

pub trait Action: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    fn as_str(&self) -> &'static str;
}

pub struct Users;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserAction {
    View,
    Create,
    Update,
    List,
    Delete,
    UpdatePassword,
}

impl Action for UserAction {
    fn as_str(&self) -> &'static str {
        match self {
            UserAction::View => "view",
            UserAction::Create => "create",
            UserAction::Update => "update",
            UserAction::List => "list",
            UserAction::Delete => "delete",
            UserAction::UpdatePassword => "updatePassword",
        }
    }
}

/// The account an operation on `users` is aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTarget {
    /// Absent for accounts that are not created yet.
    pub id: Option<String>,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserTarget {
    fn from(user: &User) -> Self {
        Self {
            id: Some(user.id.clone()),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

impl Resource for Users {
    const NAME: &'static str = "users";

    type Action = UserAction;
    type Data = UserTarget;

    fn actions() -> &'static [UserAction] {
        &[
            UserAction::View,
            UserAction::Create,
            UserAction::Update,
            UserAction::List,
            UserAction::Delete,
            UserAction::UpdatePassword,
        ]
    }

    fn rules(role: &RolePolicy) -> &Rules<Self> {
        &role.users
    }

    fn rules_mut(role: &mut RolePolicy) -> &mut Rules<Self> {
        &mut role.users
    }
}

pub struct Events;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventAction {
    Create,
    Update,
    List,
    Delete,
    UpdateOwn,
    ViewRegistrations,
}

impl Action for EventAction {
    fn as_str(&self) -> &'static str {
        match self {
            EventAction::Create => "create",
            EventAction::Update => "update",
            EventAction::List => "list",
            EventAction::Delete => "delete",
            EventAction::UpdateOwn => "update-own",
            EventAction::ViewRegistrations => "view-registrations",
        }
    }
}

/// The event an operation on `events` is aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTarget {
    pub id: Option<String>,
    pub name: String,
    pub owner: String,
    pub day: u32,
    pub start_time: String,
    pub end_time: String,
}

impl From<&Event> for EventTarget {
    fn from(event: &Event) -> Self {
        Self {
            id: Some(event.id.clone()),
            name: event.name.clone(),
            owner: event.owner.clone(),
            day: event.day,
            start_time: event.start_time.clone(),
            end_time: event.end_time.clone(),
        }
    }
}

impl From<&EventBase> for EventTarget {
    fn from(base: &EventBase) -> Self {
        Self {
            id: None,
            name: base.name.clone(),
            owner: base.owner.clone(),
            day: base.day,
            start_time: base.start_time.clone(),
            end_time: base.end_time.clone(),
        }
    }
}

impl Resource for Events {
    const NAME: &'static str = "events";

    type Action = EventAction;
    type Data = EventTarget;

    fn actions() -> &'static [EventAction] {
        &[
            EventAction::Create,
            EventAction::Update,
            EventAction::List,
            EventAction::Delete,
            EventAction::UpdateOwn,
            EventAction::ViewRegistrations,
        ]
    }

    fn rules(role: &RolePolicy) -> &Rules<Self> {
        &role.events
    }

    fn rules_mut(role: &mut RolePolicy) -> &mut Rules<Self> {
        &mut role.events
    }
}
