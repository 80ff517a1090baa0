use std::collections::HashMap;

use eventdesk_misc::api::user::Role;
use serde::Serialize;

use super::checks;
use super::resource::{Action, EventAction, Events, Resource, UserAction, Users};
use super::{AsyncPredicate, SyncPredicate};

/// How one (role, resource, action) triple is decided.
pub enum PermissionCheck<D> {
    /// Decided without looking at the target data.
    Always(bool),

    /// Decided from the caller and the target data.
    Sync(SyncPredicate<D>),

    /// Decided from the caller, the target data and the live session.
    Async(AsyncPredicate<D>),
}

impl<D> PermissionCheck<D> {
    fn kind(&self) -> CheckKind {
        match self {
            PermissionCheck::Always(true) => CheckKind::Allow,
            PermissionCheck::Always(false) => CheckKind::Deny,
            PermissionCheck::Sync(_) => CheckKind::Sync,
            PermissionCheck::Async(_) => CheckKind::Async,
        }
    }
}

/// The actions one role may take on resource `R`. Actions without an entry
/// are denied.
pub struct Rules<R: Resource> {
    checks: HashMap<R::Action, PermissionCheck<R::Data>>,
}

impl<R: Resource> Default for Rules<R> {
    fn default() -> Self {
        Self {
            checks: HashMap::new(),
        }
    }
}

impl<R: Resource> Rules<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_all() -> Self {
        let mut rules = Self::new();
        for action in R::actions() {
            rules.checks.insert(*action, PermissionCheck::Always(true));
        }
        rules
    }

    pub fn allow(self, action: R::Action) -> Self {
        self.set(action, PermissionCheck::Always(true))
    }

    pub fn deny(self, action: R::Action) -> Self {
        self.set(action, PermissionCheck::Always(false))
    }

    pub fn check(self, action: R::Action, pred: SyncPredicate<R::Data>) -> Self {
        self.set(action, PermissionCheck::Sync(pred))
    }

    pub fn check_async(self, action: R::Action, pred: AsyncPredicate<R::Data>) -> Self {
        self.set(action, PermissionCheck::Async(pred))
    }

    pub fn get(&self, action: R::Action) -> Option<&PermissionCheck<R::Data>> {
        self.checks.get(&action)
    }

    fn set(mut self, action: R::Action, check: PermissionCheck<R::Data>) -> Self {
        self.checks.insert(action, check);
        self
    }
}

/// Everything one role may do, grouped by resource.
#[derive(Default)]
pub struct RolePolicy {
    pub(super) users: Rules<Users>,
    pub(super) events: Rules<Events>,
}

impl RolePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R: Resource>(mut self, rules: Rules<R>) -> Self {
        *R::rules_mut(&mut self) = rules;
        self
    }
}

/// The permission table, built once at startup and shared read-only.
#[derive(Default)]
pub struct Policy {
    roles: HashMap<Role, RolePolicy>,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, role: Role, policy: RolePolicy) -> Self {
        self.roles.insert(role, policy);
        self
    }

    pub fn lookup<R: Resource>(
        &self,
        role: Role,
        action: R::Action,
    ) -> Option<&PermissionCheck<R::Data>> {
        let policy = self.roles.get(&role)?;
        R::rules(policy).get(action)
    }

    /// The table the server runs with.
    ///
    /// - `SOCIETY` owns events: it lists them, edits the details and reads
    ///   the registrations of the events it owns, and changes its own
    ///   password.
    /// - `EM` runs every event and manages `SOCIETY` accounts.
    /// - `TECH` may do anything.
    pub fn standard() -> Self {
        Self::new()
            .role(
                Role::Society,
                RolePolicy::new()
                    .with(
                        Rules::<Users>::new()
                            .check_async(UserAction::UpdatePassword, checks::own_password),
                    )
                    .with(
                        Rules::<Events>::new()
                            .allow(EventAction::List)
                            .check(EventAction::UpdateOwn, checks::owns_event)
                            .check(EventAction::ViewRegistrations, checks::owns_event),
                    ),
            )
            .role(
                Role::Em,
                RolePolicy::new()
                    .with(
                        Rules::<Users>::new()
                            .allow(UserAction::List)
                            .check(UserAction::View, checks::target_is_society)
                            .check(UserAction::Create, checks::target_is_society)
                            .check(UserAction::Update, checks::target_is_society)
                            .check(UserAction::Delete, checks::target_is_society)
                            .check_async(
                                UserAction::UpdatePassword,
                                checks::own_or_society_password,
                            ),
                    )
                    .with(Rules::<Events>::allow_all()),
            )
            .role(
                Role::Tech,
                RolePolicy::new()
                    .with(Rules::<Users>::allow_all())
                    .with(Rules::<Events>::allow_all()),
            )
    }

    /// Flattens the table into one entry per (role, resource, action),
    /// including the triples that have no entry.
    pub fn entries(&self) -> Vec<PolicyEntry> {
        let mut entries = Vec::new();
        for role in Role::ALL {
            self.collect_entries::<Users>(role, &mut entries);
            self.collect_entries::<Events>(role, &mut entries);
        }
        entries
    }

    fn collect_entries<R: Resource>(&self, role: Role, entries: &mut Vec<PolicyEntry>) {
        for action in R::actions() {
            let check = match self.lookup::<R>(role, *action) {
                Some(check) => check.kind(),
                None => CheckKind::Unset,
            };
            entries.push(PolicyEntry {
                role,
                resource: R::NAME,
                action: action.as_str(),
                check,
            });
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Allow,
    Deny,
    Sync,
    Async,
    Unset,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PolicyEntry {
    pub role: Role,
    pub resource: &'static str,
    pub action: &'static str,
    pub check: CheckKind,
}
