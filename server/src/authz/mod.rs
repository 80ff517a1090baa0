mod checks;
mod policy;
mod resource;

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use eventdesk_misc::api::user::{Role, User};
use thiserror::Error;

pub use policy::{CheckKind, PermissionCheck, Policy, PolicyEntry, RolePolicy, Rules};
pub use resource::{
    Action, EventAction, EventTarget, Events, Resource, UserAction, UserTarget, Users,
};

/// The authenticated identity an operation is performed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub role: Role,
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            role: user.role,
        }
    }
}

/// Supplies the identity behind the in-flight request. Async predicates use
/// it to re-check the caller against the live session instead of trusting
/// the caller value they were handed.
#[async_trait]
pub trait CallerResolver: Send + Sync {
    async fn resolve_current_caller(&self) -> Result<Caller>;
}

pub type CheckFuture<'a> = Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>>;

pub type SyncPredicate<D> = fn(&Caller, &D) -> bool;

pub type AsyncPredicate<D> =
    for<'a> fn(&'a dyn CallerResolver, &'a Caller, &'a D) -> CheckFuture<'a>;

/// Result of [`Evaluator::evaluate`]. Unconditional entries and synchronous
/// predicates are decided immediately, async predicates leave a future.
pub enum Evaluation<'a> {
    Ready(bool),
    Pending(CheckFuture<'a>),
}

impl Evaluation<'_> {
    pub async fn decide(self) -> Result<bool> {
        match self {
            Evaluation::Ready(allowed) => Ok(allowed),
            Evaluation::Pending(fut) => fut.await,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Evaluation::Ready(_))
    }
}

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("{role} is not allowed to {action} {resource}")]
    Denied {
        role: Role,
        resource: &'static str,
        action: &'static str,
    },

    #[error("resolve current caller: {0:#}")]
    Resolve(anyhow::Error),
}

/// Answers permission questions against a policy for one request.
pub struct Evaluator<'a> {
    policy: &'a Policy,
    session: &'a dyn CallerResolver,
}

impl<'a> Evaluator<'a> {
    pub fn new(policy: &'a Policy, session: &'a dyn CallerResolver) -> Self {
        Self { policy, session }
    }

    /// Looks up the check for (caller role, `R`, action). Missing entries
    /// deny, and so does a predicate that is given no target data.
    pub fn evaluate<'b, R: Resource>(
        &'b self,
        caller: &'b Caller,
        action: R::Action,
        data: Option<&'b R::Data>,
    ) -> Evaluation<'b> {
        let check = match self.policy.lookup::<R>(caller.role, action) {
            Some(check) => check,
            None => return Evaluation::Ready(false),
        };

        match (check, data) {
            (PermissionCheck::Always(allowed), _) => Evaluation::Ready(*allowed),
            (PermissionCheck::Sync(pred), Some(data)) => Evaluation::Ready(pred(caller, data)),
            (PermissionCheck::Async(pred), Some(data)) => {
                Evaluation::Pending(pred(self.session, caller, data))
            }
            (_, None) => Evaluation::Ready(false),
        }
    }

    pub async fn has_permission<R: Resource>(
        &self,
        caller: &Caller,
        action: R::Action,
        data: Option<&R::Data>,
    ) -> Result<bool> {
        self.evaluate::<R>(caller, action, data).decide().await
    }

    /// Same as [`Evaluator::has_permission`], with denial turned into an
    /// error handlers can branch on.
    pub async fn authorize<R: Resource>(
        &self,
        caller: &Caller,
        action: R::Action,
        data: Option<&R::Data>,
    ) -> Result<(), AuthzError> {
        match self.has_permission::<R>(caller, action, data).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AuthzError::Denied {
                role: caller.role,
                resource: R::NAME,
                action: action.as_str(),
            }),
            Err(e) => Err(AuthzError::Resolve(e)),
        }
    }
}
