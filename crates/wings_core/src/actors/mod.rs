//! Middleware-style actor chain consuming the persister.
//!
//! # Responsibility
//! - Carry one request's change set, persister handle, acting user and raw
//!   attributes through an ordered list of actors.
//! - Let each actor forward to the next stage or short-circuit.
//!
//! # Invariants
//! - Actors run in registration order; the terminal actor runs last.
//! - A short-circuited `create`/`update` yields `Ok(None)`, a short-circuited
//!   `destroy` yields `Ok(false)`.
//! - The persister is a service the chain calls; it never drives the chain.

use crate::adapter::{AdapterError, Persister};
use crate::model::resource::{Attributes, Resource};
use std::collections::BTreeSet;
use thiserror::Error;

mod depositor;
mod model_actor;

pub use depositor::{ApplyDepositorActor, DEPOSITOR_ATTRIBUTE};
pub use model_actor::ModelActor;

pub type ActorResult<T> = Result<T, ActorError>;

#[derive(Debug, Error)]
pub enum ActorError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Acting user for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_key: String,
}

impl CurrentUser {
    pub fn new(user_key: impl Into<String>) -> Self {
        Self {
            user_key: user_key.into(),
        }
    }
}

/// Pending edits to one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    resource: Resource,
    changed: BTreeSet<String>,
}

impl ChangeSet {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            changed: BTreeSet::new(),
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Copies `attributes` onto the resource, recording names whose values
    /// actually differ.
    pub fn apply(&mut self, attributes: &Attributes) {
        for (name, values) in attributes {
            if self.resource.get(name) != values.as_slice() {
                self.resource.set(name.clone(), values.clone());
                self.changed.insert(name.clone());
            }
        }
    }

    pub fn is_changed(&self, name: &str) -> bool {
        self.changed.contains(name)
    }

    pub fn changed_attributes(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }

    /// Resource with every applied change.
    pub fn sync(&self) -> Resource {
        self.resource.clone()
    }
}

/// Everything an actor sees for one request.
pub struct Environment<'a> {
    pub change_set: ChangeSet,
    pub persister: &'a Persister,
    pub current_user: CurrentUser,
    pub attributes: Attributes,
}

impl<'a> Environment<'a> {
    pub fn new(
        change_set: ChangeSet,
        persister: &'a Persister,
        current_user: CurrentUser,
        attributes: Attributes,
    ) -> Self {
        Self {
            change_set,
            persister,
            current_user,
            attributes,
        }
    }
}

/// One middleware stage. Default methods forward unchanged.
pub trait Actor {
    fn name(&self) -> &'static str;

    fn create(&self, env: &mut Environment<'_>, next: Next<'_>) -> ActorResult<Option<Resource>> {
        next.create(env)
    }

    fn update(&self, env: &mut Environment<'_>, next: Next<'_>) -> ActorResult<Option<Resource>> {
        next.update(env)
    }

    fn destroy(&self, env: &mut Environment<'_>, next: Next<'_>) -> ActorResult<bool> {
        next.destroy(env)
    }
}

/// Last stage of a stack; has no successor.
pub trait TerminalActor {
    fn create(&self, env: &mut Environment<'_>) -> ActorResult<Option<Resource>>;
    fn update(&self, env: &mut Environment<'_>) -> ActorResult<Option<Resource>>;
    fn destroy(&self, env: &mut Environment<'_>) -> ActorResult<bool>;
}

/// Handle to the rest of the chain after the current actor.
pub struct Next<'s> {
    rest: &'s [Box<dyn Actor>],
    terminal: &'s dyn TerminalActor,
}

impl<'s> Next<'s> {
    fn split(&self) -> Option<(&'s dyn Actor, Next<'s>)> {
        let (head, tail) = self.rest.split_first()?;
        Some((
            head.as_ref(),
            Next {
                rest: tail,
                terminal: self.terminal,
            },
        ))
    }

    pub fn create(self, env: &mut Environment<'_>) -> ActorResult<Option<Resource>> {
        match self.split() {
            Some((actor, next)) => actor.create(env, next),
            None => self.terminal.create(env),
        }
    }

    pub fn update(self, env: &mut Environment<'_>) -> ActorResult<Option<Resource>> {
        match self.split() {
            Some((actor, next)) => actor.update(env, next),
            None => self.terminal.update(env),
        }
    }

    pub fn destroy(self, env: &mut Environment<'_>) -> ActorResult<bool> {
        match self.split() {
            Some((actor, next)) => actor.destroy(env, next),
            None => self.terminal.destroy(env),
        }
    }
}

/// Ordered middlewares in front of a terminal actor.
pub struct ActorStack {
    middlewares: Vec<Box<dyn Actor>>,
    terminal: Box<dyn TerminalActor>,
}

impl ActorStack {
    pub fn new(terminal: impl TerminalActor + 'static) -> Self {
        Self {
            middlewares: Vec::new(),
            terminal: Box::new(terminal),
        }
    }

    /// Appends `actor`; it runs after every actor added before it.
    pub fn use_actor(mut self, actor: impl Actor + 'static) -> Self {
        self.middlewares.push(Box::new(actor));
        self
    }

    pub fn actor_names(&self) -> Vec<&'static str> {
        self.middlewares.iter().map(|actor| actor.name()).collect()
    }

    pub fn create(&self, env: &mut Environment<'_>) -> ActorResult<Option<Resource>> {
        self.head().create(env)
    }

    pub fn update(&self, env: &mut Environment<'_>) -> ActorResult<Option<Resource>> {
        self.head().update(env)
    }

    pub fn destroy(&self, env: &mut Environment<'_>) -> ActorResult<bool> {
        self.head().destroy(env)
    }

    fn head(&self) -> Next<'_> {
        Next {
            rest: &self.middlewares,
            terminal: self.terminal.as_ref(),
        }
    }
}
