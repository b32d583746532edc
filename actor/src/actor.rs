// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Actor
//!
//! The `actor` module provides the [`Actor`] trait implemented by user
//! actors, and [`ActorContext`], the capability surface an actor uses to
//! talk to the runtime: its own identity, the current sender, its children,
//! spawning, stopping and behavior switching.
//!

use crate::{
    Error,
    logging::Log,
    message::{AnyMessage, Payload, SystemMessage},
    props::Props,
    reference::Reference,
    supervision::SupervisorStrategy,
    system::SystemRef,
};

use async_trait::async_trait;
use tracing::debug;

use std::{borrow::Cow, collections::HashMap};

/// Name of the behavior every actor starts in.
pub const DEFAULT_BEHAVIOR: &str = "receive";

/// Outcome of dispatching one message to an actor's behavior.
///
/// Declining a message is not a failure: unhandled messages are routed to
/// dead letters and processing continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receive {
    /// The behavior consumed the message.
    Handled,
    /// The behavior declined the message; it goes to dead letters.
    Unhandled,
}

/// Base trait for all actors.
///
/// An actor is an isolated unit of state processing one message at a time.
/// The only required method is [`Actor::receive`]; lifecycle hooks and the
/// supervision strategy have defaults matching the runtime's conventions.
///
/// ```ignore
/// #[derive(Debug)]
/// struct Counter {
///     value: u64,
/// }
///
/// #[async_trait]
/// impl Actor for Counter {
///     async fn receive(
///         &mut self,
///         message: AnyMessage,
///         ctx: &mut ActorContext,
///     ) -> Result<Receive, Error> {
///         if message.is::<Increment>() {
///             self.value += 1;
///             Ok(Receive::Handled)
///         } else if message.is::<GetValue>() {
///             ctx.reply(self.value);
///             Ok(Receive::Handled)
///         } else {
///             Ok(Receive::Unhandled)
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Actor: Send + 'static {
    /// The active behavior: reacts to one user message.
    ///
    /// Returning `Err` is a processing failure: the cell suspends itself and
    /// its children and escalates the cause to its parent, whose supervision
    /// strategy decides between resume, restart, stop and further
    /// escalation.
    async fn receive(
        &mut self,
        message: AnyMessage,
        ctx: &mut ActorContext,
    ) -> Result<Receive, Error>;

    /// Dispatches a message to a named behavior, selected with
    /// [`ActorContext::become_behavior`]. The default implementation routes every
    /// behavior to [`Actor::receive`]; actors that switch behaviors
    /// override this with their own lookup.
    async fn receive_as(
        &mut self,
        behavior: &str,
        message: AnyMessage,
        ctx: &mut ActorContext,
    ) -> Result<Receive, Error> {
        let _ = behavior;
        self.receive(message, ctx).await
    }

    /// Runs after construction, before the first message. Failing here makes
    /// the construction attempt fail.
    async fn pre_start(&mut self, _ctx: &mut ActorContext) -> Result<(), Error> {
        Ok(())
    }

    /// Runs after the actor stopped processing messages, best-effort:
    /// errors are reported, never fatal.
    async fn post_stop(&mut self, _ctx: &mut ActorContext) -> Result<(), Error> {
        Ok(())
    }

    /// Runs on the old instance before a restart replaces it. The default
    /// terminates all children and runs [`Actor::post_stop`].
    async fn pre_restart(
        &mut self,
        ctx: &mut ActorContext,
        _reason: &Error,
        _message: Option<&AnyMessage>,
    ) -> Result<(), Error> {
        for child in ctx.children() {
            ctx.stop(&child);
        }
        self.post_stop(ctx).await
    }

    /// Runs on the fresh instance after a restart. The default re-runs
    /// [`Actor::pre_start`].
    async fn post_restart(&mut self, ctx: &mut ActorContext, _reason: &Error) -> Result<(), Error> {
        self.pre_start(ctx).await
    }

    /// Supervision strategy applied to this actor's children.
    fn supervisor_strategy(&self) -> SupervisorStrategy {
        SupervisorStrategy::default()
    }
}

/// The runtime capabilities handed to an actor while it processes a message.
///
/// The context carries the current sender explicitly instead of relying on
/// ambient thread-local state, so dispatch stays correct under any task
/// scheduling.
pub struct ActorContext {
    identity: Reference,
    parent: Option<Reference>,
    sender: Option<Reference>,
    children: HashMap<String, Reference>,
    behavior: Cow<'static, str>,
    system: SystemRef,
}

impl ActorContext {
    pub(crate) fn new(identity: Reference, system: SystemRef) -> Self {
        ActorContext {
            identity,
            parent: None,
            sender: None,
            children: HashMap::new(),
            behavior: Cow::Borrowed(DEFAULT_BEHAVIOR),
            system,
        }
    }

    /// This actor's own reference. Messages told to it go through the
    /// regular mailbox, after whatever is already queued.
    pub fn identity(&self) -> &Reference {
        &self.identity
    }

    /// The supervising parent; `None` only for the root guardian.
    pub fn parent(&self) -> Option<&Reference> {
        self.parent.as_ref()
    }

    /// Sender of the message currently being processed, when it carried one.
    pub fn sender(&self) -> Option<&Reference> {
        self.sender.as_ref()
    }

    /// Handle to the actor system.
    pub fn system(&self) -> &SystemRef {
        &self.system
    }

    /// Current children, in no particular order.
    pub fn children(&self) -> Vec<Reference> {
        self.children.values().cloned().collect()
    }

    /// Looks up a child by name.
    pub fn get_child(&self, name: &str) -> Option<Reference> {
        self.children.get(name).cloned()
    }

    /// Creates a child actor under this one. Supervision is established
    /// before the child can process any user message.
    pub fn actor_of(&mut self, props: Props, name: &str) -> Result<Reference, Error> {
        if name.is_empty() || name.contains('/') {
            return Err(Error::InvalidName(name.to_owned()));
        }
        let path = self.identity.path().clone() / name;
        if self.children.contains_key(name) {
            return Err(Error::Exists(path));
        }
        let child = Reference::spawn(props, path, self.system.shared());
        self.children.insert(name.to_owned(), child.clone());
        child.tell_system(SystemMessage::Initialize {
            parent: Some(self.identity.clone()),
        });
        Ok(child)
    }

    /// Sends `message` to `target` with this actor as the sender.
    pub fn tell<M: Payload>(&self, target: &Reference, message: M) {
        target.tell_any(AnyMessage::new(message), Some(self.identity.clone()));
    }

    /// Replies to the sender of the current message, if there is one.
    pub fn reply<M: Payload>(&self, message: M) {
        match &self.sender {
            Some(sender) => {
                sender.tell_any(AnyMessage::new(message), Some(self.identity.clone()));
            }
            None => debug!("Reply from {} dropped, no sender.", self.identity.path()),
        }
    }

    /// Asks `target` to terminate. Termination is asynchronous; observe it
    /// through the target's termination future.
    pub fn stop(&self, target: &Reference) {
        target.tell_system(SystemMessage::Terminate);
    }

    /// Asks this actor itself to terminate after the current message.
    pub fn stop_self(&self) {
        self.identity.tell_system(SystemMessage::Terminate);
    }

    /// Switches the active behavior; subsequent messages dispatch through
    /// [`Actor::receive_as`] with this name.
    pub fn become_behavior(&mut self, behavior: impl Into<Cow<'static, str>>) {
        self.behavior = behavior.into();
    }

    /// Resets the active behavior to [`DEFAULT_BEHAVIOR`].
    pub fn unbecome(&mut self) {
        self.behavior = Cow::Borrowed(DEFAULT_BEHAVIOR);
    }

    /// Name of the active behavior.
    pub fn behavior(&self) -> &str {
        &self.behavior
    }

    /// Structured log handle publishing [`crate::LogEvent`]s on the event
    /// stream; nothing is written synchronously on the message path.
    pub fn log(&self) -> Log {
        Log::new(self.identity.path().clone(), self.system.clone())
    }

    pub(crate) fn set_sender(&mut self, sender: Option<Reference>) {
        self.sender = sender;
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Reference>) {
        self.parent = parent;
    }

    pub(crate) fn register_child(&mut self, child: Reference) {
        self.children.insert(child.name().to_owned(), child);
    }

    pub(crate) fn remove_child(&mut self, child: &Reference) -> bool {
        match self.children.get(child.name()) {
            Some(registered) if registered.same_cell(child) => {
                self.children.remove(child.name());
                true
            }
            _ => false,
        }
    }

    pub(crate) fn is_child(&self, child: &Reference) -> bool {
        self.children
            .get(child.name())
            .is_some_and(|registered| registered.same_cell(child))
    }

    pub(crate) fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}
