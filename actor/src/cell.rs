// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Actor cell
//!
//! The `cell` module is the execution engine behind every [`Reference`]:
//! a task owning the actor instance, its mailbox and its children, pumping
//! one envelope at a time through the lifecycle state machine. Because a
//! single task drives the cell, no two envelopes for one actor are ever
//! mid-dispatch concurrently, whatever the number of worker threads.
//!

use crate::{
    actor::{Actor, ActorContext, Receive},
    mailbox::Mailbox,
    message::{AnyMessage, Content, Envelope, PoisonPill, SystemMessage},
    path::ActorPath,
    props::Props,
    reference::{CellState, Reference},
    system::SystemRef,
};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use std::sync::Arc;

/// Lifecycle states of a cell.
///
/// `Terminating` is entered once and is idempotent; `Terminated` is final
/// and resolves the termination signal exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    /// Cell exists, actor not constructed yet; mailbox serves only the
    /// system lane.
    Uninitialized,
    /// Actor constructed, both lanes served.
    Running,
    /// User lane paused by a failure or a `Suspend` from above.
    Suspended,
    /// Waiting for children to terminate; user lane paused for good.
    Terminating,
    /// Fully retired.
    Terminated,
}

/// Per-actor state machine: owns the actor instance, the mailbox, the child
/// set and the termination signal; processes one envelope at a time.
pub(crate) struct ActorCell {
    pub(crate) props: Props,
    pub(crate) actor: Option<Box<dyn Actor>>,
    pub(crate) ctx: ActorContext,
    pub(crate) mailbox: Mailbox,
    receiver: mpsc::UnboundedReceiver<Envelope>,
    pub(crate) state: Arc<CellState>,
    pub(crate) lifecycle: Lifecycle,
}

impl ActorCell {
    pub(crate) fn new(
        props: Props,
        identity: Reference,
        state: Arc<CellState>,
        receiver: mpsc::UnboundedReceiver<Envelope>,
    ) -> Self {
        let system = SystemRef::new(identity.system_shared());
        ActorCell {
            props,
            actor: None,
            ctx: ActorContext::new(identity, system),
            mailbox: Mailbox::suspended(),
            receiver,
            state,
            lifecycle: Lifecycle::Uninitialized,
        }
    }

    pub(crate) fn path(&self) -> ActorPath {
        self.ctx.identity().path().clone()
    }

    /// Drives the cell from creation to retirement.
    ///
    /// Each turn first sweeps everything already queued on the channel into
    /// the two-lane mailbox, so a system message enqueued while user
    /// messages wait is always dispatched before them; then one envelope is
    /// processed to completion. With an empty mailbox the task parks on the
    /// channel.
    pub(crate) async fn run(mut self) {
        debug!("Cell {} started.", self.path());
        loop {
            while let Ok(envelope) = self.receiver.try_recv() {
                self.mailbox.push(envelope);
            }
            if let Some(envelope) = self.mailbox.shift() {
                self.process(envelope).await;
            } else {
                match self.receiver.recv().await {
                    Some(envelope) => self.mailbox.push(envelope),
                    None => break,
                }
            }
            if self.lifecycle == Lifecycle::Terminated {
                break;
            }
        }
        // Late arrivals raced termination: redirect user messages to dead
        // letters, system messages have no cell left to act on.
        self.receiver.close();
        while let Ok(envelope) = self.receiver.try_recv() {
            match envelope.message {
                Content::User(message) => {
                    self.ctx.identity().dead_letter(envelope.sender, message);
                }
                Content::System(message) => {
                    debug!("Cell {} dropped late {:?}.", self.path(), message);
                }
            }
        }
        debug!("Cell {} retired.", self.path());
    }

    /// Classifies one envelope: system-control, auto-received, or user.
    async fn process(&mut self, envelope: Envelope) {
        match envelope.message {
            Content::System(message) => self.handle_system(message).await,
            Content::User(message) => {
                if message.is::<PoisonPill>() {
                    self.ctx.identity().tell_system(SystemMessage::Terminate);
                } else {
                    self.dispatch(message, envelope.sender).await;
                }
            }
        }
    }

    /// Runs one user message through the active behavior.
    async fn dispatch(&mut self, message: AnyMessage, sender: Option<Reference>) {
        let Some(actor) = self.actor.as_mut() else {
            // The mailbox discipline keeps user envelopes away from an
            // actorless cell; late stragglers go to dead letters.
            self.ctx.identity().dead_letter(sender, message);
            return;
        };

        self.ctx.set_sender(sender);
        let behavior = self.ctx.behavior().to_owned();
        let outcome = actor
            .receive_as(&behavior, message.clone(), &mut self.ctx)
            .await;
        let sender = self.ctx.sender().cloned();
        self.ctx.set_sender(None);

        match outcome {
            Ok(Receive::Handled) => {}
            Ok(Receive::Unhandled) => {
                debug!("Message unhandled by {}: {:?}", self.path(), message);
                self.ctx.identity().dead_letter(sender, message);
            }
            Err(cause) => {
                warn!("Actor {} failed processing a message: {}", self.path(), cause);
                self.handle_processing_error(cause);
            }
        }
    }

    /// Pauses the user lane without touching children.
    pub(crate) fn suspend_self(&mut self) {
        if !self.mailbox.is_suspended() {
            debug!("Actor {} suspended.", self.path());
        }
        self.mailbox.suspend();
        if self.lifecycle == Lifecycle::Running {
            self.lifecycle = Lifecycle::Suspended;
        }
    }

    /// Serves the user lane again, unless the cell is already terminating.
    pub(crate) fn resume_self(&mut self) {
        if matches!(self.lifecycle, Lifecycle::Terminating | Lifecycle::Terminated) {
            return;
        }
        self.mailbox.resume();
        if self.lifecycle == Lifecycle::Suspended {
            self.lifecycle = Lifecycle::Running;
        }
    }

    pub(crate) fn suspend_children(&self) {
        for child in self.ctx.children() {
            child.tell_system(SystemMessage::Suspend);
        }
    }

    pub(crate) fn resume_children(&self, cause: &crate::Error) {
        for child in self.ctx.children() {
            child.tell_system(SystemMessage::Resume {
                cause: cause.clone(),
            });
        }
    }
}
