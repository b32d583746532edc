// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Fault tolerance
//!
//! Reactions of an [`ActorCell`](crate::cell::ActorCell) to the
//! system-control vocabulary: initialization, supervision registration,
//! suspend/resume, recreate, termination, death watch, and the escalation of
//! failures to the parent. Recovery decisions themselves live in
//! [`crate::supervision`]; this module wires them into the cell.
//!

use crate::{
    Error,
    actor::Actor,
    cell::{ActorCell, Lifecycle},
    message::{Content, SystemMessage},
    reference::Reference,
    supervision::SupervisorStrategy,
};

use tracing::{debug, error, warn};

impl ActorCell {
    /// Exhaustive dispatch of the closed system-message vocabulary.
    pub(crate) async fn handle_system(&mut self, message: SystemMessage) {
        match message {
            SystemMessage::Initialize { parent } => self.handle_initialize(parent).await,
            SystemMessage::Supervise { child } => self.handle_supervise(child),
            SystemMessage::Suspend => self.handle_suspend(),
            SystemMessage::Resume { cause } => self.handle_resume(cause).await,
            SystemMessage::Recreate { cause } => self.handle_recreate(cause).await,
            SystemMessage::Terminate => self.handle_terminate().await,
            SystemMessage::Failed { child, cause } => self.handle_failed(child, cause),
            SystemMessage::DeathWatchNotification { child } => {
                self.handle_death_watch(child).await
            }
        }
    }

    /// First contact from the supervisor: record the parent, open the
    /// mailbox and construct the actor. Only valid once.
    async fn handle_initialize(&mut self, parent: Option<Reference>) {
        if self.lifecycle != Lifecycle::Uninitialized {
            debug!("Cell {} ignored a repeated Initialize.", self.path());
            return;
        }
        self.ctx.set_parent(parent);
        self.mailbox.resume();
        match self.construct_actor().await {
            Ok(actor) => {
                self.actor = Some(actor);
                self.lifecycle = Lifecycle::Running;
                debug!("Actor {} initialized.", self.path());
            }
            Err(cause) => {
                // The cell stays actorless; user messages wait until the
                // supervisor retries through Resume or Recreate.
                self.mailbox.suspend();
                self.handle_processing_error(cause);
            }
        }
    }

    /// Registers a new child and initializes it, so supervision is in place
    /// before the child processes any user message.
    fn handle_supervise(&mut self, child: Reference) {
        if let Some(existing) = self.ctx.get_child(child.name()) {
            if !existing.same_cell(&child) {
                warn!(
                    "Cell {} refused to supervise a second {}.",
                    self.path(),
                    child.path()
                );
                child.tell_system(SystemMessage::Initialize {
                    parent: Some(self.ctx.identity().clone()),
                });
                child.tell_system(SystemMessage::Terminate);
            }
            return;
        }
        self.ctx.register_child(child.clone());
        child.tell_system(SystemMessage::Initialize {
            parent: Some(self.ctx.identity().clone()),
        });
        if self.lifecycle == Lifecycle::Terminating {
            // Termination already cascaded; the newcomer joins it so the
            // child count still converges to zero.
            child.tell_system(SystemMessage::Terminate);
        }
    }

    /// Pauses user-lane processing for this cell and its whole subtree.
    fn handle_suspend(&mut self) {
        if matches!(self.lifecycle, Lifecycle::Terminating | Lifecycle::Terminated) {
            return;
        }
        self.suspend_self();
        self.suspend_children();
    }

    /// Resumes this cell and its subtree; on a cell whose actor never came
    /// up, retries construction instead.
    async fn handle_resume(&mut self, cause: Error) {
        if matches!(self.lifecycle, Lifecycle::Terminating | Lifecycle::Terminated) {
            return;
        }
        if self.actor.is_some() {
            self.resume_self();
            self.resume_children(&cause);
        } else {
            self.create_on_failure().await;
        }
    }

    /// Replaces the actor instance with a fresh one from the same props,
    /// running the restart hooks. Accumulated actor state is lost.
    async fn handle_recreate(&mut self, cause: Error) {
        if matches!(self.lifecycle, Lifecycle::Terminating | Lifecycle::Terminated) {
            return;
        }
        let Some(actor) = self.actor.as_mut() else {
            // Never initialized: recreating degrades to the retry path.
            self.create_on_failure().await;
            return;
        };

        if let Err(err) = actor.pre_restart(&mut self.ctx, &cause, None).await {
            warn!("Actor {} pre_restart failed: {}", self.path(), err);
        }
        self.actor = None;

        match self.construct_restarted(&cause).await {
            Ok(actor) => {
                self.actor = Some(actor);
                // The fresh instance starts over in its default behavior.
                self.ctx.unbecome();
                self.resume_self();
                self.resume_children(&cause);
                debug!("Actor {} restarted.", self.path());
            }
            Err(err) => {
                self.mailbox.suspend();
                self.handle_processing_error(err);
            }
        }
    }

    /// Idempotent entry into termination: stop accepting ordinary messages,
    /// cascade Terminate through the subtree, and finalize once no children
    /// remain.
    async fn handle_terminate(&mut self) {
        if matches!(self.lifecycle, Lifecycle::Terminating | Lifecycle::Terminated) {
            return;
        }
        debug!("Actor {} is terminating.", self.path());
        self.lifecycle = Lifecycle::Terminating;
        self.state.close();
        for child in self.ctx.children() {
            child.tell_system(SystemMessage::Terminate);
        }
        self.mailbox.suspend();
        if !self.ctx.has_children() {
            self.finish_terminate().await;
        }
    }

    /// A child finished terminating. Completion of this cell's own
    /// termination is deferred until the child set is empty.
    async fn handle_death_watch(&mut self, child: Reference) {
        if !self.ctx.remove_child(&child) {
            debug!(
                "Cell {} saw a death watch for unknown {}.",
                self.path(),
                child.path()
            );
        }
        if self.lifecycle == Lifecycle::Terminating && !self.ctx.has_children() {
            self.finish_terminate().await;
        }
    }

    /// A registered child failed: the configured strategy decides. When the
    /// strategy declines (Escalate), the failure climbs one level as this
    /// cell's own.
    fn handle_failed(&mut self, child: Reference, cause: Error) {
        if !self.ctx.is_child(&child) {
            debug!(
                "Cell {} ignored a failure from unknown {}.",
                self.path(),
                child.path()
            );
            return;
        }
        let strategy = self
            .actor
            .as_ref()
            .map(|actor| actor.supervisor_strategy())
            .unwrap_or_else(SupervisorStrategy::default);
        let siblings = self.ctx.children();
        if strategy.handle_failure(&cause, &child, &siblings) {
            return;
        }
        match self.ctx.parent().cloned() {
            Some(parent) => {
                self.suspend_self();
                self.suspend_children();
                parent.tell_system(SystemMessage::Failed {
                    child: self.ctx.identity().clone(),
                    cause,
                });
            }
            None => {
                // Nothing above the root guardian: log and stop the
                // affected subtree.
                error!(
                    "Failure of {} unhandled at the root guardian: {}",
                    child.path(),
                    cause
                );
                child.tell_system(SystemMessage::Terminate);
            }
        }
    }

    /// Failure while processing a user message, or a failed construction:
    /// suspend the subtree and hand the cause to the parent. Recovery is
    /// entirely the parent's decision.
    pub(crate) fn handle_processing_error(&mut self, cause: Error) {
        match self.ctx.parent().cloned() {
            Some(parent) => {
                self.suspend_self();
                self.suspend_children();
                parent.tell_system(SystemMessage::Failed {
                    child: self.ctx.identity().clone(),
                    cause,
                });
            }
            None => {
                error!(
                    "Failure at root guardian {} has no supervisor: {}",
                    self.path(),
                    cause
                );
                // A wedged root would never finish terminating the tree.
                if self.actor.is_some() {
                    self.resume_self();
                }
            }
        }
    }

    /// Builds the actor and runs `pre_start`. Any failure counts as a
    /// construction failure.
    async fn construct_actor(&mut self) -> Result<Box<dyn Actor>, Error> {
        let path = self.path();
        let mut actor = self
            .props
            .build()
            .map_err(|err| Error::ActorInitialization(format!("{}: {}", path, err)))?;
        actor
            .pre_start(&mut self.ctx)
            .await
            .map_err(|err| Error::ActorInitialization(format!("{}: {}", path, err)))?;
        Ok(actor)
    }

    /// Builds the replacement instance for a restart and runs
    /// `post_restart` on it.
    async fn construct_restarted(&mut self, cause: &Error) -> Result<Box<dyn Actor>, Error> {
        let path = self.path();
        let mut actor = self
            .props
            .build()
            .map_err(|err| Error::ActorInitialization(format!("{}: {}", path, err)))?;
        actor
            .post_restart(&mut self.ctx, cause)
            .await
            .map_err(|err| Error::ActorInitialization(format!("{}: {}", path, err)))?;
        Ok(actor)
    }

    /// Retry path for a cell whose actor never successfully initialized.
    async fn create_on_failure(&mut self) {
        self.mailbox.resume();
        match self.construct_actor().await {
            Ok(actor) => {
                self.actor = Some(actor);
                self.lifecycle = Lifecycle::Running;
                debug!("Actor {} initialized after retry.", self.path());
            }
            Err(cause) => {
                self.actor = None;
                self.mailbox.suspend();
                self.handle_processing_error(cause);
            }
        }
    }

    /// Last step of termination: best-effort `post_stop`, stranded user
    /// mail to dead letters, notify the parent, resolve the termination
    /// signal.
    async fn finish_terminate(&mut self) {
        if let Some(mut actor) = self.actor.take() {
            if let Err(err) = actor.post_stop(&mut self.ctx).await {
                warn!("Actor {} post_stop failed: {}", self.path(), err);
            }
        }
        for envelope in self.mailbox.drain() {
            if let Content::User(message) = envelope.message {
                self.ctx.identity().dead_letter(envelope.sender, message);
            }
        }
        if let Some(parent) = self.ctx.parent().cloned() {
            parent.tell_system(SystemMessage::DeathWatchNotification {
                child: self.ctx.identity().clone(),
            });
        }
        self.state.confirm_termination();
        self.lifecycle = Lifecycle::Terminated;
        debug!("Actor {} is terminated.", self.path());
    }
}
