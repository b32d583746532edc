// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Reference
//!
//! The `reference` module provides [`Reference`], the stable shareable
//! handle to an actor. A reference enqueues envelopes into the target cell's
//! mailbox; it never blocks and never fails. Once the target has terminated
//! the reference stays valid as an inert handle whose ordinary messages are
//! routed to dead letters.
//!

use crate::{
    Error,
    actor::{Actor, ActorContext, Receive},
    cell::ActorCell,
    message::{AnyMessage, DeadLetter, Envelope, Payload, SystemMessage},
    path::ActorPath,
    props::Props,
    system::SystemShared,
};

use async_trait::async_trait;
use futures::{FutureExt, future::BoxFuture};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use std::{
    fmt::{Debug, Formatter},
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

/// Cell state shared between a cell task and the references pointing at it:
/// whether ordinary messages are still accepted, and the termination signal.
pub(crate) struct CellState {
    accepting: AtomicBool,
    terminated: watch::Sender<bool>,
}

impl CellState {
    pub(crate) fn new() -> Self {
        CellState {
            accepting: AtomicBool::new(true),
            terminated: watch::channel(false).0,
        }
    }

    pub(crate) fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// Stops accepting ordinary messages. Entered once, on `Terminating`.
    pub(crate) fn close(&self) {
        self.accepting.store(false, Ordering::Release);
    }

    /// Resolves the termination signal. The watch makes this idempotent for
    /// observers; the cell only calls it once.
    pub(crate) fn confirm_termination(&self) {
        self.terminated.send_replace(true);
    }

    fn is_terminated(&self) -> bool {
        *self.terminated.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.terminated.subscribe()
    }
}

struct ReferenceInner {
    path: ActorPath,
    sender: mpsc::UnboundedSender<Envelope>,
    state: Arc<CellState>,
    system: Weak<SystemShared>,
}

/// Stable, shareable handle to an actor.
///
/// References are cheap to clone and safe to pass around as message
/// payloads. Equality is identity: two references are equal when they point
/// at the same path (name plus parent chain).
///
/// ```ignore
/// let worker = system.actor_of(props, "worker").await?;
/// worker.tell(DoTheJob);
/// let answer = worker.ask_timeout(HowFar, Duration::from_secs(3)).await?;
/// ```
#[derive(Clone)]
pub struct Reference {
    inner: Arc<ReferenceInner>,
}

/// Monotonic suffix for ask-helper names.
static ASK_SEQ: AtomicU64 = AtomicU64::new(0);

impl Reference {
    /// Starts a new cell for `props` and returns its reference. The cell's
    /// mailbox opens only once `Initialize` arrives from the supervisor.
    pub(crate) fn spawn(props: Props, path: ActorPath, system: Weak<SystemShared>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let state = Arc::new(CellState::new());
        let reference = Reference {
            inner: Arc::new(ReferenceInner {
                path,
                sender,
                state: state.clone(),
                system,
            }),
        };
        let cell = ActorCell::new(props, reference.clone(), state, receiver);
        tokio::spawn(cell.run());
        reference
    }

    /// The actor's path in the supervision tree.
    pub fn path(&self) -> &ActorPath {
        &self.inner.path
    }

    /// Weak handle to the system this reference belongs to.
    pub(crate) fn system_shared(&self) -> Weak<SystemShared> {
        self.inner.system.clone()
    }

    /// The actor's own name, the last path segment.
    pub fn name(&self) -> &str {
        self.inner.path.name()
    }

    /// Sends an ordinary message with no sender attached.
    pub fn tell<M: Payload>(&self, message: M) {
        self.tell_any(AnyMessage::new(message), None);
    }

    /// Sends an ordinary message on behalf of `sender`, so the receiving
    /// actor can reply.
    pub fn tell_from<M: Payload>(&self, message: M, sender: Reference) {
        self.tell_any(AnyMessage::new(message), Some(sender));
    }

    /// Sends an already type-erased message. Use this to forward a message
    /// you received, so it is not wrapped a second time.
    pub fn tell_any(&self, message: AnyMessage, sender: Option<Reference>) {
        // System-control messages always travel the system lane, whatever
        // entry point they came through.
        if let Some(system) = message.downcast_ref::<SystemMessage>() {
            self.tell_system(system.clone());
            return;
        }
        if !self.inner.state.is_accepting() {
            self.dead_letter(sender, message);
            return;
        }
        if let Err(rejected) = self.inner.sender.send(Envelope::user(message, sender)) {
            // The cell shut down between the gate check and the send.
            let envelope = rejected.0;
            if let crate::message::Content::User(message) = envelope.message {
                self.dead_letter(envelope.sender, message);
            }
        }
    }

    /// Sends a system-control message. Always accepted while the cell is
    /// alive, including during termination.
    pub fn tell_system(&self, message: SystemMessage) {
        if self.inner.sender.send(Envelope::system(message, None)).is_err() {
            debug!("System message for {} dropped, cell is gone.", self.path());
        }
    }

    /// Sends `message` and resolves with the first message the target (or
    /// anyone else) sends back.
    ///
    /// A short-lived helper actor, supervised by the target, forwards the
    /// question with itself as the sender and settles the returned future
    /// with whatever it receives next, then stops itself. The future is
    /// unbounded; combine with [`Reference::ask_timeout`] when the target
    /// may never reply.
    pub async fn ask<M: Payload>(&self, message: M) -> Result<AnyMessage, Error> {
        if !self.inner.state.is_accepting() {
            let message = AnyMessage::new(message);
            self.dead_letter(None, message);
            return Err(Error::Ask(format!("{} is terminated", self.path())));
        }

        let (reply_sender, reply_receiver) = oneshot::channel();
        let reply_slot = Mutex::new(Some(reply_sender));
        let props = Props::new(move || {
            Ok(AskSupport {
                reply: reply_slot.lock().ok().and_then(|mut slot| slot.take()),
            })
        });
        let name = format!("ask-{}", ASK_SEQ.fetch_add(1, Ordering::Relaxed));
        let helper = Reference::spawn(
            props,
            self.inner.path.clone() / name.as_str(),
            self.inner.system.clone(),
        );

        helper.tell(AskProtocol {
            destination: self.clone(),
            question: AnyMessage::new(message),
        });
        self.tell_system(SystemMessage::Supervise {
            child: helper,
        });

        reply_receiver
            .await
            .map_err(|_| Error::Ask(format!("{} dropped the reply", self.path())))
    }

    /// [`Reference::ask`] bounded by `timeout`; the in-flight work is not
    /// cancelled, only the caller's wait.
    pub async fn ask_timeout<M: Payload>(
        &self,
        message: M,
        timeout: Duration,
    ) -> Result<AnyMessage, Error> {
        tokio::time::timeout(timeout, self.ask(message))
            .await
            .map_err(|_| Error::AskTimeout)?
    }

    /// Asks the actor to terminate. The returned future resolves once the
    /// actor and, transitively, all of its descendants have terminated.
    pub fn stop(&self) -> BoxFuture<'static, ()> {
        self.tell_system(SystemMessage::Terminate);
        self.when_terminated()
    }

    /// Termination future of this actor. Resolves immediately when the actor
    /// is already terminated.
    pub fn when_terminated(&self) -> BoxFuture<'static, ()> {
        let mut signal = self.inner.state.subscribe();
        async move {
            let _ = signal.wait_for(|terminated| *terminated).await;
        }
        .boxed()
    }

    /// True once the cell has fully terminated.
    pub fn is_terminated(&self) -> bool {
        self.inner.state.is_terminated()
    }

    /// True while the same cell backs both references. Path equality tells
    /// two references name the same identity; this tells they share one
    /// incarnation, which death-watch bookkeeping relies on.
    pub(crate) fn same_cell(&self, other: &Reference) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Routes an undeliverable message to the dead-letter channel on the
    /// event stream. Messages addressed to the event stream itself are
    /// dropped here instead, so dead letters cannot loop.
    pub(crate) fn dead_letter(&self, sender: Option<Reference>, message: AnyMessage) {
        match self.inner.system.upgrade() {
            Some(system) => system.publish_dead_letter(DeadLetter {
                sender,
                recipient: self.clone(),
                message,
            }),
            None => debug!(
                "Dead letter for {} dropped, system is gone: {:?}",
                self.path(),
                message
            ),
        }
    }

    #[cfg(test)]
    pub(crate) fn detached(path: &str) -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let reference = Reference {
            inner: Arc::new(ReferenceInner {
                path: ActorPath::from(path),
                sender,
                state: Arc::new(CellState::new()),
                system: Weak::new(),
            }),
        };
        (reference, receiver)
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.inner.path == other.inner.path
    }
}

impl Eq for Reference {}

impl std::hash::Hash for Reference {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.path.hash(state);
    }
}

impl Debug for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reference({})", self.inner.path)
    }
}

/// First message an ask helper receives: where to send which question.
#[derive(Debug)]
struct AskProtocol {
    destination: Reference,
    question: AnyMessage,
}

/// Short-lived actor backing [`Reference::ask`]. Forwards the question, then
/// settles the caller's future with the next message it receives and stops.
struct AskSupport {
    reply: Option<oneshot::Sender<AnyMessage>>,
}

#[async_trait]
impl Actor for AskSupport {
    async fn receive(
        &mut self,
        message: AnyMessage,
        ctx: &mut ActorContext,
    ) -> Result<Receive, Error> {
        if let Some(ask) = message.downcast_ref::<AskProtocol>() {
            ask.destination
                .tell_any(ask.question.clone(), Some(ctx.identity().clone()));
        } else {
            if let Some(reply) = self.reply.take() {
                let _ = reply.send(message);
            }
            ctx.stop_self();
        }
        Ok(Receive::Handled)
    }
}
