// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Messages
//!
//! The `message` module defines the two message universes of the runtime:
//! the closed set of system-control messages that drive the cell state
//! machine, and the open set of user messages, type-erased behind
//! [`AnyMessage`]. It also defines the [`Envelope`] that carries either kind
//! through a mailbox together with its sender and posting time.
//!

use crate::{Error, Reference};

use std::{
    any::Any,
    cmp::Ordering,
    fmt::{Debug, Formatter},
    sync::Arc,
    time::Instant,
};

/// Marker for values that can travel as user messages: anything `Debug`,
/// thread-safe and `'static`. The implementation is blanket, so every
/// eligible type is a message without further ceremony.
pub trait Payload: Debug + Send + Sync + 'static {
    /// Upcast used by [`AnyMessage`] for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T> Payload for T
where
    T: Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A type-erased, immutable user message.
///
/// Messages are shared behind an `Arc`, so cloning is cheap and the same
/// value can be fanned out to many recipients (the event stream relies on
/// this). Handlers inspect messages with [`AnyMessage::is`] and
/// [`AnyMessage::downcast_ref`]:
///
/// ```ignore
/// if let Some(increment) = message.downcast_ref::<Increment>() {
///     self.counter += increment.0;
/// }
/// ```
///
/// Note: `AnyMessage::new` wraps its argument verbatim. To forward a message
/// you already hold, pass the `AnyMessage` itself (`tell_any`) instead of
/// re-wrapping it.
#[derive(Clone)]
pub struct AnyMessage(Arc<dyn Payload>);

impl AnyMessage {
    /// Erases a concrete message value.
    pub fn new<M: Payload>(message: M) -> Self {
        AnyMessage(Arc::new(message))
    }

    /// True if the carried value is of type `M`.
    pub fn is<M: Payload>(&self) -> bool {
        self.0.as_any().is::<M>()
    }

    /// Borrows the carried value as `M`, if it is one.
    pub fn downcast_ref<M: Payload>(&self) -> Option<&M> {
        self.0.as_any().downcast_ref::<M>()
    }

    /// Type id of the carried value, used by type matchers.
    pub(crate) fn payload_type_id(&self) -> std::any::TypeId {
        self.0.as_any().type_id()
    }
}

impl Debug for AnyMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Auto-received message: delivering it to an actor translates into a
/// self-directed [`SystemMessage::Terminate`]. It travels the user lane, so
/// messages enqueued before the pill are still processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoisonPill;

/// The closed vocabulary of system-control messages.
///
/// System messages always outrank user messages in a mailbox and are never
/// exposed to an actor's `receive`; the cell consumes them exhaustively.
#[derive(Debug, Clone)]
pub enum SystemMessage {
    /// Binds a freshly created cell to its parent, constructs the actor from
    /// its `Props` and opens the mailbox. First message every cell sees.
    Initialize { parent: Option<Reference> },
    /// Registers `child` under this cell and initializes it, establishing
    /// supervision before the child can process any user message.
    Supervise { child: Reference },
    /// Pauses user-lane processing, cascading to children.
    Suspend,
    /// Resumes user-lane processing, cascading to children. On a cell whose
    /// actor never initialized, retries construction instead.
    Resume { cause: Error },
    /// Replaces the actor instance with a fresh one built from the same
    /// `Props`, running the restart hooks.
    Recreate { cause: Error },
    /// Idempotent entry into termination.
    Terminate,
    /// A child reports a failure for the parent's strategy to decide on.
    Failed { child: Reference, cause: Error },
    /// A child signals that it finished terminating.
    DeathWatchNotification { child: Reference },
}

/// What an envelope carries: one of the two message universes.
#[derive(Debug, Clone)]
pub enum Content {
    System(SystemMessage),
    User(AnyMessage),
}

/// A message in flight: the payload, who sent it, and when it was posted.
///
/// Envelopes are totally ordered for dispatch: any system message orders
/// before any user message, and within the same class the posting time
/// decides (FIFO).
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Carried message.
    pub message: Content,
    /// Sending actor, if the message originated inside the system.
    pub sender: Option<Reference>,
    /// Monotonic posting timestamp.
    pub posted_at: Instant,
}

impl Envelope {
    /// Wraps a system message.
    pub fn system(message: SystemMessage, sender: Option<Reference>) -> Self {
        Envelope {
            message: Content::System(message),
            sender,
            posted_at: Instant::now(),
        }
    }

    /// Wraps a user message.
    pub fn user(message: AnyMessage, sender: Option<Reference>) -> Self {
        Envelope {
            message: Content::User(message),
            sender,
            posted_at: Instant::now(),
        }
    }

    /// True for system-control envelopes.
    pub fn is_system(&self) -> bool {
        matches!(self.message, Content::System(_))
    }

    /// Dispatch order: system class first, then posting time.
    pub fn dispatch_order(&self, other: &Envelope) -> Ordering {
        other
            .is_system()
            .cmp(&self.is_system())
            .then(self.posted_at.cmp(&other.posted_at))
    }
}

/// A message that could not or would not be delivered, published on the
/// event stream for observation.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    /// Original sender, when known.
    pub sender: Option<Reference>,
    /// The actor the message was addressed to.
    pub recipient: Reference,
    /// The undelivered message.
    pub message: AnyMessage,
}
