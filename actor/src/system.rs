// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Actor system
//!
//! The `system` module bootstraps the supervision tree and exposes
//! system-wide operations. The tree starts as Root guardian (`/`) with three
//! children: the `user` guardian that parents every application actor, the
//! `event-stream` broadcaster and the `logger` listener.
//!

use crate::{
    Error,
    actor::{Actor, ActorContext, Receive},
    events::{EventStream, EventStreamActor, Publish},
    logging::Logger,
    message::{AnyMessage, DeadLetter, Payload, SystemMessage},
    path::ActorPath,
    props::Props,
    reference::Reference,
    sink::{Sink, Subscriber},
};

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use std::sync::{Arc, OnceLock, Weak};

/// State shared between the owning [`ActorSystem`] and the weak handles held
/// by references and contexts.
pub(crate) struct SystemShared {
    name: String,
    token: CancellationToken,
    event_stream: OnceLock<Reference>,
}

impl SystemShared {
    /// Publishes a dead letter on the event stream, guarding against loops:
    /// letters addressed to the stream itself and letters that already carry
    /// a dead letter are dropped.
    pub(crate) fn publish_dead_letter(&self, dead_letter: DeadLetter) {
        debug!(
            "Dead letter for {}: {:?}",
            dead_letter.recipient.path(),
            dead_letter.message
        );
        if dead_letter.message.is::<DeadLetter>() {
            return;
        }
        match self.event_stream.get() {
            Some(stream) if *stream != dead_letter.recipient => {
                stream.tell(Publish {
                    event: AnyMessage::new(dead_letter),
                });
            }
            _ => {}
        }
    }
}

/// Weak handle to the actor system, cheap to clone and safe to keep inside
/// actors. Operations fail with [`Error::System`] once the owning
/// [`ActorSystem`] has been dropped.
#[derive(Clone)]
pub struct SystemRef {
    shared: Weak<SystemShared>,
}

impl std::fmt::Debug for SystemRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SystemRef")
    }
}

impl SystemRef {
    pub(crate) fn new(shared: Weak<SystemShared>) -> Self {
        SystemRef { shared }
    }

    pub(crate) fn shared(&self) -> Weak<SystemShared> {
        self.shared.clone()
    }

    fn upgrade(&self) -> Result<Arc<SystemShared>, Error> {
        self.shared
            .upgrade()
            .ok_or_else(|| Error::System("actor system has been dropped".to_owned()))
    }

    /// Name the system was created with.
    pub fn name(&self) -> Result<String, Error> {
        Ok(self.upgrade()?.name.clone())
    }

    /// Handle to the system's event stream.
    pub fn event_stream(&self) -> Result<EventStream, Error> {
        let shared = self.upgrade()?;
        shared
            .event_stream
            .get()
            .cloned()
            .map(EventStream::new)
            .ok_or_else(|| Error::System("event stream is not running".to_owned()))
    }

    /// Requests system-wide termination.
    pub fn terminate(&self) {
        if let Ok(shared) = self.upgrade() {
            shared.token.cancel();
        }
    }
}

/// Root guardian: parent of the guardian children, supervisor of last
/// resort. It handles no user messages of its own.
#[derive(Debug, Default)]
struct Root;

#[async_trait::async_trait]
impl Actor for Root {
    async fn receive(
        &mut self,
        _message: AnyMessage,
        _ctx: &mut ActorContext,
    ) -> Result<Receive, Error> {
        Ok(Receive::Unhandled)
    }
}

/// Asks the user guardian to start a top-level actor.
#[derive(Debug, Clone)]
struct CreateActor {
    props: Props,
    name: String,
}

/// Reply to [`CreateActor`].
#[derive(Debug, Clone)]
struct Spawned(Result<Reference, Error>);

/// User guardian: parent of every actor the application starts through
/// [`ActorSystem::actor_of`].
#[derive(Debug, Default)]
struct UserRoot;

#[async_trait::async_trait]
impl Actor for UserRoot {
    async fn receive(
        &mut self,
        message: AnyMessage,
        ctx: &mut ActorContext,
    ) -> Result<Receive, Error> {
        let Some(create) = message.downcast_ref::<CreateActor>() else {
            return Ok(Receive::Unhandled);
        };
        let result = ctx.actor_of(create.props.clone(), &create.name);
        ctx.reply(Spawned(result));
        Ok(Receive::Handled)
    }
}

/// An in-process actor system: the owning handle to a supervision tree.
///
/// ```ignore
/// let system = ActorSystem::new("orders");
/// let manager = system
///     .actor_of(Props::new(|| Ok(Manager::default())), "manager")
///     .await?;
/// manager.tell(Start);
/// system.terminate();
/// system.await_termination().await;
/// ```
///
/// Dropping the `ActorSystem` does not stop running actors, but it does cut
/// the weak handles references hold, so keep it alive for the lifetime of
/// the tree and shut down with [`ActorSystem::terminate`].
pub struct ActorSystem {
    shared: Arc<SystemShared>,
    root: Reference,
    user_root: Reference,
    stream: EventStream,
}

impl ActorSystem {
    /// Bootstraps a system: Root guardian plus the `user`, `event-stream`
    /// and `logger` children. Must be called within a tokio runtime.
    pub fn new(name: &str) -> Self {
        let shared = Arc::new(SystemShared {
            name: name.to_owned(),
            token: CancellationToken::new(),
            event_stream: OnceLock::new(),
        });
        let weak = Arc::downgrade(&shared);

        let root = Reference::spawn(
            Props::new(|| Ok(Root)),
            ActorPath::root(),
            weak.clone(),
        );
        let event_stream = Reference::spawn(
            Props::new(|| Ok(EventStreamActor::default())),
            ActorPath::root() / "event-stream",
            weak.clone(),
        );
        let logger = Reference::spawn(
            Props::new(|| Ok(Logger)),
            ActorPath::root() / "logger",
            weak.clone(),
        );
        let user_root = Reference::spawn(
            Props::new(|| Ok(UserRoot)),
            ActorPath::root() / "user",
            weak,
        );
        let _ = shared.event_stream.set(event_stream.clone());

        root.tell_system(SystemMessage::Initialize { parent: None });
        root.tell_system(SystemMessage::Supervise {
            child: event_stream.clone(),
        });
        root.tell_system(SystemMessage::Supervise { child: logger });
        root.tell_system(SystemMessage::Supervise {
            child: user_root.clone(),
        });

        let token = shared.token.clone();
        let terminator = root.clone();
        tokio::spawn(async move {
            token.cancelled().await;
            debug!("Stopping actor system...");
            terminator.tell_system(SystemMessage::Terminate);
        });

        ActorSystem {
            shared,
            root,
            user_root,
            stream: EventStream::new(event_stream),
        }
    }

    /// Name of this system.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Starts a top-level actor under the user guardian. Fails with
    /// [`Error::Exists`] when the name is already taken.
    pub async fn actor_of(&self, props: Props, name: &str) -> Result<Reference, Error> {
        let reply = self.user_root.ask(CreateActor {
            props,
            name: name.to_owned(),
        });
        match reply.await?.downcast_ref::<Spawned>() {
            Some(Spawned(result)) => result.clone(),
            None => Err(Error::Ask("unexpected reply to CreateActor".to_owned())),
        }
    }

    /// Handle to the event stream.
    pub fn event_stream(&self) -> EventStream {
        self.stream.clone()
    }

    /// Weak handle usable from non-actor code and other threads.
    pub fn system_ref(&self) -> SystemRef {
        SystemRef::new(Arc::downgrade(&self.shared))
    }

    /// Spawns a [`Sink`] pumping every event of type `M` into `subscriber`.
    pub fn run_sink<M: Payload>(&self, subscriber: impl Subscriber) {
        let receiver = self.stream.subscribe_channel::<M>();
        let mut sink = Sink::new(receiver, subscriber);
        tokio::spawn(async move {
            sink.run().await;
        });
    }

    /// Requests graceful termination of the whole tree.
    pub fn terminate(&self) {
        self.shared.token.cancel();
    }

    /// Resolves once the root guardian, and transitively every actor, has
    /// terminated.
    pub fn when_terminated(&self) -> BoxFuture<'static, ()> {
        self.root.when_terminated()
    }

    /// Blocks the caller until the whole tree is torn down.
    pub async fn await_termination(&self) {
        self.root.when_terminated().await;
        debug!("Actor system `{}` has been terminated.", self.name());
    }

    /// True once the tree is fully terminated.
    pub fn is_terminated(&self) -> bool {
        self.root.is_terminated()
    }
}
