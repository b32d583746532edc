// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Nexus Actor Runtime
//!
//! An in-process actor-model runtime for building fault-tolerant concurrent
//! state machines in Rust. Actors are isolated units of state that
//! communicate exclusively by asynchronous message passing, organized in a
//! supervision tree that recovers from failures through configurable
//! strategies.
//!
//! ## Overview
//!
//! In response to a message, an actor can:
//! - Update its private internal state
//! - Create child actors it then supervises
//! - Send messages to other actors, including itself
//! - Publish events on the system event stream
//! - Switch the behavior handling its next message
//!
//! Every actor runs inside a *cell*: a task owning the actor instance, a
//! two-lane mailbox and the actor's children. The cell processes one
//! envelope at a time, so handlers never need locks, and system-control
//! messages (supervision, lifecycle) always outrank ordinary messages.
//!
//! ## Getting started
//!
//! ```ignore
//! use actor::{Actor, ActorContext, ActorSystem, AnyMessage, Error, Props, Receive};
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! struct Counter {
//!     value: u64,
//! }
//!
//! #[derive(Debug)]
//! struct Increment(u64);
//!
//! #[derive(Debug)]
//! struct GetValue;
//!
//! #[async_trait]
//! impl Actor for Counter {
//!     async fn receive(
//!         &mut self,
//!         message: AnyMessage,
//!         ctx: &mut ActorContext,
//!     ) -> Result<Receive, Error> {
//!         if let Some(Increment(amount)) = message.downcast_ref() {
//!             self.value += amount;
//!             Ok(Receive::Handled)
//!         } else if message.is::<GetValue>() {
//!             ctx.reply(self.value);
//!             Ok(Receive::Handled)
//!         } else {
//!             Ok(Receive::Unhandled)
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let system = ActorSystem::new("example");
//!     let counter = system
//!         .actor_of(Props::new(|| Ok(Counter { value: 0 })), "counter")
//!         .await?;
//!
//!     counter.tell(Increment(5));
//!     counter.tell(Increment(3));
//!     let value = counter.ask(GetValue).await?;
//!     assert_eq!(value.downcast_ref::<u64>(), Some(&8));
//!
//!     system.terminate();
//!     system.await_termination().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Supervision
//!
//! A failing actor never crashes the process. When `receive` returns an
//! error the cell suspends its subtree and reports the cause to its parent,
//! whose [`SupervisorStrategy`] maps it to a [`Directive`]: resume with
//! state intact, restart from `Props` losing state, stop, or escalate one
//! level further. Construction failures are decided the same way, stopping
//! the child by default.
//!
//! ## Observability
//!
//! Messages that cannot be delivered, or that a behavior declines, are
//! published as [`DeadLetter`]s on the [`EventStream`]; actors log by
//! publishing [`LogEvent`]s the same way, and the built-in logger forwards
//! them to `tracing`. Subscribe with a type or predicate [`Matcher`], as an
//! actor or through a channel/[`Sink`].
//!

// Private modules containing the implementation
mod actor;
mod cell;
mod error;
mod events;
mod fault;
mod logging;
mod mailbox;
mod message;
mod path;
mod props;
mod reference;
mod sink;
mod supervision;
mod system;

//
// Core actor types
//

/// Base trait for all actors: one required `receive` method plus lifecycle
/// hooks and the supervision strategy for the actor's children.
pub use actor::Actor;

/// Capability surface handed to an actor while it processes a message:
/// identity, sender, children, spawning, stopping, behavior switching.
pub use actor::ActorContext;

/// Outcome of one dispatch: handled, or declined and routed to dead
/// letters.
pub use actor::Receive;

/// Name of the behavior every actor starts in.
pub use actor::DEFAULT_BEHAVIOR;

//
// Messaging
//

/// Blanket trait for anything that can travel as a user message.
pub use message::Payload;

/// Type-erased, cheaply clonable user message.
pub use message::AnyMessage;

/// A message in flight: payload, sender and posting time, totally ordered
/// for dispatch.
pub use message::Envelope;

/// What an envelope carries: a system-control or a user message.
pub use message::Content;

/// The closed system-control vocabulary driving the cell state machine.
pub use message::SystemMessage;

/// Auto-received message translating into a self-directed `Terminate`.
pub use message::PoisonPill;

/// A message that could not or would not be delivered.
pub use message::DeadLetter;

//
// Addressing
//

/// Hierarchical actor address inside the supervision tree.
pub use path::ActorPath;

/// Stable, shareable handle to an actor: `tell`, `ask`, `stop`,
/// termination future.
pub use reference::Reference;

/// Immutable actor-construction descriptor, reused across restarts.
pub use props::Props;

//
// Supervision
//

/// Decision for a failed child: resume, restart, stop or escalate.
pub use supervision::Directive;

/// Maps a failure cause to a directive; `None` escalates.
pub use supervision::{Decider, default_decider};

/// Failure-handling policy: one-for-one or all-for-one scope around a
/// decider.
pub use supervision::SupervisorStrategy;

//
// Error handling
//

/// Error type for all runtime operations and failure causes.
pub use error::Error;

//
// Event stream and observability
//

/// Typed handle to the system event stream.
pub use events::EventStream;

/// Subscription filter: by payload type or by predicate.
pub use events::Matcher;

/// Severity of a structured log event.
pub use logging::LogLevel;

/// Structured log record published on the event stream.
pub use logging::LogEvent;

/// Per-actor logging handle.
pub use logging::Log;

/// Bridge pumping event-stream subscriptions into non-actor consumers.
pub use sink::Sink;

/// Consumer side of a [`Sink`].
pub use sink::Subscriber;

//
// System management
//

/// Owning handle to a supervision tree: bootstrap, `actor_of`,
/// termination.
pub use system::ActorSystem;

/// Weak, clonable handle to the system for use inside actors and on other
/// threads.
pub use system::SystemRef;
