//! Core library for the Nexus actor framework.
//! Re-exports the actor runtime: the actor model itself, message passing,
//! supervision, and the event-stream observability surface. Depend on this
//! crate to build actor-based applications without naming the internal
//! workspace members.

pub use actor::{
    Actor, ActorContext, ActorPath, ActorSystem, AnyMessage, Content,
    DEFAULT_BEHAVIOR, DeadLetter, Decider, Directive, Envelope,
    Error as ActorError, EventStream, Log, LogEvent, LogLevel, Matcher,
    Payload, PoisonPill, Props, Receive, Reference, Sink, Subscriber,
    SupervisorStrategy, SystemMessage, SystemRef, default_decider,
};
