// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Event stream
//!
//! A pattern-matched broadcaster: subscribers register a [`Matcher`] and
//! receive every published event it matches, at most once per event even
//! when several of their matchers match. The stream is itself an actor under
//! the root guardian; dead letters and log events travel through it.
//!
//! ```ignore
//! let stream = system.event_stream();
//! stream.subscribe::<DeadLetter>(&probe);
//! stream.publish(Heartbeat);
//! ```
//!

use crate::{
    Error,
    actor::{Actor, ActorContext, Receive},
    message::{AnyMessage, Payload},
    reference::Reference,
};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use std::{
    any::TypeId,
    fmt::{Debug, Formatter},
    sync::Arc,
};

/// Decides whether a published event is delivered to a subscription.
#[derive(Clone)]
pub struct Matcher(MatcherKind);

#[derive(Clone)]
enum MatcherKind {
    Type(TypeId),
    Predicate(Arc<dyn Fn(&AnyMessage) -> bool + Send + Sync>),
}

impl Matcher {
    /// Matches events carrying a value of type `M`.
    pub fn of<M: Payload>() -> Self {
        Matcher(MatcherKind::Type(TypeId::of::<M>()))
    }

    /// Matches events satisfying `predicate`.
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&AnyMessage) -> bool + Send + Sync + 'static,
    {
        Matcher(MatcherKind::Predicate(Arc::new(predicate)))
    }

    fn matches(&self, event: &AnyMessage) -> bool {
        match &self.0 {
            MatcherKind::Type(id) => event.payload_type_id() == *id,
            MatcherKind::Predicate(predicate) => predicate(event),
        }
    }
}

impl Debug for Matcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            MatcherKind::Type(id) => write!(f, "Matcher::Type({:?})", id),
            MatcherKind::Predicate(_) => write!(f, "Matcher::Predicate"),
        }
    }
}

/// Where matched events are delivered.
#[derive(Clone)]
pub(crate) enum SubscriberTarget {
    /// Told to an actor like any other message.
    Actor(Reference),
    /// Pushed into a channel, for consumers outside the actor tree.
    Channel(mpsc::UnboundedSender<AnyMessage>),
}

impl SubscriberTarget {
    /// Identity used for at-most-once delivery per event.
    fn same_subscriber(&self, other: &SubscriberTarget) -> bool {
        match (self, other) {
            (SubscriberTarget::Actor(a), SubscriberTarget::Actor(b)) => a == b,
            (SubscriberTarget::Channel(a), SubscriberTarget::Channel(b)) => a.same_channel(b),
            _ => false,
        }
    }
}

impl Debug for SubscriberTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriberTarget::Actor(reference) => write!(f, "Actor({})", reference.path()),
            SubscriberTarget::Channel(_) => write!(f, "Channel"),
        }
    }
}

/// Bus protocol: register a subscription.
#[derive(Debug, Clone)]
pub(crate) struct Subscribe {
    pub matcher: Matcher,
    pub target: SubscriberTarget,
}

/// Bus protocol: drop every subscription of an actor.
#[derive(Debug, Clone)]
pub(crate) struct Unsubscribe {
    pub subscriber: Reference,
}

/// Bus protocol: broadcast an event to matching subscribers.
#[derive(Debug, Clone)]
pub(crate) struct Publish {
    pub event: AnyMessage,
}

/// The broadcaster actor behind the stream handle.
#[derive(Debug, Default)]
pub(crate) struct EventStreamActor {
    subscriptions: Vec<(Matcher, SubscriberTarget)>,
}

impl EventStreamActor {
    fn publish(&mut self, event: &AnyMessage, identity: &Reference) {
        let mut delivered: Vec<SubscriberTarget> = Vec::new();
        let mut dropped = false;
        for (matcher, target) in &self.subscriptions {
            if !matcher.matches(event) {
                continue;
            }
            if delivered.iter().any(|seen| seen.same_subscriber(target)) {
                continue;
            }
            delivered.push(target.clone());
            match target {
                SubscriberTarget::Actor(subscriber) => {
                    subscriber.tell_any(event.clone(), Some(identity.clone()));
                    if subscriber.is_terminated() {
                        dropped = true;
                    }
                }
                SubscriberTarget::Channel(channel) => {
                    if channel.send(event.clone()).is_err() {
                        dropped = true;
                    }
                }
            }
        }
        if dropped {
            self.prune();
        }
    }

    /// Forgets subscriptions whose target can no longer receive anything.
    fn prune(&mut self) {
        self.subscriptions.retain(|(_, target)| match target {
            SubscriberTarget::Actor(subscriber) => !subscriber.is_terminated(),
            SubscriberTarget::Channel(channel) => !channel.is_closed(),
        });
    }
}

#[async_trait]
impl Actor for EventStreamActor {
    async fn receive(
        &mut self,
        message: AnyMessage,
        ctx: &mut ActorContext,
    ) -> Result<Receive, Error> {
        if let Some(subscribe) = message.downcast_ref::<Subscribe>() {
            self.subscriptions
                .push((subscribe.matcher.clone(), subscribe.target.clone()));
        } else if let Some(unsubscribe) = message.downcast_ref::<Unsubscribe>() {
            self.subscriptions.retain(|(_, target)| match target {
                SubscriberTarget::Actor(subscriber) => *subscriber != unsubscribe.subscriber,
                SubscriberTarget::Channel(_) => true,
            });
        } else if let Some(publish) = message.downcast_ref::<Publish>() {
            debug!("Event stream broadcasting {:?}.", publish.event);
            let identity = ctx.identity().clone();
            self.publish(&publish.event, &identity);
        } else {
            return Ok(Receive::Unhandled);
        }
        Ok(Receive::Handled)
    }
}

/// Typed handle to the system's event stream.
#[derive(Debug, Clone)]
pub struct EventStream {
    reference: Reference,
}

impl EventStream {
    pub(crate) fn new(reference: Reference) -> Self {
        EventStream { reference }
    }

    /// The underlying stream actor.
    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    /// Delivers every event of type `M` to `subscriber`.
    pub fn subscribe<M: Payload>(&self, subscriber: &Reference) {
        self.subscribe_where(Matcher::of::<M>(), subscriber);
    }

    /// Delivers every event matching `matcher` to `subscriber`.
    pub fn subscribe_where(&self, matcher: Matcher, subscriber: &Reference) {
        self.reference.tell(Subscribe {
            matcher,
            target: SubscriberTarget::Actor(subscriber.clone()),
        });
    }

    /// Channel subscription for consumers outside the actor tree. The
    /// subscription ends when the receiver is dropped.
    pub fn subscribe_channel<M: Payload>(&self) -> mpsc::UnboundedReceiver<AnyMessage> {
        self.subscribe_channel_where(Matcher::of::<M>())
    }

    /// Channel subscription with an arbitrary matcher.
    pub fn subscribe_channel_where(
        &self,
        matcher: Matcher,
    ) -> mpsc::UnboundedReceiver<AnyMessage> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.reference.tell(Subscribe {
            matcher,
            target: SubscriberTarget::Channel(sender),
        });
        receiver
    }

    /// Drops every subscription held by `subscriber`.
    pub fn unsubscribe(&self, subscriber: &Reference) {
        self.reference.tell(Unsubscribe {
            subscriber: subscriber.clone(),
        });
    }

    /// Publishes an event to all matching subscribers.
    pub fn publish<M: Payload>(&self, event: M) {
        self.publish_any(AnyMessage::new(event));
    }

    /// Publishes an already type-erased event.
    pub fn publish_any(&self, event: AnyMessage) {
        self.reference.tell(Publish { event });
    }
}
