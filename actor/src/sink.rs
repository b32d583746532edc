//! Event sink and subscriber pattern implementation.
//!
//! This module bridges event-stream subscriptions to consumers living
//! outside the actor tree. A [`Sink`] runs in its own task, pulling events
//! from a channel subscription and handing them to a [`Subscriber`]
//! implementation.

use crate::message::AnyMessage;

use async_trait::async_trait;
use tokio::sync::mpsc;

use tracing::debug;

/// A sink that receives events from an event-stream subscription and
/// notifies a subscriber. Runs until the subscription is dropped by the
/// stream, which happens when the system terminates.
pub struct Sink {
    /// The subscriber that will be notified of events.
    subscriber: Box<dyn Subscriber>,
    /// Channel subscription feeding this sink.
    receiver: mpsc::UnboundedReceiver<AnyMessage>,
}

impl Sink {
    /// Creates a new sink over a channel subscription.
    pub fn new(receiver: mpsc::UnboundedReceiver<AnyMessage>, subscriber: impl Subscriber) -> Self {
        Sink {
            subscriber: Box::new(subscriber),
            receiver,
        }
    }

    /// Runs the sink's event processing loop. Should be spawned in a
    /// separate task; `ActorSystem::run_sink` does exactly that.
    pub async fn run(&mut self) {
        while let Some(event) = self.receiver.recv().await {
            debug!("Sink received event: {:?}. Notify the subscriber.", event);
            self.subscriber.notify(event).await;
        }
    }
}

/// Trait for types that process events outside the actor tree.
#[async_trait]
pub trait Subscriber: Send + 'static {
    /// Called for each event the sink receives.
    async fn notify(&mut self, event: AnyMessage);
}
