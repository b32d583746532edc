// Integration tests for the actor runtime: messaging, lifecycle and
// tree termination.

mod common;

use actor::{
    Actor, ActorContext, ActorSystem, AnyMessage, Error, PoisonPill, Props, Receive, Reference,
};

use async_trait::async_trait;
use tracing_test::traced_test;

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

#[derive(Debug)]
struct Counter {
    value: u64,
}

#[derive(Debug, Clone)]
struct Increment(u64);

#[derive(Debug, Clone)]
struct GetValue;

#[async_trait]
impl Actor for Counter {
    async fn receive(
        &mut self,
        message: AnyMessage,
        ctx: &mut ActorContext,
    ) -> Result<Receive, Error> {
        if let Some(Increment(amount)) = message.downcast_ref() {
            self.value += amount;
            Ok(Receive::Handled)
        } else if message.is::<GetValue>() {
            ctx.reply(self.value);
            Ok(Receive::Handled)
        } else {
            Ok(Receive::Unhandled)
        }
    }
}

fn counter_props() -> Props {
    Props::new(|| Ok(Counter { value: 0 }))
}

#[tokio::test]
async fn test_tell_and_ask() {
    let system = ActorSystem::new("test");
    let counter = system.actor_of(counter_props(), "counter").await.unwrap();

    counter.tell(Increment(5));
    counter.tell(Increment(3));

    let value = common::within(counter.ask(GetValue)).await.unwrap();
    assert_eq!(value.downcast_ref::<u64>(), Some(&8));
}

#[tokio::test]
async fn test_ask_on_terminated_actor_fails() {
    let system = ActorSystem::new("test");
    let counter = system.actor_of(counter_props(), "counter").await.unwrap();

    common::within(counter.stop()).await;
    assert!(counter.is_terminated());

    let result = counter.ask(GetValue).await;
    assert!(matches!(result, Err(Error::Ask(_))));
}

#[tokio::test]
async fn test_duplicate_name_is_rejected() {
    let system = ActorSystem::new("test");
    system.actor_of(counter_props(), "counter").await.unwrap();

    let result = system.actor_of(counter_props(), "counter").await;
    assert!(matches!(result, Err(Error::Exists(_))));

    let result = system.actor_of(counter_props(), "bad/name").await;
    assert!(matches!(result, Err(Error::InvalidName(_))));
}

// Parent creating a child per message, exposing it to the caller.
#[derive(Debug, Default)]
struct Manager;

#[derive(Debug, Clone)]
struct CreateWorker(String);

#[async_trait]
impl Actor for Manager {
    async fn receive(
        &mut self,
        message: AnyMessage,
        ctx: &mut ActorContext,
    ) -> Result<Receive, Error> {
        if let Some(CreateWorker(name)) = message.downcast_ref() {
            let worker = ctx.actor_of(counter_props(), name)?;
            ctx.reply(worker);
            Ok(Receive::Handled)
        } else {
            Ok(Receive::Unhandled)
        }
    }
}

#[tokio::test]
async fn test_child_creation_and_paths() {
    let system = ActorSystem::new("test");
    let manager = system
        .actor_of(Props::new(|| Ok(Manager)), "manager")
        .await
        .unwrap();

    let reply = common::within(manager.ask(CreateWorker("worker".to_owned())))
        .await
        .unwrap();
    let worker = reply.downcast_ref::<Reference>().unwrap().clone();

    assert_eq!(worker.path().to_string(), "/user/manager/worker");
    assert_eq!(worker.name(), "worker");
    assert!(worker.path().is_child_of(manager.path()));

    worker.tell(Increment(2));
    let value = common::within(worker.ask(GetValue)).await.unwrap();
    assert_eq!(value.downcast_ref::<u64>(), Some(&2));
}

// Lifecycle bookkeeping through shared atomics, so hook runs survive the
// actor instance itself.
#[derive(Debug)]
struct Hooked {
    stops: Arc<AtomicUsize>,
}

#[async_trait]
impl Actor for Hooked {
    async fn receive(
        &mut self,
        _message: AnyMessage,
        _ctx: &mut ActorContext,
    ) -> Result<Receive, Error> {
        Ok(Receive::Handled)
    }

    async fn post_stop(&mut self, _ctx: &mut ActorContext) -> Result<(), Error> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_poison_pill_terminates_and_post_stop_runs_once() {
    let system = ActorSystem::new("test");
    let stops = Arc::new(AtomicUsize::new(0));
    let stops_in_actor = stops.clone();
    let props = Props::new(move || {
        Ok(Hooked {
            stops: stops_in_actor.clone(),
        })
    });
    let hooked = system.actor_of(props, "hooked").await.unwrap();

    hooked.tell(PoisonPill);
    common::within(hooked.when_terminated()).await;
    assert!(hooked.is_terminated());
    assert_eq!(stops.load(Ordering::SeqCst), 1);

    // Repeated termination requests are no-ops.
    hooked.tell(PoisonPill);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

// Parent with two children, used to observe termination order.
#[derive(Debug, Default)]
struct Family;

#[derive(Debug, Clone)]
struct GetChildren;

#[async_trait]
impl Actor for Family {
    async fn pre_start(&mut self, ctx: &mut ActorContext) -> Result<(), Error> {
        ctx.actor_of(counter_props(), "first")?;
        ctx.actor_of(counter_props(), "second")?;
        Ok(())
    }

    async fn receive(
        &mut self,
        message: AnyMessage,
        ctx: &mut ActorContext,
    ) -> Result<Receive, Error> {
        if message.is::<GetChildren>() {
            ctx.reply(ctx.children());
            Ok(Receive::Handled)
        } else {
            Ok(Receive::Unhandled)
        }
    }
}

#[tokio::test]
async fn test_children_terminate_before_parent() {
    let system = ActorSystem::new("test");
    let parent = system
        .actor_of(Props::new(|| Ok(Family)), "family")
        .await
        .unwrap();

    let reply = common::within(parent.ask(GetChildren)).await.unwrap();
    let children = reply.downcast_ref::<Vec<Reference>>().unwrap().clone();
    assert_eq!(children.len(), 2);

    assert!(!parent.is_terminated());

    common::within(parent.stop()).await;

    // A parent only finalizes after every child's death watch arrived, so
    // by the time the parent's termination future resolves both children
    // are already fully terminated.
    for child in &children {
        assert!(child.is_terminated());
        common::within(child.when_terminated()).await;
    }
}

#[tokio::test]
#[traced_test]
async fn test_system_termination() {
    let system = ActorSystem::new("test");
    let counter = system.actor_of(counter_props(), "counter").await.unwrap();
    counter.tell(Increment(1));

    system.terminate();
    common::within(system.await_termination()).await;

    assert!(system.is_terminated());
    assert!(counter.is_terminated());
    assert!(logs_contain("Stopping actor system..."));

    // The tree is gone: new top-level actors cannot be created.
    let result = system.actor_of(counter_props(), "late").await;
    assert!(result.is_err());
}

// Behavior switching: a gate that answers differently once closed.
#[derive(Debug, Default)]
struct Gate;

#[derive(Debug, Clone)]
struct Close;

#[derive(Debug, Clone)]
struct Knock;

#[async_trait]
impl Actor for Gate {
    async fn receive(
        &mut self,
        message: AnyMessage,
        ctx: &mut ActorContext,
    ) -> Result<Receive, Error> {
        if message.is::<Close>() {
            ctx.become_behavior("closed");
            Ok(Receive::Handled)
        } else if message.is::<Knock>() {
            ctx.reply("come in");
            Ok(Receive::Handled)
        } else {
            Ok(Receive::Unhandled)
        }
    }

    async fn receive_as(
        &mut self,
        behavior: &str,
        message: AnyMessage,
        ctx: &mut ActorContext,
    ) -> Result<Receive, Error> {
        match behavior {
            "closed" => {
                if message.is::<Knock>() {
                    ctx.reply("go away");
                    ctx.unbecome();
                    Ok(Receive::Handled)
                } else {
                    Ok(Receive::Unhandled)
                }
            }
            _ => self.receive(message, ctx).await,
        }
    }
}

#[tokio::test]
async fn test_behavior_switching() {
    let system = ActorSystem::new("test");
    let gate = system
        .actor_of(Props::new(|| Ok(Gate)), "gate")
        .await
        .unwrap();

    let reply = common::within(gate.ask(Knock)).await.unwrap();
    assert_eq!(reply.downcast_ref::<&str>(), Some(&"come in"));

    gate.tell(Close);
    let reply = common::within(gate.ask(Knock)).await.unwrap();
    assert_eq!(reply.downcast_ref::<&str>(), Some(&"go away"));

    // `unbecome` put the gate back into its default behavior.
    let reply = common::within(gate.ask(Knock)).await.unwrap();
    assert_eq!(reply.downcast_ref::<&str>(), Some(&"come in"));
}
