// Mailbox and scheduling tests: serialized execution, FIFO order, lane
// priority under suspension, ask timeouts.

mod common;

use actor::{
    Actor, ActorContext, ActorSystem, AnyMessage, Error, Props, Receive, SystemMessage,
};

use async_trait::async_trait;

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

// Records dispatch overlap: `in_flight` must never exceed one if execution
// is serialized.
#[derive(Debug)]
struct Serialized {
    in_flight: Arc<AtomicUsize>,
    overlaps: Arc<AtomicUsize>,
    processed: Arc<AtomicUsize>,
}

#[derive(Debug, Clone)]
struct Work;

#[async_trait]
impl Actor for Serialized {
    async fn receive(
        &mut self,
        message: AnyMessage,
        _ctx: &mut ActorContext,
    ) -> Result<Receive, Error> {
        if !message.is::<Work>() {
            return Ok(Receive::Unhandled);
        }
        if self.in_flight.fetch_add(1, Ordering::SeqCst) != 0 {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        // Yield mid-handler so overlapping dispatch would be observable.
        tokio::time::sleep(Duration::from_micros(200)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.processed.fetch_add(1, Ordering::SeqCst);
        Ok(Receive::Handled)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_flight_under_concurrent_senders() {
    let system = ActorSystem::new("test");
    let in_flight = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let processed = Arc::new(AtomicUsize::new(0));

    let (in_flight_a, overlaps_a, processed_a) =
        (in_flight.clone(), overlaps.clone(), processed.clone());
    let props = Props::new(move || {
        Ok(Serialized {
            in_flight: in_flight_a.clone(),
            overlaps: overlaps_a.clone(),
            processed: processed_a.clone(),
        })
    });
    let worker = system.actor_of(props, "worker").await.unwrap();

    const SENDERS: usize = 8;
    const PER_SENDER: usize = 25;
    let mut tasks = Vec::new();
    for _ in 0..SENDERS {
        let worker = worker.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..PER_SENDER {
                worker.tell(Work);
                tokio::task::yield_now().await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    common::within(async {
        while processed.load(Ordering::SeqCst) < SENDERS * PER_SENDER {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(processed.load(Ordering::SeqCst), SENDERS * PER_SENDER);
}

// Records the numbers it receives, in order.
#[derive(Debug, Default)]
struct Recorder {
    seen: Vec<u64>,
}

#[derive(Debug, Clone)]
struct Mark(u64);

#[derive(Debug, Clone)]
struct GetSeen;

#[async_trait]
impl Actor for Recorder {
    async fn receive(
        &mut self,
        message: AnyMessage,
        ctx: &mut ActorContext,
    ) -> Result<Receive, Error> {
        if let Some(Mark(value)) = message.downcast_ref() {
            self.seen.push(*value);
            Ok(Receive::Handled)
        } else if message.is::<GetSeen>() {
            ctx.reply(self.seen.clone());
            Ok(Receive::Handled)
        } else {
            Ok(Receive::Unhandled)
        }
    }
}

#[tokio::test]
async fn test_fifo_order_from_one_sender() {
    let system = ActorSystem::new("test");
    let recorder = system
        .actor_of(Props::new(|| Ok(Recorder::default())), "recorder")
        .await
        .unwrap();

    for value in 0..100 {
        recorder.tell(Mark(value));
    }

    let reply = common::within(recorder.ask(GetSeen)).await.unwrap();
    let seen = reply.downcast_ref::<Vec<u64>>().unwrap();
    assert_eq!(*seen, (0..100).collect::<Vec<u64>>());
}

// Probe-backed recorder, so the test can observe exactly when messages get
// dispatched.
#[tokio::test]
async fn test_suspension_defers_user_messages_without_losing_them() {
    let system = ActorSystem::new("test");
    let (probe_props, mut inbox) = common::probe();
    let recorder = system.actor_of(probe_props, "recorder").await.unwrap();

    // Make sure the actor is up, then pause its user lane.
    recorder.tell(Mark(0));
    assert!(
        common::expect_message(&mut inbox).await.is::<Mark>()
    );
    recorder.tell_system(SystemMessage::Suspend);
    // Suspension cascades; give the cell a beat to apply it.
    tokio::time::sleep(Duration::from_millis(50)).await;

    recorder.tell(Mark(1));
    recorder.tell(Mark(2));
    common::expect_no_message(&mut inbox, Duration::from_millis(100)).await;

    recorder.tell_system(SystemMessage::Resume {
        cause: Error::Functional("resume".to_owned()),
    });

    // Deferred messages arrive after resume, still in FIFO order.
    let first = common::expect_message(&mut inbox).await;
    assert_eq!(first.downcast_ref::<Mark>().map(|mark| mark.0), Some(1));
    let second = common::expect_message(&mut inbox).await;
    assert_eq!(second.downcast_ref::<Mark>().map(|mark| mark.0), Some(2));
}

// Never replies.
#[derive(Debug, Default)]
struct Mute;

#[async_trait]
impl Actor for Mute {
    async fn receive(
        &mut self,
        _message: AnyMessage,
        _ctx: &mut ActorContext,
    ) -> Result<Receive, Error> {
        Ok(Receive::Handled)
    }
}

#[tokio::test]
async fn test_ask_timeout_expires_without_a_reply() {
    let system = ActorSystem::new("test");
    let mute = system
        .actor_of(Props::new(|| Ok(Mute)), "mute")
        .await
        .unwrap();

    let result = mute.ask_timeout(Mark(1), Duration::from_millis(100)).await;
    assert_eq!(result.unwrap_err(), Error::AskTimeout);

    // The target is unaffected and keeps processing.
    mute.tell(Mark(2));
    assert!(!mute.is_terminated());
}
