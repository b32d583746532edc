// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! Shared test support: a probe actor that forwards everything it receives
//! into a channel the test can assert on.

#![allow(dead_code)]

use actor::{Actor, ActorContext, AnyMessage, Error, Props, Receive};

use async_trait::async_trait;
use tokio::sync::mpsc;

use std::time::Duration;

/// Actor forwarding every received message into a channel.
#[derive(Debug)]
pub struct Probe {
    sender: mpsc::UnboundedSender<AnyMessage>,
}

#[async_trait]
impl Actor for Probe {
    async fn receive(
        &mut self,
        message: AnyMessage,
        _ctx: &mut ActorContext,
    ) -> Result<Receive, Error> {
        let _ = self.sender.send(message);
        Ok(Receive::Handled)
    }
}

/// Props for a probe plus the receiving side of its channel.
pub fn probe() -> (Props, mpsc::UnboundedReceiver<AnyMessage>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let props = Props::new(move || {
        Ok(Probe {
            sender: sender.clone(),
        })
    });
    (props, receiver)
}

/// Receives the next message or panics after five seconds.
pub async fn expect_message(receiver: &mut mpsc::UnboundedReceiver<AnyMessage>) -> AnyMessage {
    tokio::time::timeout(Duration::from_secs(5), receiver.recv())
        .await
        .expect("timed out waiting for a message")
        .expect("probe channel closed")
}

/// Asserts that nothing arrives within the window.
pub async fn expect_no_message(receiver: &mut mpsc::UnboundedReceiver<AnyMessage>, window: Duration) {
    if let Ok(Some(message)) = tokio::time::timeout(window, receiver.recv()).await {
        panic!("unexpected message: {:?}", message);
    }
}

/// Awaits a future with a five second guard.
pub async fn within<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}
