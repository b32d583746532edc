// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Logging
//!
//! Structured log events published on the event stream. Actors log through
//! [`crate::ActorContext::log`], which only enqueues a [`LogEvent`]; the
//! [`Logger`] listener under the root guardian forwards the events to
//! `tracing`, so nothing blocks the message path.
//!

use crate::{
    Error,
    actor::{Actor, ActorContext, Receive},
    message::AnyMessage,
    path::ActorPath,
    system::SystemRef,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

/// A structured log record published on the event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Severity.
    pub level: LogLevel,
    /// Rendered message.
    pub message: String,
    /// Path of the actor that emitted the event.
    pub source: ActorPath,
}

/// Per-actor logging handle, obtained from
/// [`crate::ActorContext::log`].
#[derive(Debug, Clone)]
pub struct Log {
    source: ActorPath,
    system: SystemRef,
}

impl Log {
    pub(crate) fn new(source: ActorPath, system: SystemRef) -> Self {
        Log { source, system }
    }

    fn publish(&self, level: LogLevel, message: String) {
        match self.system.event_stream() {
            Ok(stream) => stream.publish(LogEvent {
                level,
                message,
                source: self.source.clone(),
            }),
            Err(_) => debug!("Log event from {} dropped, system is gone.", self.source),
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.publish(LogLevel::Debug, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(LogLevel::Info, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.publish(LogLevel::Warn, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(LogLevel::Error, message.into());
    }

    pub fn fatal(&self, message: impl Into<String>) {
        self.publish(LogLevel::Fatal, message.into());
    }
}

/// Listener actor under the root guardian: subscribes to [`LogEvent`] and
/// reports the events through `tracing`.
#[derive(Debug, Default)]
pub(crate) struct Logger;

#[async_trait]
impl Actor for Logger {
    async fn pre_start(&mut self, ctx: &mut ActorContext) -> Result<(), Error> {
        let stream = ctx.system().event_stream()?;
        stream.subscribe::<LogEvent>(ctx.identity());
        Ok(())
    }

    async fn receive(
        &mut self,
        message: AnyMessage,
        _ctx: &mut ActorContext,
    ) -> Result<Receive, Error> {
        let Some(event) = message.downcast_ref::<LogEvent>() else {
            return Ok(Receive::Unhandled);
        };
        match event.level {
            LogLevel::Debug => tracing::debug!(source = %event.source, "{}", event.message),
            LogLevel::Info => tracing::info!(source = %event.source, "{}", event.message),
            LogLevel::Warn => tracing::warn!(source = %event.source, "{}", event.message),
            LogLevel::Error => tracing::error!(source = %event.source, "{}", event.message),
            LogLevel::Fatal => {
                tracing::error!(source = %event.source, fatal = true, "{}", event.message)
            }
        }
        Ok(Receive::Handled)
    }
}
