// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Errors module
//!

use crate::ActorPath;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for the actor system.
///
/// Failure causes carried by supervision messages are values of this type,
/// which is why it is cheap to clone and comparable in tests.
#[derive(Clone, Debug, Error, PartialEq, Serialize, Deserialize)]
pub enum Error {
    /// The actor factory or a start/restart hook failed. Cells carrying this
    /// cause are stopped by the default supervision decider.
    #[error("Actor failed to initialize: {0}.")]
    ActorInitialization(String),
    /// An error occurred while sending a message to an actor.
    #[error("An error occurred while sending a message to actor: {0}.")]
    Send(String),
    /// An actor with the same path already exists.
    #[error("Actor {0} exists.")]
    Exists(ActorPath),
    /// The given actor name cannot be used as a path segment.
    #[error("Invalid actor name: {0}.")]
    InvalidName(String),
    /// An `ask` will never receive a reply.
    #[error("Ask failed: {0}.")]
    Ask(String),
    /// An `ask` timed out before the reply arrived.
    #[error("Ask timed out.")]
    AskTimeout,
    /// The actor system is no longer reachable.
    #[error("Actor system error: {0}.")]
    System(String),
    /// Error that does not compromise the operation of the system.
    #[error("Error: {0}")]
    Functional(String),
}
