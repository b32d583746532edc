// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Props
//!
//! Immutable actor-construction descriptor. Constructor arguments are
//! captured by the factory closure, so the same `Props` value can rebuild a
//! fresh actor instance on every start and restart.
//!

use crate::{Error, actor::Actor};

use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

type Factory = dyn Fn() -> Result<Box<dyn Actor>, Error> + Send + Sync;

/// Shareable recipe for building an actor instance.
///
/// ```ignore
/// let props = Props::new(|| Ok(Counter { value: 0 }));
/// let worker = system.actor_of(props, "counter").await?;
/// ```
///
/// A factory may fail; the failure surfaces to the parent as an
/// [`Error::ActorInitialization`] and is decided by its supervision
/// strategy.
#[derive(Clone)]
pub struct Props {
    factory: Arc<Factory>,
}

impl Props {
    /// Creates props from a factory returning the actor or a construction
    /// error.
    pub fn new<A, F>(factory: F) -> Self
    where
        A: Actor,
        F: Fn() -> Result<A, Error> + Send + Sync + 'static,
    {
        Props {
            factory: Arc::new(move || factory().map(|actor| Box::new(actor) as Box<dyn Actor>)),
        }
    }

    /// Builds a fresh actor instance.
    pub(crate) fn build(&self) -> Result<Box<dyn Actor>, Error> {
        (self.factory)()
    }
}

/// Props equality is handle equality: two values are equal when they share
/// the same factory. Closures have no structural identity to compare.
impl PartialEq for Props {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.factory, &other.factory)
    }
}

impl Debug for Props {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Props").finish_non_exhaustive()
    }
}
