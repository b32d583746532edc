// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Actor path
//!
//! The `path` module provides the `ActorPath` type, the hierarchical address
//! of an actor inside the supervision tree.
//!

use serde::{Deserialize, Serialize};

use std::fmt::{Error, Formatter};

/// Hierarchical actor path providing unique addressing for actors.
///
/// A path is a sequence of name segments mirroring the supervision tree,
/// rendered like a filesystem path: `/user/manager/worker` names the actor
/// "worker" supervised by "manager", itself supervised by the "user"
/// guardian. The root guardian is the empty path, rendered as `/`.
///
/// Paths are immutable; every operation returns a new value. Two references
/// are considered the same actor identity when their paths are equal.
///
/// ```ignore
/// let path = ActorPath::from("/user/manager") / "worker";
/// assert_eq!(path.name(), "worker");
/// assert_eq!(path.parent(), ActorPath::from("/user/manager"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorPath(Vec<String>);

impl ActorPath {
    /// The path of the root guardian.
    pub fn root() -> Self {
        ActorPath(vec![])
    }

    /// Parent path. The parent of the root is the root itself.
    pub fn parent(&self) -> Self {
        let mut segments = self.0.clone();
        segments.pop();
        ActorPath(segments)
    }

    /// Last segment of the path: the actor's own name. Empty for the root.
    pub fn name(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// Number of segments.
    pub fn level(&self) -> usize {
        self.0.len()
    }

    /// True for the root path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if `self` is a proper ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &ActorPath) -> bool {
        other.0.len() > self.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    /// True if `self` is a proper descendant of `other`.
    pub fn is_descendant_of(&self, other: &ActorPath) -> bool {
        other.is_ancestor_of(self)
    }

    /// True if `other` is a direct child of `self`.
    pub fn is_parent_of(&self, other: &ActorPath) -> bool {
        other.0.len() == self.0.len() + 1 && self.is_ancestor_of(other)
    }

    /// True if `self` is a direct child of `other`.
    pub fn is_child_of(&self, other: &ActorPath) -> bool {
        other.is_parent_of(self)
    }
}

impl From<&str> for ActorPath {
    fn from(value: &str) -> Self {
        ActorPath(
            value
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }
}

impl From<String> for ActorPath {
    fn from(value: String) -> Self {
        ActorPath::from(value.as_str())
    }
}

/// Appends a child segment: `ActorPath::from("/user") / "worker"`.
impl std::ops::Div<&str> for ActorPath {
    type Output = ActorPath;

    fn div(self, rhs: &str) -> Self::Output {
        let mut segments = self.0;
        segments.push(rhs.to_owned());
        ActorPath(segments)
    }
}

impl std::fmt::Display for ActorPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "/{}", self.0.join("/"))
    }
}

impl std::fmt::Debug for ActorPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self)
    }
}
