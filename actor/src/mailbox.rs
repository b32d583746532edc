// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Mailbox
//!
//! Per-actor priority queue with two FIFO lanes. System envelopes always
//! dispatch before user envelopes; while the mailbox is suspended only the
//! system lane is served, and pending user envelopes accumulate until the
//! cell resumes or drains them at shutdown.
//!

use crate::message::Envelope;

use std::collections::VecDeque;

/// Two-lane envelope queue owned by a cell.
#[derive(Debug, Default)]
pub(crate) struct Mailbox {
    system: VecDeque<Envelope>,
    user: VecDeque<Envelope>,
    suspended: bool,
}

impl Mailbox {
    /// An empty mailbox. Cells start suspended until `Initialize` arrives.
    pub(crate) fn suspended() -> Self {
        Mailbox {
            suspended: true,
            ..Default::default()
        }
    }

    /// Queues an envelope into its lane.
    pub(crate) fn push(&mut self, envelope: Envelope) {
        if envelope.is_system() {
            self.system.push_back(envelope);
        } else {
            self.user.push_back(envelope);
        }
    }

    /// Takes the next envelope to dispatch: system lane first, user lane
    /// only when un-suspended and the system lane is empty.
    pub(crate) fn shift(&mut self) -> Option<Envelope> {
        if let Some(envelope) = self.system.pop_front() {
            Some(envelope)
        } else if self.suspended {
            None
        } else {
            self.user.pop_front()
        }
    }

    /// Stops serving the user lane.
    pub(crate) fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Serves the user lane again.
    pub(crate) fn resume(&mut self) {
        self.suspended = false;
    }

    pub(crate) fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Empties the user lane, returning its envelopes in order. Used only at
    /// terminal shutdown to redirect stranded user messages to dead letters;
    /// the system lane is never dropped this way.
    pub(crate) fn drain(&mut self) -> Vec<Envelope> {
        self.user.drain(..).collect()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.system.is_empty() && self.user.is_empty()
    }
}
