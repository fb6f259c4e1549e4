//! Load request bookkeeping.
//!
//! Loads complete asynchronously and possibly out of order. Every request gets
//! a monotonically increasing id and only the most recently issued request is
//! allowed to change viewer state when it completes.

use std::fmt;

use crate::document::DocumentRef;

/// Identifier of one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load-{}", self.0)
    }
}

/// Handed to the loader and returned with the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub id: RequestId,
    pub reference: DocumentRef,
}

/// Tracks which load request is current.
#[derive(Debug, Default)]
pub struct LoadTracker {
    next_id: u64,
    latest: Option<RequestId>,
    in_flight: bool,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new request; it supersedes every earlier one.
    pub fn begin(&mut self, reference: DocumentRef) -> LoadTicket {
        self.next_id += 1;
        let id = RequestId(self.next_id);
        self.latest = Some(id);
        self.in_flight = true;
        LoadTicket { id, reference }
    }

    /// True if `ticket` is the latest issued request.
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.latest == Some(ticket.id)
    }

    /// Mark a request complete. Returns false for superseded requests, whose
    /// results must be discarded.
    pub fn complete(&mut self, ticket: &LoadTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.in_flight = false;
        true
    }

    /// A request has been issued and has not completed.
    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Invalidate every outstanding request.
    pub fn cancel_all(&mut self) {
        self.latest = None;
        self.in_flight = false;
    }

    pub fn latest(&self) -> Option<RequestId> {
        self.latest
    }
}
