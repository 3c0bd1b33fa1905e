use std::collections::VecDeque;

use crate::foundation::core::OverlayId;

/// Out-of-band decode request handed to the host.
///
/// The `generation` pins the request to one resource lifetime of the overlay. The scene issues a
/// fresh generation on every insert, load, and reload, so a result for an earlier lifetime (even
/// one of a rebuilt overlay with the same id) is discarded.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DecodeTicket {
    pub overlay: OverlayId,
    pub generation: u64,
    /// Opaque mask locator from the overlay document.
    pub source: String,
}

/// FIFO of decode requests not yet taken by the host.
#[derive(Debug, Default)]
pub(crate) struct DecodeQueue {
    pending: VecDeque<DecodeTicket>,
}

impl DecodeQueue {
    pub(crate) fn push(&mut self, ticket: DecodeTicket) {
        if !self.pending.contains(&ticket) {
            self.pending.push_back(ticket);
        }
    }

    pub(crate) fn drain(&mut self) -> Vec<DecodeTicket> {
        self.pending.drain(..).collect()
    }

    /// Forget requests for `overlay` that have not been handed out yet.
    pub(crate) fn cancel(&mut self, overlay: &OverlayId) {
        self.pending.retain(|t| &t.overlay != overlay);
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}
