//! Bookkeeping for optimistic operations: apply locally, remember what was
//! applied under a correlation id, and settle it once the remote side answers.

use std::collections::BTreeMap;

use marketplace_core::{InteractionKind, PendingInteraction, PostId};

/// Correlation id handed out by `PendingLedger::begin*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct PendingLedger {
    next_id: u64,
    entries: BTreeMap<Ticket, PendingInteraction>,
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `interaction` unless one of the same kind is already pending for the post.
    pub fn begin_exclusive(&mut self, interaction: PendingInteraction) -> Option<Ticket> {
        let taken = self
            .entries
            .values()
            .any(|p| p.post_id == interaction.post_id && p.kind == interaction.kind);
        if taken {
            return None;
        }
        Some(self.begin(interaction))
    }

    pub fn begin(&mut self, interaction: PendingInteraction) -> Ticket {
        self.next_id += 1;
        let ticket = Ticket(self.next_id);
        self.entries.insert(ticket, interaction);
        ticket
    }

    /// Removes the entry. `None` means it was already drained.
    pub fn settle(&mut self, ticket: Ticket) -> Option<PendingInteraction> {
        self.entries.remove(&ticket)
    }

    /// Removes every outstanding entry, oldest first.
    pub fn drain(&mut self) -> Vec<PendingInteraction> {
        std::mem::take(&mut self.entries).into_values().collect()
    }

    pub fn is_pending(&self, post_id: &PostId, kind: InteractionKind) -> bool {
        self.entries
            .values()
            .any(|p| &p.post_id == post_id && p.kind == kind)
    }

    pub fn outstanding(&self) -> usize {
        self.entries.len()
    }
}
