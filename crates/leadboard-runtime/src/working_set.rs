#![forbid(unsafe_code)]

//! The board's local, mutable copy of displayed leads.
//!
//! Snapshots are `Arc`-wrapped so a pending move record can retain the full
//! pre-move state at the cost of one pointer; restore clones out of the
//! shared snapshot only when a rollback actually happens.

use std::sync::Arc;

use leadboard_core::{Lead, LeadId};

/// Local working copy of all leads currently displayed.
///
/// Wholesale replacement policy (refresh suppression during moves) is owned
/// by the board controller, not by this type.
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    leads: Vec<Lead>,
}

impl WorkingSet {
    /// Empty working set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Working set seeded with `leads`.
    #[must_use]
    pub fn from_leads(leads: Vec<Lead>) -> Self {
        Self { leads }
    }

    /// Replace the whole collection.
    pub fn replace(&mut self, leads: Vec<Lead>) {
        self.leads = leads;
    }

    /// All leads, in display order.
    #[must_use]
    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    /// Look up one lead.
    #[must_use]
    pub fn lead(&self, id: LeadId) -> Option<&Lead> {
        self.leads.iter().find(|l| l.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.leads.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    /// Capture the current state as a shared snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Lead>> {
        Arc::new(self.leads.clone())
    }

    /// Restore a previously captured snapshot verbatim.
    pub fn restore(&mut self, snapshot: &Arc<Vec<Lead>>) {
        self.leads = snapshot.as_ref().clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadboard_core::Stage;

    fn lead(id: u64, stage: Stage) -> Lead {
        Lead::new(LeadId(id), stage, format!("lead-{id}"))
    }

    #[test]
    fn snapshot_then_restore_round_trips() {
        let mut ws = WorkingSet::from_leads(vec![lead(1, Stage::New), lead(2, Stage::Booked)]);
        let snap = ws.snapshot();

        ws.replace(vec![lead(3, Stage::Lost)]);
        assert_eq!(ws.len(), 1);

        ws.restore(&snap);
        assert_eq!(ws.len(), 2);
        assert_eq!(ws.lead(LeadId(1)).unwrap().stage, Stage::New);
    }

    #[test]
    fn snapshot_is_isolated_from_later_mutation() {
        let mut ws = WorkingSet::from_leads(vec![lead(1, Stage::New)]);
        let snap = ws.snapshot();
        ws.replace(vec![lead(1, Stage::Closed)]);
        assert_eq!(snap[0].stage, Stage::New);
    }

    #[test]
    fn lookup() {
        let ws = WorkingSet::from_leads(vec![lead(5, Stage::Contacted)]);
        assert!(ws.lead(LeadId(5)).is_some());
        assert!(ws.lead(LeadId(6)).is_none());
        assert!(!ws.is_empty());
    }
}
