//! # Campaign Ledger
//!
//! Core of the milestone-escrow donation platform. A single
//! [`CampaignLedger`] owns every campaign, the volunteer and admin work
//! queues and the per-role notification logs. Its transitions cover the full
//! campaign lifecycle:
//!
//! | Phase          | Transition(s)                                                        |
//! |----------------|----------------------------------------------------------------------|
//! | Submission     | `submit_campaign`, `verify_submission`, `discard_submission`         |
//! | Admin decision | `approve_campaign`, `reject_campaign`, `delete_submission`           |
//! | Funding        | `donate`, `edit_campaign`                                            |
//! | Escrow release | `request_milestone_release`, `submit_milestone_report`, `approve_milestone_release`, `reject_milestone_release` |
//! | Completion     | `submit_final_report`, `verify_final_report`, `approve_final_report`, `reject_final_report` |
//! | Deletion       | `recommend_deletion`, `submit_deletion_review`, `dismiss_deletion_review`, `approve_deletion`, `dismiss_deletion` |
//!
//! Read-only projections (donation feed, donor ranking, analytics, public
//! explorer) live in [`views`] and are recomputed from ledger state on every
//! call.
//!
//! ## Release ordering
//!
//! Funds leave escrow strictly in milestone order: only the first `Locked`
//! milestone may be requested, only while no other milestone is under
//! review, and only when `raised − Σ released targets` covers its target.
//! This keeps `Σ released ≤ raised` for every campaign.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};

pub mod clock;
pub mod display;
pub mod errors;
pub mod notifications;
pub mod queue;
pub mod storage;
pub mod types;
pub mod views;

mod deletion;
mod lifecycle;
mod milestones;

#[cfg(test)]
mod test_deletion;
#[cfg(test)]
mod test_views;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "testutils"))]
pub use clock::ManualClock;
pub use errors::{LedgerError, Result};
pub use lifecycle::Submitted;
pub use notifications::{CampaignRef, Notification, NotificationLog, Role};
pub use queue::{ItemKind, VolunteerReview, WorkItem, WorkPayload, WorkQueue};
pub use types::*;

use storage::Store;

pub struct CampaignLedger {
    store: Store,
    volunteer_queue: WorkQueue,
    admin_queue: WorkQueue,
    notifications: NotificationLog,
    clock: Arc<dyn Clock>,
}

impl Default for CampaignLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CampaignLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CampaignLedger")
            .field("campaigns", &self.store.campaign_count())
            .field("volunteer_queue", &self.volunteer_queue.len())
            .field("admin_queue", &self.admin_queue.len())
            .field("notifications", &self.notifications.len())
            .finish()
    }
}

impl CampaignLedger {
    /// An empty ledger on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Store::default(),
            volunteer_queue: WorkQueue::default(),
            admin_queue: WorkQueue::default(),
            notifications: NotificationLog::default(),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn campaign(&self, id: CampaignId) -> Result<&Campaign> {
        self.store.load_campaign(id)
    }

    /// All campaigns in id order.
    pub fn campaigns(&self) -> impl Iterator<Item = &Campaign> {
        self.store.campaigns()
    }

    pub fn volunteer_queue(&self) -> &WorkQueue {
        &self.volunteer_queue
    }

    pub fn admin_queue(&self) -> &WorkQueue {
        &self.admin_queue
    }

    /// Newest first.
    pub fn notifications(&self, role: Role) -> &VecDeque<Notification> {
        self.notifications.for_role(role)
    }

    /// Escrowed funds of a campaign not yet released.
    pub fn available_funds(&self, id: CampaignId) -> Result<u64> {
        Ok(self.store.load_campaign(id)?.available_funds())
    }

    /// The milestone a release could be requested for right now, if any.
    pub fn next_releasable(&self, id: CampaignId) -> Result<Option<&Milestone>> {
        let campaign = self.store.load_campaign(id)?;
        if campaign.status != CampaignStatus::Live || campaign.outstanding_milestone().is_some() {
            return Ok(None);
        }
        Ok(campaign
            .next_locked()
            .filter(|m| campaign.available_funds() >= m.target))
    }

    // ─────────────────────────────────────────────────────────
    // Shared helpers for the transition modules
    // ─────────────────────────────────────────────────────────

    pub(crate) fn notify(&mut self, role: Role, message: impl Into<String>, link: &CampaignRef) {
        let id = self.store.next_notification_id();
        self.notifications.push(Notification {
            id,
            role,
            message: message.into(),
            timestamp: self.clock.now(),
            link: Some(link.clone()),
        });
    }
}

/// Look up a work item and check its kind without removing it.
pub(crate) fn peek_item(queue: &WorkQueue, id: ItemId, expected: ItemKind) -> Result<&WorkItem> {
    let item = queue.get(id).ok_or(LedgerError::WorkItemNotFound(id))?;
    if item.kind() != expected {
        return Err(LedgerError::WrongItemKind {
            item_id: id,
            expected,
            found: item.kind(),
        });
    }
    Ok(item)
}

/// Trimmed copy of `text`, or `err` when it is blank.
pub(crate) fn require_text(text: &str, err: LedgerError) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(err);
    }
    Ok(trimmed.to_string())
}

pub(crate) fn campaign_ref(campaign: &Campaign) -> CampaignRef {
    CampaignRef {
        campaign_id: campaign.id,
        title: campaign.title.clone(),
    }
}
