//! # Storage
//!
//! In-memory tables and identifier sequences behind the ledger.
//!
//! | Sequence        | Used for                                   |
//! |-----------------|--------------------------------------------|
//! | `campaign`      | [`Campaign::id`], starts at 0              |
//! | `milestone`     | [`Milestone::id`](crate::Milestone), ledger-wide |
//! | `item`          | work item ids, shared by both queues       |
//! | `tx`            | [`TxId`] of activity records and releases  |
//! | `notification`  | notification ids                           |
//!
//! Nothing here is persisted; a fresh store is empty.

use std::collections::BTreeMap;

use crate::errors::{LedgerError, Result};
use crate::types::{Campaign, CampaignId, ItemId, MilestoneId, TxId};

#[derive(Debug, Default, Clone)]
struct Sequences {
    campaign: u64,
    milestone: u64,
    item: u64,
    tx: u64,
    notification: u64,
}

/// Reads, increments and stores a counter; returns the pre-increment value.
fn bump(counter: &mut u64) -> u64 {
    let current = *counter;
    *counter += 1;
    current
}

#[derive(Debug, Default, Clone)]
pub struct Store {
    seq: Sequences,
    campaigns: BTreeMap<CampaignId, Campaign>,
}

impl Store {
    pub fn next_campaign_id(&mut self) -> CampaignId {
        bump(&mut self.seq.campaign)
    }

    pub fn next_milestone_id(&mut self) -> MilestoneId {
        bump(&mut self.seq.milestone)
    }

    pub fn next_item_id(&mut self) -> ItemId {
        bump(&mut self.seq.item)
    }

    pub fn next_tx(&mut self) -> TxId {
        TxId::from_sequence(bump(&mut self.seq.tx))
    }

    pub fn next_notification_id(&mut self) -> u64 {
        bump(&mut self.seq.notification)
    }

    pub fn save_campaign(&mut self, campaign: Campaign) {
        self.campaigns.insert(campaign.id, campaign);
    }

    pub fn load_campaign(&self, id: CampaignId) -> Result<&Campaign> {
        self.campaigns
            .get(&id)
            .ok_or(LedgerError::CampaignNotFound(id))
    }

    pub fn load_campaign_mut(&mut self, id: CampaignId) -> Result<&mut Campaign> {
        self.campaigns
            .get_mut(&id)
            .ok_or(LedgerError::CampaignNotFound(id))
    }

    pub fn remove_campaign(&mut self, id: CampaignId) -> Result<Campaign> {
        self.campaigns
            .remove(&id)
            .ok_or(LedgerError::CampaignNotFound(id))
    }

    /// Campaigns in id order.
    pub fn campaigns(&self) -> impl Iterator<Item = &Campaign> {
        self.campaigns.values()
    }

    pub fn campaign_count(&self) -> usize {
        self.campaigns.len()
    }
}
