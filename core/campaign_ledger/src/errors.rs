//! Ledger error types.
//!
//! Every transition either applies completely or returns one of these and
//! leaves the ledger untouched.

use thiserror::Error;

use crate::queue::ItemKind;
use crate::types::{CampaignId, CampaignStatus, ItemId, MilestoneId, MilestoneStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("campaign {0} not found")]
    CampaignNotFound(CampaignId),

    #[error("milestone {milestone_id} not found in campaign {campaign_id}")]
    MilestoneNotFound {
        campaign_id: CampaignId,
        milestone_id: MilestoneId,
    },

    #[error("work item {0} not found in queue")]
    WorkItemNotFound(ItemId),

    #[error("work item {item_id} is a {found} item, expected {expected}")]
    WrongItemKind {
        item_id: ItemId,
        expected: ItemKind,
        found: ItemKind,
    },

    #[error("cannot {action}: campaign {campaign_id} is {status}")]
    InvalidStatus {
        campaign_id: CampaignId,
        status: CampaignStatus,
        action: &'static str,
    },

    #[error("milestone {milestone_id} is {status}, expected Locked")]
    MilestoneNotLocked {
        milestone_id: MilestoneId,
        status: MilestoneStatus,
    },

    #[error("cannot {action}: milestone {milestone_id} is {status}")]
    InvalidMilestoneStatus {
        milestone_id: MilestoneId,
        status: MilestoneStatus,
        action: &'static str,
    },

    #[error("milestone {milestone_id} is not next; milestone {next} must be released first")]
    PrecedingMilestoneUnresolved {
        milestone_id: MilestoneId,
        next: MilestoneId,
    },

    #[error("milestone {milestone_id} of campaign {campaign_id} is already under review")]
    MilestoneAlreadyOutstanding {
        campaign_id: CampaignId,
        milestone_id: MilestoneId,
    },

    #[error("insufficient escrow funds: {available} available, {required} required")]
    InsufficientEscrowFunds { available: u64, required: u64 },

    #[error("campaign {campaign_id} still has {unreleased} unreleased milestone(s)")]
    MilestonesUnreleased {
        campaign_id: CampaignId,
        unreleased: usize,
    },

    #[error("a deletion review is already open for campaign {0}")]
    DeletionAlreadyOpen(CampaignId),

    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("a reason is required")]
    MissingReason,

    #[error("a note or report is required")]
    MissingNote,

    #[error("at least one evidence item is required")]
    MissingEvidence,

    #[error("invalid proposal: {0}")]
    InvalidProposal(String),

    #[error("milestone targets ({milestone_total}) exceed the goal ({goal})")]
    GoalMismatch { goal: u64, milestone_total: u64 },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
