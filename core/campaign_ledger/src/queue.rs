//! # Work queues
//!
//! A work item is one pending human decision. It lives in exactly one queue
//! at a time:
//!
//! | Queue       | Holds                                                   |
//! |-------------|---------------------------------------------------------|
//! | volunteer   | items assigned for field verification or review         |
//! | admin       | items a volunteer signed off on, waiting for a decision |
//!
//! Moving an item from the volunteer queue to the admin queue removes it from
//! the first and inserts it into the second under the same id.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notifications::Role;
use crate::types::{
    CampaignId, CampaignProposal, Evidence, FinalReport, ItemId, MilestoneId, ReviewSubmission,
};

/// Discriminant of [`WorkPayload`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Campaign,
    MilestoneRelease,
    Deletion,
    FinalReport,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Campaign => "campaign",
            Self::MilestoneRelease => "milestone release",
            Self::Deletion => "deletion",
            Self::FinalReport => "final report",
        })
    }
}

/// A volunteer's recorded sign-off.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerReview {
    pub volunteer: String,
    pub note: String,
    pub evidence: Vec<Evidence>,
    pub reviewed_at: DateTime<Utc>,
}

impl VolunteerReview {
    pub fn signed(submission: ReviewSubmission, at: DateTime<Utc>) -> Self {
        Self {
            volunteer: submission.volunteer.trim().to_string(),
            note: submission.note.trim().to_string(),
            evidence: submission.evidence,
            reviewed_at: at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkPayload {
    CampaignSubmission {
        organizer: String,
        proposal: CampaignProposal,
        #[serde(skip_serializing_if = "Option::is_none")]
        review: Option<VolunteerReview>,
    },
    MilestoneRelease {
        milestone_id: MilestoneId,
        milestone_title: String,
        target: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        review: Option<VolunteerReview>,
    },
    Deletion {
        origin: Role,
        reason: String,
        evidence: Vec<Evidence>,
        #[serde(skip_serializing_if = "Option::is_none")]
        review: Option<VolunteerReview>,
    },
    FinalReport {
        report: FinalReport,
        #[serde(skip_serializing_if = "Option::is_none")]
        review: Option<VolunteerReview>,
    },
}

impl WorkPayload {
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::CampaignSubmission { .. } => ItemKind::Campaign,
            Self::MilestoneRelease { .. } => ItemKind::MilestoneRelease,
            Self::Deletion { .. } => ItemKind::Deletion,
            Self::FinalReport { .. } => ItemKind::FinalReport,
        }
    }

    pub(crate) fn set_review(&mut self, signed: VolunteerReview) {
        match self {
            Self::CampaignSubmission { review, .. }
            | Self::MilestoneRelease { review, .. }
            | Self::Deletion { review, .. }
            | Self::FinalReport { review, .. } => *review = Some(signed),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: ItemId,
    pub campaign_id: CampaignId,
    pub campaign_title: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: WorkPayload,
}

impl WorkItem {
    pub fn kind(&self) -> ItemKind {
        self.payload.kind()
    }
}

/// Insertion-ordered (oldest first) list of work items.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct WorkQueue {
    items: Vec<WorkItem>,
}

impl WorkQueue {
    pub fn push(&mut self, item: WorkItem) {
        self.items.push(item);
    }

    pub fn get(&self, id: ItemId) -> Option<&WorkItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    pub fn take(&mut self, id: ItemId) -> Option<WorkItem> {
        let pos = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Drop every item that refers to `campaign_id`; returns how many were dropped.
    pub fn purge_campaign(&mut self, campaign_id: CampaignId) -> usize {
        let before = self.items.len();
        self.items.retain(|item| item.campaign_id != campaign_id);
        before - self.items.len()
    }

    pub fn has_open(&self, campaign_id: CampaignId, kind: ItemKind) -> bool {
        self.items
            .iter()
            .any(|item| item.campaign_id == campaign_id && item.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
