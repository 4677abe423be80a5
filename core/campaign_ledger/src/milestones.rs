//! Escrow release cycle for milestones.
//!
//! ```text
//! NGO request ──► volunteer report ──► admin approve ──► Verified & Released
//!                                          └──────────► Rejected
//! ```

use tracing::{info, warn};

use crate::display::format_php;
use crate::errors::{LedgerError, Result};
use crate::lifecycle::require_status;
use crate::notifications::Role;
use crate::queue::{ItemKind, VolunteerReview, WorkItem, WorkPayload};
use crate::types::{
    ActivityKind, ActivityRecord, Campaign, CampaignId, CampaignStatus, ItemId, Milestone,
    MilestoneId, MilestoneStatus, ReviewSubmission, TxId,
};
use crate::{campaign_ref, peek_item, require_text, CampaignLedger};

fn milestone_of(item: &WorkItem) -> Result<MilestoneId> {
    match &item.payload {
        WorkPayload::MilestoneRelease { milestone_id, .. } => Ok(*milestone_id),
        other => Err(LedgerError::WrongItemKind {
            item_id: item.id,
            expected: ItemKind::MilestoneRelease,
            found: other.kind(),
        }),
    }
}

fn require_milestone_status<'a>(
    campaign: &'a Campaign,
    milestone_id: MilestoneId,
    expected: MilestoneStatus,
    action: &'static str,
) -> Result<&'a Milestone> {
    let milestone = campaign
        .milestone(milestone_id)
        .ok_or(LedgerError::MilestoneNotFound {
            campaign_id: campaign.id,
            milestone_id,
        })?;
    if milestone.status != expected {
        return Err(LedgerError::InvalidMilestoneStatus {
            milestone_id,
            status: milestone.status,
            action,
        });
    }
    Ok(milestone)
}

/// Checks the ordering and funding rules for a release request.
fn check_release(campaign: &Campaign, milestone_id: MilestoneId) -> Result<u64> {
    require_status(campaign, &[CampaignStatus::Live], "request a milestone release")?;
    let milestone = campaign
        .milestone(milestone_id)
        .ok_or(LedgerError::MilestoneNotFound {
            campaign_id: campaign.id,
            milestone_id,
        })?;
    if let Some(outstanding) = campaign.outstanding_milestone() {
        return Err(LedgerError::MilestoneAlreadyOutstanding {
            campaign_id: campaign.id,
            milestone_id: outstanding.id,
        });
    }
    if milestone.status != MilestoneStatus::Locked {
        return Err(LedgerError::MilestoneNotLocked {
            milestone_id,
            status: milestone.status,
        });
    }
    if let Some(next) = campaign.next_locked() {
        if next.id != milestone_id {
            return Err(LedgerError::PrecedingMilestoneUnresolved {
                milestone_id,
                next: next.id,
            });
        }
    }
    let available = campaign.available_funds();
    if available < milestone.target {
        return Err(LedgerError::InsufficientEscrowFunds {
            available,
            required: milestone.target,
        });
    }
    Ok(milestone.target)
}

impl CampaignLedger {
    /// NGO asks for the next milestone's funds; a volunteer is assigned to
    /// verify the work on the ground.
    pub fn request_milestone_release(
        &mut self,
        campaign_id: CampaignId,
        milestone_id: MilestoneId,
    ) -> Result<ItemId> {
        let campaign = self.store.load_campaign(campaign_id)?;
        let target = match check_release(campaign, milestone_id) {
            Ok(target) => target,
            Err(e) => {
                warn!("Release request for milestone {milestone_id} of campaign {campaign_id} refused: {e}");
                return Err(e);
            }
        };

        let now = self.now();
        let item_id = self.store.next_item_id();
        let campaign = self.store.load_campaign_mut(campaign_id)?;
        let link = campaign_ref(campaign);
        let Some(milestone) = campaign.milestone_mut(milestone_id) else {
            return Err(LedgerError::MilestoneNotFound {
                campaign_id,
                milestone_id,
            });
        };
        milestone.status = MilestoneStatus::PendingVolunteerVerification;
        let milestone_title = milestone.title.clone();

        self.volunteer_queue.push(WorkItem {
            id: item_id,
            campaign_id,
            campaign_title: link.title.clone(),
            created_at: now,
            payload: WorkPayload::MilestoneRelease {
                milestone_id,
                milestone_title: milestone_title.clone(),
                target,
                review: None,
            },
        });

        self.notify(
            Role::Ngo,
            format!(
                "Release of {} for milestone \"{milestone_title}\" of \"{}\" requested; a volunteer will verify it.",
                format_php(target),
                link.title
            ),
            &link,
        );
        info!("Campaign {campaign_id} milestone {milestone_id} release requested (work item {item_id})");
        Ok(item_id)
    }

    /// Volunteer files the field report for a requested release.
    pub fn submit_milestone_report(
        &mut self,
        item_id: ItemId,
        review: ReviewSubmission,
    ) -> Result<()> {
        require_text(&review.note, LedgerError::MissingNote)?;
        if review.evidence.is_empty() {
            return Err(LedgerError::MissingEvidence);
        }
        let item = peek_item(&self.volunteer_queue, item_id, ItemKind::MilestoneRelease)?;
        let campaign_id = item.campaign_id;
        let milestone_id = milestone_of(item)?;
        require_milestone_status(
            self.store.load_campaign(campaign_id)?,
            milestone_id,
            MilestoneStatus::PendingVolunteerVerification,
            "submit a milestone report",
        )?;

        let now = self.now();
        let volunteer = review.volunteer.trim().to_string();
        let campaign = self.store.load_campaign_mut(campaign_id)?;
        let link = campaign_ref(campaign);
        let Some(milestone) = campaign.milestone_mut(milestone_id) else {
            return Err(LedgerError::MilestoneNotFound {
                campaign_id,
                milestone_id,
            });
        };
        milestone.status = MilestoneStatus::InVerification;
        milestone.verifier = Some(volunteer.clone());
        let milestone_title = milestone.title.clone();

        let mut item = self
            .volunteer_queue
            .take(item_id)
            .ok_or(LedgerError::WorkItemNotFound(item_id))?;
        item.payload.set_review(VolunteerReview::signed(review, now));
        self.admin_queue.push(item);

        self.notify(
            Role::Ngo,
            format!(
                "Milestone \"{milestone_title}\" of \"{}\" was verified on the ground and awaits admin approval.",
                link.title
            ),
            &link,
        );
        self.notify(
            Role::Volunteer,
            format!(
                "{volunteer} submitted the report for milestone \"{milestone_title}\" of \"{}\".",
                link.title
            ),
            &link,
        );
        info!("Campaign {campaign_id} milestone {milestone_id} report submitted by {volunteer}");
        Ok(())
    }

    /// Admin releases the escrowed target of a verified milestone.
    ///
    /// Once every milestone is released the campaign moves to
    /// `PendingFinalReport`.
    pub fn approve_milestone_release(&mut self, item_id: ItemId) -> Result<TxId> {
        let item = peek_item(&self.admin_queue, item_id, ItemKind::MilestoneRelease)?;
        let campaign_id = item.campaign_id;
        let milestone_id = milestone_of(item)?;
        let campaign = self.store.load_campaign(campaign_id)?;
        require_status(campaign, &[CampaignStatus::Live], "release milestone funds")?;
        let target = require_milestone_status(
            campaign,
            milestone_id,
            MilestoneStatus::InVerification,
            "release milestone funds",
        )?
        .target;
        let available = campaign.available_funds();
        if available < target {
            return Err(LedgerError::InsufficientEscrowFunds {
                available,
                required: target,
            });
        }

        let now = self.now();
        let tx = self.store.next_tx();
        let campaign = self.store.load_campaign_mut(campaign_id)?;
        let Some(milestone) = campaign.milestone_mut(milestone_id) else {
            return Err(LedgerError::MilestoneNotFound {
                campaign_id,
                milestone_id,
            });
        };
        milestone.status = MilestoneStatus::VerifiedReleased;
        milestone.verification_tx = Some(tx);
        milestone.released_at = Some(now);
        let milestone_title = milestone.title.clone();
        campaign.record(ActivityRecord {
            hash: tx,
            timestamp: now,
            kind: ActivityKind::FundsReleased,
            description: format!("Funds released for \"{milestone_title}\""),
            amount: Some(target),
            donor_address: None,
            donation_method: None,
        });
        let finished = campaign.all_released();
        if finished {
            campaign.status = CampaignStatus::PendingFinalReport;
        }
        let link = campaign_ref(campaign);
        let amount = format_php(target);
        self.admin_queue.take(item_id);

        self.notify(
            Role::Ngo,
            format!(
                "{amount} released for milestone \"{milestone_title}\" of \"{}\" (tx {tx}).",
                link.title
            ),
            &link,
        );
        self.notify(
            Role::Volunteer,
            format!(
                "Milestone \"{milestone_title}\" of \"{}\" you verified was released.",
                link.title
            ),
            &link,
        );
        self.notify(
            Role::Admin,
            format!(
                "Released {amount} for milestone \"{milestone_title}\" of \"{}\".",
                link.title
            ),
            &link,
        );
        info!("Campaign {campaign_id} milestone {milestone_id} released {amount} (tx {tx}, all released: {finished})");
        Ok(tx)
    }

    /// Admin turns a release down. The milestone stays `Rejected`.
    pub fn reject_milestone_release(&mut self, item_id: ItemId, reason: &str) -> Result<()> {
        let reason = require_text(reason, LedgerError::MissingReason)?;
        let item = peek_item(&self.admin_queue, item_id, ItemKind::MilestoneRelease)?;
        let campaign_id = item.campaign_id;
        let milestone_id = milestone_of(item)?;
        require_milestone_status(
            self.store.load_campaign(campaign_id)?,
            milestone_id,
            MilestoneStatus::InVerification,
            "reject the milestone release",
        )?;

        let campaign = self.store.load_campaign_mut(campaign_id)?;
        let link = campaign_ref(campaign);
        let Some(milestone) = campaign.milestone_mut(milestone_id) else {
            return Err(LedgerError::MilestoneNotFound {
                campaign_id,
                milestone_id,
            });
        };
        milestone.status = MilestoneStatus::Rejected;
        milestone.rejection_reason = Some(reason.clone());
        let milestone_title = milestone.title.clone();
        self.admin_queue.take(item_id);

        self.notify(
            Role::Ngo,
            format!(
                "Release for milestone \"{milestone_title}\" of \"{}\" was rejected: {reason}",
                link.title
            ),
            &link,
        );
        self.notify(
            Role::Volunteer,
            format!(
                "Milestone \"{milestone_title}\" of \"{}\" you verified was rejected.",
                link.title
            ),
            &link,
        );
        self.notify(
            Role::Admin,
            format!(
                "Rejected release for milestone \"{milestone_title}\" of \"{}\": {reason}",
                link.title
            ),
            &link,
        );
        info!("Campaign {campaign_id} milestone {milestone_id} release rejected: {reason}");
        Ok(())
    }
}
