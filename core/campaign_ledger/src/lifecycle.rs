//! Campaign-level transitions: submission, admin decision, donations,
//! edits and the final-report cycle.

use serde::Serialize;
use tracing::info;

use crate::display::format_php;
use crate::errors::{LedgerError, Result};
use crate::notifications::Role;
use crate::queue::{ItemKind, VolunteerReview, WorkItem, WorkPayload};
use crate::types::{
    ActivityKind, ActivityRecord, Campaign, CampaignEdit, CampaignId, CampaignProposal,
    CampaignStatus, Donation, Evidence, FinalReport, ItemId, Milestone, MilestoneProposal,
    MilestoneStatus, ReviewSubmission, TxId,
};
use crate::{campaign_ref, peek_item, require_text, CampaignLedger};

/// Identifiers produced by [`CampaignLedger::submit_campaign`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Submitted {
    pub campaign_id: CampaignId,
    pub item_id: ItemId,
}

fn validate_milestones(proposals: &[MilestoneProposal]) -> Result<u64> {
    let mut total: u64 = 0;
    for proposal in proposals {
        if proposal.title.trim().is_empty() {
            return Err(LedgerError::InvalidProposal(
                "milestone title is required".to_string(),
            ));
        }
        if proposal.target == 0 {
            return Err(LedgerError::InvalidProposal(format!(
                "milestone \"{}\" needs a target above zero",
                proposal.title.trim()
            )));
        }
        total = total.checked_add(proposal.target).ok_or_else(|| {
            LedgerError::InvalidProposal("milestone targets overflow".to_string())
        })?;
    }
    Ok(total)
}

fn validate_proposal(proposal: &CampaignProposal) -> Result<()> {
    if proposal.title.trim().is_empty() {
        return Err(LedgerError::InvalidProposal("title is required".to_string()));
    }
    if proposal.organizer.trim().is_empty() {
        return Err(LedgerError::InvalidProposal(
            "organizer is required".to_string(),
        ));
    }
    if proposal.goal == 0 {
        return Err(LedgerError::InvalidProposal(
            "goal must be greater than zero".to_string(),
        ));
    }
    if proposal.milestones.is_empty() {
        return Err(LedgerError::InvalidProposal(
            "at least one milestone is required".to_string(),
        ));
    }
    let milestone_total = validate_milestones(&proposal.milestones)?;
    if milestone_total > proposal.goal {
        return Err(LedgerError::GoalMismatch {
            goal: proposal.goal,
            milestone_total,
        });
    }
    Ok(())
}

pub(crate) fn require_status(
    campaign: &Campaign,
    allowed: &[CampaignStatus],
    action: &'static str,
) -> Result<()> {
    if allowed.contains(&campaign.status) {
        Ok(())
    } else {
        Err(LedgerError::InvalidStatus {
            campaign_id: campaign.id,
            status: campaign.status,
            action,
        })
    }
}

impl CampaignLedger {
    // ─────────────────────────────────────────────────────────
    // Submission
    // ─────────────────────────────────────────────────────────

    /// Open a new campaign and assign it to a volunteer for vetting.
    pub fn submit_campaign(&mut self, proposal: CampaignProposal) -> Result<Submitted> {
        validate_proposal(&proposal)?;

        let now = self.now();
        let campaign_id = self.store.next_campaign_id();
        let item_id = self.store.next_item_id();
        let organizer = proposal.organizer.trim().to_string();

        let campaign = Campaign {
            id: campaign_id,
            title: proposal.title.trim().to_string(),
            location: proposal.location.trim().to_string(),
            organizer: organizer.clone(),
            description: proposal.description.trim().to_string(),
            image_url: proposal.image_url.trim().to_string(),
            goal: proposal.goal,
            raised: 0,
            status: CampaignStatus::PendingVolunteerVerification,
            milestones: Vec::new(),
            activity: Vec::new(),
            final_report: None,
            rejection_reason: None,
            created_at: now,
        };
        let link = campaign_ref(&campaign);

        self.volunteer_queue.push(WorkItem {
            id: item_id,
            campaign_id,
            campaign_title: campaign.title.clone(),
            created_at: now,
            payload: WorkPayload::CampaignSubmission {
                organizer: organizer.clone(),
                proposal,
                review: None,
            },
        });
        self.store.save_campaign(campaign);

        self.notify(
            Role::Ngo,
            format!(
                "Campaign \"{}\" was submitted and assigned to a volunteer for verification.",
                link.title
            ),
            &link,
        );
        info!("Campaign {campaign_id} submitted by {organizer} (work item {item_id})");
        Ok(Submitted {
            campaign_id,
            item_id,
        })
    }

    /// Volunteer vetted a submission; hand it to the admins.
    pub fn verify_submission(&mut self, item_id: ItemId, review: ReviewSubmission) -> Result<()> {
        let campaign_id = peek_item(&self.volunteer_queue, item_id, ItemKind::Campaign)?.campaign_id;
        let campaign = self.store.load_campaign(campaign_id)?;
        require_status(
            campaign,
            &[CampaignStatus::PendingVolunteerVerification],
            "verify the submission",
        )?;

        let now = self.now();
        let mut item = self
            .volunteer_queue
            .take(item_id)
            .ok_or(LedgerError::WorkItemNotFound(item_id))?;
        let volunteer = review.volunteer.trim().to_string();
        item.payload.set_review(VolunteerReview::signed(review, now));
        self.admin_queue.push(item);

        let campaign = self.store.load_campaign_mut(campaign_id)?;
        campaign.status = CampaignStatus::AwaitingAdminVerification;
        let link = campaign_ref(campaign);

        self.notify(
            Role::Ngo,
            format!(
                "\"{}\" passed volunteer verification and is awaiting admin approval.",
                link.title
            ),
            &link,
        );
        self.notify(
            Role::Volunteer,
            format!("{volunteer} verified the campaign submission \"{}\".", link.title),
            &link,
        );
        info!("Campaign {campaign_id} verified by volunteer {volunteer}");
        Ok(())
    }

    /// Volunteer throws a submission out; the campaign is removed.
    pub fn discard_submission(&mut self, item_id: ItemId) -> Result<Campaign> {
        let campaign_id = peek_item(&self.volunteer_queue, item_id, ItemKind::Campaign)?.campaign_id;
        self.store.load_campaign(campaign_id)?;
        self.volunteer_queue.take(item_id);
        let removed = self.purge(campaign_id)?;
        let link = campaign_ref(&removed);

        self.notify(
            Role::Ngo,
            format!(
                "\"{}\" was declined during volunteer verification and removed.",
                link.title
            ),
            &link,
        );
        self.notify(
            Role::Volunteer,
            format!("You discarded the submission \"{}\".", link.title),
            &link,
        );
        self.notify(
            Role::Admin,
            format!("Volunteer discarded submission \"{}\".", link.title),
            &link,
        );
        info!("Campaign {campaign_id} discarded during volunteer verification");
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────
    // Admin decision
    // ─────────────────────────────────────────────────────────

    /// Admin approves a vetted submission: milestones are created `Locked`
    /// and the campaign goes live.
    pub fn approve_campaign(&mut self, item_id: ItemId) -> Result<()> {
        let item = peek_item(&self.admin_queue, item_id, ItemKind::Campaign)?;
        let campaign_id = item.campaign_id;
        let proposals = match &item.payload {
            WorkPayload::CampaignSubmission { proposal, .. } => proposal.milestones.clone(),
            other => {
                return Err(LedgerError::WrongItemKind {
                    item_id,
                    expected: ItemKind::Campaign,
                    found: other.kind(),
                })
            }
        };
        require_status(
            self.store.load_campaign(campaign_id)?,
            &[CampaignStatus::AwaitingAdminVerification],
            "approve the campaign",
        )?;

        let now = self.now();
        let tx = self.store.next_tx();
        let milestones: Vec<Milestone> = proposals
            .iter()
            .map(|p| Milestone::locked(self.store.next_milestone_id(), p))
            .collect();
        self.admin_queue.take(item_id);

        let campaign = self.store.load_campaign_mut(campaign_id)?;
        campaign.milestones = milestones;
        campaign.status = CampaignStatus::Live;
        campaign.record(ActivityRecord {
            hash: tx,
            timestamp: now,
            kind: ActivityKind::CampaignApproved,
            description: format!("Campaign \"{}\" has been approved and is now live", campaign.title),
            amount: None,
            donor_address: None,
            donation_method: None,
        });
        let link = campaign_ref(campaign);

        self.notify(
            Role::Ngo,
            format!("\"{}\" has been approved and is now live.", link.title),
            &link,
        );
        self.notify(
            Role::Volunteer,
            format!("The campaign you verified, \"{}\", is now live.", link.title),
            &link,
        );
        self.notify(
            Role::Admin,
            format!("Approved campaign \"{}\".", link.title),
            &link,
        );
        info!("Campaign {campaign_id} approved and live");
        Ok(())
    }

    pub fn reject_campaign(&mut self, item_id: ItemId, reason: &str) -> Result<()> {
        let reason = require_text(reason, LedgerError::MissingReason)?;
        let campaign_id = peek_item(&self.admin_queue, item_id, ItemKind::Campaign)?.campaign_id;
        require_status(
            self.store.load_campaign(campaign_id)?,
            &[CampaignStatus::AwaitingAdminVerification],
            "reject the campaign",
        )?;

        self.admin_queue.take(item_id);
        let campaign = self.store.load_campaign_mut(campaign_id)?;
        campaign.status = CampaignStatus::Rejected;
        campaign.rejection_reason = Some(reason.clone());
        let link = campaign_ref(campaign);

        self.notify(
            Role::Ngo,
            format!("\"{}\" was rejected: {reason}", link.title),
            &link,
        );
        self.notify(
            Role::Volunteer,
            format!("The campaign you verified, \"{}\", was rejected.", link.title),
            &link,
        );
        self.notify(
            Role::Admin,
            format!("Rejected campaign \"{}\": {reason}", link.title),
            &link,
        );
        info!("Campaign {campaign_id} rejected: {reason}");
        Ok(())
    }

    /// Admin deletes a submission outright instead of deciding on it.
    pub fn delete_submission(&mut self, item_id: ItemId) -> Result<Campaign> {
        let campaign_id = peek_item(&self.admin_queue, item_id, ItemKind::Campaign)?.campaign_id;
        self.store.load_campaign(campaign_id)?;
        self.admin_queue.take(item_id);
        let removed = self.purge(campaign_id)?;
        let link = campaign_ref(&removed);

        self.notify(
            Role::Ngo,
            format!("\"{}\" was deleted by an admin.", link.title),
            &link,
        );
        self.notify(
            Role::Volunteer,
            format!("The submission \"{}\" was deleted by an admin.", link.title),
            &link,
        );
        self.notify(
            Role::Admin,
            format!("Deleted submission \"{}\".", link.title),
            &link,
        );
        info!("Campaign {campaign_id} submission deleted by admin");
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────
    // Funding
    // ─────────────────────────────────────────────────────────

    /// Record a confirmed donation to a live campaign.
    pub fn donate(&mut self, campaign_id: CampaignId, donation: Donation) -> Result<TxId> {
        if donation.amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let campaign = self.store.load_campaign(campaign_id)?;
        require_status(campaign, &[CampaignStatus::Live], "donate")?;
        let raised = campaign
            .raised
            .checked_add(donation.amount)
            .ok_or(LedgerError::InvalidAmount)?;

        let now = self.now();
        let tx = self.store.next_tx();
        let donor = donation.donor_label();
        let amount = format_php(donation.amount);

        let campaign = self.store.load_campaign_mut(campaign_id)?;
        campaign.raised = raised;
        campaign.record(ActivityRecord {
            hash: tx,
            timestamp: now,
            kind: ActivityKind::Donation,
            description: format!("Donation of {amount} via {}", donation.method.label()),
            amount: Some(donation.amount),
            donor_address: Some(donor.clone()),
            donation_method: Some(donation.method),
        });
        let link = campaign_ref(campaign);

        self.notify(
            Role::Ngo,
            format!(
                "New donation of {amount} to \"{}\" from {donor} via {} (tx {tx}).",
                link.title,
                donation.method.label()
            ),
            &link,
        );
        info!("Campaign {campaign_id} received {amount} from {donor} (tx {tx})");
        Ok(tx)
    }

    /// NGO updates a running campaign. Appended milestones start `Locked`;
    /// appending to a campaign waiting for its final report puts it back live.
    pub fn edit_campaign(&mut self, campaign_id: CampaignId, edit: CampaignEdit) -> Result<()> {
        let campaign = self.store.load_campaign(campaign_id)?;
        require_status(
            campaign,
            &[CampaignStatus::Live, CampaignStatus::PendingFinalReport],
            "edit the campaign",
        )?;

        let title = match &edit.title {
            Some(title) => Some(require_text(
                title,
                LedgerError::InvalidProposal("title is required".to_string()),
            )?),
            None => None,
        };
        let goal = edit.goal.unwrap_or(campaign.goal);
        if goal == 0 {
            return Err(LedgerError::InvalidProposal(
                "goal must be greater than zero".to_string(),
            ));
        }
        let added = validate_milestones(&edit.new_milestones)?;
        let milestone_total = campaign.milestone_total().saturating_add(added);
        if milestone_total > goal {
            return Err(LedgerError::GoalMismatch {
                goal,
                milestone_total,
            });
        }

        let new_milestones: Vec<Milestone> = edit
            .new_milestones
            .iter()
            .map(|p| Milestone::locked(self.store.next_milestone_id(), p))
            .collect();

        let campaign = self.store.load_campaign_mut(campaign_id)?;
        if let Some(title) = title {
            campaign.title = title;
        }
        if let Some(location) = edit.location {
            campaign.location = location.trim().to_string();
        }
        if let Some(description) = edit.description {
            campaign.description = description.trim().to_string();
        }
        if let Some(image_url) = edit.image_url {
            campaign.image_url = image_url.trim().to_string();
        }
        campaign.goal = goal;
        let reopened = !new_milestones.is_empty()
            && campaign.status == CampaignStatus::PendingFinalReport;
        campaign.milestones.extend(new_milestones);
        if reopened {
            campaign.status = CampaignStatus::Live;
        }
        let link = campaign_ref(campaign);

        self.notify(
            Role::Ngo,
            format!("Campaign \"{}\" was updated.", link.title),
            &link,
        );
        info!("Campaign {campaign_id} edited (reopened: {reopened})");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Completion
    // ─────────────────────────────────────────────────────────

    /// NGO files the final report once every milestone is released.
    pub fn submit_final_report(
        &mut self,
        campaign_id: CampaignId,
        narrative: &str,
        evidence: Vec<Evidence>,
    ) -> Result<ItemId> {
        let campaign = self.store.load_campaign(campaign_id)?;
        require_status(
            campaign,
            &[CampaignStatus::Live, CampaignStatus::PendingFinalReport],
            "submit a final report",
        )?;
        if !campaign.all_released() {
            return Err(LedgerError::MilestonesUnreleased {
                campaign_id,
                unreleased: campaign
                    .milestones
                    .iter()
                    .filter(|m| m.status != MilestoneStatus::VerifiedReleased)
                    .count(),
            });
        }
        let narrative = require_text(narrative, LedgerError::MissingNote)?;

        let now = self.now();
        let item_id = self.store.next_item_id();
        let campaign = self.store.load_campaign_mut(campaign_id)?;
        campaign.status = CampaignStatus::CompletionPendingVolunteerReview;
        let link = campaign_ref(campaign);

        self.volunteer_queue.push(WorkItem {
            id: item_id,
            campaign_id,
            campaign_title: link.title.clone(),
            created_at: now,
            payload: WorkPayload::FinalReport {
                report: FinalReport {
                    narrative,
                    evidence,
                    submitted_at: now,
                },
                review: None,
            },
        });

        self.notify(
            Role::Ngo,
            format!(
                "Final report for \"{}\" submitted for volunteer review.",
                link.title
            ),
            &link,
        );
        self.notify(
            Role::Volunteer,
            format!("New final report to review for \"{}\".", link.title),
            &link,
        );
        info!("Campaign {campaign_id} final report submitted (work item {item_id})");
        Ok(item_id)
    }

    /// Volunteer confirms the final report on the ground.
    pub fn verify_final_report(&mut self, item_id: ItemId, review: ReviewSubmission) -> Result<()> {
        require_text(&review.note, LedgerError::MissingNote)?;
        if review.evidence.is_empty() {
            return Err(LedgerError::MissingEvidence);
        }
        let campaign_id =
            peek_item(&self.volunteer_queue, item_id, ItemKind::FinalReport)?.campaign_id;
        require_status(
            self.store.load_campaign(campaign_id)?,
            &[CampaignStatus::CompletionPendingVolunteerReview],
            "verify the final report",
        )?;

        let now = self.now();
        let mut item = self
            .volunteer_queue
            .take(item_id)
            .ok_or(LedgerError::WorkItemNotFound(item_id))?;
        item.payload.set_review(VolunteerReview::signed(review, now));
        self.admin_queue.push(item);

        let campaign = self.store.load_campaign_mut(campaign_id)?;
        campaign.status = CampaignStatus::CompletionPendingAdminApproval;
        let link = campaign_ref(campaign);

        self.notify(
            Role::Ngo,
            format!(
                "Final report for \"{}\" was verified and awaits admin approval.",
                link.title
            ),
            &link,
        );
        self.notify(
            Role::Volunteer,
            format!("You verified the final report for \"{}\".", link.title),
            &link,
        );
        info!("Campaign {campaign_id} final report verified by volunteer");
        Ok(())
    }

    pub fn approve_final_report(&mut self, item_id: ItemId) -> Result<()> {
        let item = peek_item(&self.admin_queue, item_id, ItemKind::FinalReport)?;
        let campaign_id = item.campaign_id;
        require_status(
            self.store.load_campaign(campaign_id)?,
            &[CampaignStatus::CompletionPendingAdminApproval],
            "approve the final report",
        )?;

        let item = self
            .admin_queue
            .take(item_id)
            .ok_or(LedgerError::WorkItemNotFound(item_id))?;
        let report = match item.payload {
            WorkPayload::FinalReport { report, .. } => report,
            other => {
                return Err(LedgerError::WrongItemKind {
                    item_id,
                    expected: ItemKind::FinalReport,
                    found: other.kind(),
                })
            }
        };

        let campaign = self.store.load_campaign_mut(campaign_id)?;
        campaign.status = CampaignStatus::Completed;
        campaign.final_report = Some(report);
        let link = campaign_ref(campaign);

        self.notify(
            Role::Ngo,
            format!("\"{}\" is now completed. Thank you!", link.title),
            &link,
        );
        self.notify(
            Role::Volunteer,
            format!("The final report for \"{}\" was approved.", link.title),
            &link,
        );
        self.notify(
            Role::Admin,
            format!("Approved final report for \"{}\".", link.title),
            &link,
        );
        info!("Campaign {campaign_id} completed");
        Ok(())
    }

    /// Admin turns the final report down; the campaign returns to `Live`.
    pub fn reject_final_report(&mut self, item_id: ItemId, reason: &str) -> Result<()> {
        let reason = require_text(reason, LedgerError::MissingReason)?;
        let campaign_id = peek_item(&self.admin_queue, item_id, ItemKind::FinalReport)?.campaign_id;
        require_status(
            self.store.load_campaign(campaign_id)?,
            &[CampaignStatus::CompletionPendingAdminApproval],
            "reject the final report",
        )?;

        self.admin_queue.take(item_id);
        let campaign = self.store.load_campaign_mut(campaign_id)?;
        campaign.status = CampaignStatus::Live;
        let link = campaign_ref(campaign);

        self.notify(
            Role::Ngo,
            format!("Final report for \"{}\" was rejected: {reason}", link.title),
            &link,
        );
        self.notify(
            Role::Volunteer,
            format!("The final report for \"{}\" was rejected.", link.title),
            &link,
        );
        self.notify(
            Role::Admin,
            format!("Rejected final report for \"{}\": {reason}", link.title),
            &link,
        );
        info!("Campaign {campaign_id} final report rejected: {reason}");
        Ok(())
    }

    /// Remove a campaign and every work item that still refers to it.
    pub(crate) fn purge(&mut self, campaign_id: CampaignId) -> Result<Campaign> {
        let removed = self.store.remove_campaign(campaign_id)?;
        let dropped = self.volunteer_queue.purge_campaign(campaign_id)
            + self.admin_queue.purge_campaign(campaign_id);
        info!("Campaign {campaign_id} removed from ledger ({dropped} open work item(s) dropped)");
        Ok(removed)
    }
}
