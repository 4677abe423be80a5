//! Deletion recommendations.
//!
//! | Origin    | First reviewer        | Final decision |
//! |-----------|-----------------------|----------------|
//! | NGO       | volunteer review      | admin          |
//! | Admin     | volunteer review      | admin          |
//! | Volunteer | (none, goes straight) | admin          |
//!
//! Only an admin approval removes the campaign. Dismissing a recommendation
//! at either step leaves the campaign as it was; notifications already sent
//! are not retracted.

use tracing::info;

use crate::errors::{LedgerError, Result};
use crate::lifecycle::require_status;
use crate::notifications::Role;
use crate::queue::{ItemKind, VolunteerReview, WorkItem, WorkPayload};
use crate::types::{Campaign, CampaignId, CampaignStatus, Evidence, ItemId, ReviewSubmission};
use crate::{campaign_ref, peek_item, require_text, CampaignLedger, CampaignRef};

impl CampaignLedger {
    /// Open a deletion recommendation against a live campaign.
    pub fn recommend_deletion(
        &mut self,
        campaign_id: CampaignId,
        origin: Role,
        reason: &str,
        evidence: Vec<Evidence>,
    ) -> Result<ItemId> {
        let reason = require_text(reason, LedgerError::MissingReason)?;
        require_status(
            self.store.load_campaign(campaign_id)?,
            &[CampaignStatus::Live],
            "recommend deletion",
        )?;
        if self.volunteer_queue.has_open(campaign_id, ItemKind::Deletion)
            || self.admin_queue.has_open(campaign_id, ItemKind::Deletion)
        {
            return Err(LedgerError::DeletionAlreadyOpen(campaign_id));
        }

        let now = self.now();
        let item_id = self.store.next_item_id();
        let link = campaign_ref(self.store.load_campaign(campaign_id)?);
        let item = WorkItem {
            id: item_id,
            campaign_id,
            campaign_title: link.title.clone(),
            created_at: now,
            payload: WorkPayload::Deletion {
                origin,
                reason: reason.clone(),
                evidence,
                review: None,
            },
        };

        let title = &link.title;
        match origin {
            Role::Ngo => {
                self.volunteer_queue.push(item);
                self.notify(
                    Role::Ngo,
                    format!("Your deletion request for \"{title}\" was sent to a volunteer for review."),
                    &link,
                );
                self.notify(
                    Role::Volunteer,
                    format!("The NGO asked to delete \"{title}\": {reason}"),
                    &link,
                );
            }
            Role::Admin => {
                self.volunteer_queue.push(item);
                self.notify(
                    Role::Ngo,
                    format!("An admin flagged \"{title}\" for deletion review: {reason}"),
                    &link,
                );
                self.notify(
                    Role::Volunteer,
                    format!("An admin asked you to review \"{title}\" for deletion: {reason}"),
                    &link,
                );
                self.notify(
                    Role::Admin,
                    format!("Flagged \"{title}\" for deletion review."),
                    &link,
                );
            }
            Role::Volunteer => {
                self.admin_queue.push(item);
                self.notify(
                    Role::Ngo,
                    format!("A volunteer recommended deleting \"{title}\": {reason}"),
                    &link,
                );
                self.notify(
                    Role::Volunteer,
                    format!("You recommended deleting \"{title}\"."),
                    &link,
                );
                self.notify(
                    Role::Admin,
                    format!("Volunteer recommended deleting \"{title}\": {reason}"),
                    &link,
                );
            }
        }
        info!("Campaign {campaign_id} deletion recommended by {origin} (work item {item_id})");
        Ok(item_id)
    }

    /// Volunteer backs a deletion request and forwards it to the admins.
    pub fn submit_deletion_review(&mut self, item_id: ItemId, review: ReviewSubmission) -> Result<()> {
        require_text(&review.note, LedgerError::MissingNote)?;
        let campaign_id = peek_item(&self.volunteer_queue, item_id, ItemKind::Deletion)?.campaign_id;
        let link = campaign_ref(self.store.load_campaign(campaign_id)?);

        let now = self.now();
        let mut item = self
            .volunteer_queue
            .take(item_id)
            .ok_or(LedgerError::WorkItemNotFound(item_id))?;
        item.payload.set_review(VolunteerReview::signed(review, now));
        self.admin_queue.push(item);

        self.notify(
            Role::Ngo,
            format!(
                "The deletion review for \"{}\" was forwarded to the admins.",
                link.title
            ),
            &link,
        );
        self.notify(
            Role::Admin,
            format!("Deletion recommendation for \"{}\" awaits your decision.", link.title),
            &link,
        );
        info!("Campaign {campaign_id} deletion review forwarded to admins");
        Ok(())
    }

    /// Volunteer finds no grounds for deletion.
    pub fn dismiss_deletion_review(&mut self, item_id: ItemId) -> Result<()> {
        let item = peek_item(&self.volunteer_queue, item_id, ItemKind::Deletion)?;
        let link = CampaignRef {
            campaign_id: item.campaign_id,
            title: item.campaign_title.clone(),
        };
        self.volunteer_queue.take(item_id);

        self.notify(
            Role::Ngo,
            format!(
                "The deletion review for \"{}\" was closed by a volunteer.",
                link.title
            ),
            &link,
        );
        self.notify(
            Role::Volunteer,
            format!("You dismissed the deletion review for \"{}\".", link.title),
            &link,
        );
        info!("Campaign {} deletion review dismissed by volunteer", link.campaign_id);
        Ok(())
    }

    /// Admin confirms a deletion; the campaign leaves the ledger.
    pub fn approve_deletion(&mut self, item_id: ItemId) -> Result<Campaign> {
        let campaign_id = peek_item(&self.admin_queue, item_id, ItemKind::Deletion)?.campaign_id;
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
            format!("\"{}\" was deleted following the review.", link.title),
            &link,
        );
        self.notify(
            Role::Admin,
            format!("Deleted campaign \"{}\".", link.title),
            &link,
        );
        info!("Campaign {campaign_id} deleted by admin");
        Ok(removed)
    }

    /// Admin keeps the campaign and closes the recommendation.
    pub fn dismiss_deletion(&mut self, item_id: ItemId) -> Result<()> {
        let item = peek_item(&self.admin_queue, item_id, ItemKind::Deletion)?;
        let link = CampaignRef {
            campaign_id: item.campaign_id,
            title: item.campaign_title.clone(),
        };
        self.admin_queue.take(item_id);

        self.notify(
            Role::Ngo,
            format!(
                "The deletion recommendation for \"{}\" was dismissed by an admin.",
                link.title
            ),
            &link,
        );
        self.notify(
            Role::Volunteer,
            format!(
                "The deletion recommendation for \"{}\" was dismissed.",
                link.title
            ),
            &link,
        );
        self.notify(
            Role::Admin,
            format!("Dismissed deletion recommendation for \"{}\".", link.title),
            &link,
        );
        info!("Campaign {} deletion recommendation dismissed", link.campaign_id);
        Ok(())
    }
}
