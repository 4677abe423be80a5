//! Axum REST API handlers.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use campaign_ledger::views::{self, AnalyticsData, DonorSummary, ExplorerEvent, PlatformDonation};
use campaign_ledger::{
    Campaign, CampaignEdit, CampaignId, CampaignLedger, CampaignProposal, Donation, Evidence,
    ItemId, ItemKind, LedgerError, MilestoneId, Notification, ReviewSubmission, Role, Submitted,
    TxId, WorkItem, WorkQueue,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::errors::{ApiError, Result};

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<RwLock<CampaignLedger>>,
    pub latency: Duration,
}

impl AppState {
    pub fn new(ledger: CampaignLedger, latency: Duration) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            latency,
        }
    }

    /// Awaited by mutating handlers after the write lock is released.
    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/campaigns", get(list_campaigns).post(create_campaign))
        .route("/campaigns/:id", get(get_campaign).patch(edit_campaign))
        .route("/campaigns/:id/donations", post(donate))
        .route(
            "/campaigns/:id/milestones/:milestone_id/release",
            post(request_release),
        )
        .route("/campaigns/:id/final-report", post(submit_final_report))
        .route("/campaigns/:id/deletion-requests", post(recommend_deletion))
        .route("/queues/volunteer", get(volunteer_queue))
        .route("/queues/volunteer/:item_id/complete", post(complete_volunteer_item))
        .route("/queues/volunteer/:item_id/discard", post(discard_volunteer_item))
        .route("/queues/admin", get(admin_queue))
        .route("/queues/admin/:item_id/approve", post(approve_admin_item))
        .route("/queues/admin/:item_id/reject", post(reject_admin_item))
        .route("/queues/admin/:item_id/discard", post(discard_admin_item))
        .route("/notifications/:role", get(notifications))
        .route("/views/donations", get(donations_view))
        .route("/views/donors", get(donors_view))
        .route("/views/analytics", get(analytics_view))
        .route("/views/explorer", get(explorer_view))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// A campaign plus the figures the dashboards derive from it.
#[derive(Serialize)]
pub struct CampaignView {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub status_label: &'static str,
    pub available_funds: u64,
    pub percent_funded: u8,
}

impl From<&Campaign> for CampaignView {
    fn from(campaign: &Campaign) -> Self {
        Self {
            status_label: campaign.status.label(),
            available_funds: campaign.available_funds(),
            percent_funded: campaign.percent_funded(),
            campaign: campaign.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct CampaignsResponse {
    pub count: usize,
    pub campaigns: Vec<CampaignView>,
}

#[derive(Serialize)]
pub struct DonationReceipt {
    pub tx: TxId,
    pub raised: u64,
    pub available_funds: u64,
}

#[derive(Serialize)]
pub struct QueuedResponse {
    pub item_id: ItemId,
}

#[derive(Deserialize)]
pub struct FinalReportRequest {
    pub narrative: String,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

#[derive(Deserialize)]
pub struct DeletionRequest {
    pub origin: Role,
    pub reason: String,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

#[derive(Deserialize, Default)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Serialize)]
pub struct QueueResponse {
    pub count: usize,
    pub items: Vec<WorkItem>,
}

impl From<&WorkQueue> for QueueResponse {
    fn from(queue: &WorkQueue) -> Self {
        Self {
            count: queue.len(),
            items: queue.iter().cloned().collect(),
        }
    }
}

/// Result of acting on a work item.
#[derive(Serialize)]
pub struct ItemOutcome {
    pub item_id: ItemId,
    pub kind: ItemKind,
    pub campaign_id: CampaignId,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx: Option<TxId>,
}

#[derive(Serialize)]
pub struct NotificationsResponse {
    pub role: Role,
    pub count: usize,
    pub notifications: VecDeque<Notification>,
}

#[derive(Serialize)]
pub struct DonationsResponse {
    pub count: usize,
    pub donations: Vec<PlatformDonation>,
}

#[derive(Serialize)]
pub struct DonorsResponse {
    pub count: usize,
    pub donors: Vec<DonorSummary>,
}

#[derive(Serialize)]
pub struct ExplorerResponse {
    pub count: usize,
    pub events: Vec<ExplorerEvent>,
}

fn queued_item(queue: &WorkQueue, item_id: ItemId) -> Result<(ItemKind, CampaignId)> {
    queue
        .get(item_id)
        .map(|item| (item.kind(), item.campaign_id))
        .ok_or(ApiError::Ledger(LedgerError::WorkItemNotFound(item_id)))
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /campaigns`
pub async fn list_campaigns(State(state): State<AppState>) -> Json<CampaignsResponse> {
    let ledger = state.ledger.read().await;
    let campaigns: Vec<CampaignView> = ledger.campaigns().map(CampaignView::from).collect();
    Json(CampaignsResponse {
        count: campaigns.len(),
        campaigns,
    })
}

/// `POST /campaigns`
pub async fn create_campaign(
    State(state): State<AppState>,
    Json(proposal): Json<CampaignProposal>,
) -> Result<(StatusCode, Json<Submitted>)> {
    let submitted = state.ledger.write().await.submit_campaign(proposal)?;
    state.simulate_latency().await;
    Ok((StatusCode::CREATED, Json(submitted)))
}

/// `GET /campaigns/:id`
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<CampaignId>,
) -> Result<Json<CampaignView>> {
    let ledger = state.ledger.read().await;
    Ok(Json(CampaignView::from(ledger.campaign(id)?)))
}

/// `PATCH /campaigns/:id`
pub async fn edit_campaign(
    State(state): State<AppState>,
    Path(id): Path<CampaignId>,
    Json(edit): Json<CampaignEdit>,
) -> Result<Json<CampaignView>> {
    let view = {
        let mut ledger = state.ledger.write().await;
        ledger.edit_campaign(id, edit)?;
        CampaignView::from(ledger.campaign(id)?)
    };
    state.simulate_latency().await;
    Ok(Json(view))
}

/// `POST /campaigns/:id/donations`
pub async fn donate(
    State(state): State<AppState>,
    Path(id): Path<CampaignId>,
    Json(donation): Json<Donation>,
) -> Result<(StatusCode, Json<DonationReceipt>)> {
    let receipt = {
        let mut ledger = state.ledger.write().await;
        let tx = ledger.donate(id, donation)?;
        let campaign = ledger.campaign(id)?;
        DonationReceipt {
            tx,
            raised: campaign.raised,
            available_funds: campaign.available_funds(),
        }
    };
    state.simulate_latency().await;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// `POST /campaigns/:id/milestones/:milestone_id/release`
pub async fn request_release(
    State(state): State<AppState>,
    Path((id, milestone_id)): Path<(CampaignId, MilestoneId)>,
) -> Result<(StatusCode, Json<QueuedResponse>)> {
    let item_id = state
        .ledger
        .write()
        .await
        .request_milestone_release(id, milestone_id)?;
    state.simulate_latency().await;
    Ok((StatusCode::CREATED, Json(QueuedResponse { item_id })))
}

/// `POST /campaigns/:id/final-report`
pub async fn submit_final_report(
    State(state): State<AppState>,
    Path(id): Path<CampaignId>,
    Json(request): Json<FinalReportRequest>,
) -> Result<(StatusCode, Json<QueuedResponse>)> {
    let item_id = state.ledger.write().await.submit_final_report(
        id,
        &request.narrative,
        request.evidence,
    )?;
    state.simulate_latency().await;
    Ok((StatusCode::CREATED, Json(QueuedResponse { item_id })))
}

/// `POST /campaigns/:id/deletion-requests`
pub async fn recommend_deletion(
    State(state): State<AppState>,
    Path(id): Path<CampaignId>,
    Json(request): Json<DeletionRequest>,
) -> Result<(StatusCode, Json<QueuedResponse>)> {
    let item_id = state.ledger.write().await.recommend_deletion(
        id,
        request.origin,
        &request.reason,
        request.evidence,
    )?;
    state.simulate_latency().await;
    Ok((StatusCode::CREATED, Json(QueuedResponse { item_id })))
}

/// `GET /queues/volunteer`
pub async fn volunteer_queue(State(state): State<AppState>) -> Json<QueueResponse> {
    Json(QueueResponse::from(state.ledger.read().await.volunteer_queue()))
}

/// `POST /queues/volunteer/:item_id/complete`
///
/// Signs off on a volunteer item and forwards it to the admins, whatever its kind.
pub async fn complete_volunteer_item(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
    Json(review): Json<ReviewSubmission>,
) -> Result<Json<ItemOutcome>> {
    let outcome = {
        let mut ledger = state.ledger.write().await;
        let (kind, campaign_id) = queued_item(ledger.volunteer_queue(), item_id)?;
        match kind {
            ItemKind::Campaign => ledger.verify_submission(item_id, review)?,
            ItemKind::MilestoneRelease => ledger.submit_milestone_report(item_id, review)?,
            ItemKind::Deletion => ledger.submit_deletion_review(item_id, review)?,
            ItemKind::FinalReport => ledger.verify_final_report(item_id, review)?,
        }
        ItemOutcome {
            item_id,
            kind,
            campaign_id,
            outcome: "forwarded",
            tx: None,
        }
    };
    info!("Volunteer item {item_id} ({}) forwarded to admin queue", outcome.kind);
    state.simulate_latency().await;
    Ok(Json(outcome))
}

/// `POST /queues/volunteer/:item_id/discard`
pub async fn discard_volunteer_item(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
) -> Result<Json<ItemOutcome>> {
    let outcome = {
        let mut ledger = state.ledger.write().await;
        let (kind, campaign_id) = queued_item(ledger.volunteer_queue(), item_id)?;
        let outcome = match kind {
            ItemKind::Campaign => {
                ledger.discard_submission(item_id)?;
                "deleted"
            }
            ItemKind::Deletion => {
                ledger.dismiss_deletion_review(item_id)?;
                "dismissed"
            }
            ItemKind::MilestoneRelease | ItemKind::FinalReport => {
                return Err(ApiError::UnsupportedAction(format!(
                    "{kind} item {item_id} cannot be discarded by a volunteer"
                )))
            }
        };
        ItemOutcome {
            item_id,
            kind,
            campaign_id,
            outcome,
            tx: None,
        }
    };
    state.simulate_latency().await;
    Ok(Json(outcome))
}

/// `GET /queues/admin`
pub async fn admin_queue(State(state): State<AppState>) -> Json<QueueResponse> {
    Json(QueueResponse::from(state.ledger.read().await.admin_queue()))
}

/// `POST /queues/admin/:item_id/approve`
pub async fn approve_admin_item(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
) -> Result<Json<ItemOutcome>> {
    let outcome = {
        let mut ledger = state.ledger.write().await;
        let (kind, campaign_id) = queued_item(ledger.admin_queue(), item_id)?;
        let (outcome, tx) = match kind {
            ItemKind::Campaign => {
                ledger.approve_campaign(item_id)?;
                ("approved", None)
            }
            ItemKind::MilestoneRelease => {
                ("released", Some(ledger.approve_milestone_release(item_id)?))
            }
            ItemKind::Deletion => {
                ledger.approve_deletion(item_id)?;
                ("deleted", None)
            }
            ItemKind::FinalReport => {
                ledger.approve_final_report(item_id)?;
                ("completed", None)
            }
        };
        ItemOutcome {
            item_id,
            kind,
            campaign_id,
            outcome,
            tx,
        }
    };
    state.simulate_latency().await;
    Ok(Json(outcome))
}

/// `POST /queues/admin/:item_id/reject`
///
/// For deletion items this dismisses the recommendation; the reason is only logged.
pub async fn reject_admin_item(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
    body: Option<Json<RejectRequest>>,
) -> Result<Json<ItemOutcome>> {
    let reason = body.map(|Json(r)| r.reason).unwrap_or_default();
    let outcome = {
        let mut ledger = state.ledger.write().await;
        let (kind, campaign_id) = queued_item(ledger.admin_queue(), item_id)?;
        let outcome = match kind {
            ItemKind::Campaign => {
                ledger.reject_campaign(item_id, &reason)?;
                "rejected"
            }
            ItemKind::MilestoneRelease => {
                ledger.reject_milestone_release(item_id, &reason)?;
                "rejected"
            }
            ItemKind::Deletion => {
                ledger.dismiss_deletion(item_id)?;
                info!("Deletion item {item_id} dismissed: {reason}");
                "dismissed"
            }
            ItemKind::FinalReport => {
                ledger.reject_final_report(item_id, &reason)?;
                "rejected"
            }
        };
        ItemOutcome {
            item_id,
            kind,
            campaign_id,
            outcome,
            tx: None,
        }
    };
    state.simulate_latency().await;
    Ok(Json(outcome))
}

/// `POST /queues/admin/:item_id/discard`
///
/// Deletes a campaign submission outright instead of deciding on it.
pub async fn discard_admin_item(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
) -> Result<Json<ItemOutcome>> {
    let outcome = {
        let mut ledger = state.ledger.write().await;
        let (kind, campaign_id) = queued_item(ledger.admin_queue(), item_id)?;
        if kind != ItemKind::Campaign {
            return Err(ApiError::UnsupportedAction(format!(
                "{kind} item {item_id} cannot be discarded; approve or reject it instead"
            )));
        }
        ledger.delete_submission(item_id)?;
        ItemOutcome {
            item_id,
            kind,
            campaign_id,
            outcome: "deleted",
            tx: None,
        }
    };
    state.simulate_latency().await;
    Ok(Json(outcome))
}

/// `GET /notifications/:role`
pub async fn notifications(
    State(state): State<AppState>,
    Path(role): Path<Role>,
) -> Json<NotificationsResponse> {
    let ledger = state.ledger.read().await;
    let notifications = ledger.notifications(role).clone();
    Json(NotificationsResponse {
        role,
        count: notifications.len(),
        notifications,
    })
}

/// `GET /views/donations`
pub async fn donations_view(State(state): State<AppState>) -> Json<DonationsResponse> {
    let donations = views::platform_donations(&*state.ledger.read().await);
    Json(DonationsResponse {
        count: donations.len(),
        donations,
    })
}

/// `GET /views/donors`
pub async fn donors_view(State(state): State<AppState>) -> Json<DonorsResponse> {
    let donors = views::aggregated_donors(&*state.ledger.read().await);
    Json(DonorsResponse {
        count: donors.len(),
        donors,
    })
}

/// `GET /views/analytics`
pub async fn analytics_view(State(state): State<AppState>) -> Json<AnalyticsData> {
    Json(views::analytics(&*state.ledger.read().await))
}

/// `GET /views/explorer`
pub async fn explorer_view(State(state): State<AppState>) -> Json<ExplorerResponse> {
    let events = views::explorer_feed(&*state.ledger.read().await);
    Json(ExplorerResponse {
        count: events.len(),
        events,
    })
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
