//! # Views
//!
//! Read-only projections of the ledger, recomputed on every call. None of
//! them keeps state of its own, so calling one twice on an unchanged ledger
//! yields equal output.
//!
//! | View                   | Consumer                              |
//! |------------------------|---------------------------------------|
//! | [`platform_donations`] | admin donation feed                   |
//! | [`aggregated_donors`]  | donor leaderboard                     |
//! | [`analytics`]          | admin analytics dashboard             |
//! | [`explorer_feed`]      | public activity explorer (no role)    |

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use crate::display::{format_php, relative_time};
use crate::types::{
    ActivityKind, ActivityRecord, CampaignId, CampaignStatus, DonationMethod, MilestoneStatus,
    TxId, ANONYMOUS_DONOR,
};
use crate::CampaignLedger;

/// Mock conversion rate used for the "≈ ETH" figure on the dashboard.
pub const PHP_PER_ETH: f64 = 150_000.0;

/// Share of total raised drawn in each of the six monthly chart buckets,
/// oldest first. The series is illustrative, not derived from dated
/// transactions.
pub const MONTHLY_WEIGHTS: [u64; 6] = [8, 12, 15, 18, 22, 25];

/// How many donations the analytics dashboard lists.
pub const RECENT_DONATIONS: usize = 5;

// ─────────────────────────────────────────────────────────
// Platform donations
// ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlatformDonation {
    pub campaign_id: CampaignId,
    pub campaign_title: String,
    pub transaction: ActivityRecord,
}

/// Every donation on the platform, newest first.
pub fn platform_donations(ledger: &CampaignLedger) -> Vec<PlatformDonation> {
    let mut donations: Vec<PlatformDonation> = ledger
        .campaigns()
        .flat_map(|campaign| {
            campaign
                .activity
                .iter()
                .filter(|record| record.kind == ActivityKind::Donation)
                .map(|record| PlatformDonation {
                    campaign_id: campaign.id,
                    campaign_title: campaign.title.clone(),
                    transaction: record.clone(),
                })
        })
        .collect();
    donations.sort_by_key(|d| Reverse((d.transaction.timestamp, d.transaction.hash)));
    debug!("Platform donation feed: {} entries", donations.len());
    donations
}

// ─────────────────────────────────────────────────────────
// Donor aggregation
// ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DonorSummary {
    pub address: String,
    pub total_donated: u64,
    pub donation_count: u32,
    pub last_donation_at: DateTime<Utc>,
}

/// Donations grouped by donor address, largest total first. All anonymous
/// gifts are pooled under a single "Anonymous" donor.
pub fn aggregated_donors(ledger: &CampaignLedger) -> Vec<DonorSummary> {
    let mut by_address: BTreeMap<String, DonorSummary> = BTreeMap::new();
    for campaign in ledger.campaigns() {
        for record in campaign
            .activity
            .iter()
            .filter(|r| r.kind == ActivityKind::Donation)
        {
            let address = record
                .donor_address
                .clone()
                .unwrap_or_else(|| ANONYMOUS_DONOR.to_string());
            let amount = record.amount.unwrap_or(0);
            by_address
                .entry(address.clone())
                .and_modify(|summary| {
                    summary.total_donated = summary.total_donated.saturating_add(amount);
                    summary.donation_count += 1;
                    summary.last_donation_at = summary.last_donation_at.max(record.timestamp);
                })
                .or_insert(DonorSummary {
                    address,
                    total_donated: amount,
                    donation_count: 1,
                    last_donation_at: record.timestamp,
                });
        }
    }

    let mut donors: Vec<DonorSummary> = by_address.into_values().collect();
    // BTreeMap order keeps equal totals sorted by address.
    donors.sort_by_key(|d| Reverse(d.total_donated));
    donors
}

// ─────────────────────────────────────────────────────────
// Analytics
// ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total_raised: u64,
    pub total_released: u64,
    /// Funds still held for live campaigns.
    pub escrow_balance: u64,
    pub active_campaigns: usize,
    pub completed_campaigns: usize,
    pub verified_milestones: usize,
    pub total_raised_eth: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub amount: u64,
    pub percent: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MethodShare {
    pub method: DonationMethod,
    pub label: &'static str,
    pub total: u64,
    pub count: u32,
    pub percent: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecentDonation {
    pub campaign_title: String,
    pub donor: String,
    pub amount: u64,
    pub amount_display: String,
    pub method: Option<DonationMethod>,
    pub hash: TxId,
    pub timestamp: DateTime<Utc>,
    pub when: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalyticsData {
    pub summary: AnalyticsSummary,
    pub monthly: Vec<ChartPoint>,
    pub methods: Vec<MethodShare>,
    pub recent_donations: Vec<RecentDonation>,
}

pub fn analytics(ledger: &CampaignLedger) -> AnalyticsData {
    let now = ledger.now();
    let mut summary = AnalyticsSummary {
        total_raised: 0,
        total_released: 0,
        escrow_balance: 0,
        active_campaigns: 0,
        completed_campaigns: 0,
        verified_milestones: 0,
        total_raised_eth: 0.0,
    };

    for campaign in ledger.campaigns() {
        summary.total_raised = summary.total_raised.saturating_add(campaign.raised);
        summary.total_released = summary
            .total_released
            .saturating_add(campaign.released_total());
        summary.verified_milestones += campaign
            .milestones
            .iter()
            .filter(|m| m.status == MilestoneStatus::VerifiedReleased)
            .count();
        match campaign.status {
            CampaignStatus::Live => {
                summary.active_campaigns += 1;
                summary.escrow_balance = summary
                    .escrow_balance
                    .saturating_add(campaign.available_funds());
            }
            CampaignStatus::Completed => summary.completed_campaigns += 1,
            _ => {}
        }
    }
    summary.total_raised_eth = round4(summary.total_raised as f64 / PHP_PER_ETH);

    let donations = platform_donations(ledger);
    let methods = method_breakdown(&donations);
    let recent_donations = donations
        .iter()
        .take(RECENT_DONATIONS)
        .map(|d| {
            let amount = d.transaction.amount.unwrap_or(0);
            RecentDonation {
                campaign_title: d.campaign_title.clone(),
                donor: d
                    .transaction
                    .donor_address
                    .clone()
                    .unwrap_or_else(|| ANONYMOUS_DONOR.to_string()),
                amount,
                amount_display: format_php(amount),
                method: d.transaction.donation_method,
                hash: d.transaction.hash,
                timestamp: d.transaction.timestamp,
                when: relative_time(d.transaction.timestamp, now),
            }
        })
        .collect();

    AnalyticsData {
        monthly: monthly_series(summary.total_raised, now),
        summary,
        methods,
        recent_donations,
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Six month buckets ending with the month of `now`. The newest bucket
/// absorbs the rounding remainder so the series sums to `total`. Totals
/// across campaigns saturate at `u64::MAX`.
fn monthly_series(total: u64, now: DateTime<Utc>) -> Vec<ChartPoint> {
    let months = MONTHLY_WEIGHTS.len() as i32;
    let mut allotted = 0u64;
    MONTHLY_WEIGHTS
        .iter()
        .enumerate()
        .map(|(i, weight)| {
            let back = months - 1 - i as i32;
            let amount = if back == 0 {
                total - allotted
            } else {
                (u128::from(total) * u128::from(*weight) / 100) as u64
            };
            allotted += amount;
            ChartPoint {
                label: month_label(now, back),
                amount,
                percent: *weight,
            }
        })
        .collect()
}

fn month_label(now: DateTime<Utc>, months_back: i32) -> String {
    let index = now.year() * 12 + now.month0() as i32 - months_back;
    let (year, month) = (index.div_euclid(12), index.rem_euclid(12) as u32 + 1);
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%b").to_string())
        .unwrap_or_default()
}

fn method_breakdown(donations: &[PlatformDonation]) -> Vec<MethodShare> {
    let grand_total = donations
        .iter()
        .filter_map(|d| d.transaction.amount)
        .fold(0u64, u64::saturating_add);
    DonationMethod::ALL
        .iter()
        .map(|method| {
            let (total, count) = donations
                .iter()
                .filter(|d| d.transaction.donation_method == Some(*method))
                .fold((0u64, 0u32), |(total, count), d| {
                    (
                        total.saturating_add(d.transaction.amount.unwrap_or(0)),
                        count + 1,
                    )
                });
            let percent = if grand_total == 0 {
                0.0
            } else {
                ((total as f64 / grand_total as f64) * 1_000.0).round() / 10.0
            };
            MethodShare {
                method: *method,
                label: method.label(),
                total,
                count,
                percent,
            }
        })
        .collect()
}

// ─────────────────────────────────────────────────────────
// Explorer
// ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorerEventKind {
    Donation,
    FundsReleased,
    CampaignApproved,
    MilestoneVerified,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExplorerEvent {
    pub kind: ExplorerEventKind,
    pub campaign_id: CampaignId,
    pub campaign_title: String,
    pub hash: TxId,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Public timeline of every donation, approval, verification and release,
/// newest first.
pub fn explorer_feed(ledger: &CampaignLedger) -> Vec<ExplorerEvent> {
    let mut events = Vec::new();
    for campaign in ledger.campaigns() {
        for record in &campaign.activity {
            let (kind, actor) = match record.kind {
                ActivityKind::Donation => {
                    (ExplorerEventKind::Donation, record.donor_address.clone())
                }
                ActivityKind::FundsReleased => {
                    (ExplorerEventKind::FundsReleased, Some(campaign.organizer.clone()))
                }
                ActivityKind::CampaignApproved => (ExplorerEventKind::CampaignApproved, None),
            };
            events.push(ExplorerEvent {
                kind,
                campaign_id: campaign.id,
                campaign_title: campaign.title.clone(),
                hash: record.hash,
                description: record.description.clone(),
                amount: record.amount,
                actor,
                timestamp: record.timestamp,
            });
        }
        for milestone in &campaign.milestones {
            if let (MilestoneStatus::VerifiedReleased, Some(tx), Some(at)) =
                (milestone.status, milestone.verification_tx, milestone.released_at)
            {
                let verifier = milestone.verifier.clone();
                events.push(ExplorerEvent {
                    kind: ExplorerEventKind::MilestoneVerified,
                    campaign_id: campaign.id,
                    campaign_title: campaign.title.clone(),
                    hash: tx,
                    description: format!(
                        "Milestone \"{}\" verified by {}",
                        milestone.title,
                        verifier.as_deref().unwrap_or("a volunteer")
                    ),
                    amount: Some(milestone.target),
                    actor: verifier,
                    timestamp: at,
                });
            }
        }
    }
    // Stable: a verification sorts right after the release that shares its tx.
    events.sort_by_key(|e| Reverse((e.timestamp, e.hash)));
    debug!("Explorer feed: {} events", events.len());
    events
}
