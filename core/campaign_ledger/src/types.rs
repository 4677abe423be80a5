//! # Types
//!
//! Shared data structures used across all modules of the campaign ledger.
//!
//! ## Campaign status as a finite-state machine
//!
//! [`CampaignStatus`] follows a forward-only lifecycle, with one loop back to
//! `Live` when an admin turns down a final report:
//!
//! ```text
//! PendingVolunteerVerification ──► AwaitingAdminVerification ──► Live ──► PendingFinalReport
//!                                              │                  │  ▲            │
//!                                              ▼                  ▼  │            ▼
//!                                          Rejected     CompletionPendingVolunteerReview
//!                                                                 │
//!                                                                 ▼
//!                                            CompletionPendingAdminApproval ──► Completed
//! ```
//!
//! ## Milestones
//!
//! [`MilestoneStatus`] only moves forward:
//! `Locked → PendingVolunteerVerification → InVerification → {VerifiedReleased | Rejected}`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type CampaignId = u64;
pub type MilestoneId = u64;
pub type ItemId = u64;

/// Donor label used for every donation made without a public address.
pub const ANONYMOUS_DONOR: &str = "Anonymous";

/// Opaque transaction identifier attached to activity records and releases.
///
/// Derived from a ledger-wide sequence; it carries no cryptographic meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TxId(u64);

impl TxId {
    pub fn from_sequence(seq: u64) -> Self {
        Self(seq)
    }

    pub fn sequence(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.to_be_bytes()))
    }
}

impl From<TxId> for String {
    fn from(tx: TxId) -> Self {
        tx.to_string()
    }
}

impl TryFrom<String> for TxId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let digits = value.strip_prefix("0x").unwrap_or(&value);
        let bytes = hex::decode(digits).map_err(|e| format!("invalid tx id {value}: {e}"))?;
        let raw: [u8; 8] = bytes
            .try_into()
            .map_err(|_| format!("invalid tx id {value}: expected 8 bytes"))?;
        Ok(Self(u64::from_be_bytes(raw)))
    }
}

/// Lifecycle status of a campaign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// Submitted by the NGO; a volunteer has to vet it.
    PendingVolunteerVerification,
    /// Vetted by a volunteer; waiting for an admin decision.
    AwaitingAdminVerification,
    /// Accepting donations and milestone releases.
    Live,
    /// Every milestone has been released; the NGO owes a final report.
    PendingFinalReport,
    CompletionPendingVolunteerReview,
    CompletionPendingAdminApproval,
    Completed,
    Rejected,
}

impl CampaignStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::PendingVolunteerVerification => "Pending Volunteer Verification",
            Self::AwaitingAdminVerification => "Awaiting Admin Verification",
            Self::Live => "Live",
            Self::PendingFinalReport => "Pending Final Report",
            Self::CompletionPendingVolunteerReview => "Completion Pending Volunteer Review",
            Self::CompletionPendingAdminApproval => "Completion Pending Admin Approval",
            Self::Completed => "Completed",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle status of a single milestone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    Locked,
    PendingVolunteerVerification,
    InVerification,
    VerifiedReleased,
    Rejected,
}

impl MilestoneStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Locked => "Locked",
            Self::PendingVolunteerVerification => "Pending Volunteer Verification",
            Self::InVerification => "In Verification",
            Self::VerifiedReleased => "Verified & Released",
            Self::Rejected => "Rejected",
        }
    }

    /// A release has been requested and is not yet decided.
    pub fn is_outstanding(&self) -> bool {
        matches!(
            self,
            Self::PendingVolunteerVerification | Self::InVerification
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::VerifiedReleased | Self::Rejected)
    }
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceKind {
    File,
    Link,
}

/// An evidence attachment. `value` is an opaque URL (object URL or external link).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(rename = "type")]
    pub kind: EvidenceKind,
    pub name: String,
    pub value: String,
}

impl Evidence {
    pub fn link(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: EvidenceKind::Link,
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: EvidenceKind::File,
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationMethod {
    #[default]
    Crypto,
    Qr,
    Bank,
}

impl DonationMethod {
    pub const ALL: [DonationMethod; 3] = [Self::Crypto, Self::Qr, Self::Bank];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Crypto => "Crypto Wallet",
            Self::Qr => "QR Payment",
            Self::Bank => "Bank Transfer",
        }
    }
}

/// Tag carried by every activity record so views never match on descriptions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    CampaignApproved,
    Donation,
    FundsReleased,
}

/// One entry of a campaign's transaction log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub hash: TxId,
    pub timestamp: DateTime<Utc>,
    pub kind: ActivityKind,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donation_method: Option<DonationMethod>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub title: String,
    pub target: u64,
    pub status: MilestoneStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_tx: Option<TxId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl Milestone {
    pub fn locked(id: MilestoneId, proposal: &MilestoneProposal) -> Self {
        Self {
            id,
            title: proposal.title.trim().to_string(),
            target: proposal.target,
            status: MilestoneStatus::Locked,
            verifier: None,
            verification_tx: None,
            released_at: None,
            rejection_reason: None,
        }
    }
}

/// Narrative and evidence attached to a campaign once it is completed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalReport {
    pub narrative: String,
    pub evidence: Vec<Evidence>,
    pub submitted_at: DateTime<Utc>,
}

/// Full in-memory representation of a campaign.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub title: String,
    pub location: String,
    pub organizer: String,
    pub description: String,
    pub image_url: String,
    /// Target amount, in whole pesos.
    pub goal: u64,
    /// Cumulative confirmed donations. Never decreases.
    pub raised: u64,
    pub status: CampaignStatus,
    pub milestones: Vec<Milestone>,
    /// Newest first.
    pub activity: Vec<ActivityRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_report: Option<FinalReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    /// Sum of targets already released to the organizer.
    pub fn released_total(&self) -> u64 {
        self.milestones
            .iter()
            .filter(|m| m.status == MilestoneStatus::VerifiedReleased)
            .map(|m| m.target)
            .sum()
    }

    /// Escrowed funds not yet released: `raised − Σ released targets`.
    pub fn available_funds(&self) -> u64 {
        self.raised.saturating_sub(self.released_total())
    }

    pub fn milestone_total(&self) -> u64 {
        self.milestones.iter().map(|m| m.target).sum()
    }

    pub fn milestone(&self, id: MilestoneId) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id == id)
    }

    pub fn milestone_mut(&mut self, id: MilestoneId) -> Option<&mut Milestone> {
        self.milestones.iter_mut().find(|m| m.id == id)
    }

    /// The milestone whose release is currently under review, if any.
    pub fn outstanding_milestone(&self) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.status.is_outstanding())
    }

    /// The first milestone still `Locked`.
    pub fn next_locked(&self) -> Option<&Milestone> {
        self.milestones
            .iter()
            .find(|m| m.status == MilestoneStatus::Locked)
    }

    pub fn all_released(&self) -> bool {
        self.milestones
            .iter()
            .all(|m| m.status == MilestoneStatus::VerifiedReleased)
    }

    pub fn percent_funded(&self) -> u8 {
        if self.goal == 0 {
            return 0;
        }
        (self.raised.saturating_mul(100) / self.goal).min(100) as u8
    }

    pub(crate) fn record(&mut self, record: ActivityRecord) {
        self.activity.insert(0, record);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneProposal {
    pub title: String,
    pub target: u64,
}

/// What an NGO submits to open a campaign.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignProposal {
    pub title: String,
    #[serde(default)]
    pub location: String,
    pub organizer: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    pub goal: u64,
    pub milestones: Vec<MilestoneProposal>,
}

/// A donor's contribution to a live campaign.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    pub amount: u64,
    #[serde(default)]
    pub donor_address: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub method: DonationMethod,
}

impl Donation {
    pub fn new(amount: u64, donor_address: impl Into<String>, method: DonationMethod) -> Self {
        Self {
            amount,
            donor_address: Some(donor_address.into()),
            anonymous: false,
            method,
        }
    }

    pub fn anonymous(amount: u64, method: DonationMethod) -> Self {
        Self {
            amount,
            donor_address: None,
            anonymous: true,
            method,
        }
    }

    /// Address shown in logs and donor rankings.
    pub fn donor_label(&self) -> String {
        match &self.donor_address {
            Some(addr) if !self.anonymous && !addr.trim().is_empty() => addr.trim().to_string(),
            _ => ANONYMOUS_DONOR.to_string(),
        }
    }
}

/// NGO-side edit of a running campaign.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignEdit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub goal: Option<u64>,
    /// Appended after the existing milestones, always `Locked`.
    #[serde(default)]
    pub new_milestones: Vec<MilestoneProposal>,
}

/// A volunteer's sign-off on a work item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub volunteer: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}
