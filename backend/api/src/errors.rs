//! Service error type and its HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use campaign_ledger::LedgerError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The work item exists but the requested action does not apply to its kind.
    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// JSON error body: `{ "error": { "code", "message" } }`.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Ledger(e) => match e {
                LedgerError::CampaignNotFound(_) => "CAMPAIGN_NOT_FOUND",
                LedgerError::MilestoneNotFound { .. } => "MILESTONE_NOT_FOUND",
                LedgerError::WorkItemNotFound(_) => "WORK_ITEM_NOT_FOUND",
                LedgerError::WrongItemKind { .. } => "WRONG_ITEM_KIND",
                LedgerError::InvalidStatus { .. } => "INVALID_STATUS",
                LedgerError::MilestoneNotLocked { .. } => "MILESTONE_NOT_LOCKED",
                LedgerError::InvalidMilestoneStatus { .. } => "INVALID_MILESTONE_STATUS",
                LedgerError::PrecedingMilestoneUnresolved { .. } => {
                    "PRECEDING_MILESTONE_UNRESOLVED"
                }
                LedgerError::MilestoneAlreadyOutstanding { .. } => "MILESTONE_ALREADY_OUTSTANDING",
                LedgerError::InsufficientEscrowFunds { .. } => "INSUFFICIENT_ESCROW_FUNDS",
                LedgerError::MilestonesUnreleased { .. } => "MILESTONES_UNRELEASED",
                LedgerError::DeletionAlreadyOpen(_) => "DELETION_ALREADY_OPEN",
                LedgerError::InvalidAmount => "INVALID_AMOUNT",
                LedgerError::MissingReason => "MISSING_REASON",
                LedgerError::MissingNote => "MISSING_NOTE",
                LedgerError::MissingEvidence => "MISSING_EVIDENCE",
                LedgerError::InvalidProposal(_) => "INVALID_PROPOSAL",
                LedgerError::GoalMismatch { .. } => "GOAL_MISMATCH",
            },
            ApiError::UnsupportedAction(_) => "UNSUPPORTED_ACTION",
            ApiError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// not found → 404, bad input → 400, invalid proposal → 422,
    /// state precondition → 409.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Ledger(e) => match e {
                LedgerError::CampaignNotFound(_)
                | LedgerError::MilestoneNotFound { .. }
                | LedgerError::WorkItemNotFound(_) => StatusCode::NOT_FOUND,
                LedgerError::InvalidAmount
                | LedgerError::MissingReason
                | LedgerError::MissingNote
                | LedgerError::MissingEvidence => StatusCode::BAD_REQUEST,
                LedgerError::InvalidProposal(_) | LedgerError::GoalMismatch { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                LedgerError::WrongItemKind { .. }
                | LedgerError::InvalidStatus { .. }
                | LedgerError::MilestoneNotLocked { .. }
                | LedgerError::InvalidMilestoneStatus { .. }
                | LedgerError::PrecedingMilestoneUnresolved { .. }
                | LedgerError::MilestoneAlreadyOutstanding { .. }
                | LedgerError::InsufficientEscrowFunds { .. }
                | LedgerError::MilestonesUnreleased { .. }
                | LedgerError::DeletionAlreadyOpen(_) => StatusCode::CONFLICT,
            },
            ApiError::UnsupportedAction(_) => StatusCode::CONFLICT,
            ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();

        if status == StatusCode::CONFLICT {
            tracing::warn!(error = %message, code, "Precondition failed");
        } else if status.is_server_error() {
            tracing::error!(error = %message, code, "Server error occurred");
        } else {
            tracing::debug!(error = %message, code, "Client error occurred");
        }

        let body = ErrorResponse {
            error: ErrorDetails { code, message },
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
