use thiserror::Error;
use uuid::Uuid;

pub type CampaignResult<T> = Result<T, CampaignError>;

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or inconsistent survey document. Never partially applied.
    #[error("Validation error at `{field}`: {message}")]
    Validation { field: String, message: String },

    #[error("Campaign {campaign_id} is {status}; schema and date edits are locked")]
    EditLocked { campaign_id: Uuid, status: String },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Reward {reward_id} already has a winner")]
    ConcurrentWinnerConflict { reward_id: Uuid },

    #[error("No eligible participants for reward {reward_id}")]
    EmptyPool { reward_id: Uuid },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CampaignError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CampaignError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            CampaignError::Config(_) => "config_error",
            CampaignError::Validation { .. } => "validation_failed",
            CampaignError::EditLocked { .. } => "edit_locked",
            CampaignError::InvalidTransition { .. } => "invalid_transition",
            CampaignError::ConcurrentWinnerConflict { .. } => "already_drawn",
            CampaignError::EmptyPool { .. } => "no_eligible_participants",
            CampaignError::NotFound(_) => "not_found",
            CampaignError::Store(_) => "store_unavailable",
            CampaignError::Serialization(_) => "serialization_error",
            CampaignError::Internal(_) => "internal_error",
        }
    }
}
