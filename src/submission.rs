//! Submission pipeline pieces: the save state machine, the
//! confirmation preview and the create-or-update decision.

use crate::error::BackendError;
use crate::models::{
    CreateCommissionRequest, HierarchyLevel, SplitShares, UpdateCommissionRequest, PAYOUT_SERVICE,
};
use crate::resolver::Resolution;
use rust_decimal::Decimal;
use serde::Serialize;

/// Shown when a save fails without a message from the backend.
pub const GENERIC_SAVE_FAILURE: &str = "Failed to save commission";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    ConfirmPending,
    Saving,
}

impl PipelineState {
    pub fn describe(self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::ConfirmPending => "awaiting confirmation",
            PipelineState::Saving => "saving",
        }
    }
}

/// What the operator is asked to confirm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationPreview {
    pub level: HierarchyLevel,
    pub node_id: String,
    pub md: Decimal,
    pub distributor: Decimal,
    pub retailer: Decimal,
    pub admin: Decimal,
    pub scope: &'static str,
}

impl ConfirmationPreview {
    pub fn new(level: HierarchyLevel, node_id: &str, shares: &SplitShares) -> Self {
        Self {
            level,
            node_id: node_id.to_string(),
            md: shares.master_distributor,
            distributor: shares.distributor,
            retailer: shares.retailer,
            admin: shares.admin,
            scope: level.scope_description(),
        }
    }
}

/// The backend call a confirmed save turns into.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveAction {
    Create(CreateCommissionRequest),
    Update(UpdateCommissionRequest),
}

impl SaveAction {
    /// Updates the node's own record when it has one; otherwise creates a
    /// record for the node, even if an ancestor's record is on display.
    pub fn plan(resolution: &Resolution, node_id: &str, shares: SplitShares) -> Self {
        match resolution.direct_commission_id() {
            Some(commission_id) => SaveAction::Update(UpdateCommissionRequest {
                commission_id: commission_id.to_string(),
                shares,
            }),
            None => SaveAction::Create(CreateCommissionRequest {
                user_id: node_id.to_string(),
                service: PAYOUT_SERVICE.to_string(),
                shares,
            }),
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self, SaveAction::Update(_))
    }
}

/// The text shown to the operator for a failed save: the backend's own
/// message verbatim, or a generic fallback.
pub fn failure_message(err: &BackendError) -> String {
    err.backend_message()
        .map(str::to_string)
        .unwrap_or_else(|| GENERIC_SAVE_FAILURE.to_string())
}
