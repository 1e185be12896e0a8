//! HTTP API for the Commission Engine.
//!
//! This module serves the split rules over HTTP using the
//! [`axum`](https://crates.io/crates/axum) framework, so that other
//! operator tools apply exactly the same validation, admin remainder
//! and confirmation text as the console.  Decimal values in responses
//! are rendered as strings with their exact scale (`"0.10"`).

use crate::audit::{audit_records, AuditReport};
use crate::models::{CommissionRecord, HierarchyLevel};
use crate::split::{constrain_input, SplitDraft, SplitError, SplitField};
use crate::submission::ConfirmationPreview;
use anyhow::Result;
use axum::{http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tracing::info;

/// Three shares as the operator typed them.
#[derive(Debug, Clone, Deserialize)]
pub struct SplitInput {
    #[serde(default)]
    pub md: String,
    #[serde(default)]
    pub distributor: String,
    #[serde(default)]
    pub retailer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewInput {
    pub level: HierarchyLevel,
    pub node_id: String,
    #[serde(flatten)]
    pub split: SplitInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateResponse {
    pub admin_remainder: Decimal,
    pub error: Option<SplitError>,
    pub error_message: Option<String>,
    pub can_submit: bool,
}

/// Build the API router.
pub fn build_router() -> Router {
    Router::new()
        .route("/api/splits/validate", post(validate_handler))
        .route("/api/splits/preview", post(preview_handler))
        .route("/api/records/audit", post(audit_handler))
}

fn unprocessable(message: String) -> axum::response::Response {
    let body = Json(serde_json::json!({ "error": message }));
    (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
}

/// Builds a draft from raw text, applying the same input rule as the
/// console.  Text the console would refuse is reported by field.
fn draft_from_input(input: &SplitInput) -> Result<SplitDraft, String> {
    let mut draft = SplitDraft::default();
    for (field, text) in [
        (SplitField::MasterDistributor, &input.md),
        (SplitField::Distributor, &input.distributor),
        (SplitField::Retailer, &input.retailer),
    ] {
        if constrain_input(text).is_none() {
            return Err(format!("{field} must be a number with at most two decimal places"));
        }
        draft.set_field(field, text);
    }
    Ok(draft)
}

/// Handler for POST /api/splits/validate
async fn validate_handler(Json(input): Json<SplitInput>) -> impl IntoResponse {
    let draft = match draft_from_input(&input) {
        Ok(draft) => draft,
        Err(message) => return unprocessable(message),
    };
    let verdict = draft.verdict();
    let error = draft.submittable_shares().err();
    let body = ValidateResponse {
        admin_remainder: verdict.admin_remainder,
        error,
        error_message: error.map(|e| e.to_string()),
        can_submit: error.is_none(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Handler for POST /api/splits/preview
async fn preview_handler(Json(input): Json<PreviewInput>) -> impl IntoResponse {
    let draft = match draft_from_input(&input.split) {
        Ok(draft) => draft,
        Err(message) => return unprocessable(message),
    };
    match draft.submittable_shares() {
        Ok(shares) => {
            let preview = ConfirmationPreview::new(input.level, &input.node_id, &shares);
            (StatusCode::OK, Json(preview)).into_response()
        }
        Err(err) => unprocessable(err.to_string()),
    }
}

/// Handler for POST /api/records/audit
async fn audit_handler(Json(records): Json<Vec<CommissionRecord>>) -> Json<AuditReport> {
    Json(audit_records(&records))
}

/// Launch the API server on `addr`.  Runs until the process is
/// interrupted.
pub async fn serve(addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "commission API listening");
    axum::serve(listener, build_router())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
