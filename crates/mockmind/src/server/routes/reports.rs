//! Report retrieval

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{ApiResponse, ReportView, SessionSummary};

use super::parse_report_id;

/// GET /api/reports/:report_id - report enriched with session metadata
pub async fn get_report(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<Json<ApiResponse<ReportView>>> {
    let report_id = parse_report_id(&report_id)?;
    let report = state.store().get_report(report_id).await?;

    // Session metadata is optional decoration
    let session = match state.store().get_session_from_disk(report.session_id).await {
        Ok(session) => Some(SessionSummary::from(&session)),
        Err(e) => {
            tracing::warn!("Could not load session for report {}: {}", report_id, e);
            None
        }
    };

    Ok(Json(ApiResponse::ok(ReportView { report, session })))
}
