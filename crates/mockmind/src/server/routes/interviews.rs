//! Interview lifecycle endpoints

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{
    request::parse_body, AnswerResponse, ApiResponse, EndInterviewResponse, SessionStatusResponse,
    StartInterviewRequest, StartInterviewResponse, SubmitAnswerRequest,
};
use crate::validation::{START_INTERVIEW, SUBMIT_ANSWER};

use super::{json_body, parse_session_id};

/// POST /api/interviews/start
pub async fn start_interview(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<StartInterviewResponse>>)> {
    let request: StartInterviewRequest = parse_body(&START_INTERVIEW, json_body(&body)?)?;

    tracing::info!("Starting new interview: {} - {}", request.role, request.level);

    let started = state.engine().start_interview(request.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(StartInterviewResponse {
            session_id: started.session_id,
            question: started.question,
        })),
    ))
}

/// POST /api/interviews/:session_id/answer
pub async fn submit_answer(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> Result<Json<ApiResponse<AnswerResponse>>> {
    let request: SubmitAnswerRequest = parse_body(&SUBMIT_ANSWER, json_body(&body)?)?;
    let session_id = parse_session_id(&session_id)?;

    tracing::info!("Answer submitted for session: {}", session_id);
    if let Some(meta) = &request.audio_metadata {
        tracing::debug!(
            "Audio metadata: duration={:?} pauses={:?} confidence={:?}",
            meta.duration,
            meta.pause_count,
            meta.average_confidence
        );
    }

    let outcome = state
        .engine()
        .evaluate_and_generate_next(session_id, &request.answer)
        .await?;

    Ok(Json(ApiResponse::ok(AnswerResponse {
        evaluation: outcome.evaluation,
        next_question: outcome.next_question,
        should_continue: outcome.should_continue,
    })))
}

/// POST /api/interviews/:session_id/end
pub async fn end_interview(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<EndInterviewResponse>>> {
    let session_id = parse_session_id(&session_id)?;

    tracing::info!("Ending interview session: {}", session_id);

    let report = state.engine().generate_final_report(session_id).await?;

    Ok(Json(ApiResponse::ok(EndInterviewResponse {
        report_id: report.report_id,
        report,
    })))
}

/// GET /api/interviews/:session_id/status
pub async fn session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<SessionStatusResponse>>> {
    let session_id = parse_session_id(&session_id)?;
    let session = state.store().get_session(session_id).await?;

    Ok(Json(ApiResponse::ok(SessionStatusResponse::from(&session))))
}
