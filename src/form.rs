//! HTTP endpoint for the closed-form stage.

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};

use crate::error::QuizError;
use crate::quiz::closed_submission::{self, ClosedSubmissionRequest, ClosedSubmissionSummary};
use crate::store::Storage;

impl IntoResponse for QuizError {
    fn into_response(self) -> Response {
        let status = match &self {
            QuizError::NotEnrolled(_) => StatusCode::NOT_FOUND,
            QuizError::AlreadySubmitted | QuizError::AlreadyFinalized => StatusCode::CONFLICT,
            QuizError::InvalidSubmission(_) | QuizError::NoQuestions | QuizError::NoRespondents => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            QuizError::Storage(e) => {
                error!("form storage error: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, serde::Serialize)]
struct ClosedQuestionList {
    numbers: Vec<u32>,
}

async fn list_questions(
    State(storage): State<Storage>,
) -> Result<Json<ClosedQuestionList>, QuizError> {
    let numbers = storage
        .questions
        .list_closed()
        .await?
        .into_iter()
        .map(|q| q.number)
        .collect();
    Ok(Json(ClosedQuestionList { numbers }))
}

async fn submit(
    State(storage): State<Storage>,
    Json(request): Json<ClosedSubmissionRequest>,
) -> Result<Json<ClosedSubmissionSummary>, QuizError> {
    closed_submission::submit(&storage, &request).await.map(Json)
}

pub fn router(storage: Storage) -> Router {
    Router::new()
        .route("/closed/questions", get(list_questions))
        .route("/closed/submit", post(submit))
        .with_state(storage)
}

pub async fn serve(addr: SocketAddr, storage: Storage) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("closed-form endpoint listening on {addr}");
    axum::serve(listener, router(storage)).await
}
