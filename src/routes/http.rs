//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; failures come back as `DrillError` JSON bodies.

use std::sync::Arc;
use axum::{extract::{State, Query}, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::error::DrillError;
use crate::logic::*;
use crate::modes::QuestionView;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_lessons(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(list_lessons(&state))
}

#[instrument(level = "info", skip(state, body), fields(lesson = ?body.lesson))]
pub async fn http_post_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionIn>,
) -> Result<Json<SessionOut>, DrillError> {
  let out = start_session(&state, body.lesson).await?;
  info!(target: "quiz", session = %out.session_id, corpus_len = out.corpus_len, "HTTP session started");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state), fields(%q.session_id, mode = ?q.mode))]
pub async fn http_get_question(
  State(state): State<Arc<AppState>>,
  Query(q): Query<QuestionQuery>,
) -> Result<Json<QuestionView>, DrillError> {
  Ok(Json(get_question(&state, &q.session_id, q.mode).await?))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, mode = ?body.mode))]
pub async fn http_post_mode(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ModeIn>,
) -> Result<Json<QuestionView>, DrillError> {
  Ok(Json(switch_mode(&state, &body.session_id, body.mode).await?))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, mode = ?body.mode))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<AnswerOut>, DrillError> {
  let out = submit_answer(&state, &body.session_id, body.mode, body.input, body.target).await?;
  info!(target: "quiz", session = %body.session_id, correct = out.correct, "HTTP submit_answer evaluated");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, mode = ?body.mode))]
pub async fn http_post_next(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ModeIn>,
) -> Result<Json<QuestionView>, DrillError> {
  Ok(Json(next_question(&state, &body.session_id, body.mode).await?))
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, lesson = ?body.lesson))]
pub async fn http_post_lesson(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LessonIn>,
) -> Result<Json<SessionOut>, DrillError> {
  Ok(Json(switch_lesson(&state, &body.session_id, body.lesson).await?))
}

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len()))]
pub async fn http_post_translate(
  State(state): State<Arc<AppState>>,
  Json(body): Json<TranslateIn>,
) -> impl IntoResponse {
  Json(do_translate(&state, &body.text, &body.source, &body.dest).await)
}
