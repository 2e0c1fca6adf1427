//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Starting sessions and switching lessons
//!   - Rendering questions and switching modes
//!   - Grading answers (plus the optional translation check)
//!   - Advancing to the next question
//!   - Calling the translation collaborator with a timeout and a graceful fallback

use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::domain::{AnswerTarget, PracticeMode};
use crate::error::DrillError;
use crate::modes::{self, QuestionView};
use crate::openai::TranslateError;
use crate::protocol::{AnswerOut, LessonsOut, SessionOut, TranslateOut};
use crate::state::AppState;
use crate::util::trunc_for_log;

const CHECK_UNAVAILABLE: &str = "Translation check unavailable right now.";
const TRANSLATE_DISABLED: &str = "Translation is not configured on this server.";

fn session_out(id: &str, q: &crate::session::QuizSession) -> SessionOut {
  SessionOut {
    session_id: id.to_string(),
    lesson: q.state().lesson.clone(),
    mode: q.state().mode,
    corpus_len: q.corpus_len(),
  }
}

#[instrument(level = "info", skip(state))]
pub async fn start_session(state: &AppState, lesson: Option<String>) -> Result<SessionOut, DrillError> {
  let id = state.create_session(lesson).await?;
  state.with_session(&id, |q| Ok(session_out(&id, q))).await
}

pub fn list_lessons(state: &AppState) -> LessonsOut {
  LessonsOut { lessons: state.corpus.lessons().to_vec(), total: state.corpus.len() }
}

/// Current question of `mode`, or of the active mode when none is given.
#[instrument(level = "debug", skip(state))]
pub async fn get_question(state: &AppState, session_id: &str, mode: Option<PracticeMode>) -> Result<QuestionView, DrillError> {
  state
    .with_session(session_id, |q| {
      let mode = mode.unwrap_or(q.state().mode);
      Ok(modes::present(q, mode)?)
    })
    .await
}

#[instrument(level = "info", skip(state))]
pub async fn switch_mode(state: &AppState, session_id: &str, mode: PracticeMode) -> Result<QuestionView, DrillError> {
  state
    .with_session(session_id, |q| {
      q.switch_mode(mode);
      Ok(modes::present(q, mode)?)
    })
    .await
}

#[instrument(level = "info", skip(state))]
pub async fn next_question(state: &AppState, session_id: &str, mode: PracticeMode) -> Result<QuestionView, DrillError> {
  state
    .with_session(session_id, |q| {
      q.advance(mode)?;
      Ok(modes::present(q, mode)?)
    })
    .await
}

#[instrument(level = "info", skip(state))]
pub async fn switch_lesson(state: &AppState, session_id: &str, lesson: Option<String>) -> Result<SessionOut, DrillError> {
  let active = state.corpus.filter(lesson.as_deref())?;
  state
    .with_session(session_id, |q| {
      q.switch_lesson(lesson, active)?;
      Ok(session_out(session_id, q))
    })
    .await
}

/// Grade a submission. A wrong Thai free-text answer also gets a Thai -> Chinese
/// translation of what was typed, when the collaborator is configured.
#[instrument(level = "info", skip(state, input), fields(input_len = input.as_deref().map(str::len)))]
pub async fn submit_answer(
  state: &AppState,
  session_id: &str,
  mode: PracticeMode,
  input: Option<String>,
  target: Option<AnswerTarget>,
) -> Result<AnswerOut, DrillError> {
  let (verdict, answered_in) = state
    .with_session(session_id, |q| {
      let v = modes::submit(q, mode, input.as_deref(), target)?;
      Ok((v, q.state().get(mode).target))
    })
    .await?;

  let mut out = AnswerOut {
    correct: verdict.correct,
    expected: verdict.expected,
    highlight: verdict.highlight,
    translation: None,
    notice: None,
  };

  let wants_check = !out.correct
    && match mode {
      PracticeMode::FreeSentence => answered_in == AnswerTarget::Thai,
      PracticeMode::WordZhTh => true,
      _ => false,
    };
  if wants_check && state.openai.is_some() {
    let text = input.unwrap_or_default();
    match translate_with_timeout(state, &text, "th", "zh-TW").await {
      Ok(t) => out.translation = Some(t),
      Err(e) => {
        warn!(target: "thai_drill", error = %e, "Translation check failed; degrading to notice");
        out.notice = Some(CHECK_UNAVAILABLE.into());
      }
    }
  }

  Ok(out)
}

/// User-initiated translation. Never fails: errors become a notice.
#[instrument(level = "info", skip(state, text), fields(text_len = text.len()))]
pub async fn do_translate(state: &AppState, text: &str, source: &str, dest: &str) -> TranslateOut {
  if state.openai.is_none() {
    return TranslateOut { translation: None, notice: Some(TRANSLATE_DISABLED.into()) };
  }
  match translate_with_timeout(state, text, source, dest).await {
    Ok(t) => {
      debug!(target: "thai_drill", text = %trunc_for_log(text, 40), "Translated");
      TranslateOut { translation: Some(t), notice: None }
    }
    Err(e) => {
      error!(target: "thai_drill", error = %e, "Translation failed; using notice fallback.");
      TranslateOut { translation: None, notice: Some(CHECK_UNAVAILABLE.into()) }
    }
  }
}

async fn translate_with_timeout(state: &AppState, text: &str, source: &str, dest: &str) -> Result<String, TranslateError> {
  let Some(oa) = &state.openai else {
    return Err(TranslateError::Disabled);
  };
  let limit = Duration::from_secs(state.config.translate.timeout_secs);
  let call = oa.translate(&state.config.translate.system_prompt, text, source, dest);
  match tokio::time::timeout(limit, call).await {
    Ok(res) => res,
    Err(_) => {
      info!(target: "thai_drill", ?limit, "Translation timed out");
      Err(TranslateError::Timeout)
    }
  }
}
