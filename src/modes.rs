//! Practice modes: bind a session, the grader and the distractor pools to one
//! question/answer shape each.

use rand::Rng;
use serde::Serialize;
use tracing::{info, instrument};

use crate::domain::{AnswerTarget, PracticeMode};
use crate::error::DrillError;
use crate::grader::{diff_highlight, is_correct, is_match, Highlight};
use crate::pool::PoolError;
use crate::session::QuizSession;

/// What the page needs to render the current question of a mode.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
  pub mode: PracticeMode,
  pub prompt: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<String>>,
  pub answered: bool,
  pub last_input: String,
  pub target: AnswerTarget,
  pub index: usize,
  pub corpus_len: usize,
}

/// Outcome of a graded submission.
#[derive(Clone, Debug, Serialize)]
pub struct Verdict {
  pub correct: bool,
  pub expected: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub highlight: Option<Highlight>,
}

/// Render the mode's current question, drawing options or the word on first sight.
pub fn present<R: Rng>(session: &mut QuizSession<R>, mode: PracticeMode) -> Result<QuestionView, PoolError> {
  let (prompt, options) = match mode.choice_direction() {
    Some(direction) => {
      let prompt = direction.prompt(session.current(mode)).to_string();
      let opts = session.options(direction)?.options.clone();
      (prompt, Some(opts))
    }
    None if mode == PracticeMode::WordZhTh => (session.word().to_string(), None),
    None => (session.current(mode).chinese.clone(), None),
  };

  let st = session.state().get(mode);
  Ok(QuestionView {
    mode,
    prompt,
    options,
    answered: st.answered,
    last_input: st.last_input.clone(),
    target: st.target,
    index: st.index,
    corpus_len: session.corpus_len(),
  })
}

/// Accept and grade one submission for `mode`.
///
/// Free-text modes compare normalized text; a wrong free sentence also gets a diff
/// highlight. The word mode is graded against the whole sentence's Thai. Choice modes
/// compare the selection verbatim with the cached correct option.
#[instrument(level = "info", skip(session, input), fields(input_len = input.map(str::len)))]
pub fn submit<R: Rng>(
  session: &mut QuizSession<R>,
  mode: PracticeMode,
  input: Option<&str>,
  target: Option<AnswerTarget>,
) -> Result<Verdict, DrillError> {
  let verdict = match mode.choice_direction() {
    Some(direction) => {
      let expected = session.options(direction)?.correct.clone();
      session.submit(mode, input, None)?;
      let selected = &session.state().get(mode).last_input;
      Verdict { correct: is_match(selected, &expected), expected, highlight: None }
    }
    None => {
      session.submit(mode, input, target)?;
      let st = session.state().get(mode);
      let record = session.current(mode);
      let user = st.last_input.as_str();
      match mode {
        PracticeMode::WordZhTh => {
          let expected = record.thai.clone();
          Verdict { correct: is_correct(user, &expected), expected, highlight: None }
        }
        _ => {
          let expected = st.target.expected(record).to_string();
          let correct = is_correct(user, &expected);
          let highlight = if correct { None } else { Some(diff_highlight(&expected, user)) };
          Verdict { correct, expected, highlight }
        }
      }
    }
  };

  info!(target: "quiz", ?mode, correct = verdict.correct, "Answer graded");
  Ok(verdict)
}
