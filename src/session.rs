//! Quiz session engine: per-mode question pointers, answered flags and the
//! once-per-question option/word cache.
//!
//! Each practice mode moves through `Unanswered -> Answered -> Unanswered`:
//! `submit` needs real input, `advance` needs an answered question. Rejections are
//! returned as `SessionWarning` and leave the state untouched.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::corpus::CorpusError;
use crate::domain::{AnswerTarget, Direction, PracticeMode, SentenceRecord};
use crate::grader::is_punctuation;
use crate::pool::{PoolError, Pools, QuestionOptions};

/// Longest token (in code points) accepted as a single "word".
const MAX_WORD_CHARS: usize = 4;

/// Recoverable, user-facing rejections.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionWarning {
  #[error("Please type an answer before submitting.")]
  BlankAnswer,
  #[error("Please pick one of the options first.")]
  NoSelection,
  #[error("Answer and submit this question before moving on.")]
  NotAnswered,
}

/// State of one practice mode.
#[derive(Clone, Debug, Default)]
pub struct ModeState {
  pub index: usize,
  pub answered: bool,
  pub last_input: String,
  pub target: AnswerTarget,
  options: Option<QuestionOptions>,
  word: Option<String>,
}

impl ModeState {
  fn fresh(index: usize, target: AnswerTarget) -> Self {
    Self { index, target, ..Default::default() }
  }

  /// Drop cached options/word so the next render draws again.
  fn invalidate(&mut self) {
    self.options = None;
    self.word = None;
  }

  pub fn cached_options(&self) -> Option<&QuestionOptions> { self.options.as_ref() }
}

#[derive(Clone, Debug)]
pub struct SessionState {
  pub mode: PracticeMode,
  pub lesson: Option<String>,
  modes: [ModeState; 4],
}

impl SessionState {
  pub fn get(&self, mode: PracticeMode) -> &ModeState { &self.modes[mode.slot()] }
}

/// One user's quiz. Owns its random source so draws are reproducible under a seed.
pub struct QuizSession<R = StdRng> {
  state: SessionState,
  corpus: Arc<[SentenceRecord]>,
  pools: Arc<Pools>,
  distractors: usize,
  rng: R,
}

impl<R: Rng> QuizSession<R> {
  pub fn new(
    corpus: Arc<[SentenceRecord]>,
    lesson: Option<String>,
    pools: Arc<Pools>,
    distractors: usize,
    mut rng: R,
  ) -> Result<Self, CorpusError> {
    if corpus.is_empty() {
      return Err(CorpusError::Empty { lesson });
    }
    let n = corpus.len();
    let modes = std::array::from_fn(|_| ModeState::fresh(rng.gen_range(0..n), AnswerTarget::default()));
    Ok(Self {
      state: SessionState { mode: PracticeMode::default(), lesson, modes },
      corpus,
      pools,
      distractors,
      rng,
    })
  }

  pub fn state(&self) -> &SessionState { &self.state }

  pub fn corpus_len(&self) -> usize { self.corpus.len() }

  /// Record under the mode's current pointer.
  pub fn current(&self, mode: PracticeMode) -> &SentenceRecord {
    &self.corpus[self.state.get(mode).index]
  }

  /// Make `mode` active. Only that mode's answered flag, input and cache are reset,
  /// and only when the active mode actually changes.
  #[instrument(level = "debug", skip(self))]
  pub fn switch_mode(&mut self, mode: PracticeMode) {
    if self.state.mode == mode {
      return;
    }
    self.state.mode = mode;
    let slot = &mut self.state.modes[mode.slot()];
    slot.answered = false;
    slot.last_input.clear();
    slot.invalidate();
    debug!(target: "quiz", ?mode, index = slot.index, "Mode switched");
  }

  /// Swap the active corpus. Every mode gets a fresh pointer and flags.
  #[instrument(level = "info", skip(self, corpus), fields(corpus_len = corpus.len()))]
  pub fn switch_lesson(&mut self, lesson: Option<String>, corpus: Arc<[SentenceRecord]>) -> Result<(), CorpusError> {
    if corpus.is_empty() {
      return Err(CorpusError::Empty { lesson });
    }
    let n = corpus.len();
    for slot in self.state.modes.iter_mut() {
      *slot = ModeState::fresh(self.rng.gen_range(0..n), slot.target);
    }
    self.corpus = corpus;
    info!(target: "quiz", lesson = ?lesson, "Lesson switched");
    self.state.lesson = lesson;
    Ok(())
  }

  /// Options for the multiple-choice mode asking in `direction`.
  /// Drawn on first call for a question; later calls return the same options.
  pub fn options(&mut self, direction: Direction) -> Result<&QuestionOptions, PoolError> {
    let slot = &mut self.state.modes[direction.choice_mode().slot()];
    let opts = match slot.options.take() {
      Some(o) => o,
      None => {
        let correct = direction.answer(&self.corpus[slot.index]);
        let drawn = self.pools.get(direction)?.draw(correct, self.distractors, &mut self.rng)?;
        debug!(target: "quiz", ?direction, index = slot.index, "Options drawn");
        drawn
      }
    };
    Ok(&*slot.options.insert(opts))
  }

  /// Prompt token for the word mode, fixed for the life of the question.
  pub fn word(&mut self) -> &str {
    let slot = &mut self.state.modes[PracticeMode::WordZhTh.slot()];
    let w = match slot.word.take() {
      Some(w) => w,
      None => extract_word(&self.corpus[slot.index].chinese, &mut self.rng),
    };
    slot.word.insert(w).as_str()
  }

  /// `Unanswered -> Answered`. Blank text or a missing selection is rejected.
  /// Re-submitting an answered question replaces the stored input.
  #[instrument(level = "debug", skip(self, input), fields(input_len = input.map(str::len)))]
  pub fn submit(
    &mut self,
    mode: PracticeMode,
    input: Option<&str>,
    target: Option<AnswerTarget>,
  ) -> Result<(), SessionWarning> {
    let text = match input {
      Some(s) if !s.trim().is_empty() => s,
      _ if mode.is_choice() => return Err(SessionWarning::NoSelection),
      _ => return Err(SessionWarning::BlankAnswer),
    };
    let slot = &mut self.state.modes[mode.slot()];
    slot.answered = true;
    slot.last_input = text.to_string();
    if let Some(t) = target {
      slot.target = t;
    }
    Ok(())
  }

  /// `Answered -> Unanswered` with a new uniformly random pointer (repeats allowed).
  #[instrument(level = "debug", skip(self))]
  pub fn advance(&mut self, mode: PracticeMode) -> Result<usize, SessionWarning> {
    let n = self.corpus.len();
    let slot = &mut self.state.modes[mode.slot()];
    if !slot.answered {
      warn!(target: "quiz", ?mode, "Advance rejected: question not answered");
      return Err(SessionWarning::NotAnswered);
    }
    slot.index = self.rng.gen_range(0..n);
    slot.answered = false;
    slot.last_input.clear();
    slot.invalidate();
    Ok(slot.index)
  }
}

/// Split on punctuation/whitespace, keep 1..=4 code point tokens, pick one.
/// Falls back to the whole sentence when nothing qualifies.
pub fn extract_word<R: Rng + ?Sized>(sentence: &str, rng: &mut R) -> String {
  let tokens: Vec<&str> = sentence
    .split(|c: char| is_punctuation(c) || c.is_whitespace())
    .filter(|t| (1..=MAX_WORD_CHARS).contains(&t.chars().count()))
    .collect();
  match tokens.choose(rng) {
    Some(t) => t.to_string(),
    None => sentence.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;

  fn rec(zh: &str, th: &str, ro: &str) -> SentenceRecord {
    SentenceRecord { chinese: zh.into(), thai: th.into(), romanization: ro.into(), lesson: None }
  }

  fn corpus(n: usize) -> Arc<[SentenceRecord]> {
    (0..n)
      .map(|i| rec(&format!("句子{i}"), &format!("ประโยค{i}"), &format!("prayok{i}")))
      .collect::<Vec<_>>()
      .into()
  }

  fn session(c: Arc<[SentenceRecord]>) -> QuizSession {
    let mut rng = StdRng::seed_from_u64(11);
    let pools = Arc::new(Pools::build(&c, 500, 3, &mut rng));
    QuizSession::new(c, None, pools, 3, rng).unwrap()
  }

  #[test]
  fn new_rejects_empty_corpus() {
    let c: Arc<[SentenceRecord]> = Vec::new().into();
    let pools = Arc::new(Pools::build(&c, 500, 3, &mut StdRng::seed_from_u64(0)));
    let err = QuizSession::new(c, Some("L1".into()), pools, 3, StdRng::seed_from_u64(0)).err();
    assert!(matches!(err, Some(CorpusError::Empty { lesson: Some(_) })));
  }

  #[test]
  fn blank_submit_is_rejected_and_blocks_advance() {
    let mut s = session(corpus(5));
    let m = PracticeMode::FreeSentence;
    assert_eq!(s.submit(m, Some("   "), None), Err(SessionWarning::BlankAnswer));
    assert_eq!(s.submit(m, None, None), Err(SessionWarning::BlankAnswer));
    assert!(!s.state().get(m).answered);
    let before = s.state().get(m).index;
    assert_eq!(s.advance(m), Err(SessionWarning::NotAnswered));
    assert_eq!(s.state().get(m).index, before);
  }

  #[test]
  fn choice_submit_needs_selection() {
    let mut s = session(corpus(5));
    assert_eq!(s.submit(PracticeMode::ChoiceZhTh, None, None), Err(SessionWarning::NoSelection));
    assert!(s.submit(PracticeMode::ChoiceZhTh, Some("ประโยค1"), None).is_ok());
    assert!(s.state().get(PracticeMode::ChoiceZhTh).answered);
  }

  #[test]
  fn advance_from_answered_resets_and_stays_in_range() {
    let mut s = session(corpus(7));
    let m = PracticeMode::FreeSentence;
    for _ in 0..30 {
      s.submit(m, Some("x"), Some(AnswerTarget::Romanization)).unwrap();
      let idx = s.advance(m).unwrap();
      assert!(idx < 7);
      let st = s.state().get(m);
      assert!(!st.answered);
      assert!(st.last_input.is_empty());
      assert_eq!(st.target, AnswerTarget::Romanization);
    }
  }

  #[test]
  fn options_are_cached_until_advance() {
    let mut s = session(corpus(20));
    let d = Direction::ChineseToThai;
    let first = s.options(d).unwrap().clone();
    for _ in 0..5 {
      assert_eq!(s.options(d).unwrap(), &first);
    }
    assert_eq!(first.correct, s.current(PracticeMode::ChoiceZhTh).thai);

    s.submit(PracticeMode::ChoiceZhTh, Some(first.options[0].as_str()), None).unwrap();
    s.advance(PracticeMode::ChoiceZhTh).unwrap();
    assert!(s.state().get(PracticeMode::ChoiceZhTh).cached_options().is_none());
    let next = s.options(d).unwrap().clone();
    assert_eq!(next.correct, s.current(PracticeMode::ChoiceZhTh).thai);
  }

  #[test]
  fn mode_switch_resets_only_target_mode() {
    let mut s = session(corpus(20));
    s.options(Direction::ThaiToChinese).unwrap();
    s.submit(PracticeMode::FreeSentence, Some("abc"), None).unwrap();
    let free_idx = s.state().get(PracticeMode::FreeSentence).index;

    s.switch_mode(PracticeMode::ChoiceThZh);
    assert_eq!(s.state().mode, PracticeMode::ChoiceThZh);
    assert!(s.state().get(PracticeMode::ChoiceThZh).cached_options().is_none());
    let free = s.state().get(PracticeMode::FreeSentence);
    assert!(free.answered);
    assert_eq!(free.index, free_idx);
    assert_eq!(free.last_input, "abc");
  }

  #[test]
  fn switching_to_the_active_mode_keeps_its_state() {
    let mut s = session(corpus(20));
    let m = PracticeMode::ChoiceZhTh;
    s.switch_mode(m);
    let opts = s.options(Direction::ChineseToThai).unwrap().clone();
    s.submit(m, Some(opts.options[0].as_str()), None).unwrap();

    s.switch_mode(m);
    let st = s.state().get(m);
    assert!(st.answered);
    assert_eq!(st.last_input, opts.options[0]);
    assert_eq!(st.cached_options(), Some(&opts));
    assert!(s.advance(m).is_ok());
  }

  #[test]
  fn lesson_switch_resets_every_mode() {
    let mut s = session(corpus(20));
    for m in PracticeMode::ALL {
      s.submit(m, Some("x"), None).unwrap();
    }
    s.options(Direction::ChineseToThai).unwrap();
    s.switch_lesson(Some("L2".into()), corpus(3)).unwrap();
    assert_eq!(s.corpus_len(), 3);
    assert_eq!(s.state().lesson.as_deref(), Some("L2"));
    for m in PracticeMode::ALL {
      let st = s.state().get(m);
      assert!(!st.answered);
      assert!(st.index < 3);
      assert!(st.cached_options().is_none());
    }
  }

  #[test]
  fn lesson_switch_to_empty_keeps_state() {
    let mut s = session(corpus(4));
    let empty: Arc<[SentenceRecord]> = Vec::new().into();
    assert!(s.switch_lesson(Some("none".into()), empty).is_err());
    assert_eq!(s.corpus_len(), 4);
    assert_eq!(s.state().lesson, None);
  }

  #[test]
  fn tiny_corpus_still_serves_free_text() {
    let c: Arc<[SentenceRecord]> = vec![rec("你好", "สวัสดี", "sawatdee")].into();
    let mut s = session(c);
    assert!(matches!(s.options(Direction::ChineseToThai), Err(PoolError::InsufficientCorpus { .. })));
    assert_eq!(s.current(PracticeMode::FreeSentence).romanization, "sawatdee");
    assert!(s.submit(PracticeMode::FreeSentence, Some("Sawatdee"), Some(AnswerTarget::Romanization)).is_ok());
    assert_eq!(s.advance(PracticeMode::FreeSentence), Ok(0));
  }

  #[test]
  fn word_is_stable_per_question() {
    let c: Arc<[SentenceRecord]> = vec![rec("我，想喝 咖啡。", "ฉันอยากดื่มกาแฟ", "chan yak duem kafae")].into();
    let mut s = session(c);
    let w = s.word().to_string();
    assert!(["我", "想喝", "咖啡"].contains(&w.as_str()));
    for _ in 0..5 {
      assert_eq!(s.word(), w);
    }
  }

  #[test]
  fn extract_word_rules() {
    let mut rng = StdRng::seed_from_u64(5);
    assert_eq!(extract_word("你好", &mut rng), "你好");
    // One long run of characters: nothing qualifies, whole sentence comes back.
    assert_eq!(extract_word("我想喝咖啡。", &mut rng), "我想喝咖啡。");
    assert_eq!(extract_word("。！", &mut rng), "。！");
    for _ in 0..20 {
      let w = extract_word("今天，天气很好！我们 出去吧", &mut rng);
      assert!(["今天", "天气很好", "我们", "出去吧"].contains(&w.as_str()));
    }
  }
}
