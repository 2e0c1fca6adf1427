//! Distractor pools: a fixed random sample of candidate wrong answers per direction,
//! drawn once per corpus load, and the per-question option draw.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{Direction, SentenceRecord};

pub const DEFAULT_POOL_SIZE: usize = 500;
pub const DEFAULT_DISTRACTORS: usize = 3;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PoolError {
  #[error("corpus has {available} sentences, need at least {needed} to build options")]
  InsufficientCorpus { needed: usize, available: usize },
  #[error("pool has {available} candidates besides the answer, need {needed}")]
  InsufficientPool { needed: usize, available: usize },
}

#[derive(Clone, Debug)]
pub struct DistractorPool {
  direction: Direction,
  texts: Vec<String>,
}

/// Options fixed for one question instance. `options` has length k+1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuestionOptions {
  pub options: Vec<String>,
  pub correct: String,
}

impl DistractorPool {
  /// Sample up to `pool_size` distinct answer texts for `direction` without replacement.
  #[instrument(level = "debug", skip(corpus, rng), fields(corpus_len = corpus.len()))]
  pub fn build<R: Rng + ?Sized>(
    corpus: &[SentenceRecord],
    direction: Direction,
    pool_size: usize,
    k: usize,
    rng: &mut R,
  ) -> Result<Self, PoolError> {
    if corpus.len() < k + 1 {
      return Err(PoolError::InsufficientCorpus { needed: k + 1, available: corpus.len() });
    }

    let mut seen = HashSet::new();
    let column: Vec<&str> = corpus
      .iter()
      .map(|r| direction.answer(r))
      .filter(|t| seen.insert(*t))
      .collect();

    let size = pool_size.min(column.len());
    let texts: Vec<String> = column
      .choose_multiple(rng, size)
      .map(|t| t.to_string())
      .collect();

    debug!(target: "quiz", ?direction, pool_len = texts.len(), "Distractor pool built");
    Ok(Self { direction, texts })
  }

  pub fn direction(&self) -> Direction { self.direction }

  pub fn len(&self) -> usize { self.texts.len() }

  pub fn is_empty(&self) -> bool { self.texts.is_empty() }

  pub fn texts(&self) -> &[String] { &self.texts }

  /// Pick `k` distractors not equal to `correct`, add `correct`, shuffle.
  pub fn draw<R: Rng + ?Sized>(
    &self,
    correct: &str,
    k: usize,
    rng: &mut R,
  ) -> Result<QuestionOptions, PoolError> {
    let candidates: Vec<&String> = self.texts.iter().filter(|t| t.as_str() != correct).collect();
    if candidates.len() < k {
      return Err(PoolError::InsufficientPool { needed: k, available: candidates.len() });
    }

    let mut options: Vec<String> = candidates
      .choose_multiple(rng, k)
      .map(|t| (*t).clone())
      .collect();
    options.push(correct.to_string());
    options.shuffle(rng);

    Ok(QuestionOptions { options, correct: correct.to_string() })
  }
}

/// Both directions, built together at corpus load. A failed build is kept so the
/// free-text modes keep working on corpora too small for multiple choice.
#[derive(Clone, Debug)]
pub struct Pools {
  pub thai: Result<DistractorPool, PoolError>,
  pub chinese: Result<DistractorPool, PoolError>,
}

impl Pools {
  pub fn build<R: Rng + ?Sized>(
    corpus: &[SentenceRecord],
    pool_size: usize,
    k: usize,
    rng: &mut R,
  ) -> Self {
    Self {
      thai: DistractorPool::build(corpus, Direction::ChineseToThai, pool_size, k, rng),
      chinese: DistractorPool::build(corpus, Direction::ThaiToChinese, pool_size, k, rng),
    }
  }

  pub fn get(&self, direction: Direction) -> Result<&DistractorPool, PoolError> {
    let slot = match direction {
      Direction::ChineseToThai => &self.thai,
      Direction::ThaiToChinese => &self.chinese,
    };
    slot.as_ref().map_err(Clone::clone)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn corpus(n: usize) -> Vec<SentenceRecord> {
    (0..n)
      .map(|i| SentenceRecord {
        chinese: format!("中文{i}"),
        thai: format!("ไทย{i}"),
        romanization: format!("thai{i}"),
        lesson: None,
      })
      .collect()
  }

  #[test]
  fn build_caps_pool_size_and_keeps_texts_distinct() {
    let mut rng = StdRng::seed_from_u64(7);
    let c = corpus(20);
    let pool = DistractorPool::build(&c, Direction::ChineseToThai, 8, 3, &mut rng).unwrap();
    assert_eq!(pool.len(), 8);
    let uniq: HashSet<_> = pool.texts().iter().collect();
    assert_eq!(uniq.len(), 8);
    assert!(pool.texts().iter().all(|t| t.starts_with("ไทย")));

    let all = DistractorPool::build(&c, Direction::ThaiToChinese, 500, 3, &mut rng).unwrap();
    assert_eq!(all.len(), 20);
  }

  #[test]
  fn build_rejects_tiny_corpus() {
    let mut rng = StdRng::seed_from_u64(1);
    let err = DistractorPool::build(&corpus(3), Direction::ChineseToThai, 500, 3, &mut rng).unwrap_err();
    assert_eq!(err, PoolError::InsufficientCorpus { needed: 4, available: 3 });
  }

  #[test]
  fn draw_returns_k_plus_one_with_single_correct() {
    let mut rng = StdRng::seed_from_u64(42);
    let c = corpus(10);
    let pool = DistractorPool::build(&c, Direction::ChineseToThai, 500, 3, &mut rng).unwrap();
    for _ in 0..50 {
      let q = pool.draw("ไทย4", 3, &mut rng).unwrap();
      assert_eq!(q.options.len(), 4);
      assert_eq!(q.options.iter().filter(|o| *o == "ไทย4").count(), 1);
      let uniq: HashSet<_> = q.options.iter().collect();
      assert_eq!(uniq.len(), 4);
      assert_eq!(q.correct, "ไทย4");
    }
  }

  #[test]
  fn draw_fails_when_duplicates_starve_the_pool() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut c = corpus(2);
    // Seven rows but only three unique Thai sentences.
    c.extend(corpus(2));
    c.extend(corpus(3));
    let pool = DistractorPool::build(&c, Direction::ChineseToThai, 500, 3, &mut rng).unwrap();
    assert_eq!(pool.len(), 3);
    let err = pool.draw("ไทย0", 3, &mut rng).unwrap_err();
    assert_eq!(err, PoolError::InsufficientPool { needed: 3, available: 2 });
  }

  #[test]
  fn correct_answer_outside_pool_still_appears_once() {
    let mut rng = StdRng::seed_from_u64(9);
    let pool = DistractorPool::build(&corpus(30), Direction::ChineseToThai, 5, 3, &mut rng).unwrap();
    let q = pool.draw("ไม่อยู่", 3, &mut rng).unwrap();
    assert_eq!(q.options.len(), 4);
    assert_eq!(q.options.iter().filter(|o| *o == "ไม่อยู่").count(), 1);
  }

  #[test]
  fn pools_keep_build_errors_per_direction() {
    let mut rng = StdRng::seed_from_u64(0);
    let pools = Pools::build(&corpus(1), 500, 3, &mut rng);
    assert!(matches!(pools.get(Direction::ChineseToThai), Err(PoolError::InsufficientCorpus { .. })));
    assert!(pools.get(Direction::ThaiToChinese).is_err());
  }
}
