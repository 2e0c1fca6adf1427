//! Domain models: sentence records, practice modes, directions and answer targets.

use serde::{Deserialize, Serialize};

/// One row of the sentence table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceRecord {
  pub chinese: String,
  pub thai: String,
  pub romanization: String,
  #[serde(default)] pub lesson: Option<String>,
}

/// Which language is the prompt and which one is the expected answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
  ChineseToThai,
  ThaiToChinese,
}

impl Direction {
  /// Text shown to the user as the question.
  pub fn prompt<'a>(&self, r: &'a SentenceRecord) -> &'a str {
    match self {
      Direction::ChineseToThai => &r.chinese,
      Direction::ThaiToChinese => &r.thai,
    }
  }

  /// Text the user is expected to pick.
  pub fn answer<'a>(&self, r: &'a SentenceRecord) -> &'a str {
    match self {
      Direction::ChineseToThai => &r.thai,
      Direction::ThaiToChinese => &r.chinese,
    }
  }

  /// The multiple-choice mode that asks in this direction.
  pub fn choice_mode(&self) -> PracticeMode {
    match self {
      Direction::ChineseToThai => PracticeMode::ChoiceZhTh,
      Direction::ThaiToChinese => PracticeMode::ChoiceThZh,
    }
  }
}

/// The four interaction variants. Each keeps its own question pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticeMode {
  /// Chinese prompt, free-text answer in Thai or romanization.
  FreeSentence,
  /// Chinese prompt, pick the Thai sentence.
  ChoiceZhTh,
  /// Thai prompt, pick the Chinese sentence.
  ChoiceThZh,
  /// Single Chinese token as prompt, free-text Thai answer.
  WordZhTh,
}

impl PracticeMode {
  pub const ALL: [PracticeMode; 4] = [
    PracticeMode::FreeSentence,
    PracticeMode::ChoiceZhTh,
    PracticeMode::ChoiceThZh,
    PracticeMode::WordZhTh,
  ];

  pub fn slot(&self) -> usize {
    match self {
      PracticeMode::FreeSentence => 0,
      PracticeMode::ChoiceZhTh => 1,
      PracticeMode::ChoiceThZh => 2,
      PracticeMode::WordZhTh => 3,
    }
  }

  /// Multiple-choice modes draw options in this direction.
  pub fn choice_direction(&self) -> Option<Direction> {
    match self {
      PracticeMode::ChoiceZhTh => Some(Direction::ChineseToThai),
      PracticeMode::ChoiceThZh => Some(Direction::ThaiToChinese),
      _ => None,
    }
  }

  pub fn is_choice(&self) -> bool { self.choice_direction().is_some() }
}

impl Default for PracticeMode {
  fn default() -> Self { PracticeMode::FreeSentence }
}

/// What the user chose to type in free-text mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerTarget {
  Thai,
  Romanization,
}

impl AnswerTarget {
  pub fn expected<'a>(&self, r: &'a SentenceRecord) -> &'a str {
    match self {
      AnswerTarget::Thai => &r.thai,
      AnswerTarget::Romanization => &r.romanization,
    }
  }
}

impl Default for AnswerTarget {
  fn default() -> Self { AnswerTarget::Thai }
}
