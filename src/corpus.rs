//! Sentence corpus loading.
//!
//! The row-oriented source is a CSV file. On first load a columnar JSON copy is written
//! next to it; later loads prefer that copy and fall back to the CSV when it is missing
//! or unreadable. Failing to write the copy is logged and otherwise ignored.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::domain::SentenceRecord;

const CHINESE_HEADERS: &[&str] = &["中文句子", "chinese"];
const THAI_HEADERS: &[&str] = &["泰文", "thai"];
const ROMANIZATION_HEADERS: &[&str] = &["羅馬拼音", "romanization"];
const LESSON_HEADERS: &[&str] = &["課別", "lesson"];

#[derive(Debug, Error)]
pub enum CorpusError {
  #[error("failed to read corpus: {0}")]
  Io(#[from] std::io::Error),
  #[error("failed to parse corpus CSV: {0}")]
  Csv(#[from] csv::Error),
  #[error("missing required columns: {}", .columns.join(", "))]
  MissingColumns { columns: Vec<String> },
  #[error("no sentences{}", lesson_suffix(.lesson))]
  Empty { lesson: Option<String> },
}

fn lesson_suffix(lesson: &Option<String>) -> String {
  match lesson {
    Some(l) => format!(" for lesson '{}'", l),
    None => String::new(),
  }
}

/// Where the corpus lives on disk.
#[derive(Clone, Debug)]
pub struct CorpusPaths {
  pub csv: PathBuf,
  pub columnar: PathBuf,
}

impl CorpusPaths {
  /// Columnar copy defaults to `<stem>.columns.json` beside the CSV.
  pub fn beside(csv: impl Into<PathBuf>) -> Self {
    let csv = csv.into();
    let columnar = csv.with_extension("columns.json");
    Self { csv, columnar }
  }
}

/// Column-per-field layout of the corpus.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ColumnarCorpus {
  chinese: Vec<String>,
  thai: Vec<String>,
  romanization: Vec<String>,
  lesson: Vec<Option<String>>,
}

impl ColumnarCorpus {
  fn from_records(records: &[SentenceRecord]) -> Self {
    let mut c = ColumnarCorpus::default();
    for r in records {
      c.chinese.push(r.chinese.clone());
      c.thai.push(r.thai.clone());
      c.romanization.push(r.romanization.clone());
      c.lesson.push(r.lesson.clone());
    }
    c
  }

  fn into_records(self) -> Option<Vec<SentenceRecord>> {
    let n = self.chinese.len();
    if self.thai.len() != n || self.romanization.len() != n || self.lesson.len() != n {
      return None;
    }
    let rows = self
      .chinese
      .into_iter()
      .zip(self.thai)
      .zip(self.romanization)
      .zip(self.lesson)
      .map(|(((chinese, thai), romanization), lesson)| SentenceRecord { chinese, thai, romanization, lesson })
      .collect();
    Some(rows)
  }
}

/// Immutable, loaded-once sentence table with per-lesson views.
#[derive(Debug)]
pub struct Corpus {
  records: Arc<[SentenceRecord]>,
  lessons: Vec<String>,
  by_lesson: HashMap<String, Arc<[SentenceRecord]>>,
}

impl Corpus {
  pub fn from_records(records: Vec<SentenceRecord>) -> Result<Self, CorpusError> {
    if records.is_empty() {
      return Err(CorpusError::Empty { lesson: None });
    }

    let mut lessons: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Vec<SentenceRecord>> = HashMap::new();
    for r in &records {
      if let Some(l) = &r.lesson {
        if !grouped.contains_key(l) {
          lessons.push(l.clone());
        }
        grouped.entry(l.clone()).or_default().push(r.clone());
      }
    }
    let by_lesson = grouped
      .into_iter()
      .map(|(k, v)| (k, Arc::from(v)))
      .collect();

    Ok(Self { records: Arc::from(records), lessons, by_lesson })
  }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  pub fn all(&self) -> Arc<[SentenceRecord]> { self.records.clone() }

  /// Distinct lesson tags in first-seen order.
  pub fn lessons(&self) -> &[String] { &self.lessons }

  /// Active corpus for a lesson filter; `None` means the whole table.
  pub fn filter(&self, lesson: Option<&str>) -> Result<Arc<[SentenceRecord]>, CorpusError> {
    match lesson {
      None => Ok(self.records.clone()),
      Some(l) => self
        .by_lesson
        .get(l)
        .cloned()
        .ok_or_else(|| CorpusError::Empty { lesson: Some(l.to_string()) }),
    }
  }
}

/// Load the corpus, preferring the columnar copy.
#[instrument(level = "info", skip_all, fields(csv = %paths.csv.display(), columnar = %paths.columnar.display()))]
pub fn load(paths: &CorpusPaths) -> Result<Corpus, CorpusError> {
  if paths.columnar.exists() {
    match read_columnar(&paths.columnar) {
      Some(records) => {
        info!(target: "thai_drill", rows = records.len(), "Loaded corpus from columnar copy");
        return Corpus::from_records(records);
      }
      None => warn!(target: "thai_drill", "Columnar copy unreadable; falling back to CSV"),
    }
  }

  let records = read_csv(&paths.csv)?;
  info!(target: "thai_drill", rows = records.len(), "Loaded corpus from CSV");
  write_columnar(&paths.columnar, &records);
  Corpus::from_records(records)
}

fn read_columnar(path: &Path) -> Option<Vec<SentenceRecord>> {
  let bytes = std::fs::read(path).ok()?;
  let cols: ColumnarCorpus = serde_json::from_slice(&bytes).ok()?;
  cols.into_records()
}

fn write_columnar(path: &Path, records: &[SentenceRecord]) {
  let cols = ColumnarCorpus::from_records(records);
  let res = serde_json::to_vec(&cols)
    .map_err(|e| e.to_string())
    .and_then(|bytes| std::fs::write(path, bytes).map_err(|e| e.to_string()));
  match res {
    Ok(()) => debug!(target: "thai_drill", path = %path.display(), "Wrote columnar corpus copy"),
    Err(e) => warn!(target: "thai_drill", path = %path.display(), error = %e, "Could not write columnar copy"),
  }
}

fn find_column(headers: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
  headers.iter().position(|h| {
    let h = h.trim_start_matches('\u{feff}').trim();
    aliases.iter().any(|a| h.eq_ignore_ascii_case(a))
  })
}

/// Parse the row-oriented CSV. Rows with a blank required field are skipped.
pub fn read_csv(path: &Path) -> Result<Vec<SentenceRecord>, CorpusError> {
  let mut rdr = csv::ReaderBuilder::new()
    .trim(csv::Trim::All)
    .flexible(true)
    .from_path(path)?;
  parse_rows(&mut rdr)
}

fn parse_rows<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> Result<Vec<SentenceRecord>, CorpusError> {
  let headers = rdr.headers()?.clone();

  let required = [
    (CHINESE_HEADERS, find_column(&headers, CHINESE_HEADERS)),
    (THAI_HEADERS, find_column(&headers, THAI_HEADERS)),
    (ROMANIZATION_HEADERS, find_column(&headers, ROMANIZATION_HEADERS)),
  ];
  let missing: Vec<String> = required
    .iter()
    .filter(|(_, idx)| idx.is_none())
    .map(|(aliases, _)| aliases[0].to_string())
    .collect();
  let (zh, th, ro) = match required {
    [(_, Some(zh)), (_, Some(th)), (_, Some(ro))] => (zh, th, ro),
    _ => return Err(CorpusError::MissingColumns { columns: missing }),
  };
  let lesson_col = find_column(&headers, LESSON_HEADERS);

  let mut records = Vec::new();
  for (line, row) in rdr.records().enumerate() {
    let row = row?;
    let field = |i: usize| row.get(i).map(str::trim).unwrap_or("");
    let (chinese, thai, romanization) = (field(zh), field(th), field(ro));
    if chinese.is_empty() || thai.is_empty() || romanization.is_empty() {
      debug!(target: "thai_drill", row = line + 2, "Skipping row with blank required field");
      continue;
    }
    let lesson = lesson_col.map(field).filter(|l| !l.is_empty()).map(str::to_string);
    records.push(SentenceRecord {
      chinese: chinese.to_string(),
      thai: thai.to_string(),
      romanization: romanization.to_string(),
      lesson,
    });
  }
  Ok(records)
}
