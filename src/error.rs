//! Service-level error type and its HTTP mapping.

use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use crate::corpus::CorpusError;
use crate::pool::PoolError;
use crate::protocol::ErrorOut;
use crate::session::SessionWarning;

#[derive(Debug, Error)]
pub enum DrillError {
  #[error("unknown session: {0}")]
  UnknownSession(String),
  #[error(transparent)]
  Corpus(#[from] CorpusError),
  #[error(transparent)]
  Pool(#[from] PoolError),
  #[error(transparent)]
  Warning(#[from] SessionWarning),
}

impl DrillError {
  /// Stable machine-readable kind for clients.
  pub fn kind(&self) -> &'static str {
    match self {
      DrillError::UnknownSession(_) => "unknown_session",
      DrillError::Corpus(CorpusError::Empty { .. }) => "empty_corpus",
      DrillError::Corpus(CorpusError::MissingColumns { .. }) => "schema",
      DrillError::Corpus(_) => "corpus",
      DrillError::Pool(PoolError::InsufficientCorpus { .. }) => "insufficient_corpus",
      DrillError::Pool(PoolError::InsufficientPool { .. }) => "insufficient_pool",
      DrillError::Warning(_) => "warning",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      DrillError::UnknownSession(_) => StatusCode::NOT_FOUND,
      DrillError::Warning(_) => StatusCode::CONFLICT,
      DrillError::Corpus(CorpusError::Io(_)) | DrillError::Corpus(CorpusError::Csv(_)) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
      DrillError::Corpus(_) | DrillError::Pool(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
  }

  pub fn to_out(&self) -> ErrorOut {
    ErrorOut { kind: self.kind().into(), message: self.to_string() }
  }
}

impl IntoResponse for DrillError {
  fn into_response(self) -> axum::response::Response {
    (self.status(), Json(self.to_out())).into_response()
  }
}
