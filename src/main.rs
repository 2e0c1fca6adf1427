//! Thai Drill · Chinese/Thai sentence practice backend
//!
//! - Axum HTTP + WebSocket API
//! - Four practice modes over a CSV sentence corpus, optionally filtered by lesson
//! - Optional translation check through an OpenAI-compatible endpoint
//! - Static page fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT              : u16 (default 3000)
//!   DRILL_CONFIG_PATH : path to TOML config (corpus paths, quiz tuning, translation prompt)
//!   OPENAI_API_KEY    : enables the translation check if present
//!   OPENAI_BASE_URL   : default "https://api.openai.com/v1"
//!   OPENAI_MODEL      : default "gpt-4o-mini"
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod corpus;
mod pool;
mod grader;
mod session;
mod modes;
mod error;
mod state;
mod protocol;
mod logic;
mod openai;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::corpus::CorpusError;
use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Corpus, pools and translation client. Nothing is served without a corpus.
  let state = match AppState::from_env() {
    Ok(s) => Arc::new(s),
    Err(e) => {
      match &e {
        CorpusError::MissingColumns { columns } => {
          error!(target: "thai_drill", missing = ?columns, "Corpus file is missing required columns");
        }
        other => error!(target: "thai_drill", error = %other, "Failed to load corpus"),
      }
      return Err(e.into());
    }
  };

  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "thai_drill", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
