//! Optional translation collaborator backed by an OpenAI-compatible chat endpoint.
//!
//! Only chat.completions is used, asking for the plain translated text. Calls log
//! model name, latency and sizes, never contents or the API key.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::util::fill_template;

#[derive(Debug, Error)]
pub enum TranslateError {
  #[error("translation request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("translation service returned {status}: {message}")]
  Status { status: u16, message: String },
  #[error("translation timed out")]
  Timeout,
  #[error("translation service returned no text")]
  Empty,
  #[error("translation is not configured")]
  Disabled,
}

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

/// Human-readable language name for prompts.
pub fn language_name(code: &str) -> &str {
  match code {
    "th" => "Thai",
    "zh" | "zh-TW" | "zh-tw" => "Traditional Chinese",
    "zh-CN" | "zh-cn" => "Simplified Chinese",
    "en" => "English",
    other => other,
  }
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env(timeout: Duration) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

    let client = reqwest::Client::builder().timeout(timeout).build().ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  /// `translate(text, source, dest)`. Errors are returned, never swallowed here.
  #[instrument(level = "info", skip(self, system_tpl, text), fields(text_len = text.len(), model = %self.model))]
  pub async fn translate(
    &self,
    system_tpl: &str,
    text: &str,
    source: &str,
    dest: &str,
  ) -> Result<String, TranslateError> {
    let input = text.trim();
    if input.is_empty() {
      return Ok(String::new());
    }
    let system = fill_template(
      system_tpl,
      &[("source", language_name(source)), ("dest", language_name(dest))],
    );
    let start = std::time::Instant::now();
    let out = self.chat_plain(&system, input, 0.0).await?;
    info!(elapsed = ?start.elapsed(), out_len = out.len(), "Translation received");
    if out.is_empty() {
      return Err(TranslateError::Empty);
    }
    Ok(out)
  }

  /// Plain-text chat completion.
  async fn chat_plain(&self, system: &str, user: &str, temperature: f32) -> Result<String, TranslateError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
    };

    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "thai-drill/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req)
      .send()
      .await?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or(body);
      return Err(TranslateError::Status { status, message });
    }

    let body: ChatCompletionResponse = res.json().await?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, "OpenAI usage");
    }
    Ok(body
      .choices
      .first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default()
      .trim()
      .to_string())
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
