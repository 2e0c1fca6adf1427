//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic; one JSON message is sent back per request.
//! The connection remembers the session it started.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::error::DrillError;
use crate::logic::*;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "thai_drill", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "thai_drill", "WebSocket connected");
  let mut session: Option<String> = None;
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "thai_drill", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state, &mut session).await
          }
          Err(e) => ServerWsMessage::Error { kind: "bad_request".into(), message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "kind": "internal", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "thai_drill", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "thai_drill", "WebSocket disconnected");
}

fn error_msg(e: DrillError) -> ServerWsMessage {
  ServerWsMessage::Error { kind: e.kind().into(), message: e.to_string() }
}

/// Session id of this connection, or the reply telling the client to start one.
fn require(session: &Option<String>) -> Result<&str, ServerWsMessage> {
  session.as_deref().ok_or_else(|| ServerWsMessage::Error {
    kind: "no_session".into(),
    message: "Send start_session first.".into(),
  })
}

async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, session: &mut Option<String>) -> ServerWsMessage {
  dispatch(msg, state, session).await.unwrap_or_else(|reply| reply)
}

async fn dispatch(
  msg: ClientWsMessage,
  state: &AppState,
  session: &mut Option<String>,
) -> Result<ServerWsMessage, ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => Ok(ServerWsMessage::Pong),
    ClientWsMessage::Translate { text, source, dest } => {
      Ok(ServerWsMessage::Translate { result: do_translate(state, &text, &source, &dest).await })
    }
    ClientWsMessage::StartSession { lesson } => {
      let out = start_session(state, lesson).await.map_err(error_msg)?;
      *session = Some(out.session_id.clone());
      Ok(ServerWsMessage::Session { session: out })
    }
    ClientWsMessage::Question { mode } => {
      let id = require(session)?;
      let question = get_question(state, id, mode).await.map_err(error_msg)?;
      Ok(ServerWsMessage::Question { question })
    }
    ClientWsMessage::SwitchMode { mode } => {
      let id = require(session)?;
      let question = switch_mode(state, id, mode).await.map_err(error_msg)?;
      Ok(ServerWsMessage::Question { question })
    }
    ClientWsMessage::Next { mode } => {
      let id = require(session)?;
      let question = next_question(state, id, mode).await.map_err(error_msg)?;
      Ok(ServerWsMessage::Question { question })
    }
    ClientWsMessage::SubmitAnswer { mode, input, target } => {
      let id = require(session)?;
      let result = submit_answer(state, id, mode, input, target).await.map_err(error_msg)?;
      info!(target: "quiz", session = %id, correct = result.correct, "WS submit_answer evaluated");
      Ok(ServerWsMessage::AnswerResult { result })
    }
    ClientWsMessage::SwitchLesson { lesson } => {
      let id = require(session)?;
      let out = switch_lesson(state, id, lesson).await.map_err(error_msg)?;
      Ok(ServerWsMessage::Session { session: out })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::PracticeMode;
  use crate::state::tests::test_state;

  #[tokio::test]
  async fn messages_before_start_are_rejected() {
    let state = test_state(4);
    let mut session = None;
    let reply = handle_client_ws(ClientWsMessage::Next { mode: PracticeMode::FreeSentence }, &state, &mut session).await;
    assert!(matches!(reply, ServerWsMessage::Error { ref kind, .. } if kind == "no_session"));
  }

  #[tokio::test]
  async fn sessionless_messages_get_their_own_replies() {
    let state = test_state(4);
    let mut session = None;
    let reply = handle_client_ws(ClientWsMessage::Ping, &state, &mut session).await;
    assert!(matches!(reply, ServerWsMessage::Pong));

    let reply = handle_client_ws(
      ClientWsMessage::Translate { text: "สวัสดี".into(), source: "th".into(), dest: "zh-TW".into() },
      &state,
      &mut session,
    )
    .await;
    match reply {
      ServerWsMessage::Translate { result } => assert!(result.notice.is_some()),
      other => panic!("unexpected: {:?}", other),
    }
    assert!(session.is_none());
  }

  #[tokio::test]
  async fn connection_keeps_its_session() {
    let state = test_state(6);
    let mut session = None;
    let reply = handle_client_ws(ClientWsMessage::StartSession { lesson: Some("L1".into()) }, &state, &mut session).await;
    assert!(matches!(reply, ServerWsMessage::Session { .. }));
    assert!(session.is_some());

    let reply = handle_client_ws(ClientWsMessage::Question { mode: None }, &state, &mut session).await;
    match reply {
      ServerWsMessage::Question { question } => assert_eq!(question.corpus_len, 3),
      other => panic!("unexpected: {:?}", other),
    }

    let reply = handle_client_ws(
      ClientWsMessage::SubmitAnswer { mode: PracticeMode::FreeSentence, input: None, target: None },
      &state,
      &mut session,
    )
    .await;
    assert!(matches!(reply, ServerWsMessage::Error { ref kind, .. } if kind == "warning"));
  }
}
