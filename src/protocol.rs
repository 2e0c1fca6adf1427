//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{AnswerTarget, PracticeMode};
use crate::grader::Highlight;
use crate::modes::QuestionView;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartSession {
        #[serde(default)]
        lesson: Option<String>,
    },
    Question {
        #[serde(default)]
        mode: Option<PracticeMode>,
    },
    SwitchMode {
        mode: PracticeMode,
    },
    SubmitAnswer {
        mode: PracticeMode,
        #[serde(default)]
        input: Option<String>,
        #[serde(default)]
        target: Option<AnswerTarget>,
    },
    Next {
        mode: PracticeMode,
    },
    SwitchLesson {
        #[serde(default)]
        lesson: Option<String>,
    },
    Translate {
        text: String,
        source: String,
        dest: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session {
        session: SessionOut,
    },
    Question {
        question: QuestionView,
    },
    AnswerResult {
        result: AnswerOut,
    },
    Translate {
        result: TranslateOut,
    },
    Error {
        kind: String,
        message: String,
    },
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Default, Deserialize)]
pub struct SessionIn {
    #[serde(default)]
    pub lesson: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionOut {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub lesson: Option<String>,
    pub mode: PracticeMode,
    #[serde(rename = "corpusLen")]
    pub corpus_len: usize,
}

#[derive(Debug, Deserialize)]
pub struct QuestionQuery {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(default)]
    pub mode: Option<PracticeMode>,
}

#[derive(Debug, Deserialize)]
pub struct ModeIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub mode: PracticeMode,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub mode: PracticeMode,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub target: Option<AnswerTarget>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AnswerOut {
    pub correct: bool,
    pub expected: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,
    /// What the submitted Thai means, when the translation check ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    /// Informational note, e.g. when the translation check was unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LessonIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(default)]
    pub lesson: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LessonsOut {
    pub lessons: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct TranslateIn {
    pub text: String,
    pub source: String,
    pub dest: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct TranslateOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub kind: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
