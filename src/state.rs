//! Application state: the loaded corpus, distractor pools, per-user quiz sessions and
//! the optional translation client.
//!
//! The corpus and pools are built once at startup and shared read-only. Each session
//! owns its own `QuizSession` (and random source) behind its own mutex, so requests for
//! one session are serialized while different sessions proceed independently. The map
//! lock is held only to look an entry up, insert or prune.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::{load_drill_config_from_env, DrillConfig};
use crate::corpus::{self, Corpus, CorpusError};
use crate::error::DrillError;
use crate::openai::OpenAI;
use crate::pool::Pools;
use crate::session::QuizSession;

pub struct SessionEntry {
    pub quiz: QuizSession,
    pub last_seen: Instant,
}

#[derive(Clone)]
pub struct AppState {
    pub corpus: Arc<Corpus>,
    pub pools: Arc<Pools>,
    pub sessions: Arc<RwLock<HashMap<String, Arc<Mutex<SessionEntry>>>>>,
    pub openai: Option<OpenAI>,
    pub config: DrillConfig,
    seq: Arc<AtomicU64>,
}

impl AppState {
    /// Build state from env: load config, load the corpus, build pools, init translation.
    /// Corpus failures are returned; the caller treats them as fatal.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Result<Self, CorpusError> {
        let config = load_drill_config_from_env().unwrap_or_default();
        let corpus = corpus::load(&config.corpus.paths())?;

        let openai = OpenAI::from_env(Duration::from_secs(config.translate.timeout_secs));
        if let Some(oa) = &openai {
            info!(target: "thai_drill", base_url = %oa.base_url, model = %oa.model, "Translation check enabled.");
        } else {
            info!(target: "thai_drill", "Translation check disabled (no OPENAI_API_KEY).");
        }

        Ok(Self::with_parts(config, corpus, openai))
    }

    pub fn with_parts(config: DrillConfig, corpus: Corpus, openai: Option<OpenAI>) -> Self {
        let mut rng = seeded_rng(config.quiz.seed, 0);
        let pools = Pools::build(&corpus.all(), config.quiz.pool_size, config.quiz.distractors, &mut rng);
        info!(
            target: "quiz",
            sentences = corpus.len(),
            lessons = corpus.lessons().len(),
            thai_pool = pools.thai.as_ref().map(|p| p.len()).unwrap_or(0),
            chinese_pool = pools.chinese.as_ref().map(|p| p.len()).unwrap_or(0),
            "Corpus ready"
        );

        Self {
            corpus: Arc::new(corpus),
            pools: Arc::new(pools),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            openai,
            config,
            seq: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Create a session on the (optionally lesson-filtered) corpus.
    #[instrument(level = "info", skip(self))]
    pub async fn create_session(&self, lesson: Option<String>) -> Result<String, DrillError> {
        let active = self.corpus.filter(lesson.as_deref())?;
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        let quiz = QuizSession::new(
            active,
            lesson,
            self.pools.clone(),
            self.config.quiz.distractors,
            seeded_rng(self.config.quiz.seed, n),
        )?;

        let id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        prune_idle(&mut sessions, Duration::from_secs(self.config.quiz.session_ttl_secs));
        let entry = SessionEntry { quiz, last_seen: Instant::now() };
        sessions.insert(id.clone(), Arc::new(Mutex::new(entry)));
        info!(target: "quiz", session = %id, live = sessions.len(), "Session created");
        Ok(id)
    }

    /// Run `f` against one session under that session's own lock.
    pub async fn with_session<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut QuizSession) -> Result<T, DrillError>,
    ) -> Result<T, DrillError> {
        let entry = self
            .sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| DrillError::UnknownSession(id.to_string()))?;
        let mut entry = entry.lock().await;
        entry.last_seen = Instant::now();
        f(&mut entry.quiz)
    }
}

/// Seeded per-session random source when a seed is configured, entropy otherwise.
fn seeded_rng(seed: Option<u64>, n: u64) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s.wrapping_add(n)),
        None => StdRng::from_entropy(),
    }
}

/// Drop sessions idle for at least `ttl`. A session whose lock is held is in use and stays.
fn prune_idle(sessions: &mut HashMap<String, Arc<Mutex<SessionEntry>>>, ttl: Duration) {
    let before = sessions.len();
    sessions.retain(|_, e| match e.try_lock() {
        Ok(entry) => entry.last_seen.elapsed() < ttl,
        Err(_) => true,
    });
    let dropped = before - sessions.len();
    if dropped > 0 {
        debug!(target: "quiz", dropped, "Pruned idle sessions");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::SentenceRecord;

    pub(crate) fn test_state(rows: usize) -> AppState {
        let records = (0..rows)
            .map(|i| SentenceRecord {
                chinese: format!("中文{i}"),
                thai: format!("ไทย{i}"),
                romanization: format!("thai{i}"),
                lesson: Some(if i % 2 == 0 { "L1".into() } else { "L2".into() }),
            })
            .collect();
        let mut config = DrillConfig::default();
        config.quiz.seed = Some(99);
        AppState::with_parts(config, Corpus::from_records(records).unwrap(), None)
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let state = test_state(10);
        let a = state.create_session(None).await.unwrap();
        let b = state.create_session(Some("L1".into())).await.unwrap();
        assert_ne!(a, b);
        let len_b = state.with_session(&b, |q| Ok(q.corpus_len())).await.unwrap();
        assert_eq!(len_b, 5);
        let len_a = state.with_session(&a, |q| Ok(q.corpus_len())).await.unwrap();
        assert_eq!(len_a, 10);
    }

    #[tokio::test]
    async fn unknown_session_and_lesson_are_errors() {
        let state = test_state(4);
        let err = state.with_session("nope", |_| Ok(())).await.unwrap_err();
        assert!(matches!(err, DrillError::UnknownSession(_)));
        let err = state.create_session(Some("L9".into())).await.unwrap_err();
        assert!(matches!(err, DrillError::Corpus(CorpusError::Empty { .. })));
    }

    #[tokio::test]
    async fn busy_session_does_not_block_others() {
        let state = test_state(6);
        let a = state.create_session(None).await.unwrap();
        let b = state.create_session(None).await.unwrap();

        let held = state.sessions.read().await.get(&a).cloned().unwrap();
        let _guard = held.lock().await;

        let len_b = tokio::time::timeout(
            Duration::from_secs(2),
            state.with_session(&b, |q| Ok(q.corpus_len())),
        )
        .await
        .expect("other session stayed reachable")
        .unwrap();
        assert_eq!(len_b, 6);

        // A session in use is never pruned, even with a zero TTL.
        let mut state = state;
        state.config.quiz.session_ttl_secs = 0;
        state.create_session(None).await.unwrap();
        assert!(state.sessions.read().await.contains_key(&a));
    }

    #[tokio::test]
    async fn idle_sessions_are_pruned_on_create() {
        let mut state = test_state(4);
        state.config.quiz.session_ttl_secs = 0;
        let old = state.create_session(None).await.unwrap();
        state.create_session(None).await.unwrap();
        assert!(state.with_session(&old, |_| Ok(())).await.is_err());
        assert_eq!(state.sessions.read().await.len(), 1);
    }
}
