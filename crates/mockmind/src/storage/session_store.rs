//! Session and report storage: in-memory cache backed by JSON files
//!
//! Layout under the configured data directory:
//! - `session-<id>.json`: full session aggregate
//! - `report-<id>.json`: full report aggregate
//!
//! Files are written whole (temp file + rename) and never deleted by the store.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::types::{
    timestamp_now, Evaluation, GeneratedQuestion, InterviewSetup, QaPair, Question, Report,
    ReportDraft, Session, StatsResponse,
};

/// Durable store for interview sessions and reports
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, Session>>,
    reports: DashMap<Uuid, Report>,
    config: SessionConfig,
}

impl SessionStore {
    /// Create a store rooted at the configured data directory
    pub fn new(config: SessionConfig) -> Self {
        tracing::info!(
            "Session store at {} (max age {}s)",
            config.data_dir.display(),
            config.max_session_age_secs
        );

        Self {
            sessions: Arc::new(DashMap::new()),
            reports: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Allocate a new active session. Held in memory only until the first flush.
    pub fn create_session(&self, setup: InterviewSetup) -> Session {
        let session = Session::new(setup);
        tracing::info!(
            "Created session {} ({} - {})",
            session.session_id,
            session.config.role,
            session.config.level
        );
        self.sessions.insert(session.session_id, session.clone());
        session
    }

    /// Memory lookup. Expired sessions are evicted and reported as expired.
    pub fn load_from_cache(&self, id: Uuid) -> Result<Option<Session>> {
        let Some(session) = self.sessions.get(&id).map(|s| s.clone()) else {
            return Ok(None);
        };

        if session.is_expired(timestamp_now(), self.config.max_session_age()) {
            self.sessions.remove(&id);
            tracing::info!("Evicted expired session {}", id);
            return Err(Error::SessionExpired(id.to_string()));
        }
        Ok(Some(session))
    }

    /// Disk lookup that re-populates the cache on success
    pub async fn load_from_disk_and_cache(&self, id: Uuid) -> Result<Session> {
        let session: Session = self
            .read_json(&self.session_path(id))
            .await?
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;

        if session.is_expired(timestamp_now(), self.config.max_session_age()) {
            return Err(Error::SessionExpired(id.to_string()));
        }

        self.sessions.insert(id, session.clone());
        if !session.is_active() {
            // Completed sessions are only ever evicted by their retention timer
            self.schedule_removal(id);
        }
        tracing::info!("Restored session from disk: {}", id);
        Ok(session)
    }

    /// Memory first, then disk
    pub async fn get_session(&self, id: Uuid) -> Result<Session> {
        match self.load_from_cache(id)? {
            Some(session) => Ok(session),
            None => self.load_from_disk_and_cache(id).await,
        }
    }

    /// Append a question to a cached session (memory only)
    pub async fn add_question(&self, id: Uuid, generated: GeneratedQuestion) -> Result<Question> {
        self.get_session(id).await?;
        let mut entry = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        Ok(entry.push_question(generated))
    }

    /// Append an evaluated answer to a cached session (memory only)
    pub async fn add_answer(
        &self,
        id: Uuid,
        question_id: Uuid,
        transcription: &str,
        evaluation: Evaluation,
    ) -> Result<crate::types::Answer> {
        self.get_session(id).await?;
        let mut entry = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        Ok(entry.push_answer(question_id, transcription, evaluation))
    }

    pub async fn get_uncovered_topics(&self, id: Uuid) -> Result<Vec<String>> {
        Ok(self.get_session(id).await?.uncovered_topics())
    }

    pub async fn get_qa_pairs(&self, id: Uuid) -> Result<Vec<QaPair>> {
        Ok(self.get_session(id).await?.qa_pairs())
    }

    /// Replace the cached copy of a session
    pub fn commit_session(&self, session: Session) {
        self.sessions.insert(session.session_id, session);
    }

    /// Complete a session and bind a report to it.
    ///
    /// Both aggregates are written to disk before either is published to the
    /// cache, so a persistence failure leaves no retrievable report.
    pub async fn end_session(&self, id: Uuid, draft: ReportDraft) -> Result<Report> {
        let mut session = self.get_session(id).await?;
        session.complete(timestamp_now());

        let report = Report::from_draft(id, draft);

        self.persist_session(&session).await?;
        self.persist_report(&report).await?;

        self.sessions.insert(id, session);
        self.reports.insert(report.report_id, report.clone());
        self.schedule_removal(id);

        tracing::info!("Session ended: {}, report: {}", id, report.report_id);
        Ok(report)
    }

    /// Drop a completed session from memory after the retention delay
    fn schedule_removal(&self, id: Uuid) {
        let sessions = Arc::clone(&self.sessions);
        let retention = self.config.completed_retention();

        tokio::spawn(async move {
            tokio::time::sleep(retention).await;
            if sessions.remove_if(&id, |_, s| !s.is_active()).is_some() {
                tracing::info!("Removed completed session from memory: {}", id);
            }
        });
    }

    /// Memory first, then disk (re-cached)
    pub async fn get_report(&self, id: Uuid) -> Result<Report> {
        if let Some(report) = self.reports.get(&id) {
            return Ok(report.clone());
        }

        let report: Report = self
            .read_json(&self.report_path(id))
            .await?
            .ok_or_else(|| Error::ReportNotFound(id.to_string()))?;

        self.reports.insert(id, report.clone());
        tracing::info!("Loaded report from disk: {}", id);
        Ok(report)
    }

    /// Memory first, then disk, without the age check or re-caching.
    /// Used to describe finished sessions that have left the cache.
    pub async fn get_session_from_disk(&self, id: Uuid) -> Result<Session> {
        if let Some(session) = self.sessions.get(&id) {
            return Ok(session.clone());
        }

        self.read_json(&self.session_path(id))
            .await?
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    pub async fn persist_session(&self, session: &Session) -> Result<()> {
        let path = self.session_path(session.session_id);
        self.write_json(&path, session).await?;
        tracing::info!("Persisted session to disk: {}", session.session_id);
        Ok(())
    }

    pub async fn persist_report(&self, report: &Report) -> Result<()> {
        let path = self.report_path(report.report_id);
        self.write_json(&path, report).await?;
        tracing::info!("Persisted report to disk: {}", report.report_id);
        Ok(())
    }

    /// Evict cached active sessions older than the maximum age.
    /// Completed sessions are left to their retention timer.
    pub fn cleanup_expired(&self) -> usize {
        let now = timestamp_now();
        let max_age = self.config.max_session_age();
        let before = self.sessions.len();

        self.sessions
            .retain(|_, s| !(s.is_active() && s.is_expired(now, max_age)));

        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            tracing::info!("Cleaned up {} expired sessions", removed);
        }
        removed
    }

    /// Start the periodic sweep. Stops once the store is dropped.
    pub fn spawn_cleanup(self: &Arc<Self>) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        let period = self.config.cleanup_interval();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                match store.upgrade() {
                    Some(store) => {
                        store.cleanup_expired();
                    }
                    None => break,
                }
            }
        })
    }

    pub fn stats(&self) -> StatsResponse {
        StatsResponse {
            active_sessions: self.sessions.len(),
            reports_stored: self.reports.len(),
        }
    }

    fn session_path(&self, id: Uuid) -> PathBuf {
        self.config.data_dir.join(format!("session-{}.json", id))
    }

    fn report_path(&self, id: Uuid) -> PathBuf {
        self.config.data_dir.join(format!("report-{}.json", id))
    }

    /// Read and parse a JSON file; `None` when it does not exist or is unreadable
    async fn read_json<T: serde::de::DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                return Ok(None);
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("Corrupt file {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    async fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let result = async {
            tokio::fs::create_dir_all(&self.config.data_dir).await?;
            let content = serde_json::to_string_pretty(value)?;
            let tmp = path.with_extension("json.tmp");
            tokio::fs::write(&tmp, content).await?;
            tokio::fs::rename(&tmp, path).await?;
            Ok::<_, Error>(())
        }
        .await;

        result.map_err(|e| {
            tracing::error!("Failed to persist {}: {}", path.display(), e);
            Error::persistence(format!("Failed to write {}: {}", path.display(), e))
        })
    }
}
