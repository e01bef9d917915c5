//! In-memory registry of review sessions.
//!
//! Every session owns its own `MoveHistory`; nothing is shared between
//! sessions. The registry lock is only held for one synchronous tracker call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chess_core::history::{MoveHistory, NumberedMove};
use chess_core::pgn::GameTags;
use chess_core::{summarize, AnalysisReport, BoardSnapshot, CoreError};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::AppError;

struct Session {
    history: MoveHistory,
    /// chess.com game the session was opened from, if any.
    source_url: Option<String>,
    last_used: DateTime<Utc>,
}

pub struct SessionStore {
    sessions: Mutex<HashMap<u64, Session>>,
    next_id: AtomicU64,
    ttl: Duration,
    max_sessions: usize,
}

/// Everything the board viewer needs to draw a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: u64,
    pub source_url: Option<String>,
    pub tags: GameTags,
    /// Starting position when the game did not begin from the standard one.
    pub initial_fen: Option<String>,
    pub moves: Vec<NumberedMove>,
    pub cursor: isize,
    pub can_step_back: bool,
    pub can_step_forward: bool,
    pub position: BoardSnapshot,
    pub analysis: AnalysisReport,
}

fn view_of(id: u64, session: &Session) -> Result<SessionView, CoreError> {
    let history = &session.history;
    let position = history.snapshot()?;
    let analysis = summarize(&position);
    Ok(SessionView {
        id,
        source_url: session.source_url.clone(),
        tags: history.metadata().clone(),
        initial_fen: history.initial_fen().map(str::to_string),
        moves: history.numbered_moves(),
        cursor: history.cursor(),
        can_step_back: history.cursor() > -1,
        can_step_forward: history.cursor() < history.len() as isize - 1,
        position,
        analysis,
    })
}

impl SessionStore {
    pub fn new(ttl_secs: i64, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            ttl: Duration::seconds(ttl_secs),
            max_sessions: max_sessions.max(1),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<u64, Session>>, AppError> {
        self.sessions
            .lock()
            .map_err(|_| AppError::Internal("session registry poisoned".into()))
    }

    fn evict(&self, sessions: &mut HashMap<u64, Session>, now: DateTime<Utc>) {
        let before = sessions.len();
        sessions.retain(|_, s| now - s.last_used < self.ttl);
        if sessions.len() < before {
            tracing::info!("Evicted {} idle review sessions", before - sessions.len());
        }

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(id, s)| (s.last_used, **id))
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                }
                None => break,
            }
        }
    }

    /// Register a new session and return its first view.
    pub fn create(&self, history: MoveHistory, source_url: Option<String>) -> Result<SessionView, AppError> {
        let now = Utc::now();
        let mut sessions = self.lock()?;
        self.evict(&mut sessions, now);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let session = Session {
            history,
            source_url,
            last_used: now,
        };
        let view = view_of(id, &session)?;
        sessions.insert(id, session);
        tracing::info!("Opened review session {} ({} moves)", id, view.moves.len());
        Ok(view)
    }

    fn live<'a>(&self, sessions: &'a mut HashMap<u64, Session>, id: u64) -> Result<&'a mut Session, AppError> {
        let now = Utc::now();
        let session = sessions
            .get_mut(&id)
            .filter(|s| now - s.last_used < self.ttl)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        session.last_used = now;
        Ok(session)
    }

    /// Run `f` against one session's history and return the refreshed view.
    pub fn update<F>(&self, id: u64, f: F) -> Result<SessionView, AppError>
    where
        F: FnOnce(&mut MoveHistory) -> Result<(), CoreError>,
    {
        let mut sessions = self.lock()?;
        let session = self.live(&mut sessions, id)?;
        f(&mut session.history)?;
        Ok(view_of(id, session)?)
    }

    pub fn view(&self, id: u64) -> Result<SessionView, AppError> {
        self.update(id, |_| Ok(()))
    }

    /// Read from one session's history without changing it.
    pub fn read<T, F>(&self, id: u64, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&MoveHistory) -> Result<T, CoreError>,
    {
        let mut sessions = self.lock()?;
        let session = self.live(&mut sessions, id)?;
        Ok(f(&session.history)?)
    }

    pub fn remove(&self, id: u64) -> Result<(), AppError> {
        let mut sessions = self.lock()?;
        sessions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
