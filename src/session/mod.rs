//! Per-video conversation sessions and the process-wide registry.
//!
//! A session owns the semantic index and dialogue history for one video.
//! The registry is the only shared mutable structure in the pipeline: it
//! deduplicates concurrent first-access builds per video and bounds memory
//! with LRU eviction.

use crate::error::Result;
use crate::index::SemanticIndex;
use crate::rag::DialogueHistory;
use crate::video_id::VideoId;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// An active conversation scoped to one video.
///
/// The index is immutable after construction and safe to share across
/// concurrent readers. The history mutex also serializes `answer` calls
/// against this session: hold it across retrieve/generate/append.
pub struct Session {
    /// Unique session ID, used in logs.
    pub session_id: Uuid,
    /// Video this session is bound to.
    pub video_id: VideoId,
    /// When this session was built.
    pub created_at: DateTime<Utc>,
    index: SemanticIndex,
    history: Mutex<DialogueHistory>,
}

impl Session {
    fn new(video_id: VideoId, index: SemanticIndex) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            video_id,
            created_at: Utc::now(),
            index,
            history: Mutex::new(DialogueHistory::new()),
        }
    }

    pub fn index(&self) -> &SemanticIndex {
        &self.index
    }

    /// The per-session lock guarding the dialogue history.
    pub fn history(&self) -> &Mutex<DialogueHistory> {
        &self.history
    }

    /// Number of completed dialogue turns.
    pub async fn turn_count(&self) -> usize {
        self.history.lock().await.len()
    }
}

/// Summary of an active session, for listing endpoints.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionInfo {
    pub video_id: VideoId,
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub turns: usize,
    pub indexed_chunks: usize,
}

/// Holds the session once built. The mutex serializes builders per video:
/// whoever holds it with the option still empty is the builder, everyone
/// else waits and shares the result.
type SessionCell = Arc<Mutex<Option<Arc<Session>>>>;

struct Slot {
    cell: SessionCell,
    last_used: Instant,
}

/// Bounded mapping from video ID to its active session.
pub struct SessionRegistry {
    slots: Mutex<HashMap<VideoId, Slot>>,
    capacity: usize,
}

impl SessionRegistry {
    /// Create a registry that holds at most `capacity` sessions.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Return the session for `id`, building it with `build` on first access.
    ///
    /// Concurrent calls for the same never-seen ID result in exactly one
    /// build; the other callers wait for and share the same session. The
    /// build runs outside the registry lock so unrelated sessions are never
    /// blocked. Nothing is left registered if the build fails, and a session
    /// that does complete is always registered: a failed builder unregisters
    /// its slot while still holding the slot lock, so waiters re-enter
    /// through the map instead of completing a build into an orphaned slot.
    pub async fn get_or_create<F, Fut>(&self, id: &VideoId, build: F) -> Result<Arc<Session>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SemanticIndex>>,
    {
        loop {
            let cell = self.acquire_slot(id).await;
            let mut guard = cell.lock().await;

            if let Some(session) = guard.as_ref() {
                return Ok(session.clone());
            }

            // A failed builder may have unregistered this slot between the
            // map lookup and acquiring its lock. Start over from the map so
            // the build lands in a registered slot.
            if !self.is_registered(id, &cell).await {
                continue;
            }

            info!("Building session for video {}", id);
            match build().await {
                Ok(index) => {
                    let session = Arc::new(Session::new(id.clone(), index));
                    debug!(
                        "Session {} ready with {} indexed chunks",
                        session.session_id,
                        session.index.len()
                    );
                    *guard = Some(session.clone());
                    return Ok(session);
                }
                Err(e) => {
                    // Unregister before releasing the slot lock; waiters
                    // queued on this slot will see it gone and retry.
                    let mut slots = self.slots.lock().await;
                    if let Some(slot) = slots.get(id) {
                        if Arc::ptr_eq(&slot.cell, &cell) {
                            slots.remove(id);
                        }
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Get or insert the slot for `id` under the map lock, touching its
    /// LRU timestamp.
    async fn acquire_slot(&self, id: &VideoId) -> SessionCell {
        let mut slots = self.slots.lock().await;
        match slots.get_mut(id) {
            Some(slot) => {
                slot.last_used = Instant::now();
                slot.cell.clone()
            }
            None => {
                if slots.len() >= self.capacity {
                    Self::evict_lru(&mut slots);
                }
                let cell: SessionCell = Arc::new(Mutex::new(None));
                slots.insert(
                    id.clone(),
                    Slot {
                        cell: cell.clone(),
                        last_used: Instant::now(),
                    },
                );
                cell
            }
        }
    }

    /// Whether `cell` is still the registered slot for `id`.
    async fn is_registered(&self, id: &VideoId, cell: &SessionCell) -> bool {
        let slots = self.slots.lock().await;
        slots
            .get(id)
            .map_or(false, |slot| Arc::ptr_eq(&slot.cell, cell))
    }

    /// Look up an existing session without building. Waits for an in-flight
    /// build on this video; returns None if there is no slot or the build
    /// failed.
    pub async fn get(&self, id: &VideoId) -> Option<Arc<Session>> {
        let cell = {
            let mut slots = self.slots.lock().await;
            let slot = slots.get_mut(id)?;
            slot.last_used = Instant::now();
            slot.cell.clone()
        };
        let guard = cell.lock().await;
        guard.clone()
    }

    /// Drop the session for `id`. Returns true if one was registered.
    pub async fn evict(&self, id: &VideoId) -> bool {
        let removed = self.slots.lock().await.remove(id).is_some();
        if removed {
            info!("Evicted session for video {}", id);
        }
        removed
    }

    /// Number of registered sessions (including in-flight builds).
    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.lock().await.is_empty()
    }

    /// Snapshot of all active sessions. Slots whose build is still in
    /// flight are skipped.
    pub async fn list(&self) -> Vec<SessionInfo> {
        let cells: Vec<SessionCell> = {
            let slots = self.slots.lock().await;
            slots.values().map(|slot| slot.cell.clone()).collect()
        };

        let mut sessions = Vec::new();
        for cell in cells {
            if let Ok(guard) = cell.try_lock() {
                if let Some(session) = guard.as_ref() {
                    sessions.push(session.clone());
                }
            }
        }

        let mut infos = Vec::with_capacity(sessions.len());
        for session in sessions {
            infos.push(SessionInfo {
                video_id: session.video_id.clone(),
                session_id: session.session_id,
                created_at: session.created_at,
                turns: session.turn_count().await,
                indexed_chunks: session.index.len(),
            });
        }
        infos.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        infos
    }

    /// Remove the least-recently-used completed session. In-flight builds
    /// (slot lock held with the option still empty) are never evicted.
    fn evict_lru(slots: &mut HashMap<VideoId, Slot>) {
        let victim = slots
            .iter()
            .filter(|(_, slot)| {
                slot.cell
                    .try_lock()
                    .map(|guard| guard.is_some())
                    .unwrap_or(false)
            })
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(id, _)| id.clone());

        if let Some(id) = victim {
            info!("Capacity reached, evicting LRU session {}", id);
            slots.remove(&id);
        }
    }
}
