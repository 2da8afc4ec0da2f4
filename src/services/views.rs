//! Page view registry — one seeded board per dashboard render.
//!
//! DESIGN
//! ======
//! Every `GET /dashboard` opens a new view with a fresh seeded board, so a
//! reload starts over. Views are mutated under the registry write lock,
//! which serializes appends to the same board. A background task evicts
//! views nobody has touched for `view_idle`, and the registry never holds
//! more than `max_views`.

use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::services::board::{Board, BoardError, Task};
use crate::state::{AppState, BoardView};

const MIN_SWEEP: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("view not found: {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Board(#[from] BoardError),
}

impl ErrorCode for ViewError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_VIEW_NOT_FOUND",
            Self::Board(e) => e.error_code(),
        }
    }
}

/// Open a new page view and return its id with the initial board.
///
/// When the registry already holds `max_views`, the least recently seen view
/// is dropped first.
pub async fn open_view(state: &AppState) -> (Uuid, Board) {
    let id = Uuid::new_v4();
    let view = BoardView::new();
    let board = view.board.clone();

    let mut views = state.views.write().await;
    while views.len() >= state.config.max_views.max(1) {
        let Some(stalest) = views
            .iter()
            .min_by_key(|(_, view)| view.last_seen)
            .map(|(id, _)| *id)
        else {
            break;
        };
        views.remove(&stalest);
        debug!(view_id = %stalest, "page view limit reached, dropped stalest view");
    }
    views.insert(id, view);
    debug!(view_id = %id, "page view opened");
    (id, board)
}

/// Current board of a view.
///
/// # Errors
///
/// Returns `NotFound` if the view was never opened or has been evicted.
pub async fn snapshot(state: &AppState, view_id: Uuid) -> Result<Board, ViewError> {
    let mut views = state.views.write().await;
    let view = views.get_mut(&view_id).ok_or(ViewError::NotFound(view_id))?;
    view.last_seen = Instant::now();
    Ok(view.board.clone())
}

/// Append a task to a column of a view's board.
///
/// # Errors
///
/// Returns `NotFound` for an unknown view, or the board's own error.
pub async fn add_task(
    state: &AppState,
    view_id: Uuid,
    column_id: &str,
    title: &str,
    description: Option<&str>,
) -> Result<Task, ViewError> {
    let mut views = state.views.write().await;
    let view = views.get_mut(&view_id).ok_or(ViewError::NotFound(view_id))?;
    view.last_seen = Instant::now();
    let task = view.board.add_task(column_id, title, description)?;
    debug!(view_id = %view_id, column_id, task_id = %task.id, "task added");
    Ok(task)
}

/// Drop views idle since before `now - view_idle`. Returns the count removed.
pub async fn evict_idle(state: &AppState, now: Instant) -> usize {
    let idle = state.config.view_idle;
    let mut views = state.views.write().await;
    let before = views.len();
    views.retain(|_, view| now.saturating_duration_since(view.last_seen) < idle);
    before - views.len()
}

/// Spawn the background eviction task. Returns a handle for shutdown.
pub fn spawn_sweeper_task(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        // `interval` panics on a zero period.
        let mut interval = tokio::time::interval(state.config.view_sweep.max(MIN_SWEEP));
        loop {
            interval.tick().await;
            let evicted = evict_idle(&state, Instant::now()).await;
            if evicted > 0 {
                info!(evicted, "idle page views evicted");
            }
        }
    })
}

#[cfg(test)]
#[path = "views_test.rs"]
mod tests;
