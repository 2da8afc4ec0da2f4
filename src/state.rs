//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the parsed config, the identity provider handle, and a map of
//! live page views. Each page view owns one in-memory board; nothing here
//! outlives the process.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::services::board::Board;
use crate::services::identity::IdentityProvider;

// =============================================================================
// BOARD VIEW
// =============================================================================

/// One dashboard page view and the board it owns.
pub struct BoardView {
    pub board: Board,
    /// Last time the view was rendered or mutated. Drives idle eviction.
    pub last_seen: Instant,
}

impl BoardView {
    #[must_use]
    pub fn new() -> Self {
        Self { board: Board::seeded(), last_seen: Instant::now() }
    }
}

impl Default for BoardView {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub identity: Arc<dyn IdentityProvider>,
    pub views: Arc<RwLock<HashMap<Uuid, BoardView>>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { config: Arc::new(config), identity, views: Arc::new(RwLock::new(HashMap::new())) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
