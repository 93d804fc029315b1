//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the database pool, the parsed config, the docs search index
//! (built once at startup), and the lazily filled locale catalog cache.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::docs::DocsIndex;
use crate::i18n::catalog::CatalogCache;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub catalogs: CatalogCache,
    pub docs: Arc<DocsIndex>,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, config: AppConfig, docs: DocsIndex) -> Self {
        let catalogs = CatalogCache::new(config.locales_dir.clone());
        Self { pool, config: Arc::new(config), catalogs, docs: Arc::new(docs) }
    }

    /// Session lifetime as a `time` duration.
    #[must_use]
    pub fn session_ttl(&self) -> time::Duration {
        time::Duration::days(self.config.session_ttl_days)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn session_ttl_follows_config() {
        let mut config = test_helpers::test_config();
        config.session_ttl_days = 3;
        let state = test_helpers::test_app_state_with(config, DocsIndex::default());
        assert_eq!(state.session_ttl(), time::Duration::days(3));
    }

    #[tokio::test]
    async fn clones_share_the_docs_index() {
        let state = test_helpers::test_app_state();
        let clone = state.clone();
        assert!(Arc::ptr_eq(&state.docs, &clone.docs));
    }
}
