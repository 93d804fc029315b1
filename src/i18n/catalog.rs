//! Locale catalog loading and activation.
//!
//! DESIGN
//! ======
//! Each locale is split across several `.po` catalogs (global UI strings plus
//! one per feature). Activation loads them concurrently and merges them in
//! `CATALOGS` order, so later catalogs override earlier ones on key
//! collision.
//!
//! ERROR HANDLING
//! ==============
//! A catalog that cannot be read or parsed is logged and treated as empty.
//! The page still renders, with untranslated strings for that catalog.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::po::{self, PoError};
use super::{I18n, Messages, locale_or_default};

/// Catalog names, in merge order.
pub const CATALOGS: &[&str] = &["global", "auth", "todos"];

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: PoError,
    },
}

/// `<dir>/<name>-<locale>.po`
#[must_use]
pub fn catalog_path(dir: &Path, name: &str, locale: &str) -> PathBuf {
    dir.join(format!("{name}-{locale}.po"))
}

/// Read and parse one catalog file.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read, `Parse` if it is malformed.
pub async fn load_catalog(path: &Path) -> Result<Messages, CatalogError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogError::Io { path: path.to_path_buf(), source })?;
    po::parse_messages(&text).map_err(|source| CatalogError::Parse { path: path.to_path_buf(), source })
}

/// Merge message maps; later maps win on key collision.
#[must_use]
pub fn merge_catalogs(catalogs: impl IntoIterator<Item = Messages>) -> Messages {
    catalogs.into_iter().fold(Messages::new(), |mut acc, messages| {
        acc.extend(messages);
        acc
    })
}

/// Load every catalog for `locale` and return the activated message set.
/// Unsupported locales activate the default locale instead.
pub async fn dynamic_activate(dir: &Path, locale: &str) -> I18n {
    activate(dir, locale).await.0
}

/// Like `dynamic_activate`, also reporting whether every catalog loaded.
async fn activate(dir: &Path, locale: &str) -> (I18n, bool) {
    let locale = locale_or_default(locale);

    let loads = CATALOGS.iter().map(|name| {
        let path = catalog_path(dir, name, locale);
        async move {
            match load_catalog(&path).await {
                Ok(messages) => Some(messages),
                Err(e) => {
                    warn!(%locale, error = %e, "catalog load failed; using empty messages");
                    None
                }
            }
        }
    });

    let results = join_all(loads).await;
    let complete = results.iter().all(Option::is_some);
    let messages = merge_catalogs(results.into_iter().flatten());
    debug!(%locale, count = messages.len(), complete, "locale activated");
    (I18n::new(locale, messages), complete)
}

/// Per-locale cache of activated catalogs, filled lazily on first request.
#[derive(Clone)]
pub struct CatalogCache {
    dir: PathBuf,
    loaded: Arc<RwLock<HashMap<&'static str, Arc<I18n>>>>,
}

impl CatalogCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), loaded: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Return the activated catalogs for `locale`, loading them on first use.
    /// Only activations where every catalog loaded are cached.
    pub async fn get(&self, locale: &str) -> Arc<I18n> {
        let locale = locale_or_default(locale);
        if let Some(i18n) = self.loaded.read().await.get(locale) {
            return Arc::clone(i18n);
        }

        let (activated, complete) = activate(&self.dir, locale).await;
        let activated = Arc::new(activated);
        // Degraded activations are retried on the next request.
        if !complete {
            return activated;
        }
        let mut loaded = self.loaded.write().await;
        Arc::clone(loaded.entry(locale).or_insert(activated))
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
