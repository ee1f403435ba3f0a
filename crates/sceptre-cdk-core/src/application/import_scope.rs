//! Process-wide module search list.
//!
//! The Python interpreter that runs a single-file stack sees the search
//! list held here as its `PYTHONPATH`. Loading a stack pushes that stack's
//! search roots for the duration of an [`ImportPathScope`]; dropping the
//! scope puts the previous list back.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::ImportSearchPath;
use crate::error::HandlerResult;

static GLOBAL: OnceLock<Arc<ImportPathRegistry>> = OnceLock::new();

/// The search list shared by every load in this process.
///
/// # Concurrency
///
/// Scopes nest like a stack. Two loads that overlap in time on different
/// threads would restore each other's lists in the wrong order, so callers
/// must serialize loads that share a registry.
#[derive(Debug, Default)]
pub struct ImportPathRegistry {
    entries: Mutex<Vec<PathBuf>>,
}

impl ImportPathRegistry {
    pub fn new(initial: Vec<PathBuf>) -> Self {
        Self {
            entries: Mutex::new(initial),
        }
    }

    /// Seeded from the inherited `PYTHONPATH`.
    pub fn from_env() -> Self {
        let initial = std::env::var_os("PYTHONPATH")
            .map(|raw| {
                std::env::split_paths(&raw)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self::new(initial)
    }

    /// The registry used when no other one is injected.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::from_env())))
    }

    /// Current search list.
    pub fn snapshot(&self) -> HandlerResult<Vec<PathBuf>> {
        Ok(self.lock()?.clone())
    }

    /// Put `search` in front of the current list until the returned scope
    /// is dropped. Entries already present move to the front.
    pub fn enter(&self, search: &ImportSearchPath) -> HandlerResult<ImportPathScope<'_>> {
        let mut entries = self.lock()?;
        let saved = entries.clone();

        let mut updated: Vec<PathBuf> = search.entries().to_vec();
        updated.extend(
            saved
                .iter()
                .filter(|p| !search.entries().contains(p))
                .cloned(),
        );
        debug!(pushed = search.len(), total = updated.len(), "Entered import scope");
        *entries = updated;

        Ok(ImportPathScope {
            registry: self,
            saved: Some(saved),
        })
    }

    fn lock(&self) -> HandlerResult<MutexGuard<'_, Vec<PathBuf>>> {
        self.entries
            .lock()
            .map_err(|_| ApplicationError::SearchPathLockError.into())
    }

    fn restore(&self, saved: Vec<PathBuf>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        *entries = saved;
    }
}

/// Guard that restores the registry's previous list when dropped, on
/// success and failure paths alike.
#[derive(Debug)]
pub struct ImportPathScope<'a> {
    registry: &'a ImportPathRegistry,
    saved: Option<Vec<PathBuf>>,
}

impl ImportPathScope<'_> {
    /// The list in effect while this scope is alive.
    pub fn effective(&self) -> HandlerResult<Vec<PathBuf>> {
        self.registry.snapshot()
    }
}

impl Drop for ImportPathScope<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.registry.restore(saved);
            debug!("Restored import search list");
        }
    }
}
