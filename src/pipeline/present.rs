//! Result presenter: persist and display the outcome of a poll.

use crate::display::DisplaySurface;
use crate::error::AutoPdfError;
use crate::output::{Metadata, PersistedResult};
use crate::store::ResultStore;
use std::sync::Arc;
use tracing::info;

/// What the presenter did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentOutcome {
    /// Metadata stored and the display surface opened.
    Displayed,
    /// No metadata yet; nothing stored, nothing opened. Carries the inline message.
    Pending { message: String },
}

/// Inline status for an upload whose metadata is not ready yet.
pub fn pending_message(key: &str) -> String {
    format!("Uploaded as {key}. Metadata still processing—check back later.")
}

/// Stores present metadata and opens the display surface.
#[derive(Clone)]
pub struct ResultPresenter {
    store: Arc<dyn ResultStore>,
    surface: Arc<dyn DisplaySurface>,
}

impl ResultPresenter {
    pub fn new(store: Arc<dyn ResultStore>, surface: Arc<dyn DisplaySurface>) -> Self {
        Self { store, surface }
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Open the display surface on whatever the store currently holds.
    pub fn reopen(&self) -> Result<(), AutoPdfError> {
        self.surface.open(self.store.as_ref())
    }

    /// Present the poll result for `key`.
    ///
    /// With `None` the store is left untouched so a previous result stays
    /// visible; with `Some` the store is overwritten before the surface opens,
    /// because the surface reads from the store, not from this call.
    pub fn present(
        &self,
        attempt_id: u64,
        key: &str,
        metadata: Option<Metadata>,
    ) -> Result<PresentOutcome, AutoPdfError> {
        let Some(metadata) = metadata else {
            info!("No metadata for '{}' yet; leaving store untouched", key);
            return Ok(PresentOutcome::Pending {
                message: pending_message(key),
            });
        };

        self.store.save(&PersistedResult {
            last_metadata: Some(metadata),
            last_key: key.to_string(),
            attempt_id,
        })?;
        self.surface.open(self.store.as_ref())?;
        Ok(PresentOutcome::Displayed)
    }

    /// [`present`](Self::present) on tokio's blocking pool. Stores and
    /// surfaces do synchronous file I/O.
    pub async fn present_blocking(
        &self,
        attempt_id: u64,
        key: &str,
        metadata: Option<Metadata>,
    ) -> Result<PresentOutcome, AutoPdfError> {
        let presenter = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || presenter.present(attempt_id, &key, metadata))
            .await
            .map_err(|e| AutoPdfError::Internal(format!("presenter task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSurface {
        opens: AtomicUsize,
    }

    impl DisplaySurface for CountingSurface {
        fn open(&self, _store: &dyn ResultStore) -> Result<(), AutoPdfError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn absent_metadata_leaves_store_untouched() {
        let store = Arc::new(MemoryStore::new());
        let surface = Arc::new(CountingSurface::default());
        let presenter = ResultPresenter::new(store.clone(), surface.clone());

        let outcome = presenter.present(1, "doc.pdf", None).unwrap();
        assert_eq!(
            outcome,
            PresentOutcome::Pending {
                message: "Uploaded as doc.pdf. Metadata still processing—check back later."
                    .into()
            }
        );
        assert_eq!(store.write_count(), 0);
        assert_eq!(surface.opens.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn present_metadata_stores_then_opens() {
        let store = Arc::new(MemoryStore::new());
        let surface = Arc::new(CountingSurface::default());
        let presenter = ResultPresenter::new(store.clone(), surface.clone());

        let m = Metadata {
            title: Some("X".into()),
            ..Default::default()
        };
        assert_eq!(
            presenter.present(9, "doc.pdf", Some(m.clone())).unwrap(),
            PresentOutcome::Displayed
        );

        let stored = store.load().unwrap().unwrap();
        assert_eq!(stored.last_metadata, Some(m));
        assert_eq!(stored.last_key, "doc.pdf");
        assert_eq!(stored.attempt_id, 9);
        assert_eq!(surface.opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn present_blocking_writes_files_off_the_runtime() {
        use crate::display::HtmlFileSurface;
        use crate::store::JsonFileStore;

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path().join("nested/last.json")));
        let surface = Arc::new(HtmlFileSurface::new(dir.path().join("page.html")));
        let presenter = ResultPresenter::new(store.clone(), surface);

        let m = Metadata {
            author: Some("A".into()),
            ..Default::default()
        };
        let outcome = presenter
            .present_blocking(2, "doc.pdf", Some(m))
            .await
            .unwrap();
        assert_eq!(outcome, PresentOutcome::Displayed);
        assert_eq!(store.load().unwrap().unwrap().attempt_id, 2);
        assert!(dir.path().join("page.html").exists());

        let pending = presenter.present_blocking(3, "doc.pdf", None).await.unwrap();
        assert!(matches!(pending, PresentOutcome::Pending { .. }));
        assert_eq!(store.load().unwrap().unwrap().attempt_id, 2);
    }
}
