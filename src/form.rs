//! Upload form: the selection gate in front of the workflow.
//!
//! Mirrors a file picker with an upload button. The button is enabled only
//! while a file within the size limit is selected, so an oversize file never
//! reaches the network.

use crate::config::UploadConfig;
use crate::error::AutoPdfError;
use crate::pipeline::input::FileHandle;
use crate::progress::Observer;
use tracing::{debug, warn};

/// Holds the current selection and whether uploading is allowed.
pub struct UploadForm {
    max_file_bytes: u64,
    selected: Option<FileHandle>,
    observer: Option<Observer>,
}

impl UploadForm {
    pub fn new(max_file_bytes: u64) -> Self {
        Self {
            max_file_bytes,
            selected: None,
            observer: None,
        }
    }

    /// Form using the config's size limit and observer.
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            max_file_bytes: config.max_file_bytes,
            selected: None,
            observer: config.observer.clone(),
        }
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Replace the selection with `file`.
    ///
    /// An oversize file clears the selection (disabling upload) and is
    /// returned as [`AutoPdfError::OversizeFile`]. The enabled event fires
    /// only on the disabled → enabled edge, so reselecting files keeps the
    /// action enabled without repeating the event.
    pub fn select(&mut self, file: FileHandle) -> Result<(), AutoPdfError> {
        if let Err(e) = file.check_size(self.max_file_bytes) {
            warn!("Rejected '{}': {}", file.name(), e);
            self.clear();
            return Err(e);
        }

        let was_enabled = self.upload_enabled();
        debug!("Selected '{}' ({} bytes)", file.name(), file.size());
        self.selected = Some(file);
        if !was_enabled {
            if let Some(ref o) = self.observer {
                o.on_upload_enabled();
            }
        }
        Ok(())
    }

    /// Drop the selection.
    pub fn clear(&mut self) {
        if self.selected.take().is_some() {
            if let Some(ref o) = self.observer {
                o.on_upload_disabled();
            }
        }
    }

    pub fn upload_enabled(&self) -> bool {
        self.selected.is_some()
    }

    /// The file the upload action would send, if enabled.
    pub fn selected(&self) -> Option<&FileHandle> {
        self.selected.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::WorkflowObserver;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct EdgeCounter {
        enabled: AtomicUsize,
        disabled: AtomicUsize,
    }

    impl WorkflowObserver for EdgeCounter {
        fn on_upload_enabled(&self) {
            self.enabled.fetch_add(1, Ordering::SeqCst);
        }
        fn on_upload_disabled(&self) {
            self.disabled.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn pdf(len: usize) -> FileHandle {
        FileHandle::from_bytes("doc.pdf", vec![b'%'; len])
    }

    #[test]
    fn starts_disabled() {
        let form = UploadForm::new(10);
        assert!(!form.upload_enabled());
        assert!(form.selected().is_none());
    }

    #[test]
    fn oversize_file_keeps_upload_disabled() {
        let counter = Arc::new(EdgeCounter::default());
        let mut form = UploadForm::new(10).with_observer(counter.clone());

        let err = form.select(pdf(11)).unwrap_err();
        assert!(matches!(err, AutoPdfError::OversizeFile { size: 11, limit: 10 }));
        assert!(!form.upload_enabled());
        assert_eq!(counter.enabled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn repeated_valid_selection_enables_once() {
        let counter = Arc::new(EdgeCounter::default());
        let mut form = UploadForm::new(10).with_observer(counter.clone());

        form.select(pdf(10)).unwrap();
        form.select(pdf(10)).unwrap();
        form.select(pdf(3)).unwrap();

        assert!(form.upload_enabled());
        assert_eq!(counter.enabled.load(Ordering::SeqCst), 1);
        assert_eq!(form.selected().unwrap().size(), 3);
    }

    #[test]
    fn oversize_after_valid_disables() {
        let counter = Arc::new(EdgeCounter::default());
        let mut form = UploadForm::new(10).with_observer(counter.clone());

        form.select(pdf(5)).unwrap();
        assert!(form.select(pdf(50)).is_err());
        assert!(!form.upload_enabled());
        assert_eq!(counter.disabled.load(Ordering::SeqCst), 1);

        form.select(pdf(5)).unwrap();
        assert_eq!(counter.enabled.load(Ordering::SeqCst), 2);
    }
}
