//! Display surfaces: render the stored result for the user.
//!
//! A surface reads the [`ResultStore`] when it is opened, never the
//! in-flight attempt, so reopening it later shows the same record.
//!
//! Missing fields render as `—`. Empty strings count as missing. The page
//! count follows the same rule; older front ends printed a missing page count
//! verbatim, which showed up as `undefined`.

use crate::error::AutoPdfError;
use crate::output::PersistedResult;
use crate::store::ResultStore;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Placeholder for a missing field.
pub const PLACEHOLDER: &str = "—";

/// Shown when the store holds no metadata.
pub const NO_METADATA: &str = "No metadata available yet.";

/// Somewhere the latest stored result can be shown.
pub trait DisplaySurface: Send + Sync {
    /// Read the store and show what it holds.
    fn open(&self, store: &dyn ResultStore) -> Result<(), AutoPdfError>;
}

/// One rendered row: label and display value.
pub fn display_fields(record: &PersistedResult) -> Option<Vec<(&'static str, String)>> {
    let m = record.last_metadata.as_ref()?;
    Some(vec![
        ("Uploaded Key", record.last_key.clone()),
        ("Uploaded At", or_placeholder(m.uploaded.as_deref())),
        ("Title", or_placeholder(m.title.as_deref())),
        ("Author", or_placeholder(m.author.as_deref())),
        (
            "Pages",
            m.pages
                .map(|p| p.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        ),
        ("Preview", or_placeholder(m.preview.as_deref())),
    ])
}

fn or_placeholder(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Plain-text rendering.
pub fn render_text(record: Option<&PersistedResult>) -> String {
    let Some(fields) = record.and_then(display_fields) else {
        return format!("{NO_METADATA}\n");
    };

    let mut out = String::new();
    for (label, value) in fields {
        if label == "Preview" {
            out.push_str(&format!("{label}:\n{value}\n"));
        } else {
            out.push_str(&format!("{:<14}{}\n", format!("{label}:"), value));
        }
    }
    out
}

/// Standalone HTML page.
pub fn render_html(record: Option<&PersistedResult>) -> String {
    let body = match record.and_then(display_fields) {
        None => format!("  <p>{}</p>\n", escape_html(NO_METADATA)),
        Some(fields) => fields
            .into_iter()
            .map(|(label, value)| match label {
                "Uploaded Key" => format!(
                    "  <p><strong>{label}:</strong> <code>{}</code></p>\n",
                    escape_html(&value)
                ),
                "Preview" => format!(
                    "  <p><strong>{label}:</strong><br>{}</p>\n",
                    escape_html(&value)
                ),
                _ => format!("  <p><strong>{label}:</strong> {}</p>\n", escape_html(&value)),
            })
            .collect(),
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n  \
         <title>PDF Metadata</title>\n</head>\n<body>\n<div id=\"metadata\">\n{body}</div>\n\
         </body>\n</html>\n"
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Writes the text rendering to a writer (stdout in the CLI).
pub struct ConsoleSurface<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> ConsoleSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the writer (tests inspect what was rendered).
    pub fn into_inner(self) -> Result<W, AutoPdfError> {
        self.out
            .into_inner()
            .map_err(|_| AutoPdfError::Internal("console surface lock poisoned".into()))
    }
}

impl ConsoleSurface<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> DisplaySurface for ConsoleSurface<W> {
    fn open(&self, store: &dyn ResultStore) -> Result<(), AutoPdfError> {
        let record = store.load()?;
        let text = render_text(record.as_ref());
        let mut out = self
            .out
            .lock()
            .map_err(|_| AutoPdfError::Internal("console surface lock poisoned".into()))?;
        out.write_all(text.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| AutoPdfError::DisplayFailed(e.to_string()))
    }
}

/// Writes a standalone HTML page, replacing it on every open.
#[derive(Debug, Clone)]
pub struct HtmlFileSurface {
    path: PathBuf,
}

impl HtmlFileSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DisplaySurface for HtmlFileSurface {
    fn open(&self, store: &dyn ResultStore) -> Result<(), AutoPdfError> {
        let record = store.load()?;
        std::fs::write(&self.path, render_html(record.as_ref())).map_err(|e| {
            AutoPdfError::DisplayFailed(format!("writing '{}': {e}", self.path.display()))
        })?;
        info!("Wrote metadata page to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Metadata;
    use crate::store::MemoryStore;

    fn full() -> PersistedResult {
        PersistedResult {
            last_metadata: Some(Metadata {
                uploaded: Some("2024-05-01T10:00:00Z".into()),
                title: Some("Attention".into()),
                author: Some("Vaswani".into()),
                pages: Some(15),
                preview: Some("The dominant sequence transduction models".into()),
            }),
            last_key: "attention.pdf".into(),
            attempt_id: 1,
        }
    }

    #[test]
    fn text_renders_every_present_field() {
        let text = render_text(Some(&full()));
        for expected in [
            "attention.pdf",
            "2024-05-01T10:00:00Z",
            "Attention",
            "Vaswani",
            "15",
            "The dominant sequence transduction models",
        ] {
            assert!(text.contains(expected), "missing {expected:?} in:\n{text}");
        }
        assert!(!text.contains(PLACEHOLDER));
    }

    #[test]
    fn missing_and_empty_fields_use_placeholder() {
        let record = PersistedResult {
            last_metadata: Some(Metadata {
                title: Some("X".into()),
                author: Some(String::new()),
                ..Default::default()
            }),
            last_key: "x.pdf".into(),
            attempt_id: 2,
        };
        let fields = display_fields(&record).unwrap();
        let get = |label: &str| {
            fields
                .iter()
                .find(|(l, _)| *l == label)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("Title"), "X");
        assert_eq!(get("Uploaded At"), PLACEHOLDER);
        assert_eq!(get("Author"), PLACEHOLDER);
        assert_eq!(get("Preview"), PLACEHOLDER);
        assert_eq!(get("Pages"), PLACEHOLDER);
    }

    #[test]
    fn empty_store_renders_no_metadata() {
        assert_eq!(render_text(None), "No metadata available yet.\n");
        let record = PersistedResult {
            last_metadata: None,
            last_key: "k".into(),
            attempt_id: 0,
        };
        assert!(render_html(Some(&record)).contains(NO_METADATA));
    }

    #[test]
    fn html_escapes_backend_text() {
        let mut r = full();
        if let Some(m) = r.last_metadata.as_mut() {
            m.title = Some("<script>alert(1)</script>".into());
        }
        let html = render_html(Some(&r));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<code>attention.pdf</code>"));
    }

    #[test]
    fn console_surface_reads_store() {
        let store = MemoryStore::new();
        store.save(&full()).unwrap();
        let surface = ConsoleSurface::new(Vec::new());
        surface.open(&store).unwrap();
        let out = String::from_utf8(surface.into_inner().unwrap()).unwrap();
        assert!(out.contains("Vaswani"));
    }

    #[test]
    fn html_surface_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.html");
        let store = MemoryStore::new();
        HtmlFileSurface::new(&path).open(&store).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains(NO_METADATA));
    }
}
