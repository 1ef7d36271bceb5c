//! Export of resolved channel URLs to the clipboard.
//!
//! Only rows whose display URL is an actual link are exported, one per line,
//! in row order. Sentinels never reach the clipboard.

use crate::model::ResultRow;

/// Channel URLs from `rows`, skipping anything that does not start with `http`.
pub fn export_urls(rows: &[ResultRow]) -> Vec<String> {
    rows.iter()
        .map(ResultRow::display_url)
        .filter(|u| u.starts_with("http"))
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("no clipboard helper found (tried: {0})")]
    NoBackend(String),
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}")]
    Exit { program: String, status: String },
}

/// Destination for exported text.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    /// No row had a usable URL; the clipboard was left untouched.
    NothingToCopy,
    Copied { count: usize },
}

/// Copy the exportable URLs to `sink`, newline separated.
pub fn export_to_clipboard<C>(
    rows: &[ResultRow],
    sink: &mut C,
) -> Result<ExportOutcome, ClipboardError>
where
    C: ClipboardSink + ?Sized,
{
    let urls = export_urls(rows);
    if urls.is_empty() {
        tracing::info!("export skipped: no channel URLs");
        return Ok(ExportOutcome::NothingToCopy);
    }
    sink.set_text(&urls.join("\n"))?;
    tracing::info!(count = urls.len(), "copied channel URLs to clipboard");
    Ok(ExportOutcome::Copied { count: urls.len() })
}
