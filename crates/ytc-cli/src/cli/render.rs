//! Terminal rendering of batch events.
//!
//! Rows go to stdout as they arrive; status lines go to stderr. When stderr
//! is a terminal the status line is redrawn in place.

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use std::io::Write;
use ytc_core::batch::{BatchEvent, RenderSink};
use ytc_core::model::{ResultRow, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns.
    Table,
    /// Tab-separated: input, channel name, channel URL.
    Tsv,
    /// One JSON object per line.
    Json,
}

const INPUT_WIDTH: usize = 44;
const NAME_WIDTH: usize = 28;

pub struct TerminalSink<O: Write, E: Write> {
    out: O,
    err: E,
    format: OutputFormat,
    live: bool,
}

impl<O: Write, E: Write> TerminalSink<O, E> {
    pub fn new(out: O, err: E, format: OutputFormat, live: bool) -> Self {
        Self {
            out,
            err,
            format,
            live,
        }
    }

    fn status(&mut self, text: &str, last: bool) -> Result<()> {
        if self.live {
            write!(self.err, "\r\x1b[2K{text}")?;
            if last {
                writeln!(self.err)?;
            }
        } else {
            writeln!(self.err, "{text}")?;
        }
        self.err.flush()?;
        Ok(())
    }

    fn header(&mut self) -> Result<()> {
        match self.format {
            OutputFormat::Table => writeln!(
                self.out,
                "{:>4}  {:<iw$}  {:<nw$}  {}",
                "#",
                "INPUT",
                "CHANNEL",
                "URL",
                iw = INPUT_WIDTH,
                nw = NAME_WIDTH
            )?,
            OutputFormat::Tsv => writeln!(self.out, "input\tchannel\turl")?,
            OutputFormat::Json => {}
        }
        Ok(())
    }

    fn row(&mut self, row: &ResultRow) -> Result<()> {
        if self.live {
            // Clear the in-place status line before the row lands on the terminal.
            write!(self.err, "\r\x1b[2K")?;
            self.err.flush()?;
        }
        match self.format {
            OutputFormat::Table => {
                let mut name = row.display_name();
                if row.rule().is_some_and(|r| r.is_fallback()) && row.is_resolved() {
                    name.push_str(" (?)");
                }
                writeln!(
                    self.out,
                    "{:>4}  {:<iw$}  {:<nw$}  {}",
                    row.index,
                    clip(&row.input, INPUT_WIDTH),
                    clip(&name, NAME_WIDTH),
                    row.display_url(),
                    iw = INPUT_WIDTH,
                    nw = NAME_WIDTH
                )?;
            }
            OutputFormat::Tsv => writeln!(
                self.out,
                "{}\t{}\t{}",
                tsv_field(&row.input),
                tsv_field(&row.display_name()),
                tsv_field(&row.display_url())
            )?,
            OutputFormat::Json => {
                let line = serde_json::to_string(&JsonRow::from(row))?;
                writeln!(self.out, "{line}")?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

impl<O: Write, E: Write> RenderSink for TerminalSink<O, E> {
    fn handle(&mut self, event: BatchEvent<'_>) -> Result<()> {
        let text = event.status_text();
        match event {
            BatchEvent::Row(row) => self.row(row),
            BatchEvent::Started { .. } => {
                self.header()?;
                self.status(text.as_deref().unwrap_or_default(), false)
            }
            BatchEvent::Progress { .. } => {
                self.status(text.as_deref().unwrap_or_default(), false)
            }
            BatchEvent::Empty | BatchEvent::Finished { .. } => {
                self.status(text.as_deref().unwrap_or_default(), true)
            }
        }
    }
}

/// JSON-lines record. Missing values use the `#N/A` sentinels, like the table.
#[derive(Debug, Serialize)]
struct JsonRow<'a> {
    index: usize,
    input: &'a str,
    video_id: Option<&'a str>,
    rule: Option<&'a str>,
    source: Source,
    name: String,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> From<&'a ResultRow> for JsonRow<'a> {
    fn from(row: &'a ResultRow) -> Self {
        Self {
            index: row.index,
            input: &row.input,
            video_id: row.video_id().map(|id| id.as_str()),
            rule: row.rule().map(|r| r.as_str()),
            source: row.source,
            name: row.display_name(),
            url: row.display_url(),
            error: row.outcome.as_ref().err().map(|e| e.to_string()),
        }
    }
}

fn clip(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

fn tsv_field(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}
