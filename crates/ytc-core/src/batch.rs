//! Batch driver: run a list of input lines through extract + resolve.
//!
//! Lines are processed strictly in order, one lookup at a time, with the
//! throttle consulted before each item. Every event goes to a [`RenderSink`]
//! as it happens so the caller can stream rows and progress.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::extract::extract_with_rule;
use crate::model::{ResultRow, Source};
use crate::resolver::Resolver;
use crate::throttle::Throttle;

/// Something the presentation layer should show.
#[derive(Debug)]
pub enum BatchEvent<'a> {
    /// Input contained no non-blank lines; nothing was processed.
    Empty,
    Started { total: usize },
    Row(&'a ResultRow),
    Progress { done: usize, total: usize },
    Finished {
        rows: &'a [ResultRow],
        export_available: bool,
    },
}

impl BatchEvent<'_> {
    /// Status-line text, if this event updates the status line.
    pub fn status_text(&self) -> Option<String> {
        match self {
            BatchEvent::Empty => Some("Nothing to process.".to_string()),
            BatchEvent::Started { total } => Some(format!("Processing 0 of {total}...")),
            BatchEvent::Progress { done, total } => {
                Some(format!("Processing {done} of {total}..."))
            }
            BatchEvent::Finished { .. } => Some("Done.".to_string()),
            BatchEvent::Row(_) => None,
        }
    }
}

/// Receives batch events. An error stops the batch.
pub trait RenderSink {
    fn handle(&mut self, event: BatchEvent<'_>) -> anyhow::Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("a batch is already running")]
    Busy,
    #[error("render: {0:#}")]
    Render(anyhow::Error),
}

/// Rows from a completed batch plus summary counts.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub rows: Vec<ResultRow>,
}

impl BatchReport {
    pub fn resolved(&self) -> usize {
        self.rows.iter().filter(|r| r.is_resolved()).count()
    }

    pub fn failed(&self) -> usize {
        self.rows.len() - self.resolved()
    }

    /// Rows whose id only came from the trailing-segment heuristic.
    pub fn fallback(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.rule().is_some_and(|m| m.is_fallback()))
            .count()
    }

    pub fn cache_hits(&self) -> usize {
        self.rows.iter().filter(|r| r.source == Source::Cache).count()
    }
}

/// Clears the busy flag when the run ends, including on early return.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct BatchDriver {
    resolver: Resolver,
    throttle: Box<dyn Throttle>,
    busy: AtomicBool,
}

impl BatchDriver {
    pub fn new(resolver: Resolver, throttle: Box<dyn Throttle>) -> Self {
        Self {
            resolver,
            throttle,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Process `lines`. Blank lines are dropped before numbering.
    ///
    /// Returns [`BatchError::Busy`] without touching the sink if another run
    /// on this driver has not finished.
    pub async fn run<S, I>(&self, lines: I, sink: &mut S) -> Result<BatchReport, BatchError>
    where
        S: RenderSink + ?Sized,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("batch rejected: another batch is running");
            return Err(BatchError::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        let inputs: Vec<String> = lines
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        if inputs.is_empty() {
            sink.handle(BatchEvent::Empty).map_err(BatchError::Render)?;
            return Ok(BatchReport::default());
        }

        let total = inputs.len();
        tracing::info!(total, throttle = %self.throttle.describe(), "batch started");
        sink.handle(BatchEvent::Started { total })
            .map_err(BatchError::Render)?;

        let mut rows = Vec::with_capacity(total);
        for (i, input) in inputs.into_iter().enumerate() {
            self.throttle.acquire(i).await;

            let extraction = extract_with_rule(&input);
            if let Some(ex) = extraction.as_ref().filter(|e| e.rule.is_fallback()) {
                tracing::warn!(
                    input = %input,
                    video_id = %ex.id,
                    "low-confidence match: id taken from trailing path segment"
                );
            }
            let resolved = self
                .resolver
                .resolve(extraction.as_ref().map(|e| &e.id))
                .await;

            let row = ResultRow {
                index: i + 1,
                input,
                extraction,
                outcome: resolved.outcome,
                source: resolved.source,
            };
            sink.handle(BatchEvent::Row(&row))
                .map_err(BatchError::Render)?;
            rows.push(row);
            sink.handle(BatchEvent::Progress {
                done: i + 1,
                total,
            })
            .map_err(BatchError::Render)?;
        }

        let report = BatchReport { rows };
        tracing::info!(
            total,
            resolved = report.resolved(),
            failed = report.failed(),
            cache_hits = report.cache_hits(),
            "batch finished"
        );
        sink.handle(BatchEvent::Finished {
            rows: &report.rows,
            export_available: !report.rows.is_empty(),
        })
        .map_err(BatchError::Render)?;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::extract::MatchRule;
    use crate::fetch::{MetadataFetcher, OEmbedPayload};
    use crate::model::{ResolveError, VideoId};
    use crate::resolver::testing::ScriptedFetcher;
    use crate::throttle::{FixedDelay, TokenBucket};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};
    use tokio::sync::Notify;

    /// Records a compact trace of events.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        fail_on_row: Option<usize>,
    }

    impl RenderSink for Recorder {
        fn handle(&mut self, event: BatchEvent<'_>) -> anyhow::Result<()> {
            let line = match &event {
                BatchEvent::Empty => "empty".to_string(),
                BatchEvent::Started { total } => format!("started {total}"),
                BatchEvent::Row(row) => {
                    if self.fail_on_row == Some(row.index) {
                        anyhow::bail!("sink closed");
                    }
                    format!("row {} {}", row.index, row.display_name())
                }
                BatchEvent::Progress { done, total } => format!("progress {done}/{total}"),
                BatchEvent::Finished {
                    rows,
                    export_available,
                } => format!("finished {} {}", rows.len(), export_available),
            };
            self.events.push(line);
            Ok(())
        }
    }

    fn driver(fetcher: ScriptedFetcher) -> BatchDriver {
        let resolver = Resolver::new(
            Box::new(MemoryCache::new()),
            Box::new(fetcher),
            Duration::from_secs(60),
        );
        BatchDriver::new(resolver, Box::new(FixedDelay::new(Duration::ZERO)))
    }

    #[tokio::test]
    async fn blank_input_emits_empty_only() {
        let fetcher = ScriptedFetcher::new();
        let d = driver(fetcher.clone());
        let mut sink = Recorder::default();
        let report = d.run(["", "   ", "\t"], &mut sink).await.unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(sink.events, vec!["empty"]);
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn rows_stream_in_input_order_with_progress() {
        let fetcher = ScriptedFetcher::new();
        let d = driver(fetcher.clone());
        let mut sink = Recorder::default();
        let lines = [
            "https://www.youtube.com/watch?v=AAAAAAAAAAA",
            "",
            "https://youtu.be/BBBBBBBBBBB",
            "https://www.youtube.com/shorts/CCCCCCCCCCC",
        ];
        let report = d.run(lines, &mut sink).await.unwrap();

        assert_eq!(
            sink.events,
            vec![
                "started 3",
                "row 1 Channel AAAAAAAAAAA",
                "progress 1/3",
                "row 2 Channel BBBBBBBBBBB",
                "progress 2/3",
                "row 3 Channel CCCCCCCCCCC",
                "progress 3/3",
                "finished 3 true",
            ]
        );
        assert_eq!(
            *fetcher.seen.lock().unwrap(),
            vec!["AAAAAAAAAAA", "BBBBBBBBBBB", "CCCCCCCCCCC"]
        );
        assert_eq!(report.resolved(), 3);
        assert!(!d.is_busy());
    }

    #[tokio::test]
    async fn mixed_valid_and_garbage() {
        let d = driver(ScriptedFetcher::new());
        let mut sink = Recorder::default();
        let report = d
            .run(["https://youtu.be/dQw4w9WgXcQ", "garbage"], &mut sink)
            .await
            .unwrap();

        assert_eq!(report.rows.len(), 2);
        let first = &report.rows[0];
        assert_eq!(first.video_id().map(VideoId::as_str), Some("dQw4w9WgXcQ"));
        assert_eq!(first.rule(), Some(MatchRule::ShortLink));
        assert!(first.is_resolved());

        let second = &report.rows[1];
        assert_eq!(second.input, "garbage");
        assert_eq!(second.outcome, Err(ResolveError::InvalidId));
        assert_eq!(second.source, Source::Skipped);
        assert_eq!(second.display_name(), "#N/A (Invalid ID)");
        assert_eq!(second.display_url(), "#N/A");

        assert_eq!(report.resolved(), 1);
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn repeated_id_hits_cache_within_batch() {
        let fetcher = ScriptedFetcher::new();
        let d = driver(fetcher.clone());
        let mut sink = Recorder::default();
        let report = d
            .run(
                [
                    "https://youtu.be/dQw4w9WgXcQ",
                    "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42",
                ],
                &mut sink,
            )
            .await
            .unwrap();
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(report.cache_hits(), 1);
        assert_eq!(report.rows[1].source, Source::Cache);
    }

    #[tokio::test]
    async fn failed_lookup_does_not_stop_batch() {
        let fetcher = ScriptedFetcher::new();
        fetcher.fail("AAAAAAAAAAA", ResolveError::Http(404));
        let d = driver(fetcher);
        let mut sink = Recorder::default();
        let report = d
            .run(
                [
                    "https://youtu.be/AAAAAAAAAAA",
                    "https://youtu.be/BBBBBBBBBBB",
                ],
                &mut sink,
            )
            .await
            .unwrap();
        assert_eq!(report.rows[0].display_name(), "#N/A (Unavailable)");
        assert!(report.rows[1].is_resolved());
    }

    #[tokio::test]
    async fn fallback_rows_are_counted() {
        let d = driver(ScriptedFetcher::new());
        let mut sink = Recorder::default();
        let report = d
            .run(["https://example.com/clips/dQw4w9WgXcQ"], &mut sink)
            .await
            .unwrap();
        assert_eq!(report.fallback(), 1);
        assert!(report.rows[0].is_resolved());
    }

    #[tokio::test]
    async fn sink_error_stops_batch_and_clears_busy() {
        let fetcher = ScriptedFetcher::new();
        let d = driver(fetcher.clone());
        let mut sink = Recorder {
            fail_on_row: Some(1),
            ..Recorder::default()
        };
        let err = d
            .run(
                [
                    "https://youtu.be/AAAAAAAAAAA",
                    "https://youtu.be/BBBBBBBBBBB",
                ],
                &mut sink,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::Render(_)));
        assert_eq!(fetcher.call_count(), 1);
        assert!(!d.is_busy());
    }

    /// Blocks in `fetch` until released, so a second run can observe the busy flag.
    struct GatedFetcher {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl MetadataFetcher for GatedFetcher {
        async fn fetch(&self, _id: &VideoId) -> Result<OEmbedPayload, ResolveError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(OEmbedPayload {
                author_name: Some("A".to_string()),
                author_url: Some("B".to_string()),
            })
        }
    }

    #[tokio::test]
    async fn second_run_while_busy_is_rejected() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let resolver = Resolver::new(
            Box::new(MemoryCache::new()),
            Box::new(GatedFetcher {
                entered: Arc::clone(&entered),
                release: Arc::clone(&release),
            }),
            Duration::from_secs(60),
        );
        let d = BatchDriver::new(resolver, Box::new(FixedDelay::new(Duration::ZERO)));

        let mut first_sink = Recorder::default();
        let mut second_sink = Recorder::default();
        let first = d.run(["https://youtu.be/dQw4w9WgXcQ"], &mut first_sink);
        let second = async {
            entered.notified().await;
            let r = d.run(["https://youtu.be/AAAAAAAAAAA"], &mut second_sink).await;
            release.notify_one();
            r
        };
        let (first, second) = tokio::join!(first, second);

        assert!(matches!(second, Err(BatchError::Busy)));
        assert!(second_sink.events.is_empty());
        assert_eq!(first.unwrap().resolved(), 1);
        assert!(!d.is_busy());
    }

    /// Records when each fetch started.
    #[derive(Clone, Default)]
    struct StampingFetcher {
        stamps: Arc<Mutex<Vec<Instant>>>,
    }

    #[async_trait]
    impl MetadataFetcher for StampingFetcher {
        async fn fetch(&self, _id: &VideoId) -> Result<OEmbedPayload, ResolveError> {
            self.stamps.lock().unwrap().push(Instant::now());
            Ok(OEmbedPayload {
                author_name: Some("A".to_string()),
                author_url: Some("B".to_string()),
            })
        }
    }

    #[tokio::test]
    async fn token_bucket_paces_from_the_first_item() {
        let fetcher = StampingFetcher::default();
        let resolver = Resolver::new(
            Box::new(MemoryCache::new()),
            Box::new(fetcher.clone()),
            Duration::from_secs(60),
        );
        let d = BatchDriver::new(resolver, Box::new(TokenBucket::new(1, 1)));
        let mut sink = Recorder::default();
        d.run(
            [
                "https://youtu.be/AAAAAAAAAAA",
                "https://youtu.be/BBBBBBBBBBB",
                "https://youtu.be/CCCCCCCCCCC",
            ],
            &mut sink,
        )
        .await
        .unwrap();

        let stamps = fetcher.stamps.lock().unwrap().clone();
        assert_eq!(stamps.len(), 3);
        let gaps: Vec<Duration> = stamps.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(
            gaps.iter().all(|g| *g >= Duration::from_millis(900)),
            "1 request/s with burst 1 must space every fetch: {gaps:?}"
        );
    }
}
