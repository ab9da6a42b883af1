use std::sync::atomic::{AtomicU64, Ordering};

use edgar_fetch::{EventSink, FetchEvent};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

const TEMPLATE: &str =
    "{msg:<10} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, eta {eta})";

/// Draws fetch progress on the terminal.
///
/// Failures are logged above the bar as they happen. Skips are only noted
/// every `skip_log_interval` occurrences so a resumed run stays quiet.
pub struct ProgressRenderer {
    bar: ProgressBar,
    skip_log_interval: u64,
    skipped: AtomicU64,
}

impl ProgressRenderer {
    pub fn new(label: &str, skip_log_interval: u64) -> Self {
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        let bar = ProgressBar::new(0).with_style(style);
        bar.set_message(label.to_owned());
        Self::with_bar(bar, skip_log_interval)
    }

    pub fn with_bar(bar: ProgressBar, skip_log_interval: u64) -> Self {
        Self {
            bar,
            skip_log_interval,
            skipped: AtomicU64::new(0),
        }
    }
}

impl EventSink for ProgressRenderer {
    fn emit(&self, event: &FetchEvent) {
        match event {
            FetchEvent::Started { total } => {
                self.bar.set_length(*total as u64);
                self.bar.set_position(0);
                self.skipped.store(0, Ordering::Relaxed);
            }
            FetchEvent::Skipped { path, .. } => {
                self.bar.inc(1);
                let count = self.skipped.fetch_add(1, Ordering::Relaxed) + 1;
                if is_sampled(count, self.skip_log_interval) {
                    self.bar.suspend(|| {
                        info!(
                            skipped = count,
                            latest = %path.display(),
                            "skipping files already on disk"
                        )
                    });
                }
            }
            FetchEvent::Downloaded { .. } => self.bar.inc(1),
            FetchEvent::Failed {
                locator, reason, ..
            } => {
                self.bar
                    .suspend(|| warn!(%locator, %reason, "download failed"));
                self.bar.inc(1);
            }
            FetchEvent::Finished { summary } => {
                self.bar.finish_and_clear();
                info!(
                    downloaded = summary.downloaded,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    "finished"
                );
            }
        }
    }
}

fn is_sampled(count: u64, interval: u64) -> bool {
    interval > 0 && count % interval == 0
}
