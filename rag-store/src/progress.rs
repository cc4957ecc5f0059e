//! Embedding progress for the interactive CLI.
//!
//! The server passes [`NoopProgress`]; `chat` draws an [`IndicatifProgress`] bar
//! while the itinerary is embedded on first start.

use indicatif::{ProgressBar, ProgressStyle};

/// Sink for ingestion progress. All methods default to doing nothing.
pub trait Progress: Send + Sync {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _done: u64) {}
    fn message(&self, _text: &str) {}
    fn finish(&self, _text: &str) {}
}

#[derive(Default, Clone, Copy)]
pub struct NoopProgress;

impl Progress for NoopProgress {}

/// Terminal progress bar; the length can be set later via [`Progress::set_total`].
pub struct IndicatifProgress {
    bar: ProgressBar,
}

impl IndicatifProgress {
    pub fn bar(len: u64) -> Self {
        let bar = ProgressBar::new(len);
        match ProgressStyle::with_template("{spinner:.green} {msg:>10} [{bar:40.cyan/blue}] {pos}/{len} chunks") {
            Ok(style) => bar.set_style(style.progress_chars("=> ")),
            Err(e) => tracing::debug!(error = %e, "progress template rejected, using default"),
        }
        Self { bar }
    }
}

impl Progress for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
    }

    fn inc(&self, done: u64) {
        self.bar.inc(done);
    }

    fn message(&self, text: &str) {
        self.bar.set_message(text.to_owned());
    }

    fn finish(&self, text: &str) {
        self.bar.finish_with_message(text.to_owned());
    }
}
