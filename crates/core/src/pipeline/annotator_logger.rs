use std::collections::HashMap;
use std::time::Instant;

use crate::shared::error::ClientError;

/// What happened to a recognition response once it came back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseDisposition {
    /// Drawn as the new overlay.
    Displayed,
    /// Older than the overlay already on screen.
    Stale,
    /// Its capture session has ended.
    Orphaned,
    /// The request or its decoding failed.
    Failed,
}

impl ResponseDisposition {
    fn name(self) -> &'static str {
        match self {
            ResponseDisposition::Displayed => "displayed",
            ResponseDisposition::Stale => "stale",
            ResponseDisposition::Orphaned => "orphaned",
            ResponseDisposition::Failed => "failed",
        }
    }
}

/// Observer for annotator events.
///
/// Keeps the annotator free of output concerns: the CLI prints a summary,
/// the desktop app stays silent, tests count.
pub trait AnnotatorLogger: Send {
    fn submitted(&mut self, tag: u64);

    fn response(&mut self, disposition: ResponseDisposition, latency_ms: f64);

    fn error(&mut self, error: &ClientError);

    /// Record how long a named stage took for one tick.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullAnnotatorLogger;

impl AnnotatorLogger for NullAnnotatorLogger {
    fn submitted(&mut self, _tag: u64) {}
    fn response(&mut self, _disposition: ResponseDisposition, _latency_ms: f64) {}
    fn error(&mut self, _error: &ClientError) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Sum and count of a stream of samples; constant size however long the
/// camera runs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct RunningMean {
    total: f64,
    count: u64,
}

impl RunningMean {
    fn add(&mut self, sample: f64) {
        self.total += sample;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total / self.count as f64)
    }
}

/// Counts submissions and response outcomes, tracks per-stage timing, and
/// reports through the `log` crate.
pub struct StdoutAnnotatorLogger {
    submissions: usize,
    dispositions: HashMap<ResponseDisposition, usize>,
    latency: RunningMean,
    timings: HashMap<String, RunningMean>,
    start_time: Instant,
}

impl StdoutAnnotatorLogger {
    pub fn new() -> Self {
        Self {
            submissions: 0,
            dispositions: HashMap::new(),
            latency: RunningMean::default(),
            timings: HashMap::new(),
            start_time: Instant::now(),
        }
    }

    pub fn submissions(&self) -> usize {
        self.submissions
    }

    pub fn count(&self, disposition: ResponseDisposition) -> usize {
        self.dispositions.get(&disposition).copied().unwrap_or(0)
    }

    /// Returns the formatted summary string, or `None` if nothing was submitted.
    pub fn summary_string(&self) -> Option<String> {
        if self.submissions == 0 && self.timings.is_empty() {
            return None;
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Annotator summary ({} submissions, {elapsed:.1}s):",
            self.submissions
        )];

        for disposition in [
            ResponseDisposition::Displayed,
            ResponseDisposition::Stale,
            ResponseDisposition::Orphaned,
            ResponseDisposition::Failed,
        ] {
            lines.push(format!(
                "  {:10}: {}",
                disposition.name(),
                self.count(disposition)
            ));
        }

        if let Some(avg) = self.latency.mean() {
            lines.push(format!("  latency   : avg {avg:.1}ms"));
        }

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let timing = self.timings[stage];
            if let Some(avg) = timing.mean() {
                lines.push(format!("  {stage:10}: avg {avg:6.2}ms over {} tick(s)", timing.count));
            }
        }

        Some(lines.join("\n"))
    }
}

impl Default for StdoutAnnotatorLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotatorLogger for StdoutAnnotatorLogger {
    fn submitted(&mut self, tag: u64) {
        self.submissions += 1;
        log::debug!("Submitted frame {tag} for recognition");
    }

    fn response(&mut self, disposition: ResponseDisposition, latency_ms: f64) {
        *self.dispositions.entry(disposition).or_default() += 1;
        self.latency.add(latency_ms);
        if disposition != ResponseDisposition::Displayed {
            log::debug!("Recognition response {} after {latency_ms:.0}ms", disposition.name());
        }
    }

    fn error(&mut self, error: &ClientError) {
        log::warn!("{error}");
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        match self.timings.get_mut(stage) {
            Some(timing) => timing.add(duration_ms),
            None => {
                let mut timing = RunningMean::default();
                timing.add(duration_ms);
                self.timings.insert(stage.to_string(), timing);
            }
        }
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullAnnotatorLogger;
        logger.submitted(3);
        logger.response(ResponseDisposition::Displayed, 12.0);
        logger.error(&ClientError::Protocol("bad".into()));
        logger.timing("draw", 1.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_counts_submissions_and_dispositions() {
        let mut logger = StdoutAnnotatorLogger::new();
        logger.submitted(3);
        logger.submitted(6);
        logger.response(ResponseDisposition::Displayed, 40.0);
        logger.response(ResponseDisposition::Stale, 80.0);

        assert_eq!(logger.submissions(), 2);
        assert_eq!(logger.count(ResponseDisposition::Displayed), 1);
        assert_eq!(logger.count(ResponseDisposition::Stale), 1);
        assert_eq!(logger.count(ResponseDisposition::Failed), 0);
    }

    #[test]
    fn test_summary_includes_dispositions_and_latency() {
        let mut logger = StdoutAnnotatorLogger::new();
        logger.submitted(3);
        logger.response(ResponseDisposition::Displayed, 40.0);
        logger.response(ResponseDisposition::Failed, 20.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Annotator summary (1 submissions"));
        assert!(summary.contains("displayed : 1"));
        assert!(summary.contains("failed    : 1"));
        assert!(summary.contains("avg 30.0ms"));
    }

    #[test]
    fn test_summary_includes_stage_timing() {
        let mut logger = StdoutAnnotatorLogger::new();
        logger.timing("draw", 2.0);
        logger.timing("draw", 4.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("draw"));
        assert!(summary.contains("avg   3.00ms"));
    }

    #[test]
    fn test_long_run_keeps_one_accumulator_per_stage() {
        let mut logger = StdoutAnnotatorLogger::new();
        for i in 0..100_000 {
            logger.timing("draw", if i % 2 == 0 { 1.0 } else { 3.0 });
            logger.response(ResponseDisposition::Displayed, 50.0);
        }

        assert_eq!(logger.timings.len(), 1);
        assert_eq!(logger.timings["draw"].count, 100_000);
        assert_relative_eq!(logger.timings["draw"].mean().unwrap(), 2.0);
        assert_relative_eq!(logger.latency.mean().unwrap(), 50.0);
        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("avg   2.00ms over 100000 tick(s)"));
    }

    #[test]
    fn test_running_mean_of_nothing_is_none() {
        assert_eq!(RunningMean::default().mean(), None);
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let logger = StdoutAnnotatorLogger::new();
        assert!(logger.summary_string().is_none());
    }
}
