//! Isolated job execution and result aggregation
//!
//! Jobs run strictly sequentially, in configuration order. A fault in one
//! job must never take down the batch: the runner records it in the
//! [`RunErrorLog`] and moves on, leaving a `PROCESSINGERROR` sentinel in
//! that job's slot so the report still lists every configured channel.
//!
//! The error log is an explicit accumulator owned by the caller and shared
//! across both domains during one run; it is flushed into the report's
//! error section and then dropped.

use crate::engine::{AnalysisEngine, AnalysisRequest, Domain};
use indicatif::ProgressBar;

/// Sentinel stored in place of a result location when a job fails.
pub const FAILURE_SENTINEL: &str = "PROCESSINGERROR";

/// What one job produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Opaque result location handed back by the engine.
    Success(String),
    /// Failure sentinel; the detail lives in the run error log.
    Failure(String),
}

impl Outcome {
    /// Result location to link from the report, if the job has one.
    pub fn location(&self) -> Option<&str> {
        match self {
            Outcome::Success(loc) if !loc.is_empty() => Some(loc),
            _ => None,
        }
    }
}

/// A channel paired with its job's outcome, in configuration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelResult {
    pub channel: String,
    pub outcome: Outcome,
}

/// One captured per-job fault.
#[derive(Debug, Clone)]
pub struct RunError {
    pub domain: Domain,
    pub channel: String,
    pub message: String,
}

/// Accumulates per-job faults across both domains for one run.
#[derive(Debug, Default)]
pub struct RunErrorLog {
    entries: Vec<RunError>,
}

impl RunErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, domain: Domain, channel: &str, message: String) {
        self.entries.push(RunError {
            domain,
            channel: channel.to_string(),
            message,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RunError] {
        &self.entries
    }
}

/// Run every request against the engine, one at a time, in order.
///
/// The returned list always has exactly one entry per request, index for
/// index, whatever failed along the way.
pub fn run_batch<E: AnalysisEngine>(
    engine: &E,
    requests: &[AnalysisRequest],
    errors: &mut RunErrorLog,
    progress: Option<&ProgressBar>,
) -> Vec<ChannelResult> {
    let mut results = Vec::with_capacity(requests.len());
    for request in requests {
        if let Some(pb) = progress {
            pb.set_message(format!("Processing {}...", request.channel));
        }
        let outcome = match engine.run(request) {
            Ok(location) => Outcome::Success(location),
            Err(fault) => {
                errors.record(request.domain, &request.channel, fault.to_string());
                Outcome::Failure(FAILURE_SENTINEL.to_string())
            }
        };
        if let Some(pb) = progress {
            pb.inc(1);
        }
        results.push(ChannelResult {
            channel: request.channel.clone(),
            outcome,
        });
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineFault;
    use std::path::Path;

    /// Test double: fails every channel whose name is listed.
    struct FlakyEngine {
        failing: Vec<&'static str>,
    }

    impl AnalysisEngine for FlakyEngine {
        fn run(&self, request: &AnalysisRequest) -> Result<String, EngineFault> {
            if self.failing.contains(&request.channel.as_str()) {
                Err(EngineFault::Failed {
                    status: "exit status: 1".to_string(),
                    stderr: format!("synthetic fault for {}", request.channel),
                })
            } else {
                Ok(format!("results/{}/", request.channel))
            }
        }
    }

    fn request(channel: &str) -> AnalysisRequest {
        use crate::config::FrequencyChannelConfig;
        let config = FrequencyChannelConfig {
            channel: channel.to_string(),
            ifo: "L1".to_string(),
            frame_type: "L1_R".to_string(),
            variables: "8192".to_string(),
            segment_size: "10".to_string(),
            components: "40".to_string(),
            max_clusters: "10".to_string(),
        };
        AnalysisRequest::from_frequency_row(0, &config, Path::new("times.txt")).unwrap()
    }

    #[test]
    fn test_outcomes_match_requests_in_order() {
        let engine = FlakyEngine { failing: vec![] };
        let requests: Vec<_> = ["a", "b", "c"].iter().map(|c| request(c)).collect();
        let mut errors = RunErrorLog::new();
        let results = run_batch(&engine, &requests, &mut errors, None);
        assert_eq!(results.len(), 3);
        for (req, res) in requests.iter().zip(&results) {
            assert_eq!(req.channel, res.channel);
        }
        assert!(errors.is_empty());
    }

    #[test]
    fn test_single_failure_is_contained() {
        let engine = FlakyEngine { failing: vec!["b"] };
        let requests: Vec<_> = ["a", "b", "c"].iter().map(|c| request(c)).collect();
        let mut errors = RunErrorLog::new();
        let results = run_batch(&engine, &requests, &mut errors, None);

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].outcome,
            Outcome::Success("results/a/".to_string())
        );
        assert_eq!(
            results[1].outcome,
            Outcome::Failure(FAILURE_SENTINEL.to_string())
        );
        assert_eq!(
            results[2].outcome,
            Outcome::Success("results/c/".to_string())
        );

        assert_eq!(errors.entries().len(), 1);
        let entry = &errors.entries()[0];
        assert_eq!(entry.channel, "b");
        assert_eq!(entry.domain, Domain::Frequency);
        assert!(entry.message.contains("synthetic fault for b"));
    }

    #[test]
    fn test_all_failures_still_produce_full_results() {
        let engine = FlakyEngine {
            failing: vec!["a", "b"],
        };
        let requests: Vec<_> = ["a", "b"].iter().map(|c| request(c)).collect();
        let mut errors = RunErrorLog::new();
        let results = run_batch(&engine, &requests, &mut errors, None);
        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| r.outcome == Outcome::Failure(FAILURE_SENTINEL.to_string())));
        assert_eq!(errors.entries().len(), 2);
    }

    #[test]
    fn test_error_log_accumulates_across_batches() {
        let engine = FlakyEngine { failing: vec!["a"] };
        let requests = vec![request("a")];
        let mut errors = RunErrorLog::new();
        run_batch(&engine, &requests, &mut errors, None);
        run_batch(&engine, &requests, &mut errors, None);
        assert_eq!(errors.entries().len(), 2);
    }

    #[test]
    fn test_failure_has_no_location() {
        assert_eq!(Outcome::Failure(FAILURE_SENTINEL.to_string()).location(), None);
        assert_eq!(Outcome::Success(String::new()).location(), None);
        assert_eq!(
            Outcome::Success("results/a/".to_string()).location(),
            Some("results/a/")
        );
    }
}
