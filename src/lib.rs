//! Glitchsum - batch per-channel glitch analysis with summary reports
//!
//! Glitchsum turns a configuration table of detector channels into one
//! analysis job per channel, runs an external analysis engine for each job,
//! and renders everything into a single HTML summary page plus a
//! lock-segment timeline plot.
//!
//! # Pipeline
//!
//! 1. **Configuration parsing** ([`config`]): whitespace-delimited tables,
//!    one channel per row, in a time-domain (11 field) or frequency-domain
//!    (7 field) schema.
//! 2. **Request building** ([`engine`]): each row becomes one typed
//!    [`engine::AnalysisRequest`], with explicit window bounds when the run
//!    was given `--start`/`--end`.
//! 3. **Isolated execution** ([`runner`]): jobs run sequentially; a failing
//!    job is logged and sentinel-marked, never fatal. A run with N failures
//!    out of M jobs still reports all M channels.
//! 4. **Synthesis** ([`report`], [`plot`]): the results, the accumulated
//!    error log, the lock plot and the copied configuration files become
//!    one summary page.
//!
//! Segment bookkeeping lives in [`segments`]; windowed runs without an
//! explicit times list query the segment database through [`segdb`].
//!
//! # Quick start
//!
//! ```no_run
//! use glitchsum::config::read_time_config;
//! use glitchsum::engine::{AnalysisRequest, CommandEngine};
//! use glitchsum::runner::{run_batch, RunErrorLog};
//! use std::path::Path;
//!
//! let rows = read_time_config("channels.config")?;
//! let list = Path::new("times_today");
//! let requests = rows
//!     .iter()
//!     .enumerate()
//!     .map(|(i, row)| AnalysisRequest::from_time_row(i, row, list, None))
//!     .collect::<Result<Vec<_>, _>>()?;
//!
//! let engine = CommandEngine::new("pcat");
//! let mut errors = RunErrorLog::new();
//! let results = run_batch(&engine, &requests, &mut errors, None);
//! assert_eq!(results.len(), requests.len());
//! # Ok::<(), glitchsum::error::ConfigError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod plot;
pub mod report;
pub mod runner;
pub mod segdb;
pub mod segments;

pub use engine::{AnalysisEngine, AnalysisRequest, CommandEngine, Domain};
pub use runner::{run_batch, ChannelResult, Outcome, RunErrorLog, FAILURE_SENTINEL};
pub use segments::{Segment, SegmentList};

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // PUBLIC API TESTS
    // ==========================================================================
    //
    // These tests verify the public API surface is correct and documented.
    // ==========================================================================

    #[test]
    fn test_public_exports() {
        let _: Outcome = Outcome::Failure(FAILURE_SENTINEL.to_string());
        let _: SegmentList = SegmentList::NoData;
        let _ = CommandEngine::new("pcat");
    }

    #[test]
    fn test_domain_display() {
        assert_eq!(Domain::Time.to_string(), "Time Domain");
        assert_eq!(Domain::Frequency.to_string(), "Frequency Domain");
    }

    #[test]
    fn test_failure_sentinel_value() {
        // The sentinel is part of the report contract.
        assert_eq!(FAILURE_SENTINEL, "PROCESSINGERROR");
    }

    /// A single-channel windowed run with a failing engine, end to end:
    /// parse, build, run, report. The batch survives, the page lists the
    /// channel as "no results", and the error block names it.
    #[test]
    fn test_failing_channel_end_to_end() {
        use crate::report::{html, ReportInputs};
        use std::path::Path;

        struct BrokenEngine;
        impl AnalysisEngine for BrokenEngine {
            fn run(&self, _: &AnalysisRequest) -> Result<String, error::EngineFault> {
                Err(error::EngineFault::Failed {
                    status: "exit status: 1".to_string(),
                    stderr: "frame data unavailable".to_string(),
                })
            }
        }

        let config_path = std::env::temp_dir().join("glitchsum_e2e.config");
        std::fs::write(&config_path, "chanA L1 L1_R 5 4 10 YES 4096 64 10 6\n").unwrap();

        let rows = config::read_time_config(&config_path).unwrap();
        let list = Path::new("times_e2e");
        let requests: Vec<_> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                AnalysisRequest::from_time_row(i, row, list, Some((1000, 1064))).unwrap()
            })
            .collect();

        let mut errors = RunErrorLog::new();
        let results = run_batch(&BrokenEngine, &requests, &mut errors, None);

        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].outcome,
            Outcome::Failure(FAILURE_SENTINEL.to_string())
        );
        assert!(errors.entries().iter().any(|e| e.channel == "chanA"));

        let inputs = ReportInputs {
            list_path: list,
            time_results: &results,
            frequency_results: None,
            errors: &errors,
            command_line: "glitchsum -s 1000 -e 1064".to_string(),
        };
        let mut page = Vec::new();
        html::write(&mut page, &inputs).unwrap();
        let page = String::from_utf8(page).unwrap();

        assert!(page.contains("<tr><td>chanA</td><td>no results</td>"));
        assert!(page.contains("Errors:"));
        assert!(page.contains("chanA"));
    }
}
