//! External analysis engine boundary
//!
//! The numerical analysis itself lives outside this crate; we only build a
//! typed invocation request per configured channel and hand it to an
//! [`AnalysisEngine`]. Keeping the request structured (instead of gluing a
//! command string together) means field parsing happens exactly once, when
//! the request is built, and the argv is assembled in one place.
//!
//! Numeric fields are parsed here but never range-checked: whether a 10 Hz
//! highpass makes sense for a given channel is the engine's call.

use crate::config::{FrequencyChannelConfig, TimeChannelConfig};
use crate::error::{ConfigError, EngineFault};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Analysis mode; selects the configuration schema and invocation shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Time,
    Frequency,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Time => write!(f, "Time Domain"),
            Domain::Frequency => write!(f, "Frequency Domain"),
        }
    }
}

/// Extra parameters only the time-domain invocation carries.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeOptions {
    pub highpass_cutoff: f64,
    pub threshold: f64,
    /// Enabled only by the exact configuration value `YES`.
    pub whiten: bool,
    pub resample_rate: u32,
}

/// One fully built engine invocation. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub domain: Domain,
    pub channel: String,
    pub ifo: String,
    pub frame_type: String,
    pub list_path: PathBuf,
    pub segment_size: u32,
    pub variables: u32,
    pub components: u32,
    pub max_clusters: u32,
    pub time_options: Option<TimeOptions>,
    /// Explicit window bounds; present only for windowed (start/end) runs.
    pub window: Option<(i64, i64)>,
}

fn parse_field<T: std::str::FromStr>(
    row: usize,
    channel: &str,
    field: &'static str,
    value: &str,
) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidField {
        row,
        channel: channel.to_string(),
        field,
        value: value.to_string(),
    })
}

impl AnalysisRequest {
    /// Build the request for one time-domain row.
    ///
    /// `window` carries explicit start/end bounds for windowed runs; for
    /// list-driven runs it is `None` and the engine derives its own window
    /// from the list file.
    pub fn from_time_row(
        row: usize,
        config: &TimeChannelConfig,
        list_path: &Path,
        window: Option<(i64, i64)>,
    ) -> Result<Self, ConfigError> {
        let c = &config.channel;
        Ok(Self {
            domain: Domain::Time,
            channel: config.channel.clone(),
            ifo: config.ifo.clone(),
            frame_type: config.frame_type.clone(),
            list_path: list_path.to_path_buf(),
            segment_size: parse_field(row, c, "segment size", &config.segment_size)?,
            variables: parse_field(row, c, "variables", &config.variables)?,
            components: parse_field(row, c, "components", &config.components)?,
            max_clusters: parse_field(row, c, "max clusters", &config.max_clusters)?,
            time_options: Some(TimeOptions {
                highpass_cutoff: parse_field(row, c, "highpass cutoff", &config.highpass_cutoff)?,
                threshold: parse_field(row, c, "threshold", &config.threshold)?,
                whiten: config.whitening == "YES",
                resample_rate: parse_field(row, c, "resample rate", &config.resample_rate)?,
            }),
            window,
        })
    }

    /// Build the request for one frequency-domain row. Frequency runs are
    /// always list-driven; they never carry explicit window bounds.
    pub fn from_frequency_row(
        row: usize,
        config: &FrequencyChannelConfig,
        list_path: &Path,
    ) -> Result<Self, ConfigError> {
        let c = &config.channel;
        Ok(Self {
            domain: Domain::Frequency,
            channel: config.channel.clone(),
            ifo: config.ifo.clone(),
            frame_type: config.frame_type.clone(),
            list_path: list_path.to_path_buf(),
            segment_size: parse_field(row, c, "segment size", &config.segment_size)?,
            variables: parse_field(row, c, "variables", &config.variables)?,
            components: parse_field(row, c, "components", &config.components)?,
            max_clusters: parse_field(row, c, "max clusters", &config.max_clusters)?,
            time_options: None,
            window: None,
        })
    }

    /// Assemble the engine argv. Always silent, always reconstructing.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["--silent".to_string()];
        match self.domain {
            Domain::Time => args.push("--time".to_string()),
            Domain::Frequency => args.push("--frequency".to_string()),
        }
        if let Some(ref t) = self.time_options {
            if t.whiten {
                args.push("--whiten".to_string());
            }
        }
        args.extend([
            "--channel".to_string(),
            self.channel.clone(),
            "--IFO".to_string(),
            self.ifo.clone(),
            "--frame".to_string(),
            self.frame_type.clone(),
            "--list".to_string(),
            self.list_path.display().to_string(),
            "--size".to_string(),
            self.segment_size.to_string(),
        ]);
        if let Some(ref t) = self.time_options {
            args.extend([
                "--highpasscutoff".to_string(),
                t.highpass_cutoff.to_string(),
                "-t".to_string(),
                t.threshold.to_string(),
            ]);
        }
        args.extend([
            "-v".to_string(),
            self.variables.to_string(),
            "--components".to_string(),
            self.components.to_string(),
            "-m".to_string(),
            self.max_clusters.to_string(),
        ]);
        if let Some(ref t) = self.time_options {
            args.extend(["--resample".to_string(), t.resample_rate.to_string()]);
        }
        args.push("--reconstruct".to_string());
        if let Some((start, end)) = self.window {
            args.extend([
                "--glitchgram_start".to_string(),
                start.to_string(),
                "--glitchgram_end".to_string(),
                end.to_string(),
            ]);
        }
        args
    }
}

/// The per-channel analysis routine, seen only at its interface.
///
/// On success the engine hands back an opaque result location (a URL or
/// directory) which we pair with the channel and display, never interpret.
pub trait AnalysisEngine {
    fn run(&self, request: &AnalysisRequest) -> Result<String, EngineFault>;
}

/// Runs the engine as a subprocess, one blocking invocation per job.
///
/// A hung engine would otherwise stall the whole batch, so every invocation
/// gets a timeout budget; on expiry the child is killed and the job fails
/// with [`EngineFault::TimedOut`].
pub struct CommandEngine {
    program: PathBuf,
    timeout: Option<Duration>,
}

const POLL_INTERVAL: Duration = Duration::from_millis(200);

impl CommandEngine {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl AnalysisEngine for CommandEngine {
    fn run(&self, request: &AnalysisRequest) -> Result<String, EngineFault> {
        let mut child = Command::new(&self.program)
            .args(request.to_args())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EngineFault::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // With a budget, poll rather than block so the timeout can be
        // enforced without extra threads. The engine runs --silent, so its
        // stdout (a result location) fits the pipe buffer while we poll.
        if let Some(budget) = self.timeout {
            let started = Instant::now();
            while child.try_wait()?.is_none() {
                if started.elapsed() >= budget {
                    child.kill().ok();
                    child.wait().ok();
                    return Err(EngineFault::TimedOut(budget.as_secs()));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(EngineFault::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // The engine prints its result location as the last stdout line.
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .map(|l| l.trim().to_string())
            .ok_or(EngineFault::NoLocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn time_config(whitening: &str) -> TimeChannelConfig {
        TimeChannelConfig {
            channel: "L1:LSC-DARM_IN1_DQ".to_string(),
            ifo: "L1".to_string(),
            frame_type: "L1_R".to_string(),
            threshold: "4.5".to_string(),
            variables: "4".to_string(),
            highpass_cutoff: "10".to_string(),
            whitening: whitening.to_string(),
            resample_rate: "4096".to_string(),
            segment_size: "64".to_string(),
            components: "10".to_string(),
            max_clusters: "6".to_string(),
        }
    }

    #[test]
    fn test_whitening_exact_yes_only() {
        let list = Path::new("times.txt");
        for (value, expected) in [("YES", true), ("yes", false), ("NO", false), ("Y", false)] {
            let req =
                AnalysisRequest::from_time_row(0, &time_config(value), list, None).unwrap();
            assert_eq!(req.time_options.as_ref().unwrap().whiten, expected, "{value}");
            assert_eq!(req.to_args().contains(&"--whiten".to_string()), expected);
        }
    }

    #[test]
    fn test_windowed_request_carries_bounds() {
        let req = AnalysisRequest::from_time_row(
            0,
            &time_config("YES"),
            Path::new("times.txt"),
            Some((1000, 1064)),
        )
        .unwrap();
        let args = req.to_args();
        let start_pos = args.iter().position(|a| a == "--glitchgram_start").unwrap();
        assert_eq!(args[start_pos + 1], "1000");
        assert_eq!(args[args.iter().position(|a| a == "--glitchgram_end").unwrap() + 1], "1064");
    }

    #[test]
    fn test_list_driven_request_omits_bounds() {
        let req =
            AnalysisRequest::from_time_row(0, &time_config("NO"), Path::new("times.txt"), None)
                .unwrap();
        let args = req.to_args();
        assert!(!args.iter().any(|a| a.starts_with("--glitchgram")));
        assert!(args.contains(&"--time".to_string()));
        assert!(args.contains(&"--silent".to_string()));
        assert!(args.contains(&"--reconstruct".to_string()));
    }

    #[test]
    fn test_frequency_request_shape() {
        let config = FrequencyChannelConfig {
            channel: "L1:LSC-DARM_OUT_DQ".to_string(),
            ifo: "L1".to_string(),
            frame_type: "L1_R".to_string(),
            variables: "8192".to_string(),
            segment_size: "10".to_string(),
            components: "40".to_string(),
            max_clusters: "10".to_string(),
        };
        let req =
            AnalysisRequest::from_frequency_row(0, &config, Path::new("times.txt")).unwrap();
        let args = req.to_args();
        assert!(args.contains(&"--frequency".to_string()));
        assert!(!args.iter().any(|a| a == "--resample" || a == "--highpasscutoff"));
        assert!(req.time_options.is_none());
        assert!(req.window.is_none());
    }

    #[test]
    fn test_bad_numeric_field() {
        let mut config = time_config("NO");
        config.threshold = "five".to_string();
        match AnalysisRequest::from_time_row(3, &config, Path::new("times.txt"), None) {
            Err(ConfigError::InvalidField { row, field, value, .. }) => {
                assert_eq!(row, 3);
                assert_eq!(field, "threshold");
                assert_eq!(value, "five");
            }
            other => panic!("expected InvalidField, got {:?}", other),
        }
    }
}
