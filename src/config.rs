//! Configuration table parsing
//!
//! A configuration file describes one analysis job per line. Fields are
//! separated by arbitrary whitespace, blank lines are skipped, and a `#`
//! ANYWHERE on a line discards the entire line. That last rule is literal
//! and deliberate: there is no support for trailing inline comments, a data
//! line that also contains `#` is thrown away wholesale. Keep comments on
//! their own lines.
//!
//! Two schemas exist:
//!
//! - **Time domain** (11 fields): channel, IFO, frame type, threshold,
//!   variables, highpass cutoff, whitening (`YES`/anything else), resample
//!   rate, segment size, components, max clusters.
//! - **Frequency domain** (7 fields): channel, IFO, frame type, variables,
//!   segment size, components, max clusters.
//!
//! No type coercion happens here; every field stays a string. Numeric and
//! boolean interpretation is done once when the typed engine request is
//! built, so a typo in row 7's threshold fails the run before any job is
//! dispatched rather than halfway through the batch.

use crate::error::ConfigError;
use std::path::Path;

const TIME_FIELDS: usize = 11;
const FREQUENCY_FIELDS: usize = 7;

/// One time-domain configuration row, fields still unparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeChannelConfig {
    pub channel: String,
    pub ifo: String,
    pub frame_type: String,
    pub threshold: String,
    pub variables: String,
    pub highpass_cutoff: String,
    pub whitening: String,
    pub resample_rate: String,
    pub segment_size: String,
    pub components: String,
    pub max_clusters: String,
}

/// One frequency-domain configuration row, fields still unparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyChannelConfig {
    pub channel: String,
    pub ifo: String,
    pub frame_type: String,
    pub variables: String,
    pub segment_size: String,
    pub components: String,
    pub max_clusters: String,
}

/// Split a config file into per-row field vectors, applying the skip rules.
fn data_rows(path: &Path) -> Result<Vec<Vec<String>>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let rows: Vec<Vec<String>> = text
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.contains('#'))
        .map(|line| line.split_whitespace().map(str::to_string).collect())
        .collect();

    if rows.is_empty() {
        return Err(ConfigError::EmptyConfiguration(path.to_path_buf()));
    }
    Ok(rows)
}

fn check_width(
    path: &Path,
    row: usize,
    fields: &[String],
    expected: usize,
) -> Result<(), ConfigError> {
    if fields.len() < expected {
        return Err(ConfigError::MalformedRow {
            path: path.to_path_buf(),
            row,
            expected,
            found: fields.len(),
        });
    }
    Ok(())
}

/// Parse a time-domain configuration table.
pub fn read_time_config<P: AsRef<Path>>(path: P) -> Result<Vec<TimeChannelConfig>, ConfigError> {
    let path = path.as_ref();
    let mut configs = Vec::new();
    for (row, fields) in data_rows(path)?.into_iter().enumerate() {
        check_width(path, row, &fields, TIME_FIELDS)?;
        let mut it = fields.into_iter();
        configs.push(TimeChannelConfig {
            channel: it.next().unwrap(),
            ifo: it.next().unwrap(),
            frame_type: it.next().unwrap(),
            threshold: it.next().unwrap(),
            variables: it.next().unwrap(),
            highpass_cutoff: it.next().unwrap(),
            whitening: it.next().unwrap(),
            resample_rate: it.next().unwrap(),
            segment_size: it.next().unwrap(),
            components: it.next().unwrap(),
            max_clusters: it.next().unwrap(),
        });
    }
    Ok(configs)
}

/// Parse a frequency-domain configuration table.
pub fn read_frequency_config<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<FrequencyChannelConfig>, ConfigError> {
    let path = path.as_ref();
    let mut configs = Vec::new();
    for (row, fields) in data_rows(path)?.into_iter().enumerate() {
        check_width(path, row, &fields, FREQUENCY_FIELDS)?;
        let mut it = fields.into_iter();
        configs.push(FrequencyChannelConfig {
            channel: it.next().unwrap(),
            ifo: it.next().unwrap(),
            frame_type: it.next().unwrap(),
            variables: it.next().unwrap(),
            segment_size: it.next().unwrap(),
            components: it.next().unwrap(),
            max_clusters: it.next().unwrap(),
        });
    }
    Ok(configs)
}

/// Verify that the two domains' tables pair up row by row.
///
/// The report joins time and frequency results purely by index, so both
/// tables must list the same channels in the same order. Anything else
/// would silently attach one channel's frequency links to another channel's
/// row, so we fail fast instead.
pub fn check_alignment(
    time: &[TimeChannelConfig],
    frequency: &[FrequencyChannelConfig],
) -> Result<(), ConfigError> {
    if time.len() != frequency.len() {
        return Err(ConfigError::DomainMisalignment(format!(
            "{} time rows vs {} frequency rows",
            time.len(),
            frequency.len()
        )));
    }
    for (row, (t, f)) in time.iter().zip(frequency).enumerate() {
        if t.channel != f.channel {
            return Err(ConfigError::DomainMisalignment(format!(
                "row {}: time channel {} vs frequency channel {}",
                row, t.channel, f.channel
            )));
        }
    }
    Ok(())
}
