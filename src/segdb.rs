//! Segment-database queries
//!
//! Windowed runs that were not handed an explicit times list ask the
//! segment database which stretches of the window were actually locked.
//! The service is external; we only speak its JSON query interface here.
//!
//! Flag selection is epoch dependent. Before the DC-readout flag existed
//! (GPS 1091836816) a lock is the intersection of the three subsystem
//! flags; afterwards a single flag covers it.

use crate::error::SegmentError;
use crate::segments::{intersect, Segment, SegmentList};
use serde::Deserialize;

/// First GPS time at which the combined DC-readout lock flag is defined.
pub const DC_READOUT_EPOCH: i64 = 1091836816;

const ARM_LOCK_FLAGS: [&str; 3] = [
    "L1:DMT-XARM_LOCK:1",
    "L1:DMT-YARM_LOCK:1",
    "L1:DMT-PRC_LOCK:1",
];
const DC_READOUT_FLAG: &str = "L1:DMT-DC_READOUT_LOCKED:1";

/// Supplies locked segments for a window. Implemented over HTTP in
/// production and with canned data in tests.
pub trait SegmentSource {
    fn locked_segments(&self, start: i64, end: i64) -> Result<SegmentList, SegmentError>;
}

/// Active spans of one data-quality flag, as the service returns them.
#[derive(Debug, Deserialize)]
struct FlagSegments {
    active: Vec<(i64, i64)>,
}

impl FlagSegments {
    fn into_spans(self) -> Vec<Segment> {
        self.active
            .into_iter()
            .map(|(lo, hi)| Segment::new(lo, hi))
            .collect()
    }
}

/// Blocking HTTP client for the segment database.
pub struct SegdbClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl SegdbClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn query_flag(&self, flag: &str, start: i64, end: i64) -> Result<Vec<Segment>, SegmentError> {
        let url = format!("{}/segments", self.base_url);
        let response: FlagSegments = self
            .client
            .get(url)
            .query(&[("flag", flag)])
            .query(&[("start", start), ("end", end)])
            .send()?
            .error_for_status()?
            .json()?;
        Ok(response.into_spans())
    }
}

/// Pick the epoch's flag set and combine the per-flag answers.
///
/// `query` resolves one flag to its active spans; separated from the HTTP
/// client so the combination rule can be tested with canned data.
fn combine_flags<F>(start: i64, mut query: F) -> Result<SegmentList, SegmentError>
where
    F: FnMut(&str) -> Result<Vec<Segment>, SegmentError>,
{
    let spans = if start < DC_READOUT_EPOCH {
        let mut combined = query(ARM_LOCK_FLAGS[0])?;
        for flag in &ARM_LOCK_FLAGS[1..] {
            combined = intersect(&combined, &query(flag)?);
        }
        combined
    } else {
        query(DC_READOUT_FLAG)?
    };

    if spans.is_empty() {
        Ok(SegmentList::NoData)
    } else {
        Ok(SegmentList::Spans(spans))
    }
}

impl SegmentSource for SegdbClient {
    fn locked_segments(&self, start: i64, end: i64) -> Result<SegmentList, SegmentError> {
        combine_flags(start, |flag| self.query_flag(flag, start, end))
    }
}
