//! Lock segments and segment list files
//!
//! A segment is a closed GPS interval `[lo, hi]` during which the detector
//! was locked and its data is worth analyzing. Segment lists travel through
//! the pipeline in a plain text format: one `lo<TAB>hi` pair per line. A run
//! that found no locked time at all writes a single marker line instead, and
//! that marker is a distinguished state, not just an empty list: the timeline
//! renderer still draws a (fully red) plot for it.

use crate::error::SegmentError;
use std::io::Write;
use std::path::Path;

/// Marker line written when a segdb query returns nothing.
pub const NO_SEGMENTS_MARKER: &str = "No segments available for GPS";

/// Closed GPS interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub lo: i64,
    pub hi: i64,
}

impl Segment {
    pub fn new(lo: i64, hi: i64) -> Self {
        Self { lo, hi }
    }
}

/// Ordered list of locked segments, or the distinguished no-data state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentList {
    /// The segment database had nothing for the queried window.
    NoData,
    Spans(Vec<Segment>),
}

impl SegmentList {
    pub fn is_empty(&self) -> bool {
        match self {
            SegmentList::NoData => true,
            SegmentList::Spans(spans) => spans.is_empty(),
        }
    }

    /// Smallest window covering every segment, if there is any data.
    pub fn window(&self) -> Option<(i64, i64)> {
        match self {
            SegmentList::NoData => None,
            SegmentList::Spans(spans) => {
                let lo = spans.iter().map(|s| s.lo).min()?;
                let hi = spans.iter().map(|s| s.hi).max()?;
                Some((lo, hi))
            }
        }
    }
}

/// Intersect two ordered segment lists.
///
/// Used to combine multiple data-quality flags into "all of them locked at
/// once". Both inputs must be sorted by `lo`, which is how segdb returns
/// them and how `write_list` stores them.
pub fn intersect(a: &[Segment], b: &[Segment]) -> Vec<Segment> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let lo = a[i].lo.max(b[j].lo);
        let hi = a[i].hi.min(b[j].hi);
        if lo <= hi {
            out.push(Segment::new(lo, hi));
        }
        // Advance whichever interval ends first.
        if a[i].hi < b[j].hi {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

/// Read a segment list file (tab or space separated GPS pairs).
pub fn read_list<P: AsRef<Path>>(path: P) -> Result<SegmentList, SegmentError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| SegmentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if text.lines().next().is_some_and(|l| l.contains(NO_SEGMENTS_MARKER)) {
        return Ok(SegmentList::NoData);
    }

    let mut spans = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let entry = (|| {
            let lo: i64 = fields.next()?.parse().ok()?;
            let hi: i64 = fields.next()?.parse().ok()?;
            Some(Segment::new(lo, hi))
        })();
        match entry {
            Some(segment) => spans.push(segment),
            None => {
                return Err(SegmentError::BadEntry {
                    path: path.to_path_buf(),
                    line: line_no + 1,
                })
            }
        }
    }
    Ok(SegmentList::Spans(spans))
}

/// Write a segment list file, or the no-data marker for the given window.
pub fn write_list<P: AsRef<Path>>(
    path: P,
    list: &SegmentList,
    window: (i64, i64),
) -> Result<(), SegmentError> {
    let path = path.as_ref();
    let mut file = std::fs::File::create(path).map_err(|source| SegmentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let io_err = |source| SegmentError::Io {
        path: path.to_path_buf(),
        source,
    };

    match list {
        SegmentList::Spans(spans) if !spans.is_empty() => {
            for s in spans {
                writeln!(file, "{}\t{}", s.lo, s.hi).map_err(io_err)?;
            }
        }
        _ => {
            writeln!(file, "{} {} to {}", NO_SEGMENTS_MARKER, window.0, window.1)
                .map_err(io_err)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("glitchsum_segments_{}", name))
    }

    #[test]
    fn test_round_trip() {
        let path = temp_path("round_trip.txt");
        let list = SegmentList::Spans(vec![Segment::new(1000, 1010), Segment::new(1020, 1030)]);
        write_list(&path, &list, (1000, 1030)).unwrap();
        assert_eq!(read_list(&path).unwrap(), list);
    }

    #[test]
    fn test_no_data_marker() {
        let path = temp_path("no_data.txt");
        write_list(&path, &SegmentList::NoData, (1000, 2000)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("No segments available for GPS 1000 to 2000"));
        assert_eq!(read_list(&path).unwrap(), SegmentList::NoData);
    }

    #[test]
    fn test_empty_spans_written_as_marker() {
        let path = temp_path("empty_spans.txt");
        write_list(&path, &SegmentList::Spans(vec![]), (5, 9)).unwrap();
        assert_eq!(read_list(&path).unwrap(), SegmentList::NoData);
    }

    #[test]
    fn test_bad_entry() {
        let path = temp_path("bad_entry.txt");
        std::fs::write(&path, "1000\t1010\nnot a segment\n").unwrap();
        match read_list(&path) {
            Err(SegmentError::BadEntry { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected BadEntry, got {:?}", other),
        }
    }

    #[test]
    fn test_window() {
        let list = SegmentList::Spans(vec![Segment::new(1020, 1030), Segment::new(1000, 1010)]);
        assert_eq!(list.window(), Some((1000, 1030)));
        assert_eq!(SegmentList::NoData.window(), None);
    }

    #[test]
    fn test_intersect_overlapping() {
        let a = vec![Segment::new(0, 10), Segment::new(20, 30)];
        let b = vec![Segment::new(5, 25)];
        assert_eq!(
            intersect(&a, &b),
            vec![Segment::new(5, 10), Segment::new(20, 25)]
        );
    }

    #[test]
    fn test_intersect_disjoint() {
        let a = vec![Segment::new(0, 10)];
        let b = vec![Segment::new(11, 20)];
        assert!(intersect(&a, &b).is_empty());
    }

    #[test]
    fn test_intersect_three_way() {
        let a = vec![Segment::new(0, 100)];
        let b = vec![Segment::new(10, 50), Segment::new(60, 90)];
        let c = vec![Segment::new(40, 70)];
        let ab = intersect(&a, &b);
        assert_eq!(
            intersect(&ab, &c),
            vec![Segment::new(40, 50), Segment::new(60, 70)]
        );
    }
}
