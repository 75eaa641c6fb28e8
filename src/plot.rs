//! Lock-segment timeline rendering
//!
//! Draws the occupancy strip embedded at the top of the summary page: a
//! 1500x160 PNG where green spans mark locked segments and the red
//! background shows everything else. The no-data marker renders as an
//! all-red strip, which is still a valid image rather than an error.
//!
//! The output must be byte-stable for identical inputs (the page is
//! regenerated by cron and diffed), so nothing time- or environment-
//! dependent goes into the pixels.

use crate::error::PlotError;
use crate::segments::SegmentList;
use plotters::prelude::*;
use std::path::Path;

pub const IMAGE_WIDTH: u32 = 1500;
pub const DPI: u32 = 80;
pub const IMAGE_HEIGHT: u32 = 2 * DPI;

/// Vertical pixels reserved under the strip for tick labels.
const LABEL_AREA: u32 = 30;

const UNLOCKED: RGBColor = RGBColor(255, 120, 120);
const LOCKED: RGBColor = RGBColor(0, 160, 0);

/// Tick positions across `[start, end]`.
///
/// One tick per step, where the step is the window split over the device
/// columns (image width in DPI units, minus one). A degenerate window
/// (`start >= end`, or a window shorter than the column count) falls back
/// to a single tick at `start` instead of a zero-step loop.
pub fn tick_positions(start: i64, end: i64) -> Vec<i64> {
    let columns = (IMAGE_WIDTH / DPI) as i64;
    let step = (end - start) / (columns - 1);
    if step <= 0 {
        return vec![start];
    }
    (start..end).step_by(step as usize).collect()
}

/// Render the occupancy strip for `list` over `[start, end]` to a PNG.
pub fn render_timeline<P: AsRef<Path>>(
    list: &SegmentList,
    window: (i64, i64),
    out_path: P,
) -> Result<(), PlotError> {
    let (start, end) = window;
    let backend = |e: &dyn std::fmt::Display| PlotError::Backend(e.to_string());

    let root = BitMapBackend::new(out_path.as_ref(), (IMAGE_WIDTH, IMAGE_HEIGHT))
        .into_drawing_area();
    root.fill(&WHITE).map_err(|e| backend(&e))?;

    let strip_height = IMAGE_HEIGHT - LABEL_AREA;
    let (strip, labels) = root.split_vertically(strip_height as i32);
    strip.fill(&UNLOCKED).map_err(|e| backend(&e))?;

    let span = end.saturating_sub(start);
    let to_x = |t: i64| -> i32 {
        if span <= 0 {
            return 0;
        }
        let frac = (t - start) as f64 / span as f64;
        (frac * (IMAGE_WIDTH - 1) as f64).round() as i32
    };

    // Locked spans, clipped to the window, full vertical extent.
    if let SegmentList::Spans(spans) = list {
        for segment in spans {
            let lo = segment.lo.max(start);
            let hi = segment.hi.min(end);
            if lo > hi || span <= 0 {
                continue;
            }
            strip
                .draw(&Rectangle::new(
                    [(to_x(lo), 0), (to_x(hi), strip_height as i32)],
                    LOCKED.filled(),
                ))
                .map_err(|e| backend(&e))?;
        }
    }

    // Ticks and their literal GPS values.
    let tick_font = ("sans-serif", 12).into_font().color(&BLACK);
    for tick in tick_positions(start, end) {
        let x = to_x(tick);
        labels
            .draw(&PathElement::new(vec![(x, 0), (x, 5)], BLACK))
            .map_err(|e| backend(&e))?;
        labels
            .draw(&Text::new(tick.to_string(), (x + 2, 8), tick_font.clone()))
            .map_err(|e| backend(&e))?;
    }

    root.present().map_err(|e| backend(&e))?;
    Ok(())
}
