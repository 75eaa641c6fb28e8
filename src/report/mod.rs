//! Summary report synthesis
//!
//! One run produces one self-contained HTML page under the output
//! directory, next to two fixed subdirectories: `img/` for the lock plot
//! and `misc/` for copies of the configuration file(s) the run used. The
//! page is named after the times list (`{list_basename}.html`) so a cron
//! job producing one list per day yields one page per day.

pub mod html;

use crate::runner::{ChannelResult, RunErrorLog};
use std::io;
use std::path::{Path, PathBuf};

/// Everything the page is rendered from.
pub struct ReportInputs<'a> {
    /// Times list this run analyzed; its basename names the page.
    pub list_path: &'a Path,
    pub time_results: &'a [ChannelResult],
    pub frequency_results: Option<&'a [ChannelResult]>,
    pub errors: &'a RunErrorLog,
    /// Command line that produced this run, echoed for reproducibility.
    pub command_line: String,
}

/// Basename of the times list, used in every derived artifact name.
pub fn list_name(list_path: &Path) -> String {
    list_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "summary".to_string())
}

/// Name of the lock plot the page embeds from `img/`.
pub fn lock_plot_name(list_path: &Path) -> String {
    format!("lock-plot_{}.png", list_name(list_path))
}

/// Name of the configuration copy stored under `misc/`.
pub fn config_copy_name(list_path: &Path, domain_suffix: &str) -> String {
    format!("config_{}_{}.txt", list_name(list_path), domain_suffix)
}

/// Create the output layout (idempotent) and write the summary page.
pub fn generate(output_dir: &Path, inputs: &ReportInputs) -> io::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    std::fs::create_dir_all(output_dir.join("img"))?;
    std::fs::create_dir_all(output_dir.join("misc"))?;

    let page = output_dir.join(format!("{}.html", list_name(inputs.list_path)));
    let mut file = std::fs::File::create(&page)?;
    html::write(&mut file, inputs)?;
    Ok(page)
}
