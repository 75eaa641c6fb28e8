use clap::Parser;
use glitchsum::config::{check_alignment, read_frequency_config, read_time_config};
use glitchsum::engine::{AnalysisRequest, CommandEngine};
use glitchsum::report::{self, config_copy_name, lock_plot_name, ReportInputs};
use glitchsum::runner::{run_batch, RunErrorLog};
use glitchsum::segdb::{SegdbClient, SegmentSource};
use glitchsum::segments::{self, SegmentList};
use glitchsum::{plot, Outcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "glitchsum")]
#[command(author, version, about = "Run per-channel glitch analysis over a GPS window and build a summary page")]
struct Args {
    /// List file containing tab separated GPS segment times
    #[arg(short, long)]
    list: Option<PathBuf>,

    /// GPS time start (requires --end)
    #[arg(short, long)]
    start: Option<i64>,

    /// GPS time end (requires --start)
    #[arg(short, long)]
    end: Option<i64>,

    /// Time domain configuration file
    #[arg(short = 't', long)]
    time_config: PathBuf,

    /// Frequency domain configuration file (optional; enables the
    /// frequency columns in the summary table)
    #[arg(short = 'f', long)]
    frequency_config: Option<PathBuf>,

    /// Name for output artifacts when using --start/--end
    #[arg(short, long)]
    name: Option<String>,

    /// Directory for the summary page and its img/ and misc/ subdirectories
    #[arg(short, long, default_value = "glitchsum-reports")]
    output_dir: PathBuf,

    /// External analysis engine executable
    #[arg(long, default_value = "pcat")]
    engine: PathBuf,

    /// Segment database base URL
    #[arg(long, default_value = "https://segdb-er.ligo.caltech.edu")]
    segdb_url: String,

    /// Per-job timeout budget in seconds (unlimited when omitted)
    #[arg(long)]
    job_timeout: Option<u64>,

    /// Don't prompt to open the summary page
    #[arg(long)]
    no_open: bool,

    /// Only print errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();

    if args.list.is_none() && !(args.start.is_some() && args.end.is_some()) {
        eprintln!("Either a list of times or start and end GPS times have to be supplied.");
        eprintln!("Re-run with --help for usage.");
        std::process::exit(1);
    }

    match run(args) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let command_line: String = std::env::args().collect::<Vec<_>>().join(" ");

    std::fs::create_dir_all(args.output_dir.join("img"))?;
    std::fs::create_dir_all(args.output_dir.join("misc"))?;

    // Resolve the run window and the times list. An explicit window without
    // a list means the segment database decides what is worth analyzing.
    let window = match (args.start, args.end) {
        (Some(start), Some(end)) => Some((start, end)),
        _ => None,
    };

    let (times_list, plot_window) = match &args.list {
        Some(list) => {
            let segments = segments::read_list(list)?;
            // Explicit bounds win; otherwise the list's extent is the window.
            let plot_window = window
                .or_else(|| segments.window())
                .ok_or("times list is empty and no --start/--end were given")?;
            (list.clone(), plot_window)
        }
        None => {
            // Window resolution above guarantees both bounds here.
            let (start, end) = window.ok_or("missing --start/--end")?;
            let out_name = args
                .name
                .clone()
                .unwrap_or_else(|| format!("{}-{}", start, end));
            let times_list = args.output_dir.join(&out_name);

            if !args.quiet {
                eprintln!("Retrieving locked segments...");
            }
            let segdb = SegdbClient::new(&args.segdb_url);
            let locked = segdb.locked_segments(start, end)?;
            segments::write_list(&times_list, &locked, (start, end))?;

            if locked.is_empty() {
                // Nothing to analyze; still produce the (all red) lock plot
                // so the dashboard shows the window was checked.
                let plot_path = args
                    .output_dir
                    .join("img")
                    .join(lock_plot_name(&times_list));
                plot::render_timeline(&locked, (start, end), &plot_path)?;
                if !args.quiet {
                    eprintln!("No segments available for GPS {} to {}.", start, end);
                }
                return Ok(());
            }
            (times_list, (start, end))
        }
    };

    // Copy the configuration file(s) next to the page they configured.
    let misc = args.output_dir.join("misc");
    std::fs::copy(
        &args.time_config,
        misc.join(config_copy_name(&times_list, "time")),
    )?;
    if let Some(ref freq_config) = args.frequency_config {
        std::fs::copy(
            freq_config,
            misc.join(config_copy_name(&times_list, "frequency")),
        )?;
    }

    // Parse configurations up front: a malformed table fails the run before
    // any engine invocation.
    let time_rows = read_time_config(&args.time_config)?;
    let frequency_rows = match &args.frequency_config {
        Some(path) => {
            let rows = read_frequency_config(path)?;
            check_alignment(&time_rows, &rows)?;
            Some(rows)
        }
        None => None,
    };

    let time_requests: Vec<AnalysisRequest> = time_rows
        .iter()
        .enumerate()
        .map(|(row, config)| AnalysisRequest::from_time_row(row, config, &times_list, window))
        .collect::<Result<_, _>>()?;
    let frequency_requests: Option<Vec<AnalysisRequest>> = frequency_rows
        .as_ref()
        .map(|rows| {
            rows.iter()
                .enumerate()
                .map(|(row, config)| AnalysisRequest::from_frequency_row(row, config, &times_list))
                .collect::<Result<_, _>>()
        })
        .transpose()?;

    let total_jobs =
        time_requests.len() + frequency_requests.as_ref().map_or(0, |r| r.len());
    if !args.quiet {
        eprintln!("Running {} analysis job(s)...", total_jobs);
    }

    let progress = if !args.quiet {
        let pb = ProgressBar::new(total_jobs as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let engine = CommandEngine::new(&args.engine)
        .with_timeout(args.job_timeout.map(Duration::from_secs));
    let mut errors = RunErrorLog::new();

    let time_results = run_batch(&engine, &time_requests, &mut errors, progress.as_ref());
    let frequency_results = frequency_requests
        .as_ref()
        .map(|requests| run_batch(&engine, requests, &mut errors, progress.as_ref()));

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let inputs = ReportInputs {
        list_path: &times_list,
        time_results: &time_results,
        frequency_results: frequency_results.as_deref(),
        errors: &errors,
        command_line,
    };
    let page = report::generate(&args.output_dir, &inputs)?;

    let plot_path = args
        .output_dir
        .join("img")
        .join(lock_plot_name(&times_list));
    let analyzed = match segments::read_list(&times_list) {
        Ok(list) => list,
        // Windowed list-driven runs may analyze a list we did not write;
        // fall back to an empty strip rather than failing after the batch.
        Err(_) => SegmentList::NoData,
    };
    plot::render_timeline(&analyzed, plot_window, &plot_path)?;

    if !args.quiet {
        let failed = time_results
            .iter()
            .chain(frequency_results.iter().flatten())
            .filter(|r| matches!(r.outcome, Outcome::Failure(_)))
            .count();
        eprintln!("{}", "-".repeat(40));
        eprintln!(
            "Done! {} of {} job(s) failed. Summary at:\n{}",
            failed,
            total_jobs,
            page.display()
        );
    }

    if !args.no_open && !args.quiet {
        eprint!("\nOpen summary page in browser? [Y/n] ");
        io::stderr().flush().ok();
        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_ok() {
            let input = input.trim().to_lowercase();
            if input.is_empty() || input == "y" || input == "yes" {
                if let Err(e) = open::that(&page) {
                    eprintln!("Failed to open summary page: {}", e);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_require_config() {
        // --time-config is mandatory whatever else is supplied.
        assert!(Args::try_parse_from(["glitchsum", "--list", "times"]).is_err());
        assert!(Args::try_parse_from([
            "glitchsum",
            "--list",
            "times",
            "--time-config",
            "time.config"
        ])
        .is_ok());
    }

    #[test]
    fn test_windowed_args_parse() {
        let args = Args::try_parse_from([
            "glitchsum",
            "-s",
            "1090221815",
            "-e",
            "1090222285",
            "-t",
            "time.config",
            "-f",
            "freq.config",
            "--job-timeout",
            "3600",
        ])
        .unwrap();
        assert_eq!(args.start, Some(1090221815));
        assert_eq!(args.end, Some(1090222285));
        assert_eq!(args.job_timeout, Some(3600));
        assert!(args.frequency_config.is_some());
    }
}
