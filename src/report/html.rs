//! HTML rendering of the summary page

use crate::plot::{IMAGE_HEIGHT, IMAGE_WIDTH};
use crate::report::{config_copy_name, list_name, lock_plot_name, ReportInputs};
use crate::runner::ChannelResult;
use chrono::Local;
use std::io::{self, Write};

/// Write the complete summary page.
pub fn write<W: Write>(writer: &mut W, inputs: &ReportInputs) -> io::Result<()> {
    let name = list_name(inputs.list_path);

    // The plot links to the analyzed-interval dump of the first channel
    // that produced results; with nothing successful it is a plain image.
    let interval_href = inputs
        .time_results
        .iter()
        .find_map(|r| r.outcome.location())
        .map(|loc| format!("{}Analyzed_interval.txt", loc))
        .unwrap_or_default();

    write!(
        writer,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Summary - {name}</title>
    <link rel="stylesheet" type="text/css" href="../../style/main.css">
</head>
<body>
    <div class="banner"><big><b>Summary Page - {name}</b></big></div>
    <div align="center">
        <a href="{interval_href}"><img src="./img/{plot}" alt="{name} lock plot" width="{img_w}" height="{img_h}"></a>
    </div>
    <br>
    <table border="1" cellpadding="2" cellspacing="2" align="center">
"#,
        name = escape(&name),
        interval_href = escape(&interval_href),
        plot = lock_plot_name(inputs.list_path),
        img_w = IMAGE_WIDTH * 3 / 4,
        img_h = IMAGE_HEIGHT * 3 / 4,
    )?;

    match inputs.frequency_results {
        Some(frequency) => {
            writeln!(
                writer,
                "    <tr><th>Channel name</th><th>Time Domain</th><th>Glitchgram</th>\
                 <th>Time Domain parameters</th><th>Frequency Domain</th>\
                 <th>Frequency Domain parameters</th></tr>"
            )?;
            for (index, result) in inputs.time_results.iter().enumerate() {
                writeln!(
                    writer,
                    "    <tr><td>{}</td>{}{}</tr>",
                    escape(&result.channel),
                    time_cells(result),
                    frequency.get(index).map(frequency_cells).unwrap_or_default()
                )?;
            }
        }
        None => {
            writeln!(
                writer,
                "    <tr><th>Channel name</th><th>Time Domain</th><th>Glitchgram</th>\
                 <th>Time Domain parameters</th></tr>"
            )?;
            for result in inputs.time_results {
                writeln!(
                    writer,
                    "    <tr><td>{}</td>{}</tr>",
                    escape(&result.channel),
                    time_cells(result)
                )?;
            }
        }
    }
    writeln!(writer, "    </table>")?;

    // Links to the configuration copies under misc/.
    match inputs.frequency_results {
        Some(_) => writeln!(
            writer,
            r#"    <p>Configuration files: <a href="./misc/{}">time</a>, <a href="./misc/{}">frequency</a></p>"#,
            config_copy_name(inputs.list_path, "time"),
            config_copy_name(inputs.list_path, "frequency"),
        )?,
        None => writeln!(
            writer,
            r#"    <p><a href="./misc/{}">Configuration file</a></p>"#,
            config_copy_name(inputs.list_path, "time"),
        )?,
    }

    writeln!(
        writer,
        "    <p>Original command:<br>{}</p>",
        escape(&inputs.command_line)
    )?;

    // Errors block: appended only when something actually failed.
    if !inputs.errors.is_empty() {
        writeln!(writer, "    <p><b>Errors:</b><br>")?;
        for entry in inputs.errors.entries() {
            writeln!(
                writer,
                "    - {}: error processing channel: {}, error:<br>\n      {}<br>",
                entry.domain,
                escape(&entry.channel),
                escape(&entry.message)
            )?;
        }
        writeln!(writer, "    </p>")?;
    }

    write!(
        writer,
        "    <p class=\"footer\">Generated by glitchsum on {}</p>\n</body>\n</html>\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    Ok(())
}

/// Time-domain cells: result, glitchgram and parameters links on success,
/// a "no results" marker with empty cells otherwise.
fn time_cells(result: &ChannelResult) -> String {
    match result.outcome.location() {
        Some(loc) => format!(
            r#"<td><a href="{loc}">Results</a></td><td><a href="{loc}Glitchgram.html">glitchgram</a></td><td><a href="{loc}parameters.txt">parameters</a></td>"#,
            loc = escape(loc)
        ),
        None => "<td>no results</td><td> </td><td> </td>".to_string(),
    }
}

/// Frequency-domain cells: result and parameters links on success.
fn frequency_cells(result: &ChannelResult) -> String {
    match result.outcome.location() {
        Some(loc) => format!(
            r#"<td><a href="{loc}">Results</a></td><td><a href="{loc}parameters.txt">parameters</a></td>"#,
            loc = escape(loc)
        ),
        None => "<td>no results</td><td> </td>".to_string(),
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
