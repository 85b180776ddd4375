use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use adforge_lib::output::{WorkspaceSummary, ADFORGE_OUTPUT_VERSION};
use adforge_lib::{AdforgeOutput, ErrorOutput, ForgeError};

use crate::cli::OutputFormat;

/// Write output in the requested format.
pub fn write_output(
    body: &AdforgeOutput,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => write_json_output(body, output.as_deref())?,
        OutputFormat::Pretty => write_pretty_output(body, output.as_deref())?,
    };
    Ok(())
}

/// Writes a command result and maps it to an exit code.
pub fn finish(
    result: Result<AdforgeOutput, ForgeError>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> ExitCode {
    let body = match result {
        Ok(body) => body,
        Err(err) => return render_error(err, format, output),
    };
    if let Err(err) = write_output(&body, format, output.clone()) {
        return render_error(ForgeError::Storage(err.to_string()), format, output);
    }
    exit_code_for(&body)
}

/// Render an error and return the appropriate exit code.
pub fn render_error(err: ForgeError, format: OutputFormat, output: Option<PathBuf>) -> ExitCode {
    let error_payload = err.to_payload();
    let payload = AdforgeOutput::Error(ErrorOutput {
        version: ADFORGE_OUTPUT_VERSION.to_string(),
        message: Some(error_payload.message.clone()),
        error: error_payload,
    });

    match format {
        OutputFormat::Json => {
            let content =
                serde_json::to_string(&payload).unwrap_or_else(|_| "{\"mode\":\"error\"}".into());
            if let Some(path) = output {
                if let Err(write_err) = std::fs::write(&path, &content) {
                    eprintln!("Failed to write error output: {}", write_err);
                    println!("{content}");
                }
            } else {
                println!("{content}");
            }
        }
        OutputFormat::Pretty => {
            if let Err(write_err) = write_pretty_output(&payload, output.as_deref()) {
                eprintln!("Failed to write error output: {}", write_err);
            }
        }
    };

    // Exit code 2 is fatal; partial export failures use 1.
    ExitCode::from(2)
}

/// 1 when an export finished with failed items, success otherwise.
pub fn exit_code_for(body: &AdforgeOutput) -> ExitCode {
    match body {
        AdforgeOutput::Export(out) if !out.report.is_success() => ExitCode::from(1),
        _ => ExitCode::SUCCESS,
    }
}

fn write_json_output(
    body: &AdforgeOutput,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string(body)?;
    if let Some(path) = output {
        std::fs::write(path, content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

fn write_pretty_output(body: &AdforgeOutput, output: Option<&Path>) -> io::Result<()> {
    let stdout_is_tty = std::io::stdout().is_terminal();
    let use_human = output.is_none() && stdout_is_tty;

    if use_human {
        let content = format_pretty(body, true);
        println!("{content}");
        return Ok(());
    }

    // Non-tty or file output: keep JSON shape for pipelines/files.
    let content =
        serde_json::to_string_pretty(body).unwrap_or_else(|_| "{\"mode\":\"error\"}".to_string());
    if let Some(path) = output {
        std::fs::write(path, &content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &AdforgeOutput, colorize: bool) -> String {
    let mut buf = String::new();
    match body {
        AdforgeOutput::Generate(out) => {
            let header = color("[GENERATE]", "36", colorize);
            writeln!(buf, "{} {} generation finished", header, out.generation).ok();
            for creative in &out.creatives {
                writeln!(buf, "- {} {}", creative.id, creative.title).ok();
            }
            if let Some(carousel) = &out.carousel {
                writeln!(buf, "Carousel {} ({} slides)", carousel.id, carousel.slides.len()).ok();
            }
            write_workspace(&mut buf, &out.workspace, colorize);
        }
        AdforgeOutput::Workspace(out) => {
            let header = color("[WORKSPACE]", "34", colorize);
            writeln!(buf, "{} {}", header, out.action).ok();
            if let Some(detail) = &out.detail {
                writeln!(buf, "{detail}").ok();
            }
            write_workspace(&mut buf, &out.workspace, colorize);
        }
        AdforgeOutput::Preview(out) => {
            let (label, code) = if out.applied {
                ("APPLIED", "32")
            } else {
                ("PREVIEW", "33")
            };
            writeln!(buf, "{} {}", color(label, code, colorize), out.summary).ok();
            if !out.change.changed_fields.is_empty() {
                writeln!(buf, "Fields: {}", out.change.changed_fields.join(", ")).ok();
            }
            if !out.applied {
                writeln!(buf, "Re-run with --yes to apply.").ok();
            }
        }
        AdforgeOutput::Export(out) => {
            let status = if out.report.is_success() {
                color("OK", "32", colorize)
            } else {
                color("PARTIAL", "31", colorize)
            };
            writeln!(buf, "{} Exported {} file(s)", status, out.report.files.len()).ok();
            for file in &out.report.files {
                writeln!(buf, "- {:16} {}", file.name, file.path.display()).ok();
            }
            if !out.report.failures.is_empty() {
                writeln!(buf, "Failures:").ok();
                for failure in &out.report.failures {
                    writeln!(buf, "- slide {}: {}", failure.position, failure.message).ok();
                }
            }
        }
        AdforgeOutput::History(out) => {
            let header = color("[HISTORY]", "35", colorize);
            writeln!(buf, "{} {} ({} item(s))", header, out.action, out.items.len()).ok();
            for item in &out.items {
                writeln!(buf, "- {:9} {} {}", item.kind, item.id, item.label).ok();
            }
        }
        AdforgeOutput::Key(out) => {
            let header = color("[KEY]", "36", colorize);
            match (&out.source, &out.masked_key) {
                (Some(source), Some(masked)) if out.configured => {
                    writeln!(buf, "{} {} (from {})", header, masked, source).ok();
                }
                _ => {
                    writeln!(buf, "{} No API key configured", header).ok();
                }
            }
        }
        AdforgeOutput::Assist(out) => {
            let header = color("[ASSIST]", "36", colorize);
            writeln!(buf, "{} {}", header, out.task).ok();
            for (i, result) in out.results.iter().enumerate() {
                writeln!(buf, "{}. {}", i + 1, result).ok();
            }
        }
        AdforgeOutput::Error(out) => {
            let header = color("[ERROR]", "31", colorize);
            let message = out
                .message
                .as_deref()
                .unwrap_or_else(|| out.error.message.as_str());
            writeln!(buf, "{} {}", header, message).ok();
            if let Some(remediation) = &out.error.remediation {
                writeln!(buf, "Hint: {}", remediation).ok();
            }
        }
    }
    buf
}

fn write_workspace(buf: &mut String, summary: &WorkspaceSummary, colorize: bool) {
    match (&summary.active_kind, &summary.active_id) {
        (Some(kind), Some(id)) => {
            let title = summary.active_title.as_deref().unwrap_or("");
            writeln!(buf, "Active: {} {} {}", kind, color(id, "1", colorize), title).ok();
        }
        _ => {
            writeln!(buf, "Active: none").ok();
        }
    }
    if !summary.variation_ids.is_empty() {
        writeln!(buf, "Variations: {}", summary.variation_ids.join(", ")).ok();
    }
    for slide in &summary.slides {
        writeln!(buf, "  {:>2}. {} {}", slide.position, slide.id, slide.title).ok();
    }
    writeln!(
        buf,
        "Canvas: {} at zoom {:.2} (revision {})",
        summary.aspect_ratio, summary.preview_zoom, summary.revision
    )
    .ok();
}

/// Apply ANSI color codes when enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adforge_lib::export::{ExportFailure, ExportedFile};
    use adforge_lib::output::{AssistOutput, ExportOutput};
    use adforge_lib::{ErrorCategory, ExportReport};

    fn export_output(failed: bool) -> AdforgeOutput {
        let mut report = ExportReport {
            files: vec![ExportedFile {
                name: "slide-1.png".into(),
                path: PathBuf::from("/tmp/out/slide-1.png"),
                bytes: 10,
                slide_id: Some("slide-a".into()),
                position: Some(1),
            }],
            ..ExportReport::default()
        };
        if failed {
            report.failures.push(ExportFailure {
                slide_id: "slide-b".into(),
                position: 2,
                category: ErrorCategory::Render,
                message: "background image is not available".into(),
            });
            report.last_error = Some("background image is not available".into());
        }
        AdforgeOutput::Export(ExportOutput {
            version: ADFORGE_OUTPUT_VERSION.to_string(),
            report,
        })
    }

    #[test]
    fn render_error_always_returns_fatal_exit_code() {
        let code = render_error(
            ForgeError::Config("boom".to_string()),
            OutputFormat::Json,
            None,
        );
        assert_eq!(code, ExitCode::from(2));
    }

    #[test]
    fn partial_export_maps_to_exit_code_one() {
        assert_eq!(exit_code_for(&export_output(false)), ExitCode::SUCCESS);
        assert_eq!(exit_code_for(&export_output(true)), ExitCode::from(1));
    }

    #[test]
    fn format_pretty_lists_files_and_failures() {
        let pretty = format_pretty(&export_output(true), false);
        assert!(pretty.contains("PARTIAL Exported 1 file(s)"));
        assert!(pretty.contains("slide-1.png"));
        assert!(pretty.contains("slide 2: background image is not available"));
    }

    #[test]
    fn format_pretty_numbers_assist_results() {
        let body = AdforgeOutput::Assist(AssistOutput {
            version: ADFORGE_OUTPUT_VERSION.to_string(),
            task: "hooks".into(),
            results: vec!["Hook A".into(), "Hook B".into()],
        });
        let pretty = format_pretty(&body, false);
        assert!(pretty.contains("[ASSIST] hooks"));
        assert!(pretty.contains("2. Hook B"));
    }

    #[test]
    fn format_pretty_error_includes_hint() {
        let payload = ForgeError::validation("Provide the project context or the ad strategy.")
            .to_payload();
        let body = AdforgeOutput::Error(ErrorOutput {
            version: ADFORGE_OUTPUT_VERSION.to_string(),
            message: None,
            error: payload,
        });
        let pretty = format_pretty(&body, false);
        assert!(pretty.starts_with("[ERROR] Provide the project context"));
    }
}
