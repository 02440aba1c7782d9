//! Running the batch on a background task with progress, report and Ctrl+C handling.

use std::fs::File;
use std::io::BufWriter;

use stockmeta_core::{
    AnnotationStatus, BatchEvent, BatchSummary, CancellationToken, ReportWriter,
};

use super::{AnnotateArgs, AnnotateContext};

/// Run the batch and print the summary.
///
/// The first Ctrl+C asks the runner to stop after the current image; a
/// second one aborts the task.
pub async fn run(ctx: AnnotateContext, args: &AnnotateArgs) -> anyhow::Result<()> {
    let AnnotateContext {
        mut runner,
        paths,
        report_format,
    } = ctx;

    let report = match &args.report {
        Some(path) => Some(ReportWriter::new(
            BufWriter::new(File::create(path)?),
            report_format,
        )),
        None => None,
    };

    let total = paths.len();
    let progress = create_progress_bar(total as u64);
    let cancel = CancellationToken::new();

    let task_progress = progress.clone();
    let task_cancel = cancel.clone();
    let mut handle = tokio::spawn(async move {
        let mut report = report;
        let mut report_error = None;
        let summary = runner
            .run(&paths, &task_cancel, |event| match event {
                BatchEvent::Started { path, .. } => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    task_progress.set_message(name);
                }
                BatchEvent::Finished(record) => {
                    if record.status != AnnotationStatus::Cancelled {
                        task_progress.inc(1);
                    }
                    if let Some(writer) = report.as_mut() {
                        if let Err(e) = writer.push(record) {
                            if report_error.is_none() {
                                report_error = Some(e);
                            }
                        }
                    }
                }
            })
            .await;
        (summary, report, report_error)
    });

    let joined = tokio::select! {
        joined = &mut handle => joined,
        _ = tokio::signal::ctrl_c() => {
            progress.println("Stopping after the current image (press Ctrl+C again to abort)...");
            tracing::info!("Stop requested");
            cancel.cancel();
            tokio::select! {
                joined = &mut handle => joined,
                _ = tokio::signal::ctrl_c() => {
                    handle.abort();
                    progress.abandon_with_message("aborted");
                    anyhow::bail!("Aborted; the image in progress may not have been written");
                }
            }
        }
    };
    let (summary, report, report_error) =
        joined.map_err(|e| anyhow::anyhow!("Annotation task failed: {e}"))?;

    if summary.cancelled {
        progress.abandon_with_message("stopped");
    } else {
        progress.finish_with_message("done");
    }

    if let Some(e) = report_error {
        tracing::error!("Failed to write report: {e}");
    }
    if let (Some(writer), Some(path)) = (report, &args.report) {
        let images = writer.records_written();
        writer.finish(&summary)?;
        tracing::info!("Report with {images} image(s) written to {:?}", path);
    }

    print_summary(&summary, total, args.dry_run);
    Ok(())
}

fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after the batch.
fn print_summary(summary: &BatchSummary, total: usize, dry_run: bool) {
    let elapsed = summary.elapsed_ms as f64 / 1000.0;
    let not_started = (total as u64).saturating_sub(summary.processed);

    eprintln!();
    eprintln!("  ====================================");
    if summary.cancelled {
        eprintln!("          Summary (stopped)");
    } else if dry_run {
        eprintln!("          Summary (dry run)");
    } else {
        eprintln!("               Summary");
    }
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", summary.succeeded);
    eprintln!("    Failed:       {:>8}", summary.failed);
    if not_started > 0 {
        eprintln!("    Not started:  {:>8}", not_started);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", summary.processed);
    if summary.usage.total > 0 {
        eprintln!("    Tokens:       {:>8}", summary.usage.total);
    }
    eprintln!("    Duration:     {:>7.1}s", elapsed);
    eprintln!("  ====================================");
    eprintln!();
}
