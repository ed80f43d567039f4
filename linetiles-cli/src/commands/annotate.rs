//! `annotate`: fetch the hit counts of a line range and print gutter marks.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use linetiles::config::ConfigFile;
use linetiles::coordinator::{FetchCoordinator, RefetchPolicy};
use linetiles::gutter::{
    annotate, group_by_mark, line_to_editor, pending_annotations, request_visible, EditorRange,
    GutterMark, LineAnnotation,
};
use linetiles::report::{FloodGateReporter, Reporter, TracingReporter};
use linetiles::session::{Recording, SessionClient, SessionManager};
use linetiles::source::{MetadataSource, RecordedSource, SourceId};
use linetiles::tile::LineSpan;

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Args)]
pub struct AnnotateArgs {
    /// Recording dump (JSON)
    #[arg(long)]
    pub dump: PathBuf,

    /// Source id within the recording
    #[arg(long)]
    pub source: String,

    /// Lines to annotate, 1-based: "A-B" or "A" (default: the whole source)
    #[arg(long, value_parser = parse_line_range)]
    pub lines: Option<LineSpan>,

    /// Source text to print next to the marks
    #[arg(long)]
    pub text: Option<PathBuf>,

    /// Lines per tile (default from config)
    #[arg(long)]
    pub tile_size: Option<u32>,

    /// Simulated latency of each fetch, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub latency_ms: u64,

    /// Refetch policy: "missing" or "resolved" (default from config)
    #[arg(long)]
    pub refetch: Option<RefetchPolicy>,

    /// Log to stderr at debug level
    #[arg(long)]
    pub debug: bool,
}

pub fn run(args: AnnotateArgs) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(args.debug)?;
    runner.log_startup("annotate");

    let source = Arc::new(
        RecordedSource::from_file(&args.dump)?
            .with_latency(Duration::from_millis(args.latency_ms)),
    );
    let source_id = SourceId::new(args.source.clone());
    if !source.descriptors().iter().any(|d| d.id == source_id) {
        return Err(CliError::UnknownSource(args.source.clone()));
    }

    let text = args.text.as_deref().map(read_text).transpose()?;

    let runtime = runner.runtime()?;
    runtime.block_on(annotate_source(
        runner.config(),
        &args,
        source,
        source_id,
        text,
    ))
}

async fn annotate_source(
    config: &ConfigFile,
    args: &AnnotateArgs,
    source: Arc<RecordedSource>,
    source_id: SourceId,
    text: Option<Vec<String>>,
) -> Result<(), CliError> {
    let mut coordinator_config = config.coordinator_config();
    if let Some(tile_size) = args.tile_size {
        coordinator_config = coordinator_config.with_tile_size(tile_size);
    }
    if let Some(refetch) = args.refetch {
        coordinator_config = coordinator_config.with_refetch(refetch);
    }

    let reporter: Arc<dyn Reporter> = Arc::new(FloodGateReporter::with_window(
        TracingReporter,
        config.flood_window(),
    ));
    let coordinator = FetchCoordinator::new(coordinator_config, Arc::clone(&source), reporter)
        .map_err(|e| CliError::Config(e.to_string()))?;

    let sessions = SessionManager::new(config.session_config());
    let client: Arc<dyn SessionClient> = source.clone();
    sessions
        .start_sync(Recording::new(source.recording_id()), client)
        .await?;

    // Subscribed after connecting: only the stop event below should reset.
    let shutdown = CancellationToken::new();
    let follower = {
        let coordinator = coordinator.clone();
        let events = sessions.subscribe();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { coordinator.follow_session(events, shutdown).await })
    };

    let max_line = source
        .max_breakable_line(&source_id)
        .await
        .map_err(|_| CliError::UnknownSource(source_id.to_string()))?;

    let visible = visible_range(args.lines, max_line, text.as_ref().map(Vec::len))?;
    debug!(source = %source_id, visible = %visible, max_line = ?max_line, "Annotating");

    let spans = request_visible(&coordinator, &source_id, &[visible], max_line)?;
    if spans.is_empty() {
        println!(
            "{}",
            style(format!("No breakable lines in {}", visible.to_span())).dim()
        );
    } else {
        wait_with_spinner(&coordinator, &[visible]).await;
        let annotations = annotate(&coordinator, &source_id, &spans);
        print_annotations(&annotations, text.as_deref());
        print_summary(&annotations);
    }

    coordinator.log_stats();
    let stats = coordinator.stats();
    println!(
        "{}",
        style(format!(
            "{} fetch(es) issued, {} coalesced, {} failed",
            stats.fetches_issued, stats.coalesced, stats.fetches_failed
        ))
        .dim()
    );

    sessions.stop_sync();
    shutdown.cancel();
    // The follower only logs; a join error here means it panicked.
    if let Err(e) = follower.await {
        debug!(error = %e, "Session follower ended abnormally");
    }
    info!("Annotate complete");
    Ok(())
}

/// Editor range to annotate.
///
/// Without `--lines` the whole source is shown, bounded by whichever of the
/// highest breakable line and the text length is larger.
fn visible_range(
    lines: Option<LineSpan>,
    max_line: Option<u32>,
    text_len: Option<usize>,
) -> Result<EditorRange, CliError> {
    let span = match lines {
        Some(span) => span,
        None => {
            let text_end = text_len.map(|len| len.min(u32::MAX as usize) as u32);
            let end = max_line.max(text_end).unwrap_or(1).max(1);
            LineSpan::new(1, end)?
        }
    };
    Ok(EditorRange::new(
        line_to_editor(span.start),
        line_to_editor(span.end),
    )?)
}

async fn wait_with_spinner(coordinator: &FetchCoordinator<RecordedSource>, visible: &[EditorRange]) {
    if coordinator.outstanding_fetches() == 0 {
        return;
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!(
        "Fetching hit counts for {} line(s) in {} tile(s)...",
        pending_annotations(visible).len(),
        coordinator.outstanding_fetches()
    ));
    spinner.enable_steady_tick(Duration::from_millis(80));

    coordinator.wait_until_settled().await;
    spinner.finish_and_clear();
}

fn print_annotations(annotations: &[LineAnnotation], text: Option<&[String]>) {
    for annotation in annotations {
        let label = format!("{:>6}", annotation.mark.label());
        let label = match annotation.mark {
            GutterMark::Hits(_) => style(label).green().bold(),
            GutterMark::Pending => style(label).yellow(),
            GutterMark::NoData => style(label).dim(),
        };
        let source_line = text
            .and_then(|lines| lines.get(annotation.editor_line as usize))
            .map(String::as_str)
            .unwrap_or("");

        println!(
            "{} {} {} {}",
            style(format!("{:>5}", annotation.line)).dim(),
            label,
            style("│").dim(),
            source_line
        );
    }
}

fn print_summary(annotations: &[LineAnnotation]) {
    let groups = group_by_mark(annotations);
    let hit_lines: usize = groups
        .iter()
        .filter(|(mark, _)| matches!(mark, GutterMark::Hits(_)))
        .map(|(_, lines)| lines.len())
        .sum();
    let count = |mark: GutterMark| groups.get(&mark).map_or(0, Vec::len);

    println!();
    println!(
        "{} line(s): {} hit, {} without data, {} pending",
        annotations.len(),
        style(hit_lines).green(),
        count(GutterMark::NoData),
        count(GutterMark::Pending)
    );
}

fn read_text(path: &Path) -> Result<Vec<String>, CliError> {
    let content = fs::read_to_string(path).map_err(|error| CliError::FileRead {
        path: path.display().to_string(),
        error,
    })?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Parse `"A-B"` or `"A"` into a 1-based line span.
fn parse_line_range(s: &str) -> Result<LineSpan, String> {
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|_| format!("'{}' is not a line number", part.trim()))
    };

    let (from, to) = match s.split_once('-') {
        Some((from, to)) => (parse(from)?, parse(to)?),
        None => {
            let line = parse(s)?;
            (line, line)
        }
    };
    LineSpan::new(from, to).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_range() {
        assert_eq!(parse_line_range("3-9").unwrap(), LineSpan::new(3, 9).unwrap());
        assert_eq!(parse_line_range(" 4 - 4 ").unwrap(), LineSpan::single(4).unwrap());
        assert_eq!(parse_line_range("12").unwrap(), LineSpan::single(12).unwrap());
    }

    #[test]
    fn test_parse_line_range_rejects() {
        assert!(parse_line_range("0-3").is_err());
        assert!(parse_line_range("9-3").is_err());
        assert!(parse_line_range("a-3").is_err());
        assert!(parse_line_range("").is_err());
    }

    #[test]
    fn test_visible_range_from_lines() {
        let range = visible_range(Some(LineSpan::new(5, 8).unwrap()), Some(100), None).unwrap();
        assert_eq!((range.start, range.end), (4, 7));
    }

    #[test]
    fn test_visible_range_defaults_to_whole_source() {
        let range = visible_range(None, Some(20), Some(35)).unwrap();
        assert_eq!((range.start, range.end), (0, 34));

        let range = visible_range(None, Some(20), None).unwrap();
        assert_eq!((range.start, range.end), (0, 19));

        let range = visible_range(None, None, None).unwrap();
        assert_eq!((range.start, range.end), (0, 0));
    }

    #[test]
    fn test_read_text_missing_file() {
        let result = read_text(Path::new("/nonexistent/linetiles/source.rs"));
        assert!(matches!(result, Err(CliError::FileRead { .. })));
    }
}
