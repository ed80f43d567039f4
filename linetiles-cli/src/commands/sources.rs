//! `sources`: list the sources of a recording dump.

use std::path::PathBuf;

use clap::Args;
use console::style;
use linetiles::source::{editor_sources, RecordedSource, SourceDescriptor};

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct SourcesArgs {
    /// Recording dump (JSON)
    #[arg(long)]
    pub dump: PathBuf,

    /// Include recorder-internal sources and sources without a path
    #[arg(long)]
    pub all: bool,
}

pub fn run(args: SourcesArgs) -> Result<(), CliError> {
    let source = RecordedSource::from_file(&args.dump)?;
    let descriptors = source.descriptors();

    let shown: Vec<&SourceDescriptor> = if args.all {
        descriptors.iter().collect()
    } else {
        editor_sources(&descriptors).collect()
    };

    println!(
        "{} {}",
        style("Recording").bold(),
        style(source.recording_id()).cyan()
    );
    for descriptor in &shown {
        println!("  {}", describe(descriptor));
    }

    let hidden = descriptors.len() - shown.len();
    if hidden > 0 {
        println!(
            "{}",
            style(format!("({} hidden, use --all to show)", hidden)).dim()
        );
    }
    Ok(())
}

fn describe(descriptor: &SourceDescriptor) -> String {
    let path = descriptor
        .relative_path()
        .unwrap_or_else(|| "(no path)".to_string());
    let marker = if descriptor.is_internal() {
        " [internal]"
    } else {
        ""
    };
    format!("{:>6}  {}{}", descriptor.id.as_str(), path, marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let descriptor =
            SourceDescriptor::new("7", Some("https://example.com/src/app.js".to_string()));
        assert_eq!(describe(&descriptor), "     7  /src/app.js");

        let internal = SourceDescriptor::new("8", Some("record-replay-internal://x".to_string()));
        assert!(describe(&internal).ends_with("[internal]"));

        let bare = SourceDescriptor::new("9", None);
        assert!(describe(&bare).contains("(no path)"));
    }

    #[test]
    fn test_run_lists_dump() {
        let dir = tempfile::TempDir::new().unwrap();
        let dump = dir.path().join("dump.json");
        std::fs::write(
            &dump,
            r#"{"recording_id":"rec","sources":[{"id":"1","url":"https://a.com/x.js"}]}"#,
        )
        .unwrap();

        run(SourcesArgs { dump, all: false }).unwrap();
    }
}
