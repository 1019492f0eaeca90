use anyhow::{bail, Context, Result};
use clap::Parser;
use search_files::app::{self, events::UserEvent, helpers::lock_state, state::AppState};
use search_files::config::{self, Settings};
use search_files::core::{ColumnKind, ReportColumn, ReportSink, ResultTree, SessionStatus, WriterSink};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Find files below a directory by extension and name, and export their metadata.
///
/// Options left out fall back to the stored settings of the previous search.
#[derive(Debug, Parser)]
#[command(name = "search-files", version, about)]
struct Cli {
    /// Directory to search.
    root: Option<PathBuf>,

    /// Exact file extension, without the dot. Use "" to match every extension.
    #[arg(short, long)]
    extension: Option<String>,

    /// Substring the file name must contain.
    #[arg(short, long)]
    name: Option<String>,

    /// Match the name substring case-sensitively.
    #[arg(short, long)]
    case_sensitive: bool,

    /// Match the name substring ignoring case, overriding a stored setting.
    #[arg(short = 'i', long, conflicts_with = "case_sensitive")]
    case_insensitive: bool,

    /// Comma-separated report columns, e.g. "Path,Filename,File size".
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Print the results as a directory tree instead of a report.
    #[arg(long)]
    tree: bool,

    /// Keep the matches found so far when the search is interrupted.
    #[arg(long)]
    keep_partial: bool,

    /// Write the report to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Settings file to use instead of the platform default.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Remember this search and its columns for next time.
    #[arg(long)]
    save_settings: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings_path = match &cli.settings {
        Some(path) => Some(path.clone()),
        None => config::settings::get_config_file_path(),
    };
    // Only a run that saves its settings may create the settings file.
    let loaded = match &settings_path {
        Some(path) if cli.save_settings => config::settings::load_config(Some(path)),
        Some(path) => config::settings::read_config(path),
        None => Ok(Settings::default()),
    };
    let settings = loaded.unwrap_or_else(|e| {
        tracing::warn!("Using default settings: {:#}", e);
        Settings::default()
    });

    let mut state = AppState::new(settings, settings_path.filter(|_| cli.save_settings));
    state.keep_partial_results = cli.keep_partial;
    apply_overrides(&cli, &mut state.settings)?;
    let state = Arc::new(Mutex::new(state));

    let (proxy, mut events) = mpsc::unbounded_channel::<UserEvent>();
    app::commands::start_search(proxy.clone(), state.clone());

    let cancel_state = state.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Stopping search...");
            app::commands::cancel_search(&cancel_state);
        }
    });

    let (status, matches) = loop {
        match events.recv().await {
            Some(UserEvent::SearchStarted { root }) => tracing::info!("Searching {:?}", root),
            Some(UserEvent::SearchProgress(count)) => eprintln!("{} files found", count),
            Some(UserEvent::SearchFinished { status, matches }) => break (status, matches),
            Some(UserEvent::ShowError(message)) => bail!(message),
            Some(other) => tracing::debug!("Ignoring event {:?}", other),
            None => bail!("Search ended unexpectedly"),
        }
    };

    match status {
        SessionStatus::Cancelled => eprintln!("Search interrupted. {} files kept.", matches),
        _ => eprintln!("Search completed. {} files found.", matches),
    }

    if cli.tree {
        let state_guard = lock_state(&state);
        let root = state_guard.settings.root_directory.clone();
        print!("{}", ResultTree::build(&root, &state_guard.results).render());
        return Ok(());
    }

    match cli.output {
        Some(path) => {
            app::commands::save_report(path, proxy, state.clone());
            match events.recv().await {
                Some(UserEvent::SaveComplete(true, path)) => eprintln!("Report saved to {}", path),
                Some(UserEvent::SaveComplete(false, path)) => bail!("Could not save report to {}", path),
                Some(UserEvent::ShowError(message)) => bail!(message),
                _ => bail!("Report was not saved"),
            }
        }
        None => {
            let report = app::commands::build_report(&proxy, &state)
                .context("Report is not available while a search is running")?;
            WriterSink::new(std::io::stdout().lock()).deliver(&report)?;
        }
    }

    Ok(())
}

/// Applies command line values on top of the stored settings.
fn apply_overrides(cli: &Cli, settings: &mut Settings) -> Result<()> {
    if let Some(root) = &cli.root {
        settings.root_directory = root.clone();
    }
    if let Some(extension) = &cli.extension {
        settings.filter_extension = extension.clone();
    }
    if let Some(name) = &cli.name {
        settings.filter_filename = name.clone();
    }
    if cli.case_sensitive {
        settings.filename_case_sensitive = true;
    } else if cli.case_insensitive {
        settings.filename_case_sensitive = false;
    }
    if let Some(names) = &cli.columns {
        let mut columns = Vec::with_capacity(ColumnKind::ALL.len());
        for name in names {
            let kind: ColumnKind = name
                .parse()
                .with_context(|| format!("Known columns: {}", known_columns()))?;
            columns.push(ReportColumn(kind, true));
        }
        settings.report_columns = columns;
        settings.cleanup();
    }
    Ok(())
}

fn known_columns() -> String {
    ColumnKind::ALL
        .iter()
        .map(|kind| kind.name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("search-files").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_case_flags_override_stored_setting() {
        let mut settings = Settings {
            filename_case_sensitive: true,
            ..Default::default()
        };
        apply_overrides(&parse(&["-i"]), &mut settings).unwrap();
        assert!(!settings.filename_case_sensitive);

        apply_overrides(&parse(&["--case-sensitive"]), &mut settings).unwrap();
        assert!(settings.filename_case_sensitive);

        apply_overrides(&parse(&[]), &mut settings).unwrap();
        assert!(settings.filename_case_sensitive);
    }

    #[test]
    fn test_case_flags_conflict() {
        let result = Cli::try_parse_from(["search-files", "-c", "-i"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_columns_are_parsed_by_name() {
        let mut settings = Settings::default();
        apply_overrides(&parse(&["--columns", "file size,Filename"]), &mut settings).unwrap();
        assert_eq!(settings.report_columns[0], ReportColumn(ColumnKind::FileSize, true));
        assert_eq!(settings.report_columns[1], ReportColumn(ColumnKind::Filename, true));
        assert!(!settings.report_columns[2].included());

        assert!(apply_overrides(&parse(&["--columns", "Colour depth"]), &mut settings).is_err());
    }
}
