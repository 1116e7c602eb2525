use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dr_results::columns::ColumnId;
use dr_results::config::Settings;
use dr_results::dialog::{ColumnHeader, DisplayRow, DisplaySurface, ResultsDialog};
use dr_results::export::ExportFormat;
use dr_results::models::TrackId;
use dr_results::report;
use dr_results::tagging::{MemoryLibrary, MessageSink, TagWriter};

#[derive(Parser)]
#[command(name = "dr-results", about = "Show, export and tag dynamic range analysis results")]
struct Cli {
    /// Analysis report (JSON)
    report: PathBuf,

    /// Display and tag settings (JSON)
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// Sort rows by this column (e.g. dynamic_range, title)
    #[arg(long)]
    sort: Option<ColumnId>,

    /// Sort descending instead of ascending
    #[arg(long, requires = "sort")]
    desc: bool,

    /// Export to a .txt or .csv file instead of printing
    #[arg(long)]
    export: Option<PathBuf>,

    /// Track library (JSON) used for tag writing
    #[arg(long)]
    library: Option<PathBuf>,

    /// Write the enabled result tags to every track in the library
    #[arg(long)]
    write_tags: bool,

    /// Remove the enabled result tags from every track in the library
    #[arg(long)]
    clear_tags: bool,
}

/// Headless surface: the table goes to stdout, popups to stderr.
struct ConsoleSurface;

impl DisplaySurface for ConsoleSurface {
    fn set_columns(&mut self, _columns: &[ColumnHeader]) {}

    fn set_rows(&mut self, _rows: &[DisplayRow]) {}

    fn show_message(&mut self, title: &str, text: &str) {
        eprintln!("{}: {}", title, text);
    }

    fn show_track_properties(&mut self, id: TrackId) {
        eprintln!("Track {}", id);
    }
}

struct ConsoleMessages;

impl MessageSink for ConsoleMessages {
    fn show_message(&self, title: &str, text: &str) {
        eprintln!("{}: {}", title, text);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if cli.write_tags && cli.clear_tags {
        anyhow::bail!("--write-tags and --clear-tags cannot be used together");
    }
    let tagging = cli.write_tags || cli.clear_tags;
    if tagging && cli.library.is_none() {
        anyhow::bail!("--write-tags and --clear-tags require --library");
    }

    let settings = match &cli.prefs {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let report = report::load_report(&cli.report)?;

    let library = match &cli.library {
        Some(path) => Rc::new(MemoryLibrary::load(path)?),
        None => Rc::new(MemoryLibrary::new()),
    };
    let writer = Rc::new(TagWriter::new(library.clone(), Rc::new(ConsoleMessages)));

    let mut dialog = ResultsDialog::new(
        ConsoleSurface,
        report,
        settings.display,
        settings.tags,
        writer.clone(),
    );

    if let Some(column) = cli.sort {
        if !dialog.sort_by(column, !cli.desc) {
            anyhow::bail!("Column '{}' is not shown with the current settings", column);
        }
    }

    if tagging {
        if cli.write_tags {
            dialog.write_tags();
        } else {
            dialog.clear_tags();
        }
        for changed in library.process_pending() {
            writer.on_items_changed(&changed);
        }
        let pending = writer.pending_count();
        if pending > 0 {
            eprintln!("Warning: {} tag update(s) not confirmed by the library", pending);
        }
        if let Some(path) = &cli.library {
            library.save(path)?;
        }
        return Ok(());
    }

    if let Some(path) = &cli.export {
        let format = dialog.export_to(path)?;
        eprintln!("Saved {} to {}", format.extension(), path.display());
        return Ok(());
    }

    std::io::stdout()
        .write_all(&dialog.render(ExportFormat::Text))
        .context("Failed to write to stdout")?;
    Ok(())
}
