use std::fs::File;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod controller;
mod domain;
mod exchange;
mod inputter;
mod model;
mod record;
mod table;
mod ui;

use controller::Controller;
use domain::{SortMode, TVConfig, TVError};
use model::{Model, Status};

/// A tui spreadsheet of job requests.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON file with the rows to start with. Without it the sample rows are shown.
    data_file: Option<String>,

    /// Directory that receives spreadsheet_data.json on export
    #[arg(long, default_value = ".")]
    export_dir: String,

    /// Log destination, the terminal belongs to the ui
    #[arg(long, default_value = "jobsheet.log")]
    log_file: String,

    /// Milliseconds to wait for terminal events per frame
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    #[arg(long, default_value_t = 40)]
    max_column_width: usize,

    /// Remember the sort direction per column instead of one shared toggle
    #[arg(long)]
    per_column_sort: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Err(e) => {
            error!("Exiting with error: {e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_logging(path: &Path) -> Result<(), TVError> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn build_config(args: &Args) -> Result<TVConfig, TVError> {
    let sort_mode = if args.per_column_sort {
        SortMode::PerColumn
    } else {
        SortMode::Shared
    };
    Ok(TVConfig::default()
        .with_event_poll_time(args.poll_ms)
        .with_max_column_width(args.max_column_width)
        .with_export_dir(exchange::expand_path(&args.export_dir)?)
        .with_sort_mode(sort_mode))
}

fn run(args: Args) -> Result<(), TVError> {
    init_logging(&exchange::expand_path(&args.log_file)?)?;
    info!("Starting jobsheet!");

    let cfg = build_config(&args)?;
    let (width, height) = ratatui::crossterm::terminal::size()?;
    let mut model = Model::init(&cfg, record::sample_data(), width as usize, height as usize);
    if let Some(path) = &args.data_file {
        model.load_data_file(path)?;
    }
    info!("Starting with {} rows", model.store().len());

    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut model, &controller);
    ratatui::restore();
    info!("Stopped jobsheet");
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    controller: &Controller,
) -> Result<(), TVError> {
    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui::draw(f, model))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(model)? {
            model.update(Some(message))?;
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn defaults_use_the_shared_sort_toggle() {
        let args = Args::try_parse_from(["jobsheet"]).unwrap();
        assert_eq!(args.data_file, None);
        let cfg = build_config(&args).unwrap();
        assert_eq!(cfg.sort_mode, SortMode::Shared);
        assert_eq!(cfg.event_poll_time, 100);
        assert_eq!(cfg.max_column_width, 40);
        assert_eq!(cfg.export_dir, PathBuf::from("."));
    }

    #[test]
    fn flags_reach_the_config() {
        let args = Args::try_parse_from([
            "jobsheet",
            "jobs.json",
            "--per-column-sort",
            "--export-dir",
            " out/sheets ",
            "--poll-ms",
            "250",
            "--max-column-width",
            "20",
        ])
        .unwrap();
        assert_eq!(args.data_file.as_deref(), Some("jobs.json"));
        let cfg = build_config(&args).unwrap();
        assert_eq!(cfg.sort_mode, SortMode::PerColumn);
        assert_eq!(cfg.event_poll_time, 250);
        assert_eq!(cfg.max_column_width, 20);
        assert_eq!(cfg.export_dir, PathBuf::from("out/sheets"));

        if let Ok(home) = std::env::var("HOME") {
            let args = Args::try_parse_from(["jobsheet", "--export-dir", "~/exports"]).unwrap();
            assert_eq!(
                build_config(&args).unwrap().export_dir,
                PathBuf::from(home).join("exports")
            );
        }
    }

    #[test]
    fn bad_arguments_are_rejected() {
        assert!(Args::try_parse_from(["jobsheet", "--poll-ms", "soon"]).is_err());
        let args = Args::try_parse_from(["jobsheet", "--export-dir", " "]).unwrap();
        assert!(matches!(build_config(&args), Err(TVError::InvalidPath(_))));
    }
}
