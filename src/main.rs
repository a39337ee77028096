use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use simplelog::{ConfigBuilder, WriteLogger};

use tabnav::app::App;
use tabnav::core::config::{self, ResolvedConfig};
use tabnav::script::{self, OutputFormat, Step};
use tabnav::tui;

#[derive(Parser)]
#[command(name = "tabnav", about = "Tabbed view navigator with per-tab back-stacks")]
struct Args {
    /// Config file (default: ~/.tabnav/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tab to start on, by id
    #[arg(long)]
    tab: Option<String>,

    /// Log level: off, error, warn, info, debug, trace
    #[arg(long)]
    log_level: Option<String>,

    /// Run these steps without a terminal UI, e.g. `push:Episode select:search pop`
    #[arg(long, num_args = 1.., value_name = "STEP")]
    headless: Option<Vec<Step>>,

    /// Print headless info events as JSON lines
    #[arg(long, requires = "headless")]
    json: bool,
}

fn resolve_config(args: &Args) -> Result<ResolvedConfig, config::ConfigError> {
    let file = config::load_config(args.config.as_deref())?;
    config::resolve(&file, args.tab.as_deref(), args.log_level.as_deref())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("tabnav: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize file logger; the terminal belongs to the UI
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(&config.log_file) {
        let _ = WriteLogger::init(config.log_level, log_config, log_file);
    }

    log::info!(
        "tabnav starting up with {} tabs, default {}",
        config.tabs.len(),
        config
            .tabs
            .get(config.default_tab)
            .map_or("-", |tab| tab.id.as_str())
    );

    let app = match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("tabnav: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match args.headless {
        Some(steps) => {
            let format = if args.json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            };
            script::run(app, steps, format)
                .await
                .map_err(|e| e.to_string())
        }
        None => tui::run(app).map_err(|e| e.to_string()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::warn!("Exiting with error: {}", e);
            eprintln!("tabnav: {e}");
            ExitCode::FAILURE
        }
    }
}
