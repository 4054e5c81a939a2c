//! Hangar CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use hangar::cli::{Cli, CommandDispatcher};
use hangar::ui::{BasicUI, Level, UserInterface};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("hangar=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hangar=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("Hangar starting with args: {:?}", cli);

    // Handle --no-color
    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    let level = if cli.debug { Level::Detail } else { Level::Info };
    let ui: Arc<dyn UserInterface> = Arc::new(BasicUI::with_level(level));

    let dispatcher = CommandDispatcher::new(&cli);
    match dispatcher.dispatch(&cli, Arc::clone(&ui)) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            ExitCode::from(1)
        }
    }
}
