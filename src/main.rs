// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use code_scanner::config::{Config, ResultPolicy};
use code_scanner::constants::app_info;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "code-scanner")]
#[command(about = "Scan QR codes with a camera from the terminal")]
#[command(version = app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the scanning screen (default)
    Scan {
        /// Camera device path to use instead of the remembered one
        #[arg(short, long)]
        camera: Option<String>,

        /// Stream an image or video file instead of a camera
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Show new results in an already open alert instead of ignoring them
        #[arg(long)]
        replace_results: bool,
    },

    /// List available cameras
    List,

    /// Decode the code in an image file and print its text
    Decode {
        /// Image file to decode
        image: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Scan {
        camera: None,
        source: None,
        replace_results: false,
    });

    // The scanning screen owns the terminal, so its logs go to a file
    init_logging(matches!(command, Commands::Scan { .. }));

    let mut config = Config::load();

    match command {
        Commands::Scan {
            camera,
            source,
            replace_results,
        } => {
            if camera.is_some() {
                config.last_camera_path = camera;
            }
            if replace_results {
                config.result_policy = ResultPolicy::Replace;
            }
            code_scanner::terminal::run(config, source)
        }
        Commands::List => cli::list_cameras(),
        Commands::Decode { image } => cli::decode_image(&image, &config),
    }
}

/// Set RUST_LOG to control the log level, e.g. RUST_LOG=code_scanner=debug
fn init_logging(to_file: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    let log_file = to_file
        .then(dirs::cache_dir)
        .flatten()
        .map(|dir| dir.join(app_info::APP_DIR))
        .and_then(|dir| {
            std::fs::create_dir_all(&dir).ok()?;
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(app_info::LOG_FILE))
                .ok()
        });

    match log_file {
        Some(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        None if to_file => builder.with_writer(std::io::sink).init(),
        None => builder.init(),
    }
}
