use crate::app::RunOptions;
use clap::Parser;
use log::{error, info, LevelFilter};
use std::error::Error;
use std::path::PathBuf;

mod app;
mod assets;
mod config;
mod core;
mod gameplay;
mod screens;
mod ui;

#[derive(Parser, Debug)]
#[command(name = "osu-desktop", version, about)]
struct Args {
    /// Options file; created with defaults if missing.
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Force windowed mode regardless of the options file.
    #[arg(long)]
    windowed: bool,

    /// Beatmap archives (.osz) or replays (.osr) to open, as if dropped on the window.
    files: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    // --- Logging Setup ---
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .filter_module("osu_desktop::core", LevelFilter::Debug)
        .filter_module("osu_desktop::ui", LevelFilter::Info)
        .init();

    let args = Args::parse();
    info!("Application starting...");

    let options = RunOptions { config_path: args.config, windowed: args.windowed, files: args.files };
    if let Err(e) = app::run(options) {
        error!("Application exited with error: {}", e);
        return Err(e);
    }

    info!("Application exited gracefully.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_files_and_flags() {
        let args = Args::try_parse_from(["osu-desktop", "--windowed", "a.osz", "b.osr"]).unwrap();
        assert!(args.windowed);
        assert_eq!(args.config, PathBuf::from(config::DEFAULT_CONFIG_PATH));
        assert_eq!(args.files, vec![PathBuf::from("a.osz"), PathBuf::from("b.osr")]);
    }
}
