use anyhow::Result;
use clap::Parser;

use mobile_deploy::cli::{self, Args};
use mobile_deploy::{config, ui};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Credentials may come from a local .env file
    if let Ok(path) = dotenv::dotenv() {
        log::debug!("Loaded environment from {}", path.display());
    }

    let args = Args::parse();

    let config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    if let Err(e) = cli::run(args, config) {
        ui::display_error(&e.to_string());
        std::process::exit(1);
    }

    Ok(())
}
