use anyhow::Result;

use quizkeep::*;

fn main() -> Result<()> {
    // Begin logger
    env_logger::init();

    // Load settings from the environment / .env
    let config = config::Config::from_env();
    log::info!("Using store at {}", config.db_path.display());

    shell::run_shell(&config)
}
