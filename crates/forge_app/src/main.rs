mod cli;
mod commands;
mod config;
mod convert;
mod effects;
mod render;
mod session;

use anyhow::Result;
use clap::Parser;
use forge_logging::{forge_error, forge_info};

use crate::cli::Cli;
use crate::config::ForgeConfig;
use crate::session::Session;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ForgeConfig::load(cli.config.as_deref())?;
    config.apply_overrides(cli.api_url, cli.poll_ms);
    forge_logging::initialize(&config.log_destination(), config.log_level());
    forge_info!("forge starting against {}", config.api_url);

    let mut session = Session::new(&config)?;
    let result = commands::run(&mut session, cli.command);
    if let Err(err) = &result {
        forge_error!("command failed: {:#}", err);
    }
    result
}
