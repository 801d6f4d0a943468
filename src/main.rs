use clap::Parser;
use log::*;
use std::{io, process::ExitCode};

use indi_census::{
    Args, Result,
    command::{self, EXIT_CONFIG_ERROR},
};

fn initialize_logger(debug: bool) -> Result<()> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("indi_census")
        .build();

    // stdout carries records only
    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;

    let cli_args = Args::parse();

    initialize_logger(cli_args.debug)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command::execute(&cli_args, &mut out).await {
        Ok(summary) => Ok(summary.exit_code()),
        Err(err) if err.is_fatal_config() => {
            error!("{err}");
            Ok(ExitCode::from(EXIT_CONFIG_ERROR))
        }
        Err(err) => Err(err.into()),
    }
}
