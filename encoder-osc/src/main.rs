//! encoder-osc binary: parse the command line, set up logging, run until
//! signalled.

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::error;

use encoder_osc::cli::Cli;
use encoder_osc::Config;

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_level.as_str()))
        .format_timestamp_millis()
        .init();

    match encoder_osc::run(cli.apply(Config::default())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
