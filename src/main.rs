#![allow(clippy::cargo_common_metadata)]
use anyhow::Result;
use sigflag::{cli, config::Config, setup_logging};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let args = cli::parse_args();

    setup_logging(args.debug)?;

    let config = Config::from_args(&args)?;

    let code = cli::execute_command(&config, &args.argv)?;
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}
