use std::io;

use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;

mod cli;
mod commands;
mod init;

fn main() -> Result<()> {
    dotenv().ok();
    init::tracing();

    let args = cli::Cli::parse();

    commands::run(args.command, &args.registry, &mut io::stdout().lock())
}
