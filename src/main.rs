#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod cli;
mod core;
mod fmt;
mod ops;
mod output;
mod prelude;
mod quantity;
mod statistics;
mod tables;
mod uncertain;

use clap::{Parser, crate_version};

use crate::{
    cli::{Args, Command},
    prelude::*,
};

fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(std::io::stderr).without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();
    match args.command {
        Command::Direct(args) => cli::direct(&args)?,
        Command::Coulomb(args) => cli::coulomb(&args)?,
        Command::Bayes(args) => cli::bayes(&args)?,
    }

    info!("done!");
    Ok(())
}
