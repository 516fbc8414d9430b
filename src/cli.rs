mod bayes;
mod coulomb;
mod direct;

use std::{path::PathBuf, time::Instant};

use clap::{Parser, Subcommand};
use comfy_table::Table;
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;

pub use self::{bayes::bayes, coulomb::coulomb, direct::direct};
use crate::{
    cli::{bayes::BayesArgs, coulomb::CoulombArgs, direct::DirectArgs},
    core::Reading,
    ops::RangeInclusive,
    output::{self, CsvRecord},
    prelude::*,
    quantity::{charge::MilliampHours, current::Amperes, time::Seconds, voltage::Volts},
    statistics::RunStatistics,
    tables,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Map measured voltages straight through the discharge curve.
    #[clap(name = "direct")]
    Direct(Box<DirectArgs>),

    /// Integrate the measured current draw over time.
    #[clap(name = "coulomb")]
    Coulomb(Box<CoulombArgs>),

    /// Fuse coulomb counting with Bayesian voltage updates.
    #[clap(name = "bayes")]
    Bayes(Box<BayesArgs>),
}

/// Discharge simulation parameters shared by the time-stepping commands.
#[derive(Copy, Clone, Parser)]
pub struct DischargeArgs {
    /// Rated battery capacity in milliamp-hours.
    #[clap(
        long = "capacity-milliamp-hours",
        default_value = "3000",
        env = "CAPACITY_MILLIAMP_HOURS"
    )]
    pub capacity: MilliampHours,

    /// Lower bound of the true current draw in amperes.
    #[clap(long = "current-min", default_value = "0.1", env = "CURRENT_MIN")]
    pub current_min: Amperes,

    /// Upper bound of the true current draw in amperes.
    #[clap(long = "current-max", default_value = "1.0", env = "CURRENT_MAX")]
    pub current_max: Amperes,

    /// Simulation time step in seconds.
    #[clap(long = "time-step-seconds", default_value = "1000", env = "TIME_STEP_SECONDS")]
    pub time_step: Seconds,

    /// Voltage at the load in volts.
    #[clap(long = "load-voltage", default_value = "3.3", env = "LOAD_VOLTAGE")]
    pub load_voltage: Volts,

    /// Give up after this many steps if the cell has not expended.
    #[clap(long = "max-steps", default_value_t = 100_000, env = "MAX_STEPS")]
    pub max_steps: usize,
}

impl DischargeArgs {
    pub fn current_draw(&self) -> RangeInclusive<Amperes> {
        RangeInclusive::from_std(self.current_min..=self.current_max)
    }
}

/// Execution and output options shared by every command.
#[derive(Parser)]
pub struct RunArgs {
    /// Write the readings to a CSV file.
    #[clap(short = 'o', long = "output", env = "OUTPUT_PATH")]
    pub output_path: Option<PathBuf>,

    /// Print the readings as JSON to standard output.
    #[clap(short = 'j', long = "json")]
    pub json: bool,

    /// Repeat the estimation and merge the final estimates.
    #[clap(short = 'M', long = "runs", default_value_t = 1, env = "RUNS")]
    pub runs: u64,

    /// Print the elapsed wall-clock time.
    #[clap(short = 'T', long = "time")]
    pub time: bool,

    /// Print only the final estimate and the elapsed microseconds.
    #[clap(short = 'b', long = "benchmark")]
    pub benchmark: bool,

    /// Seed for the random number generator, for reproducible runs.
    #[clap(long = "seed", env = "SEED")]
    pub seed: Option<u64>,
}

impl RunArgs {
    pub fn new_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Run a strategy under the common execution options.
///
/// All requested runs share one generator, so a fixed seed reproduces the
/// whole sequence. The clock spans the runs and the statistics merge, as
/// the benchmark output is meant to measure the estimation itself.
fn execute<R, F>(args: &RunArgs, run: F, build_table: impl Fn(&[R]) -> Table) -> Result
where
    R: Reading + CsvRecord + Serialize,
    F: Fn(&mut StdRng) -> Result<Vec<R>>,
{
    ensure!(args.runs != 0, "there must be at least one run");
    let mut rng = args.new_rng();
    let started = Instant::now();

    let mut statistics = RunStatistics::default();
    let mut readings = Vec::new();
    for _ in 0..args.runs {
        readings = run(&mut rng)?;
        if let Some(reading) = readings.last() {
            statistics.record(reading.soc_percent());
        }
    }
    let elapsed = started.elapsed();

    if args.benchmark {
        let final_soc = readings.last().map_or(f64::NAN, Reading::soc_percent);
        println!("{final_soc:.6} {}", elapsed.as_micros());
    } else {
        if args.json {
            output::print_json(&readings)?;
        } else {
            println!("{}", build_table(&readings));
            if args.runs > 1 {
                println!("{}", tables::build_statistics_table(&statistics));
            }
        }
        if args.time {
            println!("Elapsed: {:.6} seconds", elapsed.as_secs_f64());
        }
    }

    if let Some(path) = &args.output_path {
        output::write_csv(&readings, path)?;
        info!(path = %path.display(), "wrote the readings");
    }
    Ok(())
}
