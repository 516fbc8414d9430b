use clap::Parser;

use crate::{
    cli::RunArgs,
    core::DirectMapping,
    prelude::*,
    quantity::voltage::Volts,
    tables::build_direct_table,
};

#[derive(Parser)]
pub struct DirectArgs {
    /// Map a single measured voltage instead of the built-in reference set.
    #[clap(long = "measured-voltage", env = "MEASURED_VOLTAGE")]
    pub measured_voltage: Option<Volts>,

    #[clap(flatten)]
    pub run: RunArgs,
}

pub fn direct(args: &DirectArgs) -> Result {
    let mapping = DirectMapping::builder()
        .maybe_true_voltages(args.measured_voltage.map(|voltage| vec![voltage]))
        .build()?;
    super::execute(&args.run, |rng| mapping.run(rng), build_direct_table)
}
