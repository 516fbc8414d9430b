use clap::Parser;

use crate::{
    cli::{DischargeArgs, RunArgs},
    core::CoulombCounting,
    prelude::*,
    tables::build_coulomb_table,
};

#[derive(Parser)]
pub struct CoulombArgs {
    #[clap(flatten)]
    pub discharge: DischargeArgs,

    #[clap(flatten)]
    pub run: RunArgs,
}

pub fn coulomb(args: &CoulombArgs) -> Result {
    let counting = CoulombCounting::builder()
        .capacity(args.discharge.capacity)
        .current_draw(args.discharge.current_draw())
        .time_step(args.discharge.time_step)
        .load_voltage(args.discharge.load_voltage)
        .max_steps(args.discharge.max_steps)
        .build()?;
    super::execute(&args.run, |rng| counting.run(rng), build_coulomb_table)
}
