use clap::Parser;

use crate::{
    cli::{DischargeArgs, RunArgs},
    core::BayesianFusion,
    prelude::*,
    tables::build_fusion_table,
};

#[derive(Parser)]
pub struct BayesArgs {
    #[clap(flatten)]
    pub discharge: DischargeArgs,

    #[clap(flatten)]
    pub run: RunArgs,
}

pub fn bayes(args: &BayesArgs) -> Result {
    let fusion = BayesianFusion::builder()
        .capacity(args.discharge.capacity)
        .current_draw(args.discharge.current_draw())
        .time_step(args.discharge.time_step)
        .load_voltage(args.discharge.load_voltage)
        .max_steps(args.discharge.max_steps)
        .build()?;
    super::execute(&args.run, |rng| fusion.run(rng), build_fusion_table)
}
