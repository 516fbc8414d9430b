mod battery;
mod curve;
mod estimate;
mod sensor;

pub use self::estimate::{
    BayesianFusion, CoulombCounting, CoulombReading, DirectMapping, DirectReading, FusionReading,
    Reading,
};
