//! The estimation strategies: direct voltage mapping, coulomb counting and
//! Bayesian fusion of the two.

use bon::bon;
use rand::Rng;
use serde::Serialize;

use crate::{
    core::{battery::Battery, curve::DischargeCurve, sensor::Sensor},
    ops::RangeInclusive,
    prelude::*,
    quantity::{Zero, charge::MilliampHours, current::Amperes, time::Seconds, voltage::Volts},
    uncertain::Uncertain,
};

/// Reference voltages spanning the shoulder, plateau and knee regions of
/// the discharge curve.
const REFERENCE_VOLTAGES: [Volts; 3] = [Volts(4.10), Volts(3.8), Volts(2.7)];

/// One row of a strategy's output.
pub trait Reading {
    /// The state-of-charge estimate this row reports, in percent.
    fn soc_percent(&self) -> f64;
}

/// Map single voltage readings straight through the discharge curve.
///
/// No battery is simulated: each reference voltage is read through the
/// noisy sensor and inverted. The spread of the resulting estimate shows
/// how strongly the curve amplifies measurement noise in each region.
#[must_use]
#[derive(Debug)]
pub struct DirectMapping {
    curve: DischargeCurve,
    sensor: Sensor,
    true_voltages: Vec<Volts>,
}

#[derive(Debug, Serialize)]
pub struct DirectReading {
    pub index: usize,
    pub measured_voltage: Volts,
    pub soc_percent: f64,
    pub soc_std_percent: f64,
}

impl Reading for DirectReading {
    fn soc_percent(&self) -> f64 {
        self.soc_percent
    }
}

#[bon]
impl DirectMapping {
    #[builder]
    pub fn new(
        #[builder(default = DischargeCurve::PANASONIC_CGR17500)] curve: DischargeCurve,
        #[builder(default = Sensor::VOLTAGE)] sensor: Sensor,
        #[builder(default = REFERENCE_VOLTAGES.to_vec())] true_voltages: Vec<Volts>,
    ) -> Result<Self> {
        ensure!(!true_voltages.is_empty(), "there must be at least one voltage to map");
        ensure!(
            true_voltages.iter().all(|voltage| voltage.0.is_finite()),
            "every voltage to map must be finite, got {true_voltages:?}",
        );
        Ok(Self { curve, sensor, true_voltages })
    }

    #[instrument(skip_all)]
    pub fn run(&self, rng: &mut impl Rng) -> Result<Vec<DirectReading>> {
        let mut readings = Vec::with_capacity(self.true_voltages.len());
        for (index, voltage) in self.true_voltages.iter().enumerate() {
            let measured = self.sensor.measure(&Uncertain::exact(voltage.0), rng)?;
            let soc = self.curve.voltage_to_soc(&measured);
            readings.push(DirectReading {
                index,
                measured_voltage: Volts(measured.mean()),
                soc_percent: soc.mean(),
                soc_std_percent: soc.std_dev(),
            });
        }
        Ok(readings)
    }
}

/// Integrate the measured current over time.
///
/// The classic battery-gauge approach: each interval's charge draw is
/// subtracted from the remaining capacity. Measurement noise accumulates
/// in the estimate and never leaves, which is exactly what the spread of
/// the reported state of charge shows.
#[must_use]
#[derive(Debug)]
pub struct CoulombCounting {
    curve: DischargeCurve,
    capacity: MilliampHours,
    sensor: Sensor,
    current_draw: RangeInclusive<Amperes>,
    time_step: Seconds,
    load_voltage: Volts,
    max_steps: usize,
}

#[derive(Debug, Serialize)]
pub struct CoulombReading {
    pub time: Seconds,
    pub current_milliamps: f64,
    pub soc_percent: f64,
    pub soc_std_percent: f64,
}

impl Reading for CoulombReading {
    fn soc_percent(&self) -> f64 {
        self.soc_percent
    }
}

#[bon]
impl CoulombCounting {
    #[builder]
    pub fn new(
        #[builder(default = DischargeCurve::PANASONIC_CGR17500)] curve: DischargeCurve,
        #[builder(default = MilliampHours(3000.0))] capacity: MilliampHours,
        #[builder(default = Sensor::CURRENT)] sensor: Sensor,
        #[builder(default = RangeInclusive { min: Amperes(0.1), max: Amperes(1.0) })]
        current_draw: RangeInclusive<Amperes>,
        #[builder(default = Seconds(1000.0))] time_step: Seconds,
        #[builder(default = Volts(3.3))] load_voltage: Volts,
        #[builder(default = 100_000)] max_steps: usize,
    ) -> Result<Self> {
        ensure!(
            current_draw.min.0.is_finite()
                && current_draw.max.0.is_finite()
                && current_draw.min <= current_draw.max,
            "invalid current draw range: {current_draw:?}",
        );
        ensure!(current_draw.min >= Amperes::ZERO, "the current draw must not be negative");
        ensure!(
            time_step.0.is_finite() && time_step > Seconds::ZERO,
            "the time step must be positive, got {time_step}",
        );
        ensure!(
            load_voltage.0.is_finite() && load_voltage > Volts::ZERO,
            "the load voltage must be positive, got {load_voltage}",
        );
        ensure!(max_steps != 0, "there must be at least one step");
        Ok(Self { curve, capacity, sensor, current_draw, time_step, load_voltage, max_steps })
    }

    #[instrument(skip_all)]
    pub fn run(&self, rng: &mut impl Rng) -> Result<Vec<CoulombReading>> {
        let mut battery = Battery::new(self.curve, self.capacity)?;
        let mut readings = Vec::new();
        let mut time = Seconds::ZERO;

        while !battery.is_expended() {
            if readings.len() >= self.max_steps {
                warn!(max_steps = self.max_steps, "the cell has not expended, giving up");
                break;
            }
            time += self.time_step;

            // One true draw per interval, read through the noisy sensor.
            let true_current = rng.gen_range(self.current_draw.min.0..=self.current_draw.max.0);
            let measured = self.sensor.measure(&Uncertain::exact(true_current), rng)?;

            battery.update(time, &measured, self.load_voltage);
            readings.push(CoulombReading {
                time,
                current_milliamps: 1000.0 * measured.mean(),
                soc_percent: 100.0 * battery.soc().mean(),
                soc_std_percent: 100.0 * battery.soc().std_dev(),
            });
        }

        info!(steps = readings.len(), "finished");
        Ok(readings)
    }
}

/// Fuse the coulomb-counting prior with a voltage measurement.
///
/// Two cells run side by side: a ground truth driven by the true current,
/// and an estimate driven by the measured one. Each interval, the
/// estimate's voltage forms the prior, a noisy observation of the true
/// voltage conditions it, and the posterior state of charge is written
/// back into the estimate. The correction keeps the accumulated
/// integration error bounded.
#[must_use]
#[derive(Debug)]
pub struct BayesianFusion {
    curve: DischargeCurve,
    capacity: MilliampHours,
    current_sensor: Sensor,
    voltage_sensor: Sensor,
    current_draw: RangeInclusive<Amperes>,
    time_step: Seconds,
    load_voltage: Volts,
    max_steps: usize,
}

#[derive(Debug, Serialize)]
pub struct FusionReading {
    pub time: Seconds,
    pub current_milliamps: f64,
    pub true_soc_percent: f64,
    pub measured_soc_percent: f64,
    pub prior_soc_percent: f64,
    pub posterior_soc_percent: f64,
    pub posterior_std_percent: f64,
}

impl Reading for FusionReading {
    fn soc_percent(&self) -> f64 {
        self.posterior_soc_percent
    }
}

#[bon]
impl BayesianFusion {
    #[builder]
    pub fn new(
        #[builder(default = DischargeCurve::PANASONIC_CGR17500)] curve: DischargeCurve,
        #[builder(default = MilliampHours(3000.0))] capacity: MilliampHours,
        #[builder(default = Sensor::CURRENT)] current_sensor: Sensor,
        #[builder(default = Sensor::VOLTAGE)] voltage_sensor: Sensor,
        #[builder(default = RangeInclusive { min: Amperes(0.1), max: Amperes(1.0) })]
        current_draw: RangeInclusive<Amperes>,
        #[builder(default = Seconds(1000.0))] time_step: Seconds,
        #[builder(default = Volts(3.3))] load_voltage: Volts,
        #[builder(default = 100_000)] max_steps: usize,
    ) -> Result<Self> {
        ensure!(
            current_draw.min.0.is_finite()
                && current_draw.max.0.is_finite()
                && current_draw.min <= current_draw.max,
            "invalid current draw range: {current_draw:?}",
        );
        ensure!(current_draw.min >= Amperes::ZERO, "the current draw must not be negative");
        ensure!(
            time_step.0.is_finite() && time_step > Seconds::ZERO,
            "the time step must be positive, got {time_step}",
        );
        ensure!(
            load_voltage.0.is_finite() && load_voltage > Volts::ZERO,
            "the load voltage must be positive, got {load_voltage}",
        );
        ensure!(max_steps != 0, "there must be at least one step");
        Ok(Self {
            curve,
            capacity,
            current_sensor,
            voltage_sensor,
            current_draw,
            time_step,
            load_voltage,
            max_steps,
        })
    }

    #[instrument(skip_all)]
    pub fn run(&self, rng: &mut impl Rng) -> Result<Vec<FusionReading>> {
        let mut ground_truth = Battery::new(self.curve, self.capacity)?;
        let mut estimate = Battery::new(self.curve, self.capacity)?;
        let mut readings = Vec::new();
        let mut time = Seconds::ZERO;

        while !ground_truth.is_expended() && !estimate.is_expended() {
            if readings.len() >= self.max_steps {
                warn!(max_steps = self.max_steps, "the cell has not expended, giving up");
                break;
            }
            time += self.time_step;

            let true_current = rng.gen_range(self.current_draw.min.0..=self.current_draw.max.0);
            let measured_current =
                self.current_sensor.measure(&Uncertain::exact(true_current), rng)?;

            // The ground truth discharges under the true current, the
            // estimate under the measured one.
            ground_truth.update(time, &Uncertain::exact(true_current), self.load_voltage);
            estimate.update(time, &measured_current, self.load_voltage);

            // The estimate's voltage is the prior; one noisy observation
            // of the true voltage conditions it.
            let prior_voltage = estimate.voltage();
            let observed_voltage =
                self.voltage_sensor.measure(ground_truth.voltage(), rng)?.sample(rng);
            let posterior_voltage =
                prior_voltage.bayes_update(&self.voltage_sensor, observed_voltage, rng)?;
            let posterior_soc = self.curve.voltage_to_soc(&posterior_voltage);

            readings.push(FusionReading {
                time,
                current_milliamps: 1000.0 * measured_current.mean(),
                true_soc_percent: 100.0 * ground_truth.soc().mean(),
                measured_soc_percent: self
                    .curve
                    .voltage_to_soc(&Uncertain::exact(observed_voltage))
                    .mean(),
                prior_soc_percent: self.curve.voltage_to_soc(prior_voltage).mean(),
                posterior_soc_percent: posterior_soc.mean(),
                posterior_std_percent: posterior_soc.std_dev(),
            });

            estimate.set_soc(posterior_soc / 100.0);
        }

        info!(steps = readings.len(), "finished");
        Ok(readings)
    }
}
