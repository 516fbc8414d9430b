use std::f64::consts::TAU;

use rand::Rng;

use crate::{
    prelude::*,
    uncertain::{Likelihood, Uncertain},
};

/// Measurement channel with additive zero-mean Gaussian noise.
///
/// The same model serves both directions: [`Sensor::measure`] corrupts a
/// true value, and the [`Likelihood`] implementation scores an observation
/// against a hypothesis in a Bayesian update.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct Sensor {
    noise_std: f64,
}

impl Sensor {
    /// Calibrated voltage sense, ±10 mV.
    pub const VOLTAGE: Self = Self { noise_std: 0.01 };

    /// Calibrated current sense, ±1 mA.
    pub const CURRENT: Self = Self { noise_std: 0.001 };

    pub fn new(noise_std: f64) -> Result<Self> {
        ensure!(
            noise_std.is_finite() && noise_std >= 0.0,
            "the sensor noise must be finite and non-negative, got {noise_std}",
        );
        Ok(Self { noise_std })
    }

    /// Read the true value through the noisy channel.
    ///
    /// The reading carries the full noise distribution. A noiseless sensor
    /// passes the value through unchanged.
    pub fn measure(&self, true_value: &Uncertain, rng: &mut impl Rng) -> Result<Uncertain> {
        Ok(true_value + Uncertain::gaussian(0.0, self.noise_std, rng)?)
    }
}

impl Likelihood for Sensor {
    /// Density of observing `observation` when the true value is
    /// `hypothesis`. A noiseless sensor degrades to an equality indicator.
    #[expect(clippy::float_cmp)]
    fn density(&self, observation: f64, hypothesis: f64) -> f64 {
        if self.noise_std == 0.0 {
            return if observation == hypothesis { 1.0 } else { 0.0 };
        }
        let normalized = (observation - hypothesis) / self.noise_std;
        (-0.5 * normalized * normalized).exp() / (self.noise_std * TAU.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn negative_noise_is_rejected() {
        assert!(Sensor::new(-0.01).is_err());
        assert!(Sensor::new(f64::NAN).is_err());
        assert!(Sensor::new(0.0).is_ok());
    }

    #[test]
    fn measurement_spreads_around_the_true_value() {
        let mut rng = StdRng::seed_from_u64(42);
        let reading = Sensor::VOLTAGE.measure(&Uncertain::exact(3.7), &mut rng).unwrap();
        assert_abs_diff_eq!(reading.mean(), 3.7, epsilon = 0.005);
        assert_abs_diff_eq!(reading.std_dev(), 0.01, epsilon = 0.005);
    }

    /// A noiseless sensor must not disturb the value at all.
    #[test]
    #[expect(clippy::float_cmp)]
    fn noiseless_measurement_is_exact() {
        let mut rng = StdRng::seed_from_u64(42);
        let sensor = Sensor::new(0.0).unwrap();
        let reading = sensor.measure(&Uncertain::exact(3.7), &mut rng).unwrap();
        assert_eq!(reading.mean(), 3.7);
        assert_eq!(reading.std_dev(), 0.0);
    }

    #[test]
    fn density_peaks_at_the_hypothesis() {
        let sensor = Sensor::VOLTAGE;
        let peak = sensor.density(3.7, 3.7);
        assert_abs_diff_eq!(peak, 1.0 / (0.01 * TAU.sqrt()), epsilon = 1e-9);
        assert!(sensor.density(3.7, 3.71) < peak);
        assert!(sensor.density(3.7, 3.8) < sensor.density(3.7, 3.71));
    }

    #[test]
    #[expect(clippy::float_cmp)]
    fn noiseless_density_is_an_indicator() {
        let sensor = Sensor::new(0.0).unwrap();
        assert_eq!(sensor.density(3.7, 3.7), 1.0);
        assert_eq!(sensor.density(3.7, 3.700_000_1), 0.0);
    }
}
