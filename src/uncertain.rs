//! Numeric values that may carry a full probability distribution.
//!
//! A distribution is represented as a fixed-size Monte Carlo particle
//! ensemble. Arithmetic between two ensembles is elementwise, so quantities
//! derived from a common source stay correlated: `x - x` has zero spread,
//! and the piecewise-curve blends evaluate per particle. Point values take
//! an exact fast path and never allocate.

use std::fmt::{Debug, Display, Formatter};

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::{ops::RangeInclusive, prelude::*};

/// Number of particles carried by a distribution.
const ENSEMBLE_LEN: usize = 1024;

/// Maximum steepness of the conditioning sigmoid, relative to support width.
const SIGMOID_MAX_SCALE: f64 = 50.0;

/// Measurement model used by the Bayesian update: the density of seeing
/// `observation` when the true value is `hypothesis`.
pub trait Likelihood {
    fn density(&self, observation: f64, hypothesis: f64) -> f64;
}

#[derive(Clone)]
enum Repr {
    Exact(f64),
    Ensemble(Vec<f64>),
}

#[must_use]
#[derive(Clone)]
pub struct Uncertain(Repr);

impl Uncertain {
    pub const fn exact(value: f64) -> Self {
        Self(Repr::Exact(value))
    }

    /// Draw an ensemble from a Gaussian distribution.
    ///
    /// A zero deviation collapses to an exact value, so noise-free
    /// configurations stay bit-exact.
    pub fn gaussian(mean: f64, std_dev: f64, rng: &mut impl Rng) -> Result<Self> {
        ensure!(mean.is_finite(), "the mean must be finite, got {mean}");
        ensure!(
            std_dev.is_finite() && std_dev >= 0.0,
            "the standard deviation must be finite and non-negative, got {std_dev}",
        );
        if std_dev == 0.0 {
            return Ok(Self::exact(mean));
        }
        let normal = Normal::new(mean, std_dev)?;
        Ok(Self(Repr::Ensemble((0..ENSEMBLE_LEN).map(|_| normal.sample(rng)).collect())))
    }

    /// Draw an ensemble from a uniform distribution over `min..=max`.
    #[expect(clippy::float_cmp)]
    pub fn uniform(min: f64, max: f64, rng: &mut impl Rng) -> Result<Self> {
        ensure!(min.is_finite() && max.is_finite(), "the bounds must be finite, got {min}..={max}");
        ensure!(min <= max, "invalid bounds: {min} > {max}");
        if min == max {
            return Ok(Self::exact(min));
        }
        Ok(Self(Repr::Ensemble((0..ENSEMBLE_LEN).map(|_| rng.gen_range(min..=max)).collect())))
    }

    /// Wrap an empirical sample set.
    pub fn from_samples(samples: Vec<f64>) -> Result<Self> {
        ensure!(!samples.is_empty(), "an empirical distribution needs at least one sample");
        if let [value] = samples.as_slice() {
            return Ok(Self::exact(*value));
        }
        Ok(Self(Repr::Ensemble(samples)))
    }

    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn mean(&self) -> f64 {
        match &self.0 {
            Repr::Exact(value) => *value,
            Repr::Ensemble(samples) => samples.iter().sum::<f64>() / samples.len() as f64,
        }
    }

    /// The n-th moment: the mean for `n == 1`, central moments from `n == 2`.
    #[must_use]
    #[expect(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    pub fn nth_moment(&self, n: u32) -> f64 {
        match (n, &self.0) {
            (0, _) => 1.0,
            (1, _) => self.mean(),
            (_, Repr::Exact(_)) => 0.0,
            (_, Repr::Ensemble(samples)) => {
                let mean = self.mean();
                samples.iter().map(|value| (value - mean).powi(n as i32)).sum::<f64>()
                    / samples.len() as f64
            }
        }
    }

    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.nth_moment(2).sqrt()
    }

    /// One concrete draw from the distribution.
    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        match &self.0 {
            Repr::Exact(value) => *value,
            Repr::Ensemble(samples) => samples[rng.gen_range(0..samples.len())],
        }
    }

    /// The range the value can actually attain.
    pub fn support(&self) -> RangeInclusive<f64> {
        match &self.0 {
            Repr::Exact(value) => RangeInclusive { min: *value, max: *value },
            Repr::Ensemble(samples) => samples.iter().fold(
                RangeInclusive { min: f64::INFINITY, max: f64::NEG_INFINITY },
                |range, value| RangeInclusive {
                    min: range.min.min(*value),
                    max: range.max.max(*value),
                },
            ),
        }
    }

    /// Saturating S-shaped gate in `(0, 1)`, anchored at `start`.
    ///
    /// Conditioning on an uncertain value cannot branch, so the piecewise
    /// curve blends its segments with this gate instead. The steepness
    /// scales inversely with the support width of `self - start`, keeping
    /// the transition sharp relative to whatever spread the value carries.
    /// A value sitting exactly on the anchor has zero support width and
    /// gates to the midpoint.
    pub fn smooth_gate(&self, start: f64) -> Self {
        let shifted = self - start;
        let support = shifted.support();
        let extent = support.min.abs().max(support.max.abs());
        if extent == 0.0 {
            return Self::exact(0.5);
        }
        let steepness = SIGMOID_MAX_SCALE / extent;
        shifted.map(|value| 1.0 / (1.0 + (-steepness * value).exp()))
    }

    pub fn abs(&self) -> Self {
        self.map(f64::abs)
    }

    /// Elementwise square root; negative inputs yield NaN particles.
    pub fn sqrt(&self) -> Self {
        self.map(f64::sqrt)
    }

    pub fn powi(&self, exponent: i32) -> Self {
        self.map(|value| value.powi(exponent))
    }

    /// Elementwise floor clamp.
    pub fn max(&self, floor: f64) -> Self {
        self.map(|value| value.max(floor))
    }

    /// Condition the distribution on an observation.
    ///
    /// Importance weights come from the likelihood model; the posterior is a
    /// systematic resampling of the prior particles under those weights. If
    /// the observation has zero density everywhere the prior carries mass,
    /// or so little that the total weight underflows, the posterior is
    /// degenerate and the update fails rather than returning an invalid
    /// distribution.
    pub fn bayes_update(
        &self,
        likelihood: &impl Likelihood,
        observation: f64,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        match &self.0 {
            Repr::Exact(value) => {
                let density = likelihood.density(observation, *value);
                ensure!(
                    density.is_finite() && density > 0.0,
                    "degenerate posterior: the observation {observation} has zero likelihood over the prior support",
                );
                Ok(Self::exact(*value))
            }
            Repr::Ensemble(particles) => {
                let weights: Vec<f64> =
                    particles.iter().map(|&value| likelihood.density(observation, value)).collect();
                let total_weight: f64 = weights.iter().sum();
                // A subnormal total would underflow the resampler's step
                // to zero, so it counts as no likelihood at all.
                ensure!(
                    total_weight.is_normal() && total_weight > 0.0,
                    "degenerate posterior: the observation {observation} has zero likelihood over the prior support",
                );
                let resampled = systematic_resample(particles, &weights, total_weight, rng);
                Ok(Self(Repr::Ensemble(resampled)))
            }
        }
    }

    fn map(&self, op: impl Fn(f64) -> f64) -> Self {
        match &self.0 {
            Repr::Exact(value) => Self::exact(op(*value)),
            Repr::Ensemble(samples) => {
                Self(Repr::Ensemble(samples.iter().map(|value| op(*value)).collect()))
            }
        }
    }

    fn zip_with(&self, rhs: &Self, op: impl Fn(f64, f64) -> f64) -> Self {
        match (&self.0, &rhs.0) {
            (Repr::Exact(lhs), Repr::Exact(rhs)) => Self::exact(op(*lhs, *rhs)),
            (Repr::Exact(lhs), Repr::Ensemble(rhs)) => {
                Self(Repr::Ensemble(rhs.iter().map(|rhs| op(*lhs, *rhs)).collect()))
            }
            (Repr::Ensemble(lhs), Repr::Exact(rhs)) => {
                Self(Repr::Ensemble(lhs.iter().map(|lhs| op(*lhs, *rhs)).collect()))
            }
            (Repr::Ensemble(lhs), Repr::Ensemble(rhs)) => {
                debug_assert_eq!(lhs.len(), rhs.len(), "ensembles must be index-aligned");
                Self(Repr::Ensemble(
                    lhs.iter().zip(rhs).map(|(lhs, rhs)| op(*lhs, *rhs)).collect(),
                ))
            }
        }
    }
}

/// Classic particle-filter measure update: walk the cumulative weights with
/// a single random offset and equally spaced targets.
#[expect(clippy::cast_precision_loss)]
fn systematic_resample(
    particles: &[f64],
    weights: &[f64],
    total_weight: f64,
    rng: &mut impl Rng,
) -> Vec<f64> {
    let step = total_weight / particles.len() as f64;
    let offset = rng.gen_range(0.0..step);
    let mut resampled = Vec::with_capacity(particles.len());
    let mut index = 0;
    let mut cumulative = weights[0];
    for k in 0..particles.len() {
        let target = offset + step * k as f64;
        while cumulative < target && index + 1 < particles.len() {
            index += 1;
            cumulative += weights[index];
        }
        resampled.push(particles[index]);
    }
    resampled
}

impl Display for Uncertain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ± {}", self.mean(), self.std_dev())
    }
}

impl Debug for Uncertain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::ops::Neg for &Uncertain {
    type Output = Uncertain;

    fn neg(self) -> Uncertain {
        self.map(|value| -value)
    }
}

impl std::ops::Neg for Uncertain {
    type Output = Uncertain;

    fn neg(self) -> Uncertain {
        -&self
    }
}

macro_rules! binary_operator {
    ($trait:ident, $method:ident, $operator:tt) => {
        impl ::std::ops::$trait<&Uncertain> for &Uncertain {
            type Output = Uncertain;

            fn $method(self, rhs: &Uncertain) -> Uncertain {
                self.zip_with(rhs, |lhs, rhs| lhs $operator rhs)
            }
        }

        impl ::std::ops::$trait<Uncertain> for &Uncertain {
            type Output = Uncertain;

            fn $method(self, rhs: Uncertain) -> Uncertain {
                self.zip_with(&rhs, |lhs, rhs| lhs $operator rhs)
            }
        }

        impl ::std::ops::$trait<&Uncertain> for Uncertain {
            type Output = Uncertain;

            fn $method(self, rhs: &Uncertain) -> Uncertain {
                self.zip_with(rhs, |lhs, rhs| lhs $operator rhs)
            }
        }

        impl ::std::ops::$trait<Uncertain> for Uncertain {
            type Output = Uncertain;

            fn $method(self, rhs: Uncertain) -> Uncertain {
                self.zip_with(&rhs, |lhs, rhs| lhs $operator rhs)
            }
        }

        impl ::std::ops::$trait<f64> for &Uncertain {
            type Output = Uncertain;

            fn $method(self, rhs: f64) -> Uncertain {
                self.map(|lhs| lhs $operator rhs)
            }
        }

        impl ::std::ops::$trait<f64> for Uncertain {
            type Output = Uncertain;

            fn $method(self, rhs: f64) -> Uncertain {
                self.map(|lhs| lhs $operator rhs)
            }
        }

        impl ::std::ops::$trait<&Uncertain> for f64 {
            type Output = Uncertain;

            fn $method(self, rhs: &Uncertain) -> Uncertain {
                rhs.map(|rhs| self $operator rhs)
            }
        }

        impl ::std::ops::$trait<Uncertain> for f64 {
            type Output = Uncertain;

            fn $method(self, rhs: Uncertain) -> Uncertain {
                rhs.map(|rhs| self $operator rhs)
            }
        }
    };
}

binary_operator!(Add, add, +);
binary_operator!(Sub, sub, -);
binary_operator!(Mul, mul, *);
binary_operator!(Div, div, /);
