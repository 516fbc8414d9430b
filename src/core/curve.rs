use crate::uncertain::Uncertain;

/// Open-circuit voltage model of a lithium-ion cell, fitted piecewise
/// against its datasheet discharge curve.
///
/// The model has three segments over the charge axis, in percent: a
/// parabolic knee where the voltage collapses, a linear plateau covering
/// most of the range, and a parabolic shoulder near full charge. Because
/// the charge may be a distribution, segment selection cannot branch: the
/// segments are blended with [`Uncertain::smooth_gate`] at the two knee
/// points, which saturates for values clear of a knee and interpolates for
/// ensembles straddling one.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct DischargeCurve {
    /// Plateau voltage at zero charge, in volts.
    plateau_intercept: f64,

    /// Plateau steepness, in volts per percent.
    plateau_slope: f64,

    /// Vertex of the knee parabola, in percent.
    knee_vertex_percent: f64,

    /// Voltage at the knee vertex, in volts.
    knee_peak_volts: f64,

    /// Knee flatness, in percent² per volt.
    knee_curvature: f64,

    /// Vertex of the shoulder parabola, in percent.
    shoulder_vertex_percent: f64,

    /// Voltage at the shoulder vertex, in volts.
    shoulder_trough_volts: f64,

    /// Shoulder flatness, in percent² per volt.
    shoulder_curvature: f64,

    /// Gate anchor between the knee and the plateau, in percent.
    knee_blend_percent: f64,

    /// Gate anchor between the plateau and the shoulder, in percent.
    shoulder_blend_percent: f64,

    /// Gate anchor between the knee and the plateau, in volts.
    knee_blend_volts: f64,

    /// Gate anchor between the plateau and the shoulder, in volts.
    shoulder_blend_volts: f64,
}

impl DischargeCurve {
    /// Fit for the Panasonic CGR17500 830 mAh cell.
    pub const PANASONIC_CGR17500: Self = Self {
        plateau_intercept: 3.518_29,
        plateau_slope: 0.005_395,
        knee_vertex_percent: 18.0,
        knee_peak_volts: 3.61,
        knee_curvature: 160.0,
        shoulder_vertex_percent: 92.0,
        shoulder_trough_volts: 4.02,
        shoulder_curvature: 370.0,
        knee_blend_percent: 17.0,
        shoulder_blend_percent: 93.0,
        knee_blend_volts: 3.609_877_5,
        shoulder_blend_volts: 4.021_363_851_351_348,
    };

    /// Open-circuit voltage for a state of charge given as a fraction.
    pub fn soc_to_voltage(&self, soc: &Uncertain) -> Uncertain {
        let percent = soc * 100.0;
        let knee = self.knee_peak_volts
            - (&percent - self.knee_vertex_percent).powi(2) / self.knee_curvature;
        let plateau = self.plateau_intercept + &percent * self.plateau_slope;
        let shoulder = self.shoulder_trough_volts
            + (&percent - self.shoulder_vertex_percent).powi(2) / self.shoulder_curvature;
        let past_knee = percent.smooth_gate(self.knee_blend_percent);
        let past_shoulder = percent.smooth_gate(self.shoulder_blend_percent);
        &knee + &past_knee * (&plateau - &knee) + &past_shoulder * (&shoulder - &plateau)
    }

    /// State of charge for an open-circuit voltage, in percent.
    pub fn voltage_to_soc(&self, voltage: &Uncertain) -> Uncertain {
        let knee = self.knee_vertex_percent
            - ((voltage - self.knee_peak_volts).abs() * self.knee_curvature).sqrt();
        let plateau = (voltage - self.plateau_intercept) / self.plateau_slope;
        let shoulder = self.shoulder_vertex_percent
            + ((voltage - self.shoulder_trough_volts).abs() * self.shoulder_curvature).sqrt();
        let past_knee = voltage.smooth_gate(self.knee_blend_volts);
        let past_shoulder = voltage.smooth_gate(self.shoulder_blend_volts);
        &knee + &past_knee * (&plateau - &knee) + &past_shoulder * (&shoulder - &plateau)
    }
}

impl Default for DischargeCurve {
    fn default() -> Self {
        Self::PANASONIC_CGR17500
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use itertools::Itertools;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    /// In the plateau the gates saturate and the model is purely linear.
    #[test]
    fn plateau_is_linear() {
        let curve = DischargeCurve::default();
        let voltage = curve.soc_to_voltage(&Uncertain::exact(0.5));
        assert_abs_diff_eq!(voltage.mean(), 3.788_04, epsilon = 1e-9);
        assert_eq!(voltage.std_dev(), 0.0);
    }

    #[test]
    fn terminal_voltages() {
        let curve = DischargeCurve::default();
        let empty = curve.soc_to_voltage(&Uncertain::exact(0.0));
        assert_abs_diff_eq!(empty.mean(), 1.585, epsilon = 1e-6);
        let full = curve.soc_to_voltage(&Uncertain::exact(1.0));
        assert_abs_diff_eq!(full.mean(), 4.192_973, epsilon = 1e-6);
    }

    #[test]
    fn plateau_inversion() {
        let curve = DischargeCurve::default();
        let soc = curve.voltage_to_soc(&Uncertain::exact(3.8));
        assert_abs_diff_eq!(soc.mean(), 52.216_868, epsilon = 1e-4);
    }

    /// The voltage must rise strictly with the charge, including across
    /// the two blend points.
    #[test]
    fn monotonic_over_the_whole_range() {
        let curve = DischargeCurve::default();
        let monotonic = (0..=100)
            .map(|percent| curve.soc_to_voltage(&Uncertain::exact(f64::from(percent) / 100.0)))
            .tuple_windows()
            .all(|(left, right)| left.mean() < right.mean());
        assert!(monotonic);
    }

    #[test]
    fn round_trip_recovers_the_charge() {
        let curve = DischargeCurve::default();
        for percent in (5..=95).step_by(5) {
            let soc = f64::from(percent) / 100.0;
            let voltage = curve.soc_to_voltage(&Uncertain::exact(soc));
            let recovered = curve.voltage_to_soc(&voltage);
            assert_abs_diff_eq!(recovered.mean(), f64::from(percent), epsilon = 0.05);
        }
    }

    /// An ensemble straddling the knee blends the two segments instead of
    /// picking one.
    #[test]
    fn ensemble_blends_across_the_knee() {
        let mut rng = StdRng::seed_from_u64(42);
        let voltage = Uncertain::gaussian(3.61, 0.005, &mut rng).unwrap();
        let soc = DischargeCurve::default().voltage_to_soc(&voltage);
        assert!(soc.std_dev() > 0.0);
        assert!((15.0..=20.0).contains(&soc.mean()), "mean = {}", soc.mean());
        assert!(soc.support().min > 10.0);
        assert!(soc.support().max < 25.0);
    }
}
