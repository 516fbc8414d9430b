use crate::{
    core::curve::DischargeCurve,
    prelude::*,
    quantity::{
        Zero,
        charge::{Coulombs, MilliampHours},
        current::Amperes,
        time::Seconds,
        voltage::Volts,
    },
    uncertain::Uncertain,
};

/// Discrete-time simulation of a discharging lithium-ion cell.
///
/// All electrical state is [`Uncertain`], so noise fed in through the load
/// current propagates into the remaining charge, the state of charge and
/// the terminal voltage. Once the representative voltage falls to the
/// expended level the cell stays expended; later updates only advance the
/// clock.
#[must_use]
#[derive(Debug)]
pub struct Battery {
    curve: DischargeCurve,
    total_capacity: Coulombs,
    remaining_capacity: Uncertain,
    soc: Uncertain,
    current: Uncertain,
    current_old: Uncertain,
    voltage: Uncertain,
    time_now: Seconds,
    time_old: Seconds,
    expended: bool,
}

impl Battery {
    /// Terminal voltage of a freshly charged cell.
    const INITIAL_VOLTAGE: Volts = Volts(4.2);

    /// The cell counts as expended once its voltage falls this low.
    const EXPENDED_VOLTAGE: Volts = Volts(2.0);

    /// Parasitic self-discharge.
    const LEAK_CURRENT: Amperes = Amperes(1.0e-6);

    pub fn new(curve: DischargeCurve, capacity: MilliampHours) -> Result<Self> {
        ensure!(
            capacity.0.is_finite() && capacity > MilliampHours::ZERO,
            "the rated capacity must be positive, got {capacity}",
        );
        let total_capacity = Coulombs::from(capacity);
        Ok(Self {
            curve,
            total_capacity,
            remaining_capacity: Uncertain::exact(total_capacity.0),
            soc: Uncertain::exact(1.0),
            current: Uncertain::exact(0.0),
            current_old: Uncertain::exact(0.0),
            voltage: Uncertain::exact(Self::INITIAL_VOLTAGE.0),
            time_now: Seconds::ZERO,
            time_old: Seconds::ZERO,
            expended: false,
        })
    }

    /// Advance the simulation to `time` under the given load.
    ///
    /// The cell current follows from energy conservation across the load
    /// converter, plus the leak. Depletion over the new interval uses the
    /// previous interval's current, so the first update after
    /// initialization establishes the draw without taking any charge out.
    pub fn update(&mut self, time: Seconds, load_current: &Uncertain, load_voltage: Volts) {
        self.time_now = time;
        if self.expended {
            return;
        }

        self.current = load_current * load_voltage.0 / &self.voltage + Self::LEAK_CURRENT.0;

        let elapsed = self.time_now - self.time_old;
        self.remaining_capacity = &self.remaining_capacity - &self.current_old * elapsed.0;
        self.soc = (&self.remaining_capacity / self.total_capacity.0).max(0.0);
        self.voltage = self.curve.soc_to_voltage(&self.soc);

        if self.voltage.mean() <= Self::EXPENDED_VOLTAGE.0 {
            debug!(time = %self.time_now, voltage = %self.voltage, "the cell is expended");
            self.expended = true;
        }

        self.current_old = self.current.clone();
        self.time_old = self.time_now;
    }

    /// Override the state of charge, given as a fraction.
    ///
    /// Remaining charge and voltage follow the new value; the integration
    /// state keeps its clock and currents. The value is taken as given,
    /// without the floor clamp that [`Battery::update`] applies, and the
    /// expended check still runs.
    pub fn set_soc(&mut self, soc: Uncertain) {
        self.remaining_capacity = &soc * self.total_capacity.0;
        self.voltage = self.curve.soc_to_voltage(&soc);
        self.soc = soc;
        if self.voltage.mean() <= Self::EXPENDED_VOLTAGE.0 {
            debug!(time = %self.time_now, voltage = %self.voltage, "the cell is expended");
            self.expended = true;
        }
    }

    pub const fn is_expended(&self) -> bool {
        self.expended
    }

    pub const fn soc(&self) -> &Uncertain {
        &self.soc
    }

    pub const fn voltage(&self) -> &Uncertain {
        &self.voltage
    }

    pub const fn current(&self) -> &Uncertain {
        &self.current
    }

    pub const fn remaining_capacity(&self) -> &Uncertain {
        &self.remaining_capacity
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn fresh_cell() -> Battery {
        Battery::new(DischargeCurve::default(), MilliampHours(1000.0)).unwrap()
    }

    #[test]
    #[expect(clippy::float_cmp)]
    fn initial_state() {
        let battery = fresh_cell();
        assert!(!battery.is_expended());
        assert_eq!(battery.soc().mean(), 1.0);
        assert_eq!(battery.voltage().mean(), 4.2);
        assert_eq!(battery.remaining_capacity().mean(), 3600.0);
        assert_eq!(battery.current().mean(), 0.0);
    }

    #[test]
    fn invalid_capacity_is_rejected() {
        assert!(Battery::new(DischargeCurve::default(), MilliampHours(0.0)).is_err());
        assert!(Battery::new(DischargeCurve::default(), MilliampHours(-1.0)).is_err());
        assert!(Battery::new(DischargeCurve::default(), MilliampHours(f64::NAN)).is_err());
    }

    /// The first update only establishes the draw; the voltage snaps from
    /// the nominal fresh-cell value onto the discharge curve.
    #[test]
    #[expect(clippy::float_cmp)]
    fn first_update_takes_no_charge() {
        let mut battery = fresh_cell();
        battery.update(Seconds(1000.0), &Uncertain::exact(0.5), Volts(3.3));
        assert_eq!(battery.soc().mean(), 1.0);
        assert_abs_diff_eq!(battery.voltage().mean(), 4.192_973, epsilon = 1e-6);
        assert_abs_diff_eq!(battery.current().mean(), 0.5 * 3.3 / 4.2 + 1e-6, epsilon = 1e-12);
    }

    /// Depletion over an interval uses the current established by the
    /// previous update.
    #[test]
    fn depletion_lags_one_interval() {
        let mut battery = fresh_cell();
        let load = Uncertain::exact(0.5);
        battery.update(Seconds(1000.0), &load, Volts(3.3));
        battery.update(Seconds(2000.0), &load, Volts(3.3));
        let expected = (3600.0 - (0.5 * 3.3 / 4.2 + 1e-6) * 1000.0) / 3600.0;
        assert_abs_diff_eq!(battery.soc().mean(), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(battery.soc().mean(), 0.890_873, epsilon = 1e-5);
    }

    /// Overdraft clamps the state of charge at zero and expends the cell,
    /// while the remaining charge keeps the (negative) book value.
    #[test]
    fn overdraft_clamps_and_expends() {
        let mut battery = fresh_cell();
        let load = Uncertain::exact(10.0);
        battery.update(Seconds(1000.0), &load, Volts(3.3));
        battery.update(Seconds(2000.0), &load, Volts(3.3));
        assert!(battery.is_expended());
        assert_eq!(battery.soc().mean(), 0.0);
        assert_abs_diff_eq!(battery.voltage().mean(), 1.585, epsilon = 1e-6);
        assert!(battery.remaining_capacity().mean() < 0.0);
    }

    #[test]
    #[expect(clippy::float_cmp)]
    fn expended_is_sticky() {
        let mut battery = fresh_cell();
        let load = Uncertain::exact(10.0);
        battery.update(Seconds(1000.0), &load, Volts(3.3));
        battery.update(Seconds(2000.0), &load, Volts(3.3));
        assert!(battery.is_expended());
        let soc = battery.soc().mean();
        let voltage = battery.voltage().mean();
        let remaining = battery.remaining_capacity().mean();
        battery.update(Seconds(3000.0), &Uncertain::exact(0.0), Volts(3.3));
        assert!(battery.is_expended());
        assert_eq!(battery.soc().mean(), soc);
        assert_eq!(battery.voltage().mean(), voltage);
        assert_eq!(battery.remaining_capacity().mean(), remaining);
        assert_eq!(soc, 0.0);
        assert_abs_diff_eq!(battery.voltage().mean(), 1.585, epsilon = 1e-6);
    }

    #[test]
    fn noisy_load_spreads_the_estimate() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut battery = fresh_cell();
        let load = Uncertain::gaussian(0.5, 0.001, &mut rng).unwrap();
        battery.update(Seconds(1000.0), &load, Volts(3.3));
        battery.update(Seconds(2000.0), &load, Volts(3.3));
        assert!(battery.soc().std_dev() > 0.0);
        assert!(battery.voltage().std_dev() > 0.0);
    }

    #[test]
    fn override_recomputes_charge_and_voltage() {
        let mut battery = fresh_cell();
        battery.set_soc(Uncertain::exact(0.5));
        assert_abs_diff_eq!(battery.remaining_capacity().mean(), 1800.0, epsilon = 1e-9);
        assert_abs_diff_eq!(battery.voltage().mean(), 3.788_04, epsilon = 1e-6);
        assert!(!battery.is_expended());
    }

    #[test]
    fn override_below_the_knee_expends() {
        let mut battery = fresh_cell();
        battery.set_soc(Uncertain::exact(0.01));
        assert_abs_diff_eq!(battery.voltage().mean(), 1.803_75, epsilon = 1e-5);
        assert!(battery.is_expended());
    }

    /// The override takes the value as given, even above full charge.
    #[test]
    #[expect(clippy::float_cmp)]
    fn override_does_not_clamp() {
        let mut battery = fresh_cell();
        battery.set_soc(Uncertain::exact(1.2));
        assert_abs_diff_eq!(battery.remaining_capacity().mean(), 4320.0, epsilon = 1e-9);
        assert_eq!(battery.soc().mean(), 1.2);
        assert!(!battery.is_expended());
    }
}
