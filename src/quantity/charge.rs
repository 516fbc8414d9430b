quantity!(Coulombs, "C");
quantity!(MilliampHours, "mAh");

impl From<MilliampHours> for Coulombs {
    /// One ampere-hour is 3600 coulombs, scaled down from milli-units.
    fn from(capacity: MilliampHours) -> Self {
        Self(3600.0 * capacity.0 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rated_capacity_to_charge() {
        assert_eq!(Coulombs::from(MilliampHours(1000.0)), Coulombs(3600.0));
        assert_eq!(Coulombs::from(MilliampHours(250.0)), Coulombs(900.0));
    }
}
