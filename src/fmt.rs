use std::fmt::{Debug, Display, Formatter};

/// A percentage that is already scaled to 0–100.
pub struct FormattedPercent(pub f64);

impl Debug for FormattedPercent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for FormattedPercent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering() {
        assert_eq!(FormattedPercent(52.216_868).to_string(), "52.22%");
        assert_eq!(FormattedPercent(100.0).to_string(), "100.00%");
        assert_eq!(format!("{:?}", FormattedPercent(0.0)), "0.00%");
    }
}
