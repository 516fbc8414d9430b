//! Machine-readable outputs: CSV files and JSON on standard output.

use std::path::Path;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    core::{CoulombReading, DirectReading, FusionReading},
    prelude::*,
};

/// One CSV row per reading.
pub trait CsvRecord {
    const HEADER: &'static str;

    fn row(&self) -> String;
}

impl CsvRecord for DirectReading {
    const HEADER: &'static str = "index,measured_voltage_volts,soc_percent,soc_std_percent";

    fn row(&self) -> String {
        format!(
            "{},{}",
            self.index,
            [self.measured_voltage.0, self.soc_percent, self.soc_std_percent].iter().join(","),
        )
    }
}

impl CsvRecord for CoulombReading {
    const HEADER: &'static str = "time_seconds,current_milliamps,soc_percent,soc_std_percent";

    fn row(&self) -> String {
        [self.time.0, self.current_milliamps, self.soc_percent, self.soc_std_percent]
            .iter()
            .join(",")
    }
}

impl CsvRecord for FusionReading {
    const HEADER: &'static str = "time_seconds,current_milliamps,true_soc_percent,\
        measured_soc_percent,prior_soc_percent,posterior_soc_percent,posterior_std_percent";

    fn row(&self) -> String {
        [
            self.time.0,
            self.current_milliamps,
            self.true_soc_percent,
            self.measured_soc_percent,
            self.prior_soc_percent,
            self.posterior_soc_percent,
            self.posterior_std_percent,
        ]
        .iter()
        .join(",")
    }
}

pub fn write_csv<R: CsvRecord>(readings: &[R], path: &Path) -> Result {
    let mut contents = String::from(R::HEADER);
    contents.push('\n');
    for reading in readings {
        contents.push_str(&reading.row());
        contents.push('\n');
    }
    std::fs::write(path, contents)
        .with_context(|| format!(r#"could not write to output CSV file "{}""#, path.display()))
}

pub fn print_json<R: Serialize>(readings: &[R]) -> Result {
    println!("{}", serde_json::to_string_pretty(readings)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::quantity::{time::Seconds, voltage::Volts};

    use super::*;

    #[test]
    fn direct_rows() {
        let reading = DirectReading {
            index: 0,
            measured_voltage: Volts(3.8),
            soc_percent: 52.25,
            soc_std_percent: 1.85,
        };
        assert_eq!(reading.row(), "0,3.8,52.25,1.85");
    }

    #[test]
    fn csv_file_round_trip() {
        let readings = vec![
            CoulombReading {
                time: Seconds(1000.0),
                current_milliamps: 500.0,
                soc_percent: 100.0,
                soc_std_percent: 0.0,
            },
            CoulombReading {
                time: Seconds(2000.0),
                current_milliamps: 500.5,
                soc_percent: 89.09,
                soc_std_percent: 0.02,
            },
        ];
        let path = std::env::temp_dir().join("fuelgauge-coulomb-test.csv");
        write_csv(&readings, &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CoulombReading::HEADER);
        assert_eq!(lines[1], "1000,500,100,0");
        assert_eq!(lines[2], "2000,500.5,89.09,0.02");
    }

    #[test]
    fn csv_failure_names_the_path() {
        let readings: Vec<CoulombReading> = Vec::new();
        let path = std::env::temp_dir().join("fuelgauge-no-such-directory").join("out.csv");
        let error = write_csv(&readings, &path).unwrap_err();
        assert!(error.to_string().contains("could not write to output CSV file"));
        assert!(error.to_string().contains("fuelgauge-no-such-directory"));
    }

    #[test]
    fn json_serializes_field_names_and_quantities() {
        let readings = vec![FusionReading {
            time: Seconds(1000.0),
            current_milliamps: 500.0,
            true_soc_percent: 100.0,
            measured_soc_percent: 99.5,
            prior_soc_percent: 100.0,
            posterior_soc_percent: 99.9,
            posterior_std_percent: 0.1,
        }];
        let json = serde_json::to_string_pretty(&readings).unwrap();
        assert!(json.contains("\"time\": 1000.0"));
        assert!(json.contains("\"posterior_soc_percent\": 99.9"));
        assert!(json.contains("\"current_milliamps\": 500.0"));
    }
}
