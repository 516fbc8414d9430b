use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    core::{CoulombReading, DirectReading, FusionReading},
    fmt::FormattedPercent,
    statistics::RunStatistics,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

const fn soc_color(soc_percent: f64) -> Color {
    if soc_percent >= 50.0 {
        Color::Green
    } else if soc_percent >= 20.0 {
        Color::DarkYellow
    } else {
        Color::Red
    }
}

pub fn build_direct_table(readings: &[DirectReading]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["#", "Voltage", "SoC", "SoC std"]);
    for reading in readings {
        table.add_row(vec![
            Cell::new(reading.index).add_attribute(Attribute::Dim),
            Cell::new(format!("{:.3} V", reading.measured_voltage.0))
                .set_alignment(CellAlignment::Right),
            Cell::new(FormattedPercent(reading.soc_percent))
                .set_alignment(CellAlignment::Right)
                .fg(soc_color(reading.soc_percent)),
            Cell::new(FormattedPercent(reading.soc_std_percent))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn build_coulomb_table(readings: &[CoulombReading]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Time", "Current", "SoC", "SoC std"]);
    for reading in readings {
        table.add_row(vec![
            Cell::new(reading.time).add_attribute(Attribute::Dim),
            Cell::new(format!("{:.0} mA", reading.current_milliamps))
                .set_alignment(CellAlignment::Right),
            Cell::new(FormattedPercent(reading.soc_percent))
                .set_alignment(CellAlignment::Right)
                .fg(soc_color(reading.soc_percent)),
            Cell::new(FormattedPercent(reading.soc_std_percent))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

#[must_use]
pub fn build_fusion_table(readings: &[FusionReading]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Time",
        "Current",
        "True SoC",
        "Measured",
        "Prior",
        "Posterior",
        "Posterior std",
    ]);
    for reading in readings {
        let error = (reading.posterior_soc_percent - reading.true_soc_percent).abs();
        table.add_row(vec![
            Cell::new(reading.time).add_attribute(Attribute::Dim),
            Cell::new(format!("{:.0} mA", reading.current_milliamps))
                .set_alignment(CellAlignment::Right),
            Cell::new(FormattedPercent(reading.true_soc_percent))
                .set_alignment(CellAlignment::Right),
            Cell::new(FormattedPercent(reading.measured_soc_percent))
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
            Cell::new(FormattedPercent(reading.prior_soc_percent))
                .set_alignment(CellAlignment::Right),
            Cell::new(FormattedPercent(reading.posterior_soc_percent))
                .set_alignment(CellAlignment::Right)
                .fg(if error <= 1.0 {
                    Color::Green
                } else if error <= 5.0 {
                    Color::DarkYellow
                } else {
                    Color::Red
                }),
            Cell::new(FormattedPercent(reading.posterior_std_percent))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

#[must_use]
pub fn build_statistics_table(statistics: &RunStatistics) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Runs", "Mean final SoC", "Std dev"]);
    table.add_row(vec![
        Cell::new(statistics.len()),
        Cell::new(FormattedPercent(statistics.mean()))
            .set_alignment(CellAlignment::Right)
            .fg(soc_color(statistics.mean())),
        Cell::new(FormattedPercent(statistics.std_dev())).set_alignment(CellAlignment::Right),
    ]);
    table
}
