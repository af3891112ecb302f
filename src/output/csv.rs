//! CSV export of rollup series

use super::formatters::two_decimals;
use crate::aggregate::{Granularity, RollupSeries};

/// Header row for a series of the given granularity
pub fn csv_header(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Monthly => "Month,Energy (MWh),Capacity Factor (%),YoY Change (%)",
        Granularity::Yearly => "Year,Energy (GWh),Capacity Factor (%),YoY Change (%)",
    }
}

/// One header line plus one line per point, oldest first, numbers to two
/// decimals. Labels never contain commas or quotes.
pub fn format_series_csv(series: &RollupSeries) -> String {
    let mut out = String::from(csv_header(series.granularity));
    out.push('\n');

    for point in &series.points {
        out.push_str(&format!(
            "{},{},{},{}\n",
            point.label,
            two_decimals(point.energy_yield),
            two_decimals(point.capacity_factor),
            two_decimals(point.yoy_change)
        ));
    }

    out
}
