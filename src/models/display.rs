//! Display model implementations for table and JSON output
//!
//! Display models turn aggregation results into CLI rows with column names
//! and fixed-precision values. Every report type implements [`Formattable`].

use colored::{ColoredString, Colorize};
use serde::Serialize;
use tabled::Tabled;

use crate::aggregate::{
    DailyWindow, Granularity, LiveStatus, MonthlyAggregate, RollupPoint, RollupSeries,
    YearSnapshot, YearToDate, YearlyAggregate,
};
use crate::cli::OutputFormat;
use crate::client::DailyRecord;
use crate::error::Result;
use crate::output::formatters::{format_age, format_local_time, signed_pct, two_decimals};
use crate::output::{Formattable, csv, json, table};

/// One day of production.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct DailyDisplay {
    #[tabled(rename = "DATE")]
    pub date: String,

    #[tabled(rename = "ENERGY (MWh)")]
    pub energy_mwh: String,

    #[tabled(rename = "WIND AVG (m/s)")]
    pub wind_avg: String,

    #[tabled(rename = "WIND MAX (m/s)")]
    pub wind_max: String,

    #[tabled(rename = "AVAILABILITY (%)")]
    pub availability: String,

    #[tabled(rename = "LOW WIND (%)")]
    pub low_wind_pct: String,
}

impl DailyDisplay {
    pub fn new(date: impl Into<String>, record: &DailyRecord) -> Self {
        Self {
            date: date.into(),
            energy_mwh: two_decimals(record.energy_yield / 1000.0),
            wind_avg: format!("{:.1}", record.wind_avg),
            wind_max: format!("{:.1}", record.wind_max),
            availability: two_decimals(record.availability),
            low_wind_pct: two_decimals(record.low_wind_pct()),
        }
    }
}

/// One period of a rollup series.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct SeriesDisplay {
    #[tabled(rename = "PERIOD")]
    pub period: String,

    #[tabled(rename = "ENERGY")]
    pub energy: String,

    #[tabled(rename = "CAPACITY FACTOR (%)")]
    pub capacity_factor: String,

    #[tabled(rename = "YOY CHANGE")]
    pub yoy_change: String,

    #[tabled(rename = "")]
    pub marker: String,
}

impl SeriesDisplay {
    fn new(point: &RollupPoint, series: &RollupSeries) -> Self {
        Self {
            period: point.label.clone(),
            energy: format!("{} {}", two_decimals(point.energy_yield), series.unit),
            capacity_factor: two_decimals(point.capacity_factor),
            yoy_change: signed_pct(point.yoy_change),
            marker: if point.is_current_period {
                "in progress".to_string()
            } else {
                String::new()
            },
        }
    }
}

/// A labelled value, for single-record reports.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct FieldDisplay {
    #[tabled(rename = "FIELD")]
    pub field: String,

    #[tabled(rename = "VALUE")]
    pub value: String,
}

fn field(name: &str, value: impl Into<String>) -> FieldDisplay {
    FieldDisplay {
        field: name.to_string(),
        value: value.into(),
    }
}

fn colored_change(value: f64) -> ColoredString {
    let text = signed_pct(value);
    if value > 0.0 {
        text.as_str().green()
    } else if value < 0.0 {
        text.as_str().red()
    } else {
        text.as_str().dimmed()
    }
}

fn period_state(is_current: bool) -> &'static str {
    if is_current { "in progress" } else { "closed" }
}

/// Render `fields` for the non-JSON formats: a table, or aligned pretty lines
fn format_fields(title: &str, fields: &[FieldDisplay], format: OutputFormat) -> String {
    match format {
        OutputFormat::Pretty => {
            let width = fields.iter().map(|f| f.field.len()).max().unwrap_or(0);
            let mut out = format!("{}\n", title.bold());
            for f in fields {
                out.push_str(&format!("\n{:<width$}  {}", f.field, f.value, width = width));
            }
            out
        }
        _ => table::format_table(fields),
    }
}

impl Formattable for RollupSeries {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(json::format_json(self)?),
            OutputFormat::Csv => Ok(csv::format_series_csv(self).trim_end().to_string()),
            OutputFormat::Table => {
                let rows: Vec<SeriesDisplay> =
                    self.points.iter().map(|p| SeriesDisplay::new(p, self)).collect();
                Ok(table::format_table(&rows))
            }
            OutputFormat::Pretty => {
                let title = match self.granularity {
                    Granularity::Monthly => "Production, last 12 months",
                    Granularity::Yearly => "Production by year",
                };
                if self.is_empty() {
                    return Ok(format!("{}\n\nNo results found.", title.bold()));
                }

                let width = self.points.iter().map(|p| p.label.len()).max().unwrap_or(0);
                let mut out = format!("{}\n", title.bold());
                for p in &self.points {
                    let label = format!("{:<width$}", p.label, width = width);
                    let label = if p.is_current_period {
                        label.as_str().cyan().bold()
                    } else {
                        label.as_str().normal()
                    };
                    out.push_str(&format!(
                        "\n{}  {:>10} {}  CF {:>6}%  YoY {}",
                        label,
                        two_decimals(p.energy_yield),
                        self.unit,
                        two_decimals(p.capacity_factor),
                        colored_change(p.yoy_change)
                    ));
                    if p.is_current_period {
                        out.push_str(&format!("  {}", "(in progress)".dimmed()));
                    }
                }
                Ok(out)
            }
        }
    }
}

impl Formattable for DailyWindow {
    fn format(&self, format: OutputFormat) -> Result<String> {
        if format == OutputFormat::Json {
            return Ok(json::format_json(self)?);
        }

        let rows: Vec<DailyDisplay> = self
            .days()
            .map(|(day, record)| DailyDisplay::new(day.to_string(), record))
            .collect();
        let rendered = table::format_table(&rows);

        match format {
            OutputFormat::Pretty => {
                let total_mwh: f64 = self.records.iter().map(|r| r.energy_yield).sum::<f64>() / 1000.0;
                Ok(format!(
                    "{} {} to {}\n{}\nTotal: {} MWh",
                    "Daily production".bold(),
                    self.first_day,
                    self.last_day,
                    rendered,
                    two_decimals(total_mwh).as_str().bold()
                ))
            }
            _ => Ok(rendered),
        }
    }
}

impl Formattable for LiveStatus {
    fn format(&self, format: OutputFormat) -> Result<String> {
        if format == OutputFormat::Json {
            return Ok(json::format_json(self)?);
        }

        let fields = [
            field("Energy yield", format!("{} kWh", two_decimals(self.energy_yield_kwh))),
            field(
                "Power",
                format!(
                    "{} kW ({}% of nominal)",
                    two_decimals(self.power_avg_kw),
                    two_decimals(self.power_avg_pct)
                ),
            ),
            field("Wind", format!("{:.1} m/s", self.wind_avg)),
            field("Generator speed", format!("{:.0} rpm", self.generator_speed_rpm)),
            field("Data age", format_age(&self.freshness)),
            field("Last update", format_local_time(self.last_update)),
        ];
        Ok(format_fields("Turbine status", &fields, format))
    }
}

impl Formattable for YearToDate {
    fn format(&self, format: OutputFormat) -> Result<String> {
        if format == OutputFormat::Json {
            return Ok(json::format_json(self)?);
        }

        let prior = self
            .prior_year_total_mwh
            .map(|mwh| format!("{} MWh", two_decimals(mwh)))
            .unwrap_or_else(|| "unavailable".to_string());
        let change = match format {
            OutputFormat::Pretty => colored_change(self.yoy_change).to_string(),
            _ => signed_pct(self.yoy_change),
        };

        let fields = [
            field("Year", self.year.to_string()),
            field("Through month", format!("{:02}", self.up_to_month)),
            field("Total", format!("{} MWh", two_decimals(self.total_mwh))),
            field(&format!("Same point {}", self.year - 1), prior),
            field("YoY change", change),
        ];
        Ok(format_fields("Year to date", &fields, format))
    }
}

impl Formattable for MonthlyAggregate {
    fn format(&self, format: OutputFormat) -> Result<String> {
        if format == OutputFormat::Json {
            return Ok(json::format_json(self)?);
        }

        let fields = [
            field("Month", format!("{:04}-{:02}", self.year, self.month)),
            field("Energy", format!("{} MWh", two_decimals(self.energy_yield_mwh))),
            field("Period", period_state(self.is_current_period)),
        ];
        Ok(format_fields("Monthly production", &fields, format))
    }
}

impl Formattable for YearlyAggregate {
    fn format(&self, format: OutputFormat) -> Result<String> {
        if format == OutputFormat::Json {
            return Ok(json::format_json(self)?);
        }

        let fields = [
            field("Year", self.year.to_string()),
            field("Energy", format!("{} MWh", two_decimals(self.energy_yield_mwh))),
            field("Period", period_state(self.is_current_period)),
        ];
        Ok(format_fields("Yearly production", &fields, format))
    }
}

/// JSON is the upstream body, unwrapped and unchanged.
impl Formattable for YearSnapshot {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(self.raw.clone()),
            OutputFormat::Pretty => {
                let fields = [
                    field("Year", self.year.to_string()),
                    field("Daily records", self.report.data.len().to_string()),
                    field(
                        "Energy",
                        format!("{} MWh", two_decimals(self.report.total_energy_kwh() / 1000.0)),
                    ),
                ];
                Ok(format_fields("Year snapshot", &fields, format))
            }
            _ => {
                let rows: Vec<DailyDisplay> = self
                    .report
                    .data
                    .iter()
                    .map(|r| DailyDisplay::new(r.date.clone(), r))
                    .collect();
                Ok(table::format_table(&rows))
            }
        }
    }
}
