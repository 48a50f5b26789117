//! Terminal rendering of period reports.
//!
//! The core hands over decimals and display hints; every string shown to the
//! user is produced here.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};
use riskcli_core::{
    CompareResult, MetricKind, MetricValue, MetricsResult, PeriodReport, UtcDateTime,
};

/// Shown in place of an undefined metric.
pub const UNDEFINED: &str = "—";

const SPARK_BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Coarse risk bucket derived from volatility, drawdown and VaR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskGrade {
    Low,
    Medium,
    High,
}

impl RiskGrade {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    const fn color(self) -> Color {
        match self {
            Self::Low => Color::Green,
            Self::Medium => Color::Yellow,
            Self::High => Color::Red,
        }
    }
}

/// Score volatility, drawdown and VaR; undefined inputs score zero.
pub fn risk_grade(metrics: &MetricsResult) -> RiskGrade {
    let mut score = 0;

    if let Some(vol) = metrics.annual_volatility.value() {
        score += if vol > 0.5 { 2 } else if vol > 0.25 { 1 } else { 0 };
    }
    if let Some(mdd) = metrics.max_drawdown.value() {
        score += if mdd < -0.5 { 2 } else if mdd < -0.25 { 1 } else { 0 };
    }
    if let Some(var) = metrics.var_95.value() {
        score += if var < -0.05 { 2 } else if var < -0.02 { 1 } else { 0 };
    }

    match score {
        4.. => RiskGrade::High,
        2..=3 => RiskGrade::Medium,
        _ => RiskGrade::Low,
    }
}

pub fn format_value(kind: MetricKind, value: MetricValue) -> String {
    let Some(value) = value.value() else {
        return String::from(UNDEFINED);
    };

    match kind {
        MetricKind::Percent => format!("{:.2}%", value * 100.0),
        MetricKind::Ratio => format!("{value:.3}"),
        MetricKind::Amount => human_number(value),
    }
}

/// `1234567.0` -> `1.23M`.
pub fn human_number(value: f64) -> String {
    let mut scaled = value;
    for unit in ["", "K", "M", "B", "T"] {
        if scaled.abs() < 1000.0 {
            return format!("{scaled:.2}{unit}");
        }
        scaled /= 1000.0;
    }
    format!("{scaled:.2}P")
}

pub fn sparkline(values: &[f64]) -> String {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if values.is_empty() || max - min <= 0.0 {
        return SPARK_BLOCKS[0].to_string().repeat(values.len());
    }

    let top = (SPARK_BLOCKS.len() - 1) as f64;
    values
        .iter()
        .map(|v| SPARK_BLOCKS[((v - min) / (max - min) * top) as usize])
        .collect()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_table(report: &PeriodReport) -> Table {
    let summary = &report.summary;
    let grade = risk_grade(&report.metrics);
    let benchmark = report
        .benchmark
        .as_ref()
        .map_or_else(|| String::from(UNDEFINED), ToString::to_string);
    let date = |ts: Option<UtcDateTime>| {
        ts.map_or_else(|| String::from(UNDEFINED), |ts| ts.date_string())
    };

    let mut table = new_table();
    table.set_header(vec![Cell::new(summary.symbol.as_str()), Cell::new("")]);
    table.add_row(vec![
        Cell::new("Period"),
        Cell::new(format!("{} ({}) vs {benchmark}", report.period, summary.interval)),
    ]);
    table.add_row(vec![Cell::new("Points"), Cell::new(summary.points)]);
    table.add_row(vec![
        Cell::new("Last"),
        Cell::new(
            summary
                .last_price
                .map_or_else(|| String::from(UNDEFINED), |price| format!("{price:.2}")),
        ),
    ]);
    table.add_row(vec![
        Cell::new("Range"),
        Cell::new(format!("{} → {}", date(summary.first), date(summary.last))),
    ]);
    table.add_row(vec![Cell::new("Spark"), Cell::new(sparkline(&report.recent_prices))]);
    table.add_row(vec![
        Cell::new("Risk Grade"),
        Cell::new(grade.as_str()).fg(grade.color()),
    ]);
    table
}

/// Header panel and metrics table for one period.
pub fn render_period(report: &PeriodReport) -> String {
    let mut metrics = new_table();
    metrics.set_header(vec!["Metric", "Value"]);
    for field in report.metrics.fields() {
        metrics.add_row(vec![
            Cell::new(field.label),
            Cell::new(format_value(field.kind, field.value)).set_alignment(CellAlignment::Right),
        ]);
    }

    format!("{}\n{metrics}", header_table(report))
}

/// Both headers and a single table with one value column per period.
pub fn render_compare(result: &CompareResult) -> String {
    let mut metrics = new_table();
    metrics.set_header(vec![
        String::from("Metric"),
        result.primary_period.to_string(),
        result.comparison_period.to_string(),
    ]);

    let primary = result.primary.metrics.fields();
    let comparison = result.comparison.metrics.fields();
    for (left, right) in primary.iter().zip(&comparison) {
        metrics.add_row(vec![
            Cell::new(left.label),
            Cell::new(format_value(left.kind, left.value)).set_alignment(CellAlignment::Right),
            Cell::new(format_value(right.kind, right.value)).set_alignment(CellAlignment::Right),
        ]);
    }

    format!(
        "{}\n{}\n{metrics}",
        header_table(&result.primary),
        header_table(&result.comparison)
    )
}
