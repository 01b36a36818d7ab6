//! Dashboard presentation
//!
//! Turns a [`Forecast`] into the static description the page is rendered
//! from: summary cards for today, a date/value table and a chart. The chart
//! keeps the numeric series; the table only holds display strings.

use crate::features::FORECAST_HORIZON;
use crate::models::{Forecast, PredictionStatus};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Date format used in tables and on the chart axis
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Chart style
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
}

/// Headline value for today
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryCard {
    pub title: String,
    pub value: String,
}

/// Date vs predicted values, already formatted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One plotted pollutant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Chart description handed to the browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<String>,
    pub series: Vec<ChartSeries>,
}

/// Everything the dashboard page shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub title: String,
    pub cards: Vec<SummaryCard>,
    pub table: TableView,
    pub chart: ChartSpec,
    /// Warnings about placeholder values
    pub notices: Vec<String>,
}

/// Format a number with exactly two decimals
#[must_use]
pub fn format_value(value: f64) -> String {
    format!("{value:.2}")
}

/// Format a number with two decimals and a unit suffix
#[must_use]
pub fn format_with_unit(value: f64, unit: &str) -> String {
    format!("{} {unit}", format_value(value))
}

/// Builds a [`DashboardView`] from a forecast
#[derive(Debug, Clone)]
pub struct Presenter {
    title: String,
    chart_kind: ChartKind,
}

impl Presenter {
    #[must_use]
    pub fn new<S: Into<String>>(title: S, chart_kind: ChartKind) -> Self {
        Self {
            title: title.into(),
            chart_kind,
        }
    }

    /// Chart first, then the string table; the forecast itself is never modified
    #[must_use]
    pub fn present(&self, forecast: &Forecast) -> DashboardView {
        let chart = self.chart(forecast);
        let table = Self::table(forecast);
        let cards = Self::cards(forecast);
        let notices = Self::notices(forecast);

        debug!(
            cards = cards.len(),
            rows = table.rows.len(),
            notices = notices.len(),
            "Built dashboard view"
        );

        DashboardView {
            title: self.title.clone(),
            cards,
            table,
            chart,
            notices,
        }
    }

    /// Today's temperature, humidity and one card per pollutant
    #[must_use]
    pub fn cards(forecast: &Forecast) -> Vec<SummaryCard> {
        let Some(today) = forecast.today() else {
            return Vec::new();
        };

        let mut cards = vec![
            SummaryCard {
                title: "Today's Temperature".to_string(),
                value: format_with_unit(today.temperature, "°C"),
            },
            SummaryCard {
                title: "Today's Humidity".to_string(),
                value: format_with_unit(today.humidity, "%"),
            },
        ];

        cards.extend(forecast.pollutants().map(|pollutant| SummaryCard {
            title: format!("Today's {}", pollutant.label()),
            value: format_with_unit(
                today.prediction(pollutant).unwrap_or(0.0),
                pollutant.unit(),
            ),
        }));

        cards
    }

    #[must_use]
    pub fn table(forecast: &Forecast) -> TableView {
        let mut columns = vec!["Date".to_string()];
        columns.extend(forecast.pollutants().map(|p| p.label().to_string()));

        let rows = forecast
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![row.date.format(DATE_FORMAT).to_string()];
                cells.extend(
                    forecast
                        .pollutants()
                        .map(|p| format_value(row.prediction(p).unwrap_or(0.0))),
                );
                cells
            })
            .collect();

        TableView { columns, rows }
    }

    #[must_use]
    pub fn chart(&self, forecast: &Forecast) -> ChartSpec {
        let labels: Vec<&str> = forecast.pollutants().map(|p| p.label()).collect();
        let joined = labels.join(" / ");

        ChartSpec {
            kind: self.chart_kind,
            title: format!("{joined} Levels Over {FORECAST_HORIZON} Days"),
            x_label: "Date".to_string(),
            y_label: format!("{joined} Value"),
            x: forecast
                .rows
                .iter()
                .map(|row| row.date.format(DATE_FORMAT).to_string())
                .collect(),
            series: forecast
                .pollutants()
                .map(|pollutant| ChartSeries {
                    name: pollutant.label().to_string(),
                    values: forecast.series(pollutant),
                })
                .collect(),
        }
    }

    fn notices(forecast: &Forecast) -> Vec<String> {
        forecast
            .degraded()
            .filter_map(|outcome| match &outcome.status {
                PredictionStatus::Degraded { reason } => Some(format!(
                    "{} forecast unavailable, showing placeholder values ({reason})",
                    outcome.pollutant.label()
                )),
                PredictionStatus::Model => None,
            })
            .collect()
    }
}
