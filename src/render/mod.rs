//! Presentation boundary: finished chart data in, artifact bytes out.

pub mod json;
pub mod svg;

use crate::Result;
use crate::series::AggregatedSeries;

use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// One line per series across the x categories.
    Lines,
    /// Grouped bars: one group per x category, one bar per series.
    Bars,
}

/// Everything a presenter needs; nothing it has to compute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: Option<String>,
    pub y_label: String,
    /// Display label per x category, in axis order.
    pub x_ticks: Vec<String>,
    pub series: Vec<AggregatedSeries>,
}

impl Chart {
    pub fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.values())
            .fold(0.0, f64::max)
    }
}

pub trait Presenter {
    fn extension(&self) -> &'static str;
    fn render(&self, chart: &Chart) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Svg,
    Json,
}

pub fn presenter_for(format: OutputFormat) -> Box<dyn Presenter> {
    match format {
        OutputFormat::Svg => Box::new(svg::SvgPresenter::default()),
        OutputFormat::Json => Box::new(json::JsonPresenter),
    }
}
