//! Core solve-time statistics library: parses a pasted times log and computes the
//! running mean, trimmed rolling averages (Ao5/Ao12), global bests, and the default
//! chart domain for presentation layers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod domain;
pub mod parse;
pub mod series;
pub mod summary;

pub use domain::{default_y_domain, generate_ticks, YDomain, ZoomDirection};
pub use parse::{classify_lines, format_records, parse_records, LineClass, TimingRecord};
pub use series::{compute_series, trimmed_mean, SeriesPoint};
pub use summary::{best_trimmed_average, summarize, SummaryStats};

/// Window of the short trimmed average (Ao5).
pub const SHORT_WINDOW: usize = 5;
/// Window of the long trimmed average (Ao12).
pub const LONG_WINDOW: usize = 12;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("no usable solve times")]
    NoData,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Display settings shared by the domain helper and the zoom handler.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Params {
    pub padding_ratio: f64,
    pub tick_count: usize,
    pub zoom_in_factor: f64,
    pub zoom_out_factor: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            padding_ratio: 0.1,
            tick_count: 10,
            zoom_in_factor: 0.9,
            zoom_out_factor: 1.1,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), StatsError> {
        if !(self.padding_ratio >= 0.0 && self.padding_ratio.is_finite()) {
            return Err(StatsError::InvalidParameter(format!(
                "padding ratio must be a non-negative number, got {}",
                self.padding_ratio
            )));
        }
        if self.tick_count < 2 {
            return Err(StatsError::InvalidParameter(format!(
                "tick count must be at least 2, got {}",
                self.tick_count
            )));
        }
        for (name, factor) in [
            ("zoom-in", self.zoom_in_factor),
            ("zoom-out", self.zoom_out_factor),
        ] {
            if !(factor > 0.0 && factor.is_finite()) {
                return Err(StatsError::InvalidParameter(format!(
                    "{name} factor must be positive, got {factor}"
                )));
            }
        }
        Ok(())
    }
}

/// Everything the chart and stats panel need for one pasted log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Analysis {
    pub records: Vec<TimingRecord>,
    pub series: Vec<SeriesPoint>,
    pub stats: SummaryStats,
    pub default_domain: YDomain,
    pub domain: YDomain,
}

impl Analysis {
    pub fn zoom(&mut self, direction: ZoomDirection, params: &Params) {
        self.domain = self.domain.zoom(direction, self.stats.mean, params);
    }

    pub fn reset_zoom(&mut self) {
        self.domain = self.default_domain;
    }

    pub fn ticks(&self, params: &Params) -> Result<Vec<f64>, StatsError> {
        generate_ticks(self.domain.low, self.domain.high, params.tick_count)
    }
}

/// Parse `text` and compute the chart series, summary and default display domain.
///
/// Returns [`StatsError::NoData`] when no line of `text` holds a solve time.
pub fn analyze(text: &str, params: &Params) -> Result<Analysis, StatsError> {
    params.validate()?;
    let records = parse_records(text);
    analyze_records(records, params)
}

/// Same as [`analyze`] for records that were already parsed.
pub fn analyze_records(
    records: Vec<TimingRecord>,
    params: &Params,
) -> Result<Analysis, StatsError> {
    if records.is_empty() {
        return Err(StatsError::NoData);
    }
    let series = compute_series(&records)?;
    let stats = summarize(&records)?;
    let times: Vec<f64> = records.iter().map(|r| r.elapsed_s).collect();
    let default_domain = default_y_domain(&times, params.padding_ratio)?;
    Ok(Analysis {
        records,
        series,
        stats,
        default_domain,
        domain: default_domain,
    })
}

/// Round to two decimals, the precision of every displayed average.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
