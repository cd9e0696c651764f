//! Y-axis range helpers: padded default domain, evenly spaced ticks and wheel zoom.

use serde::{Deserialize, Serialize};

use crate::{Params, StatsError};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct YDomain {
    pub low: f64,
    pub high: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Map a wheel event's vertical delta: scrolling down (positive) zooms out.
    pub fn from_wheel_delta(delta_y: f64) -> Self {
        if delta_y > 0.0 {
            ZoomDirection::Out
        } else {
            ZoomDirection::In
        }
    }

    fn factor(self, params: &Params) -> f64 {
        match self {
            ZoomDirection::In => params.zoom_in_factor,
            ZoomDirection::Out => params.zoom_out_factor,
        }
    }
}

impl YDomain {
    pub fn span(&self) -> f64 {
        self.high - self.low
    }

    /// Scale the half-range by the zoom factor and recenter it on `center`.
    ///
    /// The low bound never drops below zero; the high bound is not adjusted for it.
    pub fn zoom(&self, direction: ZoomDirection, center: f64, params: &Params) -> YDomain {
        let half = self.span() / 2.0 * direction.factor(params);
        YDomain {
            low: (center - half).max(0.0),
            high: center + half,
        }
    }
}

/// Pad the range of `times` by `padding_ratio` of its width on both sides, clamped at zero.
pub fn default_y_domain(times: &[f64], padding_ratio: f64) -> Result<YDomain, StatsError> {
    if times.is_empty() {
        return Err(StatsError::NoData);
    }
    let min = times.iter().copied().fold(f64::INFINITY, f64::min);
    let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let padding = (max - min) * padding_ratio;
    Ok(YDomain {
        low: (min - padding).max(0.0),
        high: max + padding,
    })
}

/// `count` evenly spaced values from `low` to `high` inclusive, rounded to one decimal.
pub fn generate_ticks(low: f64, high: f64, count: usize) -> Result<Vec<f64>, StatsError> {
    if count < 2 {
        return Err(StatsError::InvalidParameter(format!(
            "tick count must be at least 2, got {count}"
        )));
    }
    let step = (high - low) / (count - 1) as f64;
    Ok((0..count)
        .map(|i| round1(low + step * i as f64))
        .collect())
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
