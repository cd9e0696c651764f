use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::{round2, trimmed_mean, StatsError, TimingRecord, LONG_WINDOW, SHORT_WINDOW};

/// Session-wide figures shown in the stats panel.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SummaryStats {
    pub best: f64,
    pub worst: f64,
    pub mean: f64,
    pub total_count: usize,
    pub best_ao5: Option<f64>,
    pub best_ao12: Option<f64>,
}

/// Compute best/worst/mean and the best Ao5/Ao12 over every window of `records`.
pub fn summarize(records: &[TimingRecord]) -> Result<SummaryStats, StatsError> {
    if records.is_empty() {
        return Err(StatsError::NoData);
    }
    let times: Vec<f64> = records.iter().map(|r| r.elapsed_s).collect();

    let mut best = f64::INFINITY;
    let mut worst = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for &t in &times {
        best = best.min(t);
        worst = worst.max(t);
        sum += t;
    }

    Ok(SummaryStats {
        best: round2(best),
        worst: round2(worst),
        mean: round2(sum / times.len() as f64),
        total_count: times.len(),
        best_ao5: best_trimmed_average(&times, SHORT_WINDOW).map(round2),
        best_ao12: best_trimmed_average(&times, LONG_WINDOW).map(round2),
    })
}

/// Lowest trimmed mean over every contiguous `window`-sized slice of `times`.
///
/// `None` when `times` is shorter than `window`.
pub fn best_trimmed_average(times: &[f64], window: usize) -> Option<f64> {
    if window == 0 || times.len() < window {
        return None;
    }
    times
        .windows(window)
        .filter_map(trimmed_mean)
        .min_by_key(|avg| OrderedFloat(*avg))
}

fn fmt_optional(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}s", v),
        None => "-".to_string(),
    }
}

impl fmt::Display for SummaryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Best:         {:.2}s", self.best)?;
        writeln!(f, "Worst:        {:.2}s", self.worst)?;
        writeln!(f, "Mean:         {:.2}s", self.mean)?;
        writeln!(f, "Total Solves: {}", self.total_count)?;
        writeln!(f, "Best Ao5:     {}", fmt_optional(self.best_ao5))?;
        write!(f, "Best Ao12:    {}", fmt_optional(self.best_ao12))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_records;

    fn records(times: &[f64]) -> Vec<TimingRecord> {
        times
            .iter()
            .enumerate()
            .map(|(i, &elapsed_s)| TimingRecord {
                solve: i as u64 + 1,
                elapsed_s,
            })
            .collect()
    }

    #[test]
    fn five_solve_scenario() {
        let records = parse_records("1. 10.00\n2. 20.00\n3. 30.00\n4. 40.00\n5. 50.00");
        let stats = summarize(&records).unwrap();
        assert_eq!(stats.best, 10.0);
        assert_eq!(stats.worst, 50.0);
        assert_eq!(stats.mean, 30.0);
        assert_eq!(stats.total_count, 5);
        assert_eq!(stats.best_ao5, Some(30.0));
        assert_eq!(stats.best_ao12, None);
    }

    #[test]
    fn best_window_is_not_the_last_one() {
        // windows: [9,10,11,30,31] -> 17.0, [10,11,30,31,32] -> 24.0
        let stats = summarize(&records(&[9.0, 10.0, 11.0, 30.0, 31.0, 32.0])).unwrap();
        assert_eq!(stats.best_ao5, Some(17.0));
    }

    #[test]
    fn best_ao12_needs_twelve_records() {
        let times: Vec<f64> = (1..=11).map(|v| v as f64).collect();
        assert_eq!(summarize(&records(&times)).unwrap().best_ao12, None);
        let times: Vec<f64> = (1..=14).rev().map(|v| v as f64).collect();
        // best window is 12..=1, trimmed to 2..=11
        assert_eq!(summarize(&records(&times)).unwrap().best_ao12, Some(6.5));
    }

    #[test]
    fn zero_best_average_is_present() {
        let stats = summarize(&records(&[0.0; 5])).unwrap();
        assert_eq!(stats.best_ao5, Some(0.0));
        assert!(stats.to_string().contains("Best Ao5:     0.00s"));
    }

    #[test]
    fn panel_uses_dash_for_missing_averages() {
        let stats = summarize(&records(&[12.5, 13.25])).unwrap();
        let panel = stats.to_string();
        assert!(panel.contains("Best:         12.50s"));
        assert!(panel.contains("Mean:         12.88s"));
        assert!(panel.contains("Total Solves: 2"));
        assert!(panel.contains("Best Ao5:     -"));
        assert!(panel.ends_with("Best Ao12:    -"));
    }

    #[test]
    fn window_helper_edges() {
        assert_eq!(best_trimmed_average(&[1.0, 2.0, 3.0], 0), None);
        assert_eq!(best_trimmed_average(&[1.0, 2.0, 3.0], 4), None);
        assert_eq!(best_trimmed_average(&[1.0, 2.0, 3.0], 3), Some(2.0));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(summarize(&[]), Err(StatsError::NoData));
    }
}
