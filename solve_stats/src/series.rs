use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::{round2, StatsError, TimingRecord, LONG_WINDOW, SHORT_WINDOW};

/// One chart row: the raw time plus the averages known at that solve.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub solve: u64,
    pub elapsed_s: f64,
    pub running_mean: f64,
    /// Present from the fifth record on, whatever its value.
    pub ao5: Option<f64>,
    /// Present from the twelfth record on, whatever its value.
    pub ao12: Option<f64>,
}

/// Mean of `window` after dropping its single lowest and single highest value.
///
/// Windows shorter than three values have nothing left after trimming and yield `None`.
pub fn trimmed_mean(window: &[f64]) -> Option<f64> {
    if window.len() < 3 {
        return None;
    }
    let mut sorted = window.to_vec();
    sorted.sort_by_key(|v| OrderedFloat(*v));
    let kept = &sorted[1..sorted.len() - 1];
    Some(kept.iter().sum::<f64>() / kept.len() as f64)
}

/// Compute the running mean, Ao5 and Ao12 for every prefix of `records` in one pass.
pub fn compute_series(records: &[TimingRecord]) -> Result<Vec<SeriesPoint>, StatsError> {
    if records.is_empty() {
        return Err(StatsError::NoData);
    }
    let times: Vec<f64> = records.iter().map(|r| r.elapsed_s).collect();
    let mut points = Vec::with_capacity(records.len());
    let mut sum = 0.0;
    for (idx, record) in records.iter().enumerate() {
        sum += record.elapsed_s;
        let running_mean = sum / (idx + 1) as f64;
        points.push(SeriesPoint {
            solve: record.solve,
            elapsed_s: record.elapsed_s,
            running_mean: round2(running_mean),
            ao5: trailing_average(&times, idx, SHORT_WINDOW).map(round2),
            ao12: trailing_average(&times, idx, LONG_WINDOW).map(round2),
        });
    }
    Ok(points)
}

fn trailing_average(times: &[f64], end: usize, window: usize) -> Option<f64> {
    if end + 1 < window {
        return None;
    }
    trimmed_mean(&times[end + 1 - window..=end])
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
        let series = compute_series(&records).unwrap();
        let means: Vec<f64> = series.iter().map(|p| p.running_mean).collect();
        assert_eq!(means, vec![10.0, 15.0, 20.0, 25.0, 30.0]);
        let ao5: Vec<Option<f64>> = series.iter().map(|p| p.ao5).collect();
        assert_eq!(ao5, vec![None, None, None, None, Some(30.0)]);
        assert!(series.iter().all(|p| p.ao12.is_none()));
    }

    #[test]
    fn ao12_starts_at_twelfth_record() {
        let times: Vec<f64> = (1..=13).map(|v| v as f64).collect();
        let series = compute_series(&records(&times)).unwrap();
        assert!(series[10].ao12.is_none());
        // 2..=11 after trimming 1 and 12
        assert_eq!(series[11].ao12, Some(6.5));
        assert_eq!(series[12].ao12, Some(7.5));
    }

    #[test]
    fn zero_average_is_still_present() {
        let series = compute_series(&records(&[0.0; 12])).unwrap();
        assert_eq!(series[4].ao5, Some(0.0));
        assert_eq!(series[11].ao12, Some(0.0));
        assert_eq!(series[3].ao5, None);
    }

    #[test]
    fn outputs_are_rounded_but_accumulation_is_not() {
        let series = compute_series(&records(&[1.004, 1.004, 1.004, 1.004, 1.024])).unwrap();
        assert_eq!(series[3].running_mean, 1.0);
        // 5.04 / 5; rebuilding from the rounded 1.00 would give 1.00 again
        assert_eq!(series[4].running_mean, 1.01);
    }

    #[test]
    fn trimmed_mean_drops_one_extreme_each_side() {
        assert_eq!(trimmed_mean(&[5.0, 1.0, 9.0, 5.0, 5.0]), Some(5.0));
        assert_eq!(trimmed_mean(&[3.0, 3.0, 3.0]), Some(3.0));
        assert_eq!(trimmed_mean(&[1.0, 2.0]), None);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(compute_series(&[]), Err(StatsError::NoData));
    }
}
