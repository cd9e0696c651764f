use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// Unanchored: the first "<label>. <seconds>.<fraction>" anywhere on the line wins.
// ASCII digits only, so every capture is guaranteed to parse.
static SOLVE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+)\.\s+([0-9]+\.[0-9]+)").expect("invalid solve line regex")
});

/// One timed attempt as it appeared in the pasted log.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct TimingRecord {
    /// Label taken verbatim from the line; not renumbered or deduplicated.
    pub solve: u64,
    pub elapsed_s: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LineClass {
    Blank,
    Solve(TimingRecord),
    Skipped,
}

/// Parse every line holding a solve time, in document order.
///
/// Lines without a `"<label>. <seconds>.<fraction>"` pair are dropped silently, so the
/// result is empty when nothing matched.
pub fn parse_records(text: &str) -> Vec<TimingRecord> {
    let mut skipped = 0usize;
    let records: Vec<TimingRecord> = classify_lines(text)
        .filter_map(|class| match class {
            LineClass::Solve(record) => Some(record),
            LineClass::Skipped => {
                skipped += 1;
                None
            }
            LineClass::Blank => None,
        })
        .collect();
    if skipped > 0 {
        tracing::debug!("skipped {} unrecognised lines", skipped);
    }
    records
}

/// Classify each input line, one entry per line.
pub fn classify_lines(text: &str) -> impl Iterator<Item = LineClass> + '_ {
    text.split('\n').map(classify_line)
}

fn classify_line(line: &str) -> LineClass {
    if line.trim().is_empty() {
        return LineClass::Blank;
    }
    match parse_line(line) {
        Some(record) => LineClass::Solve(record),
        None => LineClass::Skipped,
    }
}

fn parse_line(line: &str) -> Option<TimingRecord> {
    let caps = SOLVE_LINE.captures(line)?;
    // A label too large for u64 counts as a non-match.
    let solve = caps.get(1)?.as_str().parse().ok()?;
    let elapsed_s = caps.get(2)?.as_str().parse().ok()?;
    Some(TimingRecord { solve, elapsed_s })
}

/// Render records back into the log format accepted by [`parse_records`].
pub fn format_records(records: &[TimingRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let mut time = record.elapsed_s.to_string();
        if !time.contains('.') {
            time.push_str(".0");
        }
        out.push_str(&format!("{}. {}\n", record.solve, time));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(solve: u64, elapsed_s: f64) -> TimingRecord {
        TimingRecord { solve, elapsed_s }
    }

    #[test]
    fn parses_numbered_lines_in_order() {
        let records = parse_records("1. 10.00\n2. 20.00\n3. 30.00\n4. 40.00\n5. 50.00");
        assert_eq!(
            records,
            vec![
                rec(1, 10.0),
                rec(2, 20.0),
                rec(3, 30.0),
                rec(4, 40.0),
                rec(5, 50.0)
            ]
        );
    }

    #[test]
    fn garbage_lines_are_dropped() {
        let records = parse_records("1. 10.00\ngarbage text\n2. 11.50\n\n3.12.00\n4. 12\n");
        assert_eq!(records, vec![rec(1, 10.0), rec(2, 11.5)]);
    }

    #[test]
    fn labels_are_kept_verbatim() {
        let records = parse_records("7. 9.10\n3. 8.20\n3. 8.30\n");
        let labels: Vec<u64> = records.iter().map(|r| r.solve).collect();
        assert_eq!(labels, vec![7, 3, 3]);
    }

    #[test]
    fn match_may_sit_inside_other_text() {
        let records = parse_records("Generated: 14. 13.37+ (OLL skip)\r\n2. DNF(15.00)\n");
        assert_eq!(records, vec![rec(14, 13.37)]);
    }

    #[test]
    fn non_ascii_digits_do_not_hide_a_later_match() {
        assert_eq!(parse_records("1. 12.\u{0665} 2. 3.40"), vec![rec(2, 3.4)]);
        assert_eq!(
            parse_records("\u{0661}\u{0662}. 5.5 | 3. 12.45"),
            vec![rec(3, 12.45)]
        );
        assert!(parse_records("\u{0661}. \u{0662}.\u{0663}").is_empty());
    }

    #[test]
    fn overflowing_label_is_skipped() {
        let records = parse_records("99999999999999999999999. 10.00\n1. 9.99");
        assert_eq!(records, vec![rec(1, 9.99)]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(parse_records("").is_empty());
        assert!(parse_records("\n\n   \n").is_empty());
    }

    #[test]
    fn classify_reports_every_line() {
        let classes: Vec<LineClass> = classify_lines("1. 10.00\n\nnope").collect();
        assert_eq!(
            classes,
            vec![
                LineClass::Solve(rec(1, 10.0)),
                LineClass::Blank,
                LineClass::Skipped
            ]
        );
    }

    #[test]
    fn format_keeps_a_fractional_part() {
        let text = format_records(&[rec(1, 12.0), rec(2, 9.87)]);
        assert_eq!(text, "1. 12.0\n2. 9.87\n");
        assert_eq!(parse_records(&text), vec![rec(1, 12.0), rec(2, 9.87)]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Formatting then re-parsing reproduces the records exactly.
        #[test]
        fn format_then_parse_is_identity(
            pairs in prop::collection::vec((0u64..100_000, 0.0f64..10_000.0), 0..50)
        ) {
            let records: Vec<TimingRecord> = pairs
                .into_iter()
                .map(|(solve, elapsed_s)| TimingRecord { solve, elapsed_s })
                .collect();
            let reparsed = parse_records(&format_records(&records));
            prop_assert_eq!(&reparsed, &records);
            prop_assert_eq!(parse_records(&format_records(&reparsed)), records);
        }

        /// Arbitrary text never panics and every record has a non-negative time.
        #[test]
        fn parse_never_panics(text in ".{0,400}") {
            for record in parse_records(&text) {
                prop_assert!(record.elapsed_s >= 0.0);
            }
        }
    }
}
