//! Types for standardized reports to the user about join and rewrite operations.
//!
//! The goal of this is to report information about potentially fragile
//! operations: how many rows were skipped as malformed, how many keys went
//! unmatched, and how many rows actually reached each output file.
//!

use serde::Serialize;

use crate::{error::AnnoJoinError, Position};

/// The [`CommandOutput<U>`] type output is generic over some data output
/// from a command, and a [`Report`] that reports information to the user.
#[derive(Debug)]
pub struct CommandOutput<U> {
    value: U,
    report: Report,
}

impl<U> CommandOutput<U> {
    pub fn new(value: U, report: Report) -> Self {
        Self { value, report }
    }

    pub fn value(&self) -> &U {
        &self.value
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn into_parts(self) -> (U, Report) {
        (self.value, self.report)
    }
}

/// A type to (semi) standardize reporting to the user.
///
/// Summaries are the normal per-output totals; issues are things the user
/// should look at (unmatched keys, skipped rows).
#[derive(Clone, Debug, Default)]
pub struct Report {
    summaries: Vec<String>,
    issues: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, message: String) {
        self.issues.push(message)
    }

    pub fn add_summary(&mut self, message: String) {
        self.summaries.push(message)
    }

    pub fn summaries(&self) -> &[String] {
        &self.summaries
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty() && self.issues.is_empty()
    }

    /// All lines, summaries first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.summaries
            .iter()
            .chain(self.issues.iter())
            .map(String::as_str)
    }
}

/// One bin of a [`Histogram`], `[lower, upper)` except for the last bin,
/// which also includes `upper`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistogramBin {
    pub lower: Position,
    pub upper: Position,
    pub count: usize,
}

/// A fixed-width histogram over a closed range of values.
///
/// Values outside the range are tallied separately rather than dropped silently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Histogram {
    bins: Vec<HistogramBin>,
    below: usize,
    above: usize,
}

impl Histogram {
    /// Bins of `step` from `lower` to `upper`. The range must divide evenly.
    pub fn new(lower: Position, upper: Position, step: Position) -> Result<Self, AnnoJoinError> {
        if step <= 0 || upper <= lower || (upper - lower) % step != 0 {
            return Err(AnnoJoinError::ArgumentError(format!(
                "cannot bin [{}, {}] in steps of {}",
                lower, upper, step
            )));
        }
        let bins = (lower..upper)
            .step_by(step as usize)
            .map(|edge| HistogramBin {
                lower: edge,
                upper: edge + step,
                count: 0,
            })
            .collect();
        Ok(Self {
            bins,
            below: 0,
            above: 0,
        })
    }

    pub fn add(&mut self, value: Position) {
        let (Some(first), Some(last)) = (self.bins.first(), self.bins.last()) else {
            return;
        };
        let (lower, upper, step) = (first.lower, last.upper, first.upper - first.lower);
        if value < lower {
            self.below += 1;
        } else if value > upper {
            self.above += 1;
        } else {
            let i = (((value - lower) / step) as usize).min(self.bins.len() - 1);
            self.bins[i].count += 1;
        }
    }

    pub fn bins(&self) -> &[HistogramBin] {
        &self.bins
    }

    /// Values below and above the binned range.
    pub fn out_of_range(&self) -> (usize, usize) {
        (self.below, self.above)
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum::<usize>() + self.below + self.above
    }
}

impl Extend<Position> for Histogram {
    fn extend<T: IntoIterator<Item = Position>>(&mut self, iter: T) {
        for value in iter {
            self.add(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_edges() {
        let mut hist = Histogram::new(-12000, 12000, 2000).unwrap();
        assert_eq!(hist.bins().len(), 12);
        hist.extend([-12000, -11999, 0, 1999, 2000, 12000, 12001, -20000]);
        let bins = hist.bins();
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[6].lower, 0);
        assert_eq!(bins[6].count, 2);
        assert_eq!(bins[7].count, 1);
        // the last bin is closed on the right
        assert_eq!(bins[11].count, 1);
        assert_eq!(hist.out_of_range(), (1, 1));
        assert_eq!(hist.total(), 8);
    }

    #[test]
    fn test_histogram_bad_range() {
        assert!(Histogram::new(0, 10, 3).is_err());
        assert!(Histogram::new(10, 0, 1).is_err());
        assert!(Histogram::new(0, 10, 0).is_err());
    }

    #[test]
    fn test_report_lines() {
        let mut report = Report::new();
        assert!(report.is_empty());
        report.add_issue("2 rows skipped".to_string());
        report.add_summary("10 rows written".to_string());
        let lines: Vec<_> = report.lines().collect();
        assert_eq!(lines, vec!["10 rows written", "2 rows skipped"]);
    }
}
