//! The [`Record`] type: one split line of a delimited text file.
//!

use crate::{error::AnnoJoinError, io::tsv::NA_TSV, traits::TsvSerialize};

/// How a stage treats rows that are too short, unparsable, or missing a key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Skip the row, log a warning, and count it.
    #[default]
    Lenient,
    /// Abort the run with the row's error.
    Strict,
}

impl Strictness {
    /// Route a recoverable error according to this strictness level.
    ///
    /// Returns `Ok(())` if the error was absorbed (the caller should skip the
    /// row and count it), or the error itself if it must propagate.
    pub fn absorb(&self, error: AnnoJoinError) -> Result<(), AnnoJoinError> {
        if error.is_recoverable() && *self == Strictness::Lenient {
            tracing::warn!("skipping row: {}", error);
            Ok(())
        } else {
            Err(error)
        }
    }
}

/// A line of delimited text split into its fields.
///
/// Rows in the same file are not required to have the same number of fields.
/// Accessors return `None` (or the `"NA"` sentinel) past the end rather than panicking.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: Vec<String>,
    line: u64,
}

impl Record {
    /// Create a new record from its fields, as read from 1-based line `line`.
    pub fn new(fields: Vec<String>, line: u64) -> Self {
        Self { fields, line }
    }

    /// Split a single line on `delimiter`. Trailing line endings are removed.
    pub fn from_line(line: &str, delimiter: char, line_number: u64) -> Self {
        let fields = line
            .trim_end_matches(['\n', '\r'])
            .split(delimiter)
            .map(String::from)
            .collect();
        Self::new(fields, line_number)
    }

    /// The 1-based line number this record was read from (0 for synthesized records).
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }

    /// Get the field at 0-based `column`, if present.
    pub fn get(&self, column: usize) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Get the field at 0-based `column`, or the `"NA"` sentinel.
    pub fn get_or_missing(&self, column: usize) -> &str {
        self.get(column).unwrap_or(NA_TSV.missing())
    }

    /// Get the field at 0-based `column`, or a [`AnnoJoinError::MalformedRecord`]
    /// error stating how many columns were needed.
    pub fn require(&self, column: usize) -> Result<&str, AnnoJoinError> {
        self.get(column)
            .ok_or_else(|| AnnoJoinError::MalformedRecord {
                line: self.line,
                needed: column + 1,
                found: self.len(),
            })
    }

    /// Parse the field at `column` into some type `T`.
    pub fn parse<T: std::str::FromStr>(&self, column: usize) -> Result<T, AnnoJoinError> {
        let value = self.require(column)?;
        value
            .trim()
            .parse::<T>()
            .map_err(|_| AnnoJoinError::InvalidColumnType {
                line: self.line,
                column: column + 1,
                value: value.to_string(),
            })
    }

    /// Check this record has at least `needed` columns.
    pub fn check_columns(&self, needed: usize) -> Result<(), AnnoJoinError> {
        if self.len() < needed {
            return Err(AnnoJoinError::MalformedRecord {
                line: self.line,
                needed,
                found: self.len(),
            });
        }
        Ok(())
    }

    /// Replace the field at `column`. Out of range columns are filled with `"NA"` first.
    pub fn set(&mut self, column: usize, value: impl Into<String>) {
        self.pad_to(column + 1);
        self.fields[column] = value.into();
    }

    pub fn push(&mut self, value: impl Into<String>) {
        self.fields.push(value.into())
    }

    pub fn extend<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(values.into_iter().map(Into::into))
    }

    /// Append `"NA"` fields until the record has at least `width` fields.
    pub fn pad_to(&mut self, width: usize) {
        let short = width.saturating_sub(self.fields.len());
        self.fields.extend(NA_TSV.fill(short).map(String::from));
    }
}

impl From<Vec<String>> for Record {
    fn from(fields: Vec<String>) -> Self {
        Record::new(fields, 0)
    }
}

impl<'a> From<Vec<&'a str>> for Record {
    fn from(fields: Vec<&'a str>) -> Self {
        Record::new(fields.into_iter().map(String::from).collect(), 0)
    }
}

impl TsvSerialize for Record {
    fn to_tsv(&self) -> String {
        self.fields.join("\t")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_access() {
        let record = Record::from(vec!["chr1", "10", "20"]);
        assert_eq!(record.get(1), Some("10"));
        assert_eq!(record.get(3), None);
        assert_eq!(record.get_or_missing(3), "NA");
    }

    #[test]
    fn test_require_reports_shape() {
        let record = Record::new(vec!["a".to_string(), "b".to_string()], 7);
        match record.require(3) {
            Err(AnnoJoinError::MalformedRecord {
                line,
                needed,
                found,
            }) => {
                assert_eq!(line, 7);
                assert_eq!(needed, 4);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_column() {
        let record = Record::from(vec!["chr1", " 42 ", "x"]);
        assert_eq!(record.parse::<i64>(1).unwrap(), 42);
        assert!(matches!(
            record.parse::<i64>(2),
            Err(AnnoJoinError::InvalidColumnType { column: 3, .. })
        ));
    }

    #[test]
    fn test_pad_and_set() {
        let mut record = Record::from(vec!["a"]);
        record.pad_to(3);
        assert_eq!(record.to_tsv(), "a\tNA\tNA");
        record.set(4, "z");
        assert_eq!(record.to_tsv(), "a\tNA\tNA\tNA\tz");
    }

    #[test]
    fn test_from_line_strips_newline() {
        let record = Record::from_line("a\tb\tc\r\n", '\t', 1);
        assert_eq!(record.fields(), &["a", "b", "c"]);
    }

    #[test]
    fn test_strictness_absorb() {
        let err = AnnoJoinError::MalformedRecord {
            line: 1,
            needed: 2,
            found: 1,
        };
        assert!(Strictness::Lenient.absorb(err).is_ok());
        let err = AnnoJoinError::MalformedRecord {
            line: 1,
            needed: 2,
            found: 1,
        };
        assert!(Strictness::Strict.absorb(err).is_err());
        let err = AnnoJoinError::ArgumentError("x".to_string());
        assert!(Strictness::Lenient.absorb(err).is_err());
    }
}
