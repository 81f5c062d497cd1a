//! TSV serializing helpers and the [`TableWriter`].

use std::io::Write;

use lazy_static::lazy_static;
use serde::Serialize;

use crate::{error::AnnoJoinError, io::file::OutputFile, traits::TsvSerialize, MISSING};

lazy_static! {
    /// The standard output configuration: missing values are written as `NA`.
    pub static ref NA_TSV: TsvConfig = TsvConfig {
        no_value_string: MISSING.to_string(),
    };
}

/// This is an extensible type to handle common TSV output configurations,
/// e.g. what to print for `None`.
#[derive(Clone, Debug)]
pub struct TsvConfig {
    pub no_value_string: String,
}

impl TsvConfig {
    /// The string written wherever a value is missing.
    pub fn missing(&self) -> &str {
        &self.no_value_string
    }

    /// `n` missing values, for filling unmatched or short rows.
    pub fn fill(&self, n: usize) -> impl Iterator<Item = &str> {
        std::iter::repeat(self.missing()).take(n)
    }
}

/// Counts reported by a [`TableWriter`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Header lines written, reported separately from data rows.
    pub header_lines: usize,
    /// Data rows written and flushed.
    pub rows: usize,
}

/// Writes rows as tab-separated lines to an [`OutputFile`].
///
/// The row count is only reported by [`TableWriter::finish()`], after the
/// underlying writer has been flushed, so it always equals what reached the
/// destination.
pub struct TableWriter {
    name: String,
    writer: Box<dyn Write>,
    header_lines: usize,
    rows: usize,
}

impl TableWriter {
    /// Open `output`. Any header lines set on it are written first.
    pub fn new(output: &OutputFile) -> Result<Self, AnnoJoinError> {
        let writer = output.writer()?;
        Ok(Self {
            name: output.display_name(),
            writer,
            header_lines: output.header.as_ref().map_or(0, Vec::len),
            rows: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write one row.
    pub fn write_row<T: TsvSerialize + ?Sized>(&mut self, row: &T) -> Result<(), AnnoJoinError> {
        writeln!(self.writer, "{}", row.to_tsv())?;
        self.rows += 1;
        Ok(())
    }

    /// Write every row of an iterator, stopping at the first error.
    pub fn write_all<I, T>(&mut self, rows: I) -> Result<(), AnnoJoinError>
    where
        I: IntoIterator<Item = T>,
        T: TsvSerialize,
    {
        for row in rows {
            self.write_row(&row)?;
        }
        Ok(())
    }

    /// Flush and close, returning what was written.
    pub fn finish(mut self) -> Result<WriteSummary, AnnoJoinError> {
        self.writer.flush()?;
        Ok(WriteSummary {
            header_lines: self.header_lines,
            rows: self.rows,
        })
    }
}

/// Write `serde`-serializable rows as a TSV table with a column header derived
/// from the field names.
pub fn write_serialized<T, I>(output: &OutputFile, rows: I) -> Result<WriteSummary, AnnoJoinError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(output.writer()?);
    let mut count = 0;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush()?;
    Ok(WriteSummary {
        header_lines: if count > 0 { 1 } else { 0 },
        rows: count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{RecordSource, SourceOptions};
    use crate::record::Record;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.tsv");
        let rows = vec![
            Record::from(vec!["chr1", "10", "20", "a"]),
            Record::from(vec!["chr2", "30", "40"]),
            Record::from(vec!["chrX", "0", "1", "b", "0", "+"]),
        ];
        let output = OutputFile::new(&path, Some(vec!["#chrom\tstart\tend".to_string()]));
        let mut writer = TableWriter::new(&output).unwrap();
        writer.write_all(rows.iter().cloned()).unwrap();
        let summary = writer.finish().unwrap();
        assert_eq!(summary.header_lines, 1);
        assert_eq!(summary.rows, 3);

        let reread: Vec<Record> = RecordSource::with_options(&path, SourceOptions::default())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(reread.len(), rows.len());
        for (a, b) in reread.iter().zip(rows.iter()) {
            assert_eq!(a.fields(), b.fields());
        }
    }

    #[test]
    fn test_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.tsv");
        let writer = TableWriter::new(&OutputFile::new(&path, None)).unwrap();
        let summary = writer.finish().unwrap();
        assert_eq!(summary, WriteSummary::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_na_fill() {
        assert_eq!(NA_TSV.missing(), "NA");
        assert_eq!(NA_TSV.fill(3).collect::<Vec<_>>(), vec!["NA"; 3]);
    }

    #[test]
    fn test_unwritable_path() {
        let output = OutputFile::new("/nonexistent-dir/out.tsv", None);
        assert!(matches!(
            TableWriter::new(&output),
            Err(AnnoJoinError::FileError { .. })
        ));
    }

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        count: usize,
    }

    #[test]
    fn test_write_serialized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.tsv");
        let summary = write_serialized(
            &OutputFile::new(&path, None),
            vec![Row { name: "a", count: 2 }, Row { name: "b", count: 0 }],
        )
        .unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "name\tcount\na\t2\nb\t0\n"
        );
    }
}
