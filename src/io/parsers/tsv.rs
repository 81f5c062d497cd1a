//! Essential TSV parsing functionality, which wraps the [`csv`] crate's reader.
//!
//! Genomic TSV files are ragged and frequently contain unbalanced quote
//! characters (e.g. gene descriptions), so the reader is configured to be
//! flexible and to treat quotes as ordinary text.

use csv::{Reader, ReaderBuilder, StringRecordsIntoIter};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::AnnoJoinError;
use crate::io::file::InputFile;
use crate::record::{Record, Strictness};

/// Options for a [`RecordSource`].
#[derive(Clone, Debug)]
pub struct SourceOptions {
    /// The field delimiter; tab by default.
    pub delimiter: u8,
    /// Lines starting with this byte are skipped anywhere in the file.
    pub comment: Option<u8>,
    /// Rows whose first field starts with any of these prefixes are skipped
    /// (e.g. `track` lines in BED files).
    pub skip_prefixes: Vec<String>,
    /// A leading line starting with this prefix is captured as the file header.
    pub header_prefix: Option<String>,
    /// The minimum number of columns a consumer needs. Shorter rows are routed
    /// through `strictness`.
    pub min_columns: usize,
    pub strictness: Strictness,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            comment: Some(b'#'),
            skip_prefixes: Vec::new(),
            header_prefix: None,
            min_columns: 0,
            strictness: Strictness::Lenient,
        }
    }
}

impl SourceOptions {
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn comment(mut self, comment: Option<u8>) -> Self {
        self.comment = comment;
        self
    }

    pub fn skip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.skip_prefixes.push(prefix.into());
        self
    }

    pub fn header(mut self, prefix: impl Into<String>) -> Self {
        self.header_prefix = Some(prefix.into());
        self
    }

    pub fn min_columns(mut self, min_columns: usize) -> Self {
        self.min_columns = min_columns;
        self
    }

    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }
}

/// Counts gathered by a [`RecordSource`] while iterating.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceCounts {
    /// Records yielded to the consumer.
    pub records: usize,
    /// Rows skipped because of a skip prefix or because they were blank.
    pub skipped: usize,
    /// Rows skipped because they had fewer than the declared minimum columns.
    pub malformed: usize,
}

/// Build a TSV reader over a stream, which ignores comment lines and allows
/// rows of differing lengths.
pub fn build_tsv_reader<R: Read>(stream: R, options: &SourceOptions) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .comment(options.comment)
        .from_reader(stream)
}

/// A lazy iterator over the [`Record`]s of a delimited text file.
///
/// The file handle is owned by the iterator and closed when it is dropped, whether
/// or not iteration ran to completion.
pub struct RecordSource {
    filepath: PathBuf,
    inner: StringRecordsIntoIter<Box<dyn Read>>,
    options: SourceOptions,
    header: Option<Record>,
    line_offset: u64,
    counts: SourceCounts,
}

impl std::fmt::Debug for RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordSource")
            .field("filepath", &self.filepath)
            .field("counts", &self.counts)
            .finish_non_exhaustive()
    }
}

impl RecordSource {
    /// Open `filepath` with the default options: tab-delimited, `#` comments.
    pub fn new(filepath: impl Into<PathBuf>) -> Result<Self, AnnoJoinError> {
        Self::with_options(filepath, SourceOptions::default())
    }

    /// Open `filepath` for reading with the given options.
    pub fn with_options(
        filepath: impl Into<PathBuf>,
        options: SourceOptions,
    ) -> Result<Self, AnnoJoinError> {
        let filepath = filepath.into();
        let mut input_file = InputFile::new(&filepath);

        let comment = options.comment.map(|c| (c as char).to_string());
        input_file.collect_metadata(comment.as_deref(), options.header_prefix.as_deref())?;
        let delimiter = options.delimiter as char;
        let header = input_file
            .header
            .as_ref()
            .map(|line| Record::from_line(line, delimiter, 0));

        let stream: Box<dyn Read> = Box::new(input_file.continue_reading()?);
        let inner = build_tsv_reader(stream, &options).into_records();

        Ok(Self {
            filepath,
            inner,
            options,
            header,
            line_offset: input_file.skip_lines as u64,
            counts: SourceCounts::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.filepath
    }

    /// The captured header line, if a header prefix was declared and found.
    pub fn header(&self) -> Option<&Record> {
        self.header.as_ref()
    }

    pub fn counts(&self) -> &SourceCounts {
        &self.counts
    }

    fn is_skipped(&self, record: &csv::StringRecord) -> bool {
        let first = record.get(0).unwrap_or("");
        if record.len() <= 1 && first.trim().is_empty() {
            return true;
        }
        self.options
            .skip_prefixes
            .iter()
            .any(|prefix| first.starts_with(prefix.as_str()))
    }
}

impl Iterator for RecordSource {
    type Item = Result<Record, AnnoJoinError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = match self.inner.next()? {
                Ok(row) => row,
                Err(e) => return Some(Err(AnnoJoinError::CsvError(e))),
            };
            if self.is_skipped(&row) {
                self.counts.skipped += 1;
                continue;
            }
            let line = row.position().map_or(0, |p| p.line()) + self.line_offset;
            let record = Record::new(row.iter().map(String::from).collect(), line);

            if let Err(e) = record.check_columns(self.options.min_columns) {
                if let Err(e) = self.options.strictness.absorb(e) {
                    return Some(Err(e));
                }
                self.counts.malformed += 1;
                continue;
            }
            self.counts.records += 1;
            return Some(Ok(record));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::temp_file_with;

    #[test]
    fn test_empty_file() {
        let file = temp_file_with("");
        let mut source = RecordSource::new(file.path()).unwrap();
        assert!(source.next().is_none());
        assert_eq!(source.counts().records, 0);
    }

    #[test]
    fn test_skips_comments_blank_and_prefixes() {
        let file = temp_file_with(
            "#comment\ntrack name=peaks\nchr1\t1\t2\tp1\n\nchr2\t3\t4\tp2\n#trailing\n",
        );
        let options = SourceOptions::default().skip_prefix("track");
        let mut source = RecordSource::with_options(file.path(), options).unwrap();
        let records: Vec<_> = source.by_ref().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get(3), Some("p1"));
        assert_eq!(records[1].get(0), Some("chr2"));
        assert_eq!(source.counts().records, 2);
    }

    #[test]
    fn test_header_capture() {
        let file = temp_file_with("PeakID (cmd=x)\tChr\tStart\nP1\tchr1\t10\n");
        let options = SourceOptions::default().header("PeakID");
        let mut source = RecordSource::with_options(file.path(), options).unwrap();
        assert_eq!(source.header().unwrap().get(1), Some("Chr"));
        let record = source.next().unwrap().unwrap();
        assert_eq!(record.get(0), Some("P1"));
        assert_eq!(record.line(), 2);
        assert!(source.next().is_none());
    }

    #[test]
    fn test_quotes_are_literal() {
        let file = temp_file_with("T1\tG1\tSOX10\t\"SRY-box 10\n");
        let record = RecordSource::new(file.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(record.get(3), Some("\"SRY-box 10"));
    }

    #[test]
    fn test_min_columns() {
        let file = temp_file_with("a\tb\tc\na\n");
        let options = SourceOptions::default().min_columns(3);
        let mut source = RecordSource::with_options(file.path(), options.clone()).unwrap();
        assert_eq!(source.by_ref().count(), 1);
        assert_eq!(source.counts().malformed, 1);

        let strict = options.strictness(Strictness::Strict);
        let results: Vec<_> = RecordSource::with_options(file.path(), strict)
            .unwrap()
            .collect();
        assert!(results[1].is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            RecordSource::new("tests_data/nope.bed"),
            Err(AnnoJoinError::FileError { .. })
        ));
    }
}
