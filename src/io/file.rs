//! Input/Output file handling with [`InputFile`] and [`OutputFile`].
//!
//! These types attach the offending path to every I/O error, and take care of
//! leading comment/header lines on input and header lines on output.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::AnnoJoinError;

/// Represents an input file.
///
/// Leading comment lines and an optional single header line can be skipped
/// with [`InputFile::collect_metadata()`], which keeps the header; subsequent
/// reads through [`InputFile::continue_reading()`] start after them.
#[derive(Clone, Debug)]
pub struct InputFile {
    pub filepath: PathBuf,
    pub header: Option<String>,
    pub skip_lines: usize,
}

impl InputFile {
    /// Constructs a new `InputFile`.
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
            header: None,
            skip_lines: 0,
        }
    }

    /// Opens the file and returns a buffered reader.
    pub fn reader(&self) -> Result<BufReader<Box<dyn Read>>, AnnoJoinError> {
        let file =
            File::open(&self.filepath).map_err(|e| AnnoJoinError::file(&self.filepath, e))?;
        let reader: Box<dyn Read> = Box::new(file);
        Ok(BufReader::new(reader))
    }

    /// Skips comment lines and captures a header line at the start of the file.
    ///
    /// Reading stops at the first line that is neither a comment nor the header.
    /// Only one header line is recognized. Returns whether any lines were collected.
    pub fn collect_metadata(
        &mut self,
        comment: Option<&str>,
        header: Option<&str>,
    ) -> Result<bool, AnnoJoinError> {
        let mut buf_reader = self.reader()?;
        let mut line = String::new();
        self.skip_lines = 0;

        while buf_reader
            .read_line(&mut line)
            .map_err(|e| AnnoJoinError::file(&self.filepath, e))?
            > 0
        {
            if comment.map_or(false, |c| line.starts_with(c)) {
                self.skip_lines += 1;
            } else if header.map_or(false, |h| line.starts_with(h)) && self.header.is_none() {
                self.header = Some(line.trim_end_matches(['\n', '\r']).to_string());
                self.skip_lines += 1;
            } else {
                break;
            }
            line.clear();
        }

        Ok(self.skip_lines > 0)
    }

    /// Method to continue reading after skipping the comment and header lines.
    pub fn continue_reading(&self) -> Result<BufReader<Box<dyn Read>>, AnnoJoinError> {
        let mut buf_reader = self.reader()?;
        let mut line = String::new();

        for _ in 0..self.skip_lines {
            buf_reader
                .read_line(&mut line)
                .map_err(|e| AnnoJoinError::file(&self.filepath, e))?;
            line.clear();
        }
        Ok(buf_reader)
    }
}

enum OutputDestination {
    File(PathBuf),
    Stdout,
}

/// Represents an output file.
pub struct OutputFile {
    destination: OutputDestination,
    pub header: Option<Vec<String>>,
}

impl OutputFile {
    /// Constructs a new `OutputFile`.
    ///
    /// # Arguments
    ///
    /// * `filepath` - the path to write to; it is created or truncated.
    /// * `header` - optional lines written verbatim before any data.
    pub fn new(filepath: impl Into<PathBuf>, header: Option<Vec<String>>) -> Self {
        Self {
            destination: OutputDestination::File(filepath.into()),
            header,
        }
    }

    /// Constructs a new [`OutputFile`] for standard output.
    pub fn new_stdout(header: Option<Vec<String>>) -> Self {
        Self {
            destination: OutputDestination::Stdout,
            header,
        }
    }

    /// The path written to, or `None` for standard output.
    pub fn path(&self) -> Option<&Path> {
        match &self.destination {
            OutputDestination::File(path) => Some(path),
            OutputDestination::Stdout => None,
        }
    }

    /// A display name for reporting.
    pub fn display_name(&self) -> String {
        self.path()
            .map_or("<stdout>".to_string(), |p| p.display().to_string())
    }

    /// Opens the destination and returns a buffered writer. Header lines are
    /// written immediately.
    pub fn writer(&self) -> Result<Box<dyn Write>, AnnoJoinError> {
        let mut writer: Box<dyn Write> = match &self.destination {
            OutputDestination::File(path) => Box::new(BufWriter::new(
                File::create(path).map_err(|e| AnnoJoinError::file(path, e))?,
            )),
            OutputDestination::Stdout => Box::new(BufWriter::new(io::stdout())),
        };
        if let Some(entries) = &self.header {
            for entry in entries {
                writeln!(writer, "{}", entry)?;
            }
        }
        Ok(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::temp_file_with;

    #[test]
    fn test_collect_metadata() {
        let file = temp_file_with("#comment\n#another\nPeakID\tChr\nP1\tchr1\n");
        let mut input = InputFile::new(file.path());
        assert!(input.collect_metadata(Some("#"), Some("PeakID")).unwrap());
        assert_eq!(input.skip_lines, 3);
        assert_eq!(input.header.as_deref(), Some("PeakID\tChr"));

        let mut rest = String::new();
        input.continue_reading().unwrap().read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "P1\tchr1\n");
    }

    #[test]
    fn test_missing_input_names_path() {
        let input = InputFile::new("tests_data/does_not_exist.tsv");
        let err = input.reader().err().unwrap();
        assert!(err.to_string().contains("does_not_exist.tsv"));
    }

    #[test]
    fn test_output_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        let output = OutputFile::new(&path, Some(vec!["#a\tb".to_string()]));
        {
            let mut writer = output.writer().unwrap();
            writeln!(writer, "1\t2").unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "#a\tb\n1\t2\n");
    }
}
