//! BED Types and Functionality
//!
//! The BED (Browser Extensible Format) is a TSV format in bioinformatics.
//! It has a fairly strict [specification](https://samtools.github.io/hts-specs/BEDv1.pdf),
//! but in practice it is quite permissive, and in bioinformatics one encounters lots
//! of "BED-like" files. A [`BedRecord`] is a [`GenomicInterval`] plus any columns
//! past the sixth, carried through unchanged.

use crate::{
    error::AnnoJoinError,
    io::SourceOptions,
    ranges::{GenomicInterval, Strand},
    record::Record,
    traits::TsvSerialize,
    Position,
};

pub const SEQNAME: usize = 0;
pub const START: usize = 1;
pub const END: usize = 2;
pub const NAME: usize = 3;
pub const SCORE: usize = 4;
pub const STRAND: usize = 5;

/// Columns needed to read an interval.
pub const MIN_COLUMNS: usize = 3;
/// Columns needed to join on the feature name.
pub const MIN_NAMED_COLUMNS: usize = 4;

/// Source options for BED files: `#` comments and `track`/`browser` lines are skipped.
pub fn bed_source_options() -> SourceOptions {
    SourceOptions::default()
        .skip_prefix("track")
        .skip_prefix("browser")
        .min_columns(MIN_COLUMNS)
}

/// A parsed BED line.
#[derive(Clone, Debug, PartialEq)]
pub struct BedRecord {
    pub interval: GenomicInterval,
    pub extra: Vec<String>,
}

impl BedRecord {
    /// Parse a [`Record`] with at least three columns.
    pub fn from_record(record: &Record) -> Result<Self, AnnoJoinError> {
        record.check_columns(MIN_COLUMNS)?;
        let start: Position = record.parse(START)?;
        let end: Position = record.parse(END)?;
        let mut interval = GenomicInterval::new(record.require(SEQNAME)?, start, end)?;
        interval.name = record.get(NAME).map(String::from);
        interval.score = record.get(SCORE).map(String::from);
        interval.strand = record.get(STRAND).map(str::parse::<Strand>).transpose()?;
        let extra = record.fields().iter().skip(STRAND + 1).cloned().collect();
        Ok(Self { interval, extra })
    }

    pub fn name(&self) -> Option<&str> {
        self.interval.name.as_deref()
    }
}

impl TsvSerialize for BedRecord {
    fn to_tsv(&self) -> String {
        let mut line = self.interval.to_tsv();
        for field in &self.extra {
            line.push('\t');
            line.push_str(field);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bed6_round_trip() {
        let record = Record::from(vec!["chr1", "100", "200", "peak_1", "13", "+", "extra"]);
        let bed = BedRecord::from_record(&record).unwrap();
        assert_eq!(bed.interval.start, 100);
        assert_eq!(bed.interval.strand, Some(Strand::Forward));
        assert_eq!(bed.name(), Some("peak_1"));
        assert_eq!(bed.to_tsv(), record.to_tsv());
    }

    #[test]
    fn test_bed4() {
        let record = Record::from(vec!["chr2", "5", "9", "id"]);
        let bed = BedRecord::from_record(&record).unwrap();
        assert_eq!(bed.interval.strand, None);
        assert_eq!(bed.to_tsv(), "chr2\t5\t9\tid");
    }

    #[test]
    fn test_bad_coordinates() {
        let record = Record::from(vec!["chr2", "five", "9"]);
        assert!(matches!(
            BedRecord::from_record(&record),
            Err(AnnoJoinError::InvalidColumnType { column: 2, .. })
        ));
        let record = Record::from(vec!["chr2", "10", "9"]);
        assert!(BedRecord::from_record(&record).is_err());
    }
}
