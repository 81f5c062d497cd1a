//! Motif scan output from MEME (sites copied from the HTML report) or FIMO.
//!
//! Both tools report one motif hit per line, located by the sequence (peak)
//! it was found in and an offset into that sequence. Only the column positions
//! differ.

use clap::ValueEnum;

use crate::{
    error::AnnoJoinError, ranges::Strand, record::Record, traits::Projection, PositionOffset,
};

/// The tool that produced a motif scan file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum MotifScanTool {
    /// `<site>. <sequence> <strand> <start> <p-value> ...`
    #[default]
    Meme,
    /// `<pattern> <sequence> <start> <stop> <strand> ...`
    Fimo,
}

impl MotifScanTool {
    pub fn peak_id_column(&self) -> usize {
        1
    }

    pub fn start_column(&self) -> usize {
        match self {
            MotifScanTool::Meme => 3,
            MotifScanTool::Fimo => 2,
        }
    }

    pub fn strand_column(&self) -> usize {
        match self {
            MotifScanTool::Meme => 2,
            MotifScanTool::Fimo => 4,
        }
    }

    pub fn min_columns(&self) -> usize {
        self.start_column().max(self.peak_id_column()) + 1
    }
}

/// A single motif occurrence within a peak.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MotifHit {
    /// Offset of the motif start from the peak start.
    pub offset: PositionOffset,
    pub strand: Option<Strand>,
}

impl MotifHit {
    /// Parse a hit. A missing or unrecognized strand column leaves the strand unset.
    pub fn from_record(record: &Record, tool: MotifScanTool) -> Result<Self, AnnoJoinError> {
        let offset = record.parse(tool.start_column())?;
        let strand = record
            .get(tool.strand_column())
            .and_then(|s| s.parse::<Strand>().ok());
        Ok(Self { offset, strand })
    }
}

impl Projection for MotifHit {
    fn project(&self) -> Vec<String> {
        vec![
            self.offset.to_string(),
            self.strand.unwrap_or(Strand::Unstranded).to_string(),
        ]
    }
    fn width(&self) -> usize {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meme_hit() {
        let record = Record::from(vec![
            "1684.",
            "hg19_sox10_peak_3016",
            "-",
            "49",
            "1.24e-8",
            "ACAACAACAC",
        ]);
        let hit = MotifHit::from_record(&record, MotifScanTool::Meme).unwrap();
        assert_eq!(hit.offset, 49);
        assert_eq!(hit.strand, Some(Strand::Reverse));
    }

    #[test]
    fn test_fimo_hit() {
        let record = Record::from(vec!["MA0442.1", "hg19_sox10_peak_7", "12", "21"]);
        let hit = MotifHit::from_record(&record, MotifScanTool::Fimo).unwrap();
        assert_eq!(hit.offset, 12);
        assert_eq!(hit.strand, None);
    }

    #[test]
    fn test_unparsable_start() {
        let record = Record::from(vec!["1.", "peak", "+", "start"]);
        assert!(MotifHit::from_record(&record, MotifScanTool::Meme).is_err());
    }
}
