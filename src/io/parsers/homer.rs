//! HOMER `annotatePeaks.pl` output.
//!
//! The first line is a header starting with `PeakID`, and each later line
//! describes one peak. Columns used here (0-based):
//!
//! | column | content |
//! |---|---|
//! | 0 | peak ID |
//! | 7 | genomic feature annotation, e.g. `intron (NM_001, intron 2 of 5)` |
//! | 9 | distance to the nearest TSS |
//! | 10 | nearest transcript ID |
//! | 15 | gene name |
//! | 17 | gene description |

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::{error::AnnoJoinError, io::SourceOptions, record::Record, Position};

pub const PEAK_ID: usize = 0;
pub const ANNOTATION: usize = 7;
pub const DISTANCE_TO_TSS: usize = 9;
pub const TRANSCRIPT_ID: usize = 10;
pub const GENE_NAME: usize = 15;
pub const GENE_DESCRIPTION: usize = 17;

/// The prefix of the header line.
pub const HEADER_PREFIX: &str = "PeakID";

/// Columns needed to join on transcript ID.
pub const MIN_COLUMNS: usize = TRANSCRIPT_ID + 1;

/// Source options for HOMER annotation files. The header is captured, not yielded.
pub fn homer_source_options() -> SourceOptions {
    SourceOptions::default()
        .header(HEADER_PREFIX)
        .skip_prefix(HEADER_PREFIX)
}

/// A named-field view over a HOMER annotation [`Record`].
#[derive(Clone, Copy, Debug)]
pub struct HomerAnnotation<'a>(pub &'a Record);

impl<'a> HomerAnnotation<'a> {
    pub fn peak_id(&self) -> Result<&'a str, AnnoJoinError> {
        self.0.require(PEAK_ID)
    }

    pub fn annotation(&self) -> Result<&'a str, AnnoJoinError> {
        self.0.require(ANNOTATION)
    }

    pub fn distance_to_tss(&self) -> Result<Position, AnnoJoinError> {
        self.0.parse(DISTANCE_TO_TSS)
    }

    pub fn transcript_id(&self) -> Result<&'a str, AnnoJoinError> {
        self.0.require(TRANSCRIPT_ID)
    }

    /// Gene name, or `"NA"` for short rows (intergenic peaks often lack it).
    pub fn gene_name(&self) -> &'a str {
        self.0.get_or_missing(GENE_NAME)
    }

    /// Gene description, or `"NA"`.
    pub fn gene_description(&self) -> &'a str {
        self.0.get_or_missing(GENE_DESCRIPTION)
    }

    pub fn category(&self) -> Result<AnnotationCategory, AnnoJoinError> {
        Ok(AnnotationCategory::classify(self.annotation()?))
    }
}

/// Genomic feature categories of HOMER's annotation column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AnnotationCategory {
    #[serde(rename = "3'UTR")]
    Utr3,
    #[serde(rename = "5'UTR")]
    Utr5,
    Exon,
    Intergenic,
    Intron,
    #[serde(rename = "promoter-TSS")]
    PromoterTss,
    #[serde(rename = "TTS")]
    Tts,
    #[serde(rename = "non-coding")]
    NonCoding,
    Other,
}

impl AnnotationCategory {
    /// All categories, in report order.
    pub const ALL: [AnnotationCategory; 9] = [
        AnnotationCategory::Utr3,
        AnnotationCategory::Utr5,
        AnnotationCategory::Exon,
        AnnotationCategory::Intergenic,
        AnnotationCategory::Intron,
        AnnotationCategory::PromoterTss,
        AnnotationCategory::Tts,
        AnnotationCategory::NonCoding,
        AnnotationCategory::Other,
    ];

    /// Classify an annotation by its prefix, e.g. `intron (NM_001, intron 2 of 5)`
    /// is [`AnnotationCategory::Intron`].
    pub fn classify(annotation: &str) -> Self {
        let annotation = annotation.trim();
        if annotation.starts_with("3'") {
            AnnotationCategory::Utr3
        } else if annotation.starts_with("5'") {
            AnnotationCategory::Utr5
        } else if annotation.starts_with("exon") {
            AnnotationCategory::Exon
        } else if annotation.starts_with("Intergenic") {
            AnnotationCategory::Intergenic
        } else if annotation.starts_with("intron") {
            AnnotationCategory::Intron
        } else if annotation.starts_with("promoter") {
            AnnotationCategory::PromoterTss
        } else if annotation.starts_with("TTS") {
            AnnotationCategory::Tts
        } else if annotation.starts_with("non-coding") {
            AnnotationCategory::NonCoding
        } else {
            AnnotationCategory::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AnnotationCategory::Utr3 => "3'UTR",
            AnnotationCategory::Utr5 => "5'UTR",
            AnnotationCategory::Exon => "Exon",
            AnnotationCategory::Intergenic => "Intergenic",
            AnnotationCategory::Intron => "Intron",
            AnnotationCategory::PromoterTss => "promoter-TSS",
            AnnotationCategory::Tts => "TTS",
            AnnotationCategory::NonCoding => "non-coding",
            AnnotationCategory::Other => "Other",
        }
    }
}

impl fmt::Display for AnnotationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One row of a category summary table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: AnnotationCategory,
    pub count: usize,
    pub percent: f64,
}

/// Tally annotation categories. Every category appears in the result, in
/// [`AnnotationCategory::ALL`] order, even with a zero count.
pub fn count_categories<I>(categories: I) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = AnnotationCategory>,
{
    let mut counts: IndexMap<AnnotationCategory, usize> = AnnotationCategory::ALL
        .iter()
        .map(|category| (*category, 0))
        .collect();
    for category in categories {
        *counts.entry(category).or_insert(0) += 1;
    }
    let total: usize = counts.values().sum();
    counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category,
            count,
            percent: if total > 0 {
                100.0 * count as f64 / total as f64
            } else {
                0.0
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn homer_row() -> Record {
        let mut fields: Vec<String> = (0..19).map(|i| format!("f{}", i)).collect();
        fields[PEAK_ID] = "sox10_peak_1".to_string();
        fields[ANNOTATION] = "intron (NM_001, intron 2 of 5)".to_string();
        fields[DISTANCE_TO_TSS] = "-1520".to_string();
        fields[TRANSCRIPT_ID] = "ENST0001".to_string();
        fields[GENE_NAME] = "SOX10".to_string();
        Record::from(fields)
    }

    #[test]
    fn test_named_fields() {
        let record = homer_row();
        let row = HomerAnnotation(&record);
        assert_eq!(row.peak_id().unwrap(), "sox10_peak_1");
        assert_eq!(row.distance_to_tss().unwrap(), -1520);
        assert_eq!(row.transcript_id().unwrap(), "ENST0001");
        assert_eq!(row.gene_name(), "SOX10");
        assert_eq!(row.category().unwrap(), AnnotationCategory::Intron);
    }

    #[test]
    fn test_short_row() {
        let record = Record::from(vec!["p1", "chr1"]);
        let row = HomerAnnotation(&record);
        assert!(row.transcript_id().is_err());
        assert_eq!(row.gene_description(), "NA");
    }

    #[test]
    fn test_classify() {
        use AnnotationCategory::*;
        assert_eq!(AnnotationCategory::classify("3' UTR (NM_1)"), Utr3);
        assert_eq!(AnnotationCategory::classify("5' UTR (NM_1)"), Utr5);
        assert_eq!(AnnotationCategory::classify("exon (NM_1, exon 1 of 2)"), Exon);
        assert_eq!(AnnotationCategory::classify("Intergenic"), Intergenic);
        assert_eq!(AnnotationCategory::classify("promoter-TSS (NM_1)"), PromoterTss);
        assert_eq!(AnnotationCategory::classify("TTS (NM_1)"), Tts);
        assert_eq!(AnnotationCategory::classify("non-coding (NR_1)"), NonCoding);
        assert_eq!(AnnotationCategory::classify("NA"), Other);
    }

    #[test]
    fn test_count_categories() {
        let counts = count_categories(vec![
            AnnotationCategory::Intron,
            AnnotationCategory::Intron,
            AnnotationCategory::Exon,
            AnnotationCategory::Other,
        ]);
        assert_eq!(counts.len(), AnnotationCategory::ALL.len());
        let intron = counts
            .iter()
            .find(|c| c.category == AnnotationCategory::Intron)
            .unwrap();
        assert_eq!(intron.count, 2);
        assert!((intron.percent - 50.0).abs() < 1e-9);
        assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), 4);
    }
}
