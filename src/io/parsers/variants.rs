//! Variant tables: `intersectBed -wo` overlaps of ClinVar variants with motif
//! locations, the extended ClinVar BED, and the ClinVar disease name list.

use crate::{error::AnnoJoinError, record::Record, Position, MISSING};

/// Columns of an `intersectBed -a <clinvar.bed> -b <motifs.bed> -wo` row.
pub mod overlap {
    pub const VARIANT_START: usize = 1;
    pub const VARIANT_END: usize = 2;
    pub const VARIANT_ID: usize = 3;
    pub const MOTIF_START: usize = 5;
    pub const MOTIF_END: usize = 6;
    pub const PEAK_ID: usize = 7;
    pub const MIN_COLUMNS: usize = PEAK_ID + 1;
}

/// Columns of the extended ClinVar BED file.
pub mod clinvar {
    pub const NAME: usize = 3;
    pub const CLINICAL_SIGNIFICANCE: usize = 16;
    pub const VARIANT_ID: usize = 19;
    pub const CONDITION: usize = 21;
}

/// Columns of the ClinVar `disease_names` file.
pub mod disease {
    pub const NAME: usize = 0;
    pub const MEDGEN_ID: usize = 2;
}

/// Variants spanning more than this many bases are not single-nucleotide.
pub const MAX_SNV_SPAN: Position = 2;

/// A variant falling within a motif occurrence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MotifVariant {
    pub variant_id: String,
    pub peak_id: String,
    /// 1-based position of the variant within the motif.
    pub position: Position,
    pub motif_width: Position,
    pub span: Position,
}

impl MotifVariant {
    pub fn from_record(record: &Record) -> Result<Self, AnnoJoinError> {
        record.check_columns(overlap::MIN_COLUMNS)?;
        let variant_start: Position = record.parse(overlap::VARIANT_START)?;
        let variant_end: Position = record.parse(overlap::VARIANT_END)?;
        let motif_start: Position = record.parse(overlap::MOTIF_START)?;
        let motif_end: Position = record.parse(overlap::MOTIF_END)?;
        Ok(Self {
            variant_id: record.require(overlap::VARIANT_ID)?.trim().to_string(),
            peak_id: record.require(overlap::PEAK_ID)?.trim().to_string(),
            position: variant_start - motif_start + 1,
            motif_width: motif_end - motif_start,
            span: variant_end - variant_start,
        })
    }

    pub fn is_snv(&self) -> bool {
        self.span <= MAX_SNV_SPAN
    }
}

/// The alternate nucleotide of a variant name such as `A>G`, or `X` when the
/// name is not of that form.
pub fn alternate_nucleotide(name: &str) -> &str {
    if name.starts_with(['A', 'C', 'G', 'T']) {
        if let Some(alternate) = name.split('>').nth(1) {
            return alternate.trim();
        }
    }
    "X"
}

/// Render a motif of `width` as `N`s with the variant at 1-based `position`
/// shown as `[nucleotide]`, e.g. `NN[G]NN`.
pub fn snv_representation(width: Position, position: Position, nucleotide: &str) -> String {
    (1..=width)
        .map(|i| {
            if i == position {
                format!("[{}]", nucleotide)
            } else {
                "N".to_string()
            }
        })
        .collect()
}

/// The MedGen identifier in a ClinVar condition field such as
/// `MedGen:C0001,OMIM:100`. The last MedGen entry wins; `"NA"` if there is none.
pub fn parse_medgen_id(condition: &str) -> String {
    condition
        .split(',')
        .filter(|entry| entry.trim_start().starts_with("MedGen"))
        .filter_map(|entry| entry.split(':').nth(1))
        .last()
        .map_or(MISSING.to_string(), |id| id.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motif_variant() {
        let record = Record::from(vec![
            "chr1", "1004", "1005", "rs1", "chr1", "1000", "1010", "sox10_peak_3", "1",
        ]);
        let variant = MotifVariant::from_record(&record).unwrap();
        assert_eq!(variant.position, 5);
        assert_eq!(variant.motif_width, 10);
        assert!(variant.is_snv());
        assert_eq!(variant.peak_id, "sox10_peak_3");
    }

    #[test]
    fn test_long_variant() {
        let record = Record::from(vec![
            "chr1", "1000", "1010", "rs2", "chr1", "1000", "1010", "p",
        ]);
        assert!(!MotifVariant::from_record(&record).unwrap().is_snv());
    }

    #[test]
    fn test_snv_representation() {
        assert_eq!(snv_representation(5, 3, "G"), "NN[G]NN");
        assert_eq!(snv_representation(3, 1, "X"), "[X]NN");
        assert_eq!(snv_representation(3, 0, "A"), "NNN");
    }

    #[test]
    fn test_alternate_nucleotide() {
        assert_eq!(alternate_nucleotide("A>G"), "G");
        assert_eq!(alternate_nucleotide("NM_000.3(SOX10):c.1A>G"), "X");
        assert_eq!(alternate_nucleotide("C"), "X");
    }

    #[test]
    fn test_parse_medgen_id() {
        assert_eq!(parse_medgen_id("MedGen:C0001,OMIM:100"), "C0001");
        assert_eq!(parse_medgen_id("OMIM:100,MedGen:CN169374"), "CN169374");
        assert_eq!(parse_medgen_id("OMIM:100"), "NA");
    }
}
