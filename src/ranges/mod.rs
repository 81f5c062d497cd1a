//! Genomic intervals and coordinate transforms.
//!
//! Coordinates are 0-based and right-exclusive, as in BED.

use std::fmt;
use std::str::FromStr;

use crate::{error::AnnoJoinError, traits::TsvSerialize, Position};

pub mod chromosomes;
pub mod operations;

/// Nucleotide strand enum type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
    Unstranded,
}

impl FromStr for Strand {
    type Err = AnnoJoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            "." => Ok(Strand::Unstranded),
            other => Err(AnnoJoinError::InvalidStrand(other.to_string())),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Strand::Forward => "+",
            Strand::Reverse => "-",
            Strand::Unstranded => ".",
        };
        write!(f, "{}", symbol)
    }
}

/// A genomic interval, with the optional BED name, score, and strand columns.
///
/// The optional columns are `None` when absent from the input, so that an
/// interval serializes back to the same number of columns it was read from.
#[derive(Clone, Debug, PartialEq)]
pub struct GenomicInterval {
    pub seqname: String,
    pub start: Position,
    pub end: Position,
    pub name: Option<String>,
    pub score: Option<String>,
    pub strand: Option<Strand>,
}

impl GenomicInterval {
    /// Create a new interval, checking that `start <= end`.
    pub fn new(
        seqname: impl Into<String>,
        start: Position,
        end: Position,
    ) -> Result<Self, AnnoJoinError> {
        if start > end {
            return Err(AnnoJoinError::InvalidGenomicRange(start, end));
        }
        Ok(Self {
            seqname: seqname.into(),
            start,
            end,
            name: None,
            score: None,
            strand: None,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_score(mut self, score: impl Into<String>) -> Self {
        self.score = Some(score.into());
        self
    }

    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = Some(strand);
        self
    }

    pub fn width(&self) -> Position {
        self.end - self.start
    }
}

impl TsvSerialize for GenomicInterval {
    fn to_tsv(&self) -> String {
        let mut line = format!("{}\t{}\t{}", self.seqname, self.start, self.end);
        // later columns imply the earlier ones, which are filled with BED placeholders
        let has_strand = self.strand.is_some();
        let has_score = self.score.is_some() || has_strand;
        let has_name = self.name.is_some() || has_score;
        if has_name {
            line.push('\t');
            line.push_str(self.name.as_deref().unwrap_or("."));
        }
        if has_score {
            line.push('\t');
            line.push_str(self.score.as_deref().unwrap_or("0"));
        }
        if let Some(strand) = self.strand {
            line.push('\t');
            line.push_str(&strand.to_string());
        }
        line
    }
}
