//! Parsing iterators and column layouts for the supported text formats.
//!
//! Everything is read through a single lazy parsing iterator, [`RecordSource`],
//! which splits each line into a [`Record`]. What the columns *mean* is declared
//! per format in the submodules, so that no command indexes into a record with a
//! bare column number:
//!
//!  - [`clinvar`]: `<SequenceLocation>` elements of ClinVar XML releases.
//!  - [`bed`]: BED-like interval files (`chrom`, `start`, `end`, `name`, `score`, `strand`).
//!  - [`homer`]: HOMER `annotatePeaks.pl` output.
//!  - [`motif`]: MEME and FIMO motif scan output.
//!  - [`gtf`]: GTF files, whose first column is renamed and the rest kept.
//!  - [`mapping`]: two-or-more column ID mapping exports (e.g. Ensembl BioMart).
//!  - [`variants`]: ClinVar tables and variant/motif overlaps.
//!
//! Each layout also declares the minimum number of columns it needs, which is
//! handed to the [`RecordSource`] when it is opened
//! (see [`SourceOptions::min_columns`]).
//!
//! [`Record`]: crate::record::Record

pub mod bed;
pub mod clinvar;
pub mod gtf;
pub mod homer;
pub mod mapping;
pub mod motif;
pub mod tsv;
pub mod utils;
pub mod variants;

pub use bed::BedRecord;
pub use clinvar::{SequenceLocation, SequenceLocations};
pub use homer::{AnnotationCategory, HomerAnnotation};
pub use motif::{MotifHit, MotifScanTool};
pub use tsv::{RecordSource, SourceCounts, SourceOptions};
pub use variants::MotifVariant;
