//! Types and methods for reading and parsing input and writing output.

pub mod fasta;
pub mod file;
pub mod parsers;
pub mod tsv;

pub use file::{InputFile, OutputFile};
pub use parsers::{RecordSource, SourceCounts, SourceOptions};
pub use tsv::{TableWriter, WriteSummary, NA_TSV};
