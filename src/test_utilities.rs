//! Test cases and test utility functions.
//!

use std::io::Write;

use rand::{seq::SliceRandom, thread_rng, Rng};
use tempfile::NamedTempFile;

use crate::{
    key::{Key, KeyPolicy},
    ranges::{GenomicInterval, Strand},
    record::Record,
    Position,
};

// Stochastic test defaults
//
// The tradeoff is catching stochastic errors vs test time.
pub const NRANDOM_RECORDS: usize = 10000;

// interval length
pub const MIN_LEN: Position = 1;
pub const MAX_LEN: Position = 10000;

// number of chromosome sequences
pub const NCHROM: usize = 22;

// chromosome sizes
pub const MIN_CHROM_LEN: Position = 50_000_000;
pub const MAX_CHROM_LEN: Position = 250_000_000;

/// Build a random range start/end on a sequence of `chrom_len`.
/// 0-indexed, right exclusive
pub fn random_range(chrom_len: Position) -> (Position, Position) {
    let mut rng = thread_rng();
    let len = rng.gen_range(MIN_LEN..MAX_LEN);
    let start = rng.gen_range(0..chrom_len - len + 1);
    (start, start + len)
}

/// Build random sequence lengths
pub fn random_seqlen() -> Position {
    let mut rng = thread_rng();
    rng.gen_range(MIN_CHROM_LEN..=MAX_CHROM_LEN)
}

/// Sample a random chromosome
pub fn random_chrom() -> String {
    let mut rng = thread_rng();
    format!("chr{}", rng.gen_range(1..NCHROM + 1))
}

/// Build a random named, stranded [`GenomicInterval`].
pub fn random_interval() -> GenomicInterval {
    let mut rng = thread_rng();
    let (start, end) = random_range(random_seqlen());
    let strand = *[Strand::Forward, Strand::Reverse, Strand::Unstranded]
        .choose(&mut rng)
        .unwrap();
    GenomicInterval::new(random_chrom(), start, end)
        .unwrap()
        .with_name(format!("peak_{}", rng.gen_range(0..1_000_000)))
        .with_score(rng.gen_range(0..1000).to_string())
        .with_strand(strand)
}

/// `n` random keys drawn (with repeats) from `universe` distinct gene IDs.
pub fn random_keys(n: usize, universe: usize) -> Vec<Key> {
    let mut rng = thread_rng();
    let policy = KeyPolicy::default();
    (0..n)
        .map(|_| {
            policy
                .key(&format!("ENSG{:011}", rng.gen_range(0..universe)))
                .unwrap()
        })
        .collect()
}

/// `n` random BED6 records, as [`Record`]s.
pub fn random_bed_records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            let iv = random_interval();
            Record::new(
                vec![
                    iv.seqname,
                    iv.start.to_string(),
                    iv.end.to_string(),
                    format!("peak_{}", i),
                    "0".to_string(),
                    iv.strand.map_or(".".to_string(), |s| s.to_string()),
                ],
                i as u64 + 1,
            )
        })
        .collect()
}

/// Write `contents` to a fresh temporary file.
pub fn temp_file_with(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("could not create temp file");
    file.write_all(contents.as_bytes())
        .expect("could not write temp file");
    file.flush().expect("could not flush temp file");
    file
}

/// Write `records` as a TSV temporary file.
pub fn temp_table_with(records: &[Record]) -> NamedTempFile {
    let contents: String = records
        .iter()
        .map(|record| format!("{}\n", record.fields().join("\t")))
        .collect();
    temp_file_with(&contents)
}
