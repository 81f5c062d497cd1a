//! FASTA reading and writing, through [`noodles::fasta`].
//!
//! Sequence parsing is left to noodles; this module only selects, relabels and
//! counts records.

use std::io::Write;
use std::path::Path;

use noodles::fasta::{
    self,
    record::{Definition, Sequence},
};

use crate::{error::AnnoJoinError, index::Index, io::file::OutputFile};

/// Read every record of a FASTA file into memory.
pub fn read_fasta(filepath: impl AsRef<Path>) -> Result<Vec<fasta::Record>, AnnoJoinError> {
    let filepath = filepath.as_ref();
    let mut reader = fasta::reader::Builder
        .build_from_path(filepath)
        .map_err(|e| AnnoJoinError::file(filepath, e))?;
    let mut records = Vec::new();
    for result in reader.records() {
        records.push(result?);
    }
    Ok(records)
}

/// Write records to `output`, returning how many were written.
pub fn write_fasta(output: &OutputFile, records: &[fasta::Record]) -> Result<usize, AnnoJoinError> {
    let mut inner = output.writer()?;
    {
        let mut writer = fasta::Writer::new(&mut inner);
        for record in records {
            writer.write_record(record)?;
        }
    }
    inner.flush()?;
    Ok(records.len())
}

/// The sequence name (the definition line up to the first space).
pub fn record_name(record: &fasta::Record) -> Result<String, AnnoJoinError> {
    Ok(String::from_utf8(record.definition().name().to_vec())?)
}

/// Give every record a new unique name, `sequence_0`, `sequence_1`, ...
///
/// The old definition line (name and description) becomes the new description,
/// so `>peak_1 chr1` is written as `>sequence_0 peak_1 chr1`.
pub fn relabel(records: &[fasta::Record]) -> Vec<fasta::Record> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let mut description = record.definition().name().to_vec();
            if let Some(old) = record.definition().description() {
                description.push(b' ');
                description.extend_from_slice(old);
            }
            let definition = Definition::new(format!("sequence_{}", i), Some(description));
            fasta::Record::new(definition, record.sequence().clone())
        })
        .collect()
}

/// Keep the records whose name, under `ids`'s key policy, is present in `ids`.
///
/// Returns the retained records and the number of records whose name could not
/// be turned into a key (e.g. lacking the separator).
pub fn retrieve<P>(
    records: Vec<fasta::Record>,
    ids: &Index<P>,
) -> Result<(Vec<fasta::Record>, usize), AnnoJoinError> {
    let mut retained = Vec::new();
    let mut unparsable = 0;
    for record in records {
        let name = record_name(&record)?;
        match ids.key(&name) {
            Ok(key) => {
                if ids.contains(&key) {
                    retained.push(record);
                }
            }
            Err(e) if e.is_recoverable() => {
                tracing::debug!("sequence '{}' skipped: {}", name, e);
                unparsable += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok((retained, unparsable))
}

/// Count the records whose sequence contains `pattern` (case-sensitive, literal).
pub fn count_containing(records: &[fasta::Record], pattern: &[u8]) -> usize {
    records
        .iter()
        .filter(|record| contains(record.sequence().as_ref(), pattern))
        .count()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}

/// Build an in-memory record, mostly for tests.
pub fn new_record(name: &str, sequence: &[u8]) -> fasta::Record {
    fasta::Record::new(
        Definition::new(name, None),
        Sequence::from(sequence.to_vec()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        index::CollisionPolicy,
        key::{KeyParse, KeyPolicy, Normalize},
    };

    fn records() -> Vec<fasta::Record> {
        vec![
            new_record("MITF_peak_201", b"ACGTTGCA"),
            new_record("MITF_peak_7", b"GGGGCCCC"),
            new_record("other", b"TTTT"),
        ]
    }

    #[test]
    fn test_relabel() {
        let relabeled = relabel(&records());
        let names: Vec<_> = relabeled.iter().map(|r| record_name(r).unwrap()).collect();
        assert_eq!(names, vec!["sequence_0", "sequence_1", "sequence_2"]);
        assert_eq!(relabeled[1].sequence().as_ref(), b"GGGGCCCC");
        assert_eq!(
            relabeled[0].definition().description(),
            Some(&b"MITF_peak_201"[..])
        );
    }

    #[test]
    fn test_relabel_keeps_old_definition() {
        let record = fasta::Record::new(
            Definition::new("peak_1", Some(b"chr1:100-200".to_vec())),
            Sequence::from(b"ACGT".to_vec()),
        );
        let relabeled = relabel(&[record]);
        assert_eq!(relabeled[0].definition().name(), b"sequence_0");
        assert_eq!(
            relabeled[0].definition().description(),
            Some(&b"peak_1 chr1:100-200"[..])
        );
    }

    #[test]
    fn test_retrieve_with_separator() {
        let policy = KeyPolicy::new(
            Normalize::Trim,
            KeyParse::AfterSeparator("MITF_".to_string()),
        );
        let ids = Index::from_pairs(
            "ids",
            vec![("CT_HG19_MITF_peak_201", ())],
            policy,
            CollisionPolicy::Overwrite,
        )
        .unwrap();
        let (kept, unparsable) = retrieve(records(), &ids).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(record_name(&kept[0]).unwrap(), "MITF_peak_201");
        assert_eq!(unparsable, 1);
    }

    #[test]
    fn test_count_containing() {
        assert_eq!(count_containing(&records(), b"GCA"), 1);
        assert_eq!(count_containing(&records(), b"GG"), 1);
        assert_eq!(count_containing(&records(), b""), 3);
        assert_eq!(count_containing(&records(), b"AAAAAAAAAAAAAAAA"), 0);
    }

    #[test]
    fn test_fasta_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seqs.fa");
        let written = write_fasta(&OutputFile::new(&path, None), &records()).unwrap();
        assert_eq!(written, 3);
        let reread = read_fasta(&path).unwrap();
        assert_eq!(reread.len(), 3);
        assert_eq!(record_name(&reread[2]).unwrap(), "other");
        assert_eq!(reread[0].sequence().as_ref(), b"ACGTTGCA");
    }
}
