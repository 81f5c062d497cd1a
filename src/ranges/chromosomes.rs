//! Chromosome naming conventions and alternate-scaffold placement files.

use std::fmt;
use std::path::Path;

use clap::ValueEnum;

use crate::{
    error::AnnoJoinError,
    index::{CollisionPolicy, Index},
    io::{RecordSource, SourceOptions},
    key::{KeyExtractor, KeyParse, KeyPolicy, Normalize},
    record::Strictness,
    MISSING,
};

/// The declared prefix of conformant chromosome names.
pub const CHROM_PREFIX: &str = "chr";

/// Supported genome assemblies, each with its own scaffold naming scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Assembly {
    Mm9,
    Hg19,
}

/// The outcome of [`remap_chromosome()`](crate::ranges::operations::remap_chromosome).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Chromosome {
    Named(String),
    /// A scaffold with no known placement; written as `"NA"`.
    Unmapped,
}

impl Chromosome {
    pub fn is_mapped(&self) -> bool {
        matches!(self, Chromosome::Named(_))
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chromosome::Named(name) => write!(f, "{}", name),
            Chromosome::Unmapped => write!(f, "{}", MISSING),
        }
    }
}

/// The key policy for scaffold identifiers, shared by patch files and GTF lookups.
pub fn patch_key_policy() -> KeyPolicy {
    KeyPolicy::new(Normalize::UppercaseTrim, KeyParse::StripVersion)
}

/// Load a GenBank `alt_scaffold_placement.txt`-style file into an index from
/// scaffold identifier to its primary chromosome (e.g. `chr7`).
///
/// Column layouts differ per assembly:
///  - `mm9`: scaffold in column 1 as `gi|<id>|...`, chromosome in column 4.
///  - `hg19`: scaffold name in column 3, chromosome in column 6.
pub fn load_patches(
    filepath: impl AsRef<Path>,
    assembly: Assembly,
    strictness: Strictness,
) -> Result<Index<String>, AnnoJoinError> {
    let filepath = filepath.as_ref();
    let (key_column, chrom_column) = match assembly {
        Assembly::Mm9 => (0, 3),
        Assembly::Hg19 => (2, 5),
    };
    let options = SourceOptions::default()
        .min_columns(chrom_column + 1)
        .strictness(strictness);
    let source = RecordSource::with_options(filepath, options)?;

    let records = source.map(move |result| {
        let mut record = result?;
        if assembly == Assembly::Mm9 {
            let full_id = record.require(key_column)?;
            let contig = full_id
                .split('|')
                .nth(1)
                .ok_or_else(|| AnnoJoinError::UnparsableKey {
                    value: full_id.to_string(),
                    separator: "|".to_string(),
                })?
                .to_string();
            record.set(key_column, contig);
        }
        Ok(record)
    });

    // the gi| identifier is rewritten above, so failures there must be absorbed here
    let records = records.filter_map(|result| match result {
        Err(e) => strictness.absorb(e).err().map(Err),
        ok => Some(ok),
    });

    let extractor = KeyExtractor::new(key_column, patch_key_policy());
    Index::build(
        filepath.display().to_string(),
        records,
        &extractor,
        CollisionPolicy::Overwrite,
        strictness,
        |record| {
            Ok(format!(
                "{}{}",
                CHROM_PREFIX,
                record.require(chrom_column)?.trim()
            ))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::temp_file_with;

    #[test]
    fn test_load_mm9_patches() {
        let file = temp_file_with(
            "# header\ngi|149288852|ref|NT_166280.1|\tx\ty\t7\nbroken\tx\ty\t1\n",
        );
        let index = load_patches(file.path(), Assembly::Mm9, Strictness::Lenient).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(
            index.lookup("NT_166280").unwrap(),
            Some(&"chr7".to_string())
        );
    }

    #[test]
    fn test_load_hg19_patches() {
        let file = temp_file_with(
            "#alt_asm_name\tprim_asm_name\talt_scaf_name\talt_scaf_acc\tparent_type\tparent_name\nALT_REF_LOCI_1\tPrimary\tHSCHR6_MHC_APD\tGL000250.1\tCHROMOSOME\t6\n",
        );
        let index = load_patches(file.path(), Assembly::Hg19, Strictness::Lenient).unwrap();
        assert_eq!(
            index.lookup("hschr6_mhc_apd").unwrap(),
            Some(&"chr6".to_string())
        );
    }

    #[test]
    fn test_unmapped_display() {
        assert_eq!(Chromosome::Unmapped.to_string(), "NA");
        assert!(!Chromosome::Unmapped.is_mapped());
    }
}
