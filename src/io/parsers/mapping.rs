//! Identifier mapping tables, such as Ensembl BioMart exports
//! (`transcript ID`, `gene ID`, `gene name`, `description`), ClinVar BED
//! extensions, or disease name lists.
//!
//! A mapping is loaded into an [`Index`] from one key column to a list of
//! value columns. Column order decides the direction of the mapping.

use std::path::Path;

use crate::{
    error::AnnoJoinError,
    index::{CollisionPolicy, Index},
    io::{RecordSource, SourceOptions},
    key::{KeyExtractor, KeyPolicy},
    record::Strictness,
};

/// The layout and key handling of a mapping file.
#[derive(Clone, Debug)]
pub struct MappingSpec {
    /// 0-based key column.
    pub key_column: usize,
    /// 0-based value columns, in output order.
    pub value_columns: Vec<usize>,
    pub policy: KeyPolicy,
    pub collisions: CollisionPolicy,
    /// How the file is read, e.g. a header line to skip.
    pub options: SourceOptions,
}

impl MappingSpec {
    pub fn new(key_column: usize, value_columns: Vec<usize>, policy: KeyPolicy) -> Self {
        Self {
            key_column,
            value_columns,
            policy,
            collisions: CollisionPolicy::Overwrite,
            options: SourceOptions::default(),
        }
    }

    pub fn collisions(mut self, collisions: CollisionPolicy) -> Self {
        self.collisions = collisions;
        self
    }

    pub fn source_options(mut self, options: SourceOptions) -> Self {
        self.options = options;
        self
    }

    /// The number of fields each mapped value has, whatever the file holds.
    pub fn width(&self) -> usize {
        self.value_columns.len()
    }
}

/// Load a mapping file into an index from the key column to the (trimmed) value
/// columns. Missing value columns are filled with `"NA"`; rows without the key
/// column are malformed, and counted in the index's
/// [`BuildSummary`](crate::index::BuildSummary).
pub fn load_mapping(
    filepath: impl AsRef<Path>,
    spec: &MappingSpec,
    strictness: Strictness,
) -> Result<Index<Vec<String>>, AnnoJoinError> {
    let filepath = filepath.as_ref();
    // short rows fail key extraction in the builder, where they are counted
    let options = spec.options.clone().strictness(strictness);
    let source = RecordSource::with_options(filepath, options)?;
    let extractor = KeyExtractor::new(spec.key_column, spec.policy.clone());
    Index::build(
        filepath.display().to_string(),
        source,
        &extractor,
        spec.collisions,
        strictness,
        |record| {
            Ok(spec
                .value_columns
                .iter()
                .map(|&column| record.get_or_missing(column).trim().to_string())
                .collect())
        },
    )
}
