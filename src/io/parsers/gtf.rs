//! GTF files, as far as chromosome renaming needs them: the sequence name is
//! column 0 and every other column is carried through verbatim.

use crate::io::SourceOptions;

pub const SEQNAME: usize = 0;

/// Source options for GTF files. `#!` directives and `#` comments are skipped.
pub fn gtf_source_options() -> SourceOptions {
    SourceOptions::default().min_columns(SEQNAME + 1)
}
