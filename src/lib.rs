//! # annojoin: joins and rewrites over genomic annotation tables
//!
//! Most ChIP-seq post-processing scripts do the same thing over and over: read a
//! tab-delimited file, build a lookup table keyed on one column, and look it up with
//! the rows of a second file. This library factors that pattern into a few small
//! pieces:
//!
//!  1. A *record source* ([`RecordSource`]) that lazily splits a TSV file into
//!     [`Record`]s, skipping comments and checking column counts.
//!
//!  2. A *key policy* ([`KeyPolicy`]) that turns one field into a normalized [`Key`].
//!     The same policy value is stored in the [`Index`] and reused when looking rows up,
//!     so build-side and lookup-side keys are always normalized identically.
//!
//!  3. An [`Index`], built once per input with an explicit [`CollisionPolicy`].
//!
//!  4. A join engine ([`JoinIter`], [`set_difference()`]) that reports
//!     matched/unmatched counts as part of its result.
//!
//!  5. Coordinate transforms over [`GenomicInterval`]s in [`ranges::operations`].
//!
//!  6. A [`TableWriter`] that reports exactly how many rows it flushed.
//!
//! The `annojoin` binary wraps these into one subcommand per tool; see
//! [`commands`].
//!
//! [`RecordSource`]: crate::io::RecordSource
//! [`Record`]: crate::record::Record
//! [`KeyPolicy`]: crate::key::KeyPolicy
//! [`Key`]: crate::key::Key
//! [`Index`]: crate::index::Index
//! [`CollisionPolicy`]: crate::index::CollisionPolicy
//! [`JoinIter`]: crate::join::JoinIter
//! [`set_difference()`]: crate::join::set_difference
//! [`GenomicInterval`]: crate::ranges::GenomicInterval
//! [`TableWriter`]: crate::io::TableWriter

pub mod commands;
pub mod error;
pub mod index;
pub mod io;
pub mod join;
pub mod key;
pub mod ranges;
pub mod record;
pub mod reporting;
pub mod test_utilities;
pub mod traits;

/// Genomic coordinates are signed: shifting a range near the sequence start may
/// legitimately produce negative positions, which are preserved rather than clamped.
pub type Position = i64;
pub type PositionOffset = i64;

/// The placeholder written wherever a field or lookup is missing.
pub const MISSING: &str = "NA";

pub mod prelude {
    pub use crate::error::AnnoJoinError;
    pub use crate::index::{CollisionPolicy, Index};
    pub use crate::io::{InputFile, OutputFile, RecordSource, SourceOptions, TableWriter};
    pub use crate::join::{set_difference, JoinCounts, JoinIter, JoinMode, JoinOptions};
    pub use crate::key::{Key, KeyExtractor, KeyParse, KeyPolicy, Normalize};
    pub use crate::ranges::{GenomicInterval, Strand};
    pub use crate::record::{Record, Strictness};
    pub use crate::reporting::{CommandOutput, Report};
    pub use crate::traits::{Projection, TsvSerialize};
}
