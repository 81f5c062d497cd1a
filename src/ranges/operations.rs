//! Range Operations.
//!
//! - [`shift_interval()`]: widen (or narrow) an interval on both sides.
//! - [`remap_chromosome()`]: rewrite a sequence name into a `chr`-prefixed convention.
//! - [`motif_genomic_position()`]: place a motif hit found within a peak on the genome.
//!
//! All of these are pure functions.

use crate::{
    error::AnnoJoinError,
    index::Index,
    ranges::{
        chromosomes::{Assembly, Chromosome, CHROM_PREFIX},
        GenomicInterval,
    },
    Position, PositionOffset,
};

/// Shift an interval's start down and its end up by `offset`.
///
/// Positions are not clamped: a start near 0 may become negative. A negative
/// offset narrows the interval, and is an error if it would invert it.
pub fn shift_interval(
    interval: &GenomicInterval,
    offset: PositionOffset,
) -> Result<GenomicInterval, AnnoJoinError> {
    let start = interval.start - offset;
    let end = interval.end + offset;
    if start > end {
        return Err(AnnoJoinError::InvalidGenomicRange(start, end));
    }
    Ok(GenomicInterval {
        start,
        end,
        ..interval.clone()
    })
}

/// The genomic `(start, end)` of a motif of `width` found `offset` bases into a
/// peak starting at `peak_start`.
pub fn motif_genomic_position(
    peak_start: Position,
    offset: PositionOffset,
    width: Position,
) -> (Position, Position) {
    let start = peak_start + offset;
    (start, start + width)
}

/// Whether `name` already follows the `chr`-prefixed convention.
pub fn is_conformant(name: &str) -> bool {
    name.get(..CHROM_PREFIX.len())
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case(CHROM_PREFIX))
}

/// Rewrite a raw sequence name into the `chr`-prefixed convention for `assembly`.
///
/// Names that are already conformant are returned unchanged. Alternate scaffold
/// and patch names are looked up in `patches` (built with
/// [`load_patches()`](crate::ranges::chromosomes::load_patches)); scaffolds with no
/// placement become [`Chromosome::Unmapped`]. This never fails.
pub fn remap_chromosome(
    raw: &str,
    patches: Option<&Index<String>>,
    assembly: Assembly,
) -> Chromosome {
    let name = raw.trim();
    if is_conformant(name) {
        return Chromosome::Named(name.to_string());
    }
    let placed = || {
        patches
            .and_then(|index| index.lookup(name).ok().flatten())
            .cloned()
    };

    match assembly {
        Assembly::Mm9 => {
            if name.starts_with("NT") || name.starts_with("NW") {
                placed().map_or(Chromosome::Unmapped, Chromosome::Named)
            } else {
                Chromosome::Named(format!("{}{}", CHROM_PREFIX, name))
            }
        }
        Assembly::Hg19 => {
            if let Some(mapped) = placed() {
                return Chromosome::Named(mapped);
            }
            let upper = name.to_uppercase();
            if let Some(rest) = upper.strip_prefix("HSCHR") {
                let number = rest.split('_').next().unwrap_or("");
                if number.is_empty() {
                    Chromosome::Unmapped
                } else {
                    Chromosome::Named(format!("{}{}", CHROM_PREFIX, number))
                }
            } else if upper.starts_with("GL") {
                Chromosome::Unmapped
            } else {
                Chromosome::Named(format!("{}{}", CHROM_PREFIX, upper))
            }
        }
    }
}
