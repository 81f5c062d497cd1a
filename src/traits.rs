//! Traits used by the annojoin library.
//!

use crate::record::Record;

/// Convert a type into a single line of tab-separated text (no trailing newline).
pub trait TsvSerialize {
    fn to_tsv(&self) -> String;
}

impl TsvSerialize for String {
    fn to_tsv(&self) -> String {
        self.clone()
    }
}

impl TsvSerialize for &str {
    fn to_tsv(&self) -> String {
        self.to_string()
    }
}

impl<U: TsvSerialize> TsvSerialize for Vec<U> {
    fn to_tsv(&self) -> String {
        self.iter()
            .map(|x| x.to_tsv())
            .collect::<Vec<_>>()
            .join("\t")
    }
}

/// The [`Projection`] trait defines which fields an index payload contributes
/// when it is appended to a primary record in a projecting join.
pub trait Projection {
    fn project(&self) -> Vec<String>;

    /// The number of fields [`Projection::project()`] yields.
    fn width(&self) -> usize {
        self.project().len()
    }
}

impl Projection for Record {
    fn project(&self) -> Vec<String> {
        self.fields().to_vec()
    }
    fn width(&self) -> usize {
        self.len()
    }
}

impl Projection for Vec<String> {
    fn project(&self) -> Vec<String> {
        self.clone()
    }
    fn width(&self) -> usize {
        self.len()
    }
}

impl Projection for String {
    fn project(&self) -> Vec<String> {
        vec![self.clone()]
    }
    fn width(&self) -> usize {
        1
    }
}

/// Set-membership indexes carry no payload, and contribute no fields.
impl Projection for () {
    fn project(&self) -> Vec<String> {
        Vec::new()
    }
    fn width(&self) -> usize {
        0
    }
}
