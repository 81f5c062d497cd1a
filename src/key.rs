//! Key extraction and normalization.
//!
//! A [`Key`] is the normalized text of one field of a [`Record`]. Keys are only
//! ever produced through a [`KeyPolicy`], and an [`Index`] remembers the policy
//! it was built with. Looking rows up in an index goes through
//! [`Index::lookup_extractor()`], which reuses that same policy, so it is not
//! possible to build with one normalization and look up with another.
//!
//! [`Index`]: crate::index::Index
//! [`Index::lookup_extractor()`]: crate::index::Index::lookup_extractor

use std::fmt;

use clap::ValueEnum;

use crate::{error::AnnoJoinError, record::Record};

/// Text normalization applied to a raw field before it becomes a [`Key`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Normalize {
    Identity,
    Uppercase,
    Trim,
    #[default]
    UppercaseTrim,
}

impl Normalize {
    pub fn apply(&self, value: &str) -> String {
        match self {
            Normalize::Identity => value.to_string(),
            Normalize::Uppercase => value.to_uppercase(),
            Normalize::Trim => value.trim().to_string(),
            Normalize::UppercaseTrim => value.trim().to_uppercase(),
        }
    }
}

/// How a key is carved out of its (normalized) field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum KeyParse {
    /// Use the whole field.
    #[default]
    Whole,
    /// Drop an accession version suffix, e.g. `NT_039207.1` becomes `NT_039207`.
    StripVersion,
    /// Keep the text after the first occurrence of the separator, up to any second
    /// occurrence. With separator `sox10_`, `hg19_sox10_peak_12` becomes `peak_12`.
    AfterSeparator(String),
}

impl KeyParse {
    pub fn apply(&self, value: &str) -> Result<String, AnnoJoinError> {
        match self {
            KeyParse::Whole => Ok(value.to_string()),
            KeyParse::StripVersion => Ok(value.split('.').next().unwrap_or(value).to_string()),
            KeyParse::AfterSeparator(separator) => value
                .split(separator.as_str())
                .nth(1)
                .map(|part| part.trim().to_string())
                .ok_or_else(|| AnnoJoinError::UnparsableKey {
                    value: value.to_string(),
                    separator: separator.clone(),
                }),
        }
    }
}

/// The complete recipe that turns a raw field into a [`Key`].
///
/// Separator matching happens on the normalized text, so an `AfterSeparator`
/// separator should itself be normalized the same way (see [`KeyPolicy::new()`]).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyPolicy {
    pub normalize: Normalize,
    pub parse: KeyParse,
}

impl KeyPolicy {
    /// Create a new key policy. An `AfterSeparator` separator is normalized with
    /// `normalize` so that it can match normalized field text.
    pub fn new(normalize: Normalize, parse: KeyParse) -> Self {
        let parse = match parse {
            KeyParse::AfterSeparator(separator) => {
                KeyParse::AfterSeparator(normalize.apply(&separator))
            }
            other => other,
        };
        Self { normalize, parse }
    }

    /// A policy that only normalizes.
    pub fn normalized(normalize: Normalize) -> Self {
        Self::new(normalize, KeyParse::Whole)
    }

    /// Turn raw text into a key.
    pub fn key(&self, raw: &str) -> Result<Key, AnnoJoinError> {
        let normalized = self.normalize.apply(raw);
        Ok(Key(self.parse.apply(&normalized)?))
    }
}

/// A normalized lookup key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(String);

impl Key {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extracts a [`Key`] from one 0-based column of a [`Record`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyExtractor {
    pub column: usize,
    pub policy: KeyPolicy,
}

impl KeyExtractor {
    pub fn new(column: usize, policy: KeyPolicy) -> Self {
        Self { column, policy }
    }

    /// Extract the key. A record without the key column yields a
    /// [`AnnoJoinError::MalformedRecord`] error, which callers route through
    /// their [`Strictness`](crate::record::Strictness).
    pub fn extract(&self, record: &Record) -> Result<Key, AnnoJoinError> {
        let raw = record.require(self.column)?;
        self.policy.key(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_symmetry() {
        let policy = KeyPolicy::normalized(Normalize::UppercaseTrim);
        assert_eq!(policy.key(" abc\t").unwrap(), policy.key("ABC").unwrap());
    }

    #[test]
    fn test_identity_is_asymmetric() {
        let policy = KeyPolicy::normalized(Normalize::Identity);
        assert_ne!(policy.key(" abc\t").unwrap(), policy.key("ABC").unwrap());
    }

    #[test]
    fn test_normalize_variants() {
        assert_eq!(Normalize::Identity.apply(" a "), " a ");
        assert_eq!(Normalize::Uppercase.apply(" a "), " A ");
        assert_eq!(Normalize::Trim.apply(" a "), "a");
        assert_eq!(Normalize::UppercaseTrim.apply(" a "), "A");
    }

    #[test]
    fn test_strip_version() {
        let policy = KeyPolicy::new(Normalize::UppercaseTrim, KeyParse::StripVersion);
        assert_eq!(policy.key("nt_039207.1").unwrap().as_str(), "NT_039207");
        assert_eq!(policy.key("NT_039207").unwrap().as_str(), "NT_039207");
    }

    #[test]
    fn test_after_separator() {
        let policy = KeyPolicy::new(
            Normalize::Identity,
            KeyParse::AfterSeparator("sox10_".to_string()),
        );
        assert_eq!(
            policy.key("hg19_sox10_peak_3016").unwrap().as_str(),
            "peak_3016"
        );
        assert!(matches!(
            policy.key("unrelated_peak_1"),
            Err(AnnoJoinError::UnparsableKey { .. })
        ));
    }

    #[test]
    fn test_separator_is_normalized() {
        let policy = KeyPolicy::new(
            Normalize::UppercaseTrim,
            KeyParse::AfterSeparator("mitf_".to_string()),
        );
        assert_eq!(policy.key("ct_hg19_mitf_peak_201").unwrap().as_str(), "PEAK_201");
    }

    #[test]
    fn test_extractor_missing_column() {
        let extractor = KeyExtractor::new(3, KeyPolicy::default());
        let record = Record::from(vec!["chr1", "1", "2"]);
        assert!(matches!(
            extractor.extract(&record),
            Err(AnnoJoinError::MalformedRecord { needed: 4, .. })
        ));
    }
}
