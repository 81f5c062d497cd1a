//! The [`Index`] type: an in-memory lookup table from a normalized [`Key`] to
//! one or more payloads.
//!
//! An index is built exactly once from a stream of records, then only read. The
//! treatment of duplicate keys is explicit: see [`CollisionPolicy`].
//!

use clap::ValueEnum;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::{
    error::AnnoJoinError,
    key::{Key, KeyExtractor, KeyPolicy},
    record::{Record, Strictness},
    traits::Projection,
};

/// What to do when a key is seen again while building an [`Index`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CollisionPolicy {
    /// The later payload replaces the earlier one.
    #[default]
    Overwrite,
    /// Payloads accumulate per key, in input order.
    Collect,
}

/// Counts gathered while building an [`Index`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Records offered to the builder.
    pub records: usize,
    /// Records whose key was already present.
    pub collisions: usize,
    /// Records skipped because the key or payload could not be extracted.
    pub skipped: usize,
}

/// A mapping from [`Key`] to payloads of type `P`, in first-seen key order.
#[derive(Clone, Debug)]
pub struct Index<P> {
    name: String,
    policy: KeyPolicy,
    collisions: CollisionPolicy,
    entries: IndexMap<Key, Vec<P>>,
    summary: BuildSummary,
}

impl<P> Index<P> {
    /// Create an empty index. `name` is reported as the provenance of join matches.
    pub fn new(name: impl Into<String>, policy: KeyPolicy, collisions: CollisionPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            collisions,
            entries: IndexMap::new(),
            summary: BuildSummary::default(),
        }
    }

    /// Build an index over `records`, keyed by `extractor`, storing the payload
    /// `payload(record)` for each record.
    ///
    /// Rows with a missing key column, an unparsable key, or a payload that
    /// fails with a recoverable error are skipped and counted (or escalated,
    /// under [`Strictness::Strict`]).
    pub fn build<I, F>(
        name: impl Into<String>,
        records: I,
        extractor: &KeyExtractor,
        collisions: CollisionPolicy,
        strictness: Strictness,
        mut payload: F,
    ) -> Result<Self, AnnoJoinError>
    where
        I: IntoIterator<Item = Result<Record, AnnoJoinError>>,
        F: FnMut(&Record) -> Result<P, AnnoJoinError>,
    {
        let mut index = Index::new(name, extractor.policy.clone(), collisions);
        for result in records {
            let record = result?;
            index.summary.records += 1;
            let entry = extractor
                .extract(&record)
                .and_then(|key| Ok((key, payload(&record)?)));
            match entry {
                Ok((key, value)) => index.insert(key, value),
                Err(e) => {
                    strictness.absorb(e)?;
                    index.summary.skipped += 1;
                }
            }
        }
        info!(
            "built index '{}': {} records, {} keys, {} collisions ({:?}), {} skipped",
            index.name,
            index.summary.records,
            index.len(),
            index.summary.collisions,
            index.collisions,
            index.summary.skipped
        );
        Ok(index)
    }

    /// Build an index from raw `(key, payload)` pairs, normalizing each key with `policy`.
    pub fn from_pairs<I, S>(
        name: impl Into<String>,
        pairs: I,
        policy: KeyPolicy,
        collisions: CollisionPolicy,
    ) -> Result<Self, AnnoJoinError>
    where
        I: IntoIterator<Item = (S, P)>,
        S: AsRef<str>,
    {
        let mut index = Index::new(name, policy, collisions);
        for (raw, value) in pairs {
            index.summary.records += 1;
            let key = index.policy.key(raw.as_ref())?;
            index.insert(key, value);
        }
        Ok(index)
    }

    /// Insert a payload under an already normalized key, honoring the collision policy.
    pub fn insert(&mut self, key: Key, value: P) {
        match self.entries.get_mut(&key) {
            Some(values) => {
                debug!("duplicate key '{}' in index '{}'", key, self.name);
                self.summary.collisions += 1;
                match self.collisions {
                    CollisionPolicy::Overwrite => *values = vec![value],
                    CollisionPolicy::Collect => values.push(value),
                }
            }
            None => {
                self.entries.insert(key, vec![value]);
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key policy used to build this index; lookups must use the same one.
    pub fn key_policy(&self) -> &KeyPolicy {
        &self.policy
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        self.collisions
    }

    pub fn summary(&self) -> &BuildSummary {
        &self.summary
    }

    /// An extractor for looking up this index from another file's `column`.
    pub fn lookup_extractor(&self, column: usize) -> KeyExtractor {
        KeyExtractor::new(column, self.policy.clone())
    }

    /// Normalize raw text with this index's key policy.
    pub fn key(&self, raw: &str) -> Result<Key, AnnoJoinError> {
        self.policy.key(raw)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    /// All payloads for `key`, in insertion order.
    pub fn get(&self, key: &Key) -> Option<&[P]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// The most recently inserted payload for `key`.
    pub fn get_one(&self, key: &Key) -> Option<&P> {
        self.entries.get(key).and_then(|values| values.last())
    }

    /// Look up raw text, normalizing it with this index's key policy first.
    pub fn lookup(&self, raw: &str) -> Result<Option<&P>, AnnoJoinError> {
        Ok(self.get_one(&self.key(raw)?))
    }

    /// Like [`Index::lookup()`], but a missing key is a
    /// [`AnnoJoinError::MissingKey`] error.
    pub fn require(&self, raw: &str) -> Result<&P, AnnoJoinError> {
        let key = self.key(raw)?;
        self.get_one(&key).ok_or_else(|| AnnoJoinError::MissingKey {
            key: key.into_string(),
            index: self.name.clone(),
        })
    }

    /// Keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &[P])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// The number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: Projection> Index<P> {
    /// The widest payload projection, used to fill unmatched rows with `"NA"`.
    pub fn payload_width(&self) -> usize {
        self.entries
            .values()
            .flat_map(|values| values.iter().map(Projection::width))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KeyParse, Normalize};

    fn records() -> Vec<Result<Record, AnnoJoinError>> {
        vec![
            Ok(Record::from(vec!["K1", "A"])),
            Ok(Record::from(vec!["K1", "B"])),
            Ok(Record::from(vec!["K2", "C"])),
        ]
    }

    fn second_field(record: &Record) -> Result<String, AnnoJoinError> {
        Ok(record.require(1)?.to_string())
    }

    #[test]
    fn test_collect_policy() {
        let extractor = KeyExtractor::new(0, KeyPolicy::default());
        let index = Index::build(
            "test",
            records(),
            &extractor,
            CollisionPolicy::Collect,
            Strictness::Lenient,
            second_field,
        )
        .unwrap();
        let k1 = index.key("K1").unwrap();
        let k2 = index.key("K2").unwrap();
        assert_eq!(index.get(&k1).unwrap(), &["A", "B"]);
        assert_eq!(index.get(&k2).unwrap(), &["C"]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.summary().collisions, 1);
    }

    #[test]
    fn test_overwrite_policy() {
        let extractor = KeyExtractor::new(0, KeyPolicy::default());
        let index = Index::build(
            "test",
            records(),
            &extractor,
            CollisionPolicy::Overwrite,
            Strictness::Lenient,
            second_field,
        )
        .unwrap();
        assert_eq!(index.lookup("K1").unwrap(), Some(&"B".to_string()));
        assert_eq!(index.get(&index.key("K1").unwrap()).unwrap().len(), 1);
        assert_eq!(index.lookup("K2").unwrap(), Some(&"C".to_string()));
        // first-seen key order survives overwrites
        let keys: Vec<_> = index.keys().map(Key::as_str).collect();
        assert_eq!(keys, vec!["K1", "K2"]);
    }

    #[test]
    fn test_short_rows_skipped_or_escalated() {
        let rows = || {
            vec![
                Ok(Record::from(vec!["K1", "A"])),
                Ok(Record::from(vec!["K2"])),
            ]
        };
        let extractor = KeyExtractor::new(0, KeyPolicy::default());
        let index = Index::build(
            "test",
            rows(),
            &extractor,
            CollisionPolicy::Overwrite,
            Strictness::Lenient,
            second_field,
        )
        .unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.summary().skipped, 1);

        let result = Index::build(
            "test",
            rows(),
            &extractor,
            CollisionPolicy::Overwrite,
            Strictness::Strict,
            second_field,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_lookup_uses_build_policy() {
        let policy = KeyPolicy::new(Normalize::UppercaseTrim, KeyParse::Whole);
        let index =
            Index::from_pairs("genes", vec![(" ens001 ", 1)], policy, CollisionPolicy::Overwrite)
                .unwrap();
        let extractor = index.lookup_extractor(2);
        let record = Record::from(vec!["x", "y", "ENS001"]);
        let key = extractor.extract(&record).unwrap();
        assert_eq!(index.get_one(&key), Some(&1));
    }

    #[test]
    fn test_require_missing_key() {
        let index: Index<u8> =
            Index::from_pairs("ids", Vec::<(&str, u8)>::new(), KeyPolicy::default(), CollisionPolicy::Overwrite)
                .unwrap();
        assert!(index.is_empty());
        assert!(matches!(
            index.require("absent"),
            Err(AnnoJoinError::MissingKey { .. })
        ));
    }

    #[test]
    fn test_payload_width() {
        let index = Index::from_pairs(
            "biomart",
            vec![
                ("T1", vec!["g".to_string(), "n".to_string()]),
                ("T2", vec!["g".to_string(), "n".to_string(), "d".to_string()]),
            ],
            KeyPolicy::default(),
            CollisionPolicy::Overwrite,
        )
        .unwrap();
        assert_eq!(index.payload_width(), 3);
    }
}
