//! The join engine: [`JoinIter`] for record-by-record joins against an
//! [`Index`], and [`set_difference()`] for whole-file key set comparisons.
//!
//! Every join keeps [`JoinCounts`], so matched/unmatched totals are part of the
//! result rather than a side channel. For any finished join,
//! `primary == matched + unmatched_left + malformed`.
//!

use std::collections::{HashSet, VecDeque};

use clap::ValueEnum;
use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::{
    error::AnnoJoinError,
    index::Index,
    key::{Key, KeyExtractor},
    record::{Record, Strictness},
    io::tsv::NA_TSV,
    traits::Projection,
};

/// How primary records are combined with index payloads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum JoinMode {
    /// Emit the primary record unchanged iff its key is in the index.
    #[default]
    InnerFilter,
    /// Emit the primary record with the payload fields appended. A key absent from
    /// the index gets `"NA"` payload fields (and a logged warning). Rows whose key
    /// cannot be extracted are skipped.
    InnerProject,
    /// Like [`JoinMode::InnerProject`], but rows whose key cannot be extracted are
    /// emitted too, with `"NA"` payload fields. No row is ever dropped.
    LeftFillMissing,
}

/// Options for a [`JoinIter`].
#[derive(Clone, Debug, Default)]
pub struct JoinOptions {
    pub mode: JoinMode,
    /// Fill short primary rows with `"NA"` up to this width before appending
    /// payload fields, so appended columns line up.
    pub pad_to: Option<usize>,
    /// The number of payload fields an unmatched row is filled with. Defaults to
    /// the index's widest payload, which is 0 for an empty index.
    pub fill_width: Option<usize>,
    pub strictness: Strictness,
}

impl JoinOptions {
    pub fn new(mode: JoinMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn pad_to(mut self, width: usize) -> Self {
        self.pad_to = Some(width);
        self
    }

    /// Declare the payload width, so unmatched rows stay rectangular even when
    /// the index holds no payload to measure.
    pub fn fill_width(mut self, width: usize) -> Self {
        self.fill_width = Some(width);
        self
    }

    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }
}

/// Counts of how primary records and index keys were routed by a join.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JoinCounts {
    /// Primary records read.
    pub primary: usize,
    /// Primary records whose key was found.
    pub matched: usize,
    /// Primary records whose key was absent from the index.
    pub unmatched_left: usize,
    /// Index keys that no primary record matched.
    pub unmatched_right: usize,
    /// Primary records whose key could not be extracted.
    pub malformed: usize,
    /// Output rows produced.
    pub emitted: usize,
}

/// One output row of a join, with its provenance.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinResult<'a, P> {
    /// The emitted row.
    pub record: Record,
    /// The key of the primary record, if one could be extracted.
    pub key: Option<Key>,
    /// The payloads this row was built from; empty when unmatched.
    pub payloads: &'a [P],
    /// The name of the index that matched, if any.
    pub matched_by: Option<&'a str>,
}

impl<'a, P> JoinResult<'a, P> {
    pub fn is_matched(&self) -> bool {
        self.matched_by.is_some()
    }
}

/// A lazy join of a stream of primary records against an [`Index`].
pub struct JoinIter<'a, I, P> {
    inner: I,
    index: &'a Index<P>,
    extractor: KeyExtractor,
    options: JoinOptions,
    payload_width: usize,
    pending: VecDeque<JoinResult<'a, P>>,
    matched_keys: HashSet<Key>,
    counts: JoinCounts,
}

/// Join `primary` against `index`, looking up the primary's 0-based `column`.
///
/// The lookup key is extracted with the index's own key policy.
pub fn join<'a, I, P>(
    primary: I,
    index: &'a Index<P>,
    column: usize,
    options: JoinOptions,
) -> JoinIter<'a, I::IntoIter, P>
where
    I: IntoIterator<Item = Result<Record, AnnoJoinError>>,
    P: Projection,
{
    JoinIter::new(primary.into_iter(), index, column, options)
}

impl<'a, I, P> JoinIter<'a, I, P>
where
    I: Iterator<Item = Result<Record, AnnoJoinError>>,
    P: Projection,
{
    pub fn new(inner: I, index: &'a Index<P>, column: usize, options: JoinOptions) -> Self {
        Self {
            inner,
            extractor: index.lookup_extractor(column),
            payload_width: options
                .fill_width
                .unwrap_or_else(|| index.payload_width()),
            index,
            options,
            pending: VecDeque::new(),
            matched_keys: HashSet::new(),
            counts: JoinCounts::default(),
        }
    }

    /// The counts so far; final once the iterator is exhausted.
    pub fn counts(&self) -> JoinCounts {
        JoinCounts {
            unmatched_right: self.index.len() - self.matched_keys.len(),
            ..self.counts.clone()
        }
    }

    fn padded(&self, mut record: Record) -> Record {
        if let Some(width) = self.options.pad_to {
            record.pad_to(width);
        }
        record
    }

    fn fill_missing(&self, record: Record) -> Record {
        let mut record = self.padded(record);
        record.extend(NA_TSV.fill(self.payload_width));
        record
    }

    /// Route one primary record into zero or more pending results.
    fn process(&mut self, record: Record) -> Result<(), AnnoJoinError> {
        self.counts.primary += 1;
        let key = match self.extractor.extract(&record) {
            Ok(key) => key,
            Err(e) => {
                self.counts.malformed += 1;
                if self.options.mode == JoinMode::LeftFillMissing {
                    debug!(
                        "line {}: {}; filling with {}",
                        record.line(),
                        e,
                        NA_TSV.missing()
                    );
                    let row = self.fill_missing(record);
                    self.pending.push_back(JoinResult {
                        record: row,
                        key: None,
                        payloads: &[],
                        matched_by: None,
                    });
                    return Ok(());
                }
                return self.options.strictness.absorb(e);
            }
        };

        let index = self.index;
        match index.get(&key) {
            Some(payloads) => {
                self.counts.matched += 1;
                self.matched_keys.insert(key.clone());
                let matched_by = Some(index.name());
                match self.options.mode {
                    JoinMode::InnerFilter => self.pending.push_back(JoinResult {
                        record,
                        key: Some(key),
                        payloads,
                        matched_by,
                    }),
                    JoinMode::InnerProject | JoinMode::LeftFillMissing => {
                        let base = self.padded(record);
                        for (i, payload) in payloads.iter().enumerate() {
                            let mut row = base.clone();
                            row.extend(payload.project());
                            // keep projected rows rectangular when payloads are ragged
                            row.pad_to(base.len() + self.payload_width);
                            self.pending.push_back(JoinResult {
                                record: row,
                                key: Some(key.clone()),
                                payloads: &payloads[i..i + 1],
                                matched_by,
                            });
                        }
                    }
                }
            }
            None => {
                self.counts.unmatched_left += 1;
                match self.options.mode {
                    JoinMode::InnerFilter => {
                        debug!("key '{}' not in index '{}'", key, index.name());
                    }
                    JoinMode::InnerProject | JoinMode::LeftFillMissing => {
                        warn!("ID not found in '{}': {}", index.name(), key);
                        let row = self.fill_missing(record);
                        self.pending.push_back(JoinResult {
                            record: row,
                            key: Some(key),
                            payloads: &[],
                            matched_by: None,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl<'a, I, P> Iterator for JoinIter<'a, I, P>
where
    I: Iterator<Item = Result<Record, AnnoJoinError>>,
    P: Projection,
{
    type Item = Result<JoinResult<'a, P>, AnnoJoinError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(result) = self.pending.pop_front() {
                self.counts.emitted += 1;
                return Some(Ok(result));
            }
            let record = match self.inner.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e)),
            };
            if let Err(e) = self.process(record) {
                return Some(Err(e));
            }
        }
    }
}

/// The partition of two key sets into shared and one-sided keys.
///
/// Each list preserves first-seen order: `common` and `unique_left` in the order of
/// the left input, `unique_right` in the order of the right input. Repeated keys are
/// collapsed to their first occurrence on both sides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SetDifference {
    pub common: Vec<Key>,
    pub unique_left: Vec<Key>,
    pub unique_right: Vec<Key>,
}

impl SetDifference {
    /// The number of distinct left keys.
    pub fn left_len(&self) -> usize {
        self.common.len() + self.unique_left.len()
    }

    /// The number of distinct right keys.
    pub fn right_len(&self) -> usize {
        self.common.len() + self.unique_right.len()
    }
}

/// Partition two key sequences into common, left-only, and right-only keys.
pub fn set_difference<L, R>(left: L, right: R) -> SetDifference
where
    L: IntoIterator<Item = Key>,
    R: IntoIterator<Item = Key>,
{
    let left: IndexSet<Key> = left.into_iter().collect();
    let right: IndexSet<Key> = right.into_iter().collect();

    let (common, unique_left) = left.iter().cloned().partition(|key| right.contains(key));
    let unique_right = right
        .iter()
        .filter(|key| !left.contains(*key))
        .cloned()
        .collect();

    SetDifference {
        common,
        unique_left,
        unique_right,
    }
}

impl<P> Index<P> {
    /// The [`set_difference()`] of this index's keys and `other`'s keys.
    ///
    /// Both indexes must share a key policy, otherwise equal raw values could
    /// silently fail to compare equal.
    pub fn set_difference<Q>(&self, other: &Index<Q>) -> Result<SetDifference, AnnoJoinError> {
        if self.key_policy() != other.key_policy() {
            return Err(AnnoJoinError::ArgumentError(format!(
                "indexes '{}' and '{}' use different key policies ({:?} vs {:?})",
                self.name(),
                other.name(),
                self.key_policy(),
                other.key_policy()
            )));
        }
        Ok(set_difference(
            self.keys().cloned(),
            other.keys().cloned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        index::CollisionPolicy,
        key::{KeyPolicy, Normalize},
        test_utilities::random_keys,
        traits::TsvSerialize,
    };

    fn keys(raw: &[&str]) -> Vec<Key> {
        let policy = KeyPolicy::default();
        raw.iter().map(|r| policy.key(r).unwrap()).collect()
    }

    fn primary(rows: Vec<Vec<&str>>) -> Vec<Result<Record, AnnoJoinError>> {
        rows.into_iter().map(|r| Ok(Record::from(r))).collect()
    }

    fn foo_index() -> Index<Vec<String>> {
        Index::from_pairs(
            "foo",
            vec![("X", vec!["foo".to_string()])],
            KeyPolicy::default(),
            CollisionPolicy::Overwrite,
        )
        .unwrap()
    }

    #[test]
    fn test_left_fill_missing() {
        let index = foo_index();
        let mut iter = join(
            primary(vec![vec!["X"], vec!["Y"]]),
            &index,
            0,
            JoinOptions::new(JoinMode::LeftFillMissing),
        );
        let rows: Vec<_> = iter.by_ref().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].record.to_tsv(), "X\tfoo");
        assert_eq!(rows[0].matched_by, Some("foo"));
        assert_eq!(rows[1].record.to_tsv(), "Y\tNA");
        assert!(!rows[1].is_matched());

        let counts = iter.counts();
        assert_eq!(counts.primary, 2);
        assert_eq!(counts.matched, 1);
        assert_eq!(counts.unmatched_left, 1);
        assert_eq!(counts.unmatched_right, 0);
        assert_eq!(counts.emitted, 2);
    }

    #[test]
    fn test_fill_width_with_empty_index() {
        let index: Index<Vec<String>> =
            Index::new("empty", KeyPolicy::default(), CollisionPolicy::Overwrite);
        assert_eq!(index.payload_width(), 0);

        let options = JoinOptions::new(JoinMode::InnerProject)
            .pad_to(2)
            .fill_width(3);
        let rows: Vec<_> = join(primary(vec![vec!["X"]]), &index, 0, options)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows[0].record.to_tsv(), "X\tNA\tNA\tNA\tNA");
    }

    #[test]
    fn test_inner_filter() {
        let index = foo_index();
        let mut iter = join(
            primary(vec![vec!["a", "x"], vec!["b", "y"], vec!["c", "X"], vec!["short"]]),
            &index,
            1,
            JoinOptions::new(JoinMode::InnerFilter),
        );
        let rows: Vec<_> = iter.by_ref().collect::<Result<_, _>>().unwrap();
        // the default key policy upper-cases, so "x" matches "X"
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].record.get(0), Some("a"));
        assert_eq!(rows[1].record.get(0), Some("c"));
        assert_eq!(rows[0].payloads.len(), 1);
        let counts = iter.counts();
        assert_eq!(counts.malformed, 1);
        assert_eq!(
            counts.primary,
            counts.matched + counts.unmatched_left + counts.malformed
        );
        assert_eq!(counts.emitted, rows.len());
    }

    #[test]
    fn test_inner_filter_strict_escalates() {
        let index = foo_index();
        let results: Vec<_> = join(
            primary(vec![vec!["a"]]),
            &index,
            1,
            JoinOptions::new(JoinMode::InnerFilter).strictness(Strictness::Strict),
        )
        .collect();
        assert!(results[0].is_err());
    }

    #[test]
    fn test_inner_project_fills_and_pads() {
        let index = Index::from_pairs(
            "biomart",
            vec![("T1", vec!["G1".to_string(), "SOX10".to_string()])],
            KeyPolicy::normalized(Normalize::UppercaseTrim),
            CollisionPolicy::Overwrite,
        )
        .unwrap();
        let mut iter = join(
            primary(vec![vec!["p1", "t1"], vec!["p2", "T9", "extra"], vec!["p3"]]),
            &index,
            1,
            JoinOptions::new(JoinMode::InnerProject).pad_to(3),
        );
        let rows: Vec<_> = iter.by_ref().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].record.to_tsv(), "p1\tt1\tNA\tG1\tSOX10");
        assert_eq!(rows[1].record.to_tsv(), "p2\tT9\textra\tNA\tNA");
        assert_eq!(iter.counts().malformed, 1);
    }

    #[test]
    fn test_left_fill_keeps_malformed() {
        let index = foo_index();
        let rows: Vec<_> = join(
            primary(vec![vec!["a"]]),
            &index,
            1,
            JoinOptions::new(JoinMode::LeftFillMissing).strictness(Strictness::Strict),
        )
        .collect::<Result<_, _>>()
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.to_tsv(), "a\tNA");
        assert_eq!(rows[0].key, None);
    }

    #[test]
    fn test_project_collect_emits_one_row_per_payload() {
        let index = Index::from_pairs(
            "peaks",
            vec![("G1", "peak_1".to_string()), ("G1", "peak_2".to_string())],
            KeyPolicy::default(),
            CollisionPolicy::Collect,
        )
        .unwrap();
        let rows: Vec<_> = join(
            primary(vec![vec!["G1"]]),
            &index,
            0,
            JoinOptions::new(JoinMode::InnerProject),
        )
        .collect::<Result<_, _>>()
        .unwrap();
        let lines: Vec<_> = rows.iter().map(|r| r.record.to_tsv()).collect();
        assert_eq!(lines, vec!["G1\tpeak_1", "G1\tpeak_2"]);
    }

    #[test]
    fn test_unmatched_right() {
        let index = Index::from_pairs(
            "ids",
            vec![("A", ()), ("B", ()), ("C", ())],
            KeyPolicy::default(),
            CollisionPolicy::Overwrite,
        )
        .unwrap();
        let mut iter = join(
            primary(vec![vec!["A"], vec!["A"], vec!["D"]]),
            &index,
            0,
            JoinOptions::new(JoinMode::InnerFilter),
        );
        assert_eq!(iter.by_ref().count(), 2);
        let counts = iter.counts();
        assert_eq!(counts.matched, 2);
        assert_eq!(counts.unmatched_left, 1);
        assert_eq!(counts.unmatched_right, 2);
    }

    #[test]
    fn test_set_difference_scenario() {
        let diff = set_difference(keys(&["A", "B", "C"]), keys(&["B", "C", "D"]));
        assert_eq!(diff.common, keys(&["B", "C"]));
        assert_eq!(diff.unique_left, keys(&["A"]));
        assert_eq!(diff.unique_right, keys(&["D"]));
    }

    #[test]
    fn test_set_difference_collapses_duplicates() {
        let diff = set_difference(keys(&["C", "A", "C", "B"]), keys(&["B", "B", "E", "C"]));
        assert_eq!(diff.common, keys(&["C", "B"]));
        assert_eq!(diff.unique_left, keys(&["A"]));
        assert_eq!(diff.unique_right, keys(&["E"]));
    }

    #[test]
    fn test_set_difference_partition_sizes() {
        for _ in 0..100 {
            let left = random_keys(50, 30);
            let right = random_keys(50, 30);
            let distinct_left: HashSet<_> = left.iter().cloned().collect();
            let distinct_right: HashSet<_> = right.iter().cloned().collect();
            let diff = set_difference(left, right);
            assert_eq!(diff.left_len(), distinct_left.len());
            assert_eq!(diff.right_len(), distinct_right.len());
        }
    }

    #[test]
    fn test_index_set_difference_requires_same_policy() {
        let upper = Index::from_pairs(
            "a",
            vec![("x", ())],
            KeyPolicy::normalized(Normalize::UppercaseTrim),
            CollisionPolicy::Overwrite,
        )
        .unwrap();
        let identity = Index::from_pairs(
            "b",
            vec![("X", ())],
            KeyPolicy::normalized(Normalize::Identity),
            CollisionPolicy::Overwrite,
        )
        .unwrap();
        assert!(upper.set_difference(&identity).is_err());
        assert_eq!(upper.set_difference(&upper).unwrap().common.len(), 1);
    }
}
