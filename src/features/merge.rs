use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use tracing::debug;

use super::SessionTag;
use super::records::FeatureRecord;

/// Union of every field contributed for one key, tagged with its session.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow<K> {
    pub session_id: i64,
    pub recording_filename: String,
    pub key: K,
    /// Fields in first-contributed order.
    pub fields: Vec<(&'static str, f64)>,
}

impl<K> MergedRow<K> {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| *value)
    }

    /// Field value, or `missing` when no source contributed it.
    pub fn get_or(&self, name: &str, missing: f64) -> f64 {
        self.get(name).unwrap_or(missing)
    }
}

/// Key-based union of feature records from several extractors.
///
/// Sources are applied in the order they are added. When two sources report
/// the same field for the same key, the later source wins. Keys keep the
/// order in which they were first seen, so rows follow the first source's
/// channel and band order.
#[derive(Debug)]
pub struct FeatureMerger<K> {
    index: HashMap<K, usize>,
    rows: Vec<(K, Vec<(&'static str, f64)>)>,
}

impl<K> Default for FeatureMerger<K> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            rows: Vec::new(),
        }
    }
}

impl<K: Clone + Eq + Hash + Debug> FeatureMerger<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source<R>(&mut self, source: &str, records: &[R]) -> &mut Self
    where
        R: FeatureRecord<Key = K>,
    {
        for record in records {
            let key = record.key();
            let slot = match self.index.get(&key) {
                Some(&slot) => slot,
                None => {
                    let slot = self.rows.len();
                    self.index.insert(key.clone(), slot);
                    self.rows.push((key.clone(), Vec::new()));
                    slot
                }
            };
            let fields = &mut self.rows[slot].1;
            for (name, value) in record.fields() {
                match fields.iter_mut().find(|(existing, _)| *existing == name) {
                    Some(entry) => {
                        debug!(source, field = name, key = ?key, "Later source overrides field");
                        entry.1 = value;
                    }
                    None => fields.push((name, value)),
                }
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn finish(self, tag: &SessionTag) -> Vec<MergedRow<K>> {
        self.rows
            .into_iter()
            .map(|(key, fields)| MergedRow {
                session_id: tag.session_id,
                recording_filename: tag.recording_filename.clone(),
                key,
                fields,
            })
            .collect()
    }
}
