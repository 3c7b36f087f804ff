//! Merge of an incoming batch into an existing collection by identity.

use std::collections::HashMap;

use super::traits::Cacheable;

/// Upsert `incoming` into `existing`.
///
/// A record whose key is already present replaces it in place; new keys are
/// appended in batch order. Incoming always wins, with no field-level merge.
pub fn merge_by_identity<T: Cacheable>(existing: Vec<T>, incoming: Vec<T>) -> Vec<T> {
  let mut merged = existing;
  let mut positions: HashMap<String, usize> = merged
    .iter()
    .enumerate()
    .map(|(i, r)| (r.cache_key().to_string(), i))
    .collect();

  for record in incoming {
    match positions.get(record.cache_key()) {
      Some(&i) => merged[i] = record,
      None => {
        positions.insert(record.cache_key().to_string(), merged.len());
        merged.push(record);
      }
    }
  }

  merged
}
