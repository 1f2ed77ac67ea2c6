use std::collections::{HashMap, HashSet};

use crate::vocab::VocabId;

///Hash of a delete variant, the key of the delete index. Two distinct
///variants may collide; every candidate is re-verified by exact distance, so
///collisions only cost a little extra work.
pub type VariantHash = u64;

///Deterministic FNV-1a hash of a variant string. Must stay fixed across
///versions: rebuilt indexes have to agree with previously computed ones.
pub fn variant_hash(variant: &str) -> VariantHash {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in variant.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

///The delete index: maps the hash of every prefix-delete variant to the ids
///of all dictionary terms that share it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteIndex {
    buckets: HashMap<VariantHash, Vec<VocabId>>,
}

impl DeleteIndex {
    pub fn new() -> Self {
        DeleteIndex {
            buckets: HashMap::new(),
        }
    }

    pub fn get(&self, hash: VariantHash) -> Option<&[VocabId]> {
        self.buckets.get(&hash).map(|bucket| bucket.as_slice())
    }

    ///Append an id to the bucket for a variant hash, ignoring duplicates
    ///(colliding variants of the same term land in the same bucket)
    pub fn insert(&mut self, hash: VariantHash, id: VocabId) {
        let bucket = self.buckets.entry(hash).or_insert_with(Vec::new);
        if !bucket.contains(&id) {
            bucket.push(id);
        }
    }

    ///Remove an id from the bucket for a variant hash; buckets that become
    ///empty are dropped entirely
    pub fn remove(&mut self, hash: VariantHash, id: VocabId) {
        if let Some(bucket) = self.buckets.get_mut(&hash) {
            bucket.retain(|member| *member != id);
            if bucket.is_empty() {
                self.buckets.remove(&hash);
            }
        }
    }

    ///Number of variant buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

///Enumerate all delete variants of a term's prefix: every string reachable by
///removing up to `max_distance` characters from the first `prefix_length`
///characters, the prefix itself included. The empty string is a legal variant
///for terms no longer than `max_distance`.
pub fn edits_prefix(term: &str, max_distance: usize, prefix_length: usize) -> HashSet<String> {
    let mut variants = HashSet::new();
    let chars: Vec<char> = term.chars().collect();
    if chars.len() <= max_distance {
        variants.insert(String::new());
    }
    let prefix: &[char] = &chars[..chars.len().min(prefix_length)];
    variants.insert(prefix.iter().collect());
    edits(prefix, 0, max_distance, &mut variants);
    variants
}

///Breadth-first peel: from each string of length L generate the L strings of
///length L-1 by removing each position, recursing until the deletion budget
///is spent. The variant set doubles as the visited set.
fn edits(word: &[char], depth: usize, max_distance: usize, variants: &mut HashSet<String>) {
    let depth = depth + 1;
    if depth > max_distance || word.len() <= 1 {
        return;
    }
    for skip in 0..word.len() {
        let shorter: Vec<char> = word
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != skip)
            .map(|(_, c)| *c)
            .collect();
        let delete: String = shorter.iter().collect();
        if variants.insert(delete) && depth < max_distance {
            edits(&shorter, depth, max_distance, variants);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(variant_hash("house"), variant_hash("house"));
        assert_ne!(variant_hash("house"), variant_hash("mouse"));
        // FNV-1a of the empty string is the offset basis
        assert_eq!(variant_hash(""), 0xcbf29ce484222325);
    }

    #[test]
    fn edits_single_deletion() {
        let variants = edits_prefix("house", 1, 7);
        let expected: HashSet<String> = ["house", "ouse", "huse", "hose", "houe", "hous"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(variants, expected);
    }

    #[test]
    fn edits_zero_distance_yields_prefix_only() {
        let variants = edits_prefix("ab", 0, 7);
        let expected: HashSet<String> = ["ab"].iter().map(|s| s.to_string()).collect();
        assert_eq!(variants, expected);
    }

    #[test]
    fn edits_respect_prefix_length() {
        // only the first three characters are peeled
        let variants = edits_prefix("house", 1, 3);
        let expected: HashSet<String> = ["hou", "ou", "hu", "ho"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(variants, expected);
    }

    #[test]
    fn edits_short_term_reaches_empty() {
        let variants = edits_prefix("ab", 2, 7);
        let expected: HashSet<String> = ["ab", "a", "b", ""].iter().map(|s| s.to_string()).collect();
        assert_eq!(variants, expected);
    }

    #[test]
    fn bucket_rejects_duplicates_and_drops_empty() {
        let mut index = DeleteIndex::new();
        let h = variant_hash("ab");
        index.insert(h, 7);
        index.insert(h, 7);
        assert_eq!(index.get(h), Some(&[7u64][..]));
        index.remove(h, 7);
        assert!(index.get(h).is_none());
        assert!(index.is_empty());
    }
}
