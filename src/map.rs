// ABOUTME: Open-addressed hash table backing environment frames

use crate::value::Value;

const INITIAL_CAPACITY: usize = 8;

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    value: Value,
}

/// String-keyed table with linear probing. The table is resized (doubling)
/// one slot short of full, so a probe sequence always terminates at an
/// empty slot. Frames are dropped whole, so there is no deletion.
#[derive(Debug, Clone)]
pub struct SymbolMap {
    entries: Vec<Option<Entry>>,
    used: usize,
}

/// Multiplicative string hash: h = 13; h = h*31 + byte.
fn hash_key(key: &str) -> usize {
    let mut h: usize = 13;
    for b in key.bytes() {
        h = h.wrapping_mul(31).wrapping_add(b as usize);
    }
    h
}

impl SymbolMap {
    pub fn new() -> Self {
        SymbolMap {
            entries: vec![None; INITIAL_CAPACITY],
            used: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.used
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Associates `key` with `value`, overwriting any previous binding.
    pub fn put(&mut self, key: &str, value: Value) {
        if self.used == self.entries.len() - 1 {
            self.resize();
        }

        let cap = self.entries.len();
        let mut idx = hash_key(key) % cap;
        loop {
            match &mut self.entries[idx] {
                Some(entry) if entry.key == key => {
                    entry.value = value;
                    return;
                }
                Some(_) => {
                    idx = (idx + 1) % cap;
                }
                None => {
                    self.entries[idx] = Some(Entry {
                        key: key.to_string(),
                        value,
                    });
                    self.used += 1;
                    return;
                }
            }
        }
    }

    /// Looks up `key` without allocating. The outer `Option` distinguishes
    /// a missing key from a key bound to nil.
    pub fn get(&self, key: &str) -> Option<Value> {
        let cap = self.entries.len();
        let mut idx = hash_key(key) % cap;
        loop {
            match &self.entries[idx] {
                Some(entry) if entry.key == key => return Some(entry.value),
                Some(_) => idx = (idx + 1) % cap,
                None => return None,
            }
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterator over stored values, used by the collector's mark phase.
    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.entries.iter().flatten().map(|entry| entry.value)
    }

    /// Rehashes every occupied slot into a backing array of twice the size.
    fn resize(&mut self) {
        let doubled = self.entries.len() * 2;
        let old = std::mem::replace(&mut self.entries, vec![None; doubled]);
        self.used = 0;
        for entry in old.into_iter().flatten() {
            self.put(&entry.key, entry.value);
        }
    }
}

impl Default for SymbolMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ObjRef;

    #[test]
    fn test_put_and_get() {
        let mut map = SymbolMap::new();
        map.put("x", Some(ObjRef(7)));

        assert_eq!(map.get("x"), Some(Some(ObjRef(7))));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let map = SymbolMap::new();
        assert_eq!(map.get("missing"), None);
    }

    #[test]
    fn test_nil_binding_is_not_a_miss() {
        let mut map = SymbolMap::new();
        map.put("nil-bound", None);

        assert_eq!(map.get("nil-bound"), Some(None));
        assert_eq!(map.get("absent"), None);
    }

    #[test]
    fn test_overwrite_existing_key() {
        let mut map = SymbolMap::new();
        map.put("x", Some(ObjRef(1)));
        map.put("x", Some(ObjRef(2)));

        assert_eq!(map.get("x"), Some(Some(ObjRef(2))));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_resize_preserves_entries() {
        let mut map = SymbolMap::new();
        // Push well past the initial capacity of 8.
        for i in 0..100u32 {
            map.put(&format!("key{}", i), Some(ObjRef(i)));
        }

        assert_eq!(map.len(), 100);
        for i in 0..100u32 {
            assert_eq!(map.get(&format!("key{}", i)), Some(Some(ObjRef(i))));
        }
    }

    #[test]
    fn test_colliding_keys() {
        // Probing must walk past occupied slots regardless of hash spread.
        let mut map = SymbolMap::new();
        map.put("ab", Some(ObjRef(1)));
        map.put("ba", Some(ObjRef(2)));
        map.put("aa", Some(ObjRef(3)));

        assert_eq!(map.get("ab"), Some(Some(ObjRef(1))));
        assert_eq!(map.get("ba"), Some(Some(ObjRef(2))));
        assert_eq!(map.get("aa"), Some(Some(ObjRef(3))));
    }

    #[test]
    fn test_values_iterator() {
        let mut map = SymbolMap::new();
        map.put("a", Some(ObjRef(1)));
        map.put("b", None);

        let values: Vec<Value> = map.values().collect();
        assert_eq!(values.len(), 2);
        assert!(values.contains(&Some(ObjRef(1))));
        assert!(values.contains(&None));
    }
}
