//! String interning
//!
//! An interner maps strings to small integer keys.
//! Each distinct string is stored once, keys are cheap to copy and compare,
//! and the original string is recovered with [resolve](Interner::resolve).
//! Interned strings are never deallocated.
//!
//! ```
//! # use texcraft_stdext::collections::interner::Interner;
//! let mut interner: Interner = Default::default();
//! let hello_1 = interner.get_or_intern("hello");
//! let world_1 = interner.get_or_intern("world");
//! let hello_2 = interner.get_or_intern("hello");
//! assert_eq!(hello_1, hello_2);
//! assert_ne!(hello_1, world_1);
//!
//! assert_eq!(interner.resolve(hello_1), Some("hello"));
//! assert_eq!(interner.get("other"), None);
//! ```
//!
//! All strings live in one [String] buffer.
//! A vector records the end offset of each string in the buffer;
//!     the key of a string is derived from its position in this vector.
//! Deduplication uses a map from the [u64] hash of each string to the keys with that hash,
//!     so the string itself is not stored a second time.

use std::collections::hash_map;
use std::collections::HashMap;
use std::hash::{self, BuildHasher, Hasher};
use std::num;

/// Types implementing this trait can be used as keys in the [Interner].
pub trait Key: Copy + Eq {
    /// Try to create a key from the provided index.
    /// The first string interned gets index 0, the second 1, and so on.
    fn try_from_usize(index: usize) -> Option<Self>;

    /// Recover the index from the key.
    fn into_usize(self) -> usize;
}

impl Key for num::NonZeroU32 {
    fn try_from_usize(index: usize) -> Option<Self> {
        let u: u32 = index.try_into().ok()?;
        num::NonZeroU32::new(u.checked_add(1)?)
    }

    fn into_usize(self) -> usize {
        self.get() as usize - 1
    }
}

/// String interner.
///
/// See the module documentation for information about this data structure.
#[derive(Clone)]
pub struct Interner<K = num::NonZeroU32, S = hash_map::RandomState> {
    buffer: String,
    ends: Vec<usize>,
    dedup: HashMap<u64, Vec<K>>,
    hash_builder: S,
}

impl<K, S: Default> Default for Interner<K, S> {
    fn default() -> Self {
        Self {
            buffer: Default::default(),
            ends: Default::default(),
            dedup: Default::default(),
            hash_builder: Default::default(),
        }
    }
}

impl<K: Key, S: BuildHasher> Interner<K, S> {
    /// Intern the provided string and return its key.
    ///
    /// # Panics
    ///
    /// Panics if the key type cannot represent the number of interned strings.
    pub fn get_or_intern(&mut self, s: &str) -> K {
        let hash = self.hash(s);
        if let Some(key) = self.get_with_hash(s, hash) {
            return key;
        }
        let key = match K::try_from_usize(self.ends.len()) {
            Some(key) => key,
            None => panic!("string interner exhausted its key space"),
        };
        self.buffer.push_str(s);
        self.ends.push(self.buffer.len());
        self.dedup.entry(hash).or_default().push(key);
        key
    }

    /// Get the key for a string if the string has been interned.
    pub fn get(&self, s: &str) -> Option<K> {
        self.get_with_hash(s, self.hash(s))
    }

    /// Return the string corresponding to the key, or [None] if the key was not issued by this interner.
    pub fn resolve(&self, key: K) -> Option<&str> {
        let index = key.into_usize();
        let end = *self.ends.get(index)?;
        let start = if index == 0 { 0 } else { self.ends[index - 1] };
        Some(&self.buffer[start..end])
    }

    /// Number of distinct strings interned.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Iterate over all interned strings and their keys, in order of interning.
    pub fn iter(&self) -> impl Iterator<Item = (K, &str)> + '_ {
        (0..self.ends.len()).filter_map(|i| {
            let key = K::try_from_usize(i)?;
            Some((key, self.resolve(key)?))
        })
    }

    fn get_with_hash(&self, s: &str, hash: u64) -> Option<K> {
        self.dedup
            .get(&hash)?
            .iter()
            .copied()
            .find(|key| self.resolve(*key) == Some(s))
    }

    fn hash(&self, s: &str) -> u64 {
        let mut hasher = self.hash_builder.build_hasher();
        hash::Hash::hash(s, &mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_dense_and_start_at_one() {
        let mut interner: Interner = Default::default();
        let a = interner.get_or_intern("a");
        let b = interner.get_or_intern("b");
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn empty_string() {
        let mut interner: Interner = Default::default();
        let empty = interner.get_or_intern("");
        let x = interner.get_or_intern("x");
        assert_eq!(interner.resolve(empty), Some(""));
        assert_eq!(interner.resolve(x), Some("x"));
        assert_eq!(interner.get_or_intern(""), empty);
    }

    #[derive(Default)]
    struct ConstantHasher;

    impl Hasher for ConstantHasher {
        fn finish(&self) -> u64 {
            7
        }
        fn write(&mut self, _: &[u8]) {}
    }

    impl BuildHasher for ConstantHasher {
        type Hasher = ConstantHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstantHasher
        }
    }

    #[test]
    fn hash_collisions() {
        let mut interner: Interner<num::NonZeroU32, ConstantHasher> = Default::default();
        let a = interner.get_or_intern("alpha");
        let b = interner.get_or_intern("beta");
        assert_ne!(a, b);
        assert_eq!(interner.get("alpha"), Some(a));
        assert_eq!(interner.get("beta"), Some(b));
        assert_eq!(interner.get("gamma"), None);
    }

    #[test]
    fn iter_in_order() {
        let mut interner: Interner = Default::default();
        interner.get_or_intern("one");
        interner.get_or_intern("two");
        let words: Vec<&str> = interner.iter().map(|(_, s)| s).collect();
        assert_eq!(words, vec!["one", "two"]);
    }
}
