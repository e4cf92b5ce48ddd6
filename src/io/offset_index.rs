#[allow(unused)]
use std::io::prelude::*;

use indexmap::map::{Iter, Keys};
use indexmap::IndexMap;

/**
An ordered mapping from scan native ID to the position of that scan in its source.

A wrapper around [`indexmap::IndexMap`]. Keys keep their insertion order, which is
the acquisition order for readers that build the index while scanning.
*/
#[derive(Default, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffsetIndex {
    /// The name of the index
    pub name: String,

    /// The mapping from ID to position, ordered by occurrence
    #[cfg_attr(feature = "serde", serde(with = "indexmap::map::serde_seq"))]
    pub positions: IndexMap<Box<str>, usize>,
}

impl OffsetIndex {
    pub fn new(name: String) -> OffsetIndex {
        OffsetIndex {
            name,
            ..Default::default()
        }
    }

    /// Get the position of the specified key
    #[inline]
    pub fn get(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// Get the key and position stored at the `index`th slot
    #[inline]
    pub fn get_index(&self, index: usize) -> Option<(&str, usize)> {
        self.positions
            .get_index(index)
            .map(|(key, position)| (key.as_ref(), *position))
    }

    #[inline]
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.positions.get_index_of(key)
    }

    /// Insert `key` into the index. If `key` was already present its old position is returned.
    #[inline]
    pub fn insert<T: Into<Box<str>>>(&mut self, key: T, position: usize) -> Option<usize> {
        self.positions.insert(key.into(), position)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn keys(&self) -> Keys<'_, Box<str>, usize> {
        self.positions.keys()
    }

    pub fn iter(&self) -> Iter<'_, Box<str>, usize> {
        self.positions.iter()
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    #[cfg(feature = "serde")]
    /// Write the index out in JSON format to `writer`
    pub fn to_writer<W: Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer(writer, self)
    }

    #[cfg(feature = "serde")]
    /// Read an index in JSON format from `reader`
    pub fn from_reader<R: Read>(reader: R) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }
}

impl<K: Into<Box<str>>> FromIterator<K> for OffsetIndex {
    /// Index a sequence of IDs by their order of appearance
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        let mut index = Self::default();
        for (i, key) in iter.into_iter().enumerate() {
            index.insert(key, i);
        }
        index
    }
}
