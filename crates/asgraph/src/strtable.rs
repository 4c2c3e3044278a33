//! String interning table.
//!
//! Nodes never hold strings directly; they hold [`Key`]s into the arena's
//! table. Key 0 always denotes the empty string.

use crate::error::{AsgError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::trace;
use std::collections::HashMap;
use std::io::{Read, Write};

/// Key of an interned string.
pub type Key = u32;

/// Tag opening a serialized table.
const TABLE_TAG: &[u8; 6] = b"STRTBL";

/// Bidirectional string <-> key map.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    strings: Vec<String>,
    keys: HashMap<String, Key>,
}

impl StringTable {
    /// Create an empty table.
    pub fn new() -> Self {
        let mut table = Self::default();
        table.strings.push(String::new());
        table
    }

    /// Intern a string and return its key. The empty string is key 0.
    pub fn set(&mut self, text: &str) -> Key {
        if text.is_empty() {
            return 0;
        }
        if let Some(&key) = self.keys.get(text) {
            return key;
        }
        if self.strings.is_empty() {
            self.strings.push(String::new());
        }
        let key = self.strings.len() as Key;
        self.strings.push(text.to_string());
        self.keys.insert(text.to_string(), key);
        trace!("Interned string: key={key}, text={text:?}");
        key
    }

    /// Resolve a key. Unknown keys resolve to the empty string.
    pub fn get(&self, key: Key) -> &str {
        self.strings
            .get(key as usize)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Look a string up without interning it.
    pub fn find(&self, text: &str) -> Option<Key> {
        if text.is_empty() {
            return Some(0);
        }
        self.keys.get(text).copied()
    }

    /// Number of non-empty strings.
    pub fn len(&self) -> usize {
        self.strings.len().saturating_sub(1)
    }

    /// True if only the empty string is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over `(key, string)` pairs, empty string excluded.
    pub fn iter(&self) -> impl Iterator<Item = (Key, &str)> {
        self.strings
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, s)| !s.is_empty())
            .map(|(key, s)| (key as Key, s.as_str()))
    }

    /// Key mapping that re-interns every string of `self` into `target`.
    ///
    /// Index `k` of the result is the key in `target` of the string that had key
    /// `k` here. Used when all references must move to a fresh table.
    pub fn remap_into(&self, target: &mut StringTable) -> Vec<Key> {
        self.strings.iter().map(|s| target.set(s)).collect()
    }

    /// Serialize the table. Keys are written so that they survive a reload.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::Io`] if writing fails.
    pub fn save<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(TABLE_TAG)?;
        out.write_u32::<LittleEndian>(self.len() as u32)?;
        for (key, text) in self.iter() {
            out.write_u32::<LittleEndian>(key)?;
            out.write_u32::<LittleEndian>(text.len() as u32)?;
            out.write_all(text.as_bytes())?;
        }
        Ok(())
    }

    /// Deserialize a table written by [`StringTable::save`], keeping the keys.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::Corrupt`] on a bad tag, a key out of sequence, a
    /// truncated string or invalid UTF-8, and [`AsgError::Io`] on short reads.
    pub fn load<R: Read>(input: &mut R) -> Result<Self> {
        let mut tag = [0u8; 6];
        input
            .read_exact(&mut tag)
            .map_err(|e| AsgError::io("reading string table tag", e))?;
        if &tag != TABLE_TAG {
            return Err(AsgError::corrupt("string table tag missing"));
        }

        let count = input.read_u32::<LittleEndian>()?;
        let mut table = Self::new();
        // keys are dense, so entry i never has a key above i + 1
        for read in 0..count {
            let key = input.read_u32::<LittleEndian>()?;
            if key == 0 || key > read + 1 {
                return Err(AsgError::corrupt(format!(
                    "string key {key} in entry {read} of {count}"
                )));
            }
            let len = input.read_u32::<LittleEndian>()?;
            let mut bytes = Vec::new();
            input.take(u64::from(len)).read_to_end(&mut bytes)?;
            if bytes.len() != len as usize {
                return Err(AsgError::corrupt(format!("string {key} is truncated")));
            }
            let text = String::from_utf8(bytes)
                .map_err(|_| AsgError::corrupt(format!("string {key} is not valid UTF-8")))?;
            table.insert_with_key(key, text);
        }
        Ok(table)
    }

    fn insert_with_key(&mut self, key: Key, text: String) {
        let slot = key as usize;
        if self.strings.len() <= slot {
            self.strings.resize(slot + 1, String::new());
        }
        self.keys.insert(text.clone(), key);
        self.strings[slot] = text;
    }
}
