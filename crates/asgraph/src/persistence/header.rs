//! Typed, length-prefixed header blocks at the start of a graph file.

use crate::error::{AsgError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// Header type of the mandatory metadata block.
pub const HEADER_PROPERTY_DATA: u16 = 0;
/// Header type of source interval data.
pub const HEADER_INTERVAL_DATA: u16 = 1;
/// Header type of analysis statistics.
pub const HEADER_ANALYSIS_DATA: u16 = 2;
/// Header type of linker/compilation unit data.
pub const HEADER_LINKER_COMPILATION_DATA: u16 = 3;

/// Metadata key: model kind.
pub const KEY_TYPE: &str = "Type";
/// Metadata key: schema API version.
pub const KEY_API_VERSION: &str = "APIVersion";
/// Metadata key: binary format version.
pub const KEY_BINARY_VERSION: &str = "BinaryVersion";
/// Metadata key: integer language code.
pub const KEY_LANGUAGE: &str = "Language";

/// A header block a caller can write and read back.
pub trait HeaderData {
    /// Type code identifying the block.
    fn header_type(&self) -> u16;

    /// Write the block payload (without type and length).
    fn save(&self, out: &mut dyn Write) -> Result<()>;

    /// Read the block payload.
    fn load(&mut self, input: &mut dyn Read) -> Result<()>;

    /// Downcast used to merge caller metadata into the mandatory block.
    fn as_property_data(&self) -> Option<&PropertyData> {
        None
    }
}

/// Header block of an unknown type, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHeader {
    /// Type code
    pub header_type: u16,
    /// Payload bytes
    pub payload: Vec<u8>,
}

/// String key/value metadata block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyData {
    entries: BTreeMap<String, String>,
}

impl PropertyData {
    /// Empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Property value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no property is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl HeaderData for PropertyData {
    fn header_type(&self) -> u16 {
        HEADER_PROPERTY_DATA
    }

    fn save(&self, out: &mut dyn Write) -> Result<()> {
        out.write_u32::<LittleEndian>(self.entries.len() as u32)?;
        for (key, value) in &self.entries {
            write_short_string(out, key)?;
            write_short_string(out, value)?;
        }
        Ok(())
    }

    fn load(&mut self, input: &mut dyn Read) -> Result<()> {
        let count = input.read_u32::<LittleEndian>()?;
        self.entries.clear();
        for _ in 0..count {
            let key = read_short_string(input)?;
            let value = read_short_string(input)?;
            self.entries.insert(key, value);
        }
        Ok(())
    }

    fn as_property_data(&self) -> Option<&PropertyData> {
        Some(self)
    }
}

/// `u16` length followed by UTF-8 bytes.
pub(crate) fn write_short_string(out: &mut dyn Write, text: &str) -> Result<()> {
    let len = u16::try_from(text.len())
        .map_err(|_| AsgError::corrupt(format!("header string of {} bytes", text.len())))?;
    out.write_u16::<LittleEndian>(len)?;
    out.write_all(text.as_bytes())?;
    Ok(())
}

pub(crate) fn read_short_string(input: &mut dyn Read) -> Result<String> {
    let len = input.read_u16::<LittleEndian>()? as usize;
    let mut bytes = vec![0u8; len];
    input.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| AsgError::corrupt("header string is not valid UTF-8"))
}

/// Write one block: type, total length (including the 8 length bytes), payload.
pub(crate) fn write_block(out: &mut dyn Write, header_type: u16, payload: &[u8]) -> Result<()> {
    out.write_u16::<LittleEndian>(header_type)?;
    out.write_u64::<LittleEndian>(payload.len() as u64 + 8)?;
    out.write_all(payload)?;
    Ok(())
}

/// Read one block and return its type and payload.
pub(crate) fn read_block(input: &mut dyn Read) -> Result<RawHeader> {
    let header_type = input.read_u16::<LittleEndian>()?;
    let length = input.read_u64::<LittleEndian>()?;
    let size = length
        .checked_sub(8)
        .ok_or_else(|| AsgError::corrupt(format!("header block length {length}")))?;
    let mut payload = Vec::new();
    input.take(size).read_to_end(&mut payload)?;
    if payload.len() as u64 != size {
        return Err(AsgError::corrupt("truncated header block"));
    }
    Ok(RawHeader {
        header_type,
        payload,
    })
}
