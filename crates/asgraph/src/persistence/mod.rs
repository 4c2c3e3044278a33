//! Binary graph files.
//!
//! A file is a 3-byte tag (`csi`, or `zsi` when the node stream is
//! zlib-compressed), a section of typed header blocks, the node stream
//! produced by a safe-mode preorder over the whole arena, an end marker and
//! the string table. Every integer is little-endian.
//!
//! ```no_run
//! use asgraph::{Arena, ArenaConfig, Language, SaveOptions};
//!
//! # fn main() -> asgraph::Result<()> {
//! let arena = Arena::new(ArenaConfig::for_language(Language::Java));
//! arena.save("model.csi", SaveOptions::plain())?;
//!
//! let mut copy = Arena::new(ArenaConfig::for_language(Language::Java));
//! copy.load("model.csi")?;
//! # Ok(())
//! # }
//! ```

mod binary;
mod codec;
mod header;

pub use header::{
    HeaderData, PropertyData, RawHeader, HEADER_ANALYSIS_DATA, HEADER_INTERVAL_DATA,
    HEADER_LINKER_COMPILATION_DATA, HEADER_PROPERTY_DATA, KEY_API_VERSION, KEY_BINARY_VERSION,
    KEY_LANGUAGE, KEY_TYPE,
};

/// Model kind stored in the metadata block.
pub const MODEL_TYPE: &str = "LanguageIndependentModel";

/// Schema version stored in and required from the metadata block.
pub const API_VERSION: &str = "1.0.12";

/// Binary format version stored in and required from the metadata block.
pub const BINARY_VERSION: &str = "1.0.5";

pub(crate) const PLAIN_TAG: &[u8; 3] = b"csi";
pub(crate) const COMPRESSED_TAG: &[u8; 3] = b"zsi";
