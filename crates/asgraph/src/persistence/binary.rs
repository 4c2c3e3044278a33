//! Graph file save/load on [`Arena`].

use super::codec::{self, NodeWriter};
use super::header::{
    read_block, write_block, HeaderData, PropertyData, RawHeader, HEADER_PROPERTY_DATA,
    KEY_API_VERSION, KEY_BINARY_VERSION, KEY_LANGUAGE, KEY_TYPE,
};
use super::{API_VERSION, BINARY_VERSION, COMPRESSED_TAG, MODEL_TYPE, PLAIN_TAG};
use crate::algorithms::AlgorithmPreorder;
use crate::config::SaveOptions;
use crate::error::{AsgError, Result};
use crate::graph::{Arena, NodeId};
use crate::schema::{Language, NodeKind};
use crate::strtable::StringTable;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::{debug, info};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

type Le = LittleEndian;

impl Arena {
    /// Save the graph with only the mandatory metadata block.
    ///
    /// # Errors
    ///
    /// See [`Arena::save_with_headers`].
    pub fn save<P: AsRef<Path>>(&self, path: P, options: SaveOptions) -> Result<()> {
        self.save_with_headers(path, &[], options)
    }

    /// Save the graph to a file, followed by the caller's header blocks.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::Io`] if the file cannot be written and
    /// [`AsgError::HeaderCollision`] if two blocks share a type.
    pub fn save_with_headers<P: AsRef<Path>>(
        &self,
        path: P,
        headers: &[&dyn HeaderData],
        options: SaveOptions,
    ) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| AsgError::io(format!("creating {}", path.display()), e))?;
        let mut out = BufWriter::new(file);
        let written = self.save_to(&mut out, headers, options)?;
        out.flush()
            .map_err(|e| AsgError::io(format!("writing {}", path.display()), e))?;
        info!(
            "Saved {written} nodes to {} ({})",
            path.display(),
            if options.compress { "compressed" } else { "plain" }
        );
        Ok(())
    }

    /// Write the graph to any byte sink. Returns the number of nodes written.
    ///
    /// The filter is ignored: every node is written.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::HeaderCollision`] if two blocks share a type and
    /// [`AsgError::Io`] on write failures.
    pub fn save_to<W: Write>(
        &self,
        out: &mut W,
        headers: &[&dyn HeaderData],
        options: SaveOptions,
    ) -> Result<usize> {
        let blocks = self.header_blocks(headers)?;
        let (body, written) = self.encode_nodes()?;

        out.write_all(if options.compress { COMPRESSED_TAG } else { PLAIN_TAG })?;
        out.write_u32::<Le>(blocks.len() as u32)?;
        for (header_type, payload) in &blocks {
            write_block(out, *header_type, payload)?;
        }

        if options.compress {
            let mut encoder = ZlibEncoder::new(out, Compression::default());
            encoder.write_all(&body)?;
            encoder.finish()?;
        } else {
            out.write_all(&body)?;
        }
        Ok(written)
    }

    /// Metadata first, then the caller's blocks, then the blocks kept from the last load.
    fn header_blocks(&self, headers: &[&dyn HeaderData]) -> Result<Vec<(u16, Vec<u8>)>> {
        let mut seen = HashSet::from([HEADER_PROPERTY_DATA]);
        seen.extend(self.unknown_headers.iter().map(|raw| raw.header_type));

        let mut properties = PropertyData::new();
        let mut blocks = vec![(HEADER_PROPERTY_DATA, Vec::new())];
        for header in headers {
            if let Some(extra) = header.as_property_data() {
                for (key, value) in extra.iter() {
                    properties.set(key, value);
                }
                continue;
            }
            let header_type = header.header_type();
            if !seen.insert(header_type) {
                return Err(AsgError::HeaderCollision { header_type });
            }
            let mut payload = Vec::new();
            header.save(&mut payload)?;
            blocks.push((header_type, payload));
        }
        for raw in &self.unknown_headers {
            blocks.push((raw.header_type, raw.payload.clone()));
        }

        properties.set(KEY_TYPE, MODEL_TYPE);
        properties.set(KEY_API_VERSION, API_VERSION);
        properties.set(KEY_BINARY_VERSION, BINARY_VERSION);
        properties.set(KEY_LANGUAGE, self.language().code().to_string());
        properties.save(&mut blocks[0].1)?;
        Ok(blocks)
    }

    /// Node stream plus end marker and string table.
    fn encode_nodes(&self) -> Result<(Vec<u8>, usize)> {
        let mut writer = NodeWriter::default();
        let mut preorder = AlgorithmPreorder::new();
        preorder.set_safe_mode(true).set_visit_filtered_edges(true);
        preorder.run(self, &mut [&mut writer])?;
        if let Some(e) = writer.error.take() {
            return Err(e);
        }

        let mut body = writer.out;
        body.write_u32::<Le>(0)?;
        body.write_u16::<Le>(0)?;
        self.string_table().save(&mut body)?;
        debug!("Encoded {} nodes into {} bytes", writer.written, body.len());
        Ok((body, writer.written))
    }

    /// Replace the content of this arena with a saved graph.
    ///
    /// # Errors
    ///
    /// See [`Arena::load_with_headers`].
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.load_with_headers(path, &mut [])
    }

    /// Replace the content of this arena with a saved graph, handing each
    /// header block to the handler of the same type. Blocks without a handler
    /// are kept and written back by the next save.
    ///
    /// The arena is left untouched if anything fails. Destroy observers stay
    /// registered and an enabled reverse-edge index is rebuilt for the new
    /// content.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::BadTag`] for an unknown tag,
    /// [`AsgError::MissingMetadata`] / [`AsgError::MetadataMismatch`] if the
    /// metadata does not describe a graph of this arena's language and format,
    /// [`AsgError::UnknownNodeKind`] and [`AsgError::Corrupt`] for a malformed
    /// node stream, [`AsgError::Io`] on read failures.
    pub fn load_with_headers<P: AsRef<Path>>(
        &mut self,
        path: P,
        headers: &mut [&mut dyn HeaderData],
    ) -> Result<()> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| AsgError::io(format!("opening {}", path.display()), e))?;
        let mut input = BufReader::new(file);
        self.load_from(&mut input, headers)?;
        info!(
            "Loaded {} nodes from {} ({} free ids)",
            self.node_count(),
            path.display(),
            self.free_ids().count()
        );
        Ok(())
    }

    /// Replace the content of this arena with a graph read from any byte source.
    ///
    /// # Errors
    ///
    /// Same as [`Arena::load_with_headers`].
    pub fn load_from<R: Read>(
        &mut self,
        input: &mut R,
        headers: &mut [&mut dyn HeaderData],
    ) -> Result<()> {
        let compressed = read_tag(input)?;
        let unknown = read_headers(input, self.language(), headers)?;

        let mut loaded = Arena::empty(self.config().clone());
        loaded.unknown_headers = unknown;
        if compressed {
            let mut decoder = ZlibDecoder::new(input);
            loaded.decode_nodes(&mut decoder)?;
        } else {
            loaded.decode_nodes(input)?;
        }

        if let Ok(reverse) = self.reverse_edges() {
            loaded.enable_reverse_edges(reverse.selector())?;
        }
        self.replace_content(loaded);
        Ok(())
    }

    /// Read only the header section of a graph file.
    ///
    /// The metadata is checked against this arena's language; the node stream
    /// is not read and the arena is not modified.
    ///
    /// # Errors
    ///
    /// Same header-related errors as [`Arena::load_with_headers`].
    pub fn load_header<P: AsRef<Path>>(
        &self,
        path: P,
        headers: &mut [&mut dyn HeaderData],
    ) -> Result<()> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| AsgError::io(format!("opening {}", path.display()), e))?;
        let mut input = BufReader::new(file);
        read_tag(&mut input)?;
        let unknown = read_headers(&mut input, self.language(), headers)?;
        debug!(
            "Read header of {}: {} unhandled blocks",
            path.display(),
            unknown.len()
        );
        Ok(())
    }

    /// Header blocks of the last load that no handler claimed.
    pub fn unknown_headers(&self) -> &[RawHeader] {
        &self.unknown_headers
    }

    fn decode_nodes<R: Read>(&mut self, input: &mut R) -> Result<()> {
        let mut count = 0usize;
        loop {
            let id: NodeId = input.read_u32::<Le>()?;
            let code = input.read_u16::<Le>()?;
            if id == 0 && code == 0 {
                break;
            }
            let kind = NodeKind::from_code(code).ok_or(AsgError::UnknownNodeKind { code })?;
            self.check_explicit_id(id)?;

            let record = codec::read_node(input, kind)?;
            self.install(id, record.data);
            let node = self.node_mut(id)?;
            for (edge_kind, edge) in record.edges {
                if let Some(list) = node.edges_mut(edge_kind) {
                    list.push(edge);
                }
            }
            count += 1;
        }

        let strings = StringTable::load(input)?;
        self.set_string_table(strings);
        self.check_edge_targets()?;
        self.recompute_parents();
        self.recompute_free_ids();
        self.rebuild_interning();
        debug!("Decoded {count} nodes");
        Ok(())
    }

    fn check_edge_targets(&self) -> Result<()> {
        for node in self.iter_all() {
            for (kind, edge) in node.all_edges() {
                if !self.get_exist(edge.target) {
                    return Err(AsgError::corrupt(format!(
                        "edge {kind} of node {} points to missing node {}",
                        node.id(),
                        edge.target
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Returns true for the compressed variant.
fn read_tag<R: Read>(input: &mut R) -> Result<bool> {
    let mut tag = [0u8; 3];
    input
        .read_exact(&mut tag)
        .map_err(|e| AsgError::io("reading file tag", e))?;
    match &tag {
        t if t == PLAIN_TAG => Ok(false),
        t if t == COMPRESSED_TAG => Ok(true),
        _ => Err(AsgError::BadTag { found: tag.to_vec() }),
    }
}

fn read_headers<R: Read>(
    input: &mut R,
    language: Language,
    handlers: &mut [&mut dyn HeaderData],
) -> Result<Vec<RawHeader>> {
    let count = input.read_u32::<Le>()?;
    let mut properties = None;
    let mut unknown = Vec::new();

    for _ in 0..count {
        let block = read_block(input)?;
        if block.header_type == HEADER_PROPERTY_DATA {
            let mut data = PropertyData::new();
            data.load(&mut block.payload.as_slice())?;
            properties = Some(data);
        }
        match handlers
            .iter_mut()
            .find(|h| h.header_type() == block.header_type)
        {
            Some(handler) => handler.load(&mut block.payload.as_slice())?,
            None if block.header_type == HEADER_PROPERTY_DATA => {}
            None => unknown.push(block),
        }
    }

    let properties = properties.ok_or(AsgError::MissingMetadata { key: KEY_TYPE })?;
    check_property(&properties, KEY_TYPE, MODEL_TYPE)?;
    check_property(&properties, KEY_API_VERSION, API_VERSION)?;
    check_property(&properties, KEY_BINARY_VERSION, BINARY_VERSION)?;
    check_property(&properties, KEY_LANGUAGE, &language.code().to_string())?;
    Ok(unknown)
}

fn check_property(properties: &PropertyData, key: &'static str, expected: &str) -> Result<()> {
    let found = properties
        .get(key)
        .ok_or(AsgError::MissingMetadata { key })?;
    if found != expected {
        return Err(AsgError::MetadataMismatch {
            key,
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}
