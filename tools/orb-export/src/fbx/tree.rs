//! FBX binary tree decoder
//!
//! The file is a recursive list of node records. Each record carries
//! its own absolute end offset instead of a child count: after the
//! property list, child records follow only while the stream position
//! is short of that offset, terminated by a 13-byte all-zero sentinel.

use super::{FbxError, Property};
use crate::reader::SliceReader;

/// 23-byte magic at the start of every FBX binary file, including the
/// two trailing spaces.
pub const FBX_MAGIC: &[u8; 23] = b"Kaydara FBX Binary  \x00\x1a\x00";

/// Sentinel closing a child list: a node record with every field zero.
const NULL_RECORD_LEN: usize = 13;

/// One tagged record in the interchange tree.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: String,
    pub properties: Vec<Property>,
    pub children: Vec<Node>,
}

impl Node {
    /// Return the nth direct child with the given name.
    pub fn find_child(&self, name: &str, nth: usize) -> Option<&Node> {
        self.children.iter().filter(|c| c.name == name).nth(nth)
    }

    /// Fetch a property by position, with the node name in the error.
    pub fn property(&self, index: usize) -> Result<&Property, FbxError> {
        self.properties
            .get(index)
            .ok_or_else(|| FbxError::MissingProperty {
                node: self.name.clone(),
                index,
            })
    }
}

/// Decode an FBX binary stream into its top-level node list.
///
/// A magic mismatch is a soft failure: callers probe file types, so it
/// logs and returns an empty tree instead of an error.
pub fn decode_tree(data: &[u8]) -> Result<Vec<Node>, FbxError> {
    if data.len() < FBX_MAGIC.len() + 4 || &data[..FBX_MAGIC.len()] != FBX_MAGIC {
        tracing::warn!("not an FBX binary file (magic mismatch), returning empty tree");
        return Ok(Vec::new());
    }

    let mut r = SliceReader::new(&data[FBX_MAGIC.len()..]);
    let version = r.read_u32()?;
    tracing::debug!(version, "decoding FBX binary");

    let mut roots = Vec::new();
    loop {
        let end_offset = r.read_u32()?;
        if end_offset == 0 {
            break;
        }
        roots.push(read_node(&mut r, body_offset(end_offset)?)?);
    }
    Ok(roots)
}

/// Translate a record's absolute end offset into the reader's frame,
/// which starts right after the magic. An offset inside the magic
/// cannot belong to any record.
fn body_offset(end_offset: u32) -> Result<usize, FbxError> {
    (end_offset as usize)
        .checked_sub(FBX_MAGIC.len())
        .ok_or_else(|| {
            FbxError::CorruptedFile(format!("node end offset {end_offset} inside the file header"))
        })
}

/// Read one node record whose end offset has already been consumed.
fn read_node(r: &mut SliceReader, end_offset: usize) -> Result<Node, FbxError> {
    let num_properties = r.read_u32()?;
    let _property_list_len = r.read_u32()?;
    let name_len = r.read_u8()? as usize;
    let name = String::from_utf8_lossy(r.take(name_len)?).into_owned();

    let mut properties = Vec::with_capacity(num_properties as usize);
    for _ in 0..num_properties {
        properties.push(Property::decode(r)?);
    }

    let mut children = Vec::new();
    if r.pos() < end_offset {
        loop {
            let child_end = r.read_u32()?;
            if child_end == 0 {
                // Remainder of the null record must be all zero.
                let rest = r.take(NULL_RECORD_LEN - 4)?;
                if rest.iter().any(|&b| b != 0) {
                    return Err(FbxError::CorruptedFile(format!(
                        "child sentinel mismatch in node '{name}'"
                    )));
                }
                break;
            }
            children.push(read_node(r, body_offset(child_end)?)?);
        }
    }

    if r.pos() != end_offset {
        return Err(FbxError::UnexpectedEndOfObject {
            name,
            pos: r.pos(),
            end: end_offset,
        });
    }

    Ok(Node {
        name,
        properties,
        children,
    })
}
