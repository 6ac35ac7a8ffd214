//! FBX binary scene reader
//!
//! Decodes the vendor interchange tree (`tree`), its tagged property
//! values (`property`), and extracts typed scene entities plus the flat
//! connection list (`document`).

mod document;
mod property;
mod tree;

pub use document::{
    extract, AttributeLayer, Connection, ConnectionKind, Entity, FbxDocument, Geometry,
    LightAttribute, MappingMode, Material, MaterialTexture, Model, PropertyChannel,
    PropertyChannels, ReferenceMode, Texture, TextureChannel,
};
pub use property::{Property, PropertyError};
pub use tree::{decode_tree, Node, FBX_MAGIC};

/// Hard FBX decode failures. A bad magic is not among them: it is a
/// soft condition that yields an empty tree so callers can probe files.
#[derive(Debug, thiserror::Error)]
pub enum FbxError {
    #[error("i/o while decoding: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupted file: {0}")]
    CorruptedFile(String),

    #[error("unexpected end of object '{name}': stream at byte {pos}, record ends at {end}")]
    UnexpectedEndOfObject {
        name: String,
        pos: usize,
        end: usize,
    },

    #[error("unknown property type tag {0:#04x}")]
    UnknownPropertyType(u8),

    #[error("compressed array inflated to {actual} bytes, expected {expected}")]
    InflatedSizeMismatch { expected: usize, actual: usize },

    #[error("node '{node}' is missing property {index}")]
    MissingProperty { node: String, index: usize },

    #[error(transparent)]
    Property(#[from] PropertyError),
}
