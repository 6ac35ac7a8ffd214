//! Orb binary container format
//!
//! An Orb file is a single scene archive: lights, materials, embedded
//! texture payloads, and meshes with zlib-compressed vertex/index
//! buffers. The file opens with a 4-byte magic, an 8-byte version
//! record, and five `u16` section counts.
//!
//! All multi-byte fields are little-endian. Headers provide
//! `SIZE`/`to_bytes`/`from_bytes` for consistent serialization.

pub mod header;
pub mod light;
pub mod material;
pub mod vertex;

pub use header::*;
pub use light::*;
pub use material::*;
pub use vertex::*;
