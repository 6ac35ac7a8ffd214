//! Geometry baking (multi-indexed FBX attribute streams -> flat
//! renderer-ready vertex/index buffers) and the accumulating output
//! document.

mod bake;
mod types;

pub use bake::{bake_document, bake_geometry, BakeError, BakeOptions};
pub use types::{truncate_at_nul, OrbDocument, OrbMaterialDesc, OrbMesh, OrbTextureDesc, SubMesh};
