//! Orb mesh vertex layout
//!
//! Interleaved renderer-ready vertices; the stride is written into each
//! mesh record so loaders never have to guess the layout.

use bytemuck::{Pod, Zeroable};

/// One baked mesh vertex (44 bytes, little-endian f32).
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct OrbVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub uv: [f32; 2],
}

/// Byte stride of [`OrbVertex`], as stored in the mesh record.
pub const ORB_VERTEX_STRIDE: u8 = core::mem::size_of::<OrbVertex>() as u8;

const _: () = assert!(ORB_VERTEX_STRIDE == 44);
