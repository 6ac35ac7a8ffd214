//! Orb light record
//!
//! Lights are stored as a raw fixed-size struct array with no per-field
//! framing; the section length is `num_lights * OrbLight::SIZE`.

use bytemuck::{Pod, Zeroable};

/// Light type discriminant stored in [`OrbLight::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum LightKind {
    Directional = 0,
    Point = 1,
    Spot = 2,
}

impl LightKind {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Directional),
            1 => Some(Self::Point),
            2 => Some(Self::Spot),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Directional => "directional",
            Self::Point => "point",
            Self::Spot => "spot",
        }
    }
}

/// One light, exactly as laid out on disk (52 bytes, little-endian f32).
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct OrbLight {
    pub kind: u32,
    pub color: [f32; 3],
    pub position: [f32; 3],
    pub direction: [f32; 3],
    pub spot_angle: f32,
    pub falloff_begin: f32,
    pub falloff_end: f32,
}

impl OrbLight {
    pub const SIZE: usize = core::mem::size_of::<Self>();
}

// repr(C) with only u32/f32 fields leaves no padding; the on-disk size
// is the struct size.
const _: () = assert!(OrbLight::SIZE == 52);
