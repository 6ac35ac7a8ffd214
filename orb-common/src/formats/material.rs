//! Orb material record constants
//!
//! A material is framed as: length-prefixed name, diffuse RGBA (4×f32),
//! roughness (f32), flags (u32), two f32 of padding, then one
//! length-prefixed texture id per set flag bit, in
//! color → normal → roughness → occlusion order.

/// Material has a base-color texture.
pub const MATERIAL_TEXTURE_COLOR: u32 = 1 << 0;
/// Material has a normal map.
pub const MATERIAL_TEXTURE_NORMAL: u32 = 1 << 1;
/// Material has a roughness map.
pub const MATERIAL_TEXTURE_ROUGHNESS: u32 = 1 << 2;
/// Material has an ambient-occlusion map.
pub const MATERIAL_TEXTURE_OCCLUSION: u32 = 1 << 3;

/// Texture flag bits in the order their ids are written after the
/// fixed-size material fields.
pub const MATERIAL_TEXTURE_ORDER: [u32; 4] = [
    MATERIAL_TEXTURE_COLOR,
    MATERIAL_TEXTURE_NORMAL,
    MATERIAL_TEXTURE_ROUGHNESS,
    MATERIAL_TEXTURE_OCCLUSION,
];
