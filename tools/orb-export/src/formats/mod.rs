//! Orb container writing
//!
//! Serializes the accumulated output document into the Orb byte
//! stream. Section layouts live in `orb-common`; this module owns the
//! framing and the zlib compression of vertex/index buffers.

pub use orb_common::formats::*;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::mesh::{OrbDocument, OrbMaterialDesc, OrbMesh, OrbTextureDesc};

/// Write a complete Orb container.
///
/// Texture payloads are read from the process working directory by
/// bare filename; a texture file that cannot be opened aborts the
/// whole write.
pub fn write_orb<W: Write>(w: &mut W, doc: &OrbDocument) -> Result<()> {
    write_orb_with_root(w, doc, Path::new("."))
}

/// Like [`write_orb`] with an explicit directory for texture lookup.
pub fn write_orb_with_root<W: Write>(
    w: &mut W,
    doc: &OrbDocument,
    texture_root: &Path,
) -> Result<()> {
    let num_lights = clamp_count(doc.lights.len(), "lights");
    let num_materials = clamp_count(doc.materials.len(), "materials");
    let num_textures = clamp_count(doc.textures.len(), "textures");
    let num_meshes = clamp_count(doc.meshes.len(), "meshes");

    let header = OrbHeader::new(num_lights, num_materials, num_textures, num_meshes);
    w.write_all(&header.to_bytes())?;

    // Lights are a raw fixed-layout array, no per-field framing.
    for light in doc.lights.iter().take(num_lights as usize) {
        w.write_all(bytemuck::bytes_of(light))?;
    }
    for material in doc.materials.iter().take(num_materials as usize) {
        write_material(w, material)?;
    }
    for texture in doc.textures.iter().take(num_textures as usize) {
        write_texture(w, texture, texture_root)?;
    }
    for mesh in doc.meshes.iter().take(num_meshes as usize) {
        write_mesh(w, mesh)?;
    }

    Ok(())
}

/// Section counts are u16 on disk; overlong sections are clamped with a
/// diagnostic instead of aborting.
fn clamp_count(count: usize, what: &str) -> u16 {
    if count > u16::MAX as usize {
        tracing::warn!("ignoring {} {what}", count - u16::MAX as usize);
        u16::MAX
    } else {
        count as u16
    }
}

/// `len:u8`-prefixed name; names longer than 255 bytes are cut.
fn write_name<W: Write>(w: &mut W, name: &str) -> io::Result<()> {
    let bytes = name.as_bytes();
    let len = bytes.len().min(u8::MAX as usize);
    w.write_all(&[len as u8])?;
    w.write_all(&bytes[..len])
}

fn write_material<W: Write>(w: &mut W, material: &OrbMaterialDesc) -> io::Result<()> {
    write_name(w, &material.name)?;
    for channel in material.diffuse {
        w.write_all(&channel.to_le_bytes())?;
    }
    w.write_all(&material.roughness.to_le_bytes())?;
    w.write_all(&material.flags.to_le_bytes())?;
    w.write_all(&[0u8; 8])?; // 2 × f32 padding
    for id in &material.texture_ids {
        write_name(w, id)?;
    }
    Ok(())
}

fn write_texture<W: Write>(w: &mut W, texture: &OrbTextureDesc, root: &Path) -> Result<()> {
    write_name(w, &texture.name)?;

    // Lookup is by filename only; any directory component stored in the
    // source document is ignored.
    let file = Path::new(&texture.source)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&texture.source));
    let path = root.join(file);
    let data = std::fs::read(&path)
        .with_context(|| format!("failed to read texture file {}", path.display()))?;

    w.write_all(&(data.len() as u32).to_le_bytes())?;
    w.write_all(&data)?;
    Ok(())
}

fn write_mesh<W: Write>(w: &mut W, mesh: &OrbMesh) -> Result<()> {
    write_name(w, &mesh.name)?;

    let vertex_bytes: &[u8] = bytemuck::cast_slice(&mesh.vertices);
    let compressed_vertices = deflate(vertex_bytes)?;
    w.write_all(&(mesh.vertices.len() as u32).to_le_bytes())?;
    w.write_all(&(compressed_vertices.len() as u32).to_le_bytes())?;
    w.write_all(&[ORB_VERTEX_STRIDE])?;
    w.write_all(&compressed_vertices)?;

    let mut index_bytes = Vec::with_capacity(mesh.indices.len() * 2);
    for index in &mesh.indices {
        index_bytes.extend_from_slice(&index.to_le_bytes());
    }
    let compressed_indices = deflate(&index_bytes)?;
    w.write_all(&(mesh.indices.len() as u32).to_le_bytes())?;
    w.write_all(&(compressed_indices.len() as u32).to_le_bytes())?;
    w.write_all(&compressed_indices)?;

    w.write_all(&(mesh.submeshes.len() as u32).to_le_bytes())?;
    for sub in &mesh.submeshes {
        w.write_all(&sub.start_vertex.to_le_bytes())?;
        w.write_all(&sub.vertex_count.to_le_bytes())?;
        w.write_all(&sub.start_index.to_le_bytes())?;
        w.write_all(&sub.index_count.to_le_bytes())?;
        write_name(w, &sub.material)?;
    }
    Ok(())
}

fn deflate(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
