//! Orb container decoding and the debug report
//!
//! Mirror-image reader for the writer in `formats`. It validates the
//! stream and collects a structured summary without reconstructing
//! renderer objects; the report printer exists purely for diagnosis.

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use flate2::read::ZlibDecoder;

use orb_common::{LightKind, OrbHeader, OrbLight, OrbVersion, ORB_MAGIC};

use crate::reader::SliceReader;

#[derive(Debug, thiserror::Error)]
pub enum OrbError {
    #[error("not an Orb container (magic mismatch)")]
    BadMagic,

    #[error("file format too old: version {major}.{revision}")]
    TooOld { major: u16, revision: u16 },

    #[error("i/o while decoding: {0}")]
    Io(#[from] std::io::Error),

    #[error("mesh '{mesh}': decompressed {what} buffer is {actual} bytes, expected {expected}")]
    BufferSizeMismatch {
        mesh: String,
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Structured view of a decoded Orb file.
#[derive(Debug)]
pub struct OrbArchive {
    pub version: OrbVersion,
    pub lights: Vec<OrbLight>,
    pub materials: Vec<ArchiveMaterial>,
    pub textures: Vec<ArchiveTexture>,
    pub meshes: Vec<ArchiveMesh>,
    pub num_animations: u16,
}

#[derive(Debug)]
pub struct ArchiveMaterial {
    pub name: String,
    pub diffuse: [f32; 4],
    pub roughness: f32,
    pub flags: u32,
    pub texture_ids: Vec<String>,
}

#[derive(Debug)]
pub struct ArchiveTexture {
    pub name: String,
    pub size: u32,
}

#[derive(Debug)]
pub struct ArchiveSubMesh {
    pub start_vertex: u32,
    pub vertex_count: u32,
    pub start_index: u32,
    pub index_count: u32,
    pub material: String,
}

#[derive(Debug)]
pub struct ArchiveMesh {
    pub name: String,
    pub vertex_count: u32,
    pub stride: u8,
    pub index_count: u32,
    pub submeshes: Vec<ArchiveSubMesh>,
}

/// Decode a full Orb byte stream.
pub fn read_orb(data: &[u8]) -> Result<OrbArchive, OrbError> {
    if data.len() < ORB_MAGIC.len() || data[..ORB_MAGIC.len()] != ORB_MAGIC {
        return Err(OrbError::BadMagic);
    }
    let header = OrbHeader::from_bytes(data).ok_or(OrbError::BadMagic)?;
    if !header.version.is_supported() {
        return Err(OrbError::TooOld {
            major: header.version.major,
            revision: header.version.revision,
        });
    }

    let mut r = SliceReader::new(&data[OrbHeader::SIZE..]);

    let mut lights = Vec::with_capacity(header.num_lights as usize);
    for _ in 0..header.num_lights {
        let bytes = r.take(OrbLight::SIZE)?;
        lights.push(bytemuck::pod_read_unaligned::<OrbLight>(bytes));
    }

    let mut materials = Vec::with_capacity(header.num_materials as usize);
    for _ in 0..header.num_materials {
        materials.push(read_material(&mut r)?);
    }

    let mut textures = Vec::with_capacity(header.num_textures as usize);
    for _ in 0..header.num_textures {
        let name = r.read_short_string()?;
        let size = r.read_u32()?;
        r.take(size as usize)?; // payload is not needed for analysis
        textures.push(ArchiveTexture { name, size });
    }

    let mut meshes = Vec::with_capacity(header.num_meshes as usize);
    for _ in 0..header.num_meshes {
        meshes.push(read_mesh(&mut r)?);
    }

    Ok(OrbArchive {
        version: header.version,
        lights,
        materials,
        textures,
        meshes,
        num_animations: header.num_animations,
    })
}

fn read_material(r: &mut SliceReader) -> Result<ArchiveMaterial, OrbError> {
    let name = r.read_short_string()?;
    let mut diffuse = [0f32; 4];
    for channel in &mut diffuse {
        *channel = r.read_f32()?;
    }
    let roughness = r.read_f32()?;
    let flags = r.read_u32()?;
    r.take(8)?; // 2 × f32 padding

    let mut texture_ids = Vec::new();
    for _ in 0..flags.count_ones() {
        texture_ids.push(r.read_short_string()?);
    }

    Ok(ArchiveMaterial {
        name,
        diffuse,
        roughness,
        flags,
        texture_ids,
    })
}

fn read_mesh(r: &mut SliceReader) -> Result<ArchiveMesh, OrbError> {
    let name = r.read_short_string()?;

    let vertex_count = r.read_u32()?;
    let compressed_len = r.read_u32()?;
    let stride = r.read_u8()?;
    let vertex_bytes = inflate(r.take(compressed_len as usize)?)?;
    let expected = vertex_count as usize * stride as usize;
    if vertex_bytes.len() != expected {
        return Err(OrbError::BufferSizeMismatch {
            mesh: name,
            what: "vertex",
            expected,
            actual: vertex_bytes.len(),
        });
    }

    let index_count = r.read_u32()?;
    let compressed_len = r.read_u32()?;
    let index_bytes = inflate(r.take(compressed_len as usize)?)?;
    let expected = index_count as usize * 2;
    if index_bytes.len() != expected {
        return Err(OrbError::BufferSizeMismatch {
            mesh: name,
            what: "index",
            expected,
            actual: index_bytes.len(),
        });
    }

    let submesh_count = r.read_u32()?;
    let mut submeshes = Vec::with_capacity(submesh_count as usize);
    for _ in 0..submesh_count {
        submeshes.push(ArchiveSubMesh {
            start_vertex: r.read_u32()?,
            vertex_count: r.read_u32()?,
            start_index: r.read_u32()?,
            index_count: r.read_u32()?,
            material: r.read_short_string()?,
        });
    }

    Ok(ArchiveMesh {
        name,
        vertex_count,
        stride,
        index_count,
        submeshes,
    })
}

fn inflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

/// Decode an Orb file and print its contents to stdout.
pub fn analyze(path: &Path) -> anyhow::Result<()> {
    let data = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let archive = read_orb(&data).with_context(|| format!("failed to decode {}", path.display()))?;
    print_report(&archive);
    Ok(())
}

pub fn print_report(archive: &OrbArchive) {
    let v = &archive.version;
    println!("Orb container, version {}.{} (build {})", v.major, v.revision, v.build);
    println!(
        "{} lights, {} materials, {} textures, {} meshes, {} animations",
        archive.lights.len(),
        archive.materials.len(),
        archive.textures.len(),
        archive.meshes.len(),
        archive.num_animations
    );

    for (i, light) in archive.lights.iter().enumerate() {
        let kind = LightKind::from_u32(light.kind).map_or("unknown", |k| k.name());
        println!("light {i}: {kind}");
        println!("  color     {:?}", light.color);
        println!("  position  {:?}", light.position);
        println!("  direction {:?}", light.direction);
        println!(
            "  spot angle {}, falloff {} .. {}",
            light.spot_angle, light.falloff_begin, light.falloff_end
        );
    }

    for material in &archive.materials {
        println!("material '{}'", material.name);
        println!("  diffuse   {:?}", material.diffuse);
        println!("  roughness {}", material.roughness);
        println!("  flags     {:#06b}", material.flags);
        for id in &material.texture_ids {
            println!("  texture   '{id}'");
        }
    }

    for texture in &archive.textures {
        println!("texture '{}': {} bytes", texture.name, texture.size);
    }

    for mesh in &archive.meshes {
        println!(
            "mesh '{}': {} vertices (stride {}), {} indices, {} submeshes",
            mesh.name,
            mesh.vertex_count,
            mesh.stride,
            mesh.index_count,
            mesh.submeshes.len()
        );
        for (i, sub) in mesh.submeshes.iter().enumerate() {
            println!(
                "  submesh {i}: vertices {}..+{}, indices {}..+{}, material '{}'",
                sub.start_vertex, sub.vertex_count, sub.start_index, sub.index_count, sub.material
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_magic() {
        assert!(matches!(read_orb(b"NOPE"), Err(OrbError::BadMagic)));
        assert!(matches!(read_orb(&[]), Err(OrbError::BadMagic)));
    }

    #[test]
    fn rejects_old_versions() {
        for (major, revision) in [(2u16, 9u16), (3, 0), (3, 2)] {
            let mut bytes = OrbHeader::new(0, 0, 0, 0).to_bytes().to_vec();
            bytes[4..6].copy_from_slice(&major.to_le_bytes());
            bytes[6..8].copy_from_slice(&revision.to_le_bytes());
            match read_orb(&bytes) {
                Err(OrbError::TooOld {
                    major: m,
                    revision: r,
                }) => {
                    assert_eq!((m, r), (major, revision));
                }
                other => panic!("expected TooOld, got {other:?}"),
            }
        }
    }

    #[test]
    fn accepts_current_version() {
        let bytes = OrbHeader::new(0, 0, 0, 0).to_bytes();
        let archive = read_orb(&bytes).unwrap();
        assert!(archive.lights.is_empty());
        assert!(archive.meshes.is_empty());
    }
}
