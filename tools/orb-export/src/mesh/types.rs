//! Output-side flat records accumulated across input files.

use orb_common::{OrbLight, OrbVertex};

/// A contiguous vertex/index range within a mesh sharing one material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubMesh {
    pub start_vertex: u32,
    pub vertex_count: u32,
    pub start_index: u32,
    pub index_count: u32,
    pub material: String,
}

#[derive(Debug, Clone)]
pub struct OrbMesh {
    pub name: String,
    pub vertices: Vec<OrbVertex>,
    pub indices: Vec<u16>,
    pub submeshes: Vec<SubMesh>,
}

#[derive(Debug, Clone)]
pub struct OrbMaterialDesc {
    pub name: String,
    pub diffuse: [f32; 4],
    pub roughness: f32,
    pub flags: u32,
    /// Texture ids in flag-bit order (color, normal, roughness,
    /// occlusion), one per set bit.
    pub texture_ids: Vec<String>,
}

/// A texture scheduled for embedding; the payload is read at encode
/// time by bare filename.
#[derive(Debug, Clone)]
pub struct OrbTextureDesc {
    pub name: String,
    pub source: String,
}

/// The accumulating output document. Multiple input files append into
/// one document; sections deduplicate by name, first writer wins.
#[derive(Debug, Default)]
pub struct OrbDocument {
    pub lights: Vec<OrbLight>,
    pub materials: Vec<OrbMaterialDesc>,
    pub textures: Vec<OrbTextureDesc>,
    pub meshes: Vec<OrbMesh>,
}

impl OrbDocument {
    pub fn add_mesh(&mut self, mesh: OrbMesh) {
        if self.meshes.iter().any(|m| m.name == mesh.name) {
            tracing::debug!(name = %mesh.name, "dropping mesh with duplicate name");
            return;
        }
        self.meshes.push(mesh);
    }

    pub fn add_material(&mut self, material: OrbMaterialDesc) {
        if self.materials.iter().any(|m| m.name == material.name) {
            tracing::debug!(name = %material.name, "dropping material with duplicate name");
            return;
        }
        self.materials.push(material);
    }

    pub fn add_texture(&mut self, texture: OrbTextureDesc) {
        if self.textures.iter().any(|t| t.name == texture.name) {
            tracing::debug!(name = %texture.name, "dropping texture with duplicate name");
            return;
        }
        self.textures.push(texture);
    }
}

/// Interchange strings may be NUL-padded; names are cut at the first
/// embedded NUL byte.
pub fn truncate_at_nul(s: &str) -> &str {
    &s[..s.find('\0').unwrap_or(s.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh(name: &str) -> OrbMesh {
        OrbMesh {
            name: name.to_owned(),
            vertices: Vec::new(),
            indices: Vec::new(),
            submeshes: Vec::new(),
        }
    }

    #[test]
    fn name_dedup_keeps_first() {
        let mut doc = OrbDocument::default();
        let mut first = mesh("Cube");
        first.indices.push(7);
        doc.add_mesh(first);
        doc.add_mesh(mesh("Cube"));
        doc.add_mesh(mesh("Other"));
        assert_eq!(doc.meshes.len(), 2);
        assert_eq!(doc.meshes[0].indices, vec![7]);

        doc.add_texture(OrbTextureDesc {
            name: "a.png".into(),
            source: "tex/a.png".into(),
        });
        doc.add_texture(OrbTextureDesc {
            name: "a.png".into(),
            source: "other/a.png".into(),
        });
        assert_eq!(doc.textures.len(), 1);
        assert_eq!(doc.textures[0].source, "tex/a.png");
    }

    #[test]
    fn nul_truncation() {
        assert_eq!(truncate_at_nul("Cube\0\u{1}Model"), "Cube");
        assert_eq!(truncate_at_nul("plain"), "plain");
        assert_eq!(truncate_at_nul(""), "");
    }
}
