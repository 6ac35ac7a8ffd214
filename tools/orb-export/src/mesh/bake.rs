//! Geometry baking
//!
//! Turns one geometry's independently-indexed attribute streams into a
//! flat vertex/index run, then aggregates the runs of a model's
//! geometries into one mesh with submesh ranges.

use std::borrow::Cow;
use std::path::Path;

use glam::{Vec2, Vec3};
use hashbrown::HashMap;

use orb_common::{OrbLight, OrbVertex, MATERIAL_TEXTURE_ORDER};

use super::types::{truncate_at_nul, OrbDocument, OrbMaterialDesc, OrbMesh, OrbTextureDesc, SubMesh};
use crate::fbx::{AttributeLayer, FbxDocument, Geometry, MappingMode, ReferenceMode, Texture, TextureChannel};
use crate::scene::SceneGraph;

/// Source documents are authored in centimeters; meshes are emitted in
/// meters.
const CM_TO_M: f32 = 0.01;

/// A fragment's indices must fit u16.
const MAX_FRAGMENT_VERTICES: usize = u16::MAX as usize + 1;

#[derive(Debug, Clone, Copy, Default)]
pub struct BakeOptions {
    /// Merge identical vertices back into indexed form after baking.
    /// Off by default.
    pub deduplicate: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum BakeError {
    #[error("geometry {id}: polygon with 4 or more vertices (quads/n-gons are not supported)")]
    NonTriangle { id: i64 },

    #[error("geometry {id}: polygon index {index} is out of range ({count} control points)")]
    IndexOutOfRange { id: i64, index: u32, count: usize },

    #[error("geometry {id}: {count} vertices exceed the 16-bit index range")]
    TooManyVertices { id: i64, count: usize },
}

/// Bake one geometry into a flat vertex/index run.
pub fn bake_geometry(
    geometry: &Geometry,
    options: &BakeOptions,
) -> Result<(Vec<OrbVertex>, Vec<u16>), BakeError> {
    let mut vertices: Vec<OrbVertex> = geometry
        .positions
        .chunks_exact(3)
        .map(|c| OrbVertex {
            position: [
                c[0] as f32 * CM_TO_M,
                c[1] as f32 * CM_TO_M,
                c[2] as f32 * CM_TO_M,
            ],
            ..Default::default()
        })
        .collect();

    let indices = decode_polygon_indices(geometry, vertices.len())?;

    apply_vector_layer(&mut vertices, &indices, &geometry.normals, VectorSlot::Normal);
    apply_vector_layer(&mut vertices, &indices, &geometry.tangents, VectorSlot::Tangent);

    let (vertices, indices) = if geometry.uvs.is_empty() {
        (vertices, indices)
    } else {
        // Texture coordinates land on the indexed vertices first, with
        // seam splitting where a shared vertex receives conflicting
        // uvs; then unweld to one vertex per slot and drop the
        // now-implicit index buffer.
        let mut vertices = vertices;
        let mut indices = indices;
        apply_uv_layer(&mut vertices, &mut indices, &geometry.uvs);
        let unwelded: Vec<OrbVertex> = indices.iter().map(|&i| vertices[i as usize]).collect();
        let sequential: Vec<u32> = (0..unwelded.len() as u32).collect();
        (unwelded, sequential)
    };

    if vertices.len() > MAX_FRAGMENT_VERTICES {
        return Err(BakeError::TooManyVertices {
            id: geometry.id,
            count: vertices.len(),
        });
    }
    let mut vertices = vertices;
    let mut indices: Vec<u16> = indices.iter().map(|&i| i as u16).collect();

    if options.deduplicate {
        deduplicate_vertices(&mut vertices, &mut indices);
    }

    Ok((vertices, indices))
}

/// Decode the sign-encoded polygon index list into triangle indices.
///
/// A negative entry marks the last vertex of its polygon and decodes as
/// `-value - 1`. Geometries without an index list get a sequential
/// triangle list over their control points.
fn decode_polygon_indices(geometry: &Geometry, vertex_count: usize) -> Result<Vec<u32>, BakeError> {
    let synthesized: Vec<i32>;
    let encoded: Cow<[i32]> = if geometry.polygon_indices.is_empty() {
        synthesized = (0..vertex_count as i32)
            .map(|i| if i % 3 == 2 { -i - 1 } else { i })
            .collect();
        Cow::Owned(synthesized)
    } else {
        Cow::Borrowed(&geometry.polygon_indices)
    };

    let mut indices = Vec::with_capacity(encoded.len());
    let mut run = 0usize;
    for &value in encoded.iter() {
        run += 1;
        if run > 3 {
            return Err(BakeError::NonTriangle { id: geometry.id });
        }
        // `!value` is `-value - 1` and stays defined for i32::MIN.
        let index = if value < 0 { !value } else { value } as u32;
        if index as usize >= vertex_count {
            return Err(BakeError::IndexOutOfRange {
                id: geometry.id,
                index,
                count: vertex_count,
            });
        }
        indices.push(index);
        if value < 0 {
            run = 0;
        }
    }
    Ok(indices)
}

#[derive(Clone, Copy)]
enum VectorSlot {
    Normal,
    Tangent,
}

fn slot_get(vertex: &OrbVertex, slot: VectorSlot) -> Vec3 {
    match slot {
        VectorSlot::Normal => Vec3::from_array(vertex.normal),
        VectorSlot::Tangent => Vec3::from_array(vertex.tangent),
    }
}

fn slot_set(vertex: &mut OrbVertex, slot: VectorSlot, value: Vec3) {
    match slot {
        VectorSlot::Normal => vertex.normal = value.to_array(),
        VectorSlot::Tangent => vertex.tangent = value.to_array(),
    }
}

/// Accumulate a vector layer (normals or tangents) onto the vertices,
/// then normalize. Shared vertices sum contributions from every
/// polygon that references them, which is what smooths them.
fn apply_vector_layer(
    vertices: &mut [OrbVertex],
    indices: &[u32],
    layer: &AttributeLayer,
    slot: VectorSlot,
) {
    if layer.is_empty() {
        return;
    }

    let value = |occurrence: usize| -> Option<Vec3> {
        let i = match layer.reference {
            ReferenceMode::IndexToDirect => *layer.indices.get(occurrence)? as usize,
            ReferenceMode::Direct | ReferenceMode::Unknown => occurrence,
        };
        let c = layer.values.get(i * 3..i * 3 + 3)?;
        Some(Vec3::new(c[0] as f32, c[1] as f32, c[2] as f32))
    };

    let mut add = |vertices: &mut [OrbVertex], vertex: u32, v: Vec3| {
        if let Some(target) = vertices.get_mut(vertex as usize) {
            slot_set(target, slot, slot_get(target, slot) + v);
        }
    };

    match layer.mapping {
        MappingMode::ByVertex => {
            for vi in 0..vertices.len() {
                if let Some(v) = value(vi) {
                    add(vertices, vi as u32, v);
                }
            }
        }
        MappingMode::ByPolygonVertex => {
            for (occurrence, &vi) in indices.iter().enumerate() {
                if let Some(v) = value(occurrence) {
                    add(vertices, vi, v);
                }
            }
        }
        MappingMode::ByPolygon => {
            for polygon in 0..indices.len() / 3 {
                if let Some(v) = value(polygon) {
                    for k in 0..3 {
                        add(vertices, indices[polygon * 3 + k], v);
                    }
                }
            }
        }
        MappingMode::Unknown => return,
    }

    for vertex in vertices.iter_mut() {
        let normalized = slot_get(vertex, slot).normalize_or_zero();
        slot_set(vertex, slot, normalized);
    }
}

/// Apply the uv layer per index slot. If a target vertex would receive
/// a second, different uv, it is cloned instead of overwritten and the
/// slot is re-pointed at the clone (uv-seam vertex splitting).
fn apply_uv_layer(vertices: &mut Vec<OrbVertex>, indices: &mut [u32], layer: &AttributeLayer) {
    let value = |occurrence: usize| -> Option<Vec2> {
        let i = match layer.reference {
            ReferenceMode::IndexToDirect => *layer.indices.get(occurrence)? as usize,
            ReferenceMode::Direct | ReferenceMode::Unknown => occurrence,
        };
        let c = layer.values.get(i * 2..i * 2 + 2)?;
        Some(Vec2::new(c[0] as f32, c[1] as f32))
    };

    let mut seen: HashMap<u32, Vec2> = HashMap::new();
    for slot in 0..indices.len() {
        let occurrence = match layer.mapping {
            MappingMode::ByPolygonVertex => slot,
            // ByVertex values key on the control point; those slots all
            // carry the same uv per vertex, so they never split and the
            // target is still the original index.
            MappingMode::ByVertex => indices[slot] as usize,
            MappingMode::ByPolygon => slot / 3,
            MappingMode::Unknown => return,
        };
        let Some(uv) = value(occurrence) else {
            continue;
        };
        let target = indices[slot];
        match seen.get(&target) {
            None => {
                vertices[target as usize].uv = uv.to_array();
                seen.insert(target, uv);
            }
            Some(prev) if *prev == uv => {}
            Some(_) => {
                let mut split = vertices[target as usize];
                split.uv = uv.to_array();
                vertices.push(split);
                let clone = (vertices.len() - 1) as u32;
                indices[slot] = clone;
                seen.insert(clone, uv);
            }
        }
    }
}

/// Merge identical vertices back into indexed form and remap indices.
///
/// Callable but disabled by default; see [`BakeOptions::deduplicate`].
fn deduplicate_vertices(vertices: &mut Vec<OrbVertex>, indices: &mut Vec<u16>) {
    if indices.is_empty() {
        *indices = (0..vertices.len()).map(|i| i as u16).collect();
    }
    let mut remap: HashMap<Vec<u8>, u16> = HashMap::new();
    let mut unique: Vec<OrbVertex> = Vec::new();
    for index in indices.iter_mut() {
        let vertex = vertices[*index as usize];
        let key = bytemuck::bytes_of(&vertex).to_vec();
        let slot = *remap.entry(key).or_insert_with(|| {
            unique.push(vertex);
            (unique.len() - 1) as u16
        });
        *index = slot;
    }
    *vertices = unique;
}

fn texture_id(texture: &Texture) -> String {
    let source = truncate_at_nul(&texture.filename);
    Path::new(source)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_owned())
}

/// Bake every resolved model into the accumulating output document.
pub fn bake_document(
    doc: &FbxDocument,
    graph: &SceneGraph,
    out: &mut OrbDocument,
    options: &BakeOptions,
) -> Result<(), BakeError> {
    // Stable output ordering regardless of hash-map iteration.
    let mut model_ids: Vec<i64> = graph.models.keys().copied().collect();
    model_ids.sort_unstable();

    for model_id in model_ids {
        let aggregate = &graph.models[&model_id];
        let Some(model) = doc.model(model_id) else {
            continue;
        };

        let material_names: Vec<String> = aggregate
            .materials
            .iter()
            .filter_map(|&mid| doc.material(mid))
            .map(|m| truncate_at_nul(&m.name).to_owned())
            .collect();

        if !aggregate.geometries.is_empty() {
            let mut mesh = OrbMesh {
                name: truncate_at_nul(&model.name).to_owned(),
                vertices: Vec::new(),
                indices: Vec::new(),
                submeshes: Vec::new(),
            };
            for (fragment, &gid) in aggregate.geometries.iter().enumerate() {
                let Some(geometry) = doc.geometry(gid) else {
                    continue;
                };
                let (vertices, indices) = bake_geometry(geometry, options)?;
                let material = material_names
                    .get(fragment)
                    .or_else(|| material_names.last())
                    .cloned()
                    .unwrap_or_default();
                mesh.submeshes.push(SubMesh {
                    start_vertex: mesh.vertices.len() as u32,
                    vertex_count: vertices.len() as u32,
                    start_index: mesh.indices.len() as u32,
                    index_count: indices.len() as u32,
                    material,
                });
                mesh.vertices.extend(vertices);
                mesh.indices.extend(indices);
            }
            tracing::info!(
                name = %mesh.name,
                vertices = mesh.vertices.len(),
                indices = mesh.indices.len(),
                submeshes = mesh.submeshes.len(),
                "baked mesh"
            );
            out.add_mesh(mesh);
        }

        for &mid in &aggregate.materials {
            let Some(material) = doc.material(mid) else {
                continue;
            };
            let mut flags = 0u32;
            let mut texture_ids = Vec::new();
            for (&bit, channel) in MATERIAL_TEXTURE_ORDER.iter().zip([
                TextureChannel::Color,
                TextureChannel::Normal,
                TextureChannel::Roughness,
                TextureChannel::Occlusion,
            ]) {
                let Some(slot) = material.textures.iter().find(|t| t.channel == channel) else {
                    continue;
                };
                let Some(texture) = doc.texture(slot.texture_id) else {
                    continue;
                };
                let id = texture_id(texture);
                flags |= bit;
                texture_ids.push(id.clone());
                out.add_texture(OrbTextureDesc {
                    name: id,
                    source: truncate_at_nul(&texture.filename).to_owned(),
                });
            }
            out.add_material(OrbMaterialDesc {
                name: truncate_at_nul(&material.name).to_owned(),
                diffuse: material.diffuse,
                roughness: material.roughness,
                flags,
                texture_ids,
            });
        }
    }

    for light in &graph.lights {
        out.lights.push(OrbLight {
            kind: light.kind as u32,
            color: light.color.to_array(),
            position: light.position.to_array(),
            direction: light.direction.to_array(),
            spot_angle: light.spot_angle,
            falloff_begin: light.falloff_begin,
            falloff_end: light.falloff_end,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_geometry() -> Geometry {
        Geometry {
            id: 1,
            positions: vec![0.0, 0.0, 0.0, 100.0, 0.0, 0.0, 0.0, 100.0, 0.0],
            polygon_indices: vec![0, 1, -3],
            ..Default::default()
        }
    }

    fn unit_z_values(count: usize) -> Vec<f64> {
        let mut values = Vec::new();
        for _ in 0..count {
            values.extend_from_slice(&[0.0, 0.0, 1.0]);
        }
        values
    }

    #[test]
    fn positions_convert_centimeters_to_meters() {
        let (vertices, indices) =
            bake_geometry(&triangle_geometry(), &BakeOptions::default()).unwrap();
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[2].position, [0.0, 1.0, 0.0]);
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn quads_are_rejected() {
        let mut geometry = triangle_geometry();
        geometry.positions.extend_from_slice(&[1.0, 1.0, 0.0]);
        geometry.polygon_indices = vec![0, 1, 2, -4];
        assert!(matches!(
            bake_geometry(&geometry, &BakeOptions::default()),
            Err(BakeError::NonTriangle { id: 1 })
        ));
    }

    #[test]
    fn extreme_terminator_index_is_out_of_range() {
        // i32::MIN decodes to i32::MAX, far past any control point; it
        // must surface as a range error, not an arithmetic panic.
        let mut geometry = triangle_geometry();
        geometry.polygon_indices = vec![0, 1, i32::MIN];
        assert!(matches!(
            bake_geometry(&geometry, &BakeOptions::default()),
            Err(BakeError::IndexOutOfRange { id: 1, .. })
        ));
    }

    #[test]
    fn normals_unit_length_for_all_mapping_reference_pairs() {
        let mappings = [
            MappingMode::ByVertex,
            MappingMode::ByPolygonVertex,
            MappingMode::ByPolygon,
        ];
        let references = [ReferenceMode::Direct, ReferenceMode::IndexToDirect];
        for mapping in mappings {
            for reference in references {
                let mut geometry = triangle_geometry();
                let occurrences = match mapping {
                    MappingMode::ByVertex => 3,
                    MappingMode::ByPolygonVertex => 3,
                    MappingMode::ByPolygon => 1,
                    MappingMode::Unknown => unreachable!(),
                };
                geometry.normals = AttributeLayer {
                    // Deliberately non-unit values; baking normalizes.
                    values: unit_z_values(occurrences)
                        .iter()
                        .map(|v| v * 3.0)
                        .collect(),
                    indices: match reference {
                        ReferenceMode::IndexToDirect => (0..occurrences as i32).collect(),
                        _ => Vec::new(),
                    },
                    mapping,
                    reference,
                };
                let (vertices, _) =
                    bake_geometry(&geometry, &BakeOptions::default()).unwrap();
                for v in &vertices {
                    let n = Vec3::from_array(v.normal);
                    assert!(
                        (n.length() - 1.0).abs() < 1e-5,
                        "{mapping:?}/{reference:?}: normal {n} not unit length"
                    );
                }
            }
        }
    }

    #[test]
    fn shared_vertex_normals_are_smoothed() {
        // Two triangles sharing an edge, face normals +Z and +X,
        // mapped per polygon: shared vertices average to a diagonal.
        let geometry = Geometry {
            id: 3,
            positions: vec![
                0.0, 0.0, 0.0, //
                100.0, 0.0, 0.0, //
                0.0, 100.0, 0.0, //
                0.0, 0.0, 100.0,
            ],
            polygon_indices: vec![0, 1, -3, 0, 2, -4],
            normals: AttributeLayer {
                values: vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0],
                indices: Vec::new(),
                mapping: MappingMode::ByPolygon,
                reference: ReferenceMode::Direct,
            },
            ..Default::default()
        };
        let (vertices, _) = bake_geometry(&geometry, &BakeOptions::default()).unwrap();
        let shared = Vec3::from_array(vertices[0].normal);
        let expected = Vec3::new(1.0, 0.0, 1.0).normalize();
        assert!(shared.abs_diff_eq(expected, 1e-5));
        assert!(Vec3::from_array(vertices[1].normal).abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn uv_seams_split_vertices() {
        // Two triangles share control points 0 and 1 but carry
        // different uvs per polygon vertex: unwelding must give both
        // occurrences their own vertex with the same position.
        let geometry = Geometry {
            id: 4,
            positions: vec![
                0.0, 0.0, 0.0, //
                100.0, 0.0, 0.0, //
                0.0, 100.0, 0.0, //
                100.0, 100.0, 0.0,
            ],
            polygon_indices: vec![0, 1, -3, 1, 3, -1],
            uvs: AttributeLayer {
                values: vec![
                    0.0, 0.0, 0.1, 0.0, 0.0, 0.1, // first triangle
                    0.9, 0.0, 1.0, 0.1, 1.0, 0.0, // second triangle
                ],
                indices: Vec::new(),
                mapping: MappingMode::ByPolygonVertex,
                reference: ReferenceMode::Direct,
            },
            ..Default::default()
        };
        let (vertices, indices) = bake_geometry(&geometry, &BakeOptions::default()).unwrap();
        assert_eq!(vertices.len(), 6);
        assert_eq!(indices.len(), 6);

        // Control point 1 appears at slots 1 and 3 with distinct uvs.
        assert_eq!(vertices[1].position, vertices[3].position);
        assert_ne!(vertices[1].uv, vertices[3].uv);
        assert!(indices.contains(&1) && indices.contains(&3));
    }

    #[test]
    fn dedup_pass_merges_identical_vertices_when_enabled() {
        let geometry = triangle_geometry();
        let mut shared = geometry;
        // Two triangles over the same three control points; no uv layer
        // keeps the indexed form.
        shared.polygon_indices = vec![0, 1, -3, 0, 1, -3];
        let options = BakeOptions { deduplicate: true };
        let (vertices, indices) = bake_geometry(&shared, &options).unwrap();
        assert_eq!(vertices.len(), 3);
        assert_eq!(indices, vec![0, 1, 2, 0, 1, 2]);

        let (vertices, indices) =
            bake_geometry(&shared, &BakeOptions::default()).unwrap();
        assert_eq!(vertices.len(), 3);
        assert_eq!(indices, vec![0, 1, 2, 0, 1, 2]);
    }
}
