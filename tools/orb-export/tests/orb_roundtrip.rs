//! Write an Orb container from a hand-built document and decode it
//! back with the analyzer.

use orb_export::formats::{
    write_orb_with_root, LightKind, OrbLight, OrbVertex, MATERIAL_TEXTURE_COLOR,
    MATERIAL_TEXTURE_ROUGHNESS, ORB_VERSION,
};
use orb_export::mesh::{OrbMaterialDesc, OrbMesh, OrbTextureDesc, SubMesh};
use orb_export::{read_orb, OrbDocument};

fn sample_document() -> OrbDocument {
    let mut doc = OrbDocument::default();

    doc.lights.push(OrbLight {
        kind: LightKind::Spot as u32,
        color: [1.0, 0.5, 0.25],
        position: [5.0, 10.0, 0.0],
        direction: [1.0, 0.0, 0.0],
        spot_angle: 45.0,
        falloff_begin: 2.0,
        falloff_end: 2.4,
    });

    doc.add_material(OrbMaterialDesc {
        name: "Painted".into(),
        diffuse: [0.8, 0.2, 0.2, 1.0],
        roughness: 0.35,
        flags: MATERIAL_TEXTURE_COLOR | MATERIAL_TEXTURE_ROUGHNESS,
        texture_ids: vec!["paint.png".into(), "rough.png".into()],
    });
    doc.add_material(OrbMaterialDesc {
        name: "Bare".into(),
        diffuse: [1.0, 1.0, 1.0, 1.0],
        roughness: 0.5,
        flags: 0,
        texture_ids: Vec::new(),
    });

    doc.add_texture(OrbTextureDesc {
        name: "paint.png".into(),
        source: "textures/paint.png".into(),
    });
    doc.add_texture(OrbTextureDesc {
        name: "rough.png".into(),
        source: "textures/rough.png".into(),
    });

    let vertices = vec![
        OrbVertex {
            position: [0.0, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            uv: [0.0, 0.0],
            ..Default::default()
        },
        OrbVertex {
            position: [1.0, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            uv: [1.0, 0.0],
            ..Default::default()
        },
        OrbVertex {
            position: [0.0, 1.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            uv: [0.0, 1.0],
            ..Default::default()
        },
    ];
    doc.add_mesh(OrbMesh {
        name: "Tri".into(),
        vertices,
        indices: vec![0, 1, 2],
        submeshes: vec![SubMesh {
            start_vertex: 0,
            vertex_count: 3,
            start_index: 0,
            index_count: 3,
            material: "Painted".into(),
        }],
    });

    doc
}

#[test]
fn full_container_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("paint.png"), b"fake png payload").unwrap();
    std::fs::write(dir.path().join("rough.png"), b"r").unwrap();

    let doc = sample_document();
    let mut bytes = Vec::new();
    write_orb_with_root(&mut bytes, &doc, dir.path()).unwrap();

    let archive = read_orb(&bytes).unwrap();
    assert_eq!(archive.version.major, ORB_VERSION.major);
    assert_eq!(archive.version.revision, ORB_VERSION.revision);
    assert_eq!(archive.num_animations, 0);

    assert_eq!(archive.lights.len(), 1);
    let light = &archive.lights[0];
    assert_eq!(light.kind, LightKind::Spot as u32);
    assert_eq!(light.color, [1.0, 0.5, 0.25]);
    assert_eq!(light.position, [5.0, 10.0, 0.0]);
    assert_eq!(light.spot_angle, 45.0);
    assert_eq!(light.falloff_begin, 2.0);
    assert_eq!(light.falloff_end, 2.4);

    assert_eq!(archive.materials.len(), 2);
    let painted = &archive.materials[0];
    assert_eq!(painted.name, "Painted");
    assert_eq!(painted.diffuse, [0.8, 0.2, 0.2, 1.0]);
    assert_eq!(painted.roughness, 0.35);
    assert_eq!(
        painted.flags,
        MATERIAL_TEXTURE_COLOR | MATERIAL_TEXTURE_ROUGHNESS
    );
    assert_eq!(painted.texture_ids, vec!["paint.png", "rough.png"]);
    let bare = &archive.materials[1];
    assert_eq!(bare.name, "Bare");
    assert_eq!(bare.flags, 0);
    assert!(bare.texture_ids.is_empty());

    assert_eq!(archive.textures.len(), 2);
    assert_eq!(archive.textures[0].name, "paint.png");
    assert_eq!(archive.textures[0].size, 16);
    assert_eq!(archive.textures[1].name, "rough.png");
    assert_eq!(archive.textures[1].size, 1);

    assert_eq!(archive.meshes.len(), 1);
    let mesh = &archive.meshes[0];
    assert_eq!(mesh.name, "Tri");
    assert_eq!(mesh.vertex_count, 3);
    assert_eq!(mesh.stride, 44);
    assert_eq!(mesh.index_count, 3);
    assert_eq!(mesh.submeshes.len(), 1);
    assert_eq!(mesh.submeshes[0].material, "Painted");
}

#[test]
fn duplicate_sections_keep_first_entry() {
    let mut doc = OrbDocument::default();
    doc.add_material(OrbMaterialDesc {
        name: "Mat".into(),
        diffuse: [1.0, 0.0, 0.0, 1.0],
        roughness: 0.1,
        flags: 0,
        texture_ids: Vec::new(),
    });
    doc.add_material(OrbMaterialDesc {
        name: "Mat".into(),
        diffuse: [0.0, 1.0, 0.0, 1.0],
        roughness: 0.9,
        flags: 0,
        texture_ids: Vec::new(),
    });

    let mut bytes = Vec::new();
    write_orb_with_root(&mut bytes, &doc, std::path::Path::new(".")).unwrap();
    let archive = read_orb(&bytes).unwrap();
    assert_eq!(archive.materials.len(), 1);
    assert_eq!(archive.materials[0].diffuse, [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(archive.materials[0].roughness, 0.1);
}
