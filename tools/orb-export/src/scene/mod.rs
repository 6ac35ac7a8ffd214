//! Scene graph resolution
//!
//! Consumes the flat connection list and builds the intermediate scene:
//! per-model aggregates (children, geometries, materials, attributes)
//! plus the resolved light list. Connections arrive in arbitrary order,
//! so per-model records are created lazily on first reference.

use glam::{Quat, Vec3};
use hashbrown::HashMap;

use orb_common::LightKind;

use crate::fbx::{Connection, Entity, FbxDocument, MaterialTexture, TextureChannel};

/// Per-model aggregate, created on first reference by a connection.
///
/// Holds ids only; the document arena stays the single owner of every
/// entity, and the parent link is a lookup, not ownership.
#[derive(Debug, Default)]
pub struct IntermediateModel {
    pub model_id: i64,
    pub parent: Option<i64>,
    pub children: Vec<i64>,
    pub geometries: Vec<i64>,
    pub materials: Vec<i64>,
    pub attributes: Vec<i64>,
}

/// A light resolved at connection time. Position and direction come
/// from the owning model's combined root-to-node transform as it is
/// known at that moment; they are never updated again.
#[derive(Debug, Clone)]
pub struct ResolvedLight {
    pub kind: LightKind,
    pub color: Vec3,
    pub position: Vec3,
    pub direction: Vec3,
    pub spot_angle: f32,
    pub falloff_begin: f32,
    pub falloff_end: f32,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    pub models: HashMap<i64, IntermediateModel>,
    pub lights: Vec<ResolvedLight>,
}

/// Spot falloff end is not authored separately; it extends the start by
/// a fixed factor.
const FALLOFF_END_FACTOR: f32 = 1.2;

impl SceneGraph {
    fn model_mut(&mut self, id: i64) -> &mut IntermediateModel {
        self.models.entry(id).or_insert_with(|| IntermediateModel {
            model_id: id,
            ..Default::default()
        })
    }

    /// Combined (root-to-node) position and rotation of a model,
    /// walking the parent links through the entity arena.
    pub fn combined_transform(&self, doc: &FbxDocument, id: i64) -> (Vec3, Quat) {
        let Some(model) = doc.model(id) else {
            return (Vec3::ZERO, Quat::IDENTITY);
        };
        let mut position = model.translation;
        let mut rotation = model.rotation;
        let mut current = self.models.get(&id).and_then(|m| m.parent);
        while let Some(parent_id) = current {
            if let Some(parent) = doc.model(parent_id) {
                position = parent.translation + parent.rotation * position;
                rotation = parent.rotation * rotation;
            }
            current = self.models.get(&parent_id).and_then(|m| m.parent);
        }
        (position, rotation)
    }
}

/// Resolve every connection into the scene graph.
///
/// A connection whose endpoints are missing from the arena, or whose
/// entity types match none of the rules, is dropped silently.
pub fn resolve(doc: &mut FbxDocument) -> SceneGraph {
    let mut graph = SceneGraph::default();

    let connections: Vec<Connection> = doc.connections.clone();
    for conn in &connections {
        match (doc.entities.get(&conn.from), doc.entities.get(&conn.to)) {
            (Some(Entity::Model(_)), Some(Entity::Model(_))) => {
                graph.model_mut(conn.to).children.push(conn.from);
                graph.model_mut(conn.from).parent = Some(conn.to);
            }
            (Some(Entity::LightAttribute(_)), Some(Entity::Model(_))) => {
                connect_attribute(doc, &mut graph, conn.from, conn.to);
            }
            (Some(Entity::Geometry(_)), Some(Entity::Model(_))) => {
                graph.model_mut(conn.to).geometries.push(conn.from);
            }
            (Some(Entity::Material(_)), Some(Entity::Model(_))) => {
                graph.model_mut(conn.to).materials.push(conn.from);
            }
            (Some(Entity::Texture(_)), Some(Entity::Material(_))) => {
                let channel = TextureChannel::classify(conn.property_name.as_deref());
                if let Some(material) = doc.material_mut(conn.to) {
                    material.textures.push(MaterialTexture {
                        channel,
                        texture_id: conn.from,
                    });
                }
            }
            // Dangling ids and unmatched type pairs are not errors.
            _ => {}
        }
    }

    tracing::debug!(
        models = graph.models.len(),
        lights = graph.lights.len(),
        "resolved scene graph"
    );
    graph
}

fn connect_attribute(doc: &FbxDocument, graph: &mut SceneGraph, attr_id: i64, model_id: i64) {
    graph.model_mut(model_id).attributes.push(attr_id);

    let Some(attr) = doc.light_attribute(attr_id) else {
        return;
    };
    if attr.type_token != "Light" {
        return;
    }

    // 0 = point, 2 = spot, 3 = directional; other values fall back to
    // point, matching what authoring tools emit by default.
    let kind = match attr.channels.number("LightType").unwrap_or(0.0) as i64 {
        2 => LightKind::Spot,
        3 => LightKind::Directional,
        _ => LightKind::Point,
    };
    let color = attr
        .channels
        .vec3("Color")
        .unwrap_or(Vec3::ONE);
    let falloff_begin = attr.channels.number("DecayStart").unwrap_or(0.0) as f32;
    let spot_angle = attr.channels.number("OuterAngle").unwrap_or(0.0) as f32;

    let (position, rotation) = graph.combined_transform(doc, model_id);
    let direction = (rotation * Vec3::NEG_Y).normalize_or_zero();

    graph.lights.push(ResolvedLight {
        kind,
        color,
        position,
        direction,
        spot_angle,
        falloff_begin,
        falloff_end: falloff_begin * FALLOFF_END_FACTOR,
    });
}
