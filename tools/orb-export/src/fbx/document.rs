//! Typed entity extraction
//!
//! Walks the decoded node tree and produces the document's entities
//! (models, geometries, materials, textures, light attributes) plus the
//! flat connection list. Entities live in a single id → entity arena;
//! everything downstream references them by id.

use glam::{Quat, Vec3};
use hashbrown::HashMap;

use super::{FbxError, Node, Property};

/// Everything extracted from one source file.
#[derive(Debug, Default)]
pub struct FbxDocument {
    pub entities: HashMap<i64, Entity>,
    pub connections: Vec<Connection>,
}

#[derive(Debug)]
pub enum Entity {
    Model(Model),
    Geometry(Geometry),
    Material(Material),
    Texture(Texture),
    LightAttribute(LightAttribute),
}

/// Connection type token (`OO`, `OP`, `PO`, `PP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    ObjectObject,
    ObjectProperty,
    PropertyObject,
    PropertyProperty,
}

/// One `C` record: a directed edge from a child/owned entity to its
/// parent/owner, optionally naming a target property.
#[derive(Debug, Clone)]
pub struct Connection {
    pub kind: ConnectionKind,
    pub from: i64,
    pub to: i64,
    pub property_name: Option<String>,
}

#[derive(Debug)]
pub struct Model {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

/// How attribute-layer values map onto the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingMode {
    ByPolygonVertex,
    ByVertex,
    ByPolygon,
    #[default]
    Unknown,
}

impl MappingMode {
    fn from_token(token: &str) -> Self {
        match token {
            "ByPolygonVertex" => Self::ByPolygonVertex,
            "ByVertex" | "ByVertice" => Self::ByVertex,
            "ByPolygon" => Self::ByPolygon,
            _ => Self::Unknown,
        }
    }
}

/// Whether layer values are stored per occurrence or behind an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceMode {
    Direct,
    IndexToDirect,
    #[default]
    Unknown,
}

impl ReferenceMode {
    fn from_token(token: &str) -> Self {
        match token {
            "Direct" => Self::Direct,
            "IndexToDirect" | "Index" => Self::IndexToDirect,
            _ => Self::Unknown,
        }
    }
}

/// One attribute stream (normal, tangent or uv) with its own mapping
/// and reference semantics.
#[derive(Debug, Clone, Default)]
pub struct AttributeLayer {
    pub values: Vec<f64>,
    pub indices: Vec<i32>,
    pub mapping: MappingMode,
    pub reference: ReferenceMode,
}

impl AttributeLayer {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Geometry {
    pub id: i64,
    pub name: String,
    /// Flat coordinate list, three doubles per control point.
    pub positions: Vec<f64>,
    /// Sign-encoded polygon index list; a negative entry marks the last
    /// vertex of a face and decodes as `-(value) - 1`.
    pub polygon_indices: Vec<i32>,
    pub normals: AttributeLayer,
    pub tangents: AttributeLayer,
    pub uvs: AttributeLayer,
}

/// Texture channel classification from a connection's property name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureChannel {
    Color,
    Normal,
    Roughness,
    Occlusion,
    Unknown,
}

impl TextureChannel {
    pub fn classify(property_name: Option<&str>) -> Self {
        match property_name {
            Some("Maya|specularRoughness") => Self::Roughness,
            Some("Maya|normalCamera") => Self::Normal,
            Some("Maya|baseColor") | Some("DiffuseColor") => Self::Color,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MaterialTexture {
    pub channel: TextureChannel,
    pub texture_id: i64,
}

#[derive(Debug)]
pub struct Material {
    pub id: i64,
    pub name: String,
    pub diffuse: [f32; 4],
    pub roughness: f32,
    /// Filled in while connections are resolved.
    pub textures: Vec<MaterialTexture>,
}

#[derive(Debug)]
pub struct Texture {
    pub id: i64,
    pub name: String,
    pub filename: String,
}

/// A `NodeAttribute` entity; its property table is kept untyped until a
/// connection tells us which model owns it.
#[derive(Debug)]
pub struct LightAttribute {
    pub id: i64,
    pub name: String,
    pub type_token: String,
    pub channels: PropertyChannels,
}

/// The `P` records of a `Properties70` table.
#[derive(Debug, Clone, Default)]
pub struct PropertyChannels(Vec<PropertyChannel>);

#[derive(Debug, Clone)]
pub struct PropertyChannel {
    pub name: String,
    pub values: Vec<Property>,
}

impl PropertyChannels {
    pub fn from_channels(channels: Vec<PropertyChannel>) -> Self {
        Self(channels)
    }

    fn read(node: &Node) -> Self {
        let mut channels = Vec::new();
        if let Some(table) = node.find_child("Properties70", 0) {
            for p in table.children.iter().filter(|c| c.name == "P") {
                let Some(name) = p.properties.first().and_then(|v| v.as_str().ok()) else {
                    continue;
                };
                // P records are (name, type, label, flags, values...).
                let values = p.properties.get(4..).unwrap_or(&[]).to_vec();
                channels.push(PropertyChannel {
                    name: name.to_owned(),
                    values,
                });
            }
        }
        Self(channels)
    }

    pub fn find(&self, name: &str) -> Option<&PropertyChannel> {
        self.0.iter().find(|c| c.name == name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.find(name)?.values.first()?.as_number().ok()
    }

    pub fn vec3(&self, name: &str) -> Option<Vec3> {
        let values = &self.find(name)?.values;
        let x = values.first()?.as_number().ok()?;
        let y = values.get(1)?.as_number().ok()?;
        let z = values.get(2)?.as_number().ok()?;
        Some(Vec3::new(x as f32, y as f32, z as f32))
    }
}

/// Euler rotation channel (degrees) to quaternion.
///
/// Channels compose intrinsically about Z, then X, then Z — the order
/// the importer has always used, kept for behavioral parity with files
/// converted by earlier tool versions.
pub(crate) fn euler_to_quat(degrees: Vec3) -> Quat {
    Quat::from_rotation_z(degrees.x.to_radians())
        * Quat::from_rotation_x(degrees.y.to_radians())
        * Quat::from_rotation_z(degrees.z.to_radians())
}

impl FbxDocument {
    pub fn model(&self, id: i64) -> Option<&Model> {
        match self.entities.get(&id) {
            Some(Entity::Model(m)) => Some(m),
            _ => None,
        }
    }

    pub fn geometry(&self, id: i64) -> Option<&Geometry> {
        match self.entities.get(&id) {
            Some(Entity::Geometry(g)) => Some(g),
            _ => None,
        }
    }

    pub fn material(&self, id: i64) -> Option<&Material> {
        match self.entities.get(&id) {
            Some(Entity::Material(m)) => Some(m),
            _ => None,
        }
    }

    pub fn material_mut(&mut self, id: i64) -> Option<&mut Material> {
        match self.entities.get_mut(&id) {
            Some(Entity::Material(m)) => Some(m),
            _ => None,
        }
    }

    pub fn texture(&self, id: i64) -> Option<&Texture> {
        match self.entities.get(&id) {
            Some(Entity::Texture(t)) => Some(t),
            _ => None,
        }
    }

    pub fn light_attribute(&self, id: i64) -> Option<&LightAttribute> {
        match self.entities.get(&id) {
            Some(Entity::LightAttribute(a)) => Some(a),
            _ => None,
        }
    }
}

/// Extract all entities and connections from a decoded tree.
pub fn extract(tree: &[Node]) -> Result<FbxDocument, FbxError> {
    let mut doc = FbxDocument::default();

    if let Some(objects) = tree.iter().find(|n| n.name == "Objects") {
        extract_entities(&mut doc, objects, "Model", |n| {
            Ok(Entity::Model(parse_model(n)?))
        })?;
        extract_entities(&mut doc, objects, "Geometry", |n| {
            Ok(Entity::Geometry(parse_geometry(n)?))
        })?;
        extract_entities(&mut doc, objects, "Material", |n| {
            Ok(Entity::Material(parse_material(n)?))
        })?;
        extract_entities(&mut doc, objects, "Texture", |n| {
            Ok(Entity::Texture(parse_texture(n)?))
        })?;
        extract_entities(&mut doc, objects, "NodeAttribute", |n| {
            Ok(Entity::LightAttribute(parse_node_attribute(n)?))
        })?;
    }

    if let Some(connections) = tree.iter().find(|n| n.name == "Connections") {
        for c in connections.children.iter().filter(|c| c.name == "C") {
            if let Some(conn) = parse_connection(c)? {
                doc.connections.push(conn);
            }
        }
    }

    tracing::debug!(
        entities = doc.entities.len(),
        connections = doc.connections.len(),
        "extracted document"
    );
    Ok(doc)
}

fn extract_entities(
    doc: &mut FbxDocument,
    objects: &Node,
    name: &str,
    parse: impl Fn(&Node) -> Result<Entity, FbxError>,
) -> Result<(), FbxError> {
    let mut idx = 0;
    while let Some(node) = objects.find_child(name, idx) {
        let entity = parse(node)?;
        let id = match &entity {
            Entity::Model(m) => m.id,
            Entity::Geometry(g) => g.id,
            Entity::Material(m) => m.id,
            Entity::Texture(t) => t.id,
            Entity::LightAttribute(a) => a.id,
        };
        doc.entities.insert(id, entity);
        idx += 1;
    }
    Ok(())
}

fn parse_model(node: &Node) -> Result<Model, FbxError> {
    let id = node.property(0)?.as_i64()?;
    let name = node.property(1)?.as_str()?.to_owned();
    let kind = node.property(2)?.as_str()?.to_owned();

    let channels = PropertyChannels::read(node);
    let translation = channels.vec3("Lcl Translation").unwrap_or(Vec3::ZERO);
    let rotation = channels
        .vec3("Lcl Rotation")
        .map(euler_to_quat)
        .unwrap_or(Quat::IDENTITY);
    let scale = channels.vec3("Lcl Scaling").unwrap_or(Vec3::ONE);

    Ok(Model {
        id,
        name,
        kind,
        translation,
        rotation,
        scale,
    })
}

fn parse_geometry(node: &Node) -> Result<Geometry, FbxError> {
    let id = node.property(0)?.as_i64()?;
    let name = node
        .properties
        .get(1)
        .and_then(|p| p.as_str().ok())
        .unwrap_or_default()
        .to_owned();

    let positions = match node.find_child("Vertices", 0) {
        Some(v) => v.property(0)?.as_f64_array()?.to_vec(),
        None => Vec::new(),
    };
    let polygon_indices = match node.find_child("PolygonVertexIndex", 0) {
        Some(v) => v.property(0)?.as_i32_array()?.to_vec(),
        None => Vec::new(),
    };

    Ok(Geometry {
        id,
        name,
        positions,
        polygon_indices,
        normals: parse_layer(node, "LayerElementNormal", "Normals", "NormalsIndex")?,
        tangents: parse_layer(node, "LayerElementTangent", "Tangents", "TangentsIndex")?,
        uvs: parse_layer(node, "LayerElementUV", "UV", "UVIndex")?,
    })
}

fn parse_layer(
    node: &Node,
    element: &str,
    values_name: &str,
    index_name: &str,
) -> Result<AttributeLayer, FbxError> {
    let Some(layer) = node.find_child(element, 0) else {
        return Ok(AttributeLayer::default());
    };

    let token = |child: &str| -> Option<String> {
        layer
            .find_child(child, 0)?
            .properties
            .first()?
            .as_str()
            .ok()
            .map(str::to_owned)
    };
    let mapping = token("MappingInformationType")
        .map(|t| MappingMode::from_token(&t))
        .unwrap_or_default();
    let reference = token("ReferenceInformationType")
        .map(|t| ReferenceMode::from_token(&t))
        .unwrap_or_default();

    let values = match layer.find_child(values_name, 0) {
        Some(n) => n.property(0)?.as_f64_array()?.to_vec(),
        None => Vec::new(),
    };
    let indices = match layer.find_child(index_name, 0) {
        Some(n) => n.property(0)?.as_i32_array()?.to_vec(),
        None => Vec::new(),
    };

    Ok(AttributeLayer {
        values,
        indices,
        mapping,
        reference,
    })
}

fn parse_material(node: &Node) -> Result<Material, FbxError> {
    let id = node.property(0)?.as_i64()?;
    let name = node.property(1)?.as_str()?.to_owned();

    let channels = PropertyChannels::read(node);
    let diffuse = channels
        .vec3("DiffuseColor")
        .map(|c| [c.x, c.y, c.z, 1.0])
        .unwrap_or([1.0, 1.0, 1.0, 1.0]);
    let roughness = channels
        .number("Maya|specularRoughness")
        .unwrap_or(0.5) as f32;

    Ok(Material {
        id,
        name,
        diffuse,
        roughness,
        textures: Vec::new(),
    })
}

fn parse_texture(node: &Node) -> Result<Texture, FbxError> {
    let id = node.property(0)?.as_i64()?;
    let name = node.property(1)?.as_str()?.to_owned();

    let filename = ["RelativeFilename", "FileName"]
        .iter()
        .find_map(|child| {
            node.find_child(child, 0)?
                .properties
                .first()?
                .as_str()
                .ok()
                .map(str::to_owned)
        })
        .unwrap_or_default();

    Ok(Texture { id, name, filename })
}

fn parse_node_attribute(node: &Node) -> Result<LightAttribute, FbxError> {
    let id = node.property(0)?.as_i64()?;
    let name = node.property(1)?.as_str()?.to_owned();
    let type_token = node
        .properties
        .get(2)
        .and_then(|p| p.as_str().ok())
        .unwrap_or_default()
        .to_owned();

    Ok(LightAttribute {
        id,
        name,
        type_token,
        channels: PropertyChannels::read(node),
    })
}

fn parse_connection(node: &Node) -> Result<Option<Connection>, FbxError> {
    let Some(token) = node.properties.first().and_then(|p| p.as_str().ok()) else {
        return Ok(None);
    };
    let kind = match token {
        "OO" => ConnectionKind::ObjectObject,
        "OP" => ConnectionKind::ObjectProperty,
        "PO" => ConnectionKind::PropertyObject,
        "PP" => ConnectionKind::PropertyProperty,
        other => {
            tracing::warn!(token = other, "skipping connection with unknown type token");
            return Ok(None);
        }
    };
    let from = node.property(1)?.as_i64()?;
    let to = node.property(2)?.as_i64()?;
    let property_name = node
        .properties
        .get(3)
        .and_then(|p| p.as_str().ok())
        .map(str::to_owned);

    Ok(Some(Connection {
        kind,
        from,
        to,
        property_name,
    }))
}
