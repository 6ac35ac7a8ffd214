//! Minimal FBX binary writer for building test fixtures in memory.
//!
//! Only the record framing the converter consumes: end-offset nodes,
//! child-list sentinels, and a handful of property tags.

pub const MAGIC: &[u8; 23] = b"Kaydara FBX Binary  \x00\x1a\x00";

/// Magic (23) + version (4); node end offsets are absolute file
/// offsets, so body positions shift by this much.
const BODY_BASE: usize = 27;

pub enum Prop {
    I64(i64),
    Str(String),
    F64Arr(Vec<f64>),
    I32Arr(Vec<i32>),
}

#[derive(Default)]
pub struct NodeBuilder {
    name: String,
    props: Vec<Prop>,
    children: Vec<NodeBuilder>,
}

impl NodeBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    pub fn prop_i64(mut self, value: i64) -> Self {
        self.props.push(Prop::I64(value));
        self
    }

    pub fn prop_str(mut self, value: &str) -> Self {
        self.props.push(Prop::Str(value.to_owned()));
        self
    }

    pub fn prop_f64_array(mut self, values: Vec<f64>) -> Self {
        self.props.push(Prop::F64Arr(values));
        self
    }

    pub fn prop_i32_array(mut self, values: Vec<i32>) -> Self {
        self.props.push(Prop::I32Arr(values));
        self
    }

    pub fn child(mut self, child: NodeBuilder) -> Self {
        self.children.push(child);
        self
    }

    fn encode(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.extend_from_slice(&[0u8; 4]); // end offset, patched below
        out.extend_from_slice(&(self.props.len() as u32).to_le_bytes());
        let prop_len_at = out.len();
        out.extend_from_slice(&[0u8; 4]);
        out.push(self.name.len() as u8);
        out.extend_from_slice(self.name.as_bytes());

        let props_start = out.len();
        for prop in &self.props {
            encode_prop(prop, out);
        }
        let prop_len = (out.len() - props_start) as u32;
        out[prop_len_at..prop_len_at + 4].copy_from_slice(&prop_len.to_le_bytes());

        if !self.children.is_empty() {
            for child in &self.children {
                child.encode(out);
            }
            out.extend_from_slice(&[0u8; 13]); // child-list sentinel
        }

        let end = (out.len() + BODY_BASE) as u32;
        out[start..start + 4].copy_from_slice(&end.to_le_bytes());
    }
}

fn encode_prop(prop: &Prop, out: &mut Vec<u8>) {
    match prop {
        Prop::I64(v) => {
            out.push(b'L');
            out.extend_from_slice(&v.to_le_bytes());
        }
        Prop::Str(s) => {
            out.push(b'S');
            out.extend_from_slice(&(s.len() as u32).to_le_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        Prop::F64Arr(values) => {
            out.push(b'd');
            out.extend_from_slice(&(values.len() as u32).to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes()); // uncompressed
            out.extend_from_slice(&((values.len() * 8) as u32).to_le_bytes());
            for v in values {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        Prop::I32Arr(values) => {
            out.push(b'i');
            out.extend_from_slice(&(values.len() as u32).to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&((values.len() * 4) as u32).to_le_bytes());
            for v in values {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
}

/// Assemble a complete FBX binary file from top-level nodes.
pub fn build_fbx(roots: &[NodeBuilder]) -> Vec<u8> {
    let mut body = Vec::new();
    for root in roots {
        root.encode(&mut body);
    }
    body.extend_from_slice(&[0u8; 13]); // top-level end marker
    let mut data = MAGIC.to_vec();
    data.extend_from_slice(&7400u32.to_le_bytes());
    data.extend_from_slice(&body);
    data
}
