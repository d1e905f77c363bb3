//! The parts of the glTF JSON document the resolvers read.
//!
//! Only the collections needed to locate bytes are typed. Everything else
//! (meshes, materials, nodes, scenes, animations, ...) is kept as raw JSON
//! in [`Document::other`].

use serde::Deserialize;
use serde_json::{Map, Value};

/// A deserialized glTF document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Asset metadata. Missing metadata is rejected by the version gate.
    pub asset: Option<AssetInfo>,
    pub buffers: Option<Vec<Buffer>>,
    pub buffer_views: Option<Vec<BufferView>>,
    pub accessors: Option<Vec<Accessor>>,
    pub images: Option<Vec<Image>>,
    /// Index of the default scene.
    pub scene: Option<usize>,
    #[serde(default)]
    pub extensions_used: Vec<String>,
    #[serde(default)]
    pub extensions_required: Vec<String>,
    /// Every other top-level property, untouched.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Document {
    /// Raw JSON for a top-level property not typed by this crate.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.other.get(key)
    }

    pub fn meshes(&self) -> &[Value] {
        self.array("meshes")
    }

    pub fn materials(&self) -> &[Value] {
        self.array("materials")
    }

    pub fn nodes(&self) -> &[Value] {
        self.array("nodes")
    }

    pub fn scenes(&self) -> &[Value] {
        self.array("scenes")
    }

    pub fn textures(&self) -> &[Value] {
        self.array("textures")
    }

    fn array(&self, key: &str) -> &[Value] {
        self.other
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// `asset` metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    pub version: String,
    pub min_version: Option<String>,
    pub generator: Option<String>,
    pub copyright: Option<String>,
}

/// `buffers[i]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    /// External, relative or data URI. Absent for the GLB binary chunk.
    pub uri: Option<String>,
    pub byte_length: usize,
    pub name: Option<String>,
}

/// `bufferViews[i]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: usize,
    pub byte_offset: Option<usize>,
    pub byte_length: Option<usize>,
    /// Distance in bytes between the starts of consecutive elements.
    pub byte_stride: Option<usize>,
    pub target: Option<u32>,
    pub name: Option<String>,
}

/// `accessors[i]`.
///
/// `component_type` and `type_` are kept raw and validated when the accessor
/// is resolved, so one bad accessor does not prevent loading the document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    pub buffer_view: Option<usize>,
    pub byte_offset: Option<usize>,
    pub component_type: u32,
    #[serde(default)]
    pub normalized: bool,
    pub count: usize,
    #[serde(rename = "type")]
    pub type_: String,
    pub min: Option<Vec<f64>>,
    pub max: Option<Vec<f64>>,
    pub sparse: Option<Sparse>,
    pub name: Option<String>,
}

/// `accessors[i].sparse`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sparse {
    pub count: usize,
    pub indices: SparseIndices,
    pub values: SparseValues,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseIndices {
    pub buffer_view: usize,
    pub byte_offset: Option<usize>,
    pub component_type: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseValues {
    pub buffer_view: usize,
    pub byte_offset: Option<usize>,
}

/// `images[i]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub uri: Option<String>,
    pub mime_type: Option<String>,
    pub buffer_view: Option<usize>,
    pub name: Option<String>,
}
