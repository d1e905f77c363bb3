//! GLB assets whose buffers mix the binary chunk and external files.

use futures::executor::block_on;
use serde_json::json;

use super::{CountingDecoder, CountingProvider, build_glb, f32_bytes, loader_with};
use crate::gltf::{AccessorType, ComponentType, GltfAsset, GltfError};

fn mixed_asset(files: &CountingProvider, chunk_len: usize) -> GltfAsset {
    let mut bin = f32_bytes(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    bin.extend([0u16, 1, 2].iter().flat_map(|i| i.to_le_bytes()));
    bin.truncate(chunk_len);

    let document = json!({
        "asset": {"version": "2.0", "minVersion": "2.0"},
        "extensionsUsed": ["KHR_materials_unlit"],
        "buffers": [
            {"byteLength": 42},
            {"uri": "normals.bin", "byteLength": 36}
        ],
        "bufferViews": [
            {"buffer": 0, "byteLength": 36, "target": 34962},
            {"buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963},
            {"buffer": 1, "byteLength": 36}
        ],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
             "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
            {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"},
            {"bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC3"}
        ]
    });
    let glb = build_glb(&document.to_string(), &bin);
    loader_with(files, &CountingDecoder::new())
        .parse(glb, "assets/")
        .unwrap()
}

#[test]
fn triangle_from_chunk_and_sidecar() {
    let files = CountingProvider::new().with("assets/normals.bin", f32_bytes(&[0.0f32, 0.0, 1.0].repeat(3)));
    let asset = mixed_asset(&files, 42);

    assert_eq!(asset.document().extensions_used, ["KHR_materials_unlit"]);

    let positions = block_on(asset.accessor_data(0)).unwrap();
    assert_eq!(positions.accessor_type(), AccessorType::Vec3);
    assert_eq!(positions.component_type(), ComponentType::F32);
    assert_eq!(positions.read::<[f32; 3]>().unwrap()[1], [1.0, 0.0, 0.0]);
    // zero-copy view into the container
    assert!(positions.bytes().shares_storage_with(asset.binary_chunk().unwrap()));

    let indices = block_on(asset.accessor_data(1)).unwrap();
    assert_eq!(indices.to_u32_vec().unwrap(), vec![0, 1, 2]);
    assert_eq!(files.total_reads(), 0);

    let normals = block_on(asset.accessor_data(2)).unwrap();
    assert_eq!(normals.to_f32_vec()[2], 1.0);
    assert_eq!(files.reads("assets/normals.bin"), 1);
}

#[test]
fn buffer_zero_is_trimmed_to_its_declared_length() {
    let files = CountingProvider::new();
    let asset = mixed_asset(&files, 42);

    assert_eq!(asset.binary_chunk().unwrap().len(), 44);
    let buffer = block_on(asset.buffer_data(0)).unwrap();
    assert_eq!(buffer.len(), 42);
    assert_eq!(buffer.storage_offset(), asset.binary_chunk().unwrap().storage_offset());
}

#[test]
fn chunk_shorter_than_buffer_zero_is_structural() {
    let files = CountingProvider::new();
    let asset = mixed_asset(&files, 36);

    let err = block_on(asset.buffer_data(0)).unwrap_err();
    assert!(matches!(err, GltfError::Structural(ref m) if m.contains("declares 42")));
}

#[test]
fn prefetch_all_resolves_every_buffer() {
    let files = CountingProvider::new().with("assets/normals.bin", vec![0; 36]);
    let asset = mixed_asset(&files, 42);

    block_on(asset.prefetch_all()).unwrap();
    assert!(asset.cached_buffer(0).is_some());
    assert!(asset.cached_buffer(1).is_some());
    assert_eq!(files.reads("assets/normals.bin"), 1);
}
