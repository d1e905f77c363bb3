//! glTF-Binary (`.glb`) container decoding.
//!
//! ```text
//! header:  magic "glTF" | version u32 | totalLength u32
//! chunk*:  chunkLength u32 | chunkType u32 | payload[chunkLength]
//! ```
//!
//! All integers are little-endian.

use std::sync::Arc;

use super::buffer::BufferData;
use super::error::GltfError;

/// The four bytes every GLB container starts with.
pub const GLB_MAGIC: [u8; 4] = *b"glTF";
/// Chunk type of the JSON chunk (`"JSON"`).
pub const CHUNK_JSON: u32 = 0x4E4F534A;
/// Chunk type of the binary chunk (`"BIN\0"`).
pub const CHUNK_BIN: u32 = 0x004E4942;

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

/// Whether `bytes` look like a GLB container.
pub fn is_glb(bytes: &[u8]) -> bool {
    bytes.starts_with(&GLB_MAGIC)
}

/// A decoded GLB container.
#[derive(Debug, Clone)]
pub struct GlbContainer {
    pub version: u32,
    /// Text of the JSON chunk, including any trailing padding spaces.
    pub json: String,
    /// The binary chunk, sharing storage with the container bytes.
    pub bin: Option<BufferData>,
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// Split a GLB container into its JSON text and binary chunk.
///
/// Unknown chunk types are skipped. If a chunk type repeats, the last one
/// wins.
pub fn decode_glb(data: impl Into<Arc<[u8]>>) -> Result<GlbContainer, GltfError> {
    let data: Arc<[u8]> = data.into();

    if data.len() < HEADER_LEN {
        return Err(GltfError::Format(format!(
            "{} bytes is too short for a GLB header",
            data.len()
        )));
    }
    if !is_glb(&data) {
        return Err(GltfError::Format("bad magic".into()));
    }
    let version = read_u32(&data, 4);
    if version < 2 {
        return Err(GltfError::Format(format!(
            "GLB version {version} is not supported"
        )));
    }
    let total_length = read_u32(&data, 8) as usize;
    if total_length < HEADER_LEN {
        return Err(GltfError::Format(format!(
            "declared length {total_length} is smaller than the header"
        )));
    }
    if total_length > data.len() {
        return Err(GltfError::Format(format!(
            "declared length {total_length} exceeds the {} bytes available",
            data.len()
        )));
    }
    if total_length < data.len() {
        log::debug!(
            "ignoring {} bytes after the declared GLB length",
            data.len() - total_length
        );
    }

    let mut json = None;
    let mut bin = None;
    let mut cursor = HEADER_LEN;

    while cursor < total_length {
        if total_length - cursor < CHUNK_HEADER_LEN {
            return Err(GltfError::Format(format!(
                "truncated chunk header at offset {cursor}"
            )));
        }
        let chunk_length = read_u32(&data, cursor) as usize;
        let chunk_type = read_u32(&data, cursor + 4);
        let start = cursor + CHUNK_HEADER_LEN;
        let end = start
            .checked_add(chunk_length)
            .filter(|&end| end <= total_length)
            .ok_or_else(|| {
                GltfError::Format(format!(
                    "chunk at offset {cursor} ({chunk_length} bytes) runs past the end of the container"
                ))
            })?;

        match chunk_type {
            CHUNK_JSON => {
                let text = std::str::from_utf8(&data[start..end])
                    .map_err(|e| GltfError::Format(format!("JSON chunk is not UTF-8: {e}")))?;
                json = Some(text.to_owned());
            }
            CHUNK_BIN => bin = BufferData::from_shared(data.clone(), start, chunk_length),
            other => log::debug!("skipping unknown GLB chunk type {other:#010x}"),
        }
        cursor = end;
    }

    let json = json.ok_or_else(|| GltfError::Format("missing JSON chunk".into()))?;
    Ok(GlbContainer { version, json, bin })
}
