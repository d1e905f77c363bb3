//! Accessor layout tables, element extraction and the sparse overlay.

use std::fmt;
use std::mem::size_of;
use std::str::FromStr;

use bytemuck::Pod;

use super::buffer::BufferData;
use super::error::GltfError;
use super::types::{Accessor, Sparse};

/// `accessor.componentType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    /// The numeric code used in glTF JSON.
    pub fn code(self) -> u32 {
        match self {
            Self::I8 => 5120,
            Self::U8 => 5121,
            Self::I16 => 5122,
            Self::U16 => 5123,
            Self::U32 => 5125,
            Self::F32 => 5126,
        }
    }

    pub fn byte_width(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }

    pub fn is_unsigned_integer(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32)
    }
}

impl TryFrom<u32> for ComponentType {
    type Error = GltfError;

    fn try_from(code: u32) -> Result<Self, GltfError> {
        match code {
            5120 => Ok(Self::I8),
            5121 => Ok(Self::U8),
            5122 => Ok(Self::I16),
            5123 => Ok(Self::U16),
            5125 => Ok(Self::U32),
            5126 => Ok(Self::F32),
            other => Err(GltfError::structural(format!(
                "unknown component type {other}"
            ))),
        }
    }
}

/// `accessor.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl AccessorType {
    /// Number of components per element.
    pub fn components(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "SCALAR",
            Self::Vec2 => "VEC2",
            Self::Vec3 => "VEC3",
            Self::Vec4 => "VEC4",
            Self::Mat2 => "MAT2",
            Self::Mat3 => "MAT3",
            Self::Mat4 => "MAT4",
        }
    }
}

impl FromStr for AccessorType {
    type Err = GltfError;

    fn from_str(s: &str) -> Result<Self, GltfError> {
        match s {
            "SCALAR" => Ok(Self::Scalar),
            "VEC2" => Ok(Self::Vec2),
            "VEC3" => Ok(Self::Vec3),
            "VEC4" => Ok(Self::Vec4),
            "MAT2" => Ok(Self::Mat2),
            "MAT3" => Ok(Self::Mat3),
            "MAT4" => Ok(Self::Mat4),
            other => Err(GltfError::structural(format!(
                "unknown accessor type {other:?}"
            ))),
        }
    }
}

impl fmt::Display for AccessorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The validated shape of an accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AccessorLayout {
    pub component_type: ComponentType,
    pub accessor_type: AccessorType,
    pub count: usize,
    pub normalized: bool,
}

impl AccessorLayout {
    pub fn from_accessor(index: usize, accessor: &Accessor) -> Result<Self, GltfError> {
        let component_type = ComponentType::try_from(accessor.component_type)
            .map_err(|e| GltfError::structural(format!("accessor {index}: {e}")))?;
        let accessor_type = accessor
            .type_
            .parse::<AccessorType>()
            .map_err(|e| GltfError::structural(format!("accessor {index}: {e}")))?;
        Ok(Self {
            component_type,
            accessor_type,
            count: accessor.count,
            normalized: accessor.normalized,
        })
    }

    pub fn element_size(&self) -> usize {
        self.component_type.byte_width() * self.accessor_type.components()
    }

    /// Size of the tightly packed data.
    pub fn byte_len(&self) -> Result<usize, GltfError> {
        self.element_size()
            .checked_mul(self.count)
            .ok_or_else(|| GltfError::structural("accessor size overflows"))
    }
}

/// Pull `layout.count` elements out of a buffer view.
///
/// Tightly packed data is returned as a sub-view of `view`; interleaved data
/// (a `byteStride` larger than one element) is gathered into a packed copy.
pub(crate) fn extract_elements(
    index: usize,
    layout: &AccessorLayout,
    view: &BufferData,
    byte_offset: usize,
    byte_stride: Option<usize>,
) -> Result<BufferData, GltfError> {
    let element_size = layout.element_size();
    let stride = byte_stride.unwrap_or(element_size);
    if stride < element_size {
        return Err(GltfError::structural(format!(
            "accessor {index}: byteStride {stride} is smaller than the element size {element_size}"
        )));
    }

    let out_of_bounds = || {
        GltfError::structural(format!(
            "accessor {index}: {} elements at offset {byte_offset} (stride {stride}) exceed the {}-byte buffer view",
            layout.count,
            view.len()
        ))
    };

    if layout.count == 0 {
        return view.slice(byte_offset, 0).ok_or_else(out_of_bounds);
    }

    let span = stride
        .checked_mul(layout.count - 1)
        .and_then(|n| n.checked_add(element_size))
        .ok_or_else(out_of_bounds)?;
    let region = view.slice(byte_offset, span).ok_or_else(out_of_bounds)?;

    if stride == element_size {
        return Ok(region);
    }

    let mut packed = Vec::with_capacity(element_size * layout.count);
    for element in region.chunks(stride) {
        packed.extend_from_slice(&element[..element_size]);
    }
    Ok(BufferData::from_vec(packed))
}

/// Overlay `sparse` onto a private copy of `base`.
///
/// `indices_view` and `values_view` are the full buffer views named by the
/// sparse descriptor; their own `byteOffset`s are applied here.
pub(crate) fn apply_sparse(
    index: usize,
    layout: &AccessorLayout,
    base: &BufferData,
    sparse: &Sparse,
    indices_view: &BufferData,
    values_view: &BufferData,
) -> Result<BufferData, GltfError> {
    let index_type = ComponentType::try_from(sparse.indices.component_type)
        .map_err(|e| GltfError::structural(format!("accessor {index} sparse indices: {e}")))?;
    if !index_type.is_unsigned_integer() {
        return Err(GltfError::structural(format!(
            "accessor {index}: sparse indices must be an unsigned integer type, got {}",
            sparse.indices.component_type
        )));
    }

    let index_bytes = sparse
        .count
        .checked_mul(index_type.byte_width())
        .and_then(|len| indices_view.slice(sparse.indices.byte_offset.unwrap_or(0), len))
        .ok_or_else(|| {
            GltfError::structural(format!(
                "accessor {index}: sparse indices view is too small for {} entries",
                sparse.count
            ))
        })?;

    let element_size = layout.element_size();
    let values = sparse
        .count
        .checked_mul(element_size)
        .and_then(|len| values_view.slice(sparse.values.byte_offset.unwrap_or(0), len))
        .ok_or_else(|| {
            GltfError::structural(format!(
                "accessor {index}: sparse values view is too small for {} elements",
                sparse.count
            ))
        })?;

    let mut patched = base.to_vec();
    let targets = index_bytes.chunks_exact(index_type.byte_width());
    for (value, target) in values.chunks_exact(element_size).zip(targets) {
        let target = read_unsigned(index_type, target);
        if target >= layout.count {
            return Err(GltfError::structural(format!(
                "accessor {index}: sparse index {target} out of range ({} elements)",
                layout.count
            )));
        }
        let start = target * element_size;
        patched[start..start + element_size].copy_from_slice(value);
    }

    log::trace!("accessor {index}: applied {} sparse elements", sparse.count);
    Ok(BufferData::from_vec(patched))
}

fn read_unsigned(component_type: ComponentType, bytes: &[u8]) -> usize {
    match component_type {
        ComponentType::U8 => bytes[0] as usize,
        ComponentType::U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as usize,
        _ => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize,
    }
}

/// The resolved data of one accessor.
///
/// Holds exactly `count` tightly packed elements in little-endian layout.
#[derive(Debug, Clone)]
pub struct AccessorData {
    component_type: ComponentType,
    accessor_type: AccessorType,
    count: usize,
    normalized: bool,
    data: BufferData,
}

impl AccessorData {
    pub(crate) fn new(layout: AccessorLayout, data: BufferData) -> Self {
        Self {
            component_type: layout.component_type,
            accessor_type: layout.accessor_type,
            count: layout.count,
            normalized: layout.normalized,
            data,
        }
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn accessor_type(&self) -> AccessorType {
        self.accessor_type
    }

    /// Number of elements.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn normalized(&self) -> bool {
        self.normalized
    }

    pub fn element_size(&self) -> usize {
        self.component_type.byte_width() * self.accessor_type.components()
    }

    /// The packed bytes.
    pub fn bytes(&self) -> &BufferData {
        &self.data
    }

    pub fn into_bytes(self) -> BufferData {
        self.data
    }

    /// Reinterpret the data as a sequence of `T`.
    ///
    /// `T` must be as wide as one component (`read::<f32>()`) or one element
    /// (`read::<[f32; 3]>()`).
    pub fn read<T: Pod>(&self) -> Result<Vec<T>, GltfError> {
        let width = size_of::<T>();
        if width != self.component_type.byte_width() && width != self.element_size() {
            return Err(GltfError::structural(format!(
                "cannot read {} {} data as a {width}-byte type",
                self.accessor_type,
                self.component_type.code()
            )));
        }
        Ok(self
            .data
            .chunks_exact(width)
            .map(bytemuck::pod_read_unaligned)
            .collect())
    }

    /// Every component widened to `f32`, applying normalization when the
    /// accessor is `normalized`.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        let width = self.component_type.byte_width();
        self.data
            .chunks_exact(width)
            .map(|c| component_to_f32(self.component_type, self.normalized, c))
            .collect()
    }

    /// Every component as `u32`. Only unsigned integer data (indices) qualifies.
    pub fn to_u32_vec(&self) -> Result<Vec<u32>, GltfError> {
        if !self.component_type.is_unsigned_integer() {
            return Err(GltfError::structural(format!(
                "component type {} is not an unsigned integer",
                self.component_type.code()
            )));
        }
        let width = self.component_type.byte_width();
        Ok(self
            .data
            .chunks_exact(width)
            .map(|c| read_unsigned(self.component_type, c) as u32)
            .collect())
    }
}

fn component_to_f32(component_type: ComponentType, normalized: bool, bytes: &[u8]) -> f32 {
    match component_type {
        ComponentType::I8 => {
            let v = bytes[0] as i8 as f32;
            if normalized { (v / 127.0).max(-1.0) } else { v }
        }
        ComponentType::U8 => {
            let v = bytes[0] as f32;
            if normalized { v / 255.0 } else { v }
        }
        ComponentType::I16 => {
            let v = i16::from_le_bytes([bytes[0], bytes[1]]) as f32;
            if normalized { (v / 32767.0).max(-1.0) } else { v }
        }
        ComponentType::U16 => {
            let v = u16::from_le_bytes([bytes[0], bytes[1]]) as f32;
            if normalized { v / 65535.0 } else { v }
        }
        ComponentType::U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
        ComponentType::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gltf::types::{SparseIndices, SparseValues};

    fn layout(component_type: ComponentType, accessor_type: AccessorType, count: usize) -> AccessorLayout {
        AccessorLayout {
            component_type,
            accessor_type,
            count,
            normalized: false,
        }
    }

    fn f32_bytes(values: &[f32]) -> Vec<u8> {
        bytemuck::cast_slice(values).to_vec()
    }

    #[test]
    fn type_tables() {
        assert_eq!(ComponentType::try_from(5123).unwrap(), ComponentType::U16);
        assert_eq!(ComponentType::U16.byte_width(), 2);
        assert!(ComponentType::try_from(5124).is_err());
        assert_eq!("MAT3".parse::<AccessorType>().unwrap().components(), 9);
        assert_eq!("MAT2".parse::<AccessorType>().unwrap().components(), 4);
        assert!("VEC5".parse::<AccessorType>().is_err());
    }

    #[test]
    fn unknown_type_is_structural() {
        let accessor: Accessor = serde_json::from_str(
            r#"{"componentType": 5126, "count": 1, "type": "vec3"}"#,
        )
        .unwrap();
        let err = AccessorLayout::from_accessor(2, &accessor).unwrap_err();
        assert!(matches!(err, GltfError::Structural(ref m) if m.contains("accessor 2")));
    }

    #[test]
    fn packed_extraction_is_zero_copy() {
        let view = BufferData::from_vec(f32_bytes(&[0.0, 1.0, 2.0, 3.0, 4.0]));
        let l = layout(ComponentType::F32, AccessorType::Vec2, 2);
        let data = extract_elements(0, &l, &view, 4, None).unwrap();

        assert!(data.shares_storage_with(&view));
        assert_eq!(data.storage_offset(), 4);
        assert_eq!(data.len(), 16);
    }

    #[test]
    fn interleaved_extraction_packs_elements() {
        // position (VEC3) + u16 pair, stride 16
        let mut bytes = Vec::new();
        for i in 0..3 {
            bytes.extend(f32_bytes(&[i as f32, 0.5, -1.0]));
            bytes.extend([0xAA, 0xBB, 0xCC, 0xDD]);
        }
        let view = BufferData::from_vec(bytes);
        let l = layout(ComponentType::F32, AccessorType::Vec3, 3);
        let data = AccessorData::new(l, extract_elements(0, &l, &view, 0, Some(16)).unwrap());

        assert_eq!(data.bytes().len(), 36);
        assert_eq!(
            data.read::<[f32; 3]>().unwrap(),
            vec![[0.0, 0.5, -1.0], [1.0, 0.5, -1.0], [2.0, 0.5, -1.0]]
        );
    }

    #[test]
    fn last_strided_element_needs_only_its_own_bytes() {
        let view = BufferData::from_vec(vec![1, 2, 0, 0, 3, 4]);
        let l = layout(ComponentType::U8, AccessorType::Vec2, 2);
        let data = extract_elements(0, &l, &view, 0, Some(4)).unwrap();
        assert_eq!(data.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn extraction_bounds() {
        let view = BufferData::from_vec(vec![0; 12]);
        let l = layout(ComponentType::F32, AccessorType::Vec3, 1);
        assert!(extract_elements(0, &l, &view, 4, None).is_err());
        assert!(extract_elements(0, &l, &view, 0, Some(8)).is_err());
        assert!(extract_elements(0, &l, &view, 0, None).is_ok());
    }

    #[test]
    fn sparse_overlay_patches_a_copy() {
        let base = BufferData::from_vec(vec![0; 4]);
        let sparse = Sparse {
            count: 2,
            indices: SparseIndices {
                buffer_view: 0,
                byte_offset: Some(1),
                component_type: 5121,
            },
            values: SparseValues {
                buffer_view: 1,
                byte_offset: None,
            },
        };
        let indices = BufferData::from_vec(vec![99, 3, 1]);
        let values = BufferData::from_vec(vec![7, 9]);
        let l = layout(ComponentType::U8, AccessorType::Scalar, 4);

        let patched = apply_sparse(0, &l, &base, &sparse, &indices, &values).unwrap();

        assert_eq!(patched.as_slice(), &[0, 9, 0, 7]);
        assert_eq!(base.as_slice(), &[0, 0, 0, 0]);
        assert!(!patched.shares_storage_with(&base));
    }

    #[test]
    fn sparse_rejects_signed_and_out_of_range_indices() {
        let base = BufferData::zeroed(4).unwrap();
        let mut sparse = Sparse {
            count: 1,
            indices: SparseIndices {
                buffer_view: 0,
                byte_offset: None,
                component_type: 5120,
            },
            values: SparseValues {
                buffer_view: 1,
                byte_offset: None,
            },
        };
        let l = layout(ComponentType::U8, AccessorType::Scalar, 4);
        let values = BufferData::from_vec(vec![1]);

        let signed = apply_sparse(0, &l, &base, &sparse, &BufferData::from_vec(vec![0]), &values);
        assert!(matches!(signed, Err(GltfError::Structural(_))));

        sparse.indices.component_type = 5121;
        let too_far = apply_sparse(0, &l, &base, &sparse, &BufferData::from_vec(vec![4]), &values);
        assert!(matches!(too_far, Err(GltfError::Structural(_))));

        let short = apply_sparse(0, &l, &base, &sparse, &BufferData::from_vec(vec![]), &values);
        assert!(matches!(short, Err(GltfError::Structural(_))));
    }

    #[test]
    fn typed_readers() {
        let l = AccessorLayout {
            component_type: ComponentType::U8,
            accessor_type: AccessorType::Vec2,
            count: 2,
            normalized: true,
        };
        let data = AccessorData::new(l, BufferData::from_vec(vec![0, 255, 51, 102]));

        let floats = data.to_f32_vec();
        assert_eq!(&floats[..2], &[0.0, 1.0]);
        assert!((floats[2] - 0.2).abs() < 1e-6);
        assert!((floats[3] - 0.4).abs() < 1e-6);
        assert_eq!(data.to_u32_vec().unwrap(), vec![0, 255, 51, 102]);
        assert_eq!(data.read::<[u8; 2]>().unwrap(), vec![[0, 255], [51, 102]]);
        assert!(data.read::<u32>().is_err());
    }

    #[test]
    fn signed_normalization_clamps() {
        let l = AccessorLayout {
            component_type: ComponentType::I8,
            accessor_type: AccessorType::Scalar,
            count: 2,
            normalized: true,
        };
        let data = AccessorData::new(l, BufferData::from_vec(vec![0x80, 0x7F]));
        assert_eq!(data.to_f32_vec(), vec![-1.0, 1.0]);
        assert!(data.to_u32_vec().is_err());
    }
}
