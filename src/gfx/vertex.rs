//! # Dynamic Vertex Layouts
//!
//! Meshes pick their vertex format at import time depending on which material
//! permutation they end up in, so the layout is described at runtime instead of
//! with one `#[repr(C)]` struct per format.
//!
//! ```no_run
//! use trellis::gfx::vertex::{ElementType, VertexData, VertexLayout};
//!
//! let layout = VertexLayout::new()
//!     .append(ElementType::Position3D)
//!     .append(ElementType::Normal);
//! let mut vertices = VertexData::new(layout);
//! vertices.emplace_back(&[&[0.0, 1.0, 0.0], &[0.0, 1.0, 0.0]]);
//! ```

/// One per-vertex attribute. Every element is made of `f32` components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Position3D,
    Normal,
    Tangent,
    Bitangent,
    Texture2D,
}

impl ElementType {
    /// Number of `f32` components in this element
    pub fn components(self) -> usize {
        match self {
            ElementType::Texture2D => 2,
            _ => 3,
        }
    }

    /// Size in bytes
    pub fn size(self) -> usize {
        self.components() * std::mem::size_of::<f32>()
    }

    pub fn format(self) -> wgpu::VertexFormat {
        match self {
            ElementType::Texture2D => wgpu::VertexFormat::Float32x2,
            _ => wgpu::VertexFormat::Float32x3,
        }
    }

    pub fn semantic(self) -> &'static str {
        match self {
            ElementType::Position3D => "position",
            ElementType::Normal => "normal",
            ElementType::Tangent => "tangent",
            ElementType::Bitangent => "bitangent",
            ElementType::Texture2D => "uv",
        }
    }
}

/// Ordered list of vertex elements
///
/// Shader locations are assigned in append order, so a layout of
/// `Position3D, Normal, Texture2D` feeds `@location(0)`, `@location(1)` and
/// `@location(2)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    elements: Vec<ElementType>,
}

impl VertexLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(mut self, element: ElementType) -> Self {
        self.elements.push(element);
        self
    }

    pub fn elements(&self) -> &[ElementType] {
        &self.elements
    }

    pub fn has(&self, element: ElementType) -> bool {
        self.elements.contains(&element)
    }

    /// Bytes between consecutive vertices
    pub fn stride(&self) -> usize {
        self.elements.iter().map(|e| e.size()).sum()
    }

    /// Byte offset of `element` inside one vertex
    pub fn offset_of(&self, element: ElementType) -> Option<usize> {
        let mut offset = 0;
        for e in &self.elements {
            if *e == element {
                return Some(offset);
            }
            offset += e.size();
        }
        None
    }

    /// Returns the wgpu attribute list for this layout
    pub fn attributes(&self) -> Vec<wgpu::VertexAttribute> {
        let mut offset = 0;
        self.elements
            .iter()
            .enumerate()
            .map(|(location, element)| {
                let attribute = wgpu::VertexAttribute {
                    offset: offset as wgpu::BufferAddress,
                    shader_location: location as u32,
                    format: element.format(),
                };
                offset += element.size();
                attribute
            })
            .collect()
    }
}

/// CPU-side interleaved vertex storage matching a [`VertexLayout`]
#[derive(Debug, Clone)]
pub struct VertexData {
    layout: VertexLayout,
    data: Vec<f32>,
}

impl VertexData {
    pub fn new(layout: VertexLayout) -> Self {
        Self {
            layout,
            data: Vec::new(),
        }
    }

    pub fn with_capacity(layout: VertexLayout, vertices: usize) -> Self {
        let floats = layout.stride() / std::mem::size_of::<f32>() * vertices;
        Self {
            layout,
            data: Vec::with_capacity(floats),
        }
    }

    /// Appends one vertex. `attributes` must follow the layout order.
    ///
    /// # Panics
    /// Panics if the number of attributes or their component counts do not
    /// match the layout.
    pub fn emplace_back(&mut self, attributes: &[&[f32]]) {
        assert_eq!(
            attributes.len(),
            self.layout.elements.len(),
            "vertex attribute count does not match layout"
        );
        for (element, values) in self.layout.elements.iter().zip(attributes) {
            assert_eq!(
                values.len(),
                element.components(),
                "wrong component count for {}",
                element.semantic()
            );
            self.data.extend_from_slice(values);
        }
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        let floats_per_vertex = self.layout.stride() / std::mem::size_of::<f32>();
        if floats_per_vertex == 0 {
            0
        } else {
            self.data.len() / floats_per_vertex
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_textured() -> VertexLayout {
        VertexLayout::new()
            .append(ElementType::Position3D)
            .append(ElementType::Normal)
            .append(ElementType::Texture2D)
    }

    #[test]
    fn test_stride_and_offsets() {
        let layout = lit_textured();
        assert_eq!(layout.stride(), 32);
        assert_eq!(layout.offset_of(ElementType::Normal), Some(12));
        assert_eq!(layout.offset_of(ElementType::Texture2D), Some(24));
        assert_eq!(layout.offset_of(ElementType::Tangent), None);
    }

    #[test]
    fn test_attribute_locations_follow_append_order() {
        let attributes = lit_textured().attributes();
        assert_eq!(attributes.len(), 3);
        assert_eq!(attributes[2].shader_location, 2);
        assert_eq!(attributes[2].offset, 24);
        assert_eq!(attributes[2].format, wgpu::VertexFormat::Float32x2);
    }

    #[test]
    fn test_emplace_back_interleaves() {
        let mut vertices = VertexData::new(lit_textured());
        vertices.emplace_back(&[&[1.0, 2.0, 3.0], &[0.0, 0.0, 1.0], &[0.5, 0.5]]);
        vertices.emplace_back(&[&[4.0, 5.0, 6.0], &[0.0, 1.0, 0.0], &[1.0, 0.0]]);
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices.as_bytes().len(), 64);
    }

    #[test]
    #[should_panic]
    fn test_emplace_back_rejects_wrong_arity() {
        let mut vertices = VertexData::new(lit_textured());
        vertices.emplace_back(&[&[1.0, 2.0, 3.0]]);
    }
}
