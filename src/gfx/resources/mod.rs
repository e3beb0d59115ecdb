// src/gfx/resources/mod.rs
//! GPU resources owned by the wgpu backend

pub mod texture_resource;

pub use texture_resource::{create_material_sampler, TextureResource};
