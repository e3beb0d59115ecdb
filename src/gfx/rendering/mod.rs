// src/gfx/rendering/mod.rs
//! wgpu backend
//!
//! Turns the bind-and-draw calls of [`GraphicsContext`](crate::gfx::GraphicsContext)
//! into cached pipelines and one render pass per frame.

pub mod pipeline_manager;
pub mod render_engine;
pub mod uniform_arena;

pub use pipeline_manager::{PipelineKey, PipelineManager};
pub use render_engine::RenderEngine;
pub use uniform_arena::{UniformArena, UniformSlice};
