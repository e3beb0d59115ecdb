//! # Graphics Module
//!
//! Everything between the scene graph and the GPU.
//!
//! ## Architecture Overview
//!
//! - **Context** ([`context`]) - the [`GraphicsContext`] trait and its binding model
//! - **Bindables** ([`bindable`]) - immutable pieces of pipeline state
//! - **Drawables** ([`drawable`], [`drawables`]) - ordered bindable lists and the
//!   per-kind static binding registry
//! - **Rendering** ([`rendering`]) - the wgpu [`RenderEngine`]
//! - **Recording** ([`recording`]) - a headless [`RecordingContext`] for tests
//! - **Camera** ([`camera`]) - fly camera and its input controller
//!
//! ## Usage
//!
//! ```no_run
//! use trellis::gfx::{GraphicsContext, RecordingContext};
//!
//! let mut ctx = RecordingContext::new();
//! ctx.begin_frame([0.0, 0.0, 0.0, 1.0]).unwrap();
//! ctx.end_frame().unwrap();
//! ```

pub mod bindable;
pub mod camera;
pub mod context;
pub mod drawable;
pub mod drawables;
pub mod geometry;
pub mod recording;
pub mod rendering;
pub mod resources;
pub mod shaders;
pub mod vertex;

pub use bindable::Bindable;
pub use camera::{Camera, CameraController};
pub use context::{DepthStencilMode, GraphicsContext, ResourceId, ShaderStage, Topology};
pub use drawable::{BindingSet, Drawable, DrawableKind, StaticBindingRegistry};
pub use recording::RecordingContext;
pub use rendering::RenderEngine;
pub use vertex::{ElementType, VertexData, VertexLayout};
