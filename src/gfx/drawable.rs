//! # Drawables and the static binding registry
//!
//! A drawable owns a [`BindingSet`]: its own per-instance bindables plus an
//! optional reference to the [`StaticBindings`] shared by every drawable of
//! the same kind. Submitting activates instance bindables, then static ones,
//! then issues one indexed draw.
//!
//! ## Static sharing
//!
//! The first instance of a kind builds the kind-invariant state (geometry,
//! shaders, input layout, fixed-function state) and registers it, including
//! its index buffer, in the [`StaticBindingRegistry`]. Later instances get the
//! same `Arc` back and reuse the registered index buffer.
//!
//! ```no_run
//! # use trellis::gfx::{drawable::*, recording::RecordingContext, GraphicsContext};
//! # fn build(ctx: &mut dyn GraphicsContext, registry: &mut StaticBindingRegistry) -> trellis::Result<()> {
//! struct Marker;
//! let (statics, first) = registry.get_or_try_init(DrawableKind::of::<Marker>(), || {
//!     // create geometry and shaders once
//!     Ok::<_, trellis::SceneError>(StaticBindings::new(Vec::new()))
//! })?;
//! # Ok(()) }
//! ```

use std::{any::TypeId, collections::HashMap, sync::Arc};

use cgmath::Matrix4;

use super::{
    bindable::{Bindable, ConstantBuffer, IndexBuffer},
    context::{GraphicsContext, ShaderStage},
};
use crate::error::{GfxResult, Result, SceneError};

/// Something that can issue a draw call
pub trait Drawable {
    fn bindings(&self) -> &BindingSet;

    /// World matrix used by the transform buffer
    fn transform(&self) -> Matrix4<f32>;

    fn submit(&self, ctx: &mut dyn GraphicsContext) -> GfxResult<()> {
        self.bindings().submit(ctx, &self.transform())
    }
}

/// Key identifying a drawable type in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawableKind {
    type_id: TypeId,
    name: &'static str,
}

impl DrawableKind {
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Bindables shared by every instance of a drawable kind
#[derive(Debug)]
pub struct StaticBindings {
    binds: Vec<Bindable>,
}

impl StaticBindings {
    pub fn new(binds: Vec<Bindable>) -> Self {
        Self { binds }
    }

    pub fn binds(&self) -> &[Bindable] {
        &self.binds
    }

    /// The shared index buffer, if the kind registered one
    pub fn index_buffer(&self) -> Option<&IndexBuffer> {
        self.binds.iter().find_map(Bindable::as_index_buffer)
    }
}

/// Per-kind cache of [`StaticBindings`]
///
/// Owned by the rendering subsystem; [`clear`](Self::clear) drops the
/// registry's references, while instances keep theirs until dropped.
#[derive(Debug, Default)]
pub struct StaticBindingRegistry {
    entries: HashMap<DrawableKind, Arc<StaticBindings>>,
}

impl StaticBindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self, kind: DrawableKind) -> bool {
        self.entries.contains_key(&kind)
    }

    pub fn get(&self, kind: DrawableKind) -> Option<Arc<StaticBindings>> {
        self.entries.get(&kind).cloned()
    }

    /// Returns the bindings for `kind`, running `init` only if the kind has
    /// not been registered yet. The flag is true when `init` ran.
    ///
    /// If `init` fails nothing is registered and the next call retries.
    pub fn get_or_try_init<E>(
        &mut self,
        kind: DrawableKind,
        init: impl FnOnce() -> std::result::Result<StaticBindings, E>,
    ) -> std::result::Result<(Arc<StaticBindings>, bool), E> {
        if let Some(existing) = self.entries.get(&kind) {
            return Ok((existing.clone(), false));
        }

        let bindings = Arc::new(init()?);
        log::debug!(
            "Registered {} static bindables for {}",
            bindings.binds.len(),
            kind.name
        );
        self.entries.insert(kind, bindings.clone());
        Ok((bindings, true))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexRef {
    Instance(usize),
    Static(usize),
}

/// Ordered pipeline state of one drawable
#[derive(Debug)]
pub struct BindingSet {
    name: String,
    instance: Vec<Bindable>,
    statics: Option<Arc<StaticBindings>>,
    index: IndexRef,
}

impl BindingSet {
    pub fn builder(name: impl Into<String>) -> BindingSetBuilder {
        BindingSetBuilder {
            name: name.into(),
            instance: Vec::new(),
            statics: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instance_binds(&self) -> &[Bindable] {
        &self.instance
    }

    pub fn statics(&self) -> Option<&Arc<StaticBindings>> {
        self.statics.as_ref()
    }

    pub fn index_buffer(&self) -> &IndexBuffer {
        let bindable = match self.index {
            IndexRef::Instance(i) => &self.instance[i],
            IndexRef::Static(i) => match &self.statics {
                Some(statics) => &statics.binds[i],
                None => unreachable!("static index reference without static bindings"),
            },
        };
        match bindable.as_index_buffer() {
            Some(ib) => ib,
            None => unreachable!("index reference does not point at an index buffer"),
        }
    }

    pub fn index_count(&self) -> u32 {
        self.index_buffer().count()
    }

    /// Finds a constant buffer by stage and slot, instance bindables first
    pub fn constant_buffer(&self, stage: ShaderStage, slot: u32) -> Option<&ConstantBuffer> {
        let statics = self.statics.iter().flat_map(|s| s.binds.iter());
        self.instance
            .iter()
            .chain(statics)
            .filter_map(Bindable::as_constant_buffer)
            .find(|cb| cb.stage() == stage && cb.slot() == slot)
    }

    /// Activates every bindable (instance, then static) and draws
    pub fn submit(&self, ctx: &mut dyn GraphicsContext, transform: &Matrix4<f32>) -> GfxResult<()> {
        for bindable in &self.instance {
            bindable.activate(ctx, transform)?;
        }
        if let Some(statics) = &self.statics {
            for bindable in &statics.binds {
                bindable.activate(ctx, transform)?;
            }
        }
        ctx.draw_indexed(self.index_count())
    }
}

pub struct BindingSetBuilder {
    name: String,
    instance: Vec<Bindable>,
    statics: Option<Arc<StaticBindings>>,
}

impl BindingSetBuilder {
    pub fn bind(mut self, bindable: impl Into<Bindable>) -> Self {
        self.instance.push(bindable.into());
        self
    }

    pub fn push(&mut self, bindable: impl Into<Bindable>) {
        self.instance.push(bindable.into());
    }

    pub fn with_statics(mut self, statics: Arc<StaticBindings>) -> Self {
        self.statics = Some(statics);
        self
    }

    /// Resolves the index buffer and freezes the set
    ///
    /// An instance index buffer takes precedence over a static one. A set with
    /// neither is rejected.
    pub fn build(self) -> Result<BindingSet> {
        let instance_index = self
            .instance
            .iter()
            .position(|b| b.as_index_buffer().is_some())
            .map(IndexRef::Instance);
        let static_index = || {
            self.statics.as_ref().and_then(|s| {
                s.binds
                    .iter()
                    .position(|b| b.as_index_buffer().is_some())
                    .map(IndexRef::Static)
            })
        };

        let index = instance_index
            .or_else(static_index)
            .ok_or_else(|| SceneError::MissingIndexBuffer(self.name.clone()))?;

        Ok(BindingSet {
            name: self.name,
            instance: self.instance,
            statics: self.statics,
            index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        bindable::{PixelShader, VertexBuffer, VertexShader, InputLayout},
        context::ShaderProgram,
        recording::{Command, RecordingContext},
        vertex::{ElementType, VertexData, VertexLayout},
    };
    use cgmath::SquareMatrix;

    const PROGRAM: ShaderProgram = ShaderProgram {
        name: "test",
        source: "",
        entry_point: "main",
    };

    struct Triangle;

    fn triangle_statics(ctx: &mut RecordingContext) -> StaticBindings {
        let layout = VertexLayout::new().append(ElementType::Position3D);
        let mut data = VertexData::new(layout.clone());
        for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            data.emplace_back(&[&p]);
        }
        let vs = VertexShader::new(ctx, PROGRAM).unwrap();
        let il = InputLayout::new(ctx, layout, &vs).unwrap();
        StaticBindings::new(vec![
            VertexBuffer::new(ctx, &data).unwrap().into(),
            IndexBuffer::new(ctx, &[0, 1, 2]).unwrap().into(),
            vs.into(),
            PixelShader::new(ctx, PROGRAM).unwrap().into(),
            il.into(),
        ])
    }

    #[test]
    fn test_build_without_index_buffer_fails() {
        let mut ctx = RecordingContext::new();
        let result = BindingSet::builder("empty")
            .bind(PixelShader::new(&mut ctx, PROGRAM).unwrap())
            .build();
        assert!(matches!(result, Err(SceneError::MissingIndexBuffer(name)) if name == "empty"));
    }

    #[test]
    fn test_index_resolves_from_statics() {
        let mut ctx = RecordingContext::new();
        let statics = Arc::new(triangle_statics(&mut ctx));
        let set = BindingSet::builder("triangle")
            .with_statics(statics)
            .build()
            .unwrap();
        assert_eq!(set.index_count(), 3);
    }

    #[test]
    fn test_registry_initializes_once_per_kind() {
        let mut ctx = RecordingContext::new();
        let mut registry = StaticBindingRegistry::new();
        let kind = DrawableKind::of::<Triangle>();
        let mut runs = 0;

        let (first, created) = registry
            .get_or_try_init(kind, || {
                runs += 1;
                Ok::<_, SceneError>(triangle_statics(&mut ctx))
            })
            .unwrap();
        assert!(created);
        let (second, created) = registry
            .get_or_try_init(kind, || {
                runs += 1;
                Ok::<_, SceneError>(triangle_statics(&mut ctx))
            })
            .unwrap();

        assert!(!created);
        assert_eq!(runs, 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_failed_init_is_not_registered() {
        let mut registry = StaticBindingRegistry::new();
        let kind = DrawableKind::of::<Triangle>();
        let result = registry.get_or_try_init(kind, || Err::<StaticBindings, _>("boom"));
        assert!(result.is_err());
        assert!(!registry.is_initialized(kind));
    }

    #[test]
    fn test_submit_draws_with_resolved_count() {
        let mut ctx = RecordingContext::new();
        let statics = Arc::new(triangle_statics(&mut ctx));
        let set = BindingSet::builder("triangle")
            .with_statics(statics.clone())
            .build()
            .unwrap();

        set.submit(&mut ctx, &Matrix4::identity()).unwrap();

        let draws: Vec<_> = ctx.draw_calls().collect();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].index_count, 3);
        assert_eq!(
            draws[0].bound.index_buffer,
            statics.index_buffer().map(|ib| ib.id())
        );
        assert!(matches!(ctx.commands()[0], Command::Draw(_)));
    }
}
