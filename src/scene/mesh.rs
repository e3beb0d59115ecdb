//! Meshes built from imported geometry and materials

use std::cell::Cell;

use cgmath::{Matrix4, SquareMatrix};

use super::{
    import::{ImportedMaterial, ImportedMesh},
    material::{MaterialConstants, MaterialScalars, ShadingPermutation},
};
use crate::{
    error::{GfxResult, Result, SceneError},
    gfx::{
        bindable::{
            ConstantBuffer, DepthStencil, IndexBuffer, InputLayout, PixelShader, Sampler, Texture,
            TransformCbuf, VertexBuffer, VertexShader,
        },
        context::{DepthStencilMode, GraphicsContext, Topology},
        drawable::{BindingSet, Drawable, DrawableKind, StaticBindingRegistry, StaticBindings},
        geometry::GeometryData,
    },
};

/// Texture slots used by the scene shaders
pub const DIFFUSE_SLOT: u32 = 0;
pub const SPECULAR_SLOT: u32 = 1;
pub const NORMAL_SLOT: u32 = 2;

/// A drawable triangle list with a classified material
///
/// The world matrix is cached when the mesh is drawn from a node so the
/// transform buffer can read it during activation.
#[derive(Debug)]
pub struct Mesh {
    name: String,
    permutation: ShadingPermutation,
    material: MaterialConstants,
    material_buffer: ConstantBuffer,
    bindings: BindingSet,
    transform: Cell<Matrix4<f32>>,
}

impl Mesh {
    /// Validates `source`, classifies `material` and creates every GPU
    /// resource the mesh needs
    ///
    /// `mesh_scale` multiplies every position. Nothing is returned on
    /// failure; resources created before the failure are simply dropped.
    pub fn build(
        ctx: &mut dyn GraphicsContext,
        registry: &mut StaticBindingRegistry,
        source: &ImportedMesh,
        material: Option<&ImportedMaterial>,
        mesh_scale: f32,
    ) -> Result<Self> {
        let default_material = ImportedMaterial::default();
        let material = material.unwrap_or(&default_material);
        let permutation = ShadingPermutation::classify(
            material.diffuse_texture.is_some(),
            material.specular_texture.is_some(),
            material.normal_texture.is_some(),
        )?;
        let layout = permutation.vertex_layout();
        let indices = validate(source, permutation)?;

        let statics = registry
            .get_or_try_init(DrawableKind::of::<Mesh>(), || {
                Ok::<_, SceneError>(StaticBindings::new(vec![Topology::TriangleList.into()]))
            })?
            .0;
        let mut builder = BindingSet::builder(source.name.clone()).with_statics(statics);

        let mut scalars = MaterialScalars::default();
        if let Some(color) = material.diffuse_color {
            scalars.diffuse_color = color;
        }
        if let Some(color) = material.specular_color {
            scalars.specular_color = color;
        }

        let mut has_texture = false;
        if let Some(path) = &material.diffuse_texture {
            builder.push(Texture::new(ctx, path, DIFFUSE_SLOT)?);
            has_texture = true;
        }
        if let Some(path) = &material.specular_texture {
            let texture = Texture::new(ctx, path, SPECULAR_SLOT)?;
            scalars.has_alpha_gloss = texture.has_alpha();
            builder.push(texture);
            has_texture = true;
        }
        if !scalars.has_alpha_gloss {
            if let Some(shininess) = material.shininess {
                scalars.shininess = shininess;
            }
        }
        if let Some(path) = &material.normal_texture {
            builder.push(Texture::new(ctx, path, NORMAL_SLOT)?);
            has_texture = true;
        }
        if has_texture {
            builder.push(Sampler::new(ctx)?);
        }

        let geometry = GeometryData {
            positions: source
                .positions
                .iter()
                .map(|p| [p[0] * mesh_scale, p[1] * mesh_scale, p[2] * mesh_scale])
                .collect(),
            normals: source.normals.clone(),
            tangents: source.tangents.clone(),
            bitangents: source.bitangents.clone(),
            tex_coords: source.tex_coords.clone(),
            indices,
        };
        builder.push(VertexBuffer::new(ctx, &geometry.to_vertex_data(&layout))?);
        builder.push(IndexBuffer::new(ctx, &geometry.indices)?);

        let (vs_program, ps_program) = permutation.shaders();
        let vs = VertexShader::new(ctx, vs_program)?;
        let input_layout = InputLayout::new(ctx, layout, &vs)?;
        builder.push(vs);
        builder.push(PixelShader::new(ctx, ps_program)?);
        builder.push(input_layout);

        let constants = MaterialConstants::new(permutation, &scalars);
        let material_buffer = constants.create_buffer(ctx)?;
        builder.push(material_buffer.clone());
        builder.push(TransformCbuf::new(ctx)?);
        builder.push(DepthStencil::new(ctx, DepthStencilMode::Off)?);

        log::debug!(
            "Built mesh '{}' ({}, {} triangles)",
            source.name,
            permutation.label(),
            geometry.triangle_count()
        );

        Ok(Self {
            name: source.name.clone(),
            permutation,
            material: constants,
            material_buffer,
            bindings: builder.build()?,
            transform: Cell::new(Matrix4::identity()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn permutation(&self) -> ShadingPermutation {
        self.permutation
    }

    pub fn material(&self) -> &MaterialConstants {
        &self.material
    }

    pub fn index_count(&self) -> u32 {
        self.bindings.index_count()
    }

    /// Caches `world` and submits the mesh
    pub fn draw(&self, ctx: &mut dyn GraphicsContext, world: Matrix4<f32>) -> GfxResult<()> {
        self.transform.set(world);
        self.submit(ctx)
    }

    /// Edits the material constants in place and uploads them
    ///
    /// The variant is fixed by the permutation; an edit that swaps it is
    /// reverted.
    pub fn update_material(
        &mut self,
        ctx: &mut dyn GraphicsContext,
        edit: impl FnOnce(&mut MaterialConstants),
    ) -> Result<()> {
        let previous = self.material;
        edit(&mut self.material);
        if std::mem::discriminant(&previous) != std::mem::discriminant(&self.material) {
            log::warn!(
                "Ignoring material edit on '{}': {} meshes keep their constant layout",
                self.name,
                self.permutation.label()
            );
            self.material = previous;
            return Ok(());
        }
        self.material.upload(ctx, &self.material_buffer)
    }

    /// Material panel; edits are uploaded immediately
    pub fn show_material_controls(
        &mut self,
        ui: &imgui::Ui,
        ctx: &mut dyn GraphicsContext,
    ) -> Result<()> {
        let _id = ui.push_id(&self.name);
        ui.text(format!("{} ({})", self.name, self.permutation.label()));
        if self.material.show_controls(ui) {
            self.material.upload(ctx, &self.material_buffer)?;
        }
        Ok(())
    }
}

impl Drawable for Mesh {
    fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    fn transform(&self) -> Matrix4<f32> {
        self.transform.get()
    }
}

/// Checks faces and per-vertex attributes; returns the flattened indices
fn validate(source: &ImportedMesh, permutation: ShadingPermutation) -> Result<Vec<u32>> {
    let vertex_count = source.vertex_count();
    let missing = |attribute| SceneError::MissingVertexAttribute {
        mesh: source.name.clone(),
        attribute,
    };

    if !source.has_normals() {
        return Err(missing("normals"));
    }
    let needs_uv = permutation != ShadingPermutation::Flat;
    if needs_uv && !source.has_tex_coords() {
        return Err(missing("texture coordinates"));
    }
    let needs_tangents = matches!(
        permutation,
        ShadingPermutation::DiffuseNormal | ShadingPermutation::DiffuseNormalSpecular
    );
    if needs_tangents && !source.has_tangents() {
        return Err(missing("tangents"));
    }

    let mut indices = Vec::with_capacity(source.faces.len() * 3);
    for (face_index, face) in source.faces.iter().enumerate() {
        if face.len() != 3 {
            return Err(SceneError::NonTriangularFace {
                mesh: source.name.clone(),
                face: face_index,
                count: face.len(),
            });
        }
        for &index in face {
            if index as usize >= vertex_count {
                return Err(SceneError::IndexOutOfRange {
                    mesh: source.name.clone(),
                    index,
                    vertex_count,
                });
            }
            indices.push(index);
        }
    }
    Ok(indices)
}
