//! # Models
//!
//! A [`Model`] owns everything built from one imported asset: the flat mesh
//! list and the node tree that references it. It also keeps the user's edits,
//! one [`NodeEdit`] per node that has ever been selected.
//!
//! ## Staged edits
//!
//! Edits are not written to nodes when a widget changes them. At the start of
//! [`Model::draw`] the selected node's edit is composed and stored as that
//! node's applied transform, so a change becomes visible on the next frame
//! and only for the selected node. Deselecting keeps whatever was applied
//! last.
//!
//! A node's applied transform includes its edited scale, and children inherit
//! it through the accumulated transform, so nested scales compound.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU32, Ordering},
};

use cgmath::{Matrix, Matrix4, SquareMatrix};
use imgui::{Condition, Ui};

use super::{
    import::{file_stem, import_error, ImportedNode, ImportedScene},
    mesh::Mesh,
    node::Node,
    transform::{NodeEdit, Pose, Scale},
};
use crate::{
    config::ImportConfig,
    error::{Result, SceneError},
    gfx::{context::GraphicsContext, drawable::StaticBindingRegistry},
    ui::widgets::{angle_slider, vec3_control, Vec3Control},
};

static NEXT_MODEL_ID: AtomicU32 = AtomicU32::new(0);

/// UI selection carried between frames by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditSession {
    pub selected_node: Option<u32>,
}

impl EditSession {
    pub fn select(node: u32) -> Self {
        Self {
            selected_node: Some(node),
        }
    }
}

#[derive(Debug)]
pub struct Model {
    id: u32,
    name: String,
    source: PathBuf,
    root: Node,
    meshes: Vec<Mesh>,
    edits: HashMap<u32, NodeEdit>,
}

impl Model {
    /// Imports `path` and builds every mesh
    ///
    /// Either the whole model is returned or nothing is; there is no partially
    /// built model.
    pub fn load(
        ctx: &mut dyn GraphicsContext,
        registry: &mut StaticBindingRegistry,
        path: impl AsRef<Path>,
        config: &ImportConfig,
    ) -> Result<Self> {
        let scene = ImportedScene::load(path, config)?;
        Self::from_scene(ctx, registry, &scene, config)
    }

    pub fn from_scene(
        ctx: &mut dyn GraphicsContext,
        registry: &mut StaticBindingRegistry,
        scene: &ImportedScene,
        config: &ImportConfig,
    ) -> Result<Self> {
        let meshes = scene
            .meshes
            .iter()
            .map(|mesh| {
                let material = mesh.material.and_then(|i| scene.materials.get(i));
                Mesh::build(ctx, registry, mesh, material, config.mesh_scale)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut next_id = 0;
        let root = build_node(&scene.root, &mut next_id, meshes.len(), &scene.source)?;

        let model = Self {
            id: NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed),
            name: file_stem(&scene.source),
            source: scene.source.clone(),
            root,
            meshes,
            edits: HashMap::new(),
        };
        log::info!(
            "Loaded model '{}' from {}: {} meshes, {} nodes",
            model.name,
            model.source.display(),
            model.meshes.len(),
            next_id
        );
        Ok(model)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn node(&self, id: u32) -> Option<&Node> {
        self.root.find(id)
    }

    /// The edit recorded for `id`, if the node has been edited
    pub fn edit(&self, id: u32) -> Option<&NodeEdit> {
        self.edits.get(&id)
    }

    /// The edit for `id`, seeded from the node's applied state on first use
    pub fn edit_mut(&mut self, id: u32) -> Result<&mut NodeEdit> {
        let node = self.root.find(id).ok_or(SceneError::UnknownNode(id))?;
        Ok(self.edits.entry(id).or_insert_with(|| {
            NodeEdit::from_matrices(&node.applied_transform(), &node.applied_scale())
        }))
    }

    pub fn set_pose(&mut self, id: u32, pose: Pose) -> Result<()> {
        self.edit_mut(id)?.pose = pose;
        Ok(())
    }

    pub fn set_scale(&mut self, id: u32, scale: Scale) -> Result<()> {
        self.edit_mut(id)?.scale = scale;
        Ok(())
    }

    /// Zero pose and unit scale; takes effect on the next draw like any edit
    pub fn reset_edit(&mut self, id: u32) -> Result<()> {
        *self.edit_mut(id)? = NodeEdit::default();
        Ok(())
    }

    /// Overrides the root's applied transform directly
    ///
    /// Any pending edit of the root is dropped so it is reseeded from the new
    /// transform.
    pub fn set_root_transform(&mut self, transform: Matrix4<f32>) {
        self.root.set_applied_transform(transform);
        self.edits.remove(&self.root.id());
    }

    pub fn set_root_scaling(&mut self, scale: Scale) {
        let current = NodeEdit::from_matrices(&self.root.applied_transform(), &self.root.applied_scale());
        let (applied, scale_matrix) = NodeEdit { scale, ..current }.to_matrices();
        self.root.set_applied_transform(applied);
        self.root.set_applied_scale(scale_matrix);
        self.edits.remove(&self.root.id());
    }

    /// World transform node `id` is drawn with
    pub fn world_transform(&self, id: u32) -> Option<Matrix4<f32>> {
        self.root.world_transform(id, Matrix4::identity())
    }

    /// Writes the selected node's edit onto it, then draws the tree
    pub fn draw(&mut self, ctx: &mut dyn GraphicsContext, session: &EditSession) -> Result<()> {
        if let Some(id) = session.selected_node {
            self.stage_edit(id)?;
        }
        self.root.draw(ctx, &self.meshes, Matrix4::identity())?;
        Ok(())
    }

    fn stage_edit(&mut self, id: u32) -> Result<()> {
        let (applied, scale) = self.edit_mut(id)?.to_matrices();
        let node = self.root.find_mut(id).ok_or(SceneError::UnknownNode(id))?;
        node.set_applied_transform(applied);
        node.set_applied_scale(scale);
        Ok(())
    }

    /// Node tree window plus the properties of the selected node
    ///
    /// Returns the session for the next frame, with the selection updated if
    /// a tree entry was clicked.
    pub fn show_window(
        &mut self,
        ui: &Ui,
        ctx: &mut dyn GraphicsContext,
        session: EditSession,
    ) -> Result<EditSession> {
        let mut session = session;
        let root = &self.root;
        ui.window(format!("{}##model{}", self.name, self.id))
            .size([300.0, 400.0], Condition::FirstUseEver)
            .position([10.0, 10.0], Condition::FirstUseEver)
            .build(|| {
                if let Some(clicked) = root.render_tree(ui, session.selected_node) {
                    session.selected_node = Some(clicked);
                }
            });

        if let Some(id) = session.selected_node {
            ui.window("Properties")
                .size([340.0, 420.0], Condition::FirstUseEver)
                .position([320.0, 10.0], Condition::FirstUseEver)
                .build(|| self.show_properties(ui, ctx, id))
                .transpose()?;
        }
        Ok(session)
    }

    fn show_properties(&mut self, ui: &Ui, ctx: &mut dyn GraphicsContext, id: u32) -> Result<()> {
        ui.input_text("Model Name", &mut self.name).build();
        ui.separator();

        let edit = self.edit_mut(id)?;
        let NodeEdit { pose, scale } = edit;
        vec3_control(ui, "Position", [&mut pose.x, &mut pose.y, &mut pose.z], Vec3Control::default());

        ui.text("Orientation");
        angle_slider(ui, "Roll", &mut pose.roll, -180.0, 180.0);
        angle_slider(ui, "Pitch", &mut pose.pitch, -180.0, 180.0);
        angle_slider(ui, "Yaw", &mut pose.yaw, -180.0, 180.0);

        vec3_control(
            ui,
            "Scale",
            [&mut scale.x, &mut scale.y, &mut scale.z],
            Vec3Control {
                reset: 1.0,
                speed: 0.01,
                min: Some(0.1),
            },
        );
        if ui.button("Reset") {
            *edit = NodeEdit::default();
        }

        let mesh_indices = self.root.find(id).map(|n| n.meshes().to_vec()).unwrap_or_default();
        if !mesh_indices.is_empty() {
            ui.separator();
            ui.text("Materials");
        }
        for index in mesh_indices {
            if let Some(mesh) = self.meshes.get_mut(index) {
                mesh.show_material_controls(ui, ctx)?;
            }
        }
        Ok(())
    }
}

/// Assigns ids depth-first and converts row-major transforms to cgmath
fn build_node(source: &ImportedNode, next_id: &mut u32, mesh_count: usize, path: &Path) -> Result<Node> {
    if let Some(&bad) = source.meshes.iter().find(|&&i| i >= mesh_count) {
        return Err(import_error(
            path,
            format!("node '{}' references mesh {bad} of {mesh_count}", source.name),
        ));
    }

    let id = *next_id;
    *next_id += 1;
    let base = Matrix4::from(source.transform).transpose();
    let mut node = Node::new(id, source.name.clone(), base, source.meshes.clone());
    for child in &source.children {
        node.add_child(build_node(child, next_id, mesh_count, path)?);
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gfx::{bindable::TransformConstants, recording::RecordingContext},
        scene::{
            import::{ImportedMaterial, ImportedMesh, IDENTITY_ROWS},
            material::ShadingPermutation,
        },
    };
    use cgmath::{AbsDiffEq, Vector3, Vector4};

    fn quad() -> ImportedMesh {
        ImportedMesh {
            name: "quad".into(),
            positions: vec![[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [1.0, 1.0, 0.0], [-1.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 4],
            tex_coords: vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
            faces: vec![vec![0, 1, 2], vec![2, 3, 0]],
            material: Some(0),
            ..Default::default()
        }
    }

    fn translated(x: f32, y: f32, z: f32) -> [[f32; 4]; 4] {
        let mut rows = IDENTITY_ROWS;
        rows[0][3] = x;
        rows[1][3] = y;
        rows[2][3] = z;
        rows
    }

    /// root(0) { a(1) { b(2) }, c(3) { d(4) } }, every node drawing the quad
    fn hierarchy() -> ImportedScene {
        let node = |name: &str, rows| ImportedNode::new(name, rows, vec![0]);
        ImportedScene {
            source: PathBuf::from("assets/rig.obj"),
            meshes: vec![quad()],
            materials: vec![ImportedMaterial {
                name: "brick".into(),
                diffuse_texture: Some(PathBuf::from("assets/brick.png")),
                ..Default::default()
            }],
            root: node("root", IDENTITY_ROWS)
                .with_child(node("a", translated(0.0, 1.0, 0.0)).with_child(node("b", translated(0.0, 1.0, 0.0))))
                .with_child(node("c", IDENTITY_ROWS).with_child(node("d", translated(1.0, 0.0, 0.0)))),
        }
    }

    fn load(scene: &ImportedScene) -> (RecordingContext, Model) {
        let mut ctx = RecordingContext::new();
        let mut registry = StaticBindingRegistry::new();
        let model = Model::from_scene(&mut ctx, &mut registry, scene, &ImportConfig::default()).unwrap();
        (ctx, model)
    }

    fn origin(m: Matrix4<f32>) -> Vector3<f32> {
        (m * Vector4::new(0.0, 0.0, 0.0, 1.0)).truncate()
    }

    #[test]
    fn test_single_quad_end_to_end() {
        let scene = ImportedScene {
            root: ImportedNode::new("quad", IDENTITY_ROWS, vec![0]),
            ..hierarchy()
        };
        let (mut ctx, mut model) = load(&scene);

        assert_eq!(model.meshes().len(), 1);
        assert_eq!(model.meshes()[0].permutation(), ShadingPermutation::Diffuse);
        assert_eq!(model.meshes()[0].index_count(), 6);
        assert_eq!(model.root().meshes(), [0]);
        assert_eq!(model.root().applied_transform(), Matrix4::identity());
        assert_eq!(model.name(), "rig");

        model.draw(&mut ctx, &EditSession::default()).unwrap();
        assert_eq!(ctx.draw_calls().count(), 1);
    }

    #[test]
    fn test_ids_are_depth_first() {
        let (_, model) = load(&hierarchy());
        let mut names = Vec::new();
        model.root().visit(&mut |node, _| names.push((node.id(), node.name().to_string())));
        let expected: Vec<_> = ["root", "a", "b", "c", "d"]
            .iter()
            .enumerate()
            .map(|(i, n)| (i as u32, n.to_string()))
            .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_unedited_world_is_product_of_base_transforms() {
        let (_, model) = load(&hierarchy());
        let b = model.world_transform(2).unwrap();
        assert!(origin(b).abs_diff_eq(&Vector3::new(0.0, 2.0, 0.0), 1e-6));
        let d = model.world_transform(4).unwrap();
        assert!(origin(d).abs_diff_eq(&Vector3::new(1.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn test_selected_edit_offsets_subtree() {
        let (mut ctx, mut model) = load(&hierarchy());
        let session = EditSession::select(3);
        model.set_pose(3, Pose::from_translation(5.0, 0.0, 0.0)).unwrap();
        model.set_scale(3, Scale::default()).unwrap();

        // staged only: nothing changes until the next draw
        assert_eq!(model.node(3).unwrap().applied_transform(), Matrix4::identity());
        model.draw(&mut ctx, &session).unwrap();

        let applied = model.node(3).unwrap().applied_transform();
        assert!(applied.abs_diff_eq(&Matrix4::from_translation(Vector3::new(5.0, 0.0, 0.0)), 1e-6));
        let d = model.world_transform(4).unwrap();
        assert!(origin(d).abs_diff_eq(&Vector3::new(6.0, 0.0, 0.0), 1e-6));

        // the fifth draw is node d; its vertex transform carries the offset
        let draw = ctx.draw_calls().nth(4).unwrap();
        let constants: TransformConstants = bytemuck::pod_read_unaligned(draw.vertex_constant(0).unwrap());
        assert!((constants.model_view[3][0] - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_reselecting_without_edits_is_stable() {
        let (mut ctx, mut model) = load(&hierarchy());
        let session = EditSession::select(1);
        model
            .set_pose(
                1,
                Pose {
                    roll: 0.3,
                    pitch: -0.8,
                    yaw: 1.2,
                    x: 1.0,
                    y: -2.0,
                    z: 0.5,
                },
            )
            .unwrap();
        model.draw(&mut ctx, &session).unwrap();
        let first = model.node(1).unwrap().applied_transform();

        model.draw(&mut ctx, &EditSession::default()).unwrap();
        model.draw(&mut ctx, &session).unwrap();
        let second = model.node(1).unwrap().applied_transform();
        assert!(first.abs_diff_eq(&second, 1e-5));
    }

    #[test]
    fn test_edit_is_seeded_from_applied_transform() {
        let (mut ctx, mut model) = load(&hierarchy());
        model.set_root_transform(Matrix4::from_translation(Vector3::new(0.0, 0.0, -3.0)));
        model.draw(&mut ctx, &EditSession::select(0)).unwrap();

        let edit = model.edit(0).unwrap();
        assert!((edit.pose.z + 3.0).abs() < 1e-6);
        assert_eq!(edit.scale, Scale::default());
        assert!(origin(model.world_transform(0).unwrap()).abs_diff_eq(&Vector3::new(0.0, 0.0, -3.0), 1e-6));
    }

    #[test]
    fn test_deselect_keeps_last_applied() {
        let (mut ctx, mut model) = load(&hierarchy());
        model.set_pose(2, Pose::from_translation(0.0, 0.0, 2.0)).unwrap();
        model.draw(&mut ctx, &EditSession::select(2)).unwrap();
        model.set_pose(2, Pose::default()).unwrap();
        model.draw(&mut ctx, &EditSession::default()).unwrap();
        assert!((model.node(2).unwrap().applied_transform().w.z - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_nested_scale_compounds() {
        let (mut ctx, mut model) = load(&hierarchy());
        model.set_scale(3, Scale::uniform(2.0)).unwrap();
        model.draw(&mut ctx, &EditSession::select(3)).unwrap();
        model.set_scale(4, Scale::uniform(3.0)).unwrap();
        model.draw(&mut ctx, &EditSession::select(4)).unwrap();

        let d = model.world_transform(4).unwrap();
        // d's base offset is scaled by its parent, its own scale stacks on top
        assert!(origin(d).abs_diff_eq(&Vector3::new(2.0, 0.0, 0.0), 1e-6));
        assert!((d.x.x - 6.0).abs() < 1e-5);
        assert_eq!(model.node(4).unwrap().applied_scale(), Matrix4::from_scale(3.0));
    }

    #[test]
    fn test_reset_restores_identity() {
        let (mut ctx, mut model) = load(&hierarchy());
        model.set_pose(1, Pose::from_translation(4.0, 4.0, 4.0)).unwrap();
        model.draw(&mut ctx, &EditSession::select(1)).unwrap();
        model.reset_edit(1).unwrap();
        model.draw(&mut ctx, &EditSession::select(1)).unwrap();
        assert!(model.node(1).unwrap().applied_transform().abs_diff_eq(&Matrix4::identity(), 1e-6));
    }

    #[test]
    fn test_root_scaling_keeps_translation() {
        let (_, mut model) = load(&hierarchy());
        model.set_root_transform(Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0)));
        model.set_root_scaling(Scale::uniform(0.5));
        let root = model.root().applied_transform();
        assert!(origin(root).abs_diff_eq(&Vector3::new(1.0, 2.0, 3.0), 1e-6));
        assert!((root.y.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_selection_is_an_error() {
        let (mut ctx, mut model) = load(&hierarchy());
        let result = model.draw(&mut ctx, &EditSession::select(42));
        assert!(matches!(result, Err(SceneError::UnknownNode(42))));
    }

    #[test]
    fn test_bad_mesh_reference_fails_import() {
        let scene = ImportedScene {
            root: ImportedNode::new("root", IDENTITY_ROWS, vec![3]),
            ..hierarchy()
        };
        let mut ctx = RecordingContext::new();
        let mut registry = StaticBindingRegistry::new();
        let result = Model::from_scene(&mut ctx, &mut registry, &scene, &ImportConfig::default());
        assert!(matches!(result, Err(SceneError::Import { .. })));
    }

    #[test]
    fn test_unsupported_material_aborts_model() {
        let mut scene = hierarchy();
        scene.materials[0] = ImportedMaterial {
            normal_texture: Some(PathBuf::from("assets/normal.png")),
            ..Default::default()
        };
        let mut ctx = RecordingContext::new();
        let mut registry = StaticBindingRegistry::new();
        let result = Model::from_scene(&mut ctx, &mut registry, &scene, &ImportConfig::default());
        assert!(matches!(
            result,
            Err(SceneError::UnsupportedMaterial {
                diffuse: false,
                specular: false,
                normal: true
            })
        ));
    }

    #[test]
    fn test_model_ids_are_unique() {
        let (_, a) = load(&hierarchy());
        let (_, b) = load(&hierarchy());
        assert_ne!(a.id(), b.id());
    }
}
