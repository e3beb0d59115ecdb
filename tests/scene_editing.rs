//! End-to-end editing through the public API, rendered into a RecordingContext

use std::{fs, path::PathBuf};

use cgmath::{AbsDiffEq, Matrix4, SquareMatrix, Vector3};
use trellis::{
    gfx::{
        bindable::TransformConstants,
        drawable::{Drawable, StaticBindingRegistry},
        drawables::SolidSphere,
        recording::{RecordingContext, ResourceKind},
        GraphicsContext,
    },
    scene::{EditSession, Model, Pose, Scale, ShadingPermutation},
    ImportConfig, SceneError,
};

const TWO_QUADS_OBJ: &str = "\
mtllib two_quads.mtl
o Left
v -3.0 -1.0 0.0
v -1.0 -1.0 0.0
v -1.0 1.0 0.0
v -3.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
usemtl painted
f 1/1/1 2/2/1 3/3/1
f 3/3/1 4/4/1 1/1/1
o Right
v 1.0 -1.0 0.0
v 3.0 -1.0 0.0
v 3.0 1.0 0.0
v 1.0 1.0 0.0
usemtl painted
f 5/1/1 6/2/1 7/3/1
f 7/3/1 8/4/1 5/1/1
";

const DIFFUSE_MTL: &str = "\
newmtl painted
Kd 1.0 1.0 1.0
map_Kd painted.png
";

const NORMAL_ONLY_MTL: &str = "\
newmtl painted
Kd 1.0 1.0 1.0
map_Bump painted_normal.png
";

fn write_fixture(name: &str, mtl: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("trellis_it_{name}"));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("two_quads.obj"), TWO_QUADS_OBJ).unwrap();
    fs::write(dir.join("two_quads.mtl"), mtl).unwrap();
    dir.join("two_quads.obj")
}

fn load(name: &str, mtl: &str) -> (RecordingContext, trellis::Result<Model>) {
    let mut ctx = RecordingContext::new();
    let mut registry = StaticBindingRegistry::new();
    let model = Model::load(&mut ctx, &mut registry, write_fixture(name, mtl), &ImportConfig::default());
    (ctx, model)
}

fn model_view(ctx: &RecordingContext, draw: usize) -> Matrix4<f32> {
    let call = ctx.draw_calls().nth(draw).unwrap();
    let constants: TransformConstants = bytemuck::pod_read_unaligned(call.vertex_constant(0).unwrap());
    constants.model_view.into()
}

#[test]
fn test_obj_import_builds_tree_and_diffuse_meshes() {
    let (_, model) = load("tree", DIFFUSE_MTL);
    let model = model.unwrap();

    assert_eq!(model.name(), "two_quads");
    assert_eq!(model.meshes().len(), 2);
    for mesh in model.meshes() {
        assert_eq!(mesh.permutation(), ShadingPermutation::Diffuse);
        assert_eq!(mesh.index_count(), 6);
    }

    let root = model.root();
    assert_eq!(root.id(), 0);
    assert_eq!(root.children().len(), 2);
    assert_eq!(model.node(1).unwrap().name(), "Left");
    assert_eq!(model.node(2).unwrap().meshes(), &[1]);
    assert_eq!(model.node(1).unwrap().applied_transform(), Matrix4::identity());
}

#[test]
fn test_editing_selected_node_moves_only_its_meshes() {
    let (mut ctx, model) = load("edit", DIFFUSE_MTL);
    let mut model = model.unwrap();
    let session = EditSession::select(1);

    model
        .set_pose(
            1,
            Pose {
                yaw: std::f32::consts::FRAC_PI_2,
                ..Pose::from_translation(5.0, 0.0, 0.0)
            },
        )
        .unwrap();
    model.set_scale(1, Scale::default()).unwrap();
    ctx.begin_frame([0.0; 4]).unwrap();
    model.draw(&mut ctx, &session).unwrap();
    ctx.end_frame().unwrap();

    assert_eq!(ctx.draw_calls().count(), 2);
    let left = model_view(&ctx, 0);
    assert!(left.w.truncate().abs_diff_eq(&Vector3::new(5.0, 0.0, 0.0), 1e-5));
    assert_eq!(model_view(&ctx, 1), Matrix4::identity());

    let edit = model.edit(1).unwrap();
    assert!((edit.pose.yaw - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
}

#[test]
fn test_deselecting_keeps_last_applied_edit() {
    let (mut ctx, model) = load("deselect", DIFFUSE_MTL);
    let mut model = model.unwrap();

    model.set_pose(2, Pose::from_translation(0.0, 3.0, 0.0)).unwrap();
    model.draw(&mut ctx, &EditSession::select(2)).unwrap();
    model.draw(&mut ctx, &EditSession::default()).unwrap();

    let applied = model.node(2).unwrap().applied_transform();
    assert!(applied.abs_diff_eq(&Matrix4::from_translation(Vector3::new(0.0, 3.0, 0.0)), 1e-6));
}

#[test]
fn test_normal_map_without_diffuse_is_rejected() {
    let (ctx, model) = load("normal_only", NORMAL_ONLY_MTL);
    assert!(matches!(
        model,
        Err(SceneError::UnsupportedMaterial {
            diffuse: false,
            specular: false,
            normal: true,
        })
    ));
    assert_eq!(ctx.created(ResourceKind::Texture), 0);
    assert_eq!(ctx.draw_calls().count(), 0);
}

#[test]
fn test_missing_file_is_an_import_error() {
    let mut ctx = RecordingContext::new();
    let mut registry = StaticBindingRegistry::new();
    let result = Model::load(
        &mut ctx,
        &mut registry,
        std::env::temp_dir().join("trellis_it_missing/nothing.obj"),
        &ImportConfig::default(),
    );
    assert!(matches!(result, Err(SceneError::Import { .. })));
}

#[test]
fn test_spheres_share_one_set_of_static_resources() {
    let mut ctx = RecordingContext::new();
    let mut registry = StaticBindingRegistry::new();
    let spheres: Vec<SolidSphere> = (0..4)
        .map(|_| SolidSphere::new(&mut ctx, &mut registry, 1.0).unwrap())
        .collect();

    assert_eq!(ctx.created(ResourceKind::VertexBuffer), 1);
    assert_eq!(ctx.created(ResourceKind::IndexBuffer), 1);
    assert_eq!(ctx.created(ResourceKind::VertexShader), 1);

    for sphere in &spheres {
        sphere.submit(&mut ctx).unwrap();
    }
    let calls: Vec<_> = ctx.draw_calls().collect();
    assert_eq!(calls.len(), 4);
    assert!(calls.windows(2).all(|pair| {
        pair[0].bound.vertex_buffer == pair[1].bound.vertex_buffer
            && pair[0].bound.index_buffer == pair[1].bound.index_buffer
            && pair[0].bound.pixel_shader == pair[1].bound.pixel_shader
    }));
}
