//! Transform tree of an imported model

use cgmath::{Matrix4, SquareMatrix};
use imgui::{TreeNodeFlags, Ui};

use super::mesh::Mesh;
use crate::{error::GfxResult, gfx::context::GraphicsContext};

/// One entry of a model's hierarchy
///
/// Meshes are referenced by index into the owning model's mesh list. The base
/// transform comes from the asset and never changes; the applied transform
/// and scale are the user's edits.
#[derive(Debug, Clone)]
pub struct Node {
    id: u32,
    name: String,
    base_transform: Matrix4<f32>,
    applied_transform: Matrix4<f32>,
    applied_scale: Matrix4<f32>,
    meshes: Vec<usize>,
    children: Vec<Node>,
}

impl Node {
    pub fn new(id: u32, name: impl Into<String>, base_transform: Matrix4<f32>, meshes: Vec<usize>) -> Self {
        Self {
            id,
            name: name.into(),
            base_transform,
            applied_transform: Matrix4::identity(),
            applied_scale: Matrix4::identity(),
            meshes,
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_transform(&self) -> Matrix4<f32> {
        self.base_transform
    }

    pub fn applied_transform(&self) -> Matrix4<f32> {
        self.applied_transform
    }

    pub fn applied_scale(&self) -> Matrix4<f32> {
        self.applied_scale
    }

    pub fn set_applied_transform(&mut self, transform: Matrix4<f32>) {
        self.applied_transform = transform;
    }

    pub fn set_applied_scale(&mut self, scale: Matrix4<f32>) {
        self.applied_scale = scale;
    }

    pub fn meshes(&self) -> &[usize] {
        &self.meshes
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Transform handed to this node's meshes and children
    pub fn built_transform(&self, accumulated: Matrix4<f32>) -> Matrix4<f32> {
        accumulated * self.base_transform * self.applied_transform
    }

    /// Draws this node's meshes, then its children, in pre-order
    pub fn draw(
        &self,
        ctx: &mut dyn GraphicsContext,
        meshes: &[Mesh],
        accumulated: Matrix4<f32>,
    ) -> GfxResult<()> {
        let built = self.built_transform(accumulated);
        // indices were validated when the model was assembled
        for mesh in self.meshes.iter().filter_map(|&i| meshes.get(i)) {
            mesh.draw(ctx, built)?;
        }
        for child in &self.children {
            child.draw(ctx, meshes, built)?;
        }
        Ok(())
    }

    pub fn find(&self, id: u32) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: u32) -> Option<&mut Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// Calls `f` on every node in pre-order with its depth
    pub fn visit(&self, f: &mut impl FnMut(&Node, usize)) {
        self.visit_at(0, f);
    }

    fn visit_at(&self, depth: usize, f: &mut impl FnMut(&Node, usize)) {
        f(self, depth);
        for child in &self.children {
            child.visit_at(depth + 1, f);
        }
    }

    /// Number of nodes in this subtree
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }

    /// World transform of node `id` under `accumulated`, if it is in this subtree
    pub fn world_transform(&self, id: u32, accumulated: Matrix4<f32>) -> Option<Matrix4<f32>> {
        let built = self.built_transform(accumulated);
        if self.id == id {
            return Some(built);
        }
        self.children
            .iter()
            .find_map(|child| child.world_transform(id, built))
    }

    /// Collapsible tree widget; returns the id of a node clicked this frame
    pub fn render_tree(&self, ui: &Ui, selected: Option<u32>) -> Option<u32> {
        let mut flags = TreeNodeFlags::OPEN_ON_ARROW | TreeNodeFlags::SPAN_AVAIL_WIDTH;
        if self.is_leaf() {
            flags |= TreeNodeFlags::LEAF;
        }
        if selected == Some(self.id) {
            flags |= TreeNodeFlags::SELECTED;
        }

        let token = ui
            .tree_node_config(format!("{}##node{}", self.name, self.id))
            .flags(flags)
            .push();

        let picked = selects_item(ui.is_item_clicked(), ui.is_item_activated(), ui.is_item_focused());
        let mut clicked = picked.then_some(self.id);
        if let Some(_token) = token {
            for child in &self.children {
                if let Some(id) = child.render_tree(ui, selected) {
                    clicked = Some(id);
                }
            }
        }
        clicked
    }
}

/// Mouse clicks and keyboard navigation both select a tree item
fn selects_item(clicked: bool, activated: bool, focused: bool) -> bool {
    clicked || activated || focused
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{AbsDiffEq, Vector3};

    fn translation(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::from_translation(Vector3::new(x, y, z))
    }

    fn chain() -> Node {
        let mut root = Node::new(0, "root", translation(1.0, 0.0, 0.0), vec![]);
        let mut arm = Node::new(1, "arm", Matrix4::from_angle_z(cgmath::Deg(90.0)), vec![]);
        arm.add_child(Node::new(2, "hand", translation(0.0, 2.0, 0.0), vec![0]));
        root.add_child(arm);
        root.add_child(Node::new(3, "leg", Matrix4::from_scale(2.0), vec![]));
        root
    }

    #[test]
    fn test_base_transforms_compose_root_to_leaf() {
        let root = chain();
        let world = root.world_transform(2, Matrix4::identity()).unwrap();
        let expected = translation(1.0, 0.0, 0.0)
            * Matrix4::from_angle_z(cgmath::Deg(90.0))
            * translation(0.0, 2.0, 0.0);
        assert!(world.abs_diff_eq(&expected, 1e-6));
        // the rotated arm turns +Y into -X
        let origin = world * cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((origin.x + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_applied_transform_is_local_to_the_node() {
        let mut root = chain();
        root.find_mut(1)
            .unwrap()
            .set_applied_transform(translation(0.0, 0.0, 4.0));
        let arm = root.world_transform(1, Matrix4::identity()).unwrap();
        assert!((arm.w.z - 4.0).abs() < 1e-6);
        // siblings are unaffected
        let leg = root.world_transform(3, Matrix4::identity()).unwrap();
        assert!(leg.w.z.abs() < 1e-6);
    }

    #[test]
    fn test_find_and_count() {
        let root = chain();
        assert_eq!(root.count(), 4);
        assert_eq!(root.find(2).map(Node::name), Some("hand"));
        assert!(root.find(9).is_none());
        assert!(root.find(2).unwrap().is_leaf());
    }

    #[test]
    fn test_visit_is_pre_order() {
        let root = chain();
        let mut seen = Vec::new();
        root.visit(&mut |node, depth| seen.push((node.id(), depth)));
        assert_eq!(seen, [(0, 0), (1, 1), (2, 2), (3, 1)]);
    }

    #[test]
    fn test_keyboard_navigation_selects_tree_item() {
        assert!(selects_item(true, false, false));
        assert!(selects_item(false, true, false));
        assert!(selects_item(false, false, true));
        assert!(!selects_item(false, false, false));
    }
}
