//! Scene-node capabilities populated by the player, and in-memory defaults.
//!
//! Nodes are shared handles: the owning [`PartCache`](crate::cache::PartCache) entry keeps
//! the object alive across frames, while tree membership lives in the parent's child list,
//! which the player rebuilds every frame. The parent link is a `Weak` back-reference.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;

pub type SharedNode = Rc<RefCell<dyn SceneNode>>;
pub type WeakNode = Weak<RefCell<dyn SceneNode>>;

/// Transform node of the backend scene graph.
pub trait SceneNode {
    fn name(&self) -> &str;
    fn set_name(&mut self, name: &str);

    fn position(&self) -> Vec2;
    fn set_position(&mut self, position: Vec2);

    /// Rotation in radians per axis; instance parts write the Y component.
    fn rotation(&self) -> Vec2;
    fn set_rotation(&mut self, rotation: Vec2);

    fn scale(&self) -> Vec2;
    fn set_scale(&mut self, scale: Vec2);

    fn visible(&self) -> bool;
    fn set_visible(&mut self, visible: bool);

    fn children(&self) -> &[SharedNode];
    fn push_child(&mut self, child: SharedNode);
    /// Remove and return every child.
    fn take_children(&mut self) -> Vec<SharedNode>;

    fn parent(&self) -> Option<SharedNode>;
    fn set_parent(&mut self, parent: Option<WeakNode>);

    /// Mesh capability, when this node draws geometry.
    fn as_mesh(&self) -> Option<&dyn MeshNode> {
        None
    }

    fn as_mesh_mut(&mut self) -> Option<&mut dyn MeshNode> {
        None
    }
}

/// Geometry capability of a node.
pub trait MeshNode {
    /// Pivot-relative vertices of the last update.
    fn vertices(&self) -> &[Vec2];
    fn uvs(&self) -> &[Vec2];
    fn uvs_mut(&mut self) -> &mut [Vec2];
    fn indices(&self) -> &[u32];
    fn texture_name(&self) -> &str;
    /// Hot-update the vertex buffer.
    fn update(&mut self, vertices: &[Vec2]);
}

/// Everything a backend needs to create a mesh node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshDesc {
    pub vertices: Vec<Vec2>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub texture_name: String,
}

/// Creates backend nodes. Injected through [`Project`](crate::project::Project).
pub trait NodeFactory {
    fn create_node(&self) -> SharedNode;
    /// The returned node must expose [`SceneNode::as_mesh_mut`].
    fn create_mesh(&self, desc: MeshDesc) -> SharedNode;
}

/// Append `child` to `parent` and point the child back at it.
pub fn add_child(parent: &SharedNode, child: &SharedNode) {
    child.borrow_mut().set_parent(Some(Rc::downgrade(parent)));
    parent.borrow_mut().push_child(Rc::clone(child));
}

/// Empty the child list of `parent`, clearing each child's back-reference.
pub fn clear_children(parent: &SharedNode) {
    let children = parent.borrow_mut().take_children();
    for child in children {
        child.borrow_mut().set_parent(None);
    }
}

/// Plain transform node.
#[derive(Debug)]
pub struct BaseNode {
    name: String,
    position: Vec2,
    rotation: Vec2,
    scale: Vec2,
    visible: bool,
    children: Vec<SharedNode>,
    parent: Option<WeakNode>,
}

impl Default for BaseNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            position: Vec2::ZERO,
            rotation: Vec2::ZERO,
            scale: Vec2::ONE,
            visible: true,
            children: Vec::new(),
            parent: None,
        }
    }
}

impl std::fmt::Debug for dyn SceneNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneNode")
            .field("name", &self.name())
            .field("children", &self.children().len())
            .finish_non_exhaustive()
    }
}

impl SceneNode for BaseNode {
    fn name(&self) -> &str {
        &self.name
    }
    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }
    fn position(&self) -> Vec2 {
        self.position
    }
    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }
    fn rotation(&self) -> Vec2 {
        self.rotation
    }
    fn set_rotation(&mut self, rotation: Vec2) {
        self.rotation = rotation;
    }
    fn scale(&self) -> Vec2 {
        self.scale
    }
    fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
    }
    fn visible(&self) -> bool {
        self.visible
    }
    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
    fn children(&self) -> &[SharedNode] {
        &self.children
    }
    fn push_child(&mut self, child: SharedNode) {
        self.children.push(child);
    }
    fn take_children(&mut self) -> Vec<SharedNode> {
        std::mem::take(&mut self.children)
    }
    fn parent(&self) -> Option<SharedNode> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }
    fn set_parent(&mut self, parent: Option<WeakNode>) {
        self.parent = parent;
    }
}

/// Mesh node with CPU-side buffers.
#[derive(Debug, Default)]
pub struct MeshPart {
    node: BaseNode,
    vertices: Vec<Vec2>,
    uvs: Vec<Vec2>,
    indices: Vec<u32>,
    texture_name: String,
    updates: usize,
}

impl MeshPart {
    pub fn new(desc: MeshDesc) -> Self {
        Self {
            node: BaseNode::default(),
            vertices: desc.vertices,
            uvs: desc.uvs,
            indices: desc.indices,
            texture_name: desc.texture_name,
            updates: 0,
        }
    }

    /// Number of vertex-buffer updates received.
    pub fn update_count(&self) -> usize {
        self.updates
    }
}

impl SceneNode for MeshPart {
    fn name(&self) -> &str {
        self.node.name()
    }
    fn set_name(&mut self, name: &str) {
        self.node.set_name(name);
    }
    fn position(&self) -> Vec2 {
        self.node.position()
    }
    fn set_position(&mut self, position: Vec2) {
        self.node.set_position(position);
    }
    fn rotation(&self) -> Vec2 {
        self.node.rotation()
    }
    fn set_rotation(&mut self, rotation: Vec2) {
        self.node.set_rotation(rotation);
    }
    fn scale(&self) -> Vec2 {
        self.node.scale()
    }
    fn set_scale(&mut self, scale: Vec2) {
        self.node.set_scale(scale);
    }
    fn visible(&self) -> bool {
        self.node.visible()
    }
    fn set_visible(&mut self, visible: bool) {
        self.node.set_visible(visible);
    }
    fn children(&self) -> &[SharedNode] {
        self.node.children()
    }
    fn push_child(&mut self, child: SharedNode) {
        self.node.push_child(child);
    }
    fn take_children(&mut self) -> Vec<SharedNode> {
        self.node.take_children()
    }
    fn parent(&self) -> Option<SharedNode> {
        self.node.parent()
    }
    fn set_parent(&mut self, parent: Option<WeakNode>) {
        self.node.set_parent(parent);
    }
    fn as_mesh(&self) -> Option<&dyn MeshNode> {
        Some(self)
    }
    fn as_mesh_mut(&mut self) -> Option<&mut dyn MeshNode> {
        Some(self)
    }
}

impl MeshNode for MeshPart {
    fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }
    fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }
    fn uvs_mut(&mut self) -> &mut [Vec2] {
        &mut self.uvs
    }
    fn indices(&self) -> &[u32] {
        &self.indices
    }
    fn texture_name(&self) -> &str {
        &self.texture_name
    }
    fn update(&mut self, vertices: &[Vec2]) {
        self.vertices.clear();
        self.vertices.extend_from_slice(vertices);
        self.updates += 1;
    }
}

/// Factory producing [`BaseNode`] and [`MeshPart`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultNodeFactory;

impl NodeFactory for DefaultNodeFactory {
    fn create_node(&self) -> SharedNode {
        Rc::new(RefCell::new(BaseNode::default()))
    }

    fn create_mesh(&self, desc: MeshDesc) -> SharedNode {
        Rc::new(RefCell::new(MeshPart::new(desc)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_child_sets_weak_parent() {
        let factory = DefaultNodeFactory;
        let root = factory.create_node();
        let child = factory.create_node();
        add_child(&root, &child);

        assert_eq!(root.borrow().children().len(), 1);
        let parent = child.borrow().parent().expect("parent link");
        assert!(Rc::ptr_eq(&parent, &root));
        // only the root's child list and `child` itself hold strong references
        assert_eq!(Rc::strong_count(&child), 2);
        assert_eq!(Rc::weak_count(&root), 1);

        clear_children(&root);
        assert!(root.borrow().children().is_empty());
        assert!(child.borrow().parent().is_none());
    }

    #[test]
    fn mesh_part_exposes_mesh_capability() {
        let node = DefaultNodeFactory.create_mesh(MeshDesc {
            vertices: vec![Vec2::ZERO; 5],
            uvs: vec![Vec2::ONE; 5],
            indices: vec![0, 1, 2],
            texture_name: "atlas".into(),
        });
        let mut n = node.borrow_mut();
        let mesh = n.as_mesh_mut().expect("mesh capability");
        mesh.update(&[Vec2::new(1.0, 2.0)]);
        assert_eq!(mesh.vertices(), &[Vec2::new(1.0, 2.0)]);
        assert_eq!(mesh.texture_name(), "atlas");
        drop(n);
        assert!(DefaultNodeFactory.create_node().borrow().as_mesh().is_none());
    }
}
