//! Scene graph: nodes, hierarchy and BIM element metadata.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use slotmap::{new_key_type, SlotMap};

use crate::error::{CoreError, Result};
use crate::geometry::Geometry;
use crate::material::{Color, Materials};

new_key_type! {
    /// Generational handle to a scene node.
    ///
    /// Once a node is removed its id never resolves again, even if the slot is reused.
    pub struct NodeId;
}

/// Descriptive fields of a building element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ElementMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Renderable triangle mesh.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Arc<Geometry>,
    pub materials: Materials,
}

impl Mesh {
    pub fn new(geometry: impl Into<Arc<Geometry>>, materials: impl Into<Materials>) -> Self {
        Self {
            geometry: geometry.into(),
            materials: materials.into(),
        }
    }
}

/// Light sources understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// Uniform light from all directions.
    Ambient { color: Color, intensity: f32 },
    /// Parallel light shining from the node position toward the origin.
    Directional { color: Color, intensity: f32 },
}

/// What a node contributes to the scene.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Pure transform node.
    Group,
    Mesh(Mesh),
    Light(Light),
}

/// A scene graph node.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Transform relative to the parent.
    pub transform: Mat4,
    pub metadata: ElementMetadata,
    /// Hidden nodes are neither drawn nor picked, and neither are their descendants.
    pub visible: bool,
    /// Non-pickable nodes are skipped by ray picking; their children are still tested.
    pub pickable: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            transform: Mat4::IDENTITY,
            metadata: ElementMetadata::default(),
            visible: true,
            pickable: true,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group() -> Self {
        Self::new(NodeKind::Group)
    }

    pub fn mesh(mesh: Mesh) -> Self {
        Self::new(NodeKind::Mesh(mesh))
    }

    pub fn light(light: Light) -> Self {
        Self::new(NodeKind::Light(light))
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.set_position(position);
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: ElementMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_pickable(mut self, pickable: bool) -> Self {
        self.pickable = pickable;
        self
    }

    /// Translation part of the local transform.
    pub fn position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }

    /// Replaces the translation part of the local transform.
    pub fn set_position(&mut self, position: Vec3) {
        self.transform.w_axis = position.extend(1.0);
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }
}

/// Owns every node of a scene. The root is a group that cannot be removed.
#[derive(Debug)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::group());
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root remains.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Inserts `node` as the last child of `parent`.
    pub fn add(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId> {
        if !self.nodes.contains_key(parent) {
            return Err(CoreError::NodeNotFound);
        }
        node.parent = Some(parent);
        node.children.clear();
        let id = self.nodes.insert(node);
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(id);
        }
        Ok(id)
    }

    /// Inserts `node` under the root.
    pub fn add_to_root(&mut self, node: Node) -> NodeId {
        let mut node = node;
        node.parent = Some(self.root);
        node.children.clear();
        let id = self.nodes.insert(node);
        if let Some(root) = self.nodes.get_mut(self.root) {
            root.children.push(id);
        }
        id
    }

    /// Detaches `id` from its parent and drops it together with its subtree.
    ///
    /// Returns `false` when the node is already gone or is the root; calling this
    /// twice is harmless.
    pub fn remove_from_parent(&mut self, id: NodeId) -> bool {
        if id == self.root {
            return false;
        }
        let Some(node) = self.nodes.remove(id) else {
            return false;
        };
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|child| *child != id);
        }
        let mut stack = node.children;
        while let Some(child) = stack.pop() {
            if let Some(removed) = self.nodes.remove(child) {
                stack.extend(removed.children);
            }
        }
        true
    }

    /// Removes every node except the root.
    pub fn clear(&mut self) {
        let root = self.root;
        self.nodes.retain(|id, _| id == root);
        if let Some(root) = self.nodes.get_mut(root) {
            root.children.clear();
        }
    }

    /// Transform from the node's local space to world space.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(id)?;
        let mut matrix = node.transform;
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(p)) {
            matrix = parent.transform * matrix;
            node = parent;
        }
        Some(matrix)
    }

    /// Visits visible nodes below `start` (inclusive) in pre-order, children in
    /// insertion order, passing each node's world matrix.
    pub fn traverse_visible(&self, start: NodeId, mut visit: impl FnMut(NodeId, &Node, Mat4)) {
        let Some(parent_world) = self
            .nodes
            .get(start)
            .map(|n| n.parent.and_then(|p| self.world_matrix(p)).unwrap_or(Mat4::IDENTITY))
        else {
            return;
        };

        let mut stack = vec![(start, parent_world)];
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform;
            visit(id, node, world);
            stack.extend(node.children.iter().rev().map(|child| (*child, world)));
        }
    }

    /// Ids of `start` and all its descendants in pre-order, hidden nodes included.
    pub fn descendants(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Iterates all nodes in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Finds the first node whose element name matches.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        let mut found = None;
        self.traverse_visible(self.root, |id, node, _| {
            if found.is_none() && node.metadata.name.as_deref() == Some(name) {
                found = Some(id);
            }
        });
        found
    }
}
