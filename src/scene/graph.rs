use glam::{Mat4, Vec3};
use std::collections::HashMap;
use std::sync::Arc;

use super::{Light, NodeId, NodeTree, SceneNode, Texture};
use crate::error::SceneError;
use crate::math::Color;

/// What the renderer shows where no geometry is hit
#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Color(Color),
    Texture(Arc<Texture>),
    Transparent,
}

impl Default for Background {
    fn default() -> Self {
        Background::Color(Color::BLACK)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fog {
    Linear { color: Color, near: f32, far: f32 },
    Exp2 { color: Color, density: f32 },
}

impl Fog {
    pub fn color(&self) -> Color {
        match self {
            Fog::Linear { color, .. } | Fog::Exp2 { color, .. } => *color,
        }
    }

    /// Blend weight of the fog color at `distance`, in [0, 1]
    pub fn factor(&self, distance: f32) -> f32 {
        match *self {
            Fog::Linear { near, far, .. } => {
                if far <= near {
                    return 1.0;
                }
                ((distance - near) / (far - near)).clamp(0.0, 1.0)
            }
            Fog::Exp2 { density, .. } => {
                let d = density * distance;
                (1.0 - (-d * d).exp()).clamp(0.0, 1.0)
            }
        }
    }
}

/// Light resolved to world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedLight {
    pub node: NodeId,
    pub light: Light,
    pub position: Vec3,
}

#[derive(Debug, Clone)]
struct Entry {
    node: SceneNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Ownership tree of scene nodes under a single root.
///
/// Nodes are never removed; ids stay valid for the graph's lifetime.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    entries: HashMap<NodeId, Entry>,
    root: NodeId,
    next_id: u64,
    pub background: Background,
    pub fog: Option<Fog>,
}

impl SceneGraph {
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut entries = HashMap::new();
        entries.insert(
            root,
            Entry {
                node: SceneNode::group().with_name("Scene"),
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            entries,
            root,
            next_id: 1,
            background: Background::default(),
            fog: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total node count, root included
    pub fn node_count(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.entries.get(&id).map(|entry| &entry.node)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.entries.get_mut(&id).map(|entry| &mut entry.node)
    }

    pub fn try_node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode, SceneError> {
        self.node_mut(id).ok_or(SceneError::NodeNotFound(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entries.get(&id).and_then(|entry| entry.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.entries.get(&id) {
            Some(entry) => &entry.children,
            None => &[],
        }
    }

    pub fn add(&mut self, parent: NodeId, node: SceneNode) -> Result<NodeId, SceneError> {
        if !self.contains(parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            id,
            Entry {
                node,
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        if let Some(entry) = self.entries.get_mut(&parent) {
            entry.children.push(id);
        }
        Ok(id)
    }

    pub fn add_to_root(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            id,
            Entry {
                node,
                parent: Some(self.root),
                children: Vec::new(),
            },
        );
        if let Some(root) = self.entries.get_mut(&self.root) {
            root.children.push(id);
        }
        id
    }

    /// Inserts a detached subtree, returning the id of its top node
    pub fn insert_tree(&mut self, parent: NodeId, tree: NodeTree) -> Result<NodeId, SceneError> {
        let NodeTree { node, children } = tree;
        let id = self.add(parent, node)?;
        for child in children {
            self.insert_tree(id, child)?;
        }
        Ok(id)
    }

    /// First node with this name in breadth-first order
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        let mut queue = std::collections::VecDeque::from([self.root]);
        while let Some(id) = queue.pop_front() {
            let entry = self.entries.get(&id)?;
            if entry.node.name() == Some(name) {
                return Some(id);
            }
            queue.extend(entry.children.iter().copied());
        }
        None
    }

    /// Pre-order descendants of `id`, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut matrix = self.node(id)?.transform.matrix();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            matrix = self.node(parent)?.transform.matrix() * matrix;
            current = self.parent(parent);
        }
        Some(matrix)
    }

    /// Visits visible nodes in pre-order with their world matrices.
    /// Invisible nodes hide their whole subtree.
    pub fn visit<'s, F>(&'s self, mut f: F)
    where
        F: FnMut(NodeId, &'s SceneNode, &Mat4),
    {
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((id, parent_world)) = stack.pop() {
            let Some(entry) = self.entries.get(&id) else {
                continue;
            };
            if !entry.node.visible {
                continue;
            }
            let world = parent_world * entry.node.transform.matrix();
            f(id, &entry.node, &world);
            stack.extend(entry.children.iter().rev().map(|&child| (child, world)));
        }
    }

    pub fn lights(&self) -> Vec<PlacedLight> {
        let mut lights = Vec::new();
        self.visit(|id, node, world| {
            if let Some(light) = node.light {
                lights.push(PlacedLight {
                    node: id,
                    light,
                    position: world.transform_point3(Vec3::ZERO),
                });
            }
        });
        lights
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
