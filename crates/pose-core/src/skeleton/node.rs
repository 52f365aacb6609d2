//! Node hierarchy stored as a flat arena
//!
//! The asset loader hands over an owned [`NodeData`] tree. [`NodeTree`]
//! flattens it in pre-order, so a parent always has a smaller index than its
//! children and world transforms can be computed in one forward pass.

use crate::error::{PoseError, Result};
use crate::pose::LocalPose;
use glam::Mat4;
use std::collections::HashMap;

/// Index of a node inside a [`NodeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Loader-facing node description (owned tree)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeData {
    /// Node name, used to associate bones and animation channels
    pub name: String,
    /// Transform relative to the parent node
    pub transform: Mat4,
    /// Child nodes, in authoring order
    pub children: Vec<NodeData>,
    /// Indices of meshes attached to this node
    pub meshes: Vec<usize>,
}

impl NodeData {
    pub fn new(name: impl Into<String>, transform: Mat4) -> Self {
        Self {
            name: name.into(),
            transform,
            children: Vec::new(),
            meshes: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: NodeData) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_mesh(mut self, mesh_index: usize) -> Self {
        self.meshes.push(mesh_index);
        self
    }
}

/// A node of the flattened hierarchy
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    local: Mat4,
    rest: LocalPose,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    meshes: Vec<usize>,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Loaded (rest) transform relative to the parent
    pub fn local_transform(&self) -> Mat4 {
        self.local
    }

    /// The rest transform decomposed into position/rotation/scale
    pub fn rest_pose(&self) -> LocalPose {
        self.rest
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn meshes(&self) -> &[usize] {
        &self.meshes
    }
}

/// Immutable node hierarchy in parent-before-child order
#[derive(Debug, Clone)]
pub struct NodeTree {
    nodes: Vec<Node>,
    by_name: HashMap<String, NodeId>,
}

impl NodeTree {
    /// Flatten a loader tree
    ///
    /// Node names are expected to be unique; when they are not, name lookups
    /// resolve to the first node in pre-order.
    pub fn from_data(root: NodeData) -> Result<Self> {
        let mut nodes: Vec<Node> = Vec::new();
        let mut by_name = HashMap::new();
        let mut stack = vec![(root, None::<NodeId>)];

        while let Some((data, parent)) = stack.pop() {
            if !data.transform.is_finite() {
                return Err(PoseError::invalid(format!(
                    "node '{}' has a non-finite transform",
                    data.name
                )));
            }

            let id = NodeId(u32::try_from(nodes.len()).map_err(|_| {
                PoseError::invalid("node hierarchy exceeds u32::MAX nodes")
            })?);

            if let Some(parent) = parent {
                nodes[parent.index()].children.push(id);
            }

            if by_name.contains_key(&data.name) {
                log::warn!(
                    "Duplicate node name '{}' at index {}; lookups resolve to the first occurrence",
                    data.name,
                    id.index()
                );
            } else {
                by_name.insert(data.name.clone(), id);
            }

            // Reverse so siblings pop in authoring order
            for child in data.children.into_iter().rev() {
                stack.push((child, Some(id)));
            }

            nodes.push(Node {
                rest: LocalPose::from_matrix(&data.transform),
                name: data.name,
                local: data.transform,
                parent,
                children: Vec::new(),
                meshes: data.meshes,
            });
        }

        log::debug!("Built node hierarchy with {} nodes", nodes.len());

        Ok(Self { nodes, by_name })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Find a node by name
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// Rest pose of `id` decomposed into position/rotation/scale
    pub fn rest_pose(&self, id: NodeId) -> Option<LocalPose> {
        self.node(id).map(Node::rest_pose)
    }

    /// Rest-pose local matrices for every node
    pub fn rest_locals(&self) -> Vec<Mat4> {
        self.nodes.iter().map(|node| node.local).collect()
    }

    /// Compute world transforms top-down from per-node local matrices
    ///
    /// `locals` and `worlds` must both hold one entry per node.
    pub fn world_transforms(&self, locals: &[Mat4], worlds: &mut [Mat4]) -> Result<()> {
        if locals.len() != self.nodes.len() || worlds.len() != self.nodes.len() {
            return Err(PoseError::invalid(format!(
                "expected {} local/world slots, got {}/{}",
                self.nodes.len(),
                locals.len(),
                worlds.len()
            )));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            worlds[i] = match node.parent {
                Some(parent) => worlds[parent.index()] * locals[i],
                None => locals[i],
            };
        }
        Ok(())
    }

    /// World transform of a single node in the rest pose
    pub fn rest_world_transform(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.node(id)?;
        let mut world = node.local;
        while let Some(parent) = node.parent {
            node = &self.nodes[parent.index()];
            world = node.local * world;
        }
        Some(world)
    }

    /// Path of node ids from the root down to `id` (inclusive)
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.node(id).map(|_| id);
        while let Some(node_id) = current {
            path.push(node_id);
            current = self.nodes[node_id.index()].parent;
        }
        path.reverse();
        path
    }
}
