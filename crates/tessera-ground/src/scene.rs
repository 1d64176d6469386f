use std::sync::Arc;

use tessera_geom::{Quat, Transform, Vec3};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub local: Transform,
    /// Local-space vertices of an attached renderer.
    pub mesh: Option<Arc<[Vec3]>>,
    /// Renderers per LOD level, highest detail first.
    pub lod_group: Option<Vec<Vec<NodeId>>>,
    pub is_static: bool,
}

/// Flat arena of scene nodes; handles stay valid for the arena's lifetime.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.index())
    }

    fn push(&mut self, name: String, parent: Option<NodeId>, local: Transform) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SceneNode {
            name,
            parent,
            children: Vec::new(),
            local,
            mesh: None,
            lod_group: None,
            is_static: false,
        });
        id
    }

    pub fn add_root(&mut self, name: impl Into<String>, local: Transform) -> NodeId {
        self.push(name.into(), None, local)
    }

    /// `None` when `parent` is not in this scene.
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>, local: Transform) -> Option<NodeId> {
        self.get(parent)?;
        let id = self.push(name.into(), Some(parent), local);
        self.nodes[parent.index()].children.push(id);
        Some(id)
    }

    pub fn set_mesh(&mut self, id: NodeId, vertices: impl Into<Arc<[Vec3]>>) -> bool {
        match self.get_mut(id) {
            Some(n) => {
                n.mesh = Some(vertices.into());
                true
            }
            None => false,
        }
    }

    pub fn set_lod_group(&mut self, id: NodeId, levels: Vec<Vec<NodeId>>) -> bool {
        match self.get_mut(id) {
            Some(n) => {
                n.lod_group = Some(levels);
                true
            }
            None => false,
        }
    }

    /// Local transforms composed from the root down.
    pub fn world_transform(&self, id: NodeId) -> Option<Transform> {
        let mut chain = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            let node = self.get(c)?;
            chain.push(node.local);
            cur = node.parent;
        }
        let mut world = Transform::IDENTITY;
        for local in chain.iter().rev() {
            world = world.compose(local);
        }
        Some(world)
    }

    fn parent_world(&self, id: NodeId) -> Option<Transform> {
        match self.get(id)?.parent {
            Some(p) => self.world_transform(p),
            None => Some(Transform::IDENTITY),
        }
    }

    /// Moves `id` so its world pivot lands on `p`.
    pub fn set_world_position(&mut self, id: NodeId, p: Vec3) -> bool {
        let Some(parent) = self.parent_world(id) else {
            return false;
        };
        let local = parent.inverse_transform_point(p);
        self.nodes[id.index()].local.position = local;
        true
    }

    /// Assumes uniform scale along the parent chain.
    pub fn set_world_rotation(&mut self, id: NodeId, q: Quat) -> bool {
        let Some(parent) = self.parent_world(id) else {
            return false;
        };
        self.nodes[id.index()].local.rotation = (parent.rotation.conjugate() * q).normalized();
        true
    }

    /// `id` and everything below it, pre-order, each exactly once.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.get(id).is_none() {
            return out;
        }
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            // reversed so children come out in insertion order
            stack.extend(self.nodes[n.index()].children.iter().rev().copied());
        }
        out
    }

    /// Sets the static flag on the whole subtree; returns the node count touched.
    pub fn propagate_static(&mut self, id: NodeId, is_static: bool) -> usize {
        let nodes = self.descendants(id);
        for n in &nodes {
            self.nodes[n.index()].is_static = is_static;
        }
        nodes.len()
    }

    /// Renderers that count for ground contact: LOD0 when the object has a
    /// LOD group, else every node of the subtree.
    pub fn contact_renderers(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        let candidates = match node.lod_group.as_ref().and_then(|g| g.first()) {
            Some(lod0) => lod0.clone(),
            None => self.descendants(id),
        };
        candidates
            .into_iter()
            .filter(|n| self.get(*n).is_some_and(|n| n.mesh.is_some()))
            .collect()
    }

    /// Lowest world-space vertex over the contact renderers; `None` if none carry a mesh.
    pub fn lowest_world_vertex(&self, id: NodeId) -> Option<Vec3> {
        let mut lowest: Option<Vec3> = None;
        for r in self.contact_renderers(id) {
            let Some(world) = self.world_transform(r) else {
                continue;
            };
            let Some(mesh) = self.get(r).and_then(|n| n.mesh.as_ref()) else {
                continue;
            };
            for v in mesh.iter() {
                let p = world.transform_point(*v);
                if lowest.is_none_or(|l| p.y < l.y) {
                    lowest = Some(p);
                }
            }
        }
        lowest
    }
}
