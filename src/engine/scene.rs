use crate::engine::mesh::Mesh;
use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LabelId(usize);

pub enum Geometry {
    Triangles(Mesh),
    /// Position-only closed line loop.
    LineLoop(Vec<f32>),
    /// Position-only point cloud.
    Points(Vec<f32>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub color: [f32; 3],
    pub texture: Option<String>,
    pub opacity: f32,
    pub transparent: bool,
    /// Lit by the point light at the origin, otherwise drawn at full brightness.
    pub lit: bool,
}

impl Material {
    pub fn basic(color: [f32; 3]) -> Self {
        Material {
            color,
            texture: None,
            opacity: 1.0,
            transparent: false,
            lit: false,
        }
    }

    pub fn textured(texture: impl Into<String>, lit: bool) -> Self {
        Material {
            color: [1.0, 1.0, 1.0],
            texture: Some(texture.into()),
            opacity: 1.0,
            transparent: false,
            lit,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self.transparent = true;
        self
    }
}

pub struct Drawable {
    pub geometry: GeometryId,
    pub material: Material,
}

pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: f32,
    pub visible: bool,
    pub drawable: Option<Drawable>,
}

impl Node {
    pub fn group(name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: 1.0,
            visible: true,
            drawable: None,
        }
    }

    pub fn drawable(name: impl Into<String>, geometry: GeometryId, material: Material) -> Self {
        Node {
            drawable: Some(Drawable { geometry, material }),
            ..Node::group(name)
        }
    }

    pub fn at(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn local_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Matrix4::new_scaling(self.scale)
    }
}

pub struct Label {
    pub anchor: NodeId,
    pub text: String,
    pub opacity: f32,
}

pub struct DrawItem<'a> {
    pub node: NodeId,
    pub world: Matrix4<f32>,
    pub geometry: &'a Geometry,
    pub material: &'a Material,
}

/// Arena scene graph. Nodes are never removed; visibility and opacity are toggled instead.
#[derive(Default)]
pub struct Scene {
    nodes: Vec<Node>,
    geometries: Vec<Geometry>,
    labels: Vec<Label>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.push(geometry);
        GeometryId(self.geometries.len() - 1)
    }

    pub fn geometry(&self, id: GeometryId) -> &Geometry {
        &self.geometries[id.0]
    }

    pub fn add(&mut self, parent: Option<NodeId>, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = parent;
        self.nodes.push(node);
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.nodes[id.0].visible = visible;
    }

    pub fn set_opacity(&mut self, id: NodeId, opacity: f32) {
        if let Some(drawable) = self.nodes[id.0].drawable.as_mut() {
            drawable.material.opacity = opacity;
        }
    }

    pub fn opacity(&self, id: NodeId) -> Option<f32> {
        self.nodes[id.0].drawable.as_ref().map(|d| d.material.opacity)
    }

    pub fn set_rotation(&mut self, id: NodeId, rotation: UnitQuaternion<f32>) {
        self.nodes[id.0].rotation = rotation;
    }

    /// The node and every ancestor are visible.
    pub fn is_visible_in_tree(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id.0];
            if !node.visible {
                return false;
            }
            current = node.parent;
        }
        true
    }

    pub fn world_matrix(&self, id: NodeId) -> Matrix4<f32> {
        let node = &self.nodes[id.0];
        match node.parent {
            Some(parent) => self.world_matrix(parent) * node.local_matrix(),
            None => node.local_matrix(),
        }
    }

    pub fn world_position(&self, id: NodeId) -> Point3<f32> {
        self.world_matrix(id).transform_point(&Point3::origin())
    }

    /// Depth-first walk from the roots, skipping hidden subtrees.
    pub fn visible_drawables(&self) -> Vec<DrawItem<'_>> {
        let mut items = Vec::new();
        let mut stack: Vec<(NodeId, Matrix4<f32>)> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(i, _)| (NodeId(i), Matrix4::identity()))
            .rev()
            .collect();

        while let Some((id, parent_world)) = stack.pop() {
            let node = &self.nodes[id.0];
            if !node.visible {
                continue;
            }
            let world = parent_world * node.local_matrix();
            if let Some(drawable) = &node.drawable {
                items.push(DrawItem {
                    node: id,
                    world,
                    geometry: &self.geometries[drawable.geometry.0],
                    material: &drawable.material,
                });
            }
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
        items
    }

    /// Distinct texture paths referenced by any material.
    pub fn texture_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();
        for node in &self.nodes {
            if let Some(texture) = node.drawable.as_ref().and_then(|d| d.material.texture.as_ref()) {
                if !paths.contains(texture) {
                    paths.push(texture.clone());
                }
            }
        }
        paths
    }

    pub fn add_label(&mut self, anchor: NodeId, text: impl Into<String>) -> LabelId {
        self.labels.push(Label {
            anchor,
            text: text.into(),
            opacity: 1.0,
        });
        LabelId(self.labels.len() - 1)
    }

    pub fn set_label_opacity(&mut self, id: LabelId, opacity: f32) {
        self.labels[id.0].opacity = opacity;
    }

    pub fn label(&self, id: LabelId) -> &Label {
        &self.labels[id.0]
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }
}
