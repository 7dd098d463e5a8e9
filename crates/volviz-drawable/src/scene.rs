//! Scene nodes handed to the host's scene graph.
//!
//! Both nodes are plain snapshots built from drawable state; the host adds
//! the mesh group before the volume so surfaces are drawn first.

use glam::{Mat4, Vec3};
use volviz_iso::{Material, MeshGeometry};

/// The ray-marched volume box.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeNode {
    /// Node name.
    pub name: &'static str,
    /// Whether any channel is shown.
    pub visible: bool,
    /// Unit box to world transform.
    pub transform: Mat4,
}

impl VolumeNode {
    /// Node name used for the volume.
    pub const NAME: &'static str = "Volume";
}

/// One channel's isosurface.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode<'a> {
    /// Node name, `Channel<i>`.
    pub name: String,
    /// Source channel.
    pub channel: usize,
    /// Isovalue of the mesh.
    pub isovalue: f32,
    /// Geometry in the volume's object space.
    pub mesh: &'a MeshGeometry,
    /// Surface material.
    pub material: Material,
}

/// Container of every channel's isosurface.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGroupNode<'a> {
    /// Node name.
    pub name: &'static str,
    /// Object space to world transform, shared with the volume.
    pub transform: Mat4,
    /// One child per channel with a surface, by channel index.
    pub children: Vec<MeshNode<'a>>,
}

impl MeshGroupNode<'_> {
    /// Node name used for the mesh container.
    pub const NAME: &'static str = "Mesh Surface Container";

    /// Child for a channel.
    pub fn child(&self, channel: usize) -> Option<&MeshNode<'_>> {
        self.children.iter().find(|c| c.channel == channel)
    }

    /// Triangles over all children.
    pub fn triangle_count(&self) -> usize {
        self.children.iter().map(|c| c.mesh.triangle_count()).sum()
    }
}

/// World transform of the unit volume box for a physical scale.
pub fn volume_transform(scale: Vec3) -> Mat4 {
    Mat4::from_scale(scale)
}
