//! Triangle mesh geometry and surface material.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use volviz_core::Rgb8;

/// Opacity below which a surface is drawn as transparent.
pub const TRANSPARENCY_THRESHOLD: f32 = 0.9;

/// Indexed triangle mesh in the volume's object space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    /// Vertex positions in `[-0.5, 0.5]³`.
    pub positions: Vec<Vec3>,
    /// Unit vertex normals, pointing out of the surface.
    pub normals: Vec<Vec3>,
    /// Three indices per triangle.
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    /// Empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether there are no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Axis-aligned bounds of the vertices.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))))
    }

    /// Appends another mesh, offsetting its indices.
    pub fn append(&mut self, other: MeshGeometry) {
        let base = self.positions.len() as u32;
        self.positions.extend(other.positions);
        self.normals.extend(other.normals);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Concatenates meshes in order.
    pub fn merge(parts: Vec<MeshGeometry>) -> Self {
        let mut merged = Self {
            positions: Vec::with_capacity(parts.iter().map(|m| m.positions.len()).sum()),
            normals: Vec::with_capacity(parts.iter().map(|m| m.normals.len()).sum()),
            indices: Vec::with_capacity(parts.iter().map(|m| m.indices.len()).sum()),
        };
        for part in parts {
            merged.append(part);
        }
        merged
    }

    pub(crate) fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        index
    }

    /// Adds a triangle wound counter-clockwise around its vertex normals.
    pub(crate) fn push_triangle(&mut self, [a, b, c]: [u32; 3]) {
        let p = |i: u32| self.positions[i as usize];
        let n = |i: u32| self.normals[i as usize];
        let face = (p(b) - p(a)).cross(p(c) - p(a));
        if face.dot(n(a) + n(b) + n(c)) < 0.0 {
            self.indices.extend_from_slice(&[a, c, b]);
        } else {
            self.indices.extend_from_slice(&[a, b, c]);
        }
    }
}

/// Phong surface material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Diffuse color.
    pub color: Rgb8,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Drawn in the transparent pass.
    pub transparent: bool,
    /// Specular exponent.
    pub shininess: f32,
    /// Specular color.
    pub specular: Rgb8,
}

impl Material {
    /// Default specular exponent.
    pub const SHININESS: f32 = 7.0;
    /// Default specular color.
    pub const SPECULAR: Rgb8 = Rgb8::new(0x11, 0x11, 0x11);

    /// Phong material with the default highlights.
    pub fn phong(color: Rgb8, opacity: f32, transparent: bool) -> Self {
        Self { color, opacity, transparent, shininess: Self::SHININESS, specular: Self::SPECULAR }
    }

    /// Sets the opacity; transparency follows it.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
        self.transparent = opacity < TRANSPARENCY_THRESHOLD;
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::phong(Rgb8::new(255, 255, 255), 1.0, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(offset: f32) -> MeshGeometry {
        let mut m = MeshGeometry::new();
        let n = Vec3::Z;
        let a = m.push_vertex(Vec3::new(offset, 0.0, 0.0), n);
        let b = m.push_vertex(Vec3::new(offset + 1.0, 0.0, 0.0), n);
        let c = m.push_vertex(Vec3::new(offset, 1.0, 0.0), n);
        m.push_triangle([a, c, b]);
        m
    }

    #[test]
    fn test_winding_follows_normals() {
        let m = tri(0.0);
        let p = |i: usize| m.positions[m.indices[i] as usize];
        assert!((p(1) - p(0)).cross(p(2) - p(0)).z > 0.0);
    }

    #[test]
    fn test_merge_offsets_indices() {
        let m = MeshGeometry::merge(vec![tri(0.0), tri(5.0)]);
        assert_eq!(m.triangle_count(), 2);
        assert_eq!(m.vertex_count(), 6);
        assert!(m.indices[3..].iter().all(|&i| i >= 3));
        let (lo, hi) = m.bounds().unwrap();
        assert_eq!(lo, Vec3::ZERO);
        assert_eq!(hi, Vec3::new(6.0, 1.0, 0.0));
    }

    #[test]
    fn test_opacity_drives_transparency() {
        let mut mat = Material::phong(Rgb8::new(1, 2, 3), 1.0, false);
        mat.set_opacity(0.5);
        assert!(mat.transparent);
        mat.set_opacity(0.95);
        assert!(!mat.transparent);
        assert_eq!(mat.specular.to_hex(), 0x111111);
    }
}
