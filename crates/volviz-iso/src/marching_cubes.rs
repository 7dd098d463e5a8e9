//! Marching cubes over an 8-bit scalar field.
//!
//! Cells are processed in parallel per z-slab and the slab meshes are
//! concatenated in slab order, so the output is deterministic. Vertices
//! are shared inside a cell but not across cells.

use glam::Vec3;
use rayon::prelude::*;
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::field::ScalarField;
use crate::mesh::MeshGeometry;
use crate::tables::{CORNER_OFFSETS, EDGE_CONNECTIONS, case_triangles, crossed_edges};

/// Extracts the surface where the field crosses `isovalue`.
///
/// Returns an empty mesh for fields too small to hold a cell.
pub fn marching_cubes(field: &ScalarField<'_>, isovalue: f32) -> MeshGeometry {
    if field.is_empty() {
        return MeshGeometry::new();
    }
    let [w, h, d] = field.dims();
    trace!(w, h, d, isovalue, "marching cubes");

    let slabs: Vec<MeshGeometry> = (0..d - 1)
        .into_par_iter()
        .map(|z| {
            let mut mesh = MeshGeometry::new();
            for y in 0..h - 1 {
                for x in 0..w - 1 {
                    process_cell(field, x, y, z, isovalue, &mut mesh);
                }
            }
            mesh
        })
        .collect();
    MeshGeometry::merge(slabs)
}

fn process_cell(field: &ScalarField<'_>, x: usize, y: usize, z: usize, iso: f32, mesh: &mut MeshGeometry) {
    let mut values = [0.0f32; 8];
    let mut corners = [[0usize; 3]; 8];
    let mut case = 0u8;
    for (i, [dx, dy, dz]) in CORNER_OFFSETS.iter().enumerate() {
        corners[i] = [x + dx, y + dy, z + dz];
        values[i] = field.value(x + dx, y + dy, z + dz);
        if values[i] < iso {
            case |= 1 << i;
        }
    }

    let edges = crossed_edges(case);
    if edges == 0 {
        return;
    }

    let mut slots = [u32::MAX; 12];
    for (e, [c0, c1]) in EDGE_CONNECTIONS.iter().enumerate() {
        if edges & (1 << e) == 0 {
            continue;
        }
        let (v0, v1) = (values[*c0], values[*c1]);
        let t = ((iso - v0) / (v1 - v0)).clamp(0.0, 1.0);
        let p0 = corner_vec(corners[*c0]);
        let p1 = corner_vec(corners[*c1]);
        let g0 = field.gradient(corners[*c0][0], corners[*c0][1], corners[*c0][2]);
        let g1 = field.gradient(corners[*c1][0], corners[*c1][1], corners[*c1][2]);
        let position = field.to_object(p0.lerp(p1, t));
        let normal = field.normal_to_object(g0.lerp(g1, t));
        slots[e] = mesh.push_vertex(position, normal);
    }

    for tri in case_triangles(case) {
        mesh.push_triangle(tri.map(|e| slots[e as usize]));
    }
}

fn corner_vec([x, y, z]: [usize; 3]) -> Vec3 {
    Vec3::new(x as f32, y as f32, z as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ball of radius `r` voxels centred in an `n`-cube, 200 inside.
    pub(crate) fn ball(n: usize, r: f32) -> Vec<u8> {
        let c = (n as f32 - 1.0) / 2.0;
        let mut data = vec![0u8; n * n * n];
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let p = Vec3::new(x as f32, y as f32, z as f32) - c;
                    // smooth ramp across the boundary
                    let v = (200.0 * (r + 1.0 - p.length()) / 2.0).clamp(0.0, 200.0);
                    data[x + y * n + z * n * n] = v as u8;
                }
            }
        }
        data
    }

    #[test]
    fn test_uniform_field_is_empty() {
        let data = vec![50u8; 27];
        let f = ScalarField::new(&data, [3, 3, 3]).unwrap();
        assert!(marching_cubes(&f, 10.0).is_empty());
        assert!(marching_cubes(&f, 100.0).is_empty());
    }

    #[test]
    fn test_ball_is_closed_and_centred() {
        let data = ball(16, 5.0);
        let f = ScalarField::new(&data, [16, 16, 16]).unwrap();
        let mesh = marching_cubes(&f, 100.0);
        assert!(mesh.triangle_count() > 50);
        assert_eq!(mesh.positions.len(), mesh.normals.len());
        let (lo, hi) = mesh.bounds().unwrap();
        assert!(lo.cmpgt(Vec3::splat(-0.5)).all() && hi.cmplt(Vec3::splat(0.5)).all());
        assert!((lo + hi).length() < 0.05);
    }

    #[test]
    fn test_ball_normals_point_outward() {
        let data = ball(16, 5.0);
        let f = ScalarField::new(&data, [16, 16, 16]).unwrap();
        let mesh = marching_cubes(&f, 100.0);
        let outward = mesh
            .positions
            .iter()
            .zip(&mesh.normals)
            .filter(|(p, n)| p.dot(**n) > 0.0)
            .count();
        assert!(outward as f32 > 0.95 * mesh.vertex_count() as f32);
        // triangle winding agrees with the normals
        let facing_out = mesh
            .indices
            .chunks_exact(3)
            .filter(|tri| {
                let p = |i: usize| mesh.positions[tri[i] as usize];
                let centroid = (p(0) + p(1) + p(2)) / 3.0;
                (p(1) - p(0)).cross(p(2) - p(0)).dot(centroid) > 0.0
            })
            .count();
        assert!(facing_out as f32 > 0.95 * mesh.triangle_count() as f32);
    }

    #[test]
    fn test_higher_isovalue_shrinks_surface() {
        let data = ball(16, 5.0);
        let f = ScalarField::new(&data, [16, 16, 16]).unwrap();
        let (_, outer) = marching_cubes(&f, 20.0).bounds().unwrap();
        let (_, inner) = marching_cubes(&f, 180.0).bounds().unwrap();
        assert!(inner.x < outer.x);
    }
}
