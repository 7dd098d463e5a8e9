//! Naive surface nets over an 8-bit scalar field.
//!
//! One vertex per cell that straddles the isovalue, placed at the mean of
//! its edge crossings; one quad per crossing lattice edge, joining the four
//! cells around it. Smoother than marching cubes, with far fewer vertices,
//! at the cost of sharp features.

use std::collections::HashMap;

use glam::Vec3;
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::field::ScalarField;
use crate::mesh::MeshGeometry;

/// Corner offsets, bit 0 = x, bit 1 = y, bit 2 = z.
const CORNERS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

/// Cell edges as corner pairs.
const EDGES: [(usize, usize); 12] = [
    (0, 1),
    (2, 3),
    (4, 5),
    (6, 7),
    (0, 2),
    (1, 3),
    (4, 6),
    (5, 7),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Extracts the surface where the field crosses `isovalue`.
pub fn surface_nets(field: &ScalarField<'_>, isovalue: f32) -> MeshGeometry {
    let mut mesh = MeshGeometry::new();
    if field.is_empty() {
        return mesh;
    }
    let [w, h, d] = field.dims();
    trace!(w, h, d, isovalue, "surface nets");
    let cell = |x: usize, y: usize, z: usize| x + y * (w - 1) + z * (w - 1) * (h - 1);

    let mut vertices: HashMap<usize, u32> = HashMap::new();
    for z in 0..d - 1 {
        for y in 0..h - 1 {
            for x in 0..w - 1 {
                if let Some((position, normal)) = cell_vertex(field, x, y, z, isovalue) {
                    vertices.insert(cell(x, y, z), mesh.push_vertex(position, normal));
                }
            }
        }
    }

    for z in 0..d - 1 {
        for y in 0..h - 1 {
            for x in 0..w - 1 {
                if !vertices.contains_key(&cell(x, y, z)) {
                    continue;
                }
                let inside = field.value(x, y, z) >= isovalue;
                // lattice edges leaving corner 0 along x, y and z
                let crosses = |dx, dy, dz| (field.value(x + dx, y + dy, z + dz) >= isovalue) != inside;
                if crosses(1, 0, 0) && y > 0 && z > 0 {
                    quad(&mut mesh, &vertices, [cell(x, y, z), cell(x, y - 1, z), cell(x, y - 1, z - 1), cell(x, y, z - 1)]);
                }
                if crosses(0, 1, 0) && x > 0 && z > 0 {
                    quad(&mut mesh, &vertices, [cell(x, y, z), cell(x, y, z - 1), cell(x - 1, y, z - 1), cell(x - 1, y, z)]);
                }
                if crosses(0, 0, 1) && x > 0 && y > 0 {
                    quad(&mut mesh, &vertices, [cell(x, y, z), cell(x - 1, y, z), cell(x - 1, y - 1, z), cell(x, y - 1, z)]);
                }
            }
        }
    }
    mesh
}

fn cell_vertex(field: &ScalarField<'_>, x: usize, y: usize, z: usize, iso: f32) -> Option<(Vec3, Vec3)> {
    let values: [f32; 8] = CORNERS.map(|[dx, dy, dz]| field.value(x + dx, y + dy, z + dz));
    let inside = values.iter().filter(|&&v| v >= iso).count();
    if inside == 0 || inside == 8 {
        return None;
    }

    let mut sum = Vec3::ZERO;
    let mut count = 0;
    for (i0, i1) in EDGES {
        let (v0, v1) = (values[i0], values[i1]);
        if (v0 >= iso) == (v1 >= iso) {
            continue;
        }
        let t = if (v1 - v0).abs() > 1e-6 { ((iso - v0) / (v1 - v0)).clamp(0.0, 1.0) } else { 0.5 };
        let p0 = Vec3::from(CORNERS[i0].map(|c| c as f32));
        let p1 = Vec3::from(CORNERS[i1].map(|c| c as f32));
        sum += p0.lerp(p1, t);
        count += 1;
    }
    let local = sum / count as f32;

    let gradient = CORNERS
        .iter()
        .map(|[dx, dy, dz]| field.gradient(x + dx, y + dy, z + dz))
        .sum::<Vec3>();
    let origin = Vec3::new(x as f32, y as f32, z as f32);
    Some((field.to_object(origin + local), field.normal_to_object(gradient)))
}

fn quad(mesh: &mut MeshGeometry, vertices: &HashMap<usize, u32>, cells: [usize; 4]) {
    let [Some(&a), Some(&b), Some(&c), Some(&d)] = cells.map(|i| vertices.get(&i)) else {
        return;
    };
    mesh.push_triangle([a, b, c]);
    mesh.push_triangle([a, c, d]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marching_cubes::marching_cubes;

    fn cube_in_box(n: usize) -> Vec<u8> {
        let mut data = vec![0u8; n * n * n];
        for z in 2..n - 2 {
            for y in 2..n - 2 {
                for x in 2..n - 2 {
                    data[x + y * n + z * n * n] = 255;
                }
            }
        }
        data
    }

    #[test]
    fn test_empty_when_no_crossing() {
        let data = vec![0u8; 64];
        let f = ScalarField::new(&data, [4, 4, 4]).unwrap();
        assert!(surface_nets(&f, 128.0).is_empty());
    }

    #[test]
    fn test_box_surface() {
        let n = 10;
        let data = cube_in_box(n);
        let f = ScalarField::new(&data, [n, n, n]).unwrap();
        let mesh = surface_nets(&f, 128.0);
        assert!(!mesh.is_empty());
        let (lo, hi) = mesh.bounds().unwrap();
        assert!((lo + hi).length() < 1e-4);
        // one vertex per straddling cell, several per cell for marching cubes
        assert!(mesh.vertex_count() < marching_cubes(&f, 128.0).vertex_count());
    }

    #[test]
    fn test_normals_point_outward() {
        let n = 10;
        let data = cube_in_box(n);
        let f = ScalarField::new(&data, [n, n, n]).unwrap();
        let mesh = surface_nets(&f, 128.0);
        let outward = mesh.positions.iter().zip(&mesh.normals).filter(|(p, nrm)| p.dot(**nrm) > 0.0).count();
        assert!(outward as f32 > 0.95 * mesh.vertex_count() as f32);
    }
}
