//! Marching cubes lookup tables.
//!
//! Corner `i` is set in the cube index when its value is below the
//! isovalue. Edge `e` joins the corners in [`EDGE_CONNECTIONS`]`[e]`.
//!
//! The triangle table is built once on first use by walking the surface
//! loops around the six cube faces. An ambiguous face (set corners on one
//! diagonal) always isolates its set corners; the choice depends only on
//! the face, so neighbouring cells agree and the mesh is watertight.

use std::sync::OnceLock;

/// Corner offsets in cell units.
pub(crate) const CORNER_OFFSETS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
];

/// Corner pairs joined by each edge.
pub(crate) const EDGE_CONNECTIONS: [[usize; 2]; 12] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

/// Cube faces, corners counter-clockwise seen from outside.
const FACES: [[usize; 4]; 6] = [
    [0, 3, 2, 1],
    [4, 5, 6, 7],
    [0, 1, 5, 4],
    [3, 7, 6, 2],
    [0, 4, 7, 3],
    [1, 2, 6, 5],
];

/// Edge triples per cube index.
type CaseTable = Vec<Vec<[u8; 3]>>;

static TRIANGLES: OnceLock<CaseTable> = OnceLock::new();

/// Triangles for a cube index, as edge triples.
pub(crate) fn case_triangles(case: u8) -> &'static [[u8; 3]] {
    &TRIANGLES.get_or_init(build_table)[case as usize]
}

/// Bit `e` set when edge `e` crosses the surface.
pub(crate) fn crossed_edges(case: u8) -> u16 {
    let set = |c: usize| case & (1 << c) != 0;
    EDGE_CONNECTIONS
        .iter()
        .enumerate()
        .filter(|(_, [a, b])| set(*a) != set(*b))
        .fold(0, |mask, (e, _)| mask | (1 << e))
}

fn edge_between(a: usize, b: usize) -> usize {
    EDGE_CONNECTIONS
        .iter()
        .position(|&[p, q]| (p, q) == (a, b) || (p, q) == (b, a))
        .unwrap_or_default()
}

fn build_table() -> CaseTable {
    (0..=255u8).map(triangulate_case).collect()
}

fn triangulate_case(case: u8) -> Vec<[u8; 3]> {
    let set = |c: usize| case & (1 << c) != 0;

    // next[e]: the edge reached from crossing edge `e` across the face in
    // which `e` leaves the set region.
    let mut next: [Option<usize>; 12] = [None; 12];
    for face in FACES {
        for k in 0..4 {
            let (a, b) = (face[k], face[(k + 1) % 4]);
            if set(a) && !set(b) {
                // walk back to where the set run began
                let mut j = k;
                loop {
                    let prev = (j + 3) % 4;
                    if !set(face[prev]) {
                        next[edge_between(a, b)] = Some(edge_between(face[prev], face[j]));
                        break;
                    }
                    j = prev;
                }
            }
        }
    }

    let mut triangles = Vec::new();
    let mut visited = [false; 12];
    for start in 0..12 {
        if visited[start] || next[start].is_none() {
            continue;
        }
        let mut ring = Vec::new();
        let mut e = start;
        while !visited[e] {
            visited[e] = true;
            ring.push(e as u8);
            match next[e] {
                Some(n) => e = n,
                None => break,
            }
        }
        for i in 1..ring.len().saturating_sub(1) {
            triangles.push([ring[0], ring[i], ring[i + 1]]);
        }
    }
    triangles
}
