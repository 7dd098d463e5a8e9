//! Content digests for determinism checks.
//!
//! Frames and meshes are quantized before hashing so that digests compare
//! output, not float noise below display precision.

use sha2::{Digest, Sha256};
use volviz_iso::MeshGeometry;
use volviz_march::RenderedFrame;

/// Decimal places kept when hashing floats.
const HASH_PRECISION: i32 = 5;

/// SHA256 of quantized floats.
pub fn digest_f32(data: &[f32]) -> [u8; 32] {
    let factor = 10f64.powi(HASH_PRECISION);
    let mut hasher = Sha256::new();
    for &v in data {
        hasher.update(((v as f64 * factor).round() as i64).to_le_bytes());
    }
    hasher.finalize().into()
}

/// Digest of a frame's RGBA data and size.
pub fn frame_digest(frame: &RenderedFrame) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(frame.width.to_le_bytes());
    hasher.update(frame.height.to_le_bytes());
    hasher.update(digest_f32(frame.data()));
    hasher.finalize().into()
}

/// Digest of positions, normals and indices in order.
pub fn mesh_digest(mesh: &MeshGeometry) -> [u8; 32] {
    let flat = |v: &[glam::Vec3]| v.iter().flat_map(|p| p.to_array()).collect::<Vec<f32>>();
    let mut hasher = Sha256::new();
    hasher.update(digest_f32(&flat(&mesh.positions)));
    hasher.update(digest_f32(&flat(&mesh.normals)));
    for &i in &mesh.indices {
        hasher.update(i.to_le_bytes());
    }
    hasher.finalize().into()
}
