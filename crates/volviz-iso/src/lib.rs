//! # volviz-iso
//!
//! Isosurface extraction and lifecycle for volume channels.
//!
//! A channel's 8-bit samples are read as a scalar field and the surface
//! where it crosses an isovalue is extracted as an indexed triangle mesh in
//! the volume's object space `[-0.5, 0.5]³`.
//!
//! # Algorithms
//!
//! - [`marching_cubes`] - Classic marching cubes, parallel per z-slab
//! - [`surface_nets`] - Naive surface nets, one vertex per cell
//!
//! # Usage
//!
//! ```rust
//! use volviz_core::{Rgb8, TileLayout, VolumeInfo, VolumeStore};
//! use volviz_iso::{ExtractionMethod, IsosurfaceManager};
//!
//! let layout = TileLayout::packed(4, 4, 4).unwrap();
//! let mut store = VolumeStore::new(VolumeInfo::new("img", layout, vec!["dna".into()])).unwrap();
//! let data: Vec<u8> = (0..64).map(|i| if i % 4 >= 2 { 255 } else { 0 }).collect();
//! store.set_channel_data_from_volume(0, &data).unwrap();
//!
//! let mut surfaces = IsosurfaceManager::new(ExtractionMethod::MarchingCubes);
//! surfaces.create_isosurface(&store, 0, 128.0, Rgb8::new(255, 0, 0), None, None).unwrap();
//! assert!(surfaces.surface(0).unwrap().mesh().triangle_count() > 0);
//! ```
//!
//! # Dependencies
//!
//! - [`volviz-core`] - Channels and tile layout
//! - [`glam`] - Vector math
//! - [`rayon`] - Parallel slab extraction

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod field;
pub mod manager;
pub mod marching_cubes;
pub mod mesh;
pub mod surface_nets;
mod tables;

pub use error::{IsoError, IsoResult};
pub use field::ScalarField;
pub use manager::{ExtractionMethod, Isosurface, IsosurfaceManager, IsosurfaceSnapshot};
pub use marching_cubes::marching_cubes;
pub use mesh::{Material, MeshGeometry, TRANSPARENCY_THRESHOLD};
pub use surface_nets::surface_nets;
