//! Per-channel isosurface lifecycle.
//!
//! Each channel is either without an isosurface or holds one
//! [`Isosurface`]: the mesh extracted at an isovalue plus its material.
//! The mesh is a cache of (channel data, isovalue) and is rebuilt whenever
//! either changes.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use tracing::{debug, info, trace};
use volviz_core::{Rgb8, VolumeStore};

use crate::field::ScalarField;
use crate::marching_cubes::marching_cubes;
use crate::mesh::{Material, MeshGeometry, TRANSPARENCY_THRESHOLD};
use crate::surface_nets::surface_nets;
use crate::IsoResult;

/// Surface extraction algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Marching cubes.
    #[default]
    MarchingCubes,
    /// Naive surface nets.
    SurfaceNets,
}

impl ExtractionMethod {
    /// Runs the algorithm on a field.
    pub fn extract(self, field: &ScalarField<'_>, isovalue: f32) -> MeshGeometry {
        match self {
            Self::MarchingCubes => marching_cubes(field, isovalue),
            Self::SurfaceNets => surface_nets(field, isovalue),
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::MarchingCubes => "marching cubes",
            Self::SurfaceNets => "surface nets",
        }
    }
}

/// An extracted surface and its material.
#[derive(Debug, Clone)]
pub struct Isosurface {
    mesh: MeshGeometry,
    isovalue: f32,
    material: Material,
}

impl Isosurface {
    /// Triangle mesh.
    pub fn mesh(&self) -> &MeshGeometry {
        &self.mesh
    }

    /// Isovalue the mesh was extracted at.
    pub fn isovalue(&self) -> f32 {
        self.isovalue
    }

    /// Surface material.
    pub fn material(&self) -> &Material {
        &self.material
    }
}

/// Read-only copy of a surface for export.
#[derive(Debug, Clone)]
pub struct IsosurfaceSnapshot {
    /// Source channel.
    pub channel: usize,
    /// Suggested file base name, `<image>_<channel>`.
    pub name: String,
    /// Isovalue of the mesh.
    pub isovalue: f32,
    /// Geometry.
    pub mesh: MeshGeometry,
    /// Material.
    pub material: Material,
}

/// Owner of every channel's isosurface.
#[derive(Debug, Default)]
pub struct IsosurfaceManager {
    surfaces: Vec<Option<Isosurface>>,
    method: ExtractionMethod,
}

impl IsosurfaceManager {
    /// Manager using `method` for extraction.
    pub fn new(method: ExtractionMethod) -> Self {
        Self { surfaces: Vec::new(), method }
    }

    /// Extraction algorithm.
    pub fn method(&self) -> ExtractionMethod {
        self.method
    }

    /// Changes the algorithm; existing surfaces keep their meshes.
    pub fn set_method(&mut self, method: ExtractionMethod) {
        self.method = method;
    }

    /// Whether a channel has a surface.
    pub fn has_isosurface(&self, channel: usize) -> bool {
        self.surface(channel).is_some()
    }

    /// Isovalue of a channel's surface.
    pub fn isovalue(&self, channel: usize) -> Option<f32> {
        self.surface(channel).map(Isosurface::isovalue)
    }

    /// A channel's surface.
    pub fn surface(&self, channel: usize) -> Option<&Isosurface> {
        self.surfaces.get(channel).and_then(Option::as_ref)
    }

    /// Channels that currently have a surface, ascending.
    pub fn channels(&self) -> impl Iterator<Item = usize> + '_ {
        self.surfaces.iter().enumerate().filter_map(|(i, s)| s.as_ref().map(|_| i))
    }

    /// Creates a surface unless the channel already has one.
    ///
    /// `opacity` defaults to 1 and `transparent` to `opacity < 0.9`.
    /// Returns whether a surface was created. Unloaded channels get an
    /// empty mesh.
    pub fn create_isosurface(
        &mut self,
        store: &VolumeStore,
        channel: usize,
        isovalue: f32,
        color: Rgb8,
        opacity: Option<f32>,
        transparent: Option<bool>,
    ) -> IsoResult<bool> {
        if self.has_isosurface(channel) {
            return Ok(false);
        }
        let opacity = opacity.unwrap_or(1.0);
        let transparent = transparent.unwrap_or(opacity < TRANSPARENCY_THRESHOLD);
        let mesh = self.extract(store, channel, isovalue)?;
        let surface = Isosurface { mesh, isovalue, material: Material::phong(color, opacity, transparent) };
        *self.slot_mut(channel) = Some(surface);
        Ok(true)
    }

    /// Re-extracts a channel's surface at a new isovalue, keeping its
    /// opacity. Does nothing without a surface or when unchanged.
    pub fn update_isovalue(&mut self, store: &VolumeStore, channel: usize, isovalue: f32) -> IsoResult<bool> {
        let Some(current) = self.surface(channel) else {
            return Ok(false);
        };
        if current.isovalue == isovalue {
            return Ok(false);
        }
        let mut material = current.material;
        material.set_opacity(material.opacity);
        let mesh = self.extract(store, channel, isovalue)?;
        self.destroy_isosurface(channel);
        *self.slot_mut(channel) = Some(Isosurface { mesh, isovalue, material });
        Ok(true)
    }

    /// Sets a surface's opacity; transparency follows it.
    pub fn update_opacity(&mut self, channel: usize, opacity: f32) -> bool {
        match self.surface_mut(channel) {
            Some(s) => {
                s.material.set_opacity(opacity);
                trace!(channel, opacity, "isosurface opacity");
                true
            }
            None => false,
        }
    }

    /// Sets a surface's color.
    pub fn recolor(&mut self, channel: usize, color: Rgb8) -> bool {
        match self.surface_mut(channel) {
            Some(s) => {
                s.material.color = color;
                true
            }
            None => false,
        }
    }

    /// Releases a channel's surface. Idempotent.
    pub fn destroy_isosurface(&mut self, channel: usize) -> bool {
        let removed = self.surfaces.get_mut(channel).and_then(Option::take);
        if let Some(s) = &removed {
            debug!(channel, triangles = s.mesh.triangle_count(), "isosurface destroyed");
        }
        removed.is_some()
    }

    /// Rebuilds the surfaces of channels whose data changed, at their
    /// current isovalues. Returns how many were rebuilt.
    pub fn on_channel_data(&mut self, store: &VolumeStore, channels: &[usize]) -> IsoResult<usize> {
        let mut rebuilt = 0;
        for &channel in channels {
            let Some(isovalue) = self.isovalue(channel) else {
                continue;
            };
            let mesh = self.extract(store, channel, isovalue)?;
            if let Some(s) = self.surface_mut(channel) {
                s.mesh = mesh;
                rebuilt += 1;
            }
        }
        Ok(rebuilt)
    }

    /// Export copy of a channel's surface.
    pub fn snapshot(&self, store: &VolumeStore, channel: usize) -> Option<IsosurfaceSnapshot> {
        let surface = self.surface(channel)?;
        let channel_name = store.channel(channel).map(|c| c.name().to_string()).unwrap_or_else(|_| channel.to_string());
        Some(IsosurfaceSnapshot {
            channel,
            name: format!("{}_{}", store.name(), channel_name),
            isovalue: surface.isovalue,
            mesh: surface.mesh.clone(),
            material: surface.material,
        })
    }

    /// Releases every surface.
    pub fn cleanup(&mut self) {
        let count = self.channels().count();
        self.surfaces.clear();
        if count > 0 {
            debug!(count, "isosurfaces released");
        }
    }

    fn extract(&self, store: &VolumeStore, channel: usize, isovalue: f32) -> IsoResult<MeshGeometry> {
        let ch = store.channel(channel)?;
        let field = match store.tile_layout() {
            Ok(layout) => ScalarField::from_channel(ch, &layout)?,
            Err(_) => ScalarField::empty(),
        };
        let mesh = self.method.extract(&field, isovalue);
        debug!(
            channel,
            isovalue,
            method = self.method.name(),
            triangles = mesh.triangle_count(),
            "isosurface extracted"
        );
        Ok(mesh)
    }

    fn surface_mut(&mut self, channel: usize) -> Option<&mut Isosurface> {
        self.surfaces.get_mut(channel).and_then(Option::as_mut)
    }

    fn slot_mut(&mut self, channel: usize) -> &mut Option<Isosurface> {
        if self.surfaces.len() <= channel {
            self.surfaces.resize_with(channel + 1, || None);
        }
        &mut self.surfaces[channel]
    }
}
