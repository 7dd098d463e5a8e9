//! Integration tests for volviz crates.
//!
//! End-to-end checks across crate boundaries: channel store to atlas
//! fusion to ray marching, channel store to isosurfaces, and the drawable
//! facade tying both together. The helpers below build small synthetic
//! volumes for those tests.

pub mod digest;

use glam::Vec3;
use volviz_atlas::{AtlasFuser, CombineMode, FuseResult, FusedTextures, FusionEntry};
use volviz_core::{ChannelColor, Phantom, TileLayout, VolumeInfo, VolumeResult, VolumeStore, color_for_channel};
use volviz_march::CameraState;

/// Cubic store of side `n` with one loaded channel per phantom.
pub fn store_with(phantoms: &[Phantom], n: u32) -> VolumeResult<VolumeStore> {
    let layout = TileLayout::packed(n, n, n)?;
    let names = phantoms.iter().map(|p| p.to_string()).collect();
    let mut store = VolumeStore::new(VolumeInfo::new("phantoms", layout, names))?;
    for (i, p) in phantoms.iter().enumerate() {
        store.set_channel_data_from_volume(i, &p.generate(n, n, n))?;
    }
    Ok(store)
}

/// Fuses every channel with its palette color.
pub fn fuse_all(store: &VolumeStore, mode: CombineMode) -> FuseResult<FusedTextures> {
    let entries: Vec<FusionEntry> = (0..store.channel_count())
        .map(|i| FusionEntry::new(i, ChannelColor::Enabled(color_for_channel(i))))
        .collect();
    let mut fuser = AtlasFuser::new();
    Ok(fuser.fuse(&entries, store, mode, None)?.clone())
}

/// Square viewport looking down -z at the volume from 2.5 units.
pub fn camera(size: u32) -> CameraState {
    CameraState::look_at(Vec3::new(0.0, 0.0, 2.5), Vec3::ZERO, Vec3::Y, 0.8, size, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use volviz_core::{IntensityLut, Rgb8};
    use volviz_drawable::{DrawableConfig, VolumeDrawable};
    use volviz_iso::{ExtractionMethod, IsosurfaceManager};
    use volviz_march::{Backend, RayMarchIntegrator, RenderSettings};

    const RED: Rgb8 = Rgb8::new(255, 0, 0);

    fn settings() -> RenderSettings {
        RenderSettings { density: 0.1, brightness: 1.0, ..Default::default() }
    }

    /// Four 2x2 slices packed 2x2, intensity = voxel index * 16.
    #[test]
    fn test_red_tiles_scaled_by_intensity() {
        let layout = TileLayout::new(2, 2, 4, 2, 2).unwrap();
        let mut store = VolumeStore::new(VolumeInfo::new("red", layout, vec!["c".into()])).unwrap();
        let data: Vec<u8> = (0..16).map(|i| (i * 16) as u8).collect();
        store.set_channel_data_from_volume(0, &data).unwrap();

        let entries = [FusionEntry::new(0, ChannelColor::Enabled(RED)).with_lut(IntensityLut::identity())];
        let mut fuser = AtlasFuser::new();
        let atlas = &fuser.fuse(&entries, &store, CombineMode::Max, None).unwrap().atlas;

        for z in 0..4u32 {
            let (ox, oy) = layout.tile_origin(z);
            for y in 0..2u32 {
                for x in 0..2u32 {
                    let v = data[(z * 4 + y * 2 + x) as usize];
                    assert_eq!(atlas.texel(ox + x, oy + y), [v, 0, 0, v], "slice {z} at {x},{y}");
                }
            }
        }
    }

    #[test]
    fn test_max_combine_is_order_independent() {
        let store = store_with(&[Phantom::Ball, Phantom::Gradient, Phantom::Shell], 8).unwrap();
        let entry = |i: usize| FusionEntry::new(i, ChannelColor::Enabled(color_for_channel(i)));
        let forward: Vec<_> = (0..3).map(entry).collect();
        let backward: Vec<_> = (0..3).rev().map(entry).collect();

        let mut a = AtlasFuser::new();
        let mut b = AtlasFuser::new();
        let fa = a.fuse(&forward, &store, CombineMode::Max, None).unwrap().atlas.data().to_vec();
        let fb = b.fuse(&backward, &store, CombineMode::Max, None).unwrap().atlas.data().to_vec();
        assert_eq!(fa, fb);
    }

    #[test]
    fn test_enabling_channel_never_darkens_max_fusion() {
        let store = store_with(&[Phantom::Ball, Phantom::Gradient], 8).unwrap();
        let mut entries = vec![
            FusionEntry::new(0, ChannelColor::Enabled(RED)),
            FusionEntry::new(1, ChannelColor::Disabled),
        ];
        let mut fuser = AtlasFuser::new();
        let before = fuser.fuse(&entries, &store, CombineMode::Max, None).unwrap().atlas.data().to_vec();

        entries[1].color = ChannelColor::Enabled(Rgb8::new(0, 0, 255));
        let after = fuser.fuse(&entries, &store, CombineMode::Max, None).unwrap().atlas.data().to_vec();
        assert!(before.iter().zip(&after).all(|(b, a)| a >= b));

        // toggling back restores the original atlas
        entries[1].color = ChannelColor::Disabled;
        let again = fuser.fuse(&entries, &store, CombineMode::Max, None).unwrap().atlas.data().to_vec();
        assert_eq!(before, again);
    }

    #[test]
    fn test_store_fuse_march() {
        let store = store_with(&[Phantom::Ball], 16).unwrap();
        let mut it = RayMarchIntegrator::new(Backend::Cpu).unwrap();
        it.set_settings(settings()).unwrap();
        it.upload(&fuse_all(&store, CombineMode::Max).unwrap()).unwrap();

        let frame = it.render(&camera(32)).unwrap();
        let center = frame.pixel(16, 16);
        assert!(center[3] > 0.0);
        // ball color is the first palette entry, magenta
        assert!(center[0] > 0.0 && center[2] > 0.0);
        assert_relative_eq!(center[1], 0.0);
        assert_eq!(frame.pixel(0, 0), [0.0; 4]);
    }

    #[test]
    fn test_mip_is_brighter_than_composite_at_low_density() {
        let store = store_with(&[Phantom::Ball], 16).unwrap();
        let textures = fuse_all(&store, CombineMode::Max).unwrap();
        let render = |max_projection| {
            let mut it = RayMarchIntegrator::new(Backend::Cpu).unwrap();
            it.set_settings(RenderSettings { density: 0.01, max_projection, ..settings() }).unwrap();
            it.upload(&textures).unwrap();
            it.render(&camera(16)).unwrap().pixel(8, 8)
        };
        assert!(render(true)[0] > render(false)[0]);
    }

    #[test]
    fn test_store_to_isosurface() {
        let store = store_with(&[Phantom::Ball, Phantom::Uniform], 16).unwrap();
        let mut surfaces = IsosurfaceManager::new(ExtractionMethod::MarchingCubes);
        surfaces.create_isosurface(&store, 0, 128.0, RED, None, None).unwrap();
        surfaces.create_isosurface(&store, 1, 128.0, RED, None, None).unwrap();

        let ball = surfaces.surface(0).unwrap().mesh();
        let (min, max) = ball.bounds().unwrap();
        assert!(min.cmpgt(Vec3::splat(-0.5)).all() && max.cmplt(Vec3::splat(0.5)).all());
        assert_relative_eq!(min.x, -max.x, epsilon = 0.02);
        // a uniform field never crosses the isovalue
        assert!(surfaces.surface(1).unwrap().mesh().is_empty());
    }

    #[test]
    fn test_drawable_visibility_scenario() {
        let layout = TileLayout::packed(8, 8, 8).unwrap();
        let info = VolumeInfo::new("img", layout, vec!["a".into(), "b".into(), "c".into()]);
        let mut d = VolumeDrawable::new(info, DrawableConfig::cpu()).unwrap();
        for ch in 0..3 {
            d.set_channel_data_from_volume(ch, &Phantom::Ball.generate(8, 8, 8)).unwrap();
        }
        for ch in 0..3 {
            d.set_volume_channel_enabled(ch, false);
        }
        assert!(!d.volume_node().visible);
        d.set_volume_channel_enabled(2, true);
        assert!(d.volume_node().visible);
    }

    #[test]
    fn test_drawable_render_and_surface_share_transform() {
        let layout = TileLayout::packed(16, 16, 8).unwrap();
        let info = VolumeInfo::new("img", layout, vec!["a".into()]);
        let mut d = VolumeDrawable::new(info, DrawableConfig::cpu()).unwrap();
        d.set_channel_data_from_volume(0, &Phantom::Ball.generate(16, 16, 8)).unwrap();
        d.set_density(0.1);
        d.set_brightness(1.0);
        d.create_isosurface(0, 128.0, Some(0.5), None);

        let scale = d.scale();
        assert!(scale.z < scale.x);
        assert_eq!(d.volume_node().transform, d.mesh_group().transform);
        assert!(d.render(&camera(16)).unwrap().unwrap().covered_pixels() > 0);
        assert!(d.mesh_group().child(0).unwrap().material.transparent);
    }

    #[cfg(feature = "wgpu")]
    #[test]
    fn test_gpu_matches_cpu() {
        if !Backend::Wgpu.is_available() {
            eprintln!("skipping: no wgpu adapter");
            return;
        }
        let store = store_with(&[Phantom::Cells, Phantom::Shell], 16).unwrap();
        let textures = fuse_all(&store, CombineMode::Max).unwrap();
        let render = |backend| {
            let mut it = RayMarchIntegrator::new(backend).unwrap();
            it.set_settings(settings()).unwrap();
            it.upload(&textures).unwrap();
            it.render(&camera(32)).unwrap()
        };
        let cpu = render(Backend::Cpu);
        let gpu = render(Backend::Wgpu);
        let max_diff = cpu
            .data()
            .iter()
            .zip(gpu.data())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(max_diff < 0.05, "max diff {max_diff}");
    }
}
