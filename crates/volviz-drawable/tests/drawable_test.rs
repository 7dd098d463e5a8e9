//! Facade tests for volviz-drawable.

use glam::Vec3;
use volviz_core::{IntensityLut, Rgb8, TileLayout, VolumeInfo};
use volviz_drawable::{DrawableConfig, MeshGroupNode, VolumeDrawable, VolumeNode};
use volviz_iso::ExtractionMethod;
use volviz_march::CameraState;

const N: u32 = 10;

/// Ball of radius ~3 voxels, brightest at the center.
fn ball() -> Vec<u8> {
    let c = (N as f32 - 1.0) / 2.0;
    (0..N * N * N)
        .map(|i| {
            let p = Vec3::new((i % N) as f32, (i / N % N) as f32, (i / (N * N)) as f32);
            (250.0 - 50.0 * (p - c).length()).clamp(0.0, 250.0) as u8
        })
        .collect()
}

fn drawable(names: &[&str]) -> VolumeDrawable {
    let layout = TileLayout::packed(N, N, N).unwrap();
    let info = VolumeInfo::new("img", layout, names.iter().map(|s| s.to_string()).collect());
    let mut d = VolumeDrawable::new(info, DrawableConfig::cpu()).unwrap();
    d.set_density(0.1);
    d.set_brightness(1.0);
    d
}

fn camera() -> CameraState {
    CameraState::look_at(Vec3::new(0.0, 0.0, 2.5), Vec3::ZERO, Vec3::Y, 0.8, 24, 24)
}

#[test]
fn test_visibility_follows_enabled_channels() {
    let mut d = drawable(&["a", "b"]);
    d.set_channel_data_from_volume(0, &ball()).unwrap();
    d.set_channel_data_from_volume(1, &ball()).unwrap();
    assert!(d.volume_node().visible);

    d.set_volume_channel_enabled(0, false);
    assert!(d.volume_node().visible);
    d.set_volume_channel_enabled(1, false);
    assert!(!d.volume_node().visible);
    assert!(d.render(&camera()).unwrap().is_none());

    d.set_volume_channel_enabled(1, true);
    assert!(d.volume_node().visible);
    let frame = d.render(&camera()).unwrap().unwrap();
    assert!(frame.covered_pixels() > 0);
}

#[test]
fn test_black_initial_color_starts_hidden() {
    let layout = TileLayout::packed(N, N, N).unwrap();
    let mut info = VolumeInfo::new("img", layout, vec!["a".into()]);
    info.channel_colors = vec![Rgb8::BLACK];
    let d = VolumeDrawable::new(info, DrawableConfig::cpu()).unwrap();
    assert!(!d.is_volume_channel_enabled(0));
    assert!(!d.volume_node().visible);
}

#[test]
fn test_render_before_data_is_none() {
    let d = drawable(&["a"]);
    assert!(d.render(&camera()).unwrap().is_none());
}

#[test]
fn test_color_update_refuses_and_recolors() {
    let mut d = drawable(&["a"]);
    d.set_channel_data_from_volume(0, &ball()).unwrap();
    d.create_isosurface(0, 100.0, None, None);
    let before = d.fused_textures().unwrap().atlas.generation();

    let red = Rgb8::new(255, 0, 0);
    d.update_channel_color(0, red);
    let textures = d.fused_textures().unwrap();
    assert!(textures.atlas.generation() > before);
    assert!(textures.atlas.data().chunks(4).all(|px| px[1] == 0 && px[2] == 0));
    assert_eq!(d.mesh_group().child(0).unwrap().material.color, red);
}

#[test]
fn test_color_of_disabled_channel_is_remembered() {
    let mut d = drawable(&["a"]);
    d.set_channel_data_from_volume(0, &ball()).unwrap();
    d.set_volume_channel_enabled(0, false);
    let generation = d.fused_textures().unwrap().atlas.generation();

    let green = Rgb8::new(0, 255, 0);
    d.update_channel_color(0, green);
    // disabled channels are not re-fused
    assert_eq!(d.fused_textures().unwrap().atlas.generation(), generation);
    d.set_volume_channel_enabled(0, true);
    assert_eq!(d.channel_color(0), Some(green));
    assert!(d.fused_textures().unwrap().atlas.data().chunks(4).all(|px| px[0] == 0));
}

#[test]
fn test_isosurface_opacity_round_trip() {
    let mut d = drawable(&["a"]);
    d.set_channel_data_from_volume(0, &ball()).unwrap();
    d.create_isosurface(0, 100.0, Some(1.0), None);
    assert!(!d.mesh_group().child(0).unwrap().material.transparent);

    d.update_opacity(0, 0.5);
    let m = d.mesh_group().child(0).unwrap().material;
    assert_eq!(m.opacity, 0.5);
    assert!(m.transparent);

    d.update_opacity(0, 1.0);
    let m = d.mesh_group().child(0).unwrap().material;
    assert_eq!(m.opacity, 1.0);
    assert!(!m.transparent);
}

#[test]
fn test_isosurface_lifecycle() {
    let mut d = drawable(&["a", "b"]);
    d.set_channel_data_from_volume(0, &ball()).unwrap();
    assert!(!d.has_isosurface(0));
    d.create_isosurface(0, 100.0, None, None);
    assert!(d.has_isosurface(0));
    assert_eq!(d.isovalue(0), Some(100.0));

    let group = d.mesh_group();
    assert_eq!(group.name, MeshGroupNode::NAME);
    assert_eq!(group.children.len(), 1);
    assert_eq!(group.children[0].name, "Channel0");
    let triangles = group.triangle_count();
    assert!(triangles > 0);

    d.update_isovalue(0, 200.0);
    assert_eq!(d.isovalue(0), Some(200.0));
    assert!(d.mesh_group().triangle_count() < triangles);

    d.destroy_isosurface(0);
    assert!(!d.has_isosurface(0));
    assert!(d.mesh_group().children.is_empty());
}

#[test]
fn test_isosurface_regenerated_on_load() {
    let mut d = drawable(&["a"]);
    d.create_isosurface(0, 100.0, None, None);
    assert!(d.has_isosurface(0));
    assert_eq!(d.mesh_group().triangle_count(), 0);

    d.set_channel_data_from_volume(0, &ball()).unwrap();
    assert_eq!(d.isovalue(0), Some(100.0));
    assert!(d.mesh_group().triangle_count() > 0);
}

#[test]
fn test_snapshot_name() {
    let mut d = drawable(&["dna", "membrane"]);
    d.set_channel_data_from_volume(1, &ball()).unwrap();
    assert!(d.isosurface_snapshot(1).is_none());
    d.create_isosurface(1, 100.0, None, None);
    let snap = d.isosurface_snapshot(1).unwrap();
    assert_eq!(snap.name, "img_membrane");
    assert_eq!(snap.isovalue, 100.0);
    assert!(!snap.mesh.is_empty());
}

#[test]
fn test_extraction_method_switch() {
    let mut d = drawable(&["a"]);
    d.set_channel_data_from_volume(0, &ball()).unwrap();
    d.set_extraction_method(ExtractionMethod::SurfaceNets);
    assert_eq!(d.extraction_method(), ExtractionMethod::SurfaceNets);
    d.create_isosurface(0, 100.0, None, None);
    assert!(d.mesh_group().triangle_count() > 0);
}

#[test]
fn test_mask_and_lut_refuse() {
    let mut d = drawable(&["a", "b"]);
    d.set_channel_data_from_volume(0, &ball()).unwrap();
    d.set_channel_data_from_volume(1, &vec![0; (N * N * N) as usize]).unwrap();

    d.set_channel_as_mask(Some(1));
    assert_eq!(d.mask_channel(), Some(1));
    assert!(d.fused_textures().unwrap().mask.data().iter().all(|&v| v == 0));
    d.set_channel_as_mask(None);
    assert!(d.fused_textures().unwrap().mask.data().iter().all(|&v| v == 255));

    d.set_channel_lut(0, Some(IntensityLut::from_entries(&[0; 256]).unwrap()));
    d.set_volume_channel_enabled(1, false);
    assert!(d.fused_textures().unwrap().atlas.data().iter().all(|&v| v == 0));
}

#[test]
fn test_voxel_size_scales_scene() {
    let mut d = drawable(&["a"]);
    d.set_voxel_size(&[1.0, 1.0, 2.0]);
    let s = d.scale();
    assert!(s.z > s.x);
    let volume = d.volume_node();
    assert_eq!(volume.name, VolumeNode::NAME);
    assert_eq!(volume.transform, d.mesh_group().transform);
}

#[test]
fn test_cleanup_releases_everything() {
    let mut d = drawable(&["a"]);
    d.set_channel_data_from_volume(0, &ball()).unwrap();
    d.create_isosurface(0, 100.0, None, None);
    d.cleanup();
    assert!(!d.has_isosurface(0));
    assert!(d.fused_textures().is_none());
    assert!(d.render(&camera()).unwrap().is_none());
}

#[test]
fn test_bad_channel_data_is_an_error() {
    let mut d = drawable(&["a"]);
    assert!(d.set_channel_data_from_volume(0, &[1, 2, 3]).is_err());
    assert!(d.set_channel_data_from_volume(5, &ball()).is_err());
}

#[test]
fn test_zero_width_ortho_clip_keeps_rendering() {
    use volviz_core::Axis;
    use volviz_drawable::MIN_ORTHO_THICKNESS;

    let mut d = drawable(&["a"]);
    d.set_channel_data_from_volume(0, &ball()).unwrap();
    d.set_axis_clip(Axis::Z, 0.1, 0.1, true);
    assert_eq!(d.settings().clip.min().z, 0.1);
    assert_eq!(d.settings().ortho_thickness, MIN_ORTHO_THICKNESS);
    assert!(d.render(&camera()).unwrap().is_some());

    d.set_orthographic(true);
    assert!(d.render(&camera()).unwrap().is_some());

    d.set_orthographic(false);
    d.set_axis_clip(Axis::Z, -0.5, 0.5, false);
    let frame = d.render(&camera()).unwrap().unwrap();
    assert!(frame.covered_pixels() > 0);
}

#[test]
fn test_rejected_transfer_exponent_keeps_rendering() {
    let mut d = drawable(&["a"]);
    d.set_channel_data_from_volume(0, &ball()).unwrap();
    d.set_gamma(0.0, 1.0, 0.0);
    assert_eq!(d.settings().gamma_scale, 1.0);
    assert!(d.render(&camera()).unwrap().unwrap().covered_pixels() > 0);

    // an inverted window is a step function, not an error
    d.set_gamma(0.8, 0.2, 2.0);
    assert_eq!(d.settings().gamma_scale, 2.0);
    assert!(d.render(&camera()).unwrap().is_some());
}
