//! Fusion property tests for volviz-atlas.

use volviz_atlas::{AtlasFuser, CombineMode, FusionEntry};
use volviz_core::{ChannelColor, IntensityLut, Rgb8, TileLayout, VolumeInfo, VolumeStore};

fn three_channel_store() -> VolumeStore {
    let layout = TileLayout::new(4, 3, 5, 3, 2).unwrap();
    let names = vec!["dna".into(), "membrane".into(), "actin".into()];
    let mut store = VolumeStore::new(VolumeInfo::new("cells", layout, names)).unwrap();
    let n = layout.voxel_count();
    for ch in 0..3 {
        let data: Vec<u8> = (0..n).map(|i| ((i * (ch + 3) * 37) % 256) as u8).collect();
        store.set_channel_data_from_volume(ch, &data).unwrap();
    }
    store
}

fn entries() -> Vec<FusionEntry> {
    vec![
        FusionEntry::new(0, ChannelColor::Enabled(Rgb8::new(255, 0, 255))),
        FusionEntry::new(1, ChannelColor::Enabled(Rgb8::new(0, 200, 50))),
        FusionEntry::new(2, ChannelColor::Enabled(Rgb8::new(90, 90, 255)))
            .with_lut(IntensityLut::window(40, 180)),
    ]
}

#[test]
fn test_toggle_is_idempotent() {
    let store = three_channel_store();
    let mut fuser = AtlasFuser::new();
    let mut e = entries();

    let before = fuser.fuse(&e, &store, CombineMode::Max, None).unwrap().atlas.data().to_vec();

    let saved = e[1].color;
    e[1].color = ChannelColor::Disabled;
    let disabled = fuser.fuse(&e, &store, CombineMode::Max, None).unwrap().atlas.data().to_vec();
    assert_ne!(before, disabled);

    e[1].color = saved;
    let after = fuser.fuse(&e, &store, CombineMode::Max, None).unwrap().atlas.data().to_vec();
    assert_eq!(before, after);
    assert!(store.channel(1).unwrap().is_loaded());
}

#[test]
fn test_max_is_order_independent() {
    let store = three_channel_store();
    let forward = entries();
    let mut reversed = entries();
    reversed.reverse();
    let mut rotated = entries();
    rotated.rotate_left(1);

    let mut fuser = AtlasFuser::new();
    let a = fuser.fuse(&forward, &store, CombineMode::Max, None).unwrap().atlas.data().to_vec();
    let b = fuser.fuse(&reversed, &store, CombineMode::Max, None).unwrap().atlas.data().to_vec();
    let c = fuser.fuse(&rotated, &store, CombineMode::Max, None).unwrap().atlas.data().to_vec();
    assert_eq!(a, b);
    assert_eq!(a, c);
}

#[test]
fn test_disabling_never_brightens() {
    let store = three_channel_store();
    let mut fuser = AtlasFuser::new();
    let mut e = entries();
    let full = fuser.fuse(&e, &store, CombineMode::Max, None).unwrap().atlas.data().to_vec();
    e[0].color = ChannelColor::Disabled;
    let partial = fuser.fuse(&e, &store, CombineMode::Max, None).unwrap().atlas.data().to_vec();
    assert!(full.iter().zip(&partial).all(|(f, p)| p <= f));
}

#[test]
fn test_unused_tiles_stay_zero() {
    let store = three_channel_store();
    let mut fuser = AtlasFuser::new();
    let fused = fuser.fuse(&entries(), &store, CombineMode::Average, None).unwrap();
    let layout = fused.atlas.layout();
    // 3x2 grid holds 5 slices; the last tile is unused
    let (ox, oy) = layout.tile_origin(5);
    for y in oy..oy + layout.tile_height {
        for x in ox..ox + layout.tile_width {
            assert_eq!(fused.atlas.texel(x, y), [0, 0, 0, 0]);
        }
    }
}
