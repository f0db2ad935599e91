//! End-to-end frames of the interaction loop against a recording renderer.

mod common;

use bimar::*;
use bimar_core::{Mat4, RawPose, TrackingState};
use common::*;

fn white() -> Materials {
    Materials::Single(Material::phong(Color::WHITE))
}

#[test]
fn test_click_on_empty_scene_does_nothing() {
    let source = MemorySource::new();
    let mut viewer = viewer(&source);
    let mut renderer = RecordingRenderer::default();
    let before = viewer.scene.len();

    click_center(&mut viewer);
    let report = viewer.frame(0.0, None, &mut renderer).unwrap();

    assert_eq!(report.picked, None);
    assert!(!report.annotation_requested);
    assert_eq!(viewer.annotations().pending_count(), 0);
    assert_eq!(viewer.scene.len(), before);
    assert_eq!(renderer.frames, 1);
}

#[test]
fn test_wall_label_text() {
    let source = MemorySource::new();
    let mut viewer = viewer(&source);
    let mut renderer = RecordingRenderer::default();
    let wall = add_element(&mut viewer, ElementMetadata::new("Wall-12"), white());

    click_center(&mut viewer);
    let report = viewer.frame(0.0, None, &mut renderer).unwrap();

    assert_eq!(report.picked, Some(wall));
    let name = viewer.scene.find_by_name("Name: Wall-12").expect("name label");
    let description = viewer
        .scene
        .find_by_name("Description: undefined")
        .expect("description label");
    assert_eq!(
        viewer.scene.get(name).unwrap().position(),
        Vec3::new(-100.0, 160.0, 0.0)
    );
    assert_eq!(
        viewer.scene.get(description).unwrap().position(),
        Vec3::new(-100.0, 140.0, 0.0)
    );
}

#[test]
fn test_label_description_and_missing_name() {
    let source = MemorySource::new();
    let mut viewer = viewer(&source);
    let mut renderer = RecordingRenderer::default();
    let metadata = ElementMetadata {
        name: None,
        description: Some("Fire door".to_string()),
    };
    add_element(&mut viewer, metadata, white());

    click_center(&mut viewer);
    viewer.frame(0.0, None, &mut renderer).unwrap();

    assert!(viewer.scene.find_by_name("Name: undefined").is_some());
    assert!(viewer.scene.find_by_name("Description: Fire door").is_some());
}

#[test]
fn test_labels_live_for_two_seconds() {
    let source = MemorySource::new();
    let mut viewer = viewer(&source);
    let mut renderer = RecordingRenderer::default();
    add_element(&mut viewer, ElementMetadata::new("Wall-12"), white());
    let bare = viewer.scene.len();

    let t = 1000.0;
    click_center(&mut viewer);
    viewer.frame(t, None, &mut renderer).unwrap();
    assert_eq!(viewer.scene.len(), bare + 2);

    let report = viewer.frame(t + 1999.0, None, &mut renderer).unwrap();
    assert_eq!(report.annotations_removed, 0);
    assert!(viewer.scene.find_by_name("Name: Wall-12").is_some());

    let report = viewer.frame(t + 2001.0, None, &mut renderer).unwrap();
    assert_eq!(report.annotations_removed, 1);
    assert!(viewer.scene.find_by_name("Name: Wall-12").is_none());
    assert_eq!(viewer.scene.len(), bare);
}

#[test]
fn test_recolor_single_material() {
    let source = MemorySource::new();
    let mut viewer = viewer(&source);
    let mut renderer = RecordingRenderer::default();
    let element = add_element(&mut viewer, ElementMetadata::new("Slab"), white());

    click_center(&mut viewer);
    viewer.frame(0.0, None, &mut renderer).unwrap();

    let materials = &viewer.scene.get(element).unwrap().as_mesh().unwrap().materials;
    assert_eq!(materials.len(), 1);
    assert_ne!(materials.for_group(0).unwrap().color, Color::WHITE);
}

#[test]
fn test_recolor_every_material_of_a_list() {
    let source = MemorySource::new();
    let mut viewer = viewer(&source);
    let mut renderer = RecordingRenderer::default();
    let original = [0x111111, 0x222222, 0x333333].map(Color::from_hex);
    let list = Materials::list(original.iter().map(|c| Material::phong(*c)).collect()).unwrap();
    let element = add_element(&mut viewer, ElementMetadata::new("Stair"), list);

    click_center(&mut viewer);
    viewer.frame(0.0, None, &mut renderer).unwrap();

    let materials = &viewer.scene.get(element).unwrap().as_mesh().unwrap().materials;
    let colors: Vec<Color> = materials.iter().map(|m| m.color).collect();
    assert_eq!(colors.len(), 3);
    for (new, old) in colors.iter().zip(original) {
        assert_ne!(*new, old);
    }
    assert_ne!(colors[0], colors[1]);
    assert_ne!(colors[1], colors[2]);
}

#[test]
fn test_annotation_removal_is_idempotent_and_isolated() {
    let source = MemorySource::new();
    let mut viewer = viewer(&source);
    let mut renderer = RecordingRenderer::default();
    add_element(&mut viewer, ElementMetadata::new("Beam"), white());

    click_center(&mut viewer);
    viewer.frame(0.0, None, &mut renderer).unwrap();
    let first = Annotation {
        primary: viewer.scene.find_by_name("Name: Beam").unwrap(),
        secondary: viewer.scene.find_by_name("Description: undefined").unwrap(),
    };

    click_center(&mut viewer);
    viewer.frame(500.0, None, &mut renderer).unwrap();
    assert_eq!(viewer.annotations().scheduled_removals(), 2);

    assert!(first.remove(&mut viewer.scene));
    assert!(!first.remove(&mut viewer.scene));

    // The second annotation is untouched by the manual removals.
    let second = viewer.scene.find_by_name("Name: Beam").expect("second label");
    assert_ne!(second, first.primary);

    // The first annotation's timer fires later without effect on the second.
    let report = viewer.frame(2000.0, None, &mut renderer).unwrap();
    assert_eq!(report.annotations_removed, 0);
    assert!(viewer.scene.contains(second));

    let report = viewer.frame(2500.0, None, &mut renderer).unwrap();
    assert_eq!(report.annotations_removed, 1);
    assert!(!viewer.scene.contains(second));
}

#[test]
fn test_font_failure_adds_no_meshes() {
    let source = MemorySource::new();
    let mut viewer = viewer_without_font(&source);
    let mut renderer = RecordingRenderer::default();
    let element = add_element(&mut viewer, ElementMetadata::new("Wall-12"), white());
    let before = viewer.scene.len();

    click_center(&mut viewer);
    let report = viewer.frame(0.0, None, &mut renderer).unwrap();

    assert!(report.annotation_requested);
    assert_eq!(viewer.scene.len(), before);
    assert_eq!(viewer.annotations().pending_count(), 0);
    assert_eq!(viewer.annotations().scheduled_removals(), 0);
    // Recoloring does not depend on the font.
    let material = viewer.scene.get(element).unwrap().as_mesh().unwrap().materials.for_group(0);
    assert_ne!(material.unwrap().color, Color::WHITE);
}

#[test]
fn test_concurrent_requests_share_one_font_load() {
    let source = MemorySource::gated();
    source.insert(FONT_URL, vec![0u8]);
    let mut viewer = viewer_without_font(&source);
    let mut renderer = RecordingRenderer::default();
    add_element(&mut viewer, ElementMetadata::new("Pipe"), white());
    let before = viewer.scene.len();

    click_center(&mut viewer);
    viewer.frame(0.0, None, &mut renderer).unwrap();
    click_center(&mut viewer);
    viewer.frame(16.0, None, &mut renderer).unwrap();
    assert_eq!(viewer.annotations().pending_count(), 2);
    assert_eq!(viewer.scene.len(), before);

    source.release();
    viewer.frame(32.0, None, &mut renderer).unwrap();
    assert_eq!(viewer.annotations().pending_count(), 0);
    assert_eq!(viewer.scene.len(), before + 4);
    assert_eq!(source.fetch_count(FONT_URL), 1);
}

#[test]
fn test_pose_untouched_without_tracking() {
    let source = MemorySource::new();
    let mut viewer = viewer(&source);
    let mut renderer = RecordingRenderer::default();
    let start = Mat4::from_translation(Vec3::new(0.5, -1.0, 2.0));
    let model_root = viewer.model_root();
    viewer.scene.get_mut(model_root).unwrap().transform = start;

    let emulated = ScriptedFrame::new([ScriptedResult {
        image_index: 0,
        state: TrackingState::Emulated,
        pose: Some(RawPose::from_mat4(Mat4::IDENTITY).matrix),
    }]);
    let report = viewer.frame(0.0, Some(&emulated), &mut renderer).unwrap();
    assert!(!report.pose_updated);
    viewer.frame(16.0, None, &mut renderer).unwrap();

    let after = viewer.scene.get(model_root).unwrap().transform;
    assert_eq!(
        after.to_cols_array().map(f32::to_bits),
        start.to_cols_array().map(f32::to_bits)
    );
}

#[test]
fn test_second_tracked_marker_wins() {
    let source = MemorySource::new();
    let mut viewer = viewer(&source);
    let mut renderer = RecordingRenderer::default();
    let a = Mat4::from_translation(Vec3::X);
    let b = Mat4::from_translation(Vec3::Y);
    let frame = ScriptedFrame::new([
        ScriptedResult {
            image_index: 0,
            state: TrackingState::Tracked,
            pose: Some(RawPose::from_mat4(a).matrix),
        },
        ScriptedResult {
            image_index: 1,
            state: TrackingState::Tracked,
            pose: Some(RawPose::from_mat4(b).matrix),
        },
    ]);

    let report = viewer.frame(0.0, Some(&frame), &mut renderer).unwrap();
    assert!(report.pose_updated);
    assert_eq!(viewer.scene.get(viewer.model_root()).unwrap().transform, b);
}

#[test]
fn test_picking_follows_the_anchored_pose() {
    let source = MemorySource::new();
    let mut viewer = viewer(&source);
    let mut renderer = RecordingRenderer::default();
    let element = add_element(&mut viewer, ElementMetadata::new("Column"), white());

    // Moving the model away leaves the center of the view empty.
    let away = ScriptedFrame::new([ScriptedResult {
        image_index: 0,
        state: TrackingState::Tracked,
        pose: Some(RawPose::from_mat4(Mat4::from_translation(Vec3::new(50.0, 0.0, 0.0))).matrix),
    }]);
    click_center(&mut viewer);
    let report = viewer.frame(0.0, Some(&away), &mut renderer).unwrap();
    assert_eq!(report.picked, None);

    let back = ScriptedFrame::new([ScriptedResult {
        image_index: 0,
        state: TrackingState::Tracked,
        pose: Some(RawPose::from_mat4(Mat4::IDENTITY).matrix),
    }]);
    click_center(&mut viewer);
    let report = viewer.frame(16.0, Some(&back), &mut renderer).unwrap();
    assert_eq!(report.picked, Some(element));
}

#[test]
fn test_tracking_error_stops_the_frame() {
    let source = MemorySource::new();
    let mut viewer = viewer(&source);
    let mut renderer = RecordingRenderer::default();
    let broken = ScriptedFrame::new([ScriptedResult {
        image_index: 3,
        state: TrackingState::Tracked,
        pose: None,
    }]);

    let result = viewer.frame(0.0, Some(&broken), &mut renderer);
    assert!(matches!(
        result,
        Err(BimarError::Core(bimar_core::CoreError::MissingPose { image_index: 3 }))
    ));
    assert_eq!(renderer.frames, 0);
}
