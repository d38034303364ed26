use glam::{Mat4, Vec3};
use crate::camera::Camera;

// ============================================================================
// Accessors
// ============================================================================

#[test]
fn test_view_projection_is_projection_times_view() {
    let world = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    let view = Camera::perspective(1.0, 0.5, 50.0).resolve(&world, 100, 50);

    let expected = *view.projection_matrix() * *view.view_matrix();
    assert_eq!(view.view_projection_matrix(), expected);
    assert_eq!(view.position(), Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(view.near(), 0.5);
    assert_eq!(view.far(), 50.0);
}

// ============================================================================
// slice_corners
// ============================================================================

#[test]
fn test_slice_corners_lie_on_slice_planes() {
    let view = Camera::perspective(std::f32::consts::FRAC_PI_2, 0.1, 100.0)
        .resolve(&Mat4::IDENTITY, 64, 64);
    let corners = view.slice_corners(2.0, 8.0);

    for near_corner in &corners[..4] {
        assert!((near_corner.z + 2.0).abs() < 1e-3);
    }
    for far_corner in &corners[4..] {
        assert!((far_corner.z + 8.0).abs() < 1e-3);
    }
    // 90° vertical FOV, square target: half-width equals depth
    assert!((corners[6].x - 8.0).abs() < 1e-3);
}
