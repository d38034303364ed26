use glam::{Mat4, Vec3};
use crate::resource::Aabb;
use super::*;

fn looking_down_negative_z(fov: f32, far: f32) -> Frustum {
    let projection = Mat4::perspective_rh(fov, 1.0, 0.1, far);
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    Frustum::from_view_projection(&(projection * view))
}

// ============================================================================
// Frustum::from_view_projection
// ============================================================================

#[test]
fn test_planes_are_normalized() {
    let perspective = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 16.0 / 9.0, 0.1, 100.0);
    let orthographic = Mat4::orthographic_rh(-10.0, 10.0, -10.0, 10.0, 0.1, 100.0);

    for vp in [Mat4::IDENTITY, perspective, orthographic] {
        let frustum = Frustum::from_view_projection(&vp);
        for plane in &frustum.planes {
            assert!((plane.truncate().length() - 1.0).abs() < 1e-4);
        }
    }
}

#[test]
fn test_near_plane_sits_at_near_distance() {
    let frustum = looking_down_negative_z(std::f32::consts::FRAC_PI_2, 100.0);

    // Eye at z = 5, near = 0.1
    assert!(frustum.distance(PLANE_NEAR, Vec3::new(0.0, 0.0, 4.95)) < 0.0);
    assert!(frustum.distance(PLANE_NEAR, Vec3::new(0.0, 0.0, 4.85)) > 0.0);
}

#[test]
fn test_corners_match_projection_volume() {
    let projection = Mat4::orthographic_rh(-2.0, 2.0, -1.0, 1.0, 1.0, 11.0);
    let corners = Frustum::corners(&projection);

    assert!((corners[0] - Vec3::new(-2.0, -1.0, -1.0)).length() < 1e-4);
    assert!((corners[6] - Vec3::new(2.0, 1.0, -11.0)).length() < 1e-4);

    let frustum = Frustum::from_view_projection(&projection);
    let center = corners.iter().copied().sum::<Vec3>() / 8.0;
    assert!(frustum.contains_point(center));
}

// ============================================================================
// Frustum::intersects_aabb
// ============================================================================

#[test]
fn test_aabb_inside_frustum() {
    let frustum = looking_down_negative_z(std::f32::consts::FRAC_PI_2, 100.0);
    let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
    assert!(frustum.intersects_aabb(&aabb));
}

#[test]
fn test_aabb_off_to_the_side() {
    let frustum = looking_down_negative_z(std::f32::consts::FRAC_PI_4, 100.0);
    let aabb = Aabb::new(Vec3::splat(100.0), Vec3::splat(101.0));
    assert!(!frustum.intersects_aabb(&aabb));
}

#[test]
fn test_aabb_behind_camera() {
    let frustum = looking_down_negative_z(std::f32::consts::FRAC_PI_2, 100.0);
    let aabb = Aabb::new(Vec3::new(-1.0, -1.0, 10.0), Vec3::new(1.0, 1.0, 12.0));
    assert!(!frustum.intersects_aabb(&aabb));
}

#[test]
fn test_aabb_beyond_far_plane() {
    let frustum = looking_down_negative_z(std::f32::consts::FRAC_PI_2, 10.0);
    let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -20.0), Vec3::new(1.0, 1.0, -18.0));
    assert!(!frustum.intersects_aabb(&aabb));
}

#[test]
fn test_aabb_straddling_boundary_is_kept() {
    let projection = Mat4::orthographic_rh(-5.0, 5.0, -5.0, 5.0, 0.1, 100.0);
    let frustum = Frustum::from_view_projection(&projection);
    let aabb = Aabb::new(Vec3::new(4.0, 0.0, -10.0), Vec3::new(6.0, 1.0, -5.0));
    assert!(frustum.intersects_aabb(&aabb));
}
