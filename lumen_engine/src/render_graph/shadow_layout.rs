/// Shadow atlas layout.
///
/// Each shadow-casting light gets square tiles in the depth atlas:
/// directional lights one per cascade, spot lights one. Point lights get
/// none. Tiles are laid out row-major on a square grid sized for the
/// frame's tile count.

use glam::{Mat4, Vec3, Vec4};
use crate::camera::{Frustum, RenderView};
use crate::config::ShadowConfig;
use crate::frame::{GpuShadowView, MAX_SHADOW_VIEWS};
use crate::scene::{LightKind, LightView};
use crate::{engine_debug, engine_warn};

const SOURCE: &str = "lumen::ShadowLayout";

/// Near plane of spot light shadow projections.
const SPOT_NEAR: f32 = 0.05;

/// One tile of the atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowView {
    /// Index into `RenderQueues::lights`
    pub light: usize,
    /// Cascade index (0 for spot lights)
    pub cascade: u32,
    pub view_projection: Mat4,
    pub frustum: Frustum,
    /// Tile origin and size in atlas texels
    pub x: u32,
    pub y: u32,
    pub size: u32,
    /// View-space distance where this cascade ends (spot: light range)
    pub split_far: f32,
}

impl ShadowView {
    pub fn to_gpu(&self, atlas_size: u32) -> GpuShadowView {
        let inv = 1.0 / atlas_size.max(1) as f32;
        GpuShadowView {
            view_projection: self.view_projection,
            atlas_rect: Vec4::new(self.x as f32 * inv, self.y as f32 * inv, self.size as f32 * inv, self.size as f32 * inv),
        }
    }
}

/// Far distance of every cascade: blend of logarithmic and uniform splits.
pub fn cascade_splits(near: f32, far: f32, count: u32, lambda: f32) -> Vec<f32> {
    let count = count.max(1);
    (1..=count)
        .map(|i| {
            let p = i as f32 / count as f32;
            let log = near * (far / near).powf(p);
            let uniform = near + (far - near) * p;
            lambda * log + (1.0 - lambda) * uniform
        })
        .collect()
}

fn light_up(direction: Vec3) -> Vec3 {
    if direction.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y }
}

/// Orthographic projection fitting the bounding sphere of `corners`.
fn fit_cascade(corners: &[Vec3; 8], direction: Vec3) -> Mat4 {
    let center = corners.iter().copied().sum::<Vec3>() / 8.0;
    let radius = corners
        .iter()
        .map(|c| c.distance(center))
        .fold(0.0_f32, f32::max)
        .max(1e-3);
    let eye = center - direction * (radius * 2.0);
    let view = Mat4::look_at_rh(eye, center, light_up(direction));
    let projection = Mat4::orthographic_rh(-radius, radius, -radius, radius, 0.0, radius * 4.0);
    projection * view
}

fn spot_view_projection(light: &LightView, outer_angle: f32) -> Mat4 {
    let range = light.light.range.max(SPOT_NEAR * 2.0);
    let fov = (outer_angle * 2.0).clamp(0.01, std::f32::consts::PI - 0.01);
    let view = Mat4::look_at_rh(light.position, light.position + light.direction, light_up(light.direction));
    Mat4::perspective_rh(fov, 1.0, SPOT_NEAR, range) * view
}

/// Lay out this frame's tiles.
///
/// Directional cascades need a camera; without one they are skipped.
/// Lights beyond `max_shadow_lights`, and tiles beyond `MAX_SHADOW_VIEWS`,
/// are dropped with a warning.
pub fn layout_shadow_views(lights: &[LightView], view: Option<&RenderView>, config: &ShadowConfig) -> Vec<ShadowView> {
    // (light index, tile count) for every light that gets tiles
    let mut requests: Vec<(usize, u32)> = Vec::new();
    let mut tile_total = 0usize;
    for (index, light) in lights.iter().enumerate() {
        let tiles = light.light.shadow_tiles(config.cascade_count);
        if tiles == 0 {
            continue;
        }
        if light.light.kind == LightKind::Directional && view.is_none() {
            engine_debug!(SOURCE, "no active camera, directional shadow of light {} skipped", index);
            continue;
        }
        if requests.len() as u32 >= config.max_shadow_lights {
            engine_warn!(SOURCE, "more than {} shadow-casting lights, light {} dropped", config.max_shadow_lights, index);
            continue;
        }
        if tile_total + tiles as usize > MAX_SHADOW_VIEWS {
            engine_warn!(SOURCE, "shadow atlas full ({} tiles), light {} dropped", MAX_SHADOW_VIEWS, index);
            continue;
        }
        tile_total += tiles as usize;
        requests.push((index, tiles));
    }
    if tile_total == 0 {
        return Vec::new();
    }

    let columns = (tile_total as f32).sqrt().ceil() as u32;
    let size = config.atlas_size / columns.max(1);
    let tile_origin = |tile: u32| ((tile % columns) * size, (tile / columns) * size);

    let mut views = Vec::with_capacity(tile_total);
    for (light_index, _) in requests {
        let light = &lights[light_index];
        match (light.light.kind, view) {
            (LightKind::Directional, Some(camera)) => {
                let splits = cascade_splits(camera.near(), camera.far(), config.cascade_count, config.cascade_split_lambda);
                let mut split_near = camera.near();
                for (cascade, &split_far) in splits.iter().enumerate() {
                    let corners = camera.slice_corners(split_near, split_far);
                    let view_projection = fit_cascade(&corners, light.direction);
                    let (x, y) = tile_origin(views.len() as u32);
                    views.push(ShadowView {
                        light: light_index,
                        cascade: cascade as u32,
                        view_projection,
                        frustum: Frustum::from_view_projection(&view_projection),
                        x,
                        y,
                        size,
                        split_far,
                    });
                    split_near = split_far;
                }
            }
            (LightKind::Spot { outer_angle, .. }, _) => {
                let view_projection = spot_view_projection(light, outer_angle);
                let (x, y) = tile_origin(views.len() as u32);
                views.push(ShadowView {
                    light: light_index,
                    cascade: 0,
                    view_projection,
                    frustum: Frustum::from_view_projection(&view_projection),
                    x,
                    y,
                    size,
                    split_far: light.light.range,
                });
            }
            _ => {}
        }
    }
    views
}

#[cfg(test)]
#[path = "shadow_layout_tests.rs"]
mod tests;
