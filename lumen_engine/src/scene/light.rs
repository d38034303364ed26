//! Light component data.

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Infinitely far; lights along the owner's forward axis
    Directional,
    /// Omnidirectional within `range`
    Point,
    /// Cone along the owner's forward axis; angles are half-angles in radians
    Spot { inner_angle: f32, outer_angle: f32 },
}

impl LightKind {
    /// Value stored in `GpuLight::direction_kind.w`.
    pub fn gpu_tag(&self) -> f32 {
        match self {
            LightKind::Directional => 0.0,
            LightKind::Point => 1.0,
            LightKind::Spot { .. } => 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
    /// Attenuation range (ignored for directional lights)
    pub range: f32,
    /// Render into the shadow atlas (directional and spot lights only)
    pub cast_shadows: bool,
}

impl Light {
    pub fn directional(color: Vec3, intensity: f32) -> Self {
        Self { kind: LightKind::Directional, color, intensity, range: f32::INFINITY, cast_shadows: true }
    }

    pub fn point(color: Vec3, intensity: f32, range: f32) -> Self {
        Self { kind: LightKind::Point, color, intensity, range, cast_shadows: false }
    }

    pub fn spot(color: Vec3, intensity: f32, range: f32, inner_angle: f32, outer_angle: f32) -> Self {
        Self {
            kind: LightKind::Spot { inner_angle, outer_angle: outer_angle.max(inner_angle) },
            color,
            intensity,
            range,
            cast_shadows: true,
        }
    }

    pub fn with_shadows(mut self, cast_shadows: bool) -> Self {
        self.cast_shadows = cast_shadows;
        self
    }

    /// Atlas tiles this light needs for `cascade_count` cascades.
    /// Point lights never get atlas tiles.
    pub fn shadow_tiles(&self, cascade_count: u32) -> u32 {
        if !self.cast_shadows {
            return 0;
        }
        match self.kind {
            LightKind::Directional => cascade_count,
            LightKind::Spot { .. } => 1,
            LightKind::Point => 0,
        }
    }
}
