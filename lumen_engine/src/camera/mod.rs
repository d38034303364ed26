//! Camera module: camera component, frustum, and render view.
//!
//! A `Camera` is component data attached to a scene object. The render
//! queue builder resolves it against the object's world matrix into a
//! `RenderView` snapshot that the pass graph consumes.

mod camera;
mod frustum;
mod render_view;

pub use camera::{Camera, Projection};
pub use frustum::{
    Frustum,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
pub use render_view::RenderView;
