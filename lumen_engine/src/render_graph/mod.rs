//! Render pass graph module
//!
//! The fixed sequence of steps that turns the frame's render queues into
//! a presented image: which steps execute, which targets they read and
//! write, and the state transitions between them.

mod render_target;
mod render_pass;
mod pass_action;
mod shadow_layout;
mod frame_report;
mod render_graph;

pub use render_target::{RenderTargets, ResourceId};
pub use render_pass::{RenderStep, ResourceUse, StepKind};
pub use pass_action::{
    FullscreenAction, GeometryAction, OverlayAction, PassAction, PassContext, ShadowAction, StepStats,
};
pub use shadow_layout::{cascade_splits, layout_shadow_views, ShadowView};
pub use frame_report::{FrameReport, StepReport};
pub use render_graph::{Barrier, CompiledGraph, CompiledStep, FrameInputs, RenderPassGraph};
