//! Scene management module
//!
//! Provides the object tree (transforms, lifecycle-managed components,
//! deferred destruction), per-frame render queue construction and camera
//! culling strategies.

mod transform;
mod scene_object;
mod component;
mod light;
mod mesh_renderer;
mod gui;
mod scene_graph;
mod render_queue;
mod culler;

pub use transform::Transform;
pub use scene_object::{ObjectKey, SceneObject};
pub use component::{
    Behaviour, BehaviourSlot, Component, ComponentData, ComponentKey, ComponentState,
    ComponentType, LifecycleContext, LifecycleEvent, UpdateContext,
};
pub use light::{Light, LightKind};
pub use mesh_renderer::{MeshRenderer, RendererKind};
pub use gui::GuiElement;
pub use scene_graph::{Children, SceneGraph, Traversal};
pub use render_queue::{
    BucketMap, CameraView, Drawable, LightView, PipelineBucket, RenderQueueBuilder,
    RenderQueueEntry, RenderQueues,
};
pub use culler::{BruteForceCuller, CameraCuller, FrustumCuller};
