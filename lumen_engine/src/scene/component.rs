//! Components: closed set of data variants plus user behaviours.
//!
//! A component is always in one of three states:
//!
//! ```text
//!            on_attach            on_active
//! Detached ------------> Attached ----------> Active
//!          <------------          <----------
//!            on_detach            on_inactive
//! ```
//!
//! The scene graph re-derives the desired state from the tree (attached to
//! the root? every ancestor active? component enabled?) after each
//! structural change and walks the difference, so every callback fires
//! exactly once per transition.

use slotmap::new_key_type;

use crate::camera::Camera;
use crate::frame::FrameTime;
use crate::services::InputState;
use super::gui::GuiElement;
use super::light::Light;
use super::mesh_renderer::MeshRenderer;
use super::scene_graph::SceneGraph;
use super::scene_object::ObjectKey;

new_key_type! {
    /// Stable, generation-checked key of a component.
    pub struct ComponentKey;
}

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentState {
    /// Not reachable from the scene root
    Detached,
    /// In the scene, but the component or an ancestor is inactive
    Attached,
    /// In the scene and live
    Active,
}

/// Type tag for lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Camera,
    Light,
    Renderer,
    Gui,
    Behaviour,
}

/// Lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Attach,
    Activate,
    Deactivate,
    Detach,
}

// ===== BEHAVIOUR =====

/// Handles passed to lifecycle callbacks.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleContext {
    pub object: ObjectKey,
    pub component: ComponentKey,
}

/// Scene access for per-frame callbacks.
pub struct UpdateContext<'a> {
    /// The whole scene; structural edits are allowed
    pub scene: &'a mut SceneGraph,
    pub object: ObjectKey,
    pub component: ComponentKey,
    pub time: FrameTime,
    pub input: &'a dyn InputState,
}

/// User logic attached to a scene object.
///
/// Lifecycle callbacks get handles only. Scene edits belong in `begin`,
/// `update` and `post_update`.
pub trait Behaviour {
    fn on_attach(&mut self, _ctx: &LifecycleContext) {}
    fn on_active(&mut self, _ctx: &LifecycleContext) {}
    fn on_inactive(&mut self, _ctx: &LifecycleContext) {}
    fn on_detach(&mut self, _ctx: &LifecycleContext) {}

    /// Once before the first `update` of each active period.
    fn begin(&mut self, _ctx: &mut UpdateContext) {}

    /// Prepare state for this frame.
    fn update(&mut self, _ctx: &mut UpdateContext) {}

    /// Publish state after every `update` ran.
    fn post_update(&mut self, _ctx: &mut UpdateContext) {}
}

/// Holder that lets the scene lend a behaviour out while it runs.
///
/// Events that arrive while the behaviour is lent out (its own update
/// deactivated it, for instance) are queued and delivered on return.
pub struct BehaviourSlot {
    behaviour: Option<Box<dyn Behaviour>>,
    deferred: Vec<LifecycleEvent>,
}

impl BehaviourSlot {
    fn new(behaviour: Box<dyn Behaviour>) -> Self {
        Self { behaviour: Some(behaviour), deferred: Vec::new() }
    }

    /// The behaviour, unless it is currently running.
    pub fn get(&self) -> Option<&dyn Behaviour> {
        self.behaviour.as_deref()
    }
}

fn deliver(behaviour: &mut dyn Behaviour, event: LifecycleEvent, ctx: &LifecycleContext) {
    match event {
        LifecycleEvent::Attach => behaviour.on_attach(ctx),
        LifecycleEvent::Activate => behaviour.on_active(ctx),
        LifecycleEvent::Deactivate => behaviour.on_inactive(ctx),
        LifecycleEvent::Detach => behaviour.on_detach(ctx),
    }
}

// ===== COMPONENT DATA =====

pub enum ComponentData {
    Camera(Camera),
    Light(Light),
    Renderer(MeshRenderer),
    Gui(GuiElement),
    Behaviour(BehaviourSlot),
}

impl ComponentData {
    pub fn behaviour(behaviour: impl Behaviour + 'static) -> Self {
        ComponentData::Behaviour(BehaviourSlot::new(Box::new(behaviour)))
    }

    pub fn component_type(&self) -> ComponentType {
        match self {
            ComponentData::Camera(_) => ComponentType::Camera,
            ComponentData::Light(_) => ComponentType::Light,
            ComponentData::Renderer(_) => ComponentType::Renderer,
            ComponentData::Gui(_) => ComponentType::Gui,
            ComponentData::Behaviour(_) => ComponentType::Behaviour,
        }
    }
}

impl From<Camera> for ComponentData {
    fn from(camera: Camera) -> Self {
        ComponentData::Camera(camera)
    }
}

impl From<Light> for ComponentData {
    fn from(light: Light) -> Self {
        ComponentData::Light(light)
    }
}

impl From<MeshRenderer> for ComponentData {
    fn from(renderer: MeshRenderer) -> Self {
        ComponentData::Renderer(renderer)
    }
}

impl From<GuiElement> for ComponentData {
    fn from(element: GuiElement) -> Self {
        ComponentData::Gui(element)
    }
}

// ===== COMPONENT =====

pub struct Component {
    owner: ObjectKey,
    enabled: bool,
    state: ComponentState,
    begun: bool,
    data: ComponentData,
}

impl Component {
    pub(crate) fn new(owner: ObjectKey, data: ComponentData) -> Self {
        Self { owner, enabled: true, state: ComponentState::Detached, begun: false, data }
    }

    /// Owning object. Resolve through `SceneGraph::object`, which checks
    /// liveness.
    pub fn owner(&self) -> ObjectKey {
        self.owner
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> ComponentState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ComponentState::Active
    }

    /// Whether `begin` already ran in the current active period.
    pub fn has_begun(&self) -> bool {
        self.begun
    }

    pub fn component_type(&self) -> ComponentType {
        self.data.component_type()
    }

    pub fn data(&self) -> &ComponentData {
        &self.data
    }

    pub fn camera(&self) -> Option<&Camera> {
        match &self.data {
            ComponentData::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn light(&self) -> Option<&Light> {
        match &self.data {
            ComponentData::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn renderer(&self) -> Option<&MeshRenderer> {
        match &self.data {
            ComponentData::Renderer(renderer) => Some(renderer),
            _ => None,
        }
    }

    pub fn gui(&self) -> Option<&GuiElement> {
        match &self.data {
            ComponentData::Gui(element) => Some(element),
            _ => None,
        }
    }

    // ===== crate-internal state machine =====

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn data_mut(&mut self) -> &mut ComponentData {
        &mut self.data
    }

    pub(crate) fn mark_begun(&mut self) {
        self.begun = true;
    }

    /// Move to the state `event` leads to and notify the behaviour.
    pub(crate) fn transition(&mut self, key: ComponentKey, event: LifecycleEvent) {
        self.state = match event {
            LifecycleEvent::Attach | LifecycleEvent::Deactivate => ComponentState::Attached,
            LifecycleEvent::Activate => ComponentState::Active,
            LifecycleEvent::Detach => ComponentState::Detached,
        };
        if event == LifecycleEvent::Activate {
            self.begun = false;
        }
        if let ComponentData::Behaviour(slot) = &mut self.data {
            let ctx = LifecycleContext { object: self.owner, component: key };
            match slot.behaviour.as_deref_mut() {
                Some(behaviour) => deliver(behaviour, event, &ctx),
                None => slot.deferred.push(event),
            }
        }
    }

    /// Lend the behaviour out for a per-frame callback.
    pub(crate) fn take_behaviour(&mut self) -> Option<Box<dyn Behaviour>> {
        match &mut self.data {
            ComponentData::Behaviour(slot) => slot.behaviour.take(),
            _ => None,
        }
    }

    /// Return a lent behaviour and replay what it missed.
    pub(crate) fn restore_behaviour(&mut self, key: ComponentKey, mut behaviour: Box<dyn Behaviour>) {
        let ctx = LifecycleContext { object: self.owner, component: key };
        if let ComponentData::Behaviour(slot) = &mut self.data {
            for event in slot.deferred.drain(..) {
                deliver(behaviour.as_mut(), event, &ctx);
            }
            slot.behaviour = Some(behaviour);
        }
    }
}
