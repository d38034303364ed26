//! SceneGraph: arena of objects and components with a permanent root.
//!
//! Objects and components live in slot maps and refer to each other by
//! generation-checked keys. The tree is intrusive: every object stores its
//! parent, first/last child and previous/next sibling.
//!
//! Attachment and activity are never cached. After a structural change the
//! affected subtree is re-derived (walk to root, conjunction of active
//! flags) and components are driven to their new state in four passes:
//! deactivate, detach, attach, activate.

use glam::{Mat4, Quat, Vec3};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::camera::Camera;
use crate::error::{Error, Result};
use crate::frame::{FrameTime, GarbageRing};
use crate::services::InputState;
use crate::{engine_bail, engine_debug, engine_trace};
use super::component::{
    Behaviour, Component, ComponentData, ComponentKey, ComponentState, ComponentType,
    LifecycleEvent, UpdateContext,
};
use super::gui::GuiElement;
use super::light::Light;
use super::mesh_renderer::MeshRenderer;
use super::scene_object::{ObjectKey, SceneObject};

const SOURCE: &str = "lumen::SceneGraph";

/// Something waiting for the GPU before it can be released.
enum Garbage {
    Object(ObjectKey),
    Component(ComponentKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Update,
    PostUpdate,
}

pub struct SceneGraph {
    objects: SlotMap<ObjectKey, SceneObject>,
    components: SlotMap<ComponentKey, Component>,
    root: ObjectKey,
    garbage: GarbageRing<Garbage>,
    freed_objects: u64,
}

impl SceneGraph {
    /// Empty scene whose garbage ring matches `frames_in_flight`.
    pub fn new(frames_in_flight: usize) -> Self {
        let mut objects = SlotMap::with_key();
        let root = objects.insert(SceneObject::new("root".to_string()));
        Self {
            objects,
            components: SlotMap::with_key(),
            root,
            garbage: GarbageRing::new(frames_in_flight),
            freed_objects: 0,
        }
    }

    /// The permanent root. Always attached and active.
    pub fn root(&self) -> ObjectKey {
        self.root
    }

    // ===== LOOKUP =====

    /// Any object still in the arena, including destroyed ones awaiting release.
    pub fn object(&self, key: ObjectKey) -> Option<&SceneObject> {
        self.objects.get(key)
    }

    pub fn component(&self, key: ComponentKey) -> Option<&Component> {
        self.components.get(key)
    }

    /// Live (not destroyed) objects, root included.
    pub fn object_count(&self) -> usize {
        self.objects.values().filter(|o| !o.destroyed).count()
    }

    /// Components of live objects. Removed components awaiting release are
    /// not counted, matching `object_count`.
    pub fn component_count(&self) -> usize {
        self.objects
            .values()
            .filter(|o| !o.destroyed)
            .map(|o| o.components.len())
            .sum()
    }

    /// Objects and components retired but not yet released.
    pub fn pending_garbage(&self) -> usize {
        self.garbage.pending()
    }

    /// Objects released since creation.
    pub fn freed_object_count(&self) -> u64 {
        self.freed_objects
    }

    fn live(&self, key: ObjectKey) -> Result<&SceneObject> {
        match self.objects.get(key) {
            Some(object) if !object.destroyed => Ok(object),
            Some(_) => Err(Error::InvalidHandle(format!("object {:?} is destroyed", key))),
            None => Err(Error::InvalidHandle(format!("object {:?} does not exist", key))),
        }
    }

    fn live_mut(&mut self, key: ObjectKey) -> Result<&mut SceneObject> {
        match self.objects.get_mut(key) {
            Some(object) if !object.destroyed => Ok(object),
            Some(_) => Err(Error::InvalidHandle(format!("object {:?} is destroyed", key))),
            None => Err(Error::InvalidHandle(format!("object {:?} does not exist", key))),
        }
    }

    /// Component still owned by a live object (not removed).
    fn owned_component(&self, key: ComponentKey) -> Result<&Component> {
        self.components
            .get(key)
            .filter(|c| self.objects.get(c.owner()).map_or(false, |o| o.components.contains(&key)))
            .ok_or_else(|| Error::InvalidHandle(format!("component {:?} is not attached to an object", key)))
    }

    // ===== QUERIES =====

    /// Children of `key` in insertion order.
    pub fn children(&self, key: ObjectKey) -> Children<'_> {
        Children {
            objects: &self.objects,
            next: self.objects.get(key).and_then(|o| o.first_child),
        }
    }

    /// Depth-first pre-order walk from `start`: a node before its
    /// descendants, siblings in insertion order.
    pub fn traverse(&self, start: ObjectKey) -> Traversal<'_> {
        let stack = if self.objects.contains_key(start) { vec![start] } else { Vec::new() };
        Traversal { objects: &self.objects, stack }
    }

    /// First object under the root (traversal order) with this name.
    pub fn find_by_name(&self, name: &str) -> Option<ObjectKey> {
        self.traverse(self.root).find(|&k| self.objects[k].name() == name)
    }

    /// First component of type `ty` on `object`.
    pub fn component_of_type(&self, object: ObjectKey, ty: ComponentType) -> Option<ComponentKey> {
        self.objects
            .get(object)?
            .components
            .iter()
            .copied()
            .find(|&c| self.components[c].component_type() == ty)
    }

    /// Components of `object` in update order.
    pub fn components(&self, object: ObjectKey) -> &[ComponentKey] {
        self.objects.get(object).map_or(&[], |o| o.components.as_slice())
    }

    /// Reachable from the root. Derived by walking up, never cached.
    pub fn is_attached_to_scene(&self, key: ObjectKey) -> bool {
        let mut current = key;
        loop {
            match self.objects.get(current) {
                Some(object) if object.destroyed => return false,
                Some(object) => match object.parent {
                    Some(parent) => current = parent,
                    None => return current == self.root,
                },
                None => return false,
            }
        }
    }

    /// Conjunction of the active flags from `key` up to its top ancestor.
    pub fn is_active_in_hierarchy(&self, key: ObjectKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            match self.objects.get(k) {
                Some(object) if object.active_self => current = object.parent,
                _ => return false,
            }
        }
        true
    }

    // ===== TREE MUTATION =====

    /// New object outside the scene (no parent, components stay detached).
    pub fn create_object(&mut self, name: impl Into<String>) -> ObjectKey {
        self.objects.insert(SceneObject::new(name.into()))
    }

    /// Create an object directly under `parent`.
    pub fn spawn(&mut self, parent: ObjectKey, name: impl Into<String>) -> Result<ObjectKey> {
        self.live(parent)?;
        let key = self.create_object(name);
        self.add_child(parent, key)?;
        Ok(key)
    }

    /// Move `child` (with its subtree) to the end of `parent`'s children.
    pub fn add_child(&mut self, parent: ObjectKey, child: ObjectKey) -> Result<()> {
        self.live(parent)?;
        self.live(child)?;
        if child == self.root {
            engine_bail!(SOURCE, "the scene root cannot be re-parented");
        }
        if parent == child {
            engine_bail!(SOURCE, "object {:?} cannot be its own parent", child);
        }
        if self.is_ancestor_or_self(child, parent) {
            engine_bail!(SOURCE, "parenting {:?} under its descendant {:?} would create a cycle", child, parent);
        }
        if self.objects[child].parent == Some(parent) {
            return Ok(());
        }

        self.unlink(child);
        self.link_last(parent, child);
        self.mark_world_dirty(child);
        self.refresh(child, true);
        Ok(())
    }

    /// Detach `child` from its parent. Its subtree leaves the scene.
    pub fn remove_from_parent(&mut self, child: ObjectKey) -> Result<()> {
        if self.live(child)?.parent.is_none() {
            return Ok(());
        }
        if child == self.root {
            engine_bail!(SOURCE, "the scene root cannot be removed");
        }
        self.unlink(child);
        self.mark_world_dirty(child);
        self.refresh(child, true);
        Ok(())
    }

    pub fn set_active(&mut self, key: ObjectKey, active: bool) -> Result<()> {
        if key == self.root && !active {
            engine_bail!(SOURCE, "the scene root cannot be deactivated");
        }
        let object = self.live_mut(key)?;
        if object.active_self == active {
            return Ok(());
        }
        object.active_self = active;
        self.refresh(key, true);
        Ok(())
    }

    pub fn set_name(&mut self, key: ObjectKey, name: impl Into<String>) -> Result<()> {
        self.live_mut(key)?.set_name(name);
        Ok(())
    }

    /// Detach the subtree (full cascade) and retire every object in it.
    ///
    /// The objects stay readable through `object()` with
    /// `is_destroyed() == true` until the GPU has finished the frame that
    /// was being recorded when they were retired.
    pub fn destroy(&mut self, key: ObjectKey) -> Result<()> {
        if key == self.root {
            engine_bail!(SOURCE, "the scene root cannot be destroyed");
        }
        match self.objects.get(key) {
            None => return Err(Error::InvalidHandle(format!("object {:?} does not exist", key))),
            Some(object) if object.destroyed => return Ok(()),
            Some(_) => {}
        }

        self.unlink(key);
        self.refresh(key, true);

        let subtree: Vec<ObjectKey> = self.traverse(key).collect();
        engine_debug!(SOURCE, "retiring {} object(s) under {:?}", subtree.len(), key);
        for k in subtree {
            self.objects[k].destroyed = true;
            self.garbage.retire(Garbage::Object(k));
        }
        Ok(())
    }

    fn is_ancestor_or_self(&self, ancestor: ObjectKey, node: ObjectKey) -> bool {
        let mut current = Some(node);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.objects.get(k).and_then(|o| o.parent);
        }
        false
    }

    fn unlink(&mut self, child: ObjectKey) {
        let (parent, prev, next) = {
            let node = &self.objects[child];
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if let Some(parent) = parent {
            match prev {
                Some(prev) => self.objects[prev].next_sibling = next,
                None => self.objects[parent].first_child = next,
            }
            match next {
                Some(next) => self.objects[next].prev_sibling = prev,
                None => self.objects[parent].last_child = prev,
            }
        }
        let node = &mut self.objects[child];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    fn link_last(&mut self, parent: ObjectKey, child: ObjectKey) {
        let last = self.objects[parent].last_child;
        {
            let node = &mut self.objects[child];
            node.parent = Some(parent);
            node.prev_sibling = last;
            node.next_sibling = None;
        }
        match last {
            Some(last) => self.objects[last].next_sibling = Some(child),
            None => self.objects[parent].first_child = Some(child),
        }
        self.objects[parent].last_child = Some(child);
    }

    // ===== COMPONENTS =====

    /// Append a component. It is driven to its state right away (callbacks
    /// fire if the owner is in the scene).
    pub fn add_component(&mut self, object: ObjectKey, data: impl Into<ComponentData>) -> Result<ComponentKey> {
        self.live(object)?;
        let key = self.components.insert(Component::new(object, data.into()));
        self.objects[object].components.push(key);
        self.refresh(object, false);
        Ok(key)
    }

    pub fn add_behaviour(&mut self, object: ObjectKey, behaviour: impl Behaviour + 'static) -> Result<ComponentKey> {
        self.add_component(object, ComponentData::behaviour(behaviour))
    }

    /// Detach a component (full cascade) and retire it.
    pub fn remove_component(&mut self, key: ComponentKey) -> Result<()> {
        let owner = self.owned_component(key)?.owner();
        self.drive(key, ComponentState::Detached);
        self.objects[owner].components.retain(|&c| c != key);
        self.garbage.retire(Garbage::Component(key));
        Ok(())
    }

    pub fn set_component_enabled(&mut self, key: ComponentKey, enabled: bool) -> Result<()> {
        let owner = self.owned_component(key)?.owner();
        if let Some(component) = self.components.get_mut(key) {
            component.set_enabled(enabled);
        }
        self.refresh(owner, false);
        Ok(())
    }

    pub fn camera_mut(&mut self, key: ComponentKey) -> Option<&mut Camera> {
        match self.components.get_mut(key)?.data_mut() {
            ComponentData::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn light_mut(&mut self, key: ComponentKey) -> Option<&mut Light> {
        match self.components.get_mut(key)?.data_mut() {
            ComponentData::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn renderer_mut(&mut self, key: ComponentKey) -> Option<&mut MeshRenderer> {
        match self.components.get_mut(key)?.data_mut() {
            ComponentData::Renderer(renderer) => Some(renderer),
            _ => None,
        }
    }

    pub fn gui_mut(&mut self, key: ComponentKey) -> Option<&mut GuiElement> {
        match self.components.get_mut(key)?.data_mut() {
            ComponentData::Gui(element) => Some(element),
            _ => None,
        }
    }

    // ===== LIFECYCLE =====

    /// Step one component to `desired`, one transition at a time.
    fn drive(&mut self, key: ComponentKey, desired: ComponentState) {
        let Some(component) = self.components.get_mut(key) else { return };
        while component.state() != desired {
            let event = match (component.state(), desired) {
                (ComponentState::Active, _) => LifecycleEvent::Deactivate,
                (ComponentState::Attached, ComponentState::Detached) => LifecycleEvent::Detach,
                (ComponentState::Attached, _) => LifecycleEvent::Activate,
                (ComponentState::Detached, _) => LifecycleEvent::Attach,
            };
            component.transition(key, event);
        }
    }

    /// Re-derive component states for `top` (and its subtree).
    fn refresh(&mut self, top: ObjectKey, subtree: bool) {
        let attached = self.is_attached_to_scene(top);
        let parent_active = match self.objects.get(top).and_then(|o| o.parent) {
            Some(parent) => self.is_active_in_hierarchy(parent),
            None => true,
        };

        let order: Vec<ObjectKey> = if subtree {
            self.traverse(top).collect()
        } else {
            vec![top]
        };

        let mut active_of: FxHashMap<ObjectKey, bool> = FxHashMap::default();
        let mut plan: Vec<(ComponentKey, ComponentState)> = Vec::new();
        for key in order {
            let object = &self.objects[key];
            let inherited = match object.parent {
                Some(parent) if key != top => active_of.get(&parent).copied().unwrap_or(false),
                _ => parent_active,
            };
            let active = object.active_self && inherited;
            active_of.insert(key, active);

            for &c in &object.components {
                let desired = if !attached {
                    ComponentState::Detached
                } else if active && self.components[c].is_enabled() {
                    ComponentState::Active
                } else {
                    ComponentState::Attached
                };
                plan.push((c, desired));
            }
        }

        let passes = [
            (ComponentState::Active, LifecycleEvent::Deactivate),
            (ComponentState::Attached, LifecycleEvent::Detach),
            (ComponentState::Detached, LifecycleEvent::Attach),
            (ComponentState::Attached, LifecycleEvent::Activate),
        ];
        for (from, event) in passes {
            for &(key, desired) in &plan {
                let Some(component) = self.components.get_mut(key) else { continue };
                if component.state() != from {
                    continue;
                }
                let fire = match event {
                    LifecycleEvent::Deactivate => desired != ComponentState::Active,
                    LifecycleEvent::Detach => desired == ComponentState::Detached,
                    LifecycleEvent::Attach => desired != ComponentState::Detached,
                    LifecycleEvent::Activate => desired == ComponentState::Active,
                };
                if fire {
                    engine_trace!(SOURCE, "component {:?}: {:?}", key, event);
                    component.transition(key, event);
                }
            }
        }
    }

    // ===== TRANSFORMS =====

    pub fn set_local_position(&mut self, key: ObjectKey, position: Vec3) -> Result<()> {
        self.live_mut(key)?.transform.set_position(position);
        self.mark_world_dirty(key);
        Ok(())
    }

    pub fn set_local_rotation(&mut self, key: ObjectKey, rotation: Quat) -> Result<()> {
        self.live_mut(key)?.transform.set_rotation(rotation);
        self.mark_world_dirty(key);
        Ok(())
    }

    pub fn set_local_scale(&mut self, key: ObjectKey, scale: Vec3) -> Result<()> {
        self.live_mut(key)?.transform.set_scale(scale);
        self.mark_world_dirty(key);
        Ok(())
    }

    pub fn set_local_trs(&mut self, key: ObjectKey, position: Vec3, rotation: Quat, scale: Vec3) -> Result<()> {
        let transform = &mut self.live_mut(key)?.transform;
        transform.set_position(position);
        transform.set_rotation(rotation);
        transform.set_scale(scale);
        self.mark_world_dirty(key);
        Ok(())
    }

    /// Flag `key` and every descendant world-dirty.
    ///
    /// A world-dirty node always has world-dirty descendants, so the walk
    /// stops at nodes already flagged.
    fn mark_world_dirty(&mut self, key: ObjectKey) {
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            let object = &mut self.objects[k];
            if object.transform.is_world_dirty() {
                continue;
            }
            object.transform.mark_world_dirty();
            let mut child = object.first_child;
            while let Some(c) = child {
                stack.push(c);
                child = self.objects[c].next_sibling;
            }
        }
    }

    /// World matrix of `key`. With `force_validate`, dirty ancestors are
    /// validated top down first; otherwise the cached value is returned.
    pub fn world_matrix(&mut self, key: ObjectKey, force_validate: bool) -> Result<Mat4> {
        if !self.objects.contains_key(key) {
            return Err(Error::InvalidHandle(format!("object {:?} does not exist", key)));
        }
        if force_validate {
            self.validate_chain(key);
        }
        Ok(*self.objects[key].transform.world_matrix())
    }

    /// Cached world matrix without validation.
    pub fn cached_world_matrix(&self, key: ObjectKey) -> Option<Mat4> {
        self.objects.get(key).map(|o| *o.transform.world_matrix())
    }

    /// Validated world position.
    pub fn world_position(&mut self, key: ObjectKey) -> Result<Vec3> {
        Ok(self.world_matrix(key, true)?.col(3).truncate())
    }

    fn validate_chain(&mut self, key: ObjectKey) {
        let mut chain = Vec::new();
        let mut current = Some(key);
        while let Some(k) = current {
            chain.push(k);
            current = self.objects[k].parent;
        }
        let mut parent_world: Option<Mat4> = None;
        for k in chain.into_iter().rev() {
            let transform = &mut self.objects[k].transform;
            transform.validate(parent_world.as_ref());
            parent_world = Some(*transform.world_matrix());
        }
    }

    /// Validate every dirty transform, parents before children.
    /// A second call in the same frame recomputes nothing. Retired subtrees
    /// are skipped.
    pub fn validate_hierarchy(&mut self) {
        let tops: Vec<ObjectKey> = self
            .objects
            .iter()
            .filter(|(_, o)| o.parent.is_none() && !o.destroyed)
            .map(|(k, _)| k)
            .collect();

        let mut stack: Vec<(ObjectKey, Option<Mat4>)> = Vec::new();
        for top in tops {
            stack.push((top, None));
            while let Some((k, parent_world)) = stack.pop() {
                let object = &mut self.objects[k];
                object.transform.validate(parent_world.as_ref());
                let world = *object.transform.world_matrix();
                let mut child = object.first_child;
                while let Some(c) = child {
                    stack.push((c, Some(world)));
                    child = self.objects[c].next_sibling;
                }
            }
        }
    }

    // ===== PER-FRAME CALLBACKS =====

    /// Run `begin` (when due) and `update` on every active component.
    pub fn update(&mut self, time: FrameTime, input: &dyn InputState) {
        self.run_phase(Phase::Update, time, input);
    }

    /// Run `post_update` on every active component that has begun.
    pub fn post_update(&mut self, time: FrameTime, input: &dyn InputState) {
        self.run_phase(Phase::PostUpdate, time, input);
    }

    /// Active components in traversal order, each object's in insertion order.
    fn active_components(&self) -> Vec<ComponentKey> {
        self.traverse(self.root)
            .flat_map(|k| self.objects[k].components.iter().copied())
            .filter(|&c| self.components.get(c).map_or(false, Component::is_active))
            .collect()
    }

    fn is_component_active(&self, key: ComponentKey) -> bool {
        self.components.get(key).map_or(false, Component::is_active)
    }

    fn run_phase(&mut self, phase: Phase, time: FrameTime, input: &dyn InputState) {
        for key in self.active_components() {
            let Some(component) = self.components.get_mut(key) else { continue };
            // An earlier callback this frame may have deactivated it
            if !component.is_active() {
                continue;
            }
            match component.data_mut() {
                ComponentData::Renderer(renderer) => {
                    if phase == Phase::Update {
                        renderer.advance(time.delta);
                    }
                    continue;
                }
                ComponentData::Behaviour(_) => {}
                _ => continue,
            }

            let needs_begin = phase == Phase::Update && !component.has_begun();
            if phase == Phase::PostUpdate && !component.has_begun() {
                continue;
            }
            if needs_begin {
                component.mark_begun();
            }
            let object = component.owner();
            let Some(mut behaviour) = component.take_behaviour() else { continue };

            {
                let mut ctx = UpdateContext { scene: &mut *self, object, component: key, time, input };
                if needs_begin {
                    behaviour.begin(&mut ctx);
                }
                if ctx.scene.is_component_active(key) {
                    match phase {
                        Phase::Update => behaviour.update(&mut ctx),
                        Phase::PostUpdate => behaviour.post_update(&mut ctx),
                    }
                }
            }

            if let Some(component) = self.components.get_mut(key) {
                component.restore_behaviour(key, behaviour);
            }
        }
    }

    // ===== GARBAGE =====

    /// Release everything whose epoch the GPU has completed.
    /// Returns the number of released items.
    pub fn collect_garbage(&mut self, completed_fence: u64) -> usize {
        let items = self.garbage.take_reclaimable(completed_fence);
        let count = items.len();
        for item in items {
            self.release(item);
        }
        if count > 0 {
            engine_debug!(SOURCE, "released {} item(s) at fence {}", count, completed_fence);
        }
        count
    }

    /// Tag everything retired this frame with the frame's fence value.
    pub fn seal_garbage(&mut self, fence_value: u64) {
        self.garbage.seal(fence_value);
    }

    /// Release every pending item. Only valid once the GPU is idle.
    pub fn release_all_garbage(&mut self) -> usize {
        let mut released = 0;
        loop {
            let items = self.garbage.take_all();
            if items.is_empty() {
                return released;
            }
            released += items.len();
            for item in items {
                self.release(item);
            }
        }
    }

    fn release(&mut self, item: Garbage) {
        match item {
            Garbage::Object(key) => {
                if let Some(object) = self.objects.remove(key) {
                    for component in object.components {
                        self.components.remove(component);
                    }
                    self.freed_objects += 1;
                }
            }
            Garbage::Component(key) => {
                self.components.remove(key);
            }
        }
    }
}

// ===== ITERATORS =====

/// Iterator over the children of one object.
pub struct Children<'a> {
    objects: &'a SlotMap<ObjectKey, SceneObject>,
    next: Option<ObjectKey>,
}

impl Iterator for Children<'_> {
    type Item = ObjectKey;

    fn next(&mut self) -> Option<ObjectKey> {
        let current = self.next?;
        self.next = self.objects.get(current).and_then(|o| o.next_sibling);
        Some(current)
    }
}

/// Depth-first pre-order iterator.
pub struct Traversal<'a> {
    objects: &'a SlotMap<ObjectKey, SceneObject>,
    stack: Vec<ObjectKey>,
}

impl Iterator for Traversal<'_> {
    type Item = ObjectKey;

    fn next(&mut self) -> Option<ObjectKey> {
        let current = self.stack.pop()?;
        // Push in reverse so the first child is visited first
        let mut child = self.objects.get(current).and_then(|o| o.last_child);
        while let Some(c) = child {
            self.stack.push(c);
            child = self.objects.get(c).and_then(|o| o.prev_sibling);
        }
        Some(current)
    }
}

#[cfg(test)]
#[path = "scene_graph_tests.rs"]
mod tests;
