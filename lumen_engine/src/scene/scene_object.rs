//! SceneObject: tree node with one transform and ordered components.

use slotmap::new_key_type;
use super::component::ComponentKey;
use super::transform::Transform;

new_key_type! {
    /// Stable, generation-checked key of a scene object.
    pub struct ObjectKey;
}

/// Tree node. Links are arena keys maintained by `SceneGraph`.
pub struct SceneObject {
    name: String,
    pub(crate) transform: Transform,
    pub(crate) components: Vec<ComponentKey>,
    pub(crate) active_self: bool,
    pub(crate) destroyed: bool,
    pub(crate) parent: Option<ObjectKey>,
    pub(crate) first_child: Option<ObjectKey>,
    pub(crate) last_child: Option<ObjectKey>,
    pub(crate) prev_sibling: Option<ObjectKey>,
    pub(crate) next_sibling: Option<ObjectKey>,
}

impl SceneObject {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            transform: Transform::default(),
            components: Vec::new(),
            active_self: true,
            destroyed: false,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Components in insertion (= update) order.
    pub fn components(&self) -> &[ComponentKey] {
        &self.components
    }

    /// The object's own active flag, ignoring ancestors.
    pub fn is_active_self(&self) -> bool {
        self.active_self
    }

    /// Retired and waiting for the GPU to release it.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn parent(&self) -> Option<ObjectKey> {
        self.parent
    }

    pub fn first_child(&self) -> Option<ObjectKey> {
        self.first_child
    }

    pub fn next_sibling(&self) -> Option<ObjectKey> {
        self.next_sibling
    }
}
