//! Immutable render resources shared between scene components.
//!
//! Meshes and materials come from the asset source and are referenced by
//! `Arc`. A missing resource is represented by `None` at the point of use.

pub mod bounds;
pub mod mesh;
pub mod material;

pub use bounds::Aabb;
pub use mesh::{Mesh, MeshDesc, SubMesh};
pub use material::{Material, RenderGroup};
