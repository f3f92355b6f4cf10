//! Barnes–Hut gravitational N-body simulation, parametric over 2D and 3D.
//!
//! Bodies live in a flat list owned by a [`World`]; every step rebuilds an
//! adaptive spatial tree ([`Region`], a quadtree in 2D and an octree in 3D),
//! accumulates forces against it with the Barnes–Hut opening criterion, and
//! integrates motion with velocity-Verlet. Scenarios load from JSON; render
//! and trace collaborators consume the read-only query surface on `World`.

pub mod body;
pub mod config;
pub mod render;
pub mod scenario;
pub mod tree;
pub mod utils;
pub mod vector;
pub mod world;

pub use body::{Body, BodyKind};
pub use config::{CullPolicy, SimConfig};
pub use render::RenderBatch;
pub use scenario::{Scenario, ScenarioError};
pub use tree::{Aabb, PointMass, Region};
pub use vector::Coord;
pub use world::World;

pub use ultraviolet::{DVec2, DVec3};

/// 2D world over [`DVec2`].
pub type World2 = World<DVec2>;
/// 3D world over [`DVec3`].
pub type World3 = World<DVec3>;
