use serde::{Deserialize, Serialize};

use crate::vector::Coord;

/// Classification tag for a body; drives grouping in the render query and
/// the default display color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BodyKind {
    Star,
    Quasar,
    Planet,
    Comet,
    Asteroid,
    Blackhole,
    Wormhole,
    Default,
}

impl BodyKind {
    /// RGBA used when a scenario does not specify a color of its own.
    pub fn default_color(self) -> [f32; 4] {
        match self {
            Self::Star => [1.0, 0.95, 0.6, 1.0],
            Self::Quasar => [0.6, 0.85, 1.0, 1.0],
            Self::Planet => [0.35, 0.65, 1.0, 1.0],
            Self::Comet => [0.8, 0.9, 1.0, 1.0],
            Self::Asteroid => [0.55, 0.5, 0.45, 1.0],
            Self::Blackhole => [0.12, 0.05, 0.2, 1.0],
            Self::Wormhole => [0.5, 0.2, 0.8, 1.0],
            Self::Default => [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// A point-mass particle in the simulation.
///
/// `force` accumulates during the force pass of a step and is reset at the
/// start of the next one; everything else is either identity or state the
/// integrator advances.
#[derive(Clone, Debug)]
pub struct Body<V> {
    /// Stable, non-negative, unique across the live population.
    pub id: i64,
    /// Human label, used only in diagnostics.
    pub name: String,
    pub position: V,
    pub velocity: V,
    pub force: V,
    pub mass: f64,
    pub radius: f64,
    pub kind: BodyKind,
    /// RGBA for the renderer collaborator.
    pub color: [f32; 4],
}

impl<V: Coord> Body<V> {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        position: V,
        velocity: V,
        mass: f64,
        radius: f64,
        kind: BodyKind,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            velocity,
            force: V::zero(),
            mass,
            radius,
            kind,
            color: kind.default_color(),
        }
    }
}
