use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::body::{Body, BodyKind};
use crate::vector::Coord;

/// Why a scenario failed to load. Load failures always surface to the
/// caller; nothing here is recoverable inside the core.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to open scenario file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed scenario JSON")]
    Json(#[from] serde_json::Error),
    #[error("body {id} ({name}): expected {expected} {field} components, got {got}")]
    Dimension {
        id: i64,
        name: String,
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("body {id} ({name}): mass must be positive, got {mass}")]
    NonPositiveMass { id: i64, name: String, mass: f64 },
    #[error("body {id} ({name}): radius must be positive, got {radius}")]
    NonPositiveRadius { id: i64, name: String, radius: f64 },
    #[error("body {id} ({name}): id must be non-negative")]
    InvalidId { id: i64, name: String },
    #[error("duplicate body id {id}")]
    DuplicateId { id: i64 },
}

/// One body entry of the input file. `position` and `velocity` carry their
/// components as arrays so the same file shape serves 2D and 3D; the arity
/// is checked against the world's dimensionality at conversion time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioBody {
    pub id: i64,
    pub name: String,
    pub mass: f64,
    pub radius: f64,
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    #[serde(rename = "type")]
    pub kind: BodyKind,
    /// RGBA in 0..1. Defaults per kind when absent.
    #[serde(default)]
    pub color: Option<[f32; 4]>,
}

/// An input scenario:
///
/// ```json
/// { "bodies": [
///     { "id": 0, "name": "Earth", "mass": 5.972e24, "radius": 6.371e6,
///       "position": [0.0, 0.0, 0.0], "velocity": [0.0, 0.0, 0.0],
///       "type": "Planet", "color": [0.35, 0.65, 1.0, 1.0] } ] }
/// ```
///
/// An unrecognized `type` string fails the parse.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub bodies: Vec<ScenarioBody>,
}

impl Scenario {
    pub fn from_path(path: &Path) -> Result<Self, ScenarioError> {
        let file = File::open(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validates every entry and converts it for a D-dimensional world.
    /// Id uniqueness is the caller's concern (the world checks it against
    /// the population it already holds).
    pub fn into_bodies<V: Coord>(self) -> Result<Vec<Body<V>>, ScenarioError> {
        let mut bodies = Vec::with_capacity(self.bodies.len());
        for entry in self.bodies {
            if entry.id < 0 {
                return Err(ScenarioError::InvalidId {
                    id: entry.id,
                    name: entry.name,
                });
            }
            if entry.mass <= 0.0 {
                return Err(ScenarioError::NonPositiveMass {
                    id: entry.id,
                    name: entry.name,
                    mass: entry.mass,
                });
            }
            if entry.radius <= 0.0 {
                return Err(ScenarioError::NonPositiveRadius {
                    id: entry.id,
                    name: entry.name,
                    radius: entry.radius,
                });
            }

            let position =
                V::from_components(&entry.position).ok_or_else(|| ScenarioError::Dimension {
                    id: entry.id,
                    name: entry.name.clone(),
                    field: "position",
                    expected: V::DIM,
                    got: entry.position.len(),
                })?;
            let velocity =
                V::from_components(&entry.velocity).ok_or_else(|| ScenarioError::Dimension {
                    id: entry.id,
                    name: entry.name.clone(),
                    field: "velocity",
                    expected: V::DIM,
                    got: entry.velocity.len(),
                })?;

            let mut body = Body::new(
                entry.id,
                entry.name,
                position,
                velocity,
                entry.mass,
                entry.radius,
                entry.kind,
            );
            if let Some(color) = entry.color {
                body.color = color;
            }
            bodies.push(body);
        }
        Ok(bodies)
    }
}
