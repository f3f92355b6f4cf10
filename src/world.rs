use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use rayon::prelude::*;

use crate::body::{Body, BodyKind};
use crate::config::{CullPolicy, SimConfig};
use crate::render::RenderBatch;
use crate::scenario::{Scenario, ScenarioError};
use crate::tree::{Aabb, PointMass, Region};
use crate::vector::Coord;

/// What the force/integration pass observed for one body.
struct StepOutcome {
    culled: bool,
    /// Distance of the committed position from the origin; drives root growth.
    radius: f64,
}

/// The simulation driver: the flat body list, the current tree, and the
/// per-step pipeline that ties them together.
///
/// A step runs in two phases. Phase A integrates and accumulates forces,
/// data-parallel over bodies against the immutable tree built at the end of
/// the previous step. Phase B is sequential: culled bodies leave the
/// population, the root grows if anything drifted outside it, and the tree
/// is rebuilt from scratch with every survivor reinserted in list order.
pub struct World<V: Coord> {
    /// Live population. Order is stable across steps, which keeps trace
    /// columns and render indices meaningful.
    pub bodies: Vec<Body<V>>,
    /// Root of the tree the next force pass will traverse.
    pub root: Region<V>,
    pub config: SimConfig,
    /// Bodies removed under [`CullPolicy::Retire`], in cull order.
    pub retired: Vec<Body<V>>,
    /// Simulated seconds so far.
    pub time: f64,
    /// Steps taken so far.
    pub frame: usize,
}

impl<V: Coord> World<V> {
    /// An empty world with a unit root cube at the origin.
    pub fn new(config: SimConfig) -> Self {
        Self {
            bodies: Vec::new(),
            root: Region::new(Aabb::new(V::zero(), 1.0), config.max_bucket),
            config,
            retired: Vec::new(),
            time: 0.0,
            frame: 0,
        }
    }

    /// A world populated from an in-memory body list, with the root sized
    /// to enclose it.
    pub fn with_bodies(bodies: Vec<Body<V>>, config: SimConfig) -> Self {
        let mut world = Self::new(config);
        world.bodies = bodies;
        world.fit_root();
        world
    }

    /// Loads scenario bodies into the population and rebuilds the tree.
    /// Rejects ids that collide with each other or with bodies already
    /// loaded. Returns how many bodies were added.
    pub fn load_scenario(&mut self, scenario: Scenario) -> Result<usize, ScenarioError> {
        let mut incoming = scenario.into_bodies::<V>()?;

        let mut seen: HashSet<i64> = self.bodies.iter().map(|body| body.id).collect();
        for body in &incoming {
            if !seen.insert(body.id) {
                return Err(ScenarioError::DuplicateId { id: body.id });
            }
        }

        let count = incoming.len();
        self.bodies.append(&mut incoming);
        self.fit_root();
        tracing::info!(
            count,
            total = self.bodies.len(),
            half = self.root.bounds.half,
            "scenario bodies loaded"
        );
        Ok(count)
    }

    /// Reads and loads a scenario file. See [`Scenario`] for the format.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize, ScenarioError> {
        let scenario = Scenario::from_path(path.as_ref())?;
        self.load_scenario(scenario)
    }

    /// Adds one body to the population and the current tree. The tree
    /// silently rejects a position outside the root bounds; such a body is
    /// picked up (or culled) by the next `step`.
    pub fn insert_body(&mut self, body: Body<V>) {
        self.root.insert(PointMass::from(&body));
        self.bodies.push(body);
    }

    /// Advances the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        // Phase A. The tree is read-only while workers run, and each worker
        // owns exactly one body, so the section is lock-free.
        let root = &self.root;
        let config = self.config;
        let center_of_mass = root.center_of_mass;
        let cull_radius = config.cull_threshold * root.bounds.half;

        let outcomes: Vec<StepOutcome> = if config.parallel {
            self.bodies
                .par_iter_mut()
                .map(|body| Self::step_body(body, root, &config, center_of_mass, cull_radius, dt))
                .collect()
        } else {
            self.bodies
                .iter_mut()
                .map(|body| Self::step_body(body, root, &config, center_of_mass, cull_radius, dt))
                .collect()
        };

        // Phase B: drop culled bodies, grow the root if needed, rebuild.
        if outcomes.iter().any(|outcome| outcome.culled) {
            let policy = config.cull_policy;
            let retired = &mut self.retired;
            let mut index = 0;
            self.bodies.retain(|body| {
                let keep = !outcomes[index].culled;
                index += 1;
                if !keep {
                    tracing::warn!(id = body.id, name = %body.name, "body left the domain, culled");
                    if policy == CullPolicy::Retire {
                        retired.push(body.clone());
                    }
                }
                keep
            });
        }

        let mut half = self.root.bounds.half;
        let mut expanded = false;
        for outcome in &outcomes {
            if !outcome.culled && outcome.radius > half {
                half = outcome.radius;
                expanded = true;
            }
        }
        if expanded {
            half *= 2.0;
            tracing::debug!(half, "root grown to keep drifting bodies in bounds");
        }

        self.rebuild_with(half);
        self.time += dt;
        self.frame += 1;
    }

    /// Velocity-Verlet update of one body against the frozen tree.
    fn step_body(
        body: &mut Body<V>,
        root: &Region<V>,
        config: &SimConfig,
        center_of_mass: V,
        cull_radius: f64,
        dt: f64,
    ) -> StepOutcome {
        let acc_old = body.force / body.mass;
        let new_position = body.position + body.velocity * dt + acc_old * (dt * dt * 0.5);

        if (new_position - center_of_mass).mag() > cull_radius {
            return StepOutcome {
                culled: true,
                radius: 0.0,
            };
        }

        // Forces reset here and only here; the traversal reads positions as
        // they were when the tree was built, so every body sees the same
        // snapshot regardless of worker interleaving.
        let force = root.force_on(body, config);
        body.force = force;

        let acc_new = force / body.mass;
        body.velocity += (acc_old + acc_new) * (dt * 0.5);
        body.position = new_position;

        StepOutcome {
            culled: false,
            radius: new_position.mag(),
        }
    }

    /// Rebuilds the tree from the current body list, growing the root if any
    /// body sits outside it. `step` does this implicitly; the explicit entry
    /// point serves loading and diagnostics.
    pub fn rebuild(&mut self) {
        let mut half = self.root.bounds.half;
        let mut expanded = false;
        for body in &self.bodies {
            let radius = body.position.mag();
            if radius > half {
                half = radius;
                expanded = true;
            }
        }
        if expanded {
            half *= 2.0;
        }
        self.rebuild_with(half);
    }

    /// Sizes the root to twice the furthest body's distance from the origin,
    /// keeping the current center, and rebuilds. Falls back to a unit cube
    /// for an empty or origin-only population.
    fn fit_root(&mut self) {
        let r_max = self
            .bodies
            .iter()
            .map(|body| body.position.mag())
            .fold(0.0, f64::max);
        let half = if r_max > 0.0 { 2.0 * r_max } else { 1.0 };
        self.rebuild_with(half);
    }

    fn rebuild_with(&mut self, half: f64) {
        let mut root = Region::new(
            Aabb::new(self.root.bounds.center, half),
            self.config.max_bucket,
        );
        for body in &self.bodies {
            root.insert(PointMass::from(body));
        }
        self.root = root;
    }

    /// Ordered positions for trace output; one CSV row is
    /// `time,x0,y0[,z0],x1,y1[,z1],…` over this iterator.
    pub fn positions(&self) -> impl Iterator<Item = V> + '_ {
        self.bodies.iter().map(|body| body.position)
    }

    /// Packs the population into one vertex batch per kind, each vertex
    /// `position…, r, g, b, a, radius` (stride D + 5), ready for buffer
    /// upload. Kinds come out in a fixed order; bodies keep list order
    /// within their batch.
    pub fn bodies_by_kind(&self) -> Vec<RenderBatch> {
        let stride = V::DIM + 5;
        let mut batches: BTreeMap<BodyKind, Vec<f32>> = BTreeMap::new();
        for body in &self.bodies {
            let data = batches.entry(body.kind).or_default();
            body.position.push_components(data);
            data.extend_from_slice(&body.color);
            data.push(body.radius as f32);
        }
        batches
            .into_iter()
            .map(|(kind, data)| RenderBatch { kind, stride, data })
            .collect()
    }

    /// Appends every live region's AABB corners (with the region color) for
    /// the debug overlay. See [`Region::box_vertices`] for the layout.
    pub fn tree_box_vertices(&self, out: &mut Vec<f32>) {
        self.root.box_vertices(out);
    }
}
