use crate::body::Body;
use crate::config::SimConfig;
use crate::vector::Coord;

/// Subdivision stops here even if a bucket is over capacity; this keeps
/// coincident bodies from splitting the tree forever.
const MAX_DEPTH: u32 = 64;

/// An axis-aligned cube: a center plus one half-extent shared by every axis.
#[derive(Clone, Copy, Debug)]
pub struct Aabb<V> {
    pub center: V,
    /// Half the side length. Regions are always cubes.
    pub half: f64,
    /// Diagnostic RGB, advanced along a color wheel as the tree deepens.
    /// Only the renderer collaborator reads it.
    pub color: [f32; 3],
}

impl<V: Coord> Aabb<V> {
    pub fn new(center: V, half: f64) -> Self {
        Self::with_color(center, half, [1.0, 1.0, 1.0])
    }

    pub fn with_color(center: V, half: f64, color: [f32; 3]) -> Self {
        Self {
            center,
            half,
            color,
        }
    }

    /// Side length of the cube.
    pub fn length(&self) -> f64 {
        2.0 * self.half
    }

    /// Inclusive on every face.
    pub fn contains(&self, point: V) -> bool {
        (0..V::DIM).all(|axis| {
            let c = self.center.component(axis);
            let p = point.component(axis);
            p >= c - self.half && p <= c + self.half
        })
    }

    /// Child index for a point: bit `j` is set iff the point lies strictly
    /// above the center on axis `j`. Points exactly on a center plane sort
    /// into the lower-side child.
    pub fn region_index(&self, point: V) -> usize {
        let mut index = 0;
        for axis in 0..V::DIM {
            if point.component(axis) > self.center.component(axis) {
                index |= 1 << axis;
            }
        }
        index
    }

    /// Appends the 2^D corners in `basis` order, each packed as position
    /// components followed by the box RGB, so a fixed index buffer can form
    /// the edge list.
    pub fn corners(&self, out: &mut Vec<f32>) {
        for index in 0..V::PARTITIONS {
            let corner = self.center + V::basis(index) * self.half;
            corner.push_components(out);
            out.extend_from_slice(&self.color);
        }
    }
}

/// The slice of a body the tree actually needs: identity for self-interaction
/// checks, position and mass for the force sums. Buckets hold these by value;
/// the world's body list stays authoritative for everything else.
#[derive(Clone, Copy, Debug)]
pub struct PointMass<V> {
    pub id: i64,
    pub position: V,
    pub mass: f64,
}

impl<V: Coord> PointMass<V> {
    pub fn new(id: i64, position: V, mass: f64) -> Self {
        Self { id, position, mass }
    }
}

impl<V: Coord> From<&Body<V>> for PointMass<V> {
    fn from(body: &Body<V>) -> Self {
        Self::new(body.id, body.position, body.mass)
    }
}

/// One node of the spatial subdivision tree: a quadtree cell in 2D, an
/// octree cell in 3D.
///
/// A region is a leaf iff it has no children; leaves hold up to `max_bucket`
/// resident bodies, internal nodes hold none. `center_of_mass`, `total_mass`
/// and `descendants` aggregate the whole subtree and are maintained on the
/// way down during insertion, so they are valid at every moment the tree is
/// observable.
#[derive(Clone, Debug)]
pub struct Region<V> {
    pub bounds: Aabb<V>,
    /// Either all 2^D children (internal node) or none (leaf).
    pub children: Option<Box<[Region<V>]>>,
    /// Resident bodies, in insertion order. Empty for internal nodes.
    pub bucket: Vec<PointMass<V>>,
    /// Mass-weighted mean position of the subtree. Meaningless while
    /// `descendants == 0`.
    pub center_of_mass: V,
    pub total_mass: f64,
    /// Bodies in the subtree.
    pub descendants: usize,
    /// Leaf capacity K for this node and everything below it.
    pub max_bucket: usize,
    depth: u32,
}

impl<V: Coord> Region<V> {
    pub fn new(bounds: Aabb<V>, max_bucket: usize) -> Self {
        Self::at_depth(bounds, max_bucket, 0)
    }

    fn at_depth(bounds: Aabb<V>, max_bucket: usize, depth: u32) -> Self {
        Self {
            bounds,
            children: None,
            bucket: Vec::new(),
            center_of_mass: V::zero(),
            total_mass: 0.0,
            descendants: 0,
            max_bucket,
            depth,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Inserts a body into the subtree. A position outside `bounds` is
    /// dropped silently; the world prevents that for the root by sizing it
    /// during the rebuild, and near-boundary rejections during descent are
    /// tolerated.
    pub fn insert(&mut self, body: PointMass<V>) {
        if !self.bounds.contains(body.position) {
            return;
        }

        self.descendants += 1;
        self.absorb(&body);

        if self.is_leaf() {
            if self.bucket.len() < self.max_bucket || self.depth >= MAX_DEPTH {
                self.bucket.push(body);
                return;
            }
            // Capacity reached: split and push every resident down before
            // the new body, so an internal node never keeps a bucket.
            self.subdivide();
            for resident in std::mem::take(&mut self.bucket) {
                self.insert_into_child(resident);
            }
        }

        self.insert_into_child(body);
    }

    fn insert_into_child(&mut self, body: PointMass<V>) {
        let index = self.bounds.region_index(body.position);
        if let Some(children) = self.children.as_mut() {
            children[index].insert(body);
        }
    }

    /// Folds one body into the running aggregate.
    fn absorb(&mut self, body: &PointMass<V>) {
        self.center_of_mass = (self.center_of_mass * self.total_mass
            + body.position * body.mass)
            / (self.total_mass + body.mass);
        self.total_mass += body.mass;
    }

    /// Allocates the 2^D children, each half this region's extent, centered
    /// one quarter-length along every axis per the `basis` sign patterns.
    fn subdivide(&mut self) {
        let half = self.bounds.half * 0.5;
        let color = advance_wheel(self.bounds.color);
        let children: Vec<Region<V>> = (0..V::PARTITIONS)
            .map(|index| {
                let center = self.bounds.center + V::basis(index) * half;
                Self::at_depth(
                    Aabb::with_color(center, half, color),
                    self.max_bucket,
                    self.depth + 1,
                )
            })
            .collect();
        self.children = Some(children.into_boxed_slice());
    }

    /// Gravitational force of this subtree on `body`, using the Barnes–Hut
    /// opening criterion unless `config.brute_force` is set.
    pub fn force_on(&self, body: &Body<V>, config: &SimConfig) -> V {
        let mut force = V::zero();
        self.accumulate_force(body.id, body.position, body.mass, &body.name, config, &mut force);
        force
    }

    fn accumulate_force(
        &self,
        id: i64,
        position: V,
        mass: f64,
        name: &str,
        config: &SimConfig,
        force: &mut V,
    ) {
        if self.descendants == 0 {
            return;
        }

        if !self.is_leaf() {
            let offset = position - self.center_of_mass;
            let distance = offset.mag();

            // Far enough away: the whole subtree collapses to a pseudo-body
            // at its center of mass.
            if !config.brute_force && self.bounds.length() / distance < config.theta {
                contribute(force, position, mass, self.center_of_mass, self.total_mass, name, config);
                return;
            }

            if let Some(children) = self.children.as_ref() {
                for child in children.iter() {
                    if child.descendants > 0 {
                        child.accumulate_force(id, position, mass, name, config, force);
                    }
                }
            }
            return;
        }

        for other in &self.bucket {
            if other.id == id {
                continue;
            }
            contribute(force, position, mass, other.position, other.mass, name, config);
        }
    }

    /// Appends the AABB corners of this region and every region below it,
    /// pre-order, children in `basis` order.
    pub fn box_vertices(&self, out: &mut Vec<f32>) {
        self.bounds.corners(out);
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.box_vertices(out);
            }
        }
    }
}

/// Adds the attraction of a point mass at `other_position` to `force`.
/// Pairs at or inside the softening distance contribute nothing; that skip
/// is the only guard against the 1/r² singularity.
fn contribute<V: Coord>(
    force: &mut V,
    position: V,
    mass: f64,
    other_position: V,
    other_mass: f64,
    name: &str,
    config: &SimConfig,
) {
    let offset = position - other_position;
    let distance = offset.mag();

    if distance <= config.epsilon {
        tracing::warn!(
            body = name,
            distance,
            "bodies closer than the softening distance, contribution skipped"
        );
        return;
    }

    *force += offset * (-(config.g * mass * other_mass) / (distance * distance * distance));
}

/// One step along the diagnostic color wheel: walk red down in 0.25
/// decrements, cascading into green and then blue on wrap.
fn advance_wheel(mut color: [f32; 3]) -> [f32; 3] {
    const STEP: f32 = 0.25;
    color[0] -= STEP;
    if color[0] < 0.0 {
        color[0] = 1.0;
        color[1] -= STEP;
        if color[1] < 0.0 {
            color[1] = 1.0;
            color[2] -= STEP;
            if color[2] < 0.0 {
                color[2] = 1.0;
            }
        }
    }
    color
}
