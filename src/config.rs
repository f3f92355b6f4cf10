/// Newton's gravitational constant, m³ kg⁻¹ s⁻².
pub const G: f64 = 6.6743e-11;

/// What happens to a body that wanders past the cull radius.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CullPolicy {
    /// Remove from the active population into [`World::retired`] and log.
    ///
    /// [`World::retired`]: crate::world::World::retired
    Retire,
    /// Remove and drop entirely.
    Discard,
}

/// Per-world tuning. All knobs the host CLI maps onto live here; `dt` is an
/// argument of [`World::step`](crate::world::World::step) instead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimConfig {
    /// Barnes–Hut opening angle. 0 disables grouping entirely (exact
    /// pairwise, slowest); larger values trade accuracy for speed.
    pub theta: f64,
    /// Softening distance: pair contributions at or inside it are skipped.
    pub epsilon: f64,
    /// Gravitational constant. Override for natural-unit scenarios (G = 1).
    pub g: f64,
    /// Leaf bucket capacity K. 1 recovers the classical one-body-per-leaf
    /// Barnes–Hut tree.
    pub max_bucket: usize,
    /// Skip the opening criterion and always descend to leaves. O(N²)
    /// reference path used to validate the approximation.
    pub brute_force: bool,
    /// A body farther than this multiple of the root half-extent from the
    /// tree's center of mass is culled during `step`.
    pub cull_threshold: f64,
    pub cull_policy: CullPolicy,
    /// Run the force pass on the rayon pool. The serial path exists for
    /// bitwise-reproducible runs.
    pub parallel: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            theta: 0.5,
            epsilon: 1e-3,
            g: G,
            max_bucket: 64,
            brute_force: false,
            cull_threshold: 3.0,
            cull_policy: CullPolicy::Retire,
            parallel: true,
        }
    }
}
