use ultraviolet::DVec2;

use crate::body::{Body, BodyKind};
use crate::vector::Coord;

/// Generates `n` bodies in a rotating disc around a massive core, suitable
/// for a galaxy-style run with G = 1.
/// - Creates a massive central body.
/// - Places the rest in random circular orbits around it.
/// - Assigns speeds from the mass enclosed by each orbit radius.
pub fn orbital_disc(n: usize, seed: u64) -> Vec<Body<DVec2>> {
    fastrand::seed(seed);
    let inner_radius = 25.0;
    let outer_radius = (n as f64).sqrt() * 5.0;

    let mut bodies = Vec::with_capacity(n);

    bodies.push(Body::new(
        0,
        "core",
        DVec2::zero(),
        DVec2::zero(),
        1e6,
        inner_radius,
        BodyKind::Blackhole,
    ));

    while bodies.len() < n {
        let angle = fastrand::f64() * std::f64::consts::TAU;
        let (sin, cos) = angle.sin_cos();

        // Random radius with uniform area distribution
        let t = inner_radius / outer_radius;
        let r = fastrand::f64() * (1.0 - t * t) + t * t;
        let position = DVec2::new(cos, sin) * outer_radius * r.sqrt();

        // Perpendicular direction; scaled to orbital speed below
        let velocity = DVec2::new(sin, -cos);
        let mass = 1.0;
        let id = bodies.len() as i64;

        bodies.push(Body::new(
            id,
            format!("star-{id}"),
            position,
            velocity,
            mass,
            mass.cbrt(),
            BodyKind::Star,
        ));
    }

    // Closest first, so the enclosed-mass sum below is a prefix sum
    bodies.sort_by(|a, b| a.position.mag_sq().total_cmp(&b.position.mag_sq()));

    let mut enclosed = 0.0;
    for body in &mut bodies {
        enclosed += body.mass;
        if body.position == DVec2::zero() {
            continue;
        }

        // Circular orbit: v = sqrt(GM / r), with G = 1
        let speed = (enclosed / body.position.mag()).sqrt();
        body.velocity = body.velocity * speed;
    }

    bodies
}

/// Generates `n` unit-mass bodies at rest, uniformly placed in the cube
/// `[-half_extent, half_extent]^D`.
pub fn uniform_cube<V: Coord>(n: usize, half_extent: f64, seed: u64) -> Vec<Body<V>> {
    fastrand::seed(seed);
    (0..n)
        .map(|i| {
            let position = V::from_fn(|_| (fastrand::f64() * 2.0 - 1.0) * half_extent);
            Body::new(
                i as i64,
                format!("grain-{i}"),
                position,
                V::zero(),
                1.0,
                0.01,
                BodyKind::Asteroid,
            )
        })
        .collect()
}
