use std::f64::consts::{PI, TAU};

use gravitree::{
    utils, Body, BodyKind, CullPolicy, DVec2, DVec3, Region, SimConfig, World2, World3,
};

fn leaf_buckets(region: &Region<DVec3>, out: &mut Vec<Vec<i64>>) {
    if let Some(children) = region.children.as_ref() {
        for child in children.iter() {
            leaf_buckets(child, out);
        }
    } else if !region.bucket.is_empty() {
        out.push(region.bucket.iter().map(|resident| resident.id).collect());
    }
}

fn deepest_bucket(region: &Region<DVec3>) -> usize {
    let own = region.bucket.len();
    region
        .children
        .as_ref()
        .map(|children| {
            children
                .iter()
                .map(deepest_bucket)
                .max()
                .unwrap_or(0)
                .max(own)
        })
        .unwrap_or(own)
}

/// S1: an Earth-Moon pair completes one revolution and closes its orbit.
/// The pair's barycenter drifts with the Moon's initial momentum, so both
/// the period and the return are measured in the Earth-relative frame.
#[test]
fn earth_moon_orbit_returns_after_one_period() {
    let earth = Body::new(
        0,
        "Earth",
        DVec3::zero(),
        DVec3::zero(),
        5.972e24,
        6.371e6,
        BodyKind::Planet,
    );
    let moon = Body::new(
        1,
        "Moon",
        DVec3::new(3.84e8, 0.0, 0.0),
        DVec3::new(0.0, 1022.0, 0.0),
        7.342e22,
        1.7371e6,
        BodyKind::Default,
    );

    let config = SimConfig {
        theta: 0.0,
        ..SimConfig::default()
    };
    let mut world = World3::with_bodies(vec![earth, moon], config);

    let rel0 = world.bodies[1].position - world.bodies[0].position;
    let mut prev_angle = rel0.y.atan2(rel0.x);
    let mut swept = 0.0;
    let mut closure = None;

    for _ in 0..45_000 {
        world.step(60.0);
        let rel = world.bodies[1].position - world.bodies[0].position;

        let separation = rel.mag();
        assert!(
            separation > 3.7e8 && separation < 3.9e8,
            "orbit should stay nearly circular, separation {separation}"
        );

        let angle = rel.y.atan2(rel.x);
        let mut delta = angle - prev_angle;
        if delta > PI {
            delta -= TAU;
        } else if delta < -PI {
            delta += TAU;
        }
        swept += delta;
        prev_angle = angle;

        if swept.abs() >= TAU {
            closure = Some((world.time, rel));
            break;
        }
    }

    let (period, rel) = closure.expect("moon never completed an orbit");
    // One sidereal-month-scale revolution (~2.36e6 s for the real pair).
    assert!(
        period > 2.28e6 && period < 2.39e6,
        "implausible orbital period {period}"
    );
    assert!(
        (rel - rel0).mag() < 1e6,
        "orbit failed to close, miss distance {}",
        (rel - rel0).mag()
    );
}

/// S2: the figure-eight three-body choreography keeps its center of mass
/// pinned to the origin.
#[test]
fn figure_eight_center_of_mass_stays_at_origin() {
    let bodies = vec![
        Body::new(
            0,
            "alpha",
            DVec2::new(-0.97000436, 0.24308753),
            DVec2::new(0.466203685, 0.43236573),
            1.0,
            0.01,
            BodyKind::Star,
        ),
        Body::new(
            1,
            "beta",
            DVec2::new(0.97000436, -0.24308753),
            DVec2::new(0.466203685, 0.43236573),
            1.0,
            0.01,
            BodyKind::Star,
        ),
        Body::new(
            2,
            "gamma",
            DVec2::zero(),
            DVec2::new(-0.93240737, -0.86473146),
            1.0,
            0.01,
            BodyKind::Star,
        ),
    ];

    let config = SimConfig {
        g: 1.0,
        theta: 0.0,
        epsilon: 1e-6,
        ..SimConfig::default()
    };
    let mut world = World2::with_bodies(bodies, config);

    for _ in 0..10_000 {
        world.step(1e-3);
        let drift = world.root.center_of_mass.mag();
        assert!(drift < 1e-10, "center of mass drifted by {drift}");
    }
    assert_eq!(world.bodies.len(), 3);
}

/// Invariant 6: an isolated pair under the brute-force reference path
/// conserves linear momentum to roundoff.
#[test]
fn isolated_pair_conserves_momentum() {
    let bodies = vec![
        Body::new(0, "primary", DVec2::zero(), DVec2::zero(), 1.0, 0.01, BodyKind::Star),
        Body::new(
            1,
            "satellite",
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            1e-3,
            0.01,
            BodyKind::Planet,
        ),
    ];

    let config = SimConfig {
        g: 1.0,
        theta: 0.0,
        epsilon: 1e-6,
        brute_force: true,
        ..SimConfig::default()
    };
    let mut world = World2::with_bodies(bodies, config);

    let momentum = |world: &World2| {
        world
            .bodies
            .iter()
            .fold(DVec2::zero(), |acc, body| acc + body.velocity * body.mass)
    };
    let initial = momentum(&world);

    for _ in 0..10_000 {
        world.step(1e-3);
    }

    let drift = (momentum(&world) - initial).mag();
    assert!(
        drift < 1e-6 * initial.mag(),
        "momentum drifted by {drift}"
    );
}

/// S4: a body escaping the root cube forces the next rebuild to grow.
#[test]
fn domain_grows_when_a_body_escapes() {
    let runaway = Body::new(
        0,
        "runaway",
        DVec2::new(0.9, 0.0),
        DVec2::new(10.0, 0.0),
        1.0,
        0.01,
        BodyKind::Comet,
    );
    let mut world = World2::with_bodies(vec![runaway], SimConfig::default());

    let initial_half = world.root.bounds.half;
    assert_eq!(initial_half, 1.8); // 2 * R_max

    let mut grew = false;
    for _ in 0..5 {
        let half_before = world.root.bounds.half;
        world.step(0.1);
        let position = world.bodies[0].position;
        assert!(world.root.bounds.contains(position));

        if !grew && world.root.bounds.half > half_before {
            grew = true;
            assert!(
                world.root.bounds.half >= 2.0 * position.mag(),
                "grown root too small: {} for |p| = {}",
                world.root.bounds.half,
                position.mag()
            );
        }
    }
    assert!(grew, "root never grew although the body left it");
    assert_eq!(world.bodies.len(), 1, "runaway body was wrongly culled");
}

/// S5: a pair inside the softening distance exchanges no force and
/// produces no NaN anywhere.
#[test]
fn softening_guard_suppresses_singular_pairs() {
    let bodies = vec![
        Body::new(0, "near", DVec3::zero(), DVec3::zero(), 1.0, 0.01, BodyKind::Star),
        Body::new(
            1,
            "nearer",
            DVec3::new(5e-4, 0.0, 0.0),
            DVec3::zero(),
            1.0,
            0.01,
            BodyKind::Star,
        ),
    ];
    let mut world = World3::with_bodies(bodies, SimConfig::default());

    world.step(0.1);

    for body in &world.bodies {
        assert_eq!(body.force, DVec3::zero());
        assert_eq!(body.velocity, DVec3::zero());
        assert!(body.position.x.is_finite());
        assert!(body.position.y.is_finite());
        assert!(body.position.z.is_finite());
    }
    assert_eq!(world.bodies.len(), 2);
}

/// S6: a rogue far outside the domain is culled on the next step and its
/// mass disappears from the aggregates.
#[test]
fn rogue_body_is_culled_and_retired() {
    let mut world = World3::with_bodies(cluster(), SimConfig::default());
    let half = world.root.bounds.half;

    world.insert_body(Body::new(
        99,
        "rogue",
        DVec3::new(10.0 * half, 0.0, 0.0),
        DVec3::zero(),
        5.0,
        0.01,
        BodyKind::Comet,
    ));

    world.step(1e-3);

    assert_eq!(world.bodies.len(), 3);
    assert!(world.bodies.iter().all(|body| body.id != 99));
    assert_eq!(world.retired.len(), 1);
    assert_eq!(world.retired[0].id, 99);
    assert_eq!(world.root.descendants, 3);
    assert!((world.root.total_mass - 3.0).abs() < 1e-12);
}

#[test]
fn discard_policy_drops_culled_bodies_entirely() {
    let config = SimConfig {
        cull_policy: CullPolicy::Discard,
        ..SimConfig::default()
    };
    let mut world = World3::with_bodies(cluster(), config);
    let half = world.root.bounds.half;

    world.insert_body(Body::new(
        99,
        "rogue",
        DVec3::new(0.0, 10.0 * half, 0.0),
        DVec3::zero(),
        5.0,
        0.01,
        BodyKind::Comet,
    ));

    world.step(1e-3);

    assert_eq!(world.bodies.len(), 3);
    assert!(world.retired.is_empty());
}

fn cluster() -> Vec<Body<DVec3>> {
    vec![
        Body::new(0, "a", DVec3::new(0.5, 0.0, 0.0), DVec3::zero(), 1.0, 0.01, BodyKind::Star),
        Body::new(1, "b", DVec3::new(-0.5, 0.3, 0.0), DVec3::zero(), 1.0, 0.01, BodyKind::Star),
        Body::new(2, "c", DVec3::new(0.0, -0.4, 0.2), DVec3::zero(), 1.0, 0.01, BodyKind::Star),
    ]
}

/// Invariants 1 and 2 hold across steps: list mass matches the root
/// aggregate and the descendant count matches the live population.
#[test]
fn aggregates_track_the_population() {
    let config = SimConfig {
        g: 1e-4,
        ..SimConfig::default()
    };
    let mut world = World3::with_bodies(utils::uniform_cube(200, 1.0, 2), config);

    for _ in 0..5 {
        world.step(1e-3);

        let total: f64 = world.bodies.iter().map(|body| body.mass).sum();
        assert_eq!(world.root.descendants, world.bodies.len());
        assert!(
            (world.root.total_mass - total).abs() <= 1e-9 * total,
            "aggregate mass {} drifted from population mass {}",
            world.root.total_mass,
            total
        );
    }
}

/// S3: a 1000-body uniform cube with K = 16 steps once without any bucket
/// overflowing and without losing a body.
#[test]
fn uniform_cube_respects_bucket_capacity() {
    let config = SimConfig {
        g: 1.0,
        theta: 0.5,
        max_bucket: 16,
        ..SimConfig::default()
    };
    let mut world = World3::with_bodies(utils::uniform_cube(1000, 1.0, 4), config);

    world.step(0.01);

    assert_eq!(world.root.descendants, 1000);
    assert!(deepest_bucket(&world.root) <= 16);
}

/// Invariant 7: a zero-dt step leaves the tree with the same leaf
/// membership as an explicit rebuild from the same list.
#[test]
fn zero_step_matches_explicit_rebuild() {
    let config = SimConfig {
        g: 1.0,
        ..SimConfig::default()
    };
    let mut stepped = World3::with_bodies(utils::uniform_cube(300, 1.0, 6), config);
    let mut rebuilt = World3::with_bodies(utils::uniform_cube(300, 1.0, 6), config);

    stepped.step(0.0);
    rebuilt.rebuild();

    let mut stepped_leaves = Vec::new();
    let mut rebuilt_leaves = Vec::new();
    leaf_buckets(&stepped.root, &mut stepped_leaves);
    leaf_buckets(&rebuilt.root, &mut rebuilt_leaves);
    assert_eq!(stepped_leaves, rebuilt_leaves);
}

/// Invariant 8: identical input and configuration reproduce positions
/// bitwise, and the parallel pass agrees with the serial one.
#[test]
fn runs_are_bitwise_reproducible() {
    let serial = SimConfig {
        g: 1e-3,
        parallel: false,
        ..SimConfig::default()
    };
    let parallel = SimConfig {
        parallel: true,
        ..serial
    };

    let mut first = World3::with_bodies(utils::uniform_cube(64, 1.0, 3), serial);
    let mut second = World3::with_bodies(utils::uniform_cube(64, 1.0, 3), serial);
    let mut third = World3::with_bodies(utils::uniform_cube(64, 1.0, 3), parallel);

    for _ in 0..50 {
        first.step(1e-3);
        second.step(1e-3);
        third.step(1e-3);
    }

    for ((a, b), c) in first.bodies.iter().zip(&second.bodies).zip(&third.bodies) {
        assert_eq!(a.position, b.position);
        assert_eq!(a.velocity, b.velocity);
        assert_eq!(a.position, c.position);
        assert_eq!(a.velocity, c.velocity);
    }
}

#[test]
fn lone_body_drifts_inertially() {
    let body = Body::new(
        0,
        "drifter",
        DVec2::new(0.1, 0.2),
        DVec2::new(0.5, -0.25),
        1.0,
        0.01,
        BodyKind::Default,
    );
    let mut world = World2::with_bodies(vec![body], SimConfig::default());

    world.step(0.5);

    let body = &world.bodies[0];
    assert_eq!(body.force, DVec2::zero());
    assert_eq!(body.velocity, DVec2::new(0.5, -0.25));
    assert_eq!(body.position, DVec2::new(0.1 + 0.25, 0.2 - 0.125));
}
