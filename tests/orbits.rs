use glam::DVec2;
use orbit_engine::utils::{from_xy, to_xy};
use orbit_engine::{
    vec3, Body, BodyId, BodyState, CalculationType, Num, OrbitElements, PointMass, PredictorConfig,
    Projectile, Simulation, SimulationConfig, SimulationError, TrajectoryPredictor, Vec3,
    DEFAULT_G, TWO_PI,
};

const SUN_MASS: Num = 5000.0;

fn circular_speed(r: Num) -> Num {
    (DEFAULT_G * SUN_MASS / r).sqrt()
}

fn solar_system(calculation_type: CalculationType) -> (Simulation, BodyId) {
    let mut sim = Simulation::new(SimulationConfig {
        calculation_type,
        ..Default::default()
    });
    let sun = sim.add_body(Body::new(BodyState::new(Vec3::ZERO, Vec3::ZERO, SUN_MASS)).fixed());
    (sim, sun)
}

fn energy(position: Vec3, velocity: Vec3) -> Num {
    0.5 * velocity.length_squared() - DEFAULT_G * SUN_MASS / position.length()
}

#[test]
fn reference_orbit_is_circular() {
    let (mut sim, sun) = solar_system(CalculationType::Verlet);
    let probe = sim.add_body(BodyState::new(
        vec3(10.0, 0.0, 0.0),
        vec3(0.0, circular_speed(10.0), 0.0),
        1.0,
    ));
    sim.set_attractor(probe, Some(sun)).unwrap();

    let orbit = *sim.orbit_elements(probe).unwrap().unwrap();

    assert!(orbit.is_valid_orbit());
    assert!(orbit.eccentricity < 0.01);
    assert!((orbit.period - 280.99).abs() < 0.01);
    assert!((orbit.periapsis_distance - 10.0).abs() < 1e-6);
    assert!((orbit.apoapsis_distance - 10.0).abs() < 1e-6);
}

#[test]
fn runge_kutta_conserves_energy_over_one_period() {
    let (mut sim, _) = solar_system(CalculationType::RungeKutta4);
    let start = vec3(10.0, 0.0, 0.0);
    let start_velocity = vec3(0.0, circular_speed(10.0), 0.0);
    let probe = sim.add_body(BodyState::new(start, start_velocity, 1.0));

    let dt = 0.02;
    let steps = (TWO_PI * (1000.0 / (DEFAULT_G * SUN_MASS)).sqrt() / dt).round() as usize;
    for _ in 0..steps {
        sim.step(dt).unwrap();
    }

    let body = sim.body(probe).unwrap();
    let e0 = energy(start, start_velocity);
    let e1 = energy(body.position(), body.velocity());
    assert!(body.position().distance(start) < 0.1);
    assert!(((e1 - e0) / e0).abs() < 0.01);
}

#[test]
fn rails_and_integration_agree() {
    let (mut sim, sun) = solar_system(CalculationType::Verlet);
    let state = BodyState::new(vec3(0.0, 12.0, 0.0), vec3(0.18, 0.0, 0.0), 1.0);
    let rails = sim.add_body(Body::new(state).with_kepler_motion());
    let free = sim.add_body(state);
    sim.set_attractor(rails, Some(sun)).unwrap();

    for _ in 0..1000 {
        sim.step(0.02).unwrap();
    }

    let rails = sim.body(rails).unwrap();
    let free = sim.body(free).unwrap();
    assert!(rails.is_kepler_motion());
    assert!(rails.position().distance(free.position()) < 0.01);
    assert!(rails.velocity().distance(free.velocity()) < 0.001);
}

#[test]
fn body_on_top_of_attractor_stays_finite() {
    let (mut sim, sun) = solar_system(CalculationType::Euler);
    let probe = sim.add_body(BodyState::new(Vec3::ZERO, Vec3::ZERO, 1.0));
    sim.set_attractor(probe, Some(sun)).unwrap();

    for _ in 0..10 {
        sim.step(0.02).unwrap();
    }

    let body = sim.body(probe).unwrap();
    assert_eq!(body.position(), Vec3::ZERO);
    assert_eq!(body.velocity(), Vec3::ZERO);

    let orbit: OrbitElements = *sim.orbit_elements(probe).unwrap().unwrap();
    assert!(!orbit.is_valid_orbit());
    for value in [
        orbit.eccentricity,
        orbit.semi_major_axis,
        orbit.semi_minor_axis,
        orbit.focal_parameter,
        orbit.period,
        orbit.true_anomaly,
        orbit.mean_anomaly,
        orbit.eccentric_anomaly,
    ] {
        assert!(value.is_finite());
    }
    assert!(orbit.orbit_normal.is_finite());
    assert!(orbit.center_point.is_finite());
}

#[test]
fn attractors_influence_each_other_regardless_of_order() {
    let states = [
        BodyState::new(Vec3::ZERO, Vec3::ZERO, SUN_MASS),
        BodyState::new(vec3(10.0, 0.0, 0.0), vec3(0.0, 0.2, 0.0), 500.0),
        BodyState::new(vec3(-15.0, 3.0, 0.0), vec3(0.0, -0.15, 0.0), 300.0),
    ];

    let run = |order: [usize; 3]| {
        let mut sim = Simulation::default();
        let ids = order.map(|i| sim.add_body(states[i]));
        for _ in 0..200 {
            sim.step(0.05).unwrap();
        }

        let mut positions = [Vec3::ZERO; 3];
        for (slot, id) in order.iter().zip(ids) {
            positions[*slot] = sim.body(id).unwrap().position();
        }
        positions
    };

    let forward = run([0, 1, 2]);
    let backward = run([2, 1, 0]);

    for (a, b) in forward.iter().zip(&backward) {
        assert!(a.distance(*b) < 1e-9);
    }
    // The heavy body is pulled by the light ones
    assert!(forward[0].length() > 0.0);
}

#[test_case::test_case(-0.02 ; "negative")]
#[test_case::test_case(Num::NAN ; "nan")]
#[test_case::test_case(Num::INFINITY ; "infinite")]
fn invalid_timesteps_are_rejected(dt: Num) {
    let (mut sim, _) = solar_system(CalculationType::Verlet);

    assert!(matches!(sim.step(dt), Err(SimulationError::InvalidTimestep(_))));
}

#[test]
fn launch_into_a_planet_is_shorter_than_a_free_flight() {
    let config = PredictorConfig::default();
    let ball = Projectile::from(BodyState {
        radius: 0.1,
        drag: 0.1,
        ..BodyState::new(Vec3::ZERO, vec3(2.0, 0.0, 0.0), 1.0)
    });

    let planet = TrajectoryPredictor::new(config, [PointMass::new(vec3(5.0, 0.0, 0.0), SUN_MASS, 1.0)]);
    let nothing = TrajectoryPredictor::new(config, []);

    let blocked = planet.simulate_until_collision_or_length(&ball, 20.0, 10_000);
    let free = nothing.simulate_until_collision_or_length(&ball, 20.0, 10_000);

    assert!(blocked.hit);
    assert!(!free.hit);
    assert!(blocked.arclength < free.arclength);
}

#[test]
fn prediction_matches_the_simulation_for_a_single_attractor() {
    let start = vec3(10.0, 0.0, 0.0);
    let velocity = vec3(0.0, circular_speed(10.0), 0.0);

    let (mut sim, _) = solar_system(CalculationType::Euler);
    let probe = sim.add_body(BodyState::new(start, velocity, 1.0));
    for _ in 0..100 {
        sim.step(0.02).unwrap();
    }

    let predictor = TrajectoryPredictor::new(
        PredictorConfig::default(),
        [PointMass::new(Vec3::ZERO, SUN_MASS, 1.0)],
    );
    let sample = predictor.simulate_fixed_steps(&Projectile::new(start, velocity, 1.0), Vec3::ZERO, 100);

    let simulated = sim.body(probe).unwrap().position();
    assert!(sample.positions[100].distance(simulated) < 1e-9);
}

#[test]
fn planar_game_coordinates() {
    let (mut sim, _) = solar_system(CalculationType::Verlet);
    let probe = sim.add_body(BodyState::new(
        from_xy(DVec2::new(0.0, 10.0)),
        from_xy(DVec2::new(-circular_speed(10.0), 0.0)),
        1.0,
    ));

    for _ in 0..50 {
        sim.step(0.02).unwrap();
    }

    let position = to_xy(sim.body(probe).unwrap().position());
    assert!((position.length() - 10.0).abs() < 1e-3);
    assert!(position.x < 0.0);
}
