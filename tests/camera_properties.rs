use cgmath::{InnerSpace, Point3, Vector3, vec3};
use freefly_playground::cameras::{CameraOptions, Direction, FreeFlyCamera, MouseTracker};

const EPSILON: f32 = 1e-4;

fn assert_orthonormal(camera: &FreeFlyCamera) {
    let (front, right, up) = (camera.front(), camera.right(), camera.up());
    for vector in [front, right, up] {
        assert!(
            (vector.magnitude() - 1.0).abs() < EPSILON,
            "{vector:?} is not unit"
        );
    }
    assert!(front.dot(right).abs() < EPSILON);
    assert!(front.dot(up).abs() < EPSILON);
    assert!(right.dot(up).abs() < EPSILON);
}

fn assert_vec_close(left: Vector3<f32>, right: Vector3<f32>) {
    assert!(
        (left - right).magnitude() < EPSILON,
        "{left:?} differs from {right:?}"
    );
}

// Deterministic pseudo random mouse deltas, large enough to wrap yaw and saturate pitch.
fn mouse_deltas(count: usize) -> impl Iterator<Item = (f32, f32)> {
    let mut state: u32 = 0x9E37_79B9;
    std::iter::repeat_with(move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let x = (state % 2001) as f32 - 1000.0;
        let y = ((state / 2001) % 2001) as f32 - 1000.0;
        (x, y)
    })
    .take(count)
}

#[test]
fn basis_stays_orthonormal_under_mouse_movement() {
    let mut camera = FreeFlyCamera::default();
    assert_orthonormal(&camera);
    for (x, y) in mouse_deltas(500) {
        camera.process_mouse_movement(x, y);
        assert_orthonormal(&camera);
    }
}

#[test]
fn basis_stays_orthonormal_with_tilted_world_up() {
    let mut camera = FreeFlyCamera::new(CameraOptions::new(
        Point3::new(1.0, 2.0, 3.0),
        vec3(0.0, 1.0, 0.2),
    ));
    for (x, y) in mouse_deltas(50) {
        camera.process_mouse_movement(x * 0.01, y * 0.01);
        assert_orthonormal(&camera);
    }
}

#[test]
fn pitch_never_reaches_the_limit() {
    let mut camera = FreeFlyCamera::default();
    for _ in 0..100 {
        camera.process_mouse_movement(0.0, 500.0);
        assert!(camera.pitch() < FreeFlyCamera::PITCH_LIMIT);
    }
    assert!(camera.pitch() > FreeFlyCamera::PITCH_LIMIT - 0.01);
    for _ in 0..100 {
        camera.process_mouse_movement(0.0, -500.0);
        assert!(camera.pitch() > -FreeFlyCamera::PITCH_LIMIT);
    }
    assert_orthonormal(&camera);
    for (x, y) in mouse_deltas(300) {
        camera.process_mouse_movement(x, y);
        assert!(camera.pitch().abs() < FreeFlyCamera::PITCH_LIMIT);
    }
}

#[test]
fn zoom_stays_within_bounds() {
    let mut camera = FreeFlyCamera::default();
    for (step, _) in mouse_deltas(200) {
        camera.process_mouse_scroll(step / 50.0);
        assert!(camera.zoom() >= FreeFlyCamera::MIN_ZOOM);
        assert!(camera.zoom() <= FreeFlyCamera::MAX_ZOOM);
    }
}

#[test]
fn movement_scales_linearly_with_time() {
    let mut stepped = FreeFlyCamera::default();
    stepped.process_mouse_movement(120.0, 35.0);
    let mut single = stepped.clone();

    stepped.process_keyboard(Direction::Forward, 0.5);
    stepped.process_keyboard(Direction::Forward, 0.5);
    single.process_keyboard(Direction::Forward, 1.0);

    assert_vec_close(stepped.position() - single.position(), Vector3::new(0.0, 0.0, 0.0));
    let travelled = single.position() - CameraOptions::default().position;
    assert!((travelled.magnitude() - single.movement_speed()).abs() < EPSILON);
    assert_vec_close(travelled.normalize(), single.front());
}

#[test]
fn first_mouse_sample_only_seeds_the_tracker() {
    let mut camera = FreeFlyCamera::default();
    let mut tracker = MouseTracker::default();
    let first_sample: (f64, f64) = (1600.0, -900.0);
    assert!(!tracker.is_seeded());

    if let Some((x, y)) = tracker.sample(first_sample.0, first_sample.1) {
        camera.process_mouse_movement(x, y);
    }
    assert_eq!(camera.yaw(), -90.0);
    assert_eq!(camera.pitch(), 0.0);
    assert!(tracker.is_seeded());

    if let Some((x, y)) = tracker.sample(first_sample.0 + 10.0, first_sample.1 - 5.0) {
        camera.process_mouse_movement(x, y);
    }
    assert!((camera.yaw() - -89.0).abs() < EPSILON);
    assert!((camera.pitch() - 0.5).abs() < EPSILON);
}

#[test]
fn view_matrix_is_pure() {
    let mut camera = FreeFlyCamera::default();
    camera.process_mouse_movement(33.0, -12.0);
    camera.process_keyboard(Direction::Left, 0.25);
    let before = camera.clone();
    assert_eq!(camera.view_matrix(), camera.view_matrix());
    assert_eq!(camera, before);
}

#[test]
fn turning_right_updates_yaw_and_front_only() {
    let mut camera = FreeFlyCamera::new(CameraOptions::new(
        Point3::new(0.0, 0.0, 10.0),
        vec3(0.0, 1.0, 0.0),
    ));
    assert_eq!(camera.mouse_sensitivity(), 0.1);
    let view_before = camera.view_matrix();

    camera.process_mouse_movement(100.0, 0.0);

    assert!((camera.yaw() - -80.0).abs() < EPSILON);
    assert_eq!(camera.pitch(), 0.0);
    let yaw = (-80.0_f32).to_radians();
    assert_vec_close(camera.front(), vec3(yaw.cos(), 0.0, yaw.sin()));
    assert_eq!(camera.position(), Point3::new(0.0, 0.0, 10.0));
    assert_ne!(camera.view_matrix(), view_before);

    // The eye still maps to the origin of view space.
    let eye = camera.view_matrix() * camera.position().to_homogeneous();
    assert_vec_close(eye.truncate(), vec3(0.0, 0.0, 0.0));
    // One unit along front lands on the negative z axis of view space.
    let ahead = camera.view_matrix() * (camera.position() + camera.front()).to_homogeneous();
    assert_vec_close(ahead.truncate(), vec3(0.0, 0.0, -1.0));
}
