/*
MIT License

Copyright (c) 2021, 2022, 2024, 2025 Vincent Hiribarren

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Vector3, perspective, vec3};
use log::{debug, warn};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::Dimensions;

// OpenGL clip space has z in [-w, w], WebGPU expects [0, w].
static TO_WEBGPU_NDCS: LazyLock<Matrix4<f32>> = LazyLock::new(|| {
    Matrix4::from_translation(vec3(0., 0., 0.5)) * Matrix4::from_nonuniform_scale(1., 1., 0.5)
});

const DEGENERATE_CROSS: f32 = 1e-10;

/// Movement direction requested by a held key, relative to the camera basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

/// Static construction parameters of a [`FreeFlyCamera`].
///
/// Angles and zoom are in degrees, `movement_speed` in world units per second
/// and `mouse_sensitivity` in degrees per pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraOptions {
    pub position: Point3<f32>,
    /// Must be non-zero. It is normalized on construction.
    pub world_up: Vector3<f32>,
    pub yaw: f32,
    pub pitch: f32,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    pub zoom: f32,
}

impl CameraOptions {
    #[must_use]
    pub fn new(position: Point3<f32>, world_up: Vector3<f32>) -> Self {
        Self {
            position,
            world_up,
            ..Self::default()
        }
    }
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 10.0),
            world_up: Vector3::unit_y(),
            yaw: -90.0,
            pitch: 0.0,
            movement_speed: 2.5,
            mouse_sensitivity: 0.1,
            zoom: 45.0,
        }
    }
}

/// First-person camera flying freely along its own basis.
///
/// `front`, `right` and `up` are never set directly: they are recomputed from
/// `yaw`, `pitch` and the world up reference each time the orientation changes,
/// so they stay an orthonormal triad.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeFlyCamera {
    position: Point3<f32>,
    front: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
    world_up: Vector3<f32>,
    yaw: f32,
    pitch: f32,
    zoom: f32,
    movement_speed: f32,
    mouse_sensitivity: f32,
}

impl Default for FreeFlyCamera {
    fn default() -> Self {
        Self::new(CameraOptions::default())
    }
}

impl FreeFlyCamera {
    /// Canonical pitch bound in degrees. The stored pitch stays strictly inside.
    pub const PITCH_LIMIT: f32 = 89.0;
    const PITCH_MARGIN: f32 = 1e-3;
    pub const MIN_ZOOM: f32 = 1.0;
    pub const MAX_ZOOM: f32 = 45.0;

    #[must_use]
    pub fn new(options: CameraOptions) -> Self {
        debug_assert!(
            options.world_up.magnitude2() > 0.0,
            "world_up should be non-zero"
        );
        let mut camera = Self {
            position: options.position,
            front: -Vector3::unit_z(),
            right: Vector3::unit_x(),
            up: Vector3::unit_y(),
            world_up: options.world_up.normalize(),
            yaw: options.yaw,
            pitch: Self::clamp_pitch(options.pitch),
            zoom: Self::clamp_zoom(options.zoom),
            movement_speed: options.movement_speed,
            mouse_sensitivity: options.mouse_sensitivity,
        };
        camera.update_basis();
        camera
    }

    fn clamp_pitch(pitch: f32) -> f32 {
        let bound = Self::PITCH_LIMIT - Self::PITCH_MARGIN;
        pitch.clamp(-bound, bound)
    }

    fn clamp_zoom(zoom: f32) -> f32 {
        zoom.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM)
    }

    fn update_basis(&mut self) {
        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.to_radians();
        self.front = vec3(
            pitch.cos() * yaw.cos(),
            pitch.sin(),
            pitch.cos() * yaw.sin(),
        )
        .normalize();
        let right = self.front.cross(self.world_up);
        self.right = if right.magnitude2() > DEGENERATE_CROSS {
            right.normalize()
        } else {
            // Looking along world_up: keep the previous right, made orthogonal to front.
            let previous = self.right - self.front * self.right.dot(self.front);
            if previous.magnitude2() > DEGENERATE_CROSS {
                previous.normalize()
            } else {
                self.front.cross(Vector3::unit_y() + Vector3::unit_z()).normalize()
            }
        };
        self.up = self.right.cross(self.front).normalize();
    }

    pub fn process_keyboard(&mut self, direction: Direction, delta_time: f32) {
        let velocity = self.movement_speed * delta_time;
        let axis = match direction {
            Direction::Forward => self.front,
            Direction::Backward => -self.front,
            Direction::Left => -self.right,
            Direction::Right => self.right,
        };
        self.position += axis * velocity;
    }

    /// Offsets are in pixels, with `y_offset` positive when the pointer goes up.
    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32) {
        self.yaw += x_offset * self.mouse_sensitivity;
        self.pitch = Self::clamp_pitch(self.pitch + y_offset * self.mouse_sensitivity);
        self.update_basis();
    }

    pub fn process_mouse_scroll(&mut self, y_offset: f32) {
        self.zoom = Self::clamp_zoom(self.zoom - y_offset);
    }

    #[must_use]
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    #[must_use]
    pub fn position(&self) -> Point3<f32> {
        self.position
    }
    #[must_use]
    pub fn front(&self) -> Vector3<f32> {
        self.front
    }
    #[must_use]
    pub fn right(&self) -> Vector3<f32> {
        self.right
    }
    #[must_use]
    pub fn up(&self) -> Vector3<f32> {
        self.up
    }
    #[must_use]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }
    #[must_use]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }
    #[must_use]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }
    #[must_use]
    pub fn movement_speed(&self) -> f32 {
        self.movement_speed
    }
    #[must_use]
    pub fn mouse_sensitivity(&self) -> f32 {
        self.mouse_sensitivity
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveProjection {
    /// Vertical field of view, in degrees.
    pub fovy: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveProjection {
    fn default() -> Self {
        Self {
            fovy: FreeFlyCamera::MAX_ZOOM,
            aspect: 4. / 3.,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl PerspectiveProjection {
    #[must_use]
    pub fn calc_projection(&self) -> Matrix4<f32> {
        (*TO_WEBGPU_NDCS) * perspective(Deg(self.fovy), self.aspect, self.near, self.far)
    }
    pub fn resize_screen(&mut self, dimensions: &Dimensions) {
        self.aspect = dimensions.surface_ratio();
    }
}

/// Turns successive absolute pointer positions into offsets.
///
/// The first sample after creation or [`MouseTracker::reset`] only seeds the
/// last known position and yields nothing, so the view does not jump from an
/// arbitrary initial cursor location.
#[derive(Debug, Clone, Copy, Default)]
pub struct MouseTracker {
    last: Option<(f64, f64)>,
}

impl MouseTracker {
    /// Returns `(x_offset, y_offset)` with `y` reversed, so up is positive.
    #[allow(clippy::cast_possible_truncation)]
    pub fn sample(&mut self, x: f64, y: f64) -> Option<(f32, f32)> {
        self.last
            .replace((x, y))
            .map(|(last_x, last_y)| ((x - last_x) as f32, (last_y - y) as f32))
    }
    pub fn reset(&mut self) {
        self.last = None;
    }
    #[must_use]
    pub fn is_seeded(&self) -> bool {
        self.last.is_some()
    }
}

/// Routes winit input to a [`FreeFlyCamera`] and owns its projection.
pub struct InteractiveCamera {
    pub controlled_camera: FreeFlyCamera,
    projection: PerspectiveProjection,
    enabled_keys: BTreeSet<KeyCode>,
    mouse_tracker: MouseTracker,
    virtual_cursor: (f64, f64),
}

impl InteractiveCamera {
    const PIXELS_PER_SCROLL_LINE: f64 = 20.0;

    #[must_use]
    pub fn new(camera: FreeFlyCamera, projection: PerspectiveProjection) -> Self {
        Self {
            controlled_camera: camera,
            projection,
            enabled_keys: BTreeSet::new(),
            mouse_tracker: MouseTracker::default(),
            virtual_cursor: (0.0, 0.0),
        }
    }

    #[must_use]
    pub fn camera(&self) -> &FreeFlyCamera {
        &self.controlled_camera
    }

    #[must_use]
    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.controlled_camera.view_matrix()
    }

    /// Perspective built from the current camera zoom.
    #[must_use]
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        PerspectiveProjection {
            fovy: self.controlled_camera.zoom(),
            ..self.projection
        }
        .calc_projection()
    }

    pub fn update_screen_size(&mut self, dimensions: &Dimensions) {
        self.projection.resize_screen(dimensions);
    }

    pub fn mouse_event_listener(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.mouse_moved(delta.0, delta.1);
        }
    }

    /// Raw motion deltas, y pointing down as reported by the platform.
    pub fn mouse_moved(&mut self, delta_x: f64, delta_y: f64) {
        self.virtual_cursor.0 += delta_x;
        self.virtual_cursor.1 += delta_y;
        let (x, y) = self.virtual_cursor;
        if let Some((x_offset, y_offset)) = self.mouse_tracker.sample(x, y) {
            self.controlled_camera
                .process_mouse_movement(x_offset, y_offset);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn scroll_event_listener(&mut self, delta: &MouseScrollDelta) {
        let y_offset = match delta {
            MouseScrollDelta::LineDelta(_, y) => *y,
            MouseScrollDelta::PixelDelta(position) => {
                (position.y / Self::PIXELS_PER_SCROLL_LINE) as f32
            }
        };
        self.controlled_camera.process_mouse_scroll(y_offset);
    }

    pub fn keyboard_event_listener(&mut self, input: &KeyEvent) {
        let PhysicalKey::Code(key_code) = input.physical_key else {
            warn!("Strange key pushed");
            return;
        };
        self.set_key_state(key_code, input.state == ElementState::Pressed);
    }

    pub fn set_key_state(&mut self, key_code: KeyCode, pressed: bool) {
        if pressed {
            self.enabled_keys.insert(key_code);
        } else {
            self.enabled_keys.remove(&key_code);
        }
    }

    /// Drops held keys and re-arms first-sample suppression, e.g. on focus loss.
    pub fn deactivate(&mut self) {
        debug!("Camera input deactivated");
        self.enabled_keys.clear();
        self.mouse_tracker.reset();
    }

    /// Applies one movement step per held direction, scaled by the frame delta.
    pub fn update_control(&mut self, delta_time: f32) {
        let directions: BTreeSet<Direction> = self
            .enabled_keys
            .iter()
            .filter_map(|key| key_direction(*key))
            .collect();
        for direction in directions {
            self.controlled_camera.process_keyboard(direction, delta_time);
        }
    }
}

fn key_direction(key: KeyCode) -> Option<Direction> {
    match key {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(Direction::Forward),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(Direction::Backward),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(Direction::Left),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(Direction::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::EuclideanSpace;
    use winit::dpi::PhysicalPosition;

    const EPSILON: f32 = 1e-5;

    fn assert_close(left: f32, right: f32) {
        assert!(
            (left - right).abs() < EPSILON,
            "{left} is not close to {right}"
        );
    }

    #[test]
    fn default_camera_looks_down_negative_z() {
        let camera = FreeFlyCamera::default();
        assert_close(camera.front().x, 0.0);
        assert_close(camera.front().y, 0.0);
        assert_close(camera.front().z, -1.0);
        assert_close(camera.right().x, 1.0);
        assert_close(camera.up().y, 1.0);
    }

    #[test]
    fn initial_pitch_and_zoom_are_clamped() {
        let camera = FreeFlyCamera::new(CameraOptions {
            pitch: 120.0,
            zoom: 90.0,
            ..CameraOptions::default()
        });
        assert!(camera.pitch() < FreeFlyCamera::PITCH_LIMIT);
        assert_close(camera.zoom(), FreeFlyCamera::MAX_ZOOM);
    }

    #[test]
    fn world_up_is_normalized() {
        let camera = FreeFlyCamera::new(CameraOptions::new(
            Point3::origin(),
            vec3(0.0, 3.0, 0.0),
        ));
        assert_close(camera.up().magnitude(), 1.0);
        assert_close(camera.right().magnitude(), 1.0);
    }

    fn assert_orthonormal(camera: &FreeFlyCamera) {
        for vector in [camera.front(), camera.right(), camera.up()] {
            assert_close(vector.magnitude(), 1.0);
        }
        assert_close(camera.front().dot(camera.right()), 0.0);
        assert_close(camera.front().dot(camera.up()), 0.0);
        assert_close(camera.right().dot(camera.up()), 0.0);
    }

    #[test]
    fn world_up_along_front_keeps_basis_orthonormal() {
        let mut camera = FreeFlyCamera::new(CameraOptions::new(
            Point3::origin(),
            vec3(0.0, 0.0, -1.0),
        ));
        assert_orthonormal(&camera);
        camera.process_mouse_movement(0.0, 0.0);
        assert_orthonormal(&camera);
        let mut camera = FreeFlyCamera::new(CameraOptions {
            yaw: 0.0,
            ..CameraOptions::new(Point3::origin(), Vector3::unit_x())
        });
        assert_orthonormal(&camera);
        camera.process_mouse_movement(25.0, 40.0);
        assert_orthonormal(&camera);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "world_up should be non-zero")]
    fn zero_world_up_is_rejected() {
        let _ = FreeFlyCamera::new(CameraOptions::new(
            Point3::origin(),
            vec3(0.0, 0.0, 0.0),
        ));
    }

    #[test]
    fn sideways_movement_follows_right_vector() {
        let mut camera = FreeFlyCamera::default();
        camera.process_keyboard(Direction::Right, 1.0);
        assert_close(camera.position().x, 2.5);
        camera.process_keyboard(Direction::Left, 2.0);
        assert_close(camera.position().x, -2.5);
        assert_close(camera.position().z, 10.0);
    }

    #[test]
    fn backward_undoes_forward() {
        let mut camera = FreeFlyCamera::default();
        camera.process_mouse_movement(37.0, 12.0);
        let start = camera.position();
        camera.process_keyboard(Direction::Forward, 0.3);
        camera.process_keyboard(Direction::Backward, 0.3);
        assert!((camera.position() - start).magnitude() < EPSILON);
    }

    #[test]
    fn zero_delta_time_does_not_move() {
        let mut camera = FreeFlyCamera::default();
        camera.process_keyboard(Direction::Forward, 0.0);
        assert_eq!(camera.position(), CameraOptions::default().position);
    }

    #[test]
    fn scroll_zooms_in_and_out_within_bounds() {
        let mut camera = FreeFlyCamera::default();
        camera.process_mouse_scroll(4.0);
        assert_close(camera.zoom(), 41.0);
        camera.process_mouse_scroll(100.0);
        assert_close(camera.zoom(), FreeFlyCamera::MIN_ZOOM);
        camera.process_mouse_scroll(-100.0);
        assert_close(camera.zoom(), FreeFlyCamera::MAX_ZOOM);
    }

    #[test]
    fn tracker_suppresses_first_sample() {
        let mut tracker = MouseTracker::default();
        assert!(!tracker.is_seeded());
        assert_eq!(tracker.sample(400.0, 300.0), None);
        assert!(tracker.is_seeded());
        assert_eq!(tracker.sample(410.0, 280.0), Some((10.0, 20.0)));
    }

    #[test]
    fn tracker_reset_rearms_suppression() {
        let mut tracker = MouseTracker::default();
        let _ = tracker.sample(0.0, 0.0);
        tracker.reset();
        assert_eq!(tracker.sample(900.0, 900.0), None);
        assert_eq!(tracker.sample(900.0, 901.0), Some((0.0, -1.0)));
    }

    #[test]
    fn first_raw_motion_is_ignored() {
        let mut interactive =
            InteractiveCamera::new(FreeFlyCamera::default(), PerspectiveProjection::default());
        interactive.mouse_moved(500.0, -250.0);
        assert_close(interactive.camera().yaw(), -90.0);
        assert_close(interactive.camera().pitch(), 0.0);
        interactive.mouse_moved(10.0, -10.0);
        assert_close(interactive.camera().yaw(), -89.0);
        assert_close(interactive.camera().pitch(), 1.0);
    }

    #[test]
    fn deactivate_releases_keys_and_reseeds_mouse() {
        let mut interactive =
            InteractiveCamera::new(FreeFlyCamera::default(), PerspectiveProjection::default());
        interactive.mouse_moved(1.0, 1.0);
        interactive.set_key_state(KeyCode::KeyW, true);
        interactive.deactivate();
        interactive.update_control(1.0);
        assert_eq!(
            interactive.camera().position(),
            CameraOptions::default().position
        );
        interactive.mouse_moved(50.0, 0.0);
        assert_close(interactive.camera().yaw(), -90.0);
    }

    #[test]
    fn held_keys_move_until_released() {
        let mut interactive =
            InteractiveCamera::new(FreeFlyCamera::default(), PerspectiveProjection::default());
        interactive.set_key_state(KeyCode::KeyW, true);
        interactive.update_control(0.4);
        assert_close(interactive.camera().position().z, 9.0);
        interactive.set_key_state(KeyCode::KeyW, false);
        interactive.update_control(0.4);
        assert_close(interactive.camera().position().z, 9.0);
    }

    #[test]
    fn aliased_keys_do_not_double_speed() {
        let mut interactive =
            InteractiveCamera::new(FreeFlyCamera::default(), PerspectiveProjection::default());
        interactive.set_key_state(KeyCode::KeyW, true);
        interactive.set_key_state(KeyCode::ArrowUp, true);
        interactive.update_control(1.0);
        assert_close(interactive.camera().position().z, 7.5);
    }

    #[test]
    fn opposite_keys_cancel_out() {
        let mut interactive =
            InteractiveCamera::new(FreeFlyCamera::default(), PerspectiveProjection::default());
        interactive.set_key_state(KeyCode::KeyA, true);
        interactive.set_key_state(KeyCode::KeyD, true);
        interactive.set_key_state(KeyCode::Space, true);
        interactive.update_control(1.0);
        let moved = interactive.camera().position() - CameraOptions::default().position;
        assert!(moved.magnitude() < EPSILON);
    }

    #[test]
    fn pixel_scroll_is_converted_to_lines() {
        let mut interactive =
            InteractiveCamera::new(FreeFlyCamera::default(), PerspectiveProjection::default());
        interactive.scroll_event_listener(&MouseScrollDelta::PixelDelta(PhysicalPosition::new(
            0.0, 40.0,
        )));
        assert_close(interactive.camera().zoom(), 43.0);
        interactive.scroll_event_listener(&MouseScrollDelta::LineDelta(0.0, 3.0));
        assert_close(interactive.camera().zoom(), 40.0);
    }

    #[test]
    fn projection_tracks_zoom_and_aspect() {
        let mut interactive =
            InteractiveCamera::new(FreeFlyCamera::default(), PerspectiveProjection::default());
        let wide = interactive.projection_matrix();
        interactive.scroll_event_listener(&MouseScrollDelta::LineDelta(0.0, 20.0));
        let narrow = interactive.projection_matrix();
        assert!(narrow.y.y > wide.y.y);
        interactive.update_screen_size(&Dimensions {
            width: 1600,
            height: 800,
        });
        let resized = interactive.projection_matrix();
        assert_close(resized.y.y / resized.x.x, 2.0);
    }

    #[test]
    fn projection_maps_near_plane_to_zero_depth() {
        let projection = PerspectiveProjection::default();
        let clip = projection.calc_projection() * cgmath::vec4(0.0, 0.0, -projection.near, 1.0);
        assert_close(clip.z / clip.w, 0.0);
        let clip = projection.calc_projection() * cgmath::vec4(0.0, 0.0, -projection.far, 1.0);
        assert!((clip.z / clip.w - 1.0).abs() < 1e-3);
    }
}
