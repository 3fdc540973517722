use super::Camera;
use crate::config::OrbitConfig;
use nalgebra_glm::Vec3;
use std::f32::consts::PI;

const ZOOM_BASE: f32 = 0.95;
const EPSILON: f32 = 1e-6;

/// What a pointer drag currently does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrbitAction {
    #[default]
    None,
    Rotate,
    Pan,
}

/// Orbits a camera around a target using spherical coordinates.
///
/// Input accumulates into pending deltas; [`OrbitControls::update`] applies
/// them to the camera once per frame. With damping enabled only a fraction
/// of the pending delta is applied each frame and the rest decays, so the
/// camera glides to a stop.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub screen_space_panning: bool,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,

    action: OrbitAction,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vec3,
}

impl OrbitControls {
    pub fn new(config: &OrbitConfig) -> Self {
        Self {
            target: Vec3::zeros(),
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor,
            screen_space_panning: config.screen_space_panning,
            min_polar_angle: config.min_polar_angle,
            max_polar_angle: config.max_polar_angle,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            action: OrbitAction::None,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vec3::zeros(),
        }
    }

    pub fn action(&self) -> OrbitAction {
        self.action
    }

    pub fn begin(&mut self, action: OrbitAction) {
        self.action = action;
    }

    pub fn end(&mut self) {
        self.action = OrbitAction::None;
    }

    /// Feeds a pointer movement in pixels to whatever drag is active.
    pub fn pointer_moved(&mut self, dx: f32, dy: f32, viewport_height: f32, camera: &Camera) {
        match self.action {
            OrbitAction::None => {}
            OrbitAction::Rotate => self.rotate(dx, dy, viewport_height),
            OrbitAction::Pan => self.pan(dx, dy, viewport_height, camera),
        }
    }

    /// A full viewport height of movement turns a full circle.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        self.delta_theta -= 2.0 * PI * dx / viewport_height * self.rotate_speed;
        self.delta_phi -= 2.0 * PI * dy / viewport_height * self.rotate_speed;
    }

    /// Moves the target so the point under the cursor follows it. Without
    /// screen space panning vertical movement slides along the ground plane.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32, camera: &Camera) {
        let offset = camera.position() - self.target;
        let target_distance =
            nalgebra_glm::length(&offset) * f32::to_radians(camera.fov() / 2.0).tan();

        let right = camera.right();
        let left = right * (-2.0 * dx * target_distance / viewport_height * self.pan_speed);

        let up = if self.screen_space_panning {
            nalgebra_glm::cross(&right, &nalgebra_glm::normalize(&-offset))
        } else {
            nalgebra_glm::cross(&camera.up(), &right)
        };
        let up = up * (2.0 * dy * target_distance / viewport_height * self.pan_speed);

        self.pan_offset += left + up;
    }

    /// Positive `delta` (wheel towards the user) moves away from the target.
    pub fn dolly(&mut self, delta: f32) {
        let zoom_scale = ZOOM_BASE.powf(self.zoom_speed);
        if delta < 0.0 {
            self.scale *= zoom_scale;
        } else if delta > 0.0 {
            self.scale /= zoom_scale;
        }
    }

    /// Applies pending input to the camera. Returns whether it moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let offset = camera.position() - self.target;
        let radius = nalgebra_glm::length(&offset);
        let (mut theta, mut phi) = if radius == 0.0 {
            (0.0, 0.0)
        } else {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        };

        if self.enable_damping {
            theta += self.delta_theta * self.damping_factor;
            phi += self.delta_phi * self.damping_factor;
        } else {
            theta += self.delta_theta;
            phi += self.delta_phi;
        }

        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPSILON, PI - EPSILON);
        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        if self.enable_damping {
            self.target += self.pan_offset * self.damping_factor;
        } else {
            self.target += self.pan_offset;
        }

        let offset = Vec3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        let previous = camera.position();
        camera.set_look_at(self.target + offset, self.target);

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.delta_theta *= decay;
            self.delta_phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::zeros();
        }
        let zoomed = self.scale != 1.0;
        self.scale = 1.0;

        zoomed || nalgebra_glm::distance2(&previous, &camera.position()) > EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn setup() -> (Camera, OrbitControls) {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 15.0), Vec3::zeros(), 75.0, 800.0, 800.0, 0.1, 1000.0);
        (camera, OrbitControls::new(&OrbitConfig::default()))
    }

    fn polar(camera: &Camera) -> f32 {
        let offset = camera.position();
        (offset.y / nalgebra_glm::length(&offset)).acos()
    }

    #[test]
    fn idle_updates_keep_camera_still() {
        let (mut camera, mut controls) = setup();
        for _ in 0..100 {
            controls.update(&mut camera);
        }
        assert!(nalgebra_glm::distance(&camera.position(), &Vec3::new(0.0, 0.0, 15.0)) < 1e-4);
    }

    #[test]
    fn damped_rotation_converges() {
        let (mut camera, mut controls) = setup();
        controls.rotate(200.0, 0.0, 800.0);

        controls.update(&mut camera);
        let first = camera.position();
        for _ in 0..200 {
            controls.update(&mut camera);
        }
        let settled = camera.position();
        assert!(!controls.update(&mut camera));

        // Only a quarter of the turn lands on the first frame.
        let total = (-settled.x).atan2(settled.z).abs();
        let partial = (-first.x).atan2(first.z).abs();
        assert!((total - FRAC_PI_2).abs() < 1e-3, "total {total}");
        assert!((partial - FRAC_PI_2 * 0.25).abs() < 1e-3, "partial {partial}");
        assert!((nalgebra_glm::length(&settled) - 15.0).abs() < 1e-3);
    }

    #[test]
    fn polar_angle_never_passes_horizon() {
        let (mut camera, mut controls) = setup();
        // Dragging up tilts the camera below the target.
        controls.rotate(0.0, -400.0, 800.0);
        for _ in 0..50 {
            controls.update(&mut camera);
            assert!(polar(&camera) <= FRAC_PI_2 + 1e-5);
        }

        controls.rotate(0.0, 300.0, 800.0);
        for _ in 0..50 {
            controls.update(&mut camera);
            assert!(polar(&camera) <= FRAC_PI_2 + 1e-5);
        }
        assert!(polar(&camera) < FRAC_PI_2 - 0.1);
    }

    #[test]
    fn ground_plane_pan_keeps_target_height() {
        let (mut camera, mut controls) = setup();
        controls.begin(OrbitAction::Pan);
        controls.pointer_moved(0.0, 100.0, 800.0, &camera);
        controls.end();
        for _ in 0..100 {
            controls.update(&mut camera);
        }
        assert!(controls.target.y.abs() < 1e-5);
        assert!(controls.target.z < -0.1);
    }

    #[test]
    fn wheel_dollies() {
        let (mut camera, mut controls) = setup();
        controls.dolly(-1.0);
        assert!(controls.update(&mut camera));
        assert!((nalgebra_glm::length(&camera.position()) - 15.0 * 0.95).abs() < 1e-4);
    }
}
