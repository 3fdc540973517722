use nalgebra_glm::{Mat4, Vec3};
pub mod orbit_controls;
pub mod raycaster;

pub use orbit_controls::{OrbitAction, OrbitControls};
pub use raycaster::{Ray, Raycaster};

/// Perspective camera looking at a target point with +Y up.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    up: Vec3,

    fov: f32,
    width: f32,
    height: f32,
    z_near: f32,
    z_far: f32,

    view: Mat4,
    projection: Mat4,
}

impl Camera {
    /// `fov` is the vertical field of view in degrees.
    pub fn new(
        position: Vec3,
        target: Vec3,
        fov: f32,
        width: f32,
        height: f32,
        z_near: f32,
        z_far: f32,
    ) -> Self {
        let up = Vec3::y();
        Self {
            position,
            target,
            up,
            fov,
            width,
            height,
            z_near,
            z_far,
            view: nalgebra_glm::look_at_rh(&position, &target, &up),
            projection: nalgebra_glm::perspective_fov_rh_zo(
                f32::to_radians(fov),
                width,
                height,
                z_near,
                z_far,
            ),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    pub fn set_look_at(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        self.target = target;
        self.update_view();
    }

    pub fn set_fov(&mut self, new_fov: f32) {
        self.fov = new_fov;
        self.update_projection();
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.update_projection();
    }

    /// Camera-to-world basis vector pointing right on screen.
    pub fn right(&self) -> Vec3 {
        // First row of the view rotation.
        Vec3::new(self.view[(0, 0)], self.view[(0, 1)], self.view[(0, 2)])
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    fn update_projection(&mut self) {
        self.projection = nalgebra_glm::perspective_fov_rh_zo(
            f32::to_radians(self.fov),
            self.width,
            self.height,
            self.z_near,
            self.z_far,
        );
    }

    fn update_view(&mut self) {
        self.view = nalgebra_glm::look_at_rh(&self.position, &self.target, &self.up);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_follows_size() {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 15.0), Vec3::zeros(), 75.0, 800.0, 800.0, 0.1, 1000.0);
        assert_eq!(camera.aspect(), 1.0);
        camera.set_aspect(1920.0, 1080.0);
        assert_eq!(camera.aspect(), 1920.0 / 1080.0);
        let projection = camera.projection();
        assert!((projection[(0, 0)] * camera.aspect() - projection[(1, 1)]).abs() < 1e-5);
    }

    #[test]
    fn origin_projects_to_screen_centre() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 15.0), Vec3::zeros(), 75.0, 800.0, 800.0, 0.1, 1000.0);
        let clip = camera.view_projection() * nalgebra_glm::vec4(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-6);
        assert!((clip.y / clip.w).abs() < 1e-6);
        assert!(clip.z / clip.w > 0.0 && clip.z / clip.w < 1.0);
    }
}
