mod common;

use common::RecordingRenderer;
use lightbox::{
    animation::AnimationLoop,
    assets::AssetLoader,
    audio::{SilentBackend, SoundBoard},
    camera::{Camera, OrbitControls},
    config::{Config, OrbitConfig},
    scene::{Scene, SceneBuilder},
    surface::RenderSurface,
};
use nalgebra_glm::Vec3;
use rand::{rngs::StdRng, SeedableRng};
use std::time::Duration;

fn build_scene() -> Scene {
    let mut scene = Scene::new();
    let mut builder = SceneBuilder::new(AssetLoader::new("no-such-asset-root"));
    let mut sound_board = SoundBoard::new(Box::new(SilentBackend));
    builder.build(&mut scene, &Config::default().assets, &mut StdRng::seed_from_u64(7));
    builder.finish(&mut scene, &mut sound_board, Duration::from_secs(10));
    scene
}

fn default_camera() -> Camera {
    Camera::new(Vec3::new(0.0, 0.0, 15.0), Vec3::zeros(), 75.0, 800.0, 800.0, 0.1, 1000.0)
}

#[test]
fn every_shape_turns_by_its_increment_each_tick() {
    let mut scene = build_scene();
    assert_eq!(scene.shapes.len(), 20);
    let initial: Vec<_> = scene.shapes.iter().map(|s| s.transform.rotation).collect();

    let mut camera = default_camera();
    let mut controls = OrbitControls::new(&OrbitConfig::default());
    let mut renderer = RecordingRenderer::new([800, 800]);
    let mut animation = AnimationLoop::new();

    const TICKS: usize = 25;
    for _ in 0..TICKS {
        animation
            .tick(&mut controls, &mut camera, &mut scene, &mut renderer, None)
            .unwrap();
    }

    assert_eq!(animation.frames(), TICKS as u64);
    assert_eq!(renderer.frames, TICKS);
    for ((shape, start), seen) in scene.shapes.iter().zip(&initial).zip(&renderer.rotations) {
        let expected = start + shape.rotation_speed * TICKS as f32;
        assert!(
            nalgebra_glm::distance(&shape.transform.rotation, &expected) < 1e-4,
            "{} rotated to {:?}, expected {:?}",
            shape.kind.name(),
            shape.transform.rotation,
            expected
        );
        assert_eq!(*seen, shape.transform.rotation);
    }
}

#[test]
fn idle_orbit_keeps_camera_still() {
    let mut scene = build_scene();
    let mut camera = default_camera();
    let mut controls = OrbitControls::new(&OrbitConfig::default());
    let mut renderer = RecordingRenderer::new([800, 800]);
    let mut animation = AnimationLoop::new();

    for _ in 0..10 {
        animation
            .tick(&mut controls, &mut camera, &mut scene, &mut renderer, None)
            .unwrap();
    }
    assert!(nalgebra_glm::distance(&camera.position(), &Vec3::new(0.0, 0.0, 15.0)) < 1e-4);
}

#[test]
fn resize_updates_aspect_and_output() {
    let mut camera = default_camera();
    let mut renderer = RecordingRenderer::new([800, 800]);
    let mut surface = RenderSurface::new(800, 800);

    surface.resize(1280, 720, &mut camera, &mut renderer).unwrap();
    assert_eq!(camera.aspect(), 1280.0 / 720.0);
    assert_eq!(renderer.output_size, [1280, 720]);
    assert_eq!(surface.size(), [1280, 720]);

    surface.resize(0, 0, &mut camera, &mut renderer).unwrap();
    assert_eq!(renderer.output_size, [1280, 720]);
    assert_eq!(camera.aspect(), 1280.0 / 720.0);
}

#[test]
fn attached_surface_follows_the_real_window_size() {
    let mut camera = default_camera();
    let mut renderer = RecordingRenderer::new([1024, 768]);

    let mut surface = RenderSurface::attach(1024, 768, &mut camera);
    assert_eq!(surface.size(), [1024, 768]);
    assert_eq!(camera.aspect(), 1024.0 / 768.0);

    // Already in step, so the renderer sees no resize.
    surface.resize(1024, 768, &mut camera, &mut renderer).unwrap();
    assert_eq!(renderer.output_size, [1024, 768]);

    let mut camera = default_camera();
    RenderSurface::attach(0, 0, &mut camera);
    assert_eq!(camera.aspect(), 1.0);
}
