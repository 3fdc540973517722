mod common;

use common::RecordingRenderer;
use lightbox::{
    animation::AnimationLoop,
    camera::{Camera, OrbitControls},
    config::OrbitConfig,
    controls::{apply, ControlEvent, ControlId},
    scene::Scene,
};
use nalgebra_glm::Vec3;

#[test]
fn every_numeric_control_writes_its_property() {
    for (i, id) in ControlId::NUMERIC.into_iter().enumerate() {
        let mut scene = Scene::new();
        let value = i as f32 * 1.5 - 4.0;
        apply(&ControlEvent::Slider { id, value }, &mut scene.lights);
        assert_eq!(id.value(&scene.lights), Some(value), "{}", id.element_id());
    }
}

#[test]
fn typed_text_follows_prefix_rules() {
    let mut scene = Scene::new();
    let typed = |id, text: &str| ControlEvent::Text {
        id,
        text: text.to_owned(),
    };

    apply(&typed(ControlId::AmbientIntensity, "2.5"), &mut scene.lights);
    apply(&typed(ControlId::PointX, "  3abc"), &mut scene.lights);
    apply(&typed(ControlId::PointIntensity, "abc"), &mut scene.lights);

    assert_eq!(scene.lights.ambient.intensity, 2.5);
    assert_eq!(scene.lights.point.position.x, 3.0);
    assert!(scene.lights.point.intensity.is_nan());
}

#[test]
fn toggle_reaches_the_renderer() {
    let mut scene = Scene::new();
    let mut camera = Camera::new(
        Vec3::new(0.0, 0.0, 15.0),
        Vec3::zeros(),
        75.0,
        800.0,
        800.0,
        0.1,
        1000.0,
    );
    let mut controls = OrbitControls::new(&OrbitConfig::default());
    let mut renderer = RecordingRenderer::new([800, 800]);
    let mut animation = AnimationLoop::new();

    let toggle = ControlEvent::Click(ControlId::TogglePointLight);
    apply(&toggle, &mut scene.lights);
    animation
        .tick(&mut controls, &mut camera, &mut scene, &mut renderer, None)
        .unwrap();
    assert_eq!(renderer.point_light_visible, Some(false));

    apply(&toggle, &mut scene.lights);
    animation
        .tick(&mut controls, &mut camera, &mut scene, &mut renderer, None)
        .unwrap();
    assert_eq!(renderer.point_light_visible, Some(true));
}

#[test]
fn element_ids_resolve_to_controls() {
    assert_eq!(ControlId::from_element_id("pointY"), Some(ControlId::PointY));
    assert_eq!(
        ControlId::from_element_id("togglePointLight"),
        Some(ControlId::TogglePointLight)
    );
}
