mod common;

use common::{silent_wav, CountingBackend, TempDir};
use lightbox::{
    assets::AssetLoader,
    audio::{SoundBoard, SoundBuffer},
    config::AssetPaths,
    scene::{Scene, SceneBuilder},
};
use rand::{rngs::StdRng, SeedableRng};
use std::time::Duration;

const PLANE_OBJ: &str = "\
o wing
v -1.0 0.0 -1.0
v 1.0 0.0 -1.0
v 1.0 0.0 1.0
v -1.0 0.0 1.0
vn 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";

#[test]
fn present_assets_land_in_the_scene() {
    let root = TempDir::new();
    let paths = AssetPaths::default();

    let plane = root.0.join(&paths.plane);
    std::fs::create_dir_all(plane.parent().unwrap()).unwrap();
    std::fs::write(&plane, PLANE_OBJ).unwrap();

    let skybox = root.0.join(&paths.skybox);
    std::fs::create_dir_all(skybox.parent().unwrap()).unwrap();
    image::RgbImage::from_pixel(4, 2, image::Rgb([10, 20, 30]))
        .save_with_format(&skybox, image::ImageFormat::Jpeg)
        .unwrap();

    let mut scene = Scene::new();
    let mut builder = SceneBuilder::new(AssetLoader::new(root.0.clone()));
    let mut sound_board = SoundBoard::new(Box::new(CountingBackend::default()));
    builder.build(&mut scene, &paths, &mut StdRng::seed_from_u64(3));
    builder.finish(&mut scene, &mut sound_board, Duration::from_secs(10));

    assert_eq!(builder.pending(), 0);
    assert_eq!(scene.shapes.len(), 20);
    assert_eq!(scene.models.len(), 1);
    assert_eq!(scene.models[0].name, "plane");
    let mesh = scene.registry.get_mesh(scene.models[0].meshes[0]).unwrap();
    assert_eq!(mesh.triangle_count(), 2);

    let background = scene.background.expect("skybox should load");
    let texture = scene.registry.get_texture(background).unwrap();
    assert_eq!((texture.width, texture.height), (4, 2));

    // The tiger, the skin and the sound are missing; nothing else changed.
    assert!(!sound_board.is_loaded());
}

#[test]
fn click_before_sound_loads_is_silent() {
    let backend = CountingBackend::default();
    let started = backend.started.clone();
    let mut sound_board = SoundBoard::new(Box::new(backend));

    sound_board.click();
    assert_eq!(started.get(), 0);
    assert_eq!(sound_board.voice_count(), 0);
}

#[test]
fn each_click_starts_one_more_voice() {
    let backend = CountingBackend::default();
    let started = backend.started.clone();
    let mut sound_board = SoundBoard::new(Box::new(backend));
    sound_board.set_buffer(SoundBuffer::decode(silent_wav(800)).unwrap());

    sound_board.click();
    assert_eq!(sound_board.playing_count(), 1);
    sound_board.click();
    sound_board.click();
    assert_eq!(started.get(), 3);
    assert_eq!(sound_board.playing_count(), 3);
}

#[cfg(feature = "audio")]
#[test]
fn corrupt_sound_file_fails_to_load() {
    let root = TempDir::new();
    let paths = AssetPaths::default();
    let sound = root.0.join(&paths.click_sound);
    std::fs::create_dir_all(sound.parent().unwrap()).unwrap();
    std::fs::write(&sound, b"this is not an mp3").unwrap();

    let mut scene = Scene::new();
    let mut builder = SceneBuilder::new(AssetLoader::new(root.0.clone()));
    let mut sound_board = SoundBoard::new(Box::new(CountingBackend::default()));
    builder.build(&mut scene, &paths, &mut StdRng::seed_from_u64(5));
    builder.finish(&mut scene, &mut sound_board, Duration::from_secs(10));

    assert_eq!(builder.pending(), 0);
    assert!(!sound_board.is_loaded());
    sound_board.click();
    assert_eq!(sound_board.voice_count(), 0);
}
