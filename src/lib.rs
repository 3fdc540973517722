pub mod animation;
pub mod assets;
pub mod audio;
pub mod camera;
pub mod config;
pub mod controls;
pub mod renderer;
pub mod scene;
pub mod surface;
pub mod ui;
