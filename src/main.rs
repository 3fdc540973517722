use anyhow::Context;
use lightbox::{
    animation::AnimationLoop,
    assets::AssetLoader,
    audio::{self, SoundBoard},
    camera::{raycaster, Camera, OrbitAction, OrbitControls, Raycaster},
    config::Config,
    controls,
    renderer::{scene_renderer::VulkanRenderer, FrameState},
    scene::{Scene, SceneBuilder},
    surface::RenderSurface,
    ui::{platform, ImguiWinitPlatform, LightPanel},
};
use nalgebra_glm::Vec3;
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Everything that needs a live window. Field order is drop order: the
/// renderer goes before the window its surface was created from.
struct Running {
    renderer: VulkanRenderer,
    platform: ImguiWinitPlatform,
    imgui: imgui::Context,
    window: Window,
}

struct App {
    config: Config,
    scene: Scene,
    builder: SceneBuilder,
    sound_board: SoundBoard,
    camera: Camera,
    orbit: OrbitControls,
    raycaster: Raycaster,
    surface: RenderSurface,
    animation: AnimationLoop,
    panel: LightPanel,
    cursor: PhysicalPosition<f64>,
    running: Option<Running>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: Config) -> Self {
        let mut scene = Scene::new();
        let mut builder = SceneBuilder::new(AssetLoader::new(config.asset_root.clone()));
        builder.build(&mut scene, &config.assets, &mut rand::rng());

        let camera = Camera::new(
            Vec3::new(0.0, 0.0, config.camera.distance),
            Vec3::zeros(),
            config.camera.fov,
            config.width as f32,
            config.height as f32,
            config.camera.near,
            config.camera.far,
        );

        Self {
            scene,
            builder,
            sound_board: SoundBoard::new(audio::default_backend()),
            camera,
            orbit: OrbitControls::new(&config.orbit),
            raycaster: Raycaster::new(),
            surface: RenderSurface::new(config.width, config.height),
            animation: AnimationLoop::new(),
            panel: LightPanel::new(),
            cursor: PhysicalPosition::new(0.0, 0.0),
            running: None,
            error: None,
            config,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<Running> {
        let window = event_loop.create_window(
            Window::default_attributes()
                .with_title(self.config.title.clone())
                .with_inner_size(PhysicalSize::new(self.config.width, self.config.height)),
        )?;

        let mut imgui = imgui::Context::create();
        imgui.set_ini_filename(None);
        imgui
            .fonts()
            .add_font(&[imgui::FontSource::DefaultFontData { config: None }]);
        let platform = ImguiWinitPlatform::new(&mut imgui, &window);

        let size = window.inner_size();
        self.surface = RenderSurface::attach(size.width, size.height, &mut self.camera);
        let renderer = VulkanRenderer::new(
            &window,
            [size.width, size.height],
            self.config.validation,
            &self.config.shader_dir,
            &mut imgui,
        )
        .with_context(|| {
            format!(
                "failed to create the renderer (shaders from {})",
                self.config.shader_dir.display()
            )
        })?;

        Ok(Running {
            renderer,
            platform,
            imgui,
            window,
        })
    }

    fn handle_event(&mut self, event_loop: &ActiveEventLoop, event: WindowEvent) -> anyhow::Result<()> {
        let Some(running) = self.running.as_mut() else {
            return Ok(());
        };
        running.platform.process_event(&mut running.imgui, &event);
        let io = running.imgui.io();
        let ui_wants_mouse = io.want_capture_mouse;
        let ui_wants_keyboard = io.want_capture_keyboard;

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. }
                if !ui_wants_keyboard
                    && event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.surface
                    .resize(size.width, size.height, &mut self.camera, &mut running.renderer)?;
            }
            WindowEvent::CursorMoved { position, .. } => {
                let dx = (position.x - self.cursor.x) as f32;
                let dy = (position.y - self.cursor.y) as f32;
                self.cursor = position;
                if self.orbit.action() != OrbitAction::None {
                    let height = self.surface.size()[1] as f32;
                    self.orbit.pointer_moved(dx, dy, height, &self.camera);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match (state, button) {
                (ElementState::Pressed, _) if ui_wants_mouse => {}
                (ElementState::Pressed, MouseButton::Left) => self.orbit.begin(OrbitAction::Rotate),
                (ElementState::Pressed, MouseButton::Right) => self.orbit.begin(OrbitAction::Pan),
                (ElementState::Released, MouseButton::Left) => {
                    self.orbit.end();
                    if !ui_wants_mouse {
                        self.click();
                    }
                }
                (ElementState::Released, _) => self.orbit.end(),
                _ => {}
            },
            WindowEvent::MouseWheel { delta, .. } if !ui_wants_mouse => {
                // winit reports wheel-up as positive, which moves closer.
                self.orbit.dolly(-platform::wheel_delta(delta)[1]);
            }
            WindowEvent::RedrawRequested => self.frame()?,
            _ => {}
        }
        Ok(())
    }

    /// Plays the click sound and reports the shape under the pointer.
    fn click(&mut self) {
        self.sound_board.click();

        let [width, height] = self.surface.size();
        let ndc = raycaster::pointer_to_ndc(
            self.cursor.x as f32,
            self.cursor.y as f32,
            width as f32,
            height as f32,
        );
        self.raycaster.set_from_camera(ndc, &self.camera);
        match self.raycaster.nearest(&self.scene.shapes) {
            Some((index, distance)) => log::debug!(
                "Clicked {} #{index} at distance {distance:.2}",
                self.scene.shapes[index].kind.name()
            ),
            None => log::debug!("Clicked empty space"),
        }
    }

    fn frame(&mut self) -> anyhow::Result<()> {
        let Some(running) = self.running.as_mut() else {
            return Ok(());
        };
        self.builder.update(&mut self.scene, &mut self.sound_board);

        running.platform.prepare_frame(&mut running.imgui, &running.window);
        let ui = running.imgui.new_frame();
        for event in self.panel.draw(ui, &self.scene.lights) {
            controls::apply(&event, &mut self.scene.lights);
        }
        let draw_data = running.imgui.render();

        let state = self.animation.tick(
            &mut self.orbit,
            &mut self.camera,
            &mut self.scene,
            &mut running.renderer,
            Some(draw_data),
        )?;
        if state == FrameState::OutOfDate {
            log::debug!("Frame {} skipped, swapchain out of date", self.animation.frames());
        }
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => {
                log::info!("Initialization complete, entering main loop");
                self.running = Some(running);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Err(e) = self.handle_event(event_loop, event) {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &self.running {
            running.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Tear the renderer down while the event loop still owns the display.
        self.running = None;
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .format_indent(None)
        .format_timestamp_nanos()
        .init();

    let config = Config::from_args(std::env::args().skip(1));
    log::info!("Loading assets from {}", config.asset_root.display());

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
