pub mod imgui_renderer;
pub mod light_panel;
pub mod platform;

pub use imgui_renderer::ImguiRenderer;
pub use light_panel::LightPanel;
pub use platform::ImguiWinitPlatform;
