use crate::camera::Camera;
use crate::renderer::Renderer;

/// Keeps the camera aspect and the renderer output in step with the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSurface {
    width: u32,
    height: u32,
}

impl RenderSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Surface for a window that was just created, which may not have the
    /// size that was asked for. A zero size leaves the camera as it was.
    pub fn attach(width: u32, height: u32, camera: &mut Camera) -> Self {
        if width > 0 && height > 0 {
            camera.set_aspect(width as f32, height as f32);
        }
        Self::new(width, height)
    }

    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }

    /// Zero sized windows (minimised) are ignored, keeping the last valid
    /// projection and swapchain.
    pub fn resize(
        &mut self,
        width: u32,
        height: u32,
        camera: &mut Camera,
        renderer: &mut dyn Renderer,
    ) -> anyhow::Result<()> {
        if width == 0 || height == 0 {
            log::debug!("Ignoring resize to {width}x{height}");
            return Ok(());
        }
        if [width, height] == self.size() && renderer.output_size() == [width, height] {
            return Ok(());
        }

        self.width = width;
        self.height = height;
        camera.set_aspect(width as f32, height as f32);
        renderer.resized([width, height])?;
        log::debug!("Resized to {width}x{height}");
        Ok(())
    }
}
