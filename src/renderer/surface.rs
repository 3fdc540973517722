use super::instance::Instance;
use ash::{khr, vk};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

pub struct Surface {
    pub surface: vk::SurfaceKHR,
    pub format: vk::SurfaceFormatKHR,
    loader: khr::surface::Instance,
}

impl Surface {
    /// Creates the presentation surface for `window`. The format is picked
    /// once a physical device is known, see [`Surface::select_format`].
    pub fn new(
        instance: &Instance,
        window: &(impl HasWindowHandle + HasDisplayHandle),
    ) -> anyhow::Result<Self> {
        let surface = unsafe {
            ash_window::create_surface(
                &instance.entry,
                &instance.instance,
                window.display_handle()?.as_raw(),
                window.window_handle()?.as_raw(),
                None,
            )?
        };
        let loader = khr::surface::Instance::new(&instance.entry, &instance.instance);
        Ok(Self {
            surface,
            format: vk::SurfaceFormatKHR::default(),
            loader,
        })
    }

    pub fn destroy(&self) {
        unsafe {
            self.loader.destroy_surface(self.surface, None);
        }
    }

    /// Prefers 8 bit BGRA sRGB, otherwise whatever the driver lists first.
    pub fn select_format(&mut self, physical_device: vk::PhysicalDevice) -> anyhow::Result<()> {
        let formats = self.formats(physical_device)?;
        self.format = formats
            .iter()
            .copied()
            .find(|format| {
                format.format == vk::Format::B8G8R8A8_SRGB
                    && format.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
            })
            .or_else(|| formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        log::debug!("Surface format {:?}", self.format);
        Ok(())
    }

    pub fn supports_queue_family(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
    ) -> anyhow::Result<bool> {
        unsafe {
            Ok(self.loader.get_physical_device_surface_support(
                physical_device,
                queue_family_index,
                self.surface,
            )?)
        }
    }

    pub fn capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> anyhow::Result<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            Ok(self
                .loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)?)
        }
    }

    pub fn formats(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> anyhow::Result<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            Ok(self
                .loader
                .get_physical_device_surface_formats(physical_device, self.surface)?)
        }
    }
}
