use super::{
    device::Device, instance::Instance, physical_device::PhysicalDevice, surface::Surface,
    swapchain::Swapchain,
};
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// Owns the Vulkan objects that live as long as the window.
pub struct VulkanContext {
    pub instance: Instance,
    pub surface: Surface,
    pub physical_device: PhysicalDevice,
    pub device: Device,

    swapchain: Swapchain,
}

impl VulkanContext {
    pub fn new(
        window: &(impl HasWindowHandle + HasDisplayHandle),
        window_size: [u32; 2],
        enable_validation: bool,
    ) -> anyhow::Result<Self> {
        let entry = unsafe { ash::Entry::load()? };
        let window_extensions =
            ash_window::enumerate_required_extensions(window.display_handle()?.as_raw())?;
        let instance = Instance::new(entry, window_extensions, enable_validation)?;

        let mut surface = Surface::new(&instance, window)?;
        let physical_device = PhysicalDevice::new(&instance, &surface)?;
        surface.select_format(physical_device.physical_device)?;

        let device = Device::new(&instance, &physical_device)?;
        let swapchain = Swapchain::new(
            &device,
            &physical_device,
            &surface,
            window_size,
            vk::SwapchainKHR::null(),
        )?;

        Ok(Self {
            instance,
            surface,
            physical_device,
            device,
            swapchain,
        })
    }

    /// Replaces the swapchain. The caller must make sure the old images are
    /// no longer in use.
    pub fn recreate_swapchain(&mut self, window_size: [u32; 2]) -> anyhow::Result<()> {
        let swapchain = Swapchain::new(
            &self.device,
            &self.physical_device,
            &self.surface,
            window_size,
            self.swapchain.swapchain,
        )?;
        let old = std::mem::replace(&mut self.swapchain, swapchain);
        old.destroy(&self.device);
        Ok(())
    }

    /// Records commands with `record`, submits them and blocks until the
    /// queue is idle.
    pub fn one_time_submit(
        &self,
        record: impl FnOnce(&ash::Device, vk::CommandBuffer),
    ) -> anyhow::Result<()> {
        let device = self.device();
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_buffer_count(1)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_pool(self.device.graphics_command_pool);
        let cmds = unsafe { device.allocate_command_buffers(&allocate_info)? };
        let cmd = cmds[0];

        let result = unsafe {
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            device.begin_command_buffer(cmd, &begin_info).and_then(|_| {
                record(device, cmd);
                device.end_command_buffer(cmd)?;
                let submit_info = vk::SubmitInfo::default().command_buffers(&cmds);
                device.queue_submit(self.device.graphics_queue, &[submit_info], vk::Fence::null())?;
                device.queue_wait_idle(self.device.graphics_queue)
            })
        };
        unsafe {
            device.free_command_buffers(self.device.graphics_command_pool, &cmds);
        }
        Ok(result?)
    }

    pub fn device(&self) -> &ash::Device {
        &self.device.device
    }

    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    pub fn surface_format(&self) -> vk::Format {
        self.surface.format.format
    }

    pub fn swapchain_extent(&self) -> vk::Extent2D {
        self.swapchain.extent
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device().device_wait_idle();
        }
        self.swapchain.destroy(&self.device);
        self.device.destroy();
        self.surface.destroy();
        self.instance.destroy();
    }
}
