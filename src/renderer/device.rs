use super::{instance::Instance, physical_device::PhysicalDevice};
use anyhow::anyhow;
use ash::{khr, vk};
use std::ffi::{c_char, CStr};

pub struct Device {
    pub device: ash::Device,
    pub graphics_queue: vk::Queue,
    /// Resettable pool for the per-frame and one-off command buffers.
    pub graphics_command_pool: vk::CommandPool,
    pub push_descriptor: khr::push_descriptor::Device,
    pub swapchain_fns: khr::swapchain::Device,
}

impl Device {
    pub fn new(instance: &Instance, physical_device: &PhysicalDevice) -> anyhow::Result<Self> {
        let available = unsafe {
            instance
                .instance
                .enumerate_device_extension_properties(physical_device.physical_device)?
        };
        let extensions = Self::required_device_extensions(&available)?;

        let priorities = [1.0];
        let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
            .queue_family_index(physical_device.graphics_queue_family)
            .queue_priorities(&priorities)];

        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extensions);
        let device = unsafe {
            instance
                .instance
                .create_device(physical_device.physical_device, &create_info, None)?
        };

        let graphics_queue =
            unsafe { device.get_device_queue(physical_device.graphics_queue_family, 0) };
        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(physical_device.graphics_queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        let graphics_command_pool = unsafe { device.create_command_pool(&pool_info, None)? };

        let push_descriptor = khr::push_descriptor::Device::new(&instance.instance, &device);
        let swapchain_fns = khr::swapchain::Device::new(&instance.instance, &device);

        Ok(Self {
            device,
            graphics_queue,
            graphics_command_pool,
            push_descriptor,
            swapchain_fns,
        })
    }

    pub fn destroy(&self) {
        unsafe {
            self.device
                .destroy_command_pool(self.graphics_command_pool, None);
            self.device.destroy_device(None);
        }
    }

    fn required_device_extensions(
        available: &[vk::ExtensionProperties],
    ) -> anyhow::Result<Vec<*const c_char>> {
        #[allow(unused_mut)]
        let mut required = vec![khr::swapchain::NAME, khr::push_descriptor::NAME];
        #[cfg(any(target_os = "macos", target_os = "ios"))]
        required.push(khr::portability_subset::NAME);

        let available_names = available
            .iter()
            .map(|extension| unsafe { CStr::from_ptr(extension.extension_name.as_ptr()) })
            .collect::<Vec<_>>();
        for name in &required {
            if !available_names.contains(name) {
                return Err(anyhow!(
                    "extension {} not supported by the device",
                    name.to_string_lossy()
                ));
            }
        }
        Ok(required.iter().map(|name| name.as_ptr()).collect())
    }
}
