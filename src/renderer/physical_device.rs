use super::{instance::Instance, surface::Surface};
use anyhow::{anyhow, Context};
use ash::vk;

pub struct PhysicalDevice {
    pub physical_device: vk::PhysicalDevice,

    /// Family used for both graphics and presentation.
    pub graphics_queue_family: u32,
    pub properties: vk::PhysicalDeviceProperties,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
}

impl PhysicalDevice {
    /// Picks the first discrete GPU that can present to `surface`, falling
    /// back to any other device that can.
    pub fn new(instance: &Instance, surface: &Surface) -> anyhow::Result<Self> {
        let devices = unsafe { instance.instance.enumerate_physical_devices()? };

        let mut selected = None;
        let mut fallback = None;
        for device in devices {
            let Some(family) = Self::find_graphics_queue_family(instance, surface, device)? else {
                continue;
            };
            let properties = unsafe { instance.instance.get_physical_device_properties(device) };
            if properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU {
                selected.get_or_insert((device, family, properties));
            } else {
                fallback.get_or_insert((device, family, properties));
            }
        }

        let (physical_device, graphics_queue_family, properties) = selected
            .or(fallback)
            .ok_or_else(|| anyhow!("no device can present to the window surface"))?;
        log::info!(
            "Using {:?} {} (queue family {})",
            properties.device_type,
            device_name(&properties),
            graphics_queue_family
        );

        Ok(Self {
            physical_device,
            graphics_queue_family,
            properties,
            memory_properties: unsafe {
                instance
                    .instance
                    .get_physical_device_memory_properties(physical_device)
            },
        })
    }

    fn find_graphics_queue_family(
        instance: &Instance,
        surface: &Surface,
        device: vk::PhysicalDevice,
    ) -> anyhow::Result<Option<u32>> {
        let families = unsafe {
            instance
                .instance
                .get_physical_device_queue_family_properties(device)
        };
        for (index, family) in families.iter().enumerate() {
            let index = index as u32;
            if family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
                && surface.supports_queue_family(device, index)?
            {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    pub fn get_required_memory_index(
        &self,
        memory_requirements: vk::MemoryRequirements,
        required_memory_flags: vk::MemoryPropertyFlags,
    ) -> anyhow::Result<u32> {
        Ok(self
            .memory_properties
            .memory_types
            .iter()
            .take(self.memory_properties.memory_type_count as usize)
            .enumerate()
            .position(|(ind, mem_type)| {
                mem_type.property_flags.contains(required_memory_flags)
                    && (memory_requirements.memory_type_bits & (1 << ind)) != 0
            })
            .context("failed to find a suitable memory type index")? as u32)
    }
}

fn device_name(properties: &vk::PhysicalDeviceProperties) -> String {
    properties
        .device_name_as_c_str()
        .unwrap_or(c"unknown")
        .to_string_lossy()
        .into_owned()
}
