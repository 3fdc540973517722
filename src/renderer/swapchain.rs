use super::{device::Device, physical_device::PhysicalDevice, surface::Surface};
use ash::vk::{self, Handle};

const PREFERRED_IMAGE_COUNT: u32 = 3;

pub struct Swapchain {
    pub swapchain: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<vk::ImageView>,
    pub extent: vk::Extent2D,
    pub format: vk::Format,
}

impl Swapchain {
    /// Builds a FIFO swapchain sized to the surface, or to `window_size`
    /// when the surface leaves the extent up to us. `old` is retired by the
    /// driver once the new chain exists.
    pub fn new(
        device: &Device,
        physical_device: &PhysicalDevice,
        surface: &Surface,
        window_size: [u32; 2],
        old: vk::SwapchainKHR,
    ) -> anyhow::Result<Self> {
        let capabilities = surface.capabilities(physical_device.physical_device)?;
        let extent = Self::choose_extent(&capabilities, window_size);

        let mut image_count = capabilities.min_image_count.max(PREFERRED_IMAGE_COUNT);
        if capabilities.max_image_count > 0 {
            image_count = image_count.min(capabilities.max_image_count);
        }

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface.surface)
            .min_image_count(image_count)
            .image_format(surface.format.format)
            .image_color_space(surface.format.color_space)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(vk::PresentModeKHR::FIFO)
            .clipped(true)
            .old_swapchain(old)
            .image_extent(extent);
        let swapchain = unsafe { device.swapchain_fns.create_swapchain(&create_info, None)? };

        let images = unsafe { device.swapchain_fns.get_swapchain_images(swapchain)? };
        let image_views = images
            .iter()
            .map(|image| Self::create_image_view(&device.device, *image, surface.format.format))
            .collect::<anyhow::Result<Vec<_>>>()?;
        log::info!(
            "Swapchain {}x{} with {} images",
            extent.width,
            extent.height,
            images.len()
        );

        Ok(Self {
            swapchain,
            images,
            image_views,
            extent,
            format: surface.format.format,
        })
    }

    fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, window_size: [u32; 2]) -> vk::Extent2D {
        if capabilities.current_extent.width != u32::MAX {
            return capabilities.current_extent;
        }
        vk::Extent2D {
            width: window_size[0].clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: window_size[1].clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        }
    }

    /// Returns the image index, or `None` when the swapchain is out of date.
    pub fn acquire_next_image(
        &self,
        device: &Device,
        semaphore: vk::Semaphore,
    ) -> anyhow::Result<Option<u32>> {
        let result = unsafe {
            device.swapchain_fns.acquire_next_image(
                self.swapchain,
                u64::MAX,
                semaphore,
                vk::Fence::null(),
            )
        };
        match result {
            Ok((image_index, _is_suboptimal)) => Ok(Some(image_index)),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Returns false when the swapchain needs recreating.
    pub fn queue_present(
        &self,
        device: &Device,
        image_index: u32,
        wait: vk::Semaphore,
    ) -> anyhow::Result<bool> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let waits = [wait];
        let present_info = vk::PresentInfoKHR::default()
            .swapchains(&swapchains)
            .image_indices(&image_indices)
            .wait_semaphores(&waits);
        match unsafe {
            device
                .swapchain_fns
                .queue_present(device.graphics_queue, &present_info)
        } {
            Ok(suboptimal) => Ok(!suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    pub fn destroy(&self, device: &Device) {
        unsafe {
            for view in &self.image_views {
                device.device.destroy_image_view(*view, None);
            }
            if !self.swapchain.is_null() {
                device.swapchain_fns.destroy_swapchain(self.swapchain, None);
            }
        }
    }

    fn create_image_view(
        device: &ash::Device,
        image: vk::Image,
        format: vk::Format,
    ) -> anyhow::Result<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping::default())
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });
        Ok(unsafe { device.create_image_view(&create_info, None)? })
    }
}
