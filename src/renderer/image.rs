use super::{buffer::Buffer, pipeline, vulkan_context::VulkanContext};
use crate::scene::texture::{TextureData, TextureFilter};
use ash::vk;

pub const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

pub struct Image {
    pub image: vk::Image,
    pub image_view: vk::ImageView,
    pub memory: vk::DeviceMemory,

    extent: vk::Extent3D,
}

impl Image {
    pub fn new(
        vulkan_context: &VulkanContext,
        required_memory_flags: vk::MemoryPropertyFlags,
        image_create_info: vk::ImageCreateInfo,
        view_type: vk::ImageViewType,
        subresource_range: vk::ImageSubresourceRange,
    ) -> anyhow::Result<Self> {
        unsafe {
            let image = vulkan_context
                .device()
                .create_image(&image_create_info, None)?;

            let mem_req = vulkan_context.device().get_image_memory_requirements(image);
            let mem_index = vulkan_context
                .physical_device
                .get_required_memory_index(mem_req, required_memory_flags)?;
            log::trace!("Picking memory index {} for image.", mem_index);

            let allocate_info = vk::MemoryAllocateInfo::default()
                .allocation_size(mem_req.size)
                .memory_type_index(mem_index);
            let memory = vulkan_context
                .device()
                .allocate_memory(&allocate_info, None)?;

            vulkan_context
                .device()
                .bind_image_memory(image, memory, 0)?;

            let image_view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .format(image_create_info.format)
                .view_type(view_type)
                .subresource_range(subresource_range);
            let image_view = vulkan_context
                .device()
                .create_image_view(&image_view_create_info, None)?;

            Ok(Self {
                image,
                image_view,
                memory,
                extent: image_create_info.extent,
            })
        }
    }

    /// Sampled 2D colour image with one mip level.
    pub fn new_sampled(
        vulkan_context: &VulkanContext,
        width: u32,
        height: u32,
        format: vk::Format,
    ) -> anyhow::Result<Self> {
        Self::new(
            vulkan_context,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::ImageCreateInfo::default()
                .samples(vk::SampleCountFlags::TYPE_1)
                .usage(vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST)
                .image_type(vk::ImageType::TYPE_2D)
                .mip_levels(1)
                .array_layers(1)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .format(format)
                .extent(vk::Extent3D {
                    width,
                    height,
                    depth: 1,
                })
                .tiling(vk::ImageTiling::OPTIMAL),
            vk::ImageViewType::TYPE_2D,
            vk::ImageSubresourceRange::default()
                .aspect_mask(vk::ImageAspectFlags::COLOR)
                .layer_count(1)
                .level_count(1),
        )
    }

    pub fn new_depth(vulkan_context: &VulkanContext, extent: vk::Extent2D) -> anyhow::Result<Self> {
        Self::new(
            vulkan_context,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(DEPTH_FORMAT)
                .extent(vk::Extent3D {
                    width: extent.width,
                    height: extent.height,
                    depth: 1,
                })
                .mip_levels(1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
                .sharing_mode(vk::SharingMode::EXCLUSIVE),
            vk::ImageViewType::TYPE_2D,
            vk::ImageSubresourceRange::default()
                .aspect_mask(vk::ImageAspectFlags::DEPTH)
                .layer_count(1)
                .level_count(1),
        )
    }

    /// Copies tightly packed pixels into the image through a staging buffer
    /// and leaves it ready for sampling.
    pub fn upload(&self, vulkan_context: &VulkanContext, pixels: &[u8]) -> anyhow::Result<()> {
        let staging = Buffer::from_data(vulkan_context, vk::BufferUsageFlags::TRANSFER_SRC, pixels)?;
        let subresource_range = vk::ImageSubresourceRange::default()
            .aspect_mask(vk::ImageAspectFlags::COLOR)
            .level_count(1)
            .layer_count(1);

        let result = vulkan_context.one_time_submit(|device, cmd| unsafe {
            let copy_barrier = vk::ImageMemoryBarrier::default()
                .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .old_layout(vk::ImageLayout::UNDEFINED)
                .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .image(self.image)
                .subresource_range(subresource_range);
            device.cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::HOST,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[copy_barrier],
            );

            let regions = [vk::BufferImageCopy::default()
                .image_subresource(
                    vk::ImageSubresourceLayers::default()
                        .aspect_mask(vk::ImageAspectFlags::COLOR)
                        .layer_count(1),
                )
                .image_extent(self.extent)];
            device.cmd_copy_buffer_to_image(
                cmd,
                staging.buffer,
                self.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &regions,
            );

            let use_barrier = vk::ImageMemoryBarrier::default()
                .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .dst_access_mask(vk::AccessFlags::SHADER_READ)
                .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .image(self.image)
                .subresource_range(subresource_range);
            device.cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[use_barrier],
            );
        });
        staging.destroy(vulkan_context.device());
        result
    }

    pub fn destroy(&self, device: &ash::Device) {
        unsafe {
            device.destroy_image_view(self.image_view, None);
            device.destroy_image(self.image, None);
            device.free_memory(self.memory, None);
        }
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("image", &self.image)
            .field("memory", &self.memory)
            .field("extent", &self.extent)
            .finish()
    }
}

/// A sampled image and the sampler its settings ask for.
pub struct GpuTexture {
    pub image: Image,
    pub sampler: vk::Sampler,
}

impl GpuTexture {
    pub fn upload(vulkan_context: &VulkanContext, texture: &TextureData) -> anyhow::Result<Self> {
        let format = if texture.settings.srgb {
            vk::Format::R8G8B8A8_SRGB
        } else {
            vk::Format::R8G8B8A8_UNORM
        };
        let image = Image::new_sampled(vulkan_context, texture.width, texture.height, format)?;
        if let Err(err) = image.upload(vulkan_context, &texture.data) {
            image.destroy(vulkan_context.device());
            return Err(err);
        }
        let sampler = pipeline::create_sampler(
            vulkan_context.device(),
            filter(texture.settings.mag_filter),
            filter(texture.settings.min_filter),
            vk::SamplerAddressMode::REPEAT,
        )?;
        Ok(Self { image, sampler })
    }

    pub fn destroy(&self, device: &ash::Device) {
        unsafe {
            device.destroy_sampler(self.sampler, None);
        }
        self.image.destroy(device);
    }
}

fn filter(filter: TextureFilter) -> vk::Filter {
    match filter {
        TextureFilter::Nearest => vk::Filter::NEAREST,
        TextureFilter::Linear => vk::Filter::LINEAR,
    }
}
